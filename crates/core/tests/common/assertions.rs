//! Custom assertion helpers for controller flow tests.

use ik_protocol::events::PromptEvent;
use ik_protocol::prompt_models::PromptState;

/// All states carried by status updates, in emission order.
pub fn state_sequence(events: &[PromptEvent]) -> Vec<PromptState> {
    events
        .iter()
        .filter_map(|e| match e {
            PromptEvent::PromptStatusUpdate { state, .. } => Some(*state),
            _ => None,
        })
        .collect()
}

/// All progress hints carried by status updates, in emission order.
pub fn progress_sequence(events: &[PromptEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            PromptEvent::PromptStatusUpdate { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect()
}

/// Whether any status update carried the given state.
pub fn has_state(events: &[PromptEvent], state: PromptState) -> bool {
    state_sequence(events).contains(&state)
}

/// Whether a `PromptCompleted` event was emitted.
pub fn has_completed(events: &[PromptEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, PromptEvent::PromptCompleted { .. }))
}

/// Messages of all `PromptError` events, in emission order.
pub fn error_messages(events: &[PromptEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PromptEvent::PromptError { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Assert that progress hints never move backwards within a run.
///
/// A run starts at `Creating` or after a `ControllerReset`; a failure is
/// allowed to reset the hint to zero.
pub fn assert_progress_non_decreasing(events: &[PromptEvent]) {
    let mut last = 0u8;
    for event in events {
        match event {
            PromptEvent::ControllerReset => last = 0,
            PromptEvent::PromptStatusUpdate {
                state, progress, ..
            } => {
                let progress = *progress;
                let run_boundary = *state == PromptState::Creating;
                let failure = *state == PromptState::Failed;
                if !run_boundary && !failure {
                    assert!(
                        progress >= last,
                        "progress went backwards: {last} -> {progress} at state {state:?}"
                    );
                }
                last = progress;
            }
            _ => {}
        }
    }
}

//! Prompt history store.
//!
//! A flat, in-memory projection of the prompts the backend knows about.
//! The store is filled from `GET /prompts` and then kept current by folding
//! controller events into the rows, so consumers never re-derive status
//! from scratch.

use tracing::debug;

use ik_protocol::events::PromptEvent;
use ik_protocol::prompt_models::{BackendStatus, PromptId, PromptRecord, PromptState};

use crate::api::{ApiError, PromptApi};

/// Prompt rows plus the current selection, newest first.
#[derive(Debug, Default)]
pub struct PromptStore {
    prompts: Vec<PromptRecord>,
    selected: Option<PromptId>,
}

impl PromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows with one page from the backend.
    ///
    /// The selection survives only when the refreshed page still contains
    /// the selected prompt.
    pub async fn refresh(
        &mut self,
        api: &dyn PromptApi,
        limit: u32,
        page: u32,
    ) -> Result<usize, ApiError> {
        let fetched = api.list_prompts(limit, page).await?;
        self.prompts = fetched.prompts;
        if let Some(id) = &self.selected {
            if !self.prompts.iter().any(|p| &p.id == id) {
                self.selected = None;
            }
        }
        debug!("refreshed prompt history: {} rows", self.prompts.len());
        Ok(self.prompts.len())
    }

    /// Fold one controller event into the rows.
    ///
    /// Events that do not name a prompt, or name one this store has never
    /// seen, leave the rows untouched.
    pub fn apply_event(&mut self, event: &PromptEvent) {
        match event {
            PromptEvent::PromptCreated { record } => {
                self.prompts.retain(|p| p.id != record.id);
                self.prompts.insert(0, record.clone());
                self.selected = Some(record.id.clone());
            }
            PromptEvent::PromptStatusUpdate {
                prompt_id: Some(id),
                state,
                ..
            } => {
                if let Some(row) = self.row_mut(id) {
                    if let Some(status) = state.backend_summary() {
                        row.status = status;
                    }
                    row.has_results = *state == PromptState::Completed;
                    row.has_error = *state == PromptState::Failed;
                }
            }
            PromptEvent::PromptCompleted { prompt_id, .. } => {
                if let Some(row) = self.row_mut(prompt_id) {
                    row.status = BackendStatus::Completed;
                    row.has_results = true;
                    row.has_error = false;
                }
            }
            PromptEvent::PromptError {
                prompt_id: Some(id),
                ..
            } => {
                if let Some(row) = self.row_mut(id) {
                    row.status = BackendStatus::Failed;
                    row.has_error = true;
                }
            }
            PromptEvent::ControllerReset => {
                self.selected = None;
            }
            PromptEvent::PromptStatusUpdate { prompt_id: None, .. }
            | PromptEvent::PromptError { prompt_id: None, .. } => {}
        }
    }

    /// Mark a known prompt as selected.
    pub fn select(&mut self, id: &PromptId) -> bool {
        if self.prompts.iter().any(|p| &p.id == id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    pub fn selected_id(&self) -> Option<&PromptId> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&PromptRecord> {
        let id = self.selected.as_ref()?;
        self.prompts.iter().find(|p| &p.id == id)
    }

    pub fn get(&self, id: &PromptId) -> Option<&PromptRecord> {
        self.prompts.iter().find(|p| &p.id == id)
    }

    pub fn prompts(&self) -> &[PromptRecord] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    fn row_mut(&mut self, id: &PromptId) -> Option<&mut PromptRecord> {
        self.prompts.iter_mut().find(|p| &p.id == id)
    }
}

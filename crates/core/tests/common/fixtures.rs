//! Test fixtures for controller flow tests.

use std::time::Duration;

use ik_core::poll::PollBudget;
use ik_protocol::prompt_models::DatasetId;
use ik_protocol::result_models::{ExecutionResult, Insight, VisualizationSpec};
use serde_json::json;

/// Poll pacing fast enough for tests while keeping real sleeps.
pub fn fast_budget() -> PollBudget {
    PollBudget {
        interval: Duration::from_millis(5),
        max_attempts: 30,
    }
}

/// Fast pacing with a small attempt budget, for timeout scenarios.
pub fn tight_budget(max_attempts: u32) -> PollBudget {
    PollBudget {
        interval: Duration::from_millis(5),
        max_attempts,
    }
}

pub fn single_dataset() -> Vec<DatasetId> {
    vec![DatasetId::from("ds-sales")]
}

/// A result carrying runnable code, a data payload, and declarative content.
pub fn sample_result() -> ExecutionResult {
    ExecutionResult {
        code: Some(r#"canvas.card("Revenue", tostring(data.total))"#.to_string()),
        data: json!({ "total": 1200 }),
        visualizations: vec![VisualizationSpec {
            title: "Revenue by region".to_string(),
            description: None,
            chart_type: Some("bar".to_string()),
        }],
        insights: vec![Insight {
            title: None,
            text: "Revenue is trending up".to_string(),
        }],
    }
}

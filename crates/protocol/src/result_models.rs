//! Execution result models.
//!
//! Shapes returned by `GET /prompts/{id}/results` once a prompt has
//! completed. The backend is loose about which fields it fills in, so
//! everything except the payload itself defaults to empty.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Everything the backend produced for one completed prompt.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Generated dashboard source, when code generation produced any.
    ///
    /// Absent for data-only results; the sandbox falls back to a static
    /// rendering in that case.
    #[serde(default)]
    pub code: Option<String>,

    /// Analysis payload the generated code reads from.
    #[serde(default)]
    #[ts(type = "any")]
    pub data: serde_json::Value,

    /// Structured visualization descriptions, usable without running code.
    #[serde(default)]
    pub visualizations: Vec<VisualizationSpec>,

    /// Textual findings extracted from the analysis.
    #[serde(default)]
    pub insights: Vec<Insight>,
}

impl ExecutionResult {
    /// Whether there is anything at all to render from this result.
    pub fn is_renderable(&self) -> bool {
        self.code.as_ref().is_some_and(|c| !c.trim().is_empty())
            || !self.visualizations.is_empty()
    }
}

/// Declarative description of one visualization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationSpec {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Chart kind the backend chose (bar, line, pie, table, ...).
    #[serde(default)]
    pub chart_type: Option<String>,
}

/// One textual insight.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(default)]
    pub title: Option<String>,

    pub text: String,
}

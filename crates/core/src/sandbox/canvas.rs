//! Dashboard canvas assembled by generated code.
//!
//! Scripts do not draw anything themselves; they append nodes to a canvas
//! through the host bindings, and the presentation layer decides how each
//! node is displayed.

use serde::{Deserialize, Serialize};

/// One element of a rendered dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasNode {
    /// A titled block of text, the workhorse of most dashboards.
    Card { title: String, body: String },

    /// A chart description. `points` carries whatever series the script
    /// provided, untouched.
    Chart {
        title: String,
        chart_type: Option<String>,
        points: serde_json::Value,
    },

    /// Free-standing text.
    Text { content: String },

    /// A narrative insight produced by the analysis.
    Insight { text: String },

    /// Stand-in for a visualization that could not be rendered.
    Placeholder {
        title: String,
        description: Option<String>,
    },
}

/// Ordered collection of nodes produced by one render.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Canvas {
    pub nodes: Vec<CanvasNode>,
}

impl Canvas {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

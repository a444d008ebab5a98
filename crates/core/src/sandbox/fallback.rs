//! Static rendering used when generated code cannot run.

use ik_protocol::result_models::ExecutionResult;

use super::canvas::{Canvas, CanvasNode};

/// Build a canvas directly from the result's declared visualizations and
/// insights, without executing anything.
///
/// Each visualization becomes a placeholder so the dashboard still shows
/// what the analysis intended to draw; insights are carried over verbatim.
pub fn render_static(result: &ExecutionResult) -> Canvas {
    let mut nodes = Vec::with_capacity(result.visualizations.len() + result.insights.len());

    for viz in &result.visualizations {
        nodes.push(CanvasNode::Placeholder {
            title: viz.title.clone(),
            description: viz.description.clone(),
        });
    }

    for insight in &result.insights {
        let text = match &insight.title {
            Some(title) if !title.trim().is_empty() => format!("{title}: {}", insight.text),
            _ => insight.text.clone(),
        };
        nodes.push(CanvasNode::Insight { text });
    }

    Canvas { nodes }
}

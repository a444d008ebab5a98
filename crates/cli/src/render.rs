//! Terminal formatting for lifecycle events, history rows and canvases.
//!
//! Everything here is pure string building so it can be unit tested; the
//! `print_*` helpers are the only functions that touch stdout.

use colored::{ColoredString, Colorize};
use ik_core::sandbox::{Canvas, CanvasNode, RenderOutcome, RenderReport};
use ik_protocol::prompt_models::{BackendStatus, PromptId, PromptRecord, PromptState};
use ik_protocol::result_models::ExecutionResult;

/// Longest prompt text shown in a history row before truncation.
const PROMPT_COLUMN_WIDTH: usize = 60;

/// One status line per distinct lifecycle tick, e.g. `[ 40%] ready for execution`.
pub fn status_line(state: PromptState, progress: u8) -> String {
    format!("[{progress:>3}%] {}", state_label(state))
}

fn state_label(state: PromptState) -> ColoredString {
    match state {
        PromptState::Idle => "idle".dimmed(),
        PromptState::Creating => "creating".cyan(),
        PromptState::Processing => "generating code".yellow(),
        PromptState::ReadyForExecution => "ready for execution".green(),
        PromptState::Executing => "executing".yellow(),
        PromptState::Completed => "completed".green().bold(),
        PromptState::Failed => "failed".red().bold(),
    }
}

/// Printed when generation finished but execution was not requested.
pub fn ready_hint(id: &PromptId) -> String {
    format!(
        "generated code is ready; run {} to execute it",
        format!("insight show {id} --execute").bold()
    )
}

/// One history row: `id  status  created  prompt`.
pub fn history_row(record: &PromptRecord) -> String {
    let marker = match (record.has_error, record.has_results) {
        (true, _) => "!".red().bold(),
        (false, true) => "+".green(),
        (false, false) => " ".normal(),
    };
    format!(
        "{} {}  {}  {}  {}",
        marker,
        record.id.to_string().bold(),
        status_cell(record.status),
        record.created.format("%Y-%m-%d %H:%M"),
        truncate(&record.prompt, PROMPT_COLUMN_WIDTH),
    )
}

fn status_cell(status: BackendStatus) -> ColoredString {
    // Pad before coloring; ANSI escapes would otherwise count against the
    // column width.
    let padded = format!("{:<10}", status_text(status));
    match status {
        BackendStatus::Created => padded.dimmed(),
        BackendStatus::Processing => padded.yellow(),
        BackendStatus::Generated => padded.green(),
        BackendStatus::Completed => padded.green().bold(),
        BackendStatus::Failed => padded.red().bold(),
    }
}

fn status_text(status: BackendStatus) -> &'static str {
    match status {
        BackendStatus::Created => "created",
        BackendStatus::Processing => "processing",
        BackendStatus::Generated => "generated",
        BackendStatus::Completed => "completed",
        BackendStatus::Failed => "failed",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Prints a render report: one headline describing how the canvas was
/// produced, then the nodes as indented lines.
pub fn print_report(report: &RenderReport) {
    match &report.outcome {
        RenderOutcome::Executed => println!("{}", "dashboard".bold()),
        RenderOutcome::StaticFallback { error } => {
            println!(
                "{} {}",
                "dashboard".bold(),
                format!("(static fallback: {error})").yellow()
            );
        }
        RenderOutcome::Failed { error } => {
            println!("{} {error}", "render failed:".red().bold());
            return;
        }
    }
    for line in canvas_lines(&report.canvas) {
        println!("{line}");
    }
}

/// One-line summary used when canvas rendering is disabled.
pub fn print_result_summary(result: &ExecutionResult) {
    println!(
        "{} {} visualizations, {} insights, code {}",
        "results:".bold(),
        result.visualizations.len(),
        result.insights.len(),
        if result.code.is_some() { "attached" } else { "absent" },
    );
}

/// Formats canvas nodes as indented terminal lines.
pub fn canvas_lines(canvas: &Canvas) -> Vec<String> {
    canvas.nodes.iter().map(node_line).collect()
}

fn node_line(node: &CanvasNode) -> String {
    match node {
        CanvasNode::Card { title, body } => {
            format!("  {} {body}", format!("{title}:").bold())
        }
        CanvasNode::Chart {
            title,
            chart_type,
            points,
        } => {
            let style = chart_type.as_deref().unwrap_or("auto");
            let count = points.as_array().map_or(0, Vec::len);
            format!("  {} {style} chart, {count} points", format!("{title}:").bold())
        }
        CanvasNode::Text { content } => format!("  {content}"),
        CanvasNode::Insight { text } => format!("  {} {text}", "insight:".yellow()),
        CanvasNode::Placeholder { title, description } => {
            let detail = description.as_deref().unwrap_or("no preview");
            format!("  {} ({detail})", title.as_str().dimmed())
        }
    }
}

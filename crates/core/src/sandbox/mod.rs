//! Code execution sandbox.
//!
//! Completed prompts arrive with generated Luau source that assembles the
//! dashboard. The sandbox runs that code in a fresh, locked-down VM with a
//! wall-clock budget and a memory cap, exposing only the `canvas`, `log`,
//! and `data` bindings. When the code is missing or misbehaves, rendering
//! falls back to a static canvas built from the result's own visualization
//! and insight declarations, so a bad script never takes the dashboard down
//! with it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mlua::{Lua, LuaSerdeExt, VmState};
use tracing::debug;

use ik_protocol::result_models::ExecutionResult;

pub mod canvas;
pub mod fallback;

pub use canvas::{Canvas, CanvasNode};

/// Globals that generated code must not reach, replaced with functions that
/// raise when called.
const BLOCKED_GLOBALS: [&str; 7] = [
    "io", "os", "require", "loadfile", "dofile", "package", "debug",
];

/// Resource ceilings applied to every script run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SandboxLimits {
    /// Wall-clock budget; the VM is interrupted once it is exceeded.
    pub timeout: Duration,

    /// Luau heap limit in bytes.
    pub memory_limit: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            memory_limit: 1024 * 1024,
        }
    }
}

/// Errors raised while rendering a result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SandboxError {
    #[error("result contains no generated code")]
    MissingCode,

    #[error("result contains no code and nothing to render statically")]
    NoContent,

    #[error("script error: {0}")]
    Script(String),

    #[error("generated code exceeded its {}ms execution budget", .budget.as_millis())]
    Timeout { budget: Duration },

    #[error("sandbox initialization failed: {0}")]
    Init(String),
}

impl From<mlua::Error> for SandboxError {
    fn from(e: mlua::Error) -> Self {
        Self::Init(e.to_string())
    }
}

/// How a render was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The generated code ran to completion.
    Executed,

    /// The code was missing or failed, but the result carried enough
    /// declarative content for a static canvas.
    StaticFallback { error: SandboxError },

    /// Nothing could be rendered.
    Failed { error: SandboxError },
}

/// Canvas plus the outcome that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub outcome: RenderOutcome,
    pub canvas: Canvas,
}

/// Runs generated dashboard code against execution results.
///
/// Every render gets a fresh VM; nothing leaks between prompts.
#[derive(Debug, Clone, Default)]
pub struct DashboardSandbox {
    limits: SandboxLimits,
}

impl DashboardSandbox {
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    /// Render a result, executing its code when possible.
    ///
    /// Never returns an error: failures are folded into the report's
    /// outcome so callers always get the best canvas available.
    pub fn render(&self, result: &ExecutionResult) -> RenderReport {
        let code = result.code.as_deref().map(str::trim).unwrap_or("");
        if code.is_empty() {
            return fall_back(result, SandboxError::MissingCode);
        }

        debug!(target: "sandbox", "executing {} bytes of generated code", code.len());
        match self.execute(code, result) {
            Ok(canvas) => RenderReport {
                outcome: RenderOutcome::Executed,
                canvas,
            },
            Err(error) => fall_back(result, error),
        }
    }

    fn execute(&self, code: &str, result: &ExecutionResult) -> Result<Canvas, SandboxError> {
        let nodes: Arc<Mutex<Vec<CanvasNode>>> = Arc::new(Mutex::new(Vec::new()));
        let timed_out = Arc::new(AtomicBool::new(false));
        let lua = self.build_vm(&nodes, &timed_out, result)?;

        if let Err(e) = lua.load(code).exec() {
            if timed_out.load(Ordering::Relaxed) {
                return Err(SandboxError::Timeout {
                    budget: self.limits.timeout,
                });
            }
            return Err(SandboxError::Script(e.to_string()));
        }

        let collected = nodes
            .lock()
            .map_err(|_| SandboxError::Script("canvas state poisoned".to_string()))?
            .clone();
        Ok(Canvas { nodes: collected })
    }

    /// Create a locked-down VM with the host bindings installed.
    fn build_vm(
        &self,
        nodes: &Arc<Mutex<Vec<CanvasNode>>>,
        timed_out: &Arc<AtomicBool>,
        result: &ExecutionResult,
    ) -> Result<Lua, SandboxError> {
        let lua = Lua::new();
        lua.sandbox(true)?;

        for name in BLOCKED_GLOBALS {
            let msg = format!("{name} is not available in dashboard scripts");
            lua.globals().set(
                name,
                lua.create_function(move |_, _: mlua::Value| {
                    Err::<(), _>(mlua::Error::RuntimeError(msg.clone()))
                })?,
            )?;
        }

        // Wall-clock watchdog. Returning an error from the interrupt aborts
        // the script, so even `while true do end` cannot outlive the budget.
        let budget = self.limits.timeout;
        let started = Instant::now();
        let flag = timed_out.clone();
        lua.set_interrupt(move |_| {
            if started.elapsed() > budget {
                flag.store(true, Ordering::Relaxed);
                return Err(mlua::Error::RuntimeError(
                    "execution budget exhausted".to_string(),
                ));
            }
            Ok(VmState::Continue)
        });

        lua.set_memory_limit(self.limits.memory_limit)?;

        // canvas API: scripts append nodes, the host keeps the list.
        let canvas = lua.create_table()?;
        let sink = nodes.clone();
        canvas.set(
            "card",
            lua.create_function(move |_, (title, body): (String, String)| {
                push_node(&sink, CanvasNode::Card { title, body })
            })?,
        )?;
        let sink = nodes.clone();
        canvas.set(
            "chart",
            lua.create_function(
                move |lua, (title, chart_type, points): (String, Option<String>, Option<mlua::Value>)| {
                    let points = match points {
                        Some(value) => lua.from_value(value)?,
                        None => serde_json::Value::Null,
                    };
                    push_node(
                        &sink,
                        CanvasNode::Chart {
                            title,
                            chart_type,
                            points,
                        },
                    )
                },
            )?,
        )?;
        let sink = nodes.clone();
        canvas.set(
            "text",
            lua.create_function(move |_, content: String| {
                push_node(&sink, CanvasNode::Text { content })
            })?,
        )?;
        let sink = nodes.clone();
        canvas.set(
            "insight",
            lua.create_function(move |_, text: String| {
                push_node(&sink, CanvasNode::Insight { text })
            })?,
        )?;
        lua.globals().set("canvas", canvas)?;

        // log API: forwarded to the host's tracing output.
        let log = lua.create_table()?;
        log.set(
            "info",
            lua.create_function(|_, message: String| {
                tracing::info!(target: "sandbox", "{message}");
                Ok(())
            })?,
        )?;
        log.set(
            "warn",
            lua.create_function(|_, message: String| {
                tracing::warn!(target: "sandbox", "{message}");
                Ok(())
            })?,
        )?;
        log.set(
            "error",
            lua.create_function(|_, message: String| {
                tracing::error!(target: "sandbox", "{message}");
                Ok(())
            })?,
        )?;
        lua.globals().set("log", log)?;

        lua.globals().set("data", lua.to_value(&data_payload(result)?)?)?;

        Ok(lua)
    }
}

fn push_node(sink: &Mutex<Vec<CanvasNode>>, node: CanvasNode) -> mlua::Result<()> {
    let mut nodes = sink
        .lock()
        .map_err(|_| mlua::Error::RuntimeError("canvas state poisoned".to_string()))?;
    nodes.push(node);
    Ok(())
}

/// Merge the result's payload with its visualization and insight lists into
/// the single `data` global scripts read from.
///
/// The lists win over same-named keys in the payload.
fn data_payload(result: &ExecutionResult) -> Result<serde_json::Value, SandboxError> {
    let mut payload = match &result.data {
        serde_json::Value::Object(map) => map.clone(),
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other.clone());
            map
        }
    };
    payload.insert(
        "visualizations".to_string(),
        serde_json::to_value(&result.visualizations)
            .map_err(|e| SandboxError::Init(e.to_string()))?,
    );
    payload.insert(
        "insights".to_string(),
        serde_json::to_value(&result.insights).map_err(|e| SandboxError::Init(e.to_string()))?,
    );
    Ok(serde_json::Value::Object(payload))
}

fn fall_back(result: &ExecutionResult, error: SandboxError) -> RenderReport {
    if result.visualizations.is_empty() && result.insights.is_empty() {
        let error = if error == SandboxError::MissingCode {
            SandboxError::NoContent
        } else {
            error
        };
        return RenderReport {
            outcome: RenderOutcome::Failed { error },
            canvas: Canvas::default(),
        };
    }
    RenderReport {
        outcome: RenderOutcome::StaticFallback { error },
        canvas: fallback::render_static(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ik_protocol::result_models::{Insight, VisualizationSpec};
    use serde_json::json;

    fn result_with_code(code: &str) -> ExecutionResult {
        ExecutionResult {
            code: Some(code.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_code_falls_back_to_static_canvas() {
        let result = ExecutionResult {
            code: None,
            visualizations: vec![VisualizationSpec {
                title: "Revenue".to_string(),
                description: None,
                chart_type: Some("bar".to_string()),
            }],
            insights: vec![Insight {
                title: None,
                text: "Up and to the right".to_string(),
            }],
            ..Default::default()
        };

        let report = DashboardSandbox::default().render(&result);
        assert_eq!(
            report.outcome,
            RenderOutcome::StaticFallback {
                error: SandboxError::MissingCode,
            }
        );
        assert_eq!(report.canvas.len(), 2);
    }

    #[test]
    fn test_empty_result_fails_with_no_content() {
        let report = DashboardSandbox::default().render(&ExecutionResult::default());
        assert_eq!(
            report.outcome,
            RenderOutcome::Failed {
                error: SandboxError::NoContent,
            }
        );
        assert!(report.canvas.is_empty());
    }

    #[test]
    fn test_script_appends_canvas_nodes_in_order() {
        let result = result_with_code(
            r#"
            canvas.card("Revenue", "Total: 1.2M")
            canvas.chart("By region", "bar", { { region = "EMEA", value = 42 } })
            canvas.text("Generated for Q3")
            canvas.insight("EMEA leads growth")
            "#,
        );

        let report = DashboardSandbox::default().render(&result);
        assert_eq!(report.outcome, RenderOutcome::Executed);
        assert_eq!(report.canvas.len(), 4);
        assert_eq!(
            report.canvas.nodes[0],
            CanvasNode::Card {
                title: "Revenue".to_string(),
                body: "Total: 1.2M".to_string(),
            }
        );
        match &report.canvas.nodes[1] {
            CanvasNode::Chart {
                title,
                chart_type,
                points,
            } => {
                assert_eq!(title, "By region");
                assert_eq!(chart_type.as_deref(), Some("bar"));
                assert_eq!(points[0]["region"], json!("EMEA"));
                assert_eq!(points[0]["value"], json!(42));
            }
            other => panic!("expected a chart node, got {other:?}"),
        }
    }

    #[test]
    fn test_data_payload_is_visible_to_scripts() {
        let result = ExecutionResult {
            code: Some(
                r#"
                canvas.card("total", tostring(data.rows[1].total))
                canvas.card("insights", tostring(#data.insights))
                "#
                .to_string(),
            ),
            data: json!({ "rows": [{ "region": "EMEA", "total": 42 }] }),
            insights: vec![Insight {
                title: None,
                text: "One insight".to_string(),
            }],
            ..Default::default()
        };

        let report = DashboardSandbox::default().render(&result);
        assert_eq!(report.outcome, RenderOutcome::Executed);
        assert_eq!(
            report.canvas.nodes[0],
            CanvasNode::Card {
                title: "total".to_string(),
                body: "42".to_string(),
            }
        );
        assert_eq!(
            report.canvas.nodes[1],
            CanvasNode::Card {
                title: "insights".to_string(),
                body: "1".to_string(),
            }
        );
    }

    #[test]
    fn test_scalar_payload_is_wrapped_under_value() {
        let result = ExecutionResult {
            code: Some(r#"canvas.text(tostring(data.value))"#.to_string()),
            data: json!(7),
            ..Default::default()
        };

        let report = DashboardSandbox::default().render(&result);
        assert_eq!(report.outcome, RenderOutcome::Executed);
        assert_eq!(
            report.canvas.nodes[0],
            CanvasNode::Text {
                content: "7".to_string(),
            }
        );
    }

    #[test]
    fn test_script_error_falls_back_when_declarative_content_exists() {
        let result = ExecutionResult {
            code: Some(r#"error("boom")"#.to_string()),
            visualizations: vec![VisualizationSpec {
                title: "Revenue".to_string(),
                description: None,
                chart_type: None,
            }],
            ..Default::default()
        };

        let report = DashboardSandbox::default().render(&result);
        match &report.outcome {
            RenderOutcome::StaticFallback {
                error: SandboxError::Script(message),
            } => assert!(message.contains("boom"), "unexpected message: {message}"),
            other => panic!("expected a script fallback, got {other:?}"),
        }
        assert_eq!(report.canvas.len(), 1);
    }

    #[test]
    fn test_script_error_without_declarative_content_fails() {
        let report = DashboardSandbox::default().render(&result_with_code(r#"error("boom")"#));
        assert!(matches!(
            report.outcome,
            RenderOutcome::Failed {
                error: SandboxError::Script(_),
            }
        ));
        assert!(report.canvas.is_empty());
    }

    #[test]
    fn test_infinite_loop_is_stopped_by_the_budget() {
        let sandbox = DashboardSandbox::new(SandboxLimits {
            timeout: Duration::from_millis(50),
            ..Default::default()
        });

        let started = Instant::now();
        let report = sandbox.render(&result_with_code("while true do end"));
        assert!(matches!(
            report.outcome,
            RenderOutcome::Failed {
                error: SandboxError::Timeout { .. },
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_blocked_globals_raise_inside_scripts() {
        let report = DashboardSandbox::default().render(&result_with_code(r#"require("json")"#));
        match &report.outcome {
            RenderOutcome::Failed {
                error: SandboxError::Script(message),
            } => assert!(
                message.contains("require is not available"),
                "unexpected message: {message}"
            ),
            other => panic!("expected a blocked-global failure, got {other:?}"),
        }
    }

    #[test]
    fn test_log_bindings_do_not_disturb_execution() {
        let report = DashboardSandbox::default().render(&result_with_code(
            r#"
            log.info("starting")
            log.warn("watch out")
            canvas.text("done")
            "#,
        ));
        assert_eq!(report.outcome, RenderOutcome::Executed);
        assert_eq!(report.canvas.len(), 1);
    }
}

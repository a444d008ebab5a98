//! Command-line driver for insight-kit.
//!
//! Parses arguments, wires a [`PromptController`] to a terminal event printer
//! and exits once the active prompt reaches a resting state. All lifecycle
//! logic lives in `ik-core`; this binary only decides what to print.

mod render;

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use colored::Colorize;
use ik_core::api::HttpPromptApi;
use ik_core::config::{load_config, AppConfig};
use ik_core::controller::PromptController;
use ik_core::sandbox::DashboardSandbox;
use ik_core::store::PromptStore;
use ik_protocol::events::PromptEvent;
use ik_protocol::prompt_models::{DatasetId, PromptId, PromptState};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter.
const LOG_ENV_VAR: &str = "INSIGHT_LOG";

/// History rows fetched when seeding the store for `show`.
const HISTORY_LIMIT: u32 = 50;

#[derive(Parser)]
#[command(name = "insight")]
#[command(version, about = "Prompt-driven analytics dashboards from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a prompt and follow it through code generation
    Submit {
        /// Analysis question to send to the backend
        prompt: String,

        /// Dataset to run the analysis against (repeat for several)
        #[arg(short = 'd', long = "dataset", value_name = "ID", required = true)]
        datasets: Vec<String>,

        /// Execute the generated code as soon as it is ready
        #[arg(long)]
        execute: bool,

        /// Skip rendering the dashboard canvas
        #[arg(long)]
        no_render: bool,
    },

    /// List prompt history
    List {
        /// Rows per page
        #[arg(long, default_value_t = 20)]
        limit: u32,

        /// Page to fetch, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Re-select a prompt from history and bring it up to date
    Show {
        /// Prompt id as printed by `submit` or `list`
        prompt_id: String,

        /// Execute the prompt if its generated code is still waiting to run
        #[arg(long)]
        execute: bool,

        /// Skip rendering the dashboard canvas
        #[arg(long)]
        no_render: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(Path::new(".")).await?;

    match cli.command {
        Command::Submit {
            prompt,
            datasets,
            execute,
            no_render,
        } => run_submit(config, prompt, datasets, execute, no_render).await,
        Command::List { limit, page } => run_list(config, limit, page).await,
        Command::Show {
            prompt_id,
            execute,
            no_render,
        } => run_show(config, prompt_id, execute, no_render).await,
    }
}

/// Diagnostics go to stderr so command output stays pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn sandbox_for(config: &AppConfig, no_render: bool) -> Option<DashboardSandbox> {
    (!no_render).then(|| DashboardSandbox::new(config.sandbox.limits()))
}

async fn run_submit(
    config: AppConfig,
    prompt: String,
    datasets: Vec<String>,
    execute: bool,
    no_render: bool,
) -> color_eyre::Result<()> {
    let sandbox = sandbox_for(&config, no_render);
    let api = Arc::new(HttpPromptApi::from_config(&config.api)?);
    let (events_tx, events_rx) = mpsc::channel(100);
    let controller = PromptController::new(api, config.polling.budget(), events_tx);

    let dataset_ids = datasets.iter().map(|id| DatasetId::from(id.as_str())).collect();
    controller
        .create_prompt(&prompt, dataset_ids, config.defaults.clone())
        .await?;

    follow(&controller, events_rx, PromptStore::new(), execute, sandbox.as_ref()).await
}

async fn run_list(config: AppConfig, limit: u32, page: u32) -> color_eyre::Result<()> {
    let api = HttpPromptApi::from_config(&config.api)?;
    let mut store = PromptStore::new();
    store.refresh(&api, limit, page).await?;

    if store.is_empty() {
        println!("no prompts on page {page}");
        return Ok(());
    }
    for record in store.prompts() {
        println!("{}", render::history_row(record));
    }
    Ok(())
}

async fn run_show(
    config: AppConfig,
    prompt_id: String,
    execute: bool,
    no_render: bool,
) -> color_eyre::Result<()> {
    let sandbox = sandbox_for(&config, no_render);
    let api = Arc::new(HttpPromptApi::from_config(&config.api)?);
    let (events_tx, events_rx) = mpsc::channel(100);
    let controller = PromptController::new(api.clone(), config.polling.budget(), events_tx);

    // Seed the history so status events have a row to project onto. A dead
    // backend surfaces through select_prompt below, not here.
    let mut store = PromptStore::new();
    if let Err(error) = store.refresh(api.as_ref(), HISTORY_LIMIT, 1).await {
        tracing::warn!(%error, "could not preload prompt history");
    }

    controller
        .select_prompt(PromptId::from(prompt_id.as_str()))
        .await?;
    follow(&controller, events_rx, store, execute, sandbox.as_ref()).await
}

/// Drains controller events until the prompt reaches a resting state.
///
/// Resting means `Completed`, `Failed`, or `ReadyForExecution` when execution
/// was not requested. Every event also updates the store so the closing
/// summary matches what `list` would show for the same prompt.
async fn follow(
    controller: &PromptController,
    mut events_rx: mpsc::Receiver<PromptEvent>,
    mut store: PromptStore,
    auto_execute: bool,
    sandbox: Option<&DashboardSandbox>,
) -> color_eyre::Result<()> {
    let mut last_line: Option<(PromptState, u8)> = None;

    while let Some(event) = events_rx.recv().await {
        store.apply_event(&event);
        match event {
            PromptEvent::PromptCreated { record } => {
                println!("{} {}", "created".green().bold(), record.id);
            }
            PromptEvent::PromptStatusUpdate {
                prompt_id,
                state,
                progress,
            } => {
                // Watches re-emit the current state on every poll tick; print
                // each distinct (state, progress) pair once.
                if last_line != Some((state, progress)) {
                    println!("{}", render::status_line(state, progress));
                    last_line = Some((state, progress));
                }
                if state == PromptState::ReadyForExecution {
                    if auto_execute {
                        controller.execute_prompt().await?;
                    } else {
                        if let Some(id) = &prompt_id {
                            println!("{}", render::ready_hint(id));
                        }
                        return Ok(());
                    }
                }
            }
            PromptEvent::PromptCompleted { prompt_id, result } => {
                match sandbox {
                    Some(sandbox) => render::print_report(&sandbox.render(&result)),
                    None => render::print_result_summary(&result),
                }
                if let Some(record) = store.get(&prompt_id) {
                    println!("{}", render::history_row(record));
                }
                return Ok(());
            }
            PromptEvent::PromptError { message, .. } => {
                return Err(eyre!(message));
            }
            PromptEvent::ControllerReset => {}
        }
    }

    Err(eyre!("event channel closed before the prompt settled"))
}

//! Entry point for the agentic orchestrator CLI: parses arguments, bootstraps
//! configuration and telemetry, then dispatches to the `cli` subcommand
//! handlers.

mod cli;
mod config;
mod errors;
mod eval;
mod executor;
mod llm;
mod memory;
mod monitors;
mod observability;
mod orchestrator;
mod perception;
mod plan_validator;
mod planner;
mod policy;
mod refinement;
mod tools;
mod trace_export;
mod types;

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use config::Config;
use observability::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "maoo")]
#[command(about = "Agentic orchestrator: perceive, plan, execute, refine, and trace a goal.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single request end to end and print its trace.
    Run {
        #[arg(long, conflicts_with = "request_file")]
        request: Option<String>,
        #[arg(long, conflicts_with = "request")]
        request_file: Option<PathBuf>,
        #[arg(long)]
        context_json: Option<String>,
        #[arg(long, default_value = "false")]
        no_export_trace: bool,
    },
    /// Run a built-in demo scenario (happy, refinement, stop).
    Demo { name: String },
    /// Replay a scenario fixture file and score the resulting traces.
    Eval {
        #[arg(long)]
        scenarios_path: PathBuf,
        #[arg(long)]
        export_dir: PathBuf,
    },
    /// Render a previously exported trace file.
    ShowTrace { path: PathBuf },
    /// List the registered tools and their metadata.
    ListTools,
    /// Seed the long-term memory store with a bootstrap entry.
    SeedMemory,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let telemetry_config = TelemetryConfig::from_env(&config.app_name, &config.log_level);
    init_telemetry(&telemetry_config);

    let result = match cli.command {
        Commands::Run { request, request_file, context_json, no_export_trace } => {
            match resolve_request(request, request_file) {
                Ok(raw_goal) => {
                    let context = parse_context(context_json);
                    cli::run_command(&config, &raw_goal, context, !no_export_trace).await
                }
                Err(e) => Err(e),
            }
        }
        Commands::Demo { name } => cli::demo_command(&config, &name).await,
        Commands::Eval { scenarios_path, export_dir } => cli::eval_command(&config, &scenarios_path, &export_dir).await,
        Commands::ShowTrace { path } => cli::show_trace_command(&path),
        Commands::ListTools => cli::list_tools_command(&config),
        Commands::SeedMemory => cli::seed_memory_command(&config),
    };

    shutdown_telemetry();

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn resolve_request(request: Option<String>, request_file: Option<PathBuf>) -> Result<String, errors::OrchestratorError> {
    if let Some(text) = request {
        return Ok(text);
    }
    if let Some(path) = request_file {
        return Ok(std::fs::read_to_string(path)?);
    }
    Err(errors::OrchestratorError::Config("one of --request or --request-file is required".to_string()))
}

fn parse_context(context_json: Option<String>) -> HashMap<String, Value> {
    context_json
        .and_then(|text| serde_json::from_str::<HashMap<String, Value>>(&text).ok())
        .unwrap_or_default()
}

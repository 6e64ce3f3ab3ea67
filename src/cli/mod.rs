//! CLI surface: `run`, `demo`, `eval`, `show-trace`, `list-tools`,
//! `seed-memory`. Each subcommand prints fixed-order plain-text sections;
//! there is no interactive UI.

pub mod render;

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::config::Config;
use crate::errors::OrchestratorError;
use crate::orchestrator::Orchestrator;
use crate::trace_export;
use crate::types::EvalScenario;

pub async fn run_command(
    config: &Config,
    raw_goal: &str,
    context: HashMap<String, Value>,
    export_trace: bool,
) -> Result<(), OrchestratorError> {
    let orchestrator = Orchestrator::new(config.clone());
    let trace = orchestrator.run_orchestration(raw_goal, context, &HashMap::new()).await;
    println!("{}", render::render_trace(&trace));

    if export_trace {
        let path = trace_export::export_trace(&config.traces_dir, &trace, "run")?;
        println!("trace exported to {}", path.display());
    }
    Ok(())
}

fn demo_request_and_overrides(name: &str) -> Result<(&'static str, HashMap<String, Value>), OrchestratorError> {
    match name {
        "happy" => Ok(("Fetch mock data and summarize", HashMap::new())),
        "refinement" => Ok(("Fetch http://127.0.0.1:8001/malformed and summarize", HashMap::new())),
        "stop" => {
            let mut overrides = HashMap::new();
            overrides.insert("max_steps".to_string(), serde_json::json!(1));
            Ok(("Fetch mock data and summarize", overrides))
        }
        other => Err(OrchestratorError::Config(format!("unknown demo scenario '{other}', expected happy|refinement|stop"))),
    }
}

pub async fn demo_command(config: &Config, name: &str) -> Result<(), OrchestratorError> {
    let (request, overrides) = demo_request_and_overrides(name)?;
    let orchestrator = Orchestrator::new(config.clone());
    let trace = orchestrator.run_orchestration(request, HashMap::new(), &overrides).await;
    println!("{}", render::render_trace(&trace));
    Ok(())
}

pub async fn eval_command(config: &Config, scenarios_path: &Path, export_dir: &Path) -> Result<(), OrchestratorError> {
    let text = std::fs::read_to_string(scenarios_path)?;
    let scenarios: Vec<EvalScenario> = serde_json::from_str(&text)?;
    let summary = crate::eval::run_scenarios(&scenarios, config, export_dir).await;
    println!("{}", render::render_eval_summary(&summary));
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

pub fn show_trace_command(path: &Path) -> Result<(), OrchestratorError> {
    let trace = trace_export::load_trace(path)?;
    println!("{}", render::render_trace(&trace));
    Ok(())
}

pub fn list_tools_command(config: &Config) -> Result<(), OrchestratorError> {
    let registry = crate::tools::ToolRegistry::new();
    let _ = config;
    for entry in registry.catalog() {
        println!("{:<12} safe_by_default={:<5} tags=[{}]  {}", entry.name, entry.safe_by_default, entry.tags.join(","), entry.description);
    }
    Ok(())
}

pub fn seed_memory_command(config: &Config) -> Result<(), OrchestratorError> {
    let long_term = crate::memory::LongTermMemory::open(&config.memory_store_path);
    long_term.add_memory_entry("facts", "seed:bootstrap", "memory store initialized", serde_json::json!({"source": "seed-memory"}));
    println!("seeded memory store at {}", config.memory_store_path.display());
    Ok(())
}

//! Scenario-driven evaluation harness: replays `run_orchestration` against
//! fixture requests and scores the resulting trace.

pub mod scoring;

use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::trace_export;
use crate::types::{EvalScenario, EvalSummary};

pub async fn run_scenarios(scenarios: &[EvalScenario], config: &Config, export_dir: &std::path::Path) -> EvalSummary {
    let orchestrator = Orchestrator::new(config.clone());
    let mut results = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let trace = orchestrator.run_orchestration(&scenario.request, scenario.context.clone(), &scenario.config_overrides).await;
        let mut result = scoring::score_trace(scenario, &trace);

        match trace_export::export_trace(export_dir, &trace, "eval") {
            Ok(path) => result.trace_path = Some(path.display().to_string()),
            Err(e) => orchestrator.logger.error("eval_trace_export_failed", &e.to_string(), serde_json::json!({"scenario_id": scenario.id})),
        }
        orchestrator.long_term.save_eval_result(&scenario.id, result.passed, &result.reason, result.score, result.trace_path.clone());

        results.push(result);
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();
    EvalSummary { total, passed, failed: total - passed, results }
}

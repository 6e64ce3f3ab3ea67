//! Top-level glue: perceive → plan → validate → execute, wrapped so that
//! structural errors never escape without a finalized, exported trace.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::errors::OrchestratorError;
use crate::executor::{self, RunContext};
use crate::llm;
use crate::memory::{LongTermMemory, ShortTermMemory};
use crate::observability::{new_run_id, new_trace_id, MetricsRegistry, StructuredLogger};
use crate::perception;
use crate::plan_validator;
use crate::planner::{HeuristicPlanner, Planner};
use crate::tools::ToolRegistry;
use crate::types::{Plan, RunStatus, RunTrace, StopReason, StopReasonType};

/// Applies scenario/CLI overrides known to the plan shape. Unknown keys are
/// ignored rather than rejected, since `config_overrides` is an open map
/// shared with future collaborators.
fn apply_plan_overrides(plan: &mut Plan, overrides: &HashMap<String, Value>) {
    if let Some(v) = overrides.get("max_steps").and_then(Value::as_i64) {
        plan.max_steps = v;
    }
    if let Some(v) = overrides.get("max_retries_per_step").and_then(Value::as_i64) {
        plan.max_retries_per_step = v;
    }
    if let Some(v) = overrides.get("max_cost_units").and_then(Value::as_i64) {
        plan.budget_guard.max_cost_units = v;
    }
    if let Some(v) = overrides.get("cost_per_step").and_then(Value::as_i64) {
        plan.budget_guard.cost_per_step = v;
    }
}

pub struct Orchestrator {
    pub config: Config,
    pub logger: StructuredLogger,
    pub metrics: MetricsRegistry,
    pub registry: ToolRegistry,
    pub long_term: LongTermMemory,
    pub planner: Arc<dyn Planner>,
    pub llm: Arc<dyn llm::LlmProvider>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let logger = StructuredLogger::new("orchestrator", if config.log_to_file { Some(config.logs_dir.join("orchestrator.log")) } else { None });
        let long_term = LongTermMemory::open(&config.memory_store_path);
        let planner: Arc<dyn Planner> = Arc::new(HeuristicPlanner::new(&config));
        let llm = llm::get_provider(&config);
        Self { config, logger, metrics: MetricsRegistry::new(), registry: ToolRegistry::new(), long_term, planner, llm }
    }

    /// Runs one request end to end. Always returns a finalized `RunTrace`,
    /// even when plan validation fails (stop reason `validation_failed`) or
    /// an unexpected structural error occurs (stop reason `failed`).
    pub async fn run_orchestration(&self, raw_goal: &str, context: HashMap<String, Value>, overrides: &HashMap<String, Value>) -> RunTrace {
        let trace_id = new_trace_id();
        let run_id = new_run_id();
        let mut trace = RunTrace::new(trace_id.clone(), run_id.clone(), Value::String(raw_goal.to_string()));
        self.metrics.inc("runs_started_total", &[]);
        self.logger.info("run_started", "run received", serde_json::json!({"trace_id": trace_id, "run_id": run_id}));

        let perception = perception::perceive(raw_goal, &context);
        trace.status = RunStatus::Perceived;
        trace.perception = Some(perception.clone());

        let catalog = self.registry.catalog();
        let mut plan = self.planner.build_plan(&perception, &catalog);
        apply_plan_overrides(&mut plan, overrides);
        trace.status = RunStatus::Planned;

        let validated = match plan_validator::validate_plan(plan, &self.registry, &self.config) {
            Ok(v) => v,
            Err(e) => return self.finalize_structural_failure(trace, e, StopReasonType::ValidationFailed),
        };
        trace.status = RunStatus::Validated;
        for warning in &validated.warnings {
            self.logger.warning("plan_validation_warning", warning, serde_json::json!({}));
        }

        let mut short_term = ShortTermMemory::new(perception.initial_state.clone());
        let mut run_ctx = RunContext {
            config: &self.config,
            logger: &self.logger,
            metrics: &self.metrics,
            registry: &self.registry,
            long_term: &self.long_term,
            planner: Some(self.planner.clone()),
            llm: self.llm.clone(),
        };

        let result = executor::execute(validated.plan, perception, &mut run_ctx, &mut short_term, &mut trace).await;

        let status_label = match result.status {
            RunStatus::Completed => "completed",
            RunStatus::Stopped => "stopped",
            RunStatus::Failed => "failed",
            _ => "unknown",
        };
        self.metrics.inc("runs_completed_total", &[("status", status_label)]);
        if result.status == RunStatus::Failed {
            self.metrics.inc("runs_failed_total", &[("status", status_label)]);
        }
        trace.metrics_snapshot = self.metrics.snapshot();

        self.long_term.save_trace(&trace);
        self.logger.info("run_finished", "run finished", serde_json::json!({"trace_id": trace_id, "status": status_label}));

        trace
    }

    fn finalize_structural_failure(&self, mut trace: RunTrace, err: OrchestratorError, kind: StopReasonType) -> RunTrace {
        self.logger.error("run_structural_failure", &err.to_string(), serde_json::json!({}));
        trace.status = RunStatus::Failed;
        trace.stop_reason = StopReason { kind, message: err.to_string() };
        trace.final_output.insert("message".to_string(), serde_json::json!("Execution finished"));
        trace.finished_at = Some(crate::observability::utc_now_iso());
        trace.metrics_snapshot = self.metrics.snapshot();
        self.metrics.inc("runs_failed_total", &[("status", "failed")]);
        trace
    }
}

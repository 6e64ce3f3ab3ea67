//! Central state machine. Processes a validated plan step by step,
//! classifying failures, consulting refinement, and arbitrating stop rules.
//! Single-threaded per run: no parallel dispatch, ordering follows plan
//! order exactly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::config::Config;
use crate::errors::FailureType;
use crate::memory::{LongTermMemory, ShortTermMemory};
use crate::monitors;
use crate::observability::{new_step_attempt_id, utc_now_iso, MetricsRegistry, StructuredLogger};
use crate::planner::Planner;
use crate::refinement::{self, RefinementInput};
use crate::tools::{ToolExecutionContext, ToolRegistry};
use crate::types::{
    ExecutionResult, FailureSignal, PerceptionResult, Plan, PlanStep, RefinementActionType, RunStatus, RunTrace,
    StepEvent, StepStatus, StopReason, StopReasonType, ToolCallRecord, ToolCallStatus,
};

pub struct RunContext<'a> {
    pub config: &'a Config,
    pub logger: &'a StructuredLogger,
    pub metrics: &'a MetricsRegistry,
    pub registry: &'a ToolRegistry,
    pub long_term: &'a LongTermMemory,
    pub planner: Option<Arc<dyn Planner>>,
    pub llm: Arc<dyn crate::llm::LlmProvider>,
}

fn success_criteria_met(criteria: &[String], short_term: &mut ShortTermMemory) -> bool {
    if criteria.is_empty() {
        return false;
    }
    let canonical =
        crate::memory::short_term::canonical_json(&json!({ "state": short_term.state, "step_outputs": short_term.step_outputs }))
            .to_lowercase();

    let mut all_met = true;
    for criterion in criteria {
        let matched = match short_term.state.get(criterion) {
            Some(value) => is_truthy(value),
            None => canonical.contains(&criterion.to_lowercase()),
        };
        short_term.criteria_progress.insert(criterion.clone(), matched);
        all_met &= matched;
    }
    all_met
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn mark_success_state(state: &mut HashMap<String, Value>, tool_name: &str) {
    let key = match tool_name {
        "http_get" | "http_post" => "http result captured",
        "db_query" => "db result captured",
        "calc" => "calculation result available",
        "file_write" => "file write acknowledged",
        "summarize" => "summary produced",
        _ => return,
    };
    state.insert(key.to_string(), json!(true));
}

pub async fn execute(
    plan: Plan,
    perception: PerceptionResult,
    ctx: &mut RunContext<'_>,
    short_term: &mut ShortTermMemory,
    trace: &mut RunTrace,
) -> ExecutionResult {
    trace.status = RunStatus::Executing;
    trace.plan = Some(plan.clone());
    let catalog = ctx.registry.catalog();

    let mut steps: Vec<PlanStep> = plan.steps.clone();
    let mut step_index: usize = 0;
    let mut completed_steps: i64 = 0;
    let mut cost_units: i64 = 0;

    let stop_reason = loop {
        if success_criteria_met(&perception.success_criteria, short_term) {
            break StopReason { kind: StopReasonType::SuccessCriteriaMet, message: "success criteria satisfied".to_string() };
        }
        if completed_steps >= plan.max_steps {
            break StopReason { kind: StopReasonType::MaxSteps, message: "reached plan.max_steps".to_string() };
        }
        if cost_units >= plan.budget_guard.max_cost_units {
            break StopReason { kind: StopReasonType::BudgetGuard, message: "reached budget_guard.max_cost_units".to_string() };
        }
        if step_index >= steps.len() {
            break StopReason {
                kind: if success_criteria_met(&perception.success_criteria, short_term) {
                    StopReasonType::SuccessCriteriaMet
                } else {
                    StopReasonType::None
                },
                message: "plan exhausted".to_string(),
            };
        }

        let step = &mut steps[step_index];
        let attempt = short_term.retry_count(&step.step_id) + 1;

        if step.tool_name == "summarize" && step.tool_args.get("text").and_then(Value::as_str) == Some("Summarize run observations") {
            let observations_json = if short_term.observations.is_empty() {
                crate::memory::short_term::canonical_json(&json!(short_term.state))
            } else {
                crate::memory::short_term::canonical_json(&json!(short_term.observations))
            };
            step.tool_args.insert("text".to_string(), json!(observations_json));
        }

        let step_id = step.step_id.clone();
        let tool_name = step.tool_name.clone();
        let tool_args = step.tool_args.clone();
        let objective = step.objective.clone();

        let started = Instant::now();
        let outcome = match ctx.registry.validate_args(&tool_name, &tool_args) {
            Ok(validated_args) => {
                let mut handler_ctx = ToolExecutionContext {
                    trace_id: &trace.trace_id,
                    run_id: &trace.run_id,
                    step_id: &step_id,
                    attempt,
                    config: ctx.config,
                    logger: ctx.logger,
                    metrics: ctx.metrics,
                    short_term: &mut *short_term,
                    long_term: ctx.long_term,
                    llm: ctx.llm.as_ref(),
                };
                ctx.registry.execute(&tool_name, &validated_args, &mut handler_ctx).await.map(|result| (validated_args, result))
            }
            Err(e) => Err(e),
        };
        let latency_ms = started.elapsed().as_millis() as i64;
        cost_units += plan.budget_guard.cost_per_step;

        let record = match &outcome {
            Ok((validated_args, result)) => ToolCallRecord {
                step_id: step_id.clone(),
                step_attempt_id: new_step_attempt_id(),
                tool_name: tool_name.clone(),
                tool_args: tool_args.clone(),
                validated_args: validated_args.clone(),
                status: ToolCallStatus::Success,
                latency_ms,
                result: Some(result.data.clone()),
                error: None,
                raw_response: result.data.clone(),
                ts: utc_now_iso(),
            },
            Err(e) => {
                let status = match e.failure_type {
                    FailureType::Timeout => ToolCallStatus::Timeout,
                    FailureType::SchemaError => ToolCallStatus::SchemaError,
                    FailureType::PolicyViolation => ToolCallStatus::PolicyBlocked,
                    _ => ToolCallStatus::Error,
                };
                ToolCallRecord {
                    step_id: step_id.clone(),
                    step_attempt_id: new_step_attempt_id(),
                    tool_name: tool_name.clone(),
                    tool_args: tool_args.clone(),
                    validated_args: HashMap::new(),
                    status,
                    latency_ms,
                    result: None,
                    error: Some(e.message.clone()),
                    raw_response: Value::Null,
                    ts: utc_now_iso(),
                }
            }
        };

        trace.tool_calls.push(record.clone());
        let status_label = match record.status {
            ToolCallStatus::Success => "success",
            ToolCallStatus::Error => "error",
            ToolCallStatus::Timeout => "timeout",
            ToolCallStatus::SchemaError => "schema_error",
            ToolCallStatus::PolicyBlocked => "policy_blocked",
        };
        ctx.metrics.inc("tool_calls_total", &[("tool", &tool_name), ("status", status_label)]);
        ctx.long_term.save_tool_outcome(
            &trace.trace_id,
            &step_id,
            &tool_name,
            status_label,
            latency_ms,
            record.result.clone().unwrap_or(Value::Null),
        );

        match outcome {
            Ok((_, result)) => {
                short_term.record_observation(&step_id, json!({ "tool_name": tool_name, "objective": objective, "result": result.data }));
                mark_success_state(&mut short_term.state, &tool_name);
                short_term.state.insert("last_tool".to_string(), json!(tool_name));
                short_term.state.insert("last_result".to_string(), result.data.clone());
                trace.step_events.push(StepEvent {
                    step_id: step_id.clone(),
                    attempt,
                    status: StepStatus::Success,
                    message: result.message,
                    observation: Some(result.data),
                    failure_signal: None,
                    refinement_decision: None,
                    ts: utc_now_iso(),
                });
                completed_steps += 1;
                step_index += 1;
            }
            Err(_) => {
                if let Some(stop) = handle_failure(
                    &record,
                    &step_id,
                    &tool_name,
                    attempt,
                    &plan,
                    &perception,
                    &catalog,
                    ctx,
                    short_term,
                    trace,
                    &mut steps,
                    &mut step_index,
                ) {
                    break stop;
                }
            }
        }
    };

    finalize(stop_reason, completed_steps, trace, short_term)
}

#[allow(clippy::too_many_arguments)]
fn handle_failure(
    record: &ToolCallRecord,
    step_id: &str,
    tool_name: &str,
    attempt: i64,
    plan: &Plan,
    perception: &PerceptionResult,
    catalog: &[crate::types::ToolCatalogEntry],
    ctx: &mut RunContext<'_>,
    short_term: &mut ShortTermMemory,
    trace: &mut RunTrace,
    steps: &mut Vec<PlanStep>,
    step_index: &mut usize,
) -> Option<StopReason> {
    let mut signals = monitors::classify(record);
    if signals.is_empty() {
        signals.push(FailureSignal {
            failure_type: FailureType::Unknown,
            retryable: false,
            severity: crate::types::Severity::Medium,
            message: "tool call failed with no classifiable signal".to_string(),
            recommended_action: "abort".to_string(),
            diagnostics: HashMap::new(),
        });
    }

    let signature = short_term.step_signature(tool_name, &record.tool_args);
    let signature_count = short_term.signature_count(&signature);
    if let Some(non_progress) = monitors::detect_non_progress(signature_count, ctx.config.non_progress_threshold, tool_name, step_id) {
        signals.insert(0, non_progress);
    }

    trace.monitor_signals.extend(signals.clone());
    let driving = signals[0].clone();

    if driving.failure_type == FailureType::NonProgress {
        trace.step_events.push(StepEvent {
            step_id: step_id.to_string(),
            attempt,
            status: StepStatus::Failed,
            message: driving.message.clone(),
            observation: None,
            failure_signal: Some(driving.clone()),
            refinement_decision: None,
            ts: utc_now_iso(),
        });
        ctx.metrics.inc("stop_rule_triggers_total", &[("rule", "non_progress")]);
        return Some(StopReason { kind: StopReasonType::NonProgress, message: driving.message });
    }

    if attempt >= plan.max_retries_per_step && driving.retryable {
        trace.step_events.push(StepEvent {
            step_id: step_id.to_string(),
            attempt,
            status: StepStatus::Failed,
            message: driving.message.clone(),
            observation: None,
            failure_signal: Some(driving.clone()),
            refinement_decision: None,
            ts: utc_now_iso(),
        });
        ctx.metrics.inc("stop_rule_triggers_total", &[("rule", "max_retries")]);
        return Some(StopReason { kind: StopReasonType::MaxRetries, message: format!("exceeded max_retries_per_step for step '{step_id}'") });
    }

    let current_step = steps[*step_index].clone();
    let remaining_steps = steps[*step_index..].to_vec();
    let decision = refinement::decide(RefinementInput {
        step: &current_step,
        signal_failure_type: driving.failure_type,
        signal_retryable: driving.retryable,
        attempt,
        max_retries_per_step: plan.max_retries_per_step,
        perception,
        catalog,
        planner: ctx.planner.as_ref(),
        remaining_steps: &remaining_steps,
        scratchpad: &short_term.state,
    });

    trace.refinements.push(decision.clone());
    short_term.record_refinement(json!({ "step_id": step_id, "action": decision.action.as_str(), "reason": decision.reason }));
    ctx.metrics.inc("refinement_actions_total", &[("action", decision.action.as_str())]);

    trace.step_events.push(StepEvent {
        step_id: step_id.to_string(),
        attempt,
        status: StepStatus::Failed,
        message: decision.reason.clone(),
        observation: None,
        failure_signal: Some(driving.clone()),
        refinement_decision: Some(decision.clone()),
        ts: utc_now_iso(),
    });

    match decision.action {
        RefinementActionType::PatchAndRetry => {
            if let Some(patch) = decision.patched_args {
                steps[*step_index].tool_args.extend(patch);
            }
            short_term.mark_retry(step_id);
            trace.status = RunStatus::Refining;
            None
        }
        RefinementActionType::ReplanRemaining => {
            if let Some(new_tail) = decision.replanned_steps {
                if new_tail.is_empty() {
                    return Some(StopReason { kind: StopReasonType::Failed, message: "replanning produced no steps".to_string() });
                }
                steps.truncate(*step_index);
                steps.extend(new_tail);
                trace.status = RunStatus::Refining;
                None
            } else {
                Some(StopReason { kind: StopReasonType::Failed, message: "replanning produced no steps".to_string() })
            }
        }
        RefinementActionType::SkipStep => {
            trace.step_events.push(StepEvent {
                step_id: step_id.to_string(),
                attempt,
                status: StepStatus::Skipped,
                message: "step skipped by refinement decision".to_string(),
                observation: None,
                failure_signal: None,
                refinement_decision: None,
                ts: utc_now_iso(),
            });
            *step_index += 1;
            None
        }
        RefinementActionType::Abort | RefinementActionType::None => {
            if driving.failure_type == FailureType::PolicyViolation {
                Some(StopReason { kind: StopReasonType::PolicyBlocked, message: driving.message })
            } else {
                Some(StopReason { kind: StopReasonType::Failed, message: decision.reason })
            }
        }
    }
}

fn finalize(stop_reason: StopReason, completed_steps: i64, trace: &mut RunTrace, short_term: &ShortTermMemory) -> ExecutionResult {
    let status = match stop_reason.kind {
        StopReasonType::SuccessCriteriaMet | StopReasonType::None => RunStatus::Completed,
        StopReasonType::MaxSteps | StopReasonType::MaxRetries | StopReasonType::BudgetGuard | StopReasonType::NonProgress => RunStatus::Stopped,
        StopReasonType::Failed | StopReasonType::PolicyBlocked | StopReasonType::ValidationFailed => RunStatus::Failed,
    };

    let mut final_output = HashMap::new();
    final_output.insert("message".to_string(), json!("Execution finished"));
    final_output.insert("state".to_string(), json!(short_term.state));
    final_output.insert("step_outputs".to_string(), json!(short_term.step_outputs));
    final_output.insert("observations".to_string(), json!(short_term.observations));
    final_output.insert("criteria_progress".to_string(), json!(short_term.criteria_progress));

    trace.status = status;
    trace.stop_reason = stop_reason.clone();
    trace.final_output = final_output.clone();
    trace.finished_at = Some(utc_now_iso());

    ExecutionResult { status, final_output, stop_reason, completed_steps }
}

//! Scores a finished `RunTrace` against an `EvalScenario`'s expectations.
//! A scenario fails on status mismatch, stop-reason mismatch, a missing
//! required substring/token, or a present forbidden token.

use serde_json::Value;

use crate::types::{EvalScenario, EvalScenarioResult, RunTrace};

/// Tokens the scenario fixtures can require/forbid: `"{tool}:{status}"` for
/// each tool call, `"refinement:{action}"` for each refinement taken, and
/// `"stop:{type}"` for the final stop reason.
fn trace_event_tokens(trace: &RunTrace) -> Vec<String> {
    let mut tokens = Vec::new();
    for call in &trace.tool_calls {
        let status = serde_json::to_value(call.status).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        tokens.push(format!("{}:{}", call.tool_name, status));
    }
    for decision in &trace.refinements {
        tokens.push(format!("refinement:{}", decision.action.as_str()));
    }
    let stop_kind = serde_json::to_value(trace.stop_reason.kind).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
    tokens.push(format!("stop:{stop_kind}"));
    tokens
}

fn status_str(trace: &RunTrace) -> String {
    serde_json::to_value(trace.status).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
}

fn stop_reason_str(trace: &RunTrace) -> String {
    serde_json::to_value(trace.stop_reason.kind).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
}

pub fn score_trace(scenario: &EvalScenario, trace: &RunTrace) -> EvalScenarioResult {
    let mut failures = Vec::new();
    let mut checks_total = 1;
    let mut checks_passed = 0;

    if status_str(trace) == scenario.expected_status {
        checks_passed += 1;
    } else {
        failures.push(format!("expected status '{}', got '{}'", scenario.expected_status, status_str(trace)));
    }

    if let Some(expected_stop) = &scenario.expected_stop_reason {
        checks_total += 1;
        if &stop_reason_str(trace) == expected_stop {
            checks_passed += 1;
        } else {
            failures.push(format!("expected stop_reason '{}', got '{}'", expected_stop, stop_reason_str(trace)));
        }
    }

    let output_text = serde_json::to_string(&Value::Object(trace.final_output.clone().into_iter().collect())).unwrap_or_default();
    for substring in &scenario.required_output_contains {
        checks_total += 1;
        if output_text.contains(substring.as_str()) {
            checks_passed += 1;
        } else {
            failures.push(format!("final_output missing required substring '{substring}'"));
        }
    }

    let tokens = trace_event_tokens(trace);
    for required in &scenario.required_trace_events {
        checks_total += 1;
        if tokens.iter().any(|t| t == required) {
            checks_passed += 1;
        } else {
            failures.push(format!("missing required trace event '{required}'"));
        }
    }
    for forbidden in &scenario.forbidden_trace_events {
        checks_total += 1;
        if tokens.iter().any(|t| t == forbidden) {
            failures.push(format!("forbidden trace event '{forbidden}' present"));
        } else {
            checks_passed += 1;
        }
    }

    let passed = failures.is_empty();
    let score = checks_passed as f64 / checks_total as f64;
    let reason = if passed { "all checks passed".to_string() } else { failures.join("; ") };

    EvalScenarioResult { scenario_id: scenario.id.clone(), passed, reason, score, trace_path: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::types::{RunStatus, StopReason, StopReasonType};

    fn base_trace() -> RunTrace {
        let mut trace = RunTrace::new("t1".to_string(), "r1".to_string(), serde_json::json!({}));
        trace.status = RunStatus::Completed;
        trace.stop_reason = StopReason { kind: StopReasonType::SuccessCriteriaMet, message: "ok".to_string() };
        trace.final_output.insert("message".to_string(), serde_json::json!("Execution finished"));
        trace
    }

    fn base_scenario() -> EvalScenario {
        EvalScenario {
            id: "s1".to_string(),
            description: "happy path".to_string(),
            request: "Fetch mock data and summarize".to_string(),
            context: HashMap::new(),
            config_overrides: HashMap::new(),
            expected_status: "COMPLETED".to_string(),
            required_output_contains: vec!["Execution finished".to_string()],
            required_trace_events: vec![],
            forbidden_trace_events: vec![],
            expected_stop_reason: Some("success_criteria_met".to_string()),
        }
    }

    #[test]
    fn passes_when_status_and_stop_reason_match() {
        let result = score_trace(&base_scenario(), &base_trace());
        assert!(result.passed);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn fails_on_status_mismatch() {
        let mut scenario = base_scenario();
        scenario.expected_status = "FAILED".to_string();
        let result = score_trace(&scenario, &base_trace());
        assert!(!result.passed);
        assert!(result.reason.contains("expected status"));
    }

    #[test]
    fn fails_on_forbidden_trace_event_present() {
        let mut trace = base_trace();
        trace.refinements.push(crate::types::RefinementDecision {
            action: crate::types::RefinementActionType::Abort,
            patched_args: None,
            replanned_steps: None,
            reason: "gave up".to_string(),
        });
        let mut scenario = base_scenario();
        scenario.forbidden_trace_events.push("refinement:abort".to_string());
        let result = score_trace(&scenario, &trace);
        assert!(!result.passed);
    }
}

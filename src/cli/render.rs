//! Fixed-order plain-text rendering of a `RunTrace`: request, perception,
//! plan, tool-calls table, final output, status. No interactive UI.

use crate::types::{EvalSummary, RunTrace};

pub fn render_trace(trace: &RunTrace) -> String {
    let mut out = String::new();

    out.push_str("=== REQUEST ===\n");
    out.push_str(&format!("{}\n\n", trace.request));

    out.push_str("=== PERCEPTION ===\n");
    match &trace.perception {
        Some(p) => {
            out.push_str(&format!("intent: {}\n", p.intent));
            out.push_str(&format!("task_type: {:?}\n", p.task_type));
            out.push_str(&format!("success_criteria: {}\n", p.success_criteria.join(", ")));
            out.push_str(&format!("constraints: {}\n", p.constraints.join(", ")));
        }
        None => out.push_str("(none)\n"),
    }
    out.push('\n');

    out.push_str("=== PLAN ===\n");
    match &trace.plan {
        Some(plan) => {
            for step in &plan.steps {
                out.push_str(&format!("- [{}] {} -> {}\n", step.step_id, step.tool_name, step.objective));
            }
            out.push_str(&format!(
                "max_steps={} max_retries_per_step={} max_cost_units={}\n",
                plan.max_steps, plan.max_retries_per_step, plan.budget_guard.max_cost_units
            ));
        }
        None => out.push_str("(none)\n"),
    }
    out.push('\n');

    out.push_str("=== TOOL CALLS ===\n");
    out.push_str(&format!("{:<10} {:<12} {:<8} {:<14} {:>10}\n", "step", "tool", "attempt", "status", "latency_ms"));
    for (idx, call) in trace.tool_calls.iter().enumerate() {
        out.push_str(&format!(
            "{:<10} {:<12} {:<8} {:<14} {:>10}\n",
            call.step_id,
            call.tool_name,
            idx + 1,
            format!("{:?}", call.status),
            call.latency_ms
        ));
    }
    out.push('\n');

    out.push_str("=== FINAL OUTPUT ===\n");
    for (key, value) in &trace.final_output {
        out.push_str(&format!("{key}: {value}\n"));
    }
    out.push('\n');

    out.push_str("=== STATUS ===\n");
    out.push_str(&format!("status: {:?}\n", trace.status));
    out.push_str(&format!("stop_reason: {:?} ({})\n", trace.stop_reason.kind, trace.stop_reason.message));

    out
}

pub fn render_eval_summary(summary: &EvalSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== EVAL SUMMARY ({}/{} passed) ===\n", summary.passed, summary.total));
    for result in &summary.results {
        let marker = if result.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!("[{marker}] {} score={:.2} {}\n", result.scenario_id, result.score, result.reason));
    }
    out
}

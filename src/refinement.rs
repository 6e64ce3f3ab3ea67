//! Chooses one of {patch_and_retry, replan_remaining, skip_step, abort}
//! given a failure and step context. Pure and deterministic: never touches
//! the registry or short-term memory, only reads what it is given.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::errors::FailureType;
use crate::planner::Planner;
use crate::types::{PerceptionResult, PlanStep, RefinementActionType, RefinementDecision, ToolCatalogEntry};

pub struct RefinementInput<'a> {
    pub step: &'a PlanStep,
    pub signal_failure_type: FailureType,
    pub signal_retryable: bool,
    pub attempt: i64,
    pub max_retries_per_step: i64,
    pub perception: &'a PerceptionResult,
    pub catalog: &'a [ToolCatalogEntry],
    pub planner: Option<&'a Arc<dyn Planner>>,
    pub remaining_steps: &'a [PlanStep],
    pub scratchpad: &'a HashMap<String, Value>,
}

fn prefers_replan(fallback_strategy: &str) -> bool {
    fallback_strategy.contains("replan") || fallback_strategy.contains("alternate")
}

fn current_timeout(step: &PlanStep) -> f64 {
    step.tool_args.get("timeout_s").and_then(Value::as_f64).unwrap_or(2.0)
}

fn replan(input: &RefinementInput<'_>) -> Option<Vec<PlanStep>> {
    let planner = input.planner?;
    let mut scratchpad = input.scratchpad.clone();
    scratchpad.insert(
        "failure_context".to_string(),
        json!({
            "failure_type": input.signal_failure_type.as_str(),
            "step_id": input.step.step_id,
            "tool_name": input.step.tool_name,
        }),
    );
    let steps = planner.replan_remaining(input.perception, input.remaining_steps, input.catalog, &scratchpad);
    if steps.is_empty() {
        None
    } else {
        Some(steps)
    }
}

pub fn decide(input: RefinementInput<'_>) -> RefinementDecision {
    // 1. non_progress always aborts.
    if input.signal_failure_type == FailureType::NonProgress {
        return RefinementDecision {
            action: RefinementActionType::Abort,
            patched_args: None,
            replanned_steps: None,
            reason: "non-progress signal is never retried".to_string(),
        };
    }

    // 2. planner-preferred replan on schema_error/bad_response.
    if matches!(input.signal_failure_type, FailureType::SchemaError | FailureType::BadResponse)
        && prefers_replan(&input.step.fallback_strategy)
    {
        if let Some(steps) = replan(&input) {
            return RefinementDecision {
                action: RefinementActionType::ReplanRemaining,
                patched_args: None,
                replanned_steps: Some(steps),
                reason: "fallback strategy prefers replanning on schema/response failure".to_string(),
            };
        }
    }

    // 3. retryable and under the retry ceiling.
    if input.signal_retryable && input.attempt < input.max_retries_per_step {
        if input.signal_failure_type == FailureType::Timeout
            && matches!(input.step.tool_name.as_str(), "http_get" | "http_post")
        {
            let new_timeout = (current_timeout(input.step) * 2.0).min(10.0);
            let mut patch = HashMap::new();
            patch.insert("timeout_s".to_string(), json!(new_timeout));
            return RefinementDecision {
                action: RefinementActionType::PatchAndRetry,
                patched_args: Some(patch),
                replanned_steps: None,
                reason: format!("raising timeout_s to {new_timeout} after a timeout"),
            };
        }

        if input.signal_failure_type == FailureType::SchemaError
            && input.step.tool_name == "http_get"
            && !prefers_replan(&input.step.fallback_strategy)
        {
            let mut patch = HashMap::new();
            patch.insert("allow_malformed".to_string(), json!(true));
            patch.insert("expect_json".to_string(), json!(false));
            return RefinementDecision {
                action: RefinementActionType::PatchAndRetry,
                patched_args: Some(patch),
                replanned_steps: None,
                reason: "relaxing response schema expectations after a schema error".to_string(),
            };
        }

        return RefinementDecision {
            action: RefinementActionType::PatchAndRetry,
            patched_args: None,
            replanned_steps: None,
            reason: "retrying unchanged, attempt below the retry ceiling".to_string(),
        };
    }

    // 4. broader planner replan.
    if matches!(
        input.signal_failure_type,
        FailureType::SchemaError | FailureType::BadResponse | FailureType::ToolError | FailureType::Timeout
    ) && (prefers_replan(&input.step.fallback_strategy) || input.signal_failure_type == FailureType::SchemaError)
    {
        if let Some(steps) = replan(&input) {
            return RefinementDecision {
                action: RefinementActionType::ReplanRemaining,
                patched_args: None,
                replanned_steps: Some(steps),
                reason: "replanning after exhausting direct retries".to_string(),
            };
        }
    }

    // 5. skip if the strategy names it.
    if input.step.fallback_strategy.contains("skip") {
        return RefinementDecision {
            action: RefinementActionType::SkipStep,
            patched_args: None,
            replanned_steps: None,
            reason: "fallback strategy allows skipping this step".to_string(),
        };
    }

    // 6. otherwise abort.
    RefinementDecision {
        action: RefinementActionType::Abort,
        patched_args: None,
        replanned_steps: None,
        reason: "no applicable recovery strategy remains".to_string(),
    }
}

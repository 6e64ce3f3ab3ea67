//! Rejects plans referencing unknown tools, invalid args, or policy
//! violations. Any failure is fatal to the run with stop reason
//! `validation_failed`.

use crate::config::Config;
use crate::errors::OrchestratorError;
use crate::policy;
use crate::tools::ToolRegistry;
use crate::types::{Plan, ValidatedPlan};

pub fn validate_plan(plan: Plan, registry: &ToolRegistry, config: &Config) -> Result<ValidatedPlan, OrchestratorError> {
    let mut warnings = Vec::new();
    let mut normalized_steps = Vec::with_capacity(plan.steps.len());
    let Plan { steps, max_steps, max_retries_per_step, budget_guard, planner_notes } = plan;

    for step in steps.into_iter() {
        if !registry.has(&step.tool_name) {
            return Err(OrchestratorError::PlanValidation(format!(
                "step '{}' references unknown tool '{}'",
                step.step_id, step.tool_name
            )));
        }

        check_policy_for_step(&step, config).map_err(|e| {
            OrchestratorError::PlanValidation(format!("step '{}' failed policy gate: {}", step.step_id, e.message))
        })?;

        let validated_args = registry.validate_args(&step.tool_name, &step.tool_args).map_err(|e| {
            OrchestratorError::PlanValidation(format!("step '{}' failed schema validation: {}", step.step_id, e.message))
        })?;

        if step.expected_observation.trim().is_empty() {
            warnings.push(format!("step '{}' has no expected_observation", step.step_id));
        }

        let mut normalized = step;
        normalized.tool_args = validated_args;
        normalized_steps.push(normalized);
    }

    Ok(ValidatedPlan {
        plan: Plan { steps: normalized_steps, max_steps, max_retries_per_step, budget_guard, planner_notes },
        warnings,
    })
}

fn check_policy_for_step(
    step: &crate::types::PlanStep,
    config: &Config,
) -> Result<(), crate::errors::PolicyViolationError> {
    match step.tool_name.as_str() {
        "http_get" | "http_post" => policy::check_http(config, &step.tool_args),
        "file_write" => {
            let relative_path = step.tool_args.get("relative_path").and_then(|v| v.as_str()).unwrap_or("");
            policy::check_file_write(relative_path)
        }
        "db_query" => {
            let sql = step.tool_args.get("sql").and_then(|v| v.as_str()).unwrap_or("");
            let readonly = step.tool_args.get("readonly").and_then(|v| v.as_bool()).unwrap_or(true);
            policy::check_db_query(config, sql, readonly)
        }
        "calc" => {
            let expression = step.tool_args.get("expression").and_then(|v| v.as_str()).unwrap_or("");
            policy::check_calc_expression(expression)
        }
        _ => Ok(()),
    }
}

//! Builds an initial `Plan` from a `PerceptionResult` and the tool catalog;
//! also serves `replan_remaining` during refinement. Heuristic
//! implementation mirroring the perception keywords.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::config::Config;
use crate::types::{Plan, PerceptionResult, PlanStep, ToolCatalogEntry};

pub trait Planner: Send + Sync {
    fn build_plan(&self, perception: &PerceptionResult, catalog: &[ToolCatalogEntry]) -> Plan;

    fn replan_remaining(
        &self,
        perception: &PerceptionResult,
        remaining_steps: &[PlanStep],
        catalog: &[ToolCatalogEntry],
        scratchpad: &HashMap<String, Value>,
    ) -> Vec<PlanStep>;
}

pub struct HeuristicPlanner {
    mock_api_base_url: String,
}

impl HeuristicPlanner {
    pub fn new(config: &Config) -> Self {
        Self { mock_api_base_url: config.mock_api_base_url.clone() }
    }
}

fn step(step_id: &str, objective: &str, tool_name: &str, tool_args: HashMap<String, Value>, fallback_strategy: &str) -> PlanStep {
    PlanStep {
        step_id: step_id.to_string(),
        objective: objective.to_string(),
        tool_name: tool_name.to_string(),
        tool_args,
        expected_observation: format!("{tool_name} succeeds and produces a usable result"),
        fallback_strategy: fallback_strategy.to_string(),
    }
}

impl Planner for HeuristicPlanner {
    fn build_plan(&self, perception: &PerceptionResult, catalog: &[ToolCatalogEntry]) -> Plan {
        let available: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
        let mut steps = Vec::new();
        let url = perception
            .entities
            .get("url")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{}/data", self.mock_api_base_url));

        let wants_http = perception.success_criteria.iter().any(|c| c == "http result captured");
        let wants_db = perception.success_criteria.iter().any(|c| c == "db result captured");
        let wants_calc = perception.success_criteria.iter().any(|c| c == "calculation result available");
        let wants_write = perception.success_criteria.iter().any(|c| c == "file write acknowledged");
        let wants_summary = perception.success_criteria.iter().any(|c| c == "summary produced");

        if wants_http && available.contains(&"http_get") {
            let mut args = HashMap::new();
            args.insert("url".to_string(), json!(url));
            steps.push(step("s_http", "fetch the target resource", "http_get", args, "retry_or_abort"));
        }
        if wants_db && available.contains(&"db_query") {
            let mut args = HashMap::new();
            args.insert("sql".to_string(), json!("SELECT id, label, value FROM demo_numbers ORDER BY id"));
            steps.push(step("s_db", "query the long-term store", "db_query", args, "retry_or_abort"));
        }
        if wants_calc && available.contains(&"calc") {
            let mut args = HashMap::new();
            args.insert("expression".to_string(), json!("2 + 2"));
            steps.push(step("s_calc", "evaluate the requested arithmetic", "calc", args, "retry_or_abort"));
        }
        if wants_write && available.contains(&"file_write") {
            let mut args = HashMap::new();
            args.insert("relative_path".to_string(), json!("notes/run-output.txt"));
            args.insert("content".to_string(), json!("run output placeholder"));
            steps.push(step("s_write", "persist the run output", "file_write", args, "retry_or_abort"));
        }
        if (wants_summary || steps.is_empty()) && available.contains(&"summarize") {
            let mut args = HashMap::new();
            args.insert("text".to_string(), json!("Summarize run observations"));
            steps.push(step("s_summarize", "summarize what happened", "summarize", args, "retry_or_abort"));
        }

        Plan { steps, planner_notes: vec![format!("heuristic plan for task_type={:?}", perception.task_type)], ..Plan::default() }
    }

    fn replan_remaining(
        &self,
        _perception: &PerceptionResult,
        remaining_steps: &[PlanStep],
        _catalog: &[ToolCatalogEntry],
        scratchpad: &HashMap<String, Value>,
    ) -> Vec<PlanStep> {
        let failure_type = scratchpad
            .get("failure_context")
            .and_then(|fc| fc.get("failure_type"))
            .and_then(Value::as_str)
            .unwrap_or("");

        remaining_steps
            .iter()
            .map(|original| {
                let mut patched = original.clone();
                match failure_type {
                    "schema_error" | "bad_response" if patched.tool_name == "http_get" || patched.tool_name == "http_post" => {
                        patched.tool_args.insert("url".to_string(), json!(format!("{}/data", self.mock_api_base_url)));
                    }
                    "timeout" => {
                        let current = patched.tool_args.get("timeout_s").and_then(Value::as_f64).unwrap_or(2.0);
                        patched.tool_args.insert("timeout_s".to_string(), json!((current * 2.0).min(10.0)));
                    }
                    _ => {}
                }
                patched
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config() -> Config {
        Config {
            app_name: "test".into(),
            env: "test".into(),
            log_level: "info".into(),
            log_to_file: false,
            runtime_dir: "runtime".into(),
            logs_dir: "runtime/logs".into(),
            traces_dir: "runtime/traces".into(),
            workspace_dir: "runtime/workspace".into(),
            file_workspace_root: "runtime/workspace".into(),
            memory_store_path: "runtime/memory/store.json".into(),
            no_llm_mode: true,
            openai_base_url: None,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            enable_real_http: false,
            allowed_http_hosts: vec!["localhost".into(), "127.0.0.1".into()],
            mock_api_base_url: "http://127.0.0.1:8001".into(),
            default_http_timeout_s: 2.0,
            default_max_steps: 12,
            default_max_retries_per_step: 2,
            default_budget_units: 50,
            non_progress_threshold: 3,
            random_seed: 42,
            enable_db_writes: false,
        }
    }

    fn catalog() -> Vec<ToolCatalogEntry> {
        vec!["http_get", "http_post", "db_query", "calc", "file_write", "summarize"]
            .into_iter()
            .map(|name| ToolCatalogEntry { name: name.to_string(), description: String::new(), tags: vec![], safe_by_default: true })
            .collect()
    }

    #[test]
    fn builds_http_then_summarize_for_composite_goal() {
        let planner = HeuristicPlanner::new(&test_config());
        let perception = crate::perception::perceive("Fetch mock data and summarize", &HashMap::new());
        let plan = planner.build_plan(&perception, &catalog());
        let names: Vec<&str> = plan.steps.iter().map(|s| s.tool_name.as_str()).collect();
        assert_eq!(names, vec!["http_get", "summarize"]);
    }

    #[test]
    fn replan_rewrites_url_on_schema_error() {
        let planner = HeuristicPlanner::new(&test_config());
        let mut args = HashMap::new();
        args.insert("url".to_string(), json!("http://127.0.0.1:8001/malformed"));
        let steps = vec![step("s_http", "fetch", "http_get", args, "replan_to_alternate_endpoint")];
        let mut scratchpad = HashMap::new();
        scratchpad.insert("failure_context".to_string(), json!({"failure_type": "schema_error"}));
        let replanned = planner.replan_remaining(
            &crate::perception::perceive("fetch malformed data", &HashMap::new()),
            &steps,
            &catalog(),
            &scratchpad,
        );
        assert_eq!(replanned[0].tool_args.get("url").unwrap(), "http://127.0.0.1:8001/data");
    }
}

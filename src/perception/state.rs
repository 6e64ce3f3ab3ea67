//! Derives success criteria and initial state from the extracted intent and
//! task type, mirroring the state table documented alongside the data model.

use std::collections::HashMap;

use serde_json::Value;

use super::intent::ExtractedIntent;
use crate::types::{PerceptionResult, TaskType};

pub fn build(
    raw_goal: &str,
    extracted: &ExtractedIntent,
    task_type: TaskType,
    context: &HashMap<String, Value>,
) -> PerceptionResult {
    let mut entities = HashMap::new();
    if let Some(url) = &extracted.url {
        entities.insert("url".to_string(), Value::String(url.clone()));
    }

    let mut constraints = Vec::new();
    if !extracted.wants_fetch && !extracted.wants_submit && extracted.url.is_none() {
        constraints.push("no explicit network target found in goal text".to_string());
    }

    let mut success_criteria = Vec::new();
    if extracted.wants_fetch || extracted.wants_submit || extracted.url.is_some() {
        success_criteria.push("http result captured".to_string());
    }
    if extracted.wants_db {
        success_criteria.push("db result captured".to_string());
    }
    if extracted.wants_calc {
        success_criteria.push("calculation result available".to_string());
    }
    if extracted.wants_write {
        success_criteria.push("file write acknowledged".to_string());
    }
    if extracted.wants_summarize {
        success_criteria.push("summary produced".to_string());
    }
    if success_criteria.is_empty() {
        success_criteria.push("http result captured".to_string());
    }

    let mut initial_state = HashMap::new();
    initial_state.insert("goal".to_string(), Value::String(raw_goal.to_string()));
    for (k, v) in context {
        initial_state.insert(k.clone(), v.clone());
    }

    PerceptionResult {
        intent: raw_goal.trim().to_string(),
        task_type,
        entities,
        constraints,
        success_criteria,
        initial_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::intent::extract;

    #[test]
    fn derives_http_and_summary_criteria_for_composite_goal() {
        let goal = "Fetch mock data and summarize";
        let extracted = extract(goal);
        let result = build(goal, &extracted, TaskType::Composite, &HashMap::new());
        assert!(result.success_criteria.contains(&"http result captured".to_string()));
        assert!(result.success_criteria.contains(&"summary produced".to_string()));
    }
}

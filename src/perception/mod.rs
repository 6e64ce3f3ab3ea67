//! Turns a raw natural-language goal plus optional context into a
//! `PerceptionResult`. Heuristic (regex/keyword) implementation — no
//! network calls.

mod classifier;
mod intent;
mod state;

use std::collections::HashMap;

use serde_json::Value;

use crate::types::PerceptionResult;

pub fn perceive(raw_goal: &str, context: &HashMap<String, Value>) -> PerceptionResult {
    let extracted = intent::extract(raw_goal);
    let task_type = classifier::classify(raw_goal, &extracted);
    state::build(raw_goal, &extracted, task_type, context)
}

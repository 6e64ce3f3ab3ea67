//! Classifies a raw goal plus its extracted intent into a `TaskType`.

use super::intent::ExtractedIntent;
use crate::types::TaskType;

pub fn classify(raw_goal: &str, extracted: &ExtractedIntent) -> TaskType {
    let lower = raw_goal.to_lowercase();
    let capability_count = [
        extracted.wants_fetch,
        extracted.wants_submit,
        extracted.wants_db,
        extracted.wants_calc,
        extracted.wants_write,
        extracted.wants_summarize,
    ]
    .iter()
    .filter(|b| **b)
    .count();

    if capability_count >= 2 {
        return TaskType::Composite;
    }
    if extracted.wants_db {
        return TaskType::Database;
    }
    if extracted.wants_calc {
        return TaskType::Calculation;
    }
    if extracted.wants_write {
        return TaskType::FileOps;
    }
    if extracted.wants_summarize {
        return TaskType::Summarization;
    }
    if extracted.wants_submit {
        return TaskType::DataSubmission;
    }
    if extracted.wants_fetch || extracted.url.is_some() || lower.contains("data") {
        return TaskType::DataRetrieval;
    }
    TaskType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::intent::extract;

    #[test]
    fn composite_when_multiple_capabilities_requested() {
        let extracted = extract("Fetch mock data and summarize");
        assert_eq!(classify("Fetch mock data and summarize", &extracted), TaskType::Composite);
    }

    #[test]
    fn single_capability_classifies_directly() {
        let extracted = extract("calculate 2 + 2");
        assert_eq!(classify("calculate 2 + 2", &extracted), TaskType::Calculation);
    }
}

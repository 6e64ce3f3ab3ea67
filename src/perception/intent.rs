//! Regex/keyword extraction: a URL, and the capability keywords implied by
//! the goal text.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").unwrap());

#[derive(Debug, Clone, Default)]
pub struct ExtractedIntent {
    pub url: Option<String>,
    pub wants_fetch: bool,
    pub wants_submit: bool,
    pub wants_db: bool,
    pub wants_calc: bool,
    pub wants_write: bool,
    pub wants_summarize: bool,
}

pub fn extract(raw_goal: &str) -> ExtractedIntent {
    let lower = raw_goal.to_lowercase();
    ExtractedIntent {
        url: URL_RE.find(raw_goal).map(|m| m.as_str().to_string()),
        wants_fetch: ["fetch", "get", "retrieve", "read"].iter().any(|kw| lower.contains(kw)),
        wants_submit: ["post", "submit", "send"].iter().any(|kw| lower.contains(kw)),
        wants_db: ["db", "database", "query", "sql"].iter().any(|kw| lower.contains(kw)),
        wants_calc: ["calc", "calculate", "compute", "sum"].iter().any(|kw| lower.contains(kw)),
        wants_write: ["write", "save file", "persist"].iter().any(|kw| lower.contains(kw)),
        wants_summarize: ["summarize", "summary", "summarise"].iter().any(|kw| lower.contains(kw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_url_and_capability_keywords() {
        let extracted = extract("Fetch http://127.0.0.1:8001/data and summarize it");
        assert_eq!(extracted.url.as_deref(), Some("http://127.0.0.1:8001/data"));
        assert!(extracted.wants_fetch);
        assert!(extracted.wants_summarize);
        assert!(!extracted.wants_db);
    }
}

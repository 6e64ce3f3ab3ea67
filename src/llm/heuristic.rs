//! No-network provider: trims input text to its first N sentences. This is
//! the provider exercised by default (`no_llm_mode=true`) and in demos.

use async_trait::async_trait;

use crate::errors::ToolExecutionError;

use super::LlmProvider;

pub struct HeuristicProvider;

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(|c| c == '.' || c == '!' || c == '?')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl LlmProvider for HeuristicProvider {
    async fn generate_text(&self, prompt: &str, max_sentences: usize) -> Result<String, ToolExecutionError> {
        let sentences = split_sentences(prompt);
        let take = max_sentences.max(1);
        let chosen: Vec<&str> = sentences.into_iter().take(take).collect();
        if chosen.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}.", chosen.join(". ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn truncates_to_requested_sentence_count() {
        let provider = HeuristicProvider;
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence.";
        let summary = provider.generate_text(text, 2).await.unwrap();
        assert_eq!(summary, "First sentence. Second sentence.");
    }

    #[tokio::test]
    async fn empty_input_yields_empty_summary() {
        let provider = HeuristicProvider;
        let summary = provider.generate_text("   ", 3).await.unwrap();
        assert_eq!(summary, "");
    }
}

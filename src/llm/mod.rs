//! Pluggable text generation used by the `summarize` tool and available to
//! perception/planner. Heuristic (no-network) provider is the default; an
//! OpenAI-compatible HTTP provider is the alternate, selected only when
//! `no_llm_mode` is false and credentials are configured.

pub mod heuristic;
pub mod openai_compatible;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::ToolExecutionError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_text(&self, prompt: &str, max_sentences: usize) -> Result<String, ToolExecutionError>;
}

pub fn get_provider(config: &Config) -> Arc<dyn LlmProvider> {
    if !config.no_llm_mode && config.openai_base_url.is_some() && config.openai_api_key.is_some() {
        return Arc::new(openai_compatible::OpenAiCompatibleProvider::from_config(config));
    }
    Arc::new(heuristic::HeuristicProvider)
}

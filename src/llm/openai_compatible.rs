//! Posts to a configurable chat-completions endpoint over the shared HTTP
//! client. Only selected when `no_llm_mode` is false and credentials exist.

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::errors::{FailureType, ToolExecutionError};

use super::LlmProvider;

pub struct OpenAiCompatibleProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.openai_base_url.clone().unwrap_or_default(),
            api_key: config.openai_api_key.clone().unwrap_or_default(),
            model: config.openai_model.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn generate_text(&self, prompt: &str, max_sentences: usize) -> Result<String, ToolExecutionError> {
        let instruction = format!("Summarize the following in at most {max_sentences} sentences:\n\n{prompt}");
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": instruction}],
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolExecutionError::new(FailureType::Timeout, format!("llm request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ToolExecutionError::new(
                FailureType::ToolError,
                format!("llm provider returned status {}", response.status()),
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolExecutionError::new(FailureType::SchemaError, format!("llm response not JSON: {e}")))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ToolExecutionError::new(FailureType::SchemaError, "llm response missing choices[0].message.content"))
    }
}

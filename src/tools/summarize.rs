use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{FailureType, ToolExecutionError};

use super::{get_str, ToolExecutionContext, ToolHandler, ToolResult};

pub struct SummarizeHandler;

#[async_trait]
impl ToolHandler for SummarizeHandler {
    fn validate_args(&self, raw_args: &HashMap<String, Value>) -> Result<HashMap<String, Value>, ToolExecutionError> {
        let text = get_str(raw_args, "text")
            .ok_or_else(|| ToolExecutionError::new(FailureType::SchemaError, "summarize requires a string 'text'"))?;
        let max_sentences = raw_args.get("max_sentences").and_then(|v| v.as_i64()).unwrap_or(3);
        let style = get_str(raw_args, "style").unwrap_or_else(|| "brief".to_string());
        if style != "brief" && style != "bullet" {
            return Err(ToolExecutionError::new(FailureType::SchemaError, format!("unknown summarize style: {style}")));
        }
        let mut validated = HashMap::new();
        validated.insert("text".to_string(), json!(text));
        validated.insert("max_sentences".to_string(), json!(max_sentences));
        validated.insert("style".to_string(), json!(style));
        Ok(validated)
    }

    async fn invoke(
        &self,
        validated_args: &HashMap<String, Value>,
        ctx: &mut ToolExecutionContext<'_>,
    ) -> Result<ToolResult, ToolExecutionError> {
        let text = get_str(validated_args, "text").unwrap();
        let max_sentences = validated_args.get("max_sentences").and_then(|v| v.as_i64()).unwrap_or(3).max(1) as usize;
        let style = get_str(validated_args, "style").unwrap_or_else(|| "brief".to_string());

        let generated = ctx.llm.generate_text(&text, max_sentences).await?;

        let summary = if style == "bullet" {
            generated
                .split(". ")
                .map(|s| s.trim().trim_end_matches('.'))
                .filter(|s| !s.is_empty())
                .map(|s| format!("- {s}"))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            generated
        };

        Ok(ToolResult { ok: true, message: "summarize completed".to_string(), data: json!({ "summary": summary }) })
    }
}

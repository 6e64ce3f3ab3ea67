use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{FailureType, ToolExecutionError};
use crate::policy;

use super::{get_bool, get_str, ToolExecutionContext, ToolHandler, ToolResult};

pub struct FileWriteHandler;

#[async_trait]
impl ToolHandler for FileWriteHandler {
    fn validate_args(&self, raw_args: &HashMap<String, Value>) -> Result<HashMap<String, Value>, ToolExecutionError> {
        let relative_path = get_str(raw_args, "relative_path")
            .ok_or_else(|| ToolExecutionError::new(FailureType::SchemaError, "file_write requires a string 'relative_path'"))?;
        let content = get_str(raw_args, "content")
            .ok_or_else(|| ToolExecutionError::new(FailureType::SchemaError, "file_write requires a string 'content'"))?;
        let mut validated = HashMap::new();
        validated.insert("relative_path".to_string(), json!(relative_path));
        validated.insert("content".to_string(), json!(content));
        validated.insert("overwrite".to_string(), json!(get_bool(raw_args, "overwrite", false)));
        validated.insert("create_dirs".to_string(), json!(get_bool(raw_args, "create_dirs", true)));
        Ok(validated)
    }

    async fn invoke(
        &self,
        validated_args: &HashMap<String, Value>,
        ctx: &mut ToolExecutionContext<'_>,
    ) -> Result<ToolResult, ToolExecutionError> {
        let relative_path = get_str(validated_args, "relative_path").unwrap();
        policy::check_file_write(&relative_path)?;

        let content = get_str(validated_args, "content").unwrap();
        let overwrite = get_bool(validated_args, "overwrite", false);
        let create_dirs = get_bool(validated_args, "create_dirs", true);

        let full_path = ctx.config.file_workspace_root.join(&relative_path);
        if full_path.exists() && !overwrite {
            return Err(ToolExecutionError::new(FailureType::ToolError, format!("file already exists: {relative_path}"))
                .with_diagnostics(&[("relative_path", json!(relative_path))]));
        }
        if create_dirs {
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ToolExecutionError::new(FailureType::ToolError, format!("failed to create directories: {e}")))?;
            }
        }
        std::fs::write(&full_path, content.as_bytes())
            .map_err(|e| ToolExecutionError::new(FailureType::ToolError, format!("failed to write file: {e}")))?;

        let data = json!({ "path": relative_path, "bytes_written": content.len() });
        Ok(ToolResult { ok: true, message: "file_write completed".to_string(), data })
    }
}

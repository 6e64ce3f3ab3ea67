use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{FailureType, ToolExecutionError};
use crate::policy;

use super::{get_bool, get_str, ToolExecutionContext, ToolHandler, ToolResult};

pub struct DbQueryHandler;

#[async_trait]
impl ToolHandler for DbQueryHandler {
    fn validate_args(&self, raw_args: &HashMap<String, Value>) -> Result<HashMap<String, Value>, ToolExecutionError> {
        let sql = get_str(raw_args, "sql")
            .ok_or_else(|| ToolExecutionError::new(FailureType::SchemaError, "db_query requires a string 'sql'"))?;
        let mut validated = HashMap::new();
        validated.insert("sql".to_string(), json!(sql));
        validated.insert("params".to_string(), raw_args.get("params").cloned().unwrap_or_else(|| json!([])));
        validated.insert("readonly".to_string(), json!(get_bool(raw_args, "readonly", true)));
        if let Some(limit) = raw_args.get("limit").and_then(|v| v.as_i64()) {
            validated.insert("limit".to_string(), json!(limit));
        }
        Ok(validated)
    }

    async fn invoke(
        &self,
        validated_args: &HashMap<String, Value>,
        ctx: &mut ToolExecutionContext<'_>,
    ) -> Result<ToolResult, ToolExecutionError> {
        let sql = get_str(validated_args, "sql").unwrap();
        let readonly = get_bool(validated_args, "readonly", true);
        policy::check_db_query(ctx.config, &sql, readonly)?;

        let params: Vec<Value> = validated_args
            .get("params")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut rows = ctx
            .long_term
            .query(&sql, &params)
            .map_err(|e| ToolExecutionError::new(FailureType::ToolError, e))?;

        if let Some(limit) = validated_args.get("limit").and_then(|v| v.as_i64()) {
            rows.truncate(limit.max(0) as usize);
        }

        let data = json!({ "rows": rows.clone(), "row_count": rows.len() });
        Ok(ToolResult { ok: true, message: "db_query completed".to_string(), data })
    }
}

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{FailureType, ToolExecutionError};
use crate::policy;

use super::{get_bool, get_f64, get_str, ToolExecutionContext, ToolHandler, ToolResult};

pub struct HttpGetHandler;

#[async_trait]
impl ToolHandler for HttpGetHandler {
    fn validate_args(&self, raw_args: &HashMap<String, Value>) -> Result<HashMap<String, Value>, ToolExecutionError> {
        let url = get_str(raw_args, "url")
            .ok_or_else(|| ToolExecutionError::new(FailureType::SchemaError, "http_get requires a string 'url'"))?;
        let mut validated = HashMap::new();
        validated.insert("url".to_string(), json!(url));
        validated.insert("params".to_string(), raw_args.get("params").cloned().unwrap_or_else(|| json!({})));
        validated.insert("headers".to_string(), raw_args.get("headers").cloned().unwrap_or_else(|| json!({})));
        validated.insert("timeout_s".to_string(), json!(get_f64(raw_args, "timeout_s", 2.0)));
        validated.insert("expect_json".to_string(), json!(get_bool(raw_args, "expect_json", true)));
        validated.insert("allow_malformed".to_string(), json!(get_bool(raw_args, "allow_malformed", false)));
        Ok(validated)
    }

    async fn invoke(
        &self,
        validated_args: &HashMap<String, Value>,
        ctx: &mut ToolExecutionContext<'_>,
    ) -> Result<ToolResult, ToolExecutionError> {
        policy::check_http(ctx.config, validated_args)?;

        let url = get_str(validated_args, "url").unwrap();
        let timeout_s = get_f64(validated_args, "timeout_s", 2.0);
        let expect_json = get_bool(validated_args, "expect_json", true);
        let allow_malformed = get_bool(validated_args, "allow_malformed", false);

        let mut request = reqwest::Client::new().get(&url).timeout(std::time::Duration::from_secs_f64(timeout_s));
        if let Some(headers) = validated_args.get("headers").and_then(|v| v.as_object()) {
            for (k, v) in headers {
                if let Some(v) = v.as_str() {
                    request = request.header(k, v);
                }
            }
        }
        if let Some(params) = validated_args.get("params").and_then(|v| v.as_object()) {
            let pairs: Vec<(String, String)> = params
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect();
            request = request.query(&pairs);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ToolExecutionError::new(FailureType::Timeout, format!("http_get timed out: {e}"))
            } else {
                ToolExecutionError::new(FailureType::ToolError, format!("http_get transport error: {e}"))
            }
        })?;

        let status_code = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body_text = response
            .text()
            .await
            .map_err(|e| ToolExecutionError::new(FailureType::ToolError, format!("http_get failed to read body: {e}")))?;
        let _elapsed = started.elapsed();

        if status_code >= 500 {
            return Err(ToolExecutionError::new(FailureType::ToolError, format!("http_get received status {status_code}"))
                .with_diagnostics(&[("status_code", json!(status_code))]));
        }

        let (body_value, malformed) = match serde_json::from_str::<Value>(&body_text) {
            Ok(v) => (v, false),
            Err(_) if expect_json && !allow_malformed => {
                return Err(ToolExecutionError::new(FailureType::SchemaError, "http_get expected JSON but body did not parse")
                    .with_diagnostics(&[("body", json!(body_text))]));
            }
            Err(_) => (json!(body_text), true),
        };

        let data = json!({
            "status_code": status_code,
            "headers": headers,
            "body": body_value,
            "malformed": malformed,
        });
        Ok(ToolResult { ok: true, message: "http_get completed".to_string(), data })
    }
}

//! Tool registry: name → handler, with schema validation at both plan
//! validation time and immediately before dispatch.

pub mod calc;
pub mod db_query;
pub mod file_write;
pub mod http_get;
pub mod http_post;
pub mod summarize;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::errors::ToolExecutionError;
use crate::llm::LlmProvider;
use crate::memory::{LongTermMemory, ShortTermMemory};
use crate::observability::{MetricsRegistry, StructuredLogger};
use crate::types::ToolCatalogEntry;

/// Everything a handler needs beyond its own validated args. Built fresh for
/// every attempt.
pub struct ToolExecutionContext<'a> {
    pub trace_id: &'a str,
    pub run_id: &'a str,
    pub step_id: &'a str,
    pub attempt: i64,
    pub config: &'a Config,
    pub logger: &'a StructuredLogger,
    pub metrics: &'a MetricsRegistry,
    pub short_term: &'a mut ShortTermMemory,
    pub long_term: &'a LongTermMemory,
    pub llm: &'a dyn LlmProvider,
}

/// Uniform success envelope every handler returns inside `ok` results.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    pub message: String,
    pub data: Value,
}

impl ToolResult {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self { ok: true, message: message.into(), data }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Normalizes `raw_args` into the handler's own shape, coercing and
    /// defaulting fields. Schema mismatches are `FailureType::SchemaError`.
    fn validate_args(&self, raw_args: &HashMap<String, Value>) -> Result<HashMap<String, Value>, ToolExecutionError>;

    async fn invoke(
        &self,
        validated_args: &HashMap<String, Value>,
        ctx: &mut ToolExecutionContext<'_>,
    ) -> Result<ToolResult, ToolExecutionError>;
}

pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub tags: Vec<&'static str>,
    pub safe_by_default: bool,
    pub handler: Arc<dyn ToolHandler>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(ToolSpec {
            name: "http_get",
            description: "Issue an HTTP GET request through the shared client.",
            tags: vec!["network", "read"],
            safe_by_default: true,
            handler: Arc::new(http_get::HttpGetHandler),
        });
        registry.register(ToolSpec {
            name: "http_post",
            description: "Issue an HTTP POST request through the shared client.",
            tags: vec!["network", "write"],
            safe_by_default: true,
            handler: Arc::new(http_post::HttpPostHandler),
        });
        registry.register(ToolSpec {
            name: "db_query",
            description: "Query the embedded long-term memory store.",
            tags: vec!["database", "read"],
            safe_by_default: true,
            handler: Arc::new(db_query::DbQueryHandler),
        });
        registry.register(ToolSpec {
            name: "calc",
            description: "Evaluate a restricted arithmetic expression.",
            tags: vec!["compute"],
            safe_by_default: true,
            handler: Arc::new(calc::CalcHandler),
        });
        registry.register(ToolSpec {
            name: "file_write",
            description: "Write a file under the sandboxed workspace root.",
            tags: vec!["filesystem", "write"],
            safe_by_default: false,
            handler: Arc::new(file_write::FileWriteHandler),
        });
        registry.register(ToolSpec {
            name: "summarize",
            description: "Summarize text via the configured LLM provider.",
            tags: vec!["llm"],
            safe_by_default: true,
            handler: Arc::new(summarize::SummarizeHandler),
        });
        registry
    }

    pub fn register(&mut self, spec: ToolSpec) {
        self.tools.insert(spec.name.to_string(), spec);
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn validate_args(
        &self,
        name: &str,
        raw_args: &HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, ToolExecutionError> {
        match self.get(name) {
            Some(spec) => spec.handler.validate_args(raw_args),
            None => Err(ToolExecutionError::new(
                crate::errors::FailureType::ValidationError,
                format!("unknown tool: {name}"),
            )),
        }
    }

    pub async fn execute(
        &self,
        name: &str,
        validated_args: &HashMap<String, Value>,
        ctx: &mut ToolExecutionContext<'_>,
    ) -> Result<ToolResult, ToolExecutionError> {
        match self.get(name) {
            Some(spec) => spec.handler.invoke(validated_args, ctx).await,
            None => Err(ToolExecutionError::new(
                crate::errors::FailureType::ValidationError,
                format!("unknown tool: {name}"),
            )),
        }
    }

    pub fn catalog(&self) -> Vec<ToolCatalogEntry> {
        let mut entries: Vec<ToolCatalogEntry> = self
            .tools
            .values()
            .map(|spec| ToolCatalogEntry {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                tags: spec.tags.iter().map(|t| t.to_string()).collect(),
                safe_by_default: spec.safe_by_default,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

pub(crate) fn get_str(args: &HashMap<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

pub(crate) fn get_f64(args: &HashMap<String, Value>, key: &str, default: f64) -> f64 {
    args.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

pub(crate) fn get_bool(args: &HashMap<String, Value>, key: &str, default: bool) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

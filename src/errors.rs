//! Typed errors for the orchestration core.
//!
//! Tool-facing failures carry a [`FailureType`] and are recoverable by the
//! refinement engine; everything else is a structural [`OrchestratorError`]
//! that terminates the run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single failure taxonomy shared by monitors, refinement, and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    Timeout,
    ToolError,
    SchemaError,
    BadResponse,
    PolicyViolation,
    ValidationError,
    BudgetExceeded,
    NonProgress,
    Unknown,
}

impl FailureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::Timeout => "timeout",
            FailureType::ToolError => "tool_error",
            FailureType::SchemaError => "schema_error",
            FailureType::BadResponse => "bad_response",
            FailureType::PolicyViolation => "policy_violation",
            FailureType::ValidationError => "validation_error",
            FailureType::BudgetExceeded => "budget_exceeded",
            FailureType::NonProgress => "non_progress",
            FailureType::Unknown => "unknown",
        }
    }
}

pub type Diagnostics = HashMap<String, Value>;

fn diagnostics_from(pairs: &[(&str, Value)]) -> Diagnostics {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// A tool handler's failure. Raised by handlers, caught by the executor,
/// classified by monitors.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ToolExecutionError {
    pub failure_type: FailureType,
    pub message: String,
    pub diagnostics: Diagnostics,
}

impl ToolExecutionError {
    pub fn new(failure_type: FailureType, message: impl Into<String>) -> Self {
        Self { failure_type, message: message.into(), diagnostics: Diagnostics::new() }
    }

    pub fn with_diagnostics(mut self, pairs: &[(&str, Value)]) -> Self {
        self.diagnostics.extend(diagnostics_from(pairs));
        self
    }
}

/// A static policy-gate rejection. Distinguished from [`ToolExecutionError`]
/// because the policy gate runs both at validation time and at dispatch
/// time, and the two callers convert it to different `FailureType`s.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct PolicyViolationError {
    pub message: String,
    pub diagnostics: Diagnostics,
}

impl PolicyViolationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), diagnostics: Diagnostics::new() }
    }

    pub fn with_diagnostics(mut self, pairs: &[(&str, Value)]) -> Self {
        self.diagnostics.extend(diagnostics_from(pairs));
        self
    }
}

impl From<PolicyViolationError> for ToolExecutionError {
    fn from(e: PolicyViolationError) -> Self {
        ToolExecutionError { failure_type: FailureType::PolicyViolation, message: e.message, diagnostics: e.diagnostics }
    }
}

/// Structural errors that terminate a run outright (never recovered by
/// refinement). The orchestrator wrapper always catches these and finalizes
/// the trace rather than letting them escape the process.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("plan validation failed: {0}")]
    PlanValidation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

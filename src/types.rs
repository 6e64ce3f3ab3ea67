//! The data model shared by every component: enums, records, and the
//! `RunTrace` accumulator. Field names are lowercase snake_case so the
//! serialized trace matches the documented export schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::FailureType;
use crate::observability::utc_now_iso;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    DataRetrieval,
    DataSubmission,
    Database,
    FileOps,
    Calculation,
    Summarization,
    Composite,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "RECEIVED")]
    Received,
    #[serde(rename = "PERCEIVED")]
    Perceived,
    #[serde(rename = "PLANNED")]
    Planned,
    #[serde(rename = "VALIDATED")]
    Validated,
    #[serde(rename = "EXECUTING")]
    Executing,
    #[serde(rename = "REFINING")]
    Refining,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "STOPPED")]
    Stopped,
    #[serde(rename = "FAILED")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "SKIPPED")]
    Skipped,
    #[serde(rename = "RETRYING")]
    Retrying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementActionType {
    None,
    PatchAndRetry,
    ReplanRemaining,
    SkipStep,
    Abort,
}

impl RefinementActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefinementActionType::None => "none",
            RefinementActionType::PatchAndRetry => "patch_and_retry",
            RefinementActionType::ReplanRemaining => "replan_remaining",
            RefinementActionType::SkipStep => "skip_step",
            RefinementActionType::Abort => "abort",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReasonType {
    SuccessCriteriaMet,
    MaxSteps,
    MaxRetries,
    BudgetGuard,
    NonProgress,
    Failed,
    PolicyBlocked,
    ValidationFailed,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Success,
    Error,
    Timeout,
    SchemaError,
    PolicyBlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetGuard {
    pub max_cost_units: i64,
    pub max_tokens: Option<i64>,
    pub cost_per_step: i64,
}

impl Default for BudgetGuard {
    fn default() -> Self {
        Self { max_cost_units: 50, max_tokens: None, cost_per_step: 1 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerceptionResult {
    pub intent: String,
    pub task_type: TaskType,
    #[serde(default)]
    pub entities: HashMap<String, Value>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub initial_state: HashMap<String, Value>,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::Unknown
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_id: String,
    pub objective: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_args: HashMap<String, Value>,
    pub expected_observation: String,
    #[serde(default = "default_fallback_strategy")]
    pub fallback_strategy: String,
}

fn default_fallback_strategy() -> String {
    "retry_or_abort".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default = "default_max_steps")]
    pub max_steps: i64,
    #[serde(default = "default_max_retries")]
    pub max_retries_per_step: i64,
    #[serde(default)]
    pub budget_guard: BudgetGuard,
    #[serde(default)]
    pub planner_notes: Vec<String>,
}

fn default_max_steps() -> i64 {
    12
}
fn default_max_retries() -> i64 {
    2
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            max_steps: default_max_steps(),
            max_retries_per_step: default_max_retries(),
            budget_guard: BudgetGuard::default(),
            planner_notes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedPlan {
    pub plan: Plan,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCatalogEntry {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub safe_by_default: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureSignal {
    pub failure_type: FailureType,
    pub retryable: bool,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    pub message: String,
    pub recommended_action: String,
    #[serde(default)]
    pub diagnostics: HashMap<String, Value>,
}

fn default_severity() -> Severity {
    Severity::Medium
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementDecision {
    pub action: RefinementActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patched_args: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replanned_steps: Option<Vec<PlanStep>>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub step_id: String,
    pub step_attempt_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_args: HashMap<String, Value>,
    #[serde(default)]
    pub validated_args: HashMap<String, Value>,
    pub status: ToolCallStatus,
    #[serde(default)]
    pub latency_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub raw_response: Value,
    #[serde(default = "utc_now_iso")]
    pub ts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEvent {
    pub step_id: String,
    pub attempt: i64,
    pub status: StepStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_signal: Option<FailureSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement_decision: Option<RefinementDecision>,
    #[serde(default = "utc_now_iso")]
    pub ts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopReason {
    #[serde(rename = "type")]
    pub kind: StopReasonType,
    #[serde(default)]
    pub message: String,
}

impl Default for StopReason {
    fn default() -> Self {
        Self { kind: StopReasonType::None, message: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
    pub trace_id: String,
    pub run_id: String,
    pub request: Value,
    #[serde(default = "default_received")]
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perception: Option<PerceptionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub step_events: Vec<StepEvent>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(default)]
    pub monitor_signals: Vec<FailureSignal>,
    #[serde(default)]
    pub refinements: Vec<RefinementDecision>,
    #[serde(default)]
    pub final_output: HashMap<String, Value>,
    #[serde(default)]
    pub metrics_snapshot: HashMap<String, i64>,
    #[serde(default)]
    pub stop_reason: StopReason,
    #[serde(default = "utc_now_iso")]
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

fn default_received() -> RunStatus {
    RunStatus::Received
}

impl RunTrace {
    pub fn new(trace_id: String, run_id: String, request: Value) -> Self {
        Self {
            trace_id,
            run_id,
            request,
            status: RunStatus::Received,
            perception: None,
            plan: None,
            step_events: Vec::new(),
            tool_calls: Vec::new(),
            monitor_signals: Vec::new(),
            refinements: Vec::new(),
            final_output: HashMap::new(),
            metrics_snapshot: HashMap::new(),
            stop_reason: StopReason::default(),
            started_at: utc_now_iso(),
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: RunStatus,
    pub final_output: HashMap<String, Value>,
    pub stop_reason: StopReason,
    #[serde(default)]
    pub completed_steps: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalScenario {
    pub id: String,
    pub description: String,
    pub request: String,
    #[serde(default)]
    pub context: HashMap<String, Value>,
    #[serde(default)]
    pub config_overrides: HashMap<String, Value>,
    pub expected_status: String,
    #[serde(default)]
    pub required_output_contains: Vec<String>,
    #[serde(default)]
    pub required_trace_events: Vec<String>,
    #[serde(default)]
    pub forbidden_trace_events: Vec<String>,
    #[serde(default)]
    pub expected_stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalScenarioResult {
    pub scenario_id: String,
    pub passed: bool,
    pub reason: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub trace_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<EvalScenarioResult>,
}

//! Environment-driven configuration, mirroring the runtime directory
//! bootstrap and typed defaults the rest of the ambient stack expects.

use std::path::PathBuf;

use crate::errors::OrchestratorError;

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
    }
}

fn parse_i64(value: Option<String>, default: i64) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_f64(value: Option<String>, default: f64) -> f64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_list(value: Option<String>, default: Vec<String>) -> Vec<String> {
    match value {
        None => default,
        Some(v) if v.trim().is_empty() => default,
        Some(v) => v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub env: String,
    pub log_level: String,
    pub log_to_file: bool,

    pub runtime_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub traces_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub file_workspace_root: PathBuf,
    pub memory_store_path: PathBuf,

    pub no_llm_mode: bool,
    pub openai_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,

    pub enable_real_http: bool,
    pub allowed_http_hosts: Vec<String>,
    pub mock_api_base_url: String,

    pub default_http_timeout_s: f64,
    pub default_max_steps: i64,
    pub default_max_retries_per_step: i64,
    pub default_budget_units: i64,
    pub non_progress_threshold: i64,
    pub random_seed: u64,

    pub enable_db_writes: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, OrchestratorError> {
        let runtime_dir =
            PathBuf::from(std::env::var("MAOO_RUNTIME_DIR").unwrap_or_else(|_| "runtime".to_string()));
        let workspace_dir = std::env::var("MAOO_FILE_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| runtime_dir.join("workspace"));
        let memory_store_path = std::env::var("MAOO_MEMORY_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| runtime_dir.join("memory").join("store.json"));

        let cfg = Self {
            app_name: std::env::var("MAOO_APP_NAME").unwrap_or_else(|_| "MAOO".to_string()),
            env: std::env::var("MAOO_ENV").unwrap_or_else(|_| "dev".to_string()),
            log_level: std::env::var("MAOO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_to_file: parse_bool(std::env::var("MAOO_LOG_TO_FILE").ok(), true),
            logs_dir: runtime_dir.join("logs"),
            traces_dir: runtime_dir.join("traces"),
            file_workspace_root: workspace_dir.clone(),
            workspace_dir,
            memory_store_path,
            runtime_dir,
            no_llm_mode: parse_bool(std::env::var("MAOO_NO_LLM_MODE").ok(), true),
            openai_base_url: std::env::var("MAOO_OPENAI_BASE_URL").ok().filter(|s| !s.is_empty()),
            openai_api_key: std::env::var("MAOO_OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            openai_model: std::env::var("MAOO_OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            enable_real_http: parse_bool(std::env::var("MAOO_ENABLE_REAL_HTTP").ok(), false),
            allowed_http_hosts: parse_list(
                std::env::var("MAOO_ALLOWED_HTTP_HOSTS").ok(),
                vec!["localhost".to_string(), "127.0.0.1".to_string(), "mock-api".to_string()],
            ),
            mock_api_base_url: std::env::var("MAOO_MOCK_API_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8001".to_string()),
            default_http_timeout_s: parse_f64(std::env::var("MAOO_DEFAULT_HTTP_TIMEOUT_S").ok(), 2.0),
            default_max_steps: parse_i64(std::env::var("MAOO_DEFAULT_MAX_STEPS").ok(), 12),
            default_max_retries_per_step: parse_i64(
                std::env::var("MAOO_DEFAULT_MAX_RETRIES_PER_STEP").ok(),
                2,
            ),
            default_budget_units: parse_i64(std::env::var("MAOO_DEFAULT_BUDGET_UNITS").ok(), 50),
            non_progress_threshold: parse_i64(std::env::var("MAOO_NON_PROGRESS_THRESHOLD").ok(), 3),
            random_seed: parse_i64(std::env::var("MAOO_RANDOM_SEED").ok(), 42) as u64,
            enable_db_writes: parse_bool(std::env::var("MAOO_ENABLE_DB_WRITES").ok(), false),
        };
        cfg.ensure_runtime_dirs()?;
        Ok(cfg)
    }

    pub fn ensure_runtime_dirs(&self) -> Result<(), OrchestratorError> {
        for dir in [&self.runtime_dir, &self.logs_dir, &self.traces_dir, &self.file_workspace_root] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = self.memory_store_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

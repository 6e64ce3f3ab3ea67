//! Static safety checks on tool args. Runs twice: once during plan
//! validation (failures become `validation_error`s), once immediately before
//! each dispatch (failures become non-retryable `policy_violation` signals).

use std::collections::HashMap;

use reqwest::Url;
use serde_json::Value;

use crate::config::Config;
use crate::errors::PolicyViolationError;
use crate::tools::get_str;

pub fn check_http(config: &Config, args: &HashMap<String, Value>) -> Result<(), PolicyViolationError> {
    let raw_url = get_str(args, "url").ok_or_else(|| PolicyViolationError::new("missing url"))?;
    let parsed = Url::parse(&raw_url)
        .map_err(|e| PolicyViolationError::new(format!("invalid url: {e}")).with_diagnostics(&[("url", Value::String(raw_url.clone()))]))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PolicyViolationError::new(format!("disallowed scheme: {}", parsed.scheme()))
            .with_diagnostics(&[("url", Value::String(raw_url))]));
    }

    if config.enable_real_http {
        return Ok(());
    }

    let host = parsed.host_str().unwrap_or("");
    if !config.allowed_http_hosts.iter().any(|h| h == host) {
        return Err(PolicyViolationError::new(format!("disallowed host: {host}")).with_diagnostics(&[
            ("url", Value::String(raw_url)),
            ("host", Value::String(host.to_string())),
        ]));
    }
    Ok(())
}

pub fn check_file_write(relative_path: &str) -> Result<(), PolicyViolationError> {
    if relative_path.is_empty() {
        return Err(PolicyViolationError::new("relative_path must not be empty"));
    }
    if std::path::Path::new(relative_path).is_absolute() {
        return Err(PolicyViolationError::new("relative_path must not be absolute")
            .with_diagnostics(&[("relative_path", Value::String(relative_path.to_string()))]));
    }
    if relative_path.split('/').any(|segment| segment == "..") {
        return Err(PolicyViolationError::new("relative_path must not contain '..' segments")
            .with_diagnostics(&[("relative_path", Value::String(relative_path.to_string()))]));
    }
    Ok(())
}

/// Strips `--` comments, collapses whitespace, lowercases.
pub fn normalize_sql(sql: &str) -> String {
    let no_comments: String = sql
        .lines()
        .map(|line| match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join(" ");
    no_comments.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub fn check_db_query(config: &Config, sql: &str, readonly: bool) -> Result<(), PolicyViolationError> {
    let normalized = normalize_sql(sql);
    if readonly {
        if normalized.starts_with("select") || normalized.starts_with("pragma") {
            return Ok(());
        }
        return Err(PolicyViolationError::new("read-only queries must start with SELECT or PRAGMA")
            .with_diagnostics(&[("sql", Value::String(sql.to_string()))]));
    }
    if !config.enable_db_writes {
        return Err(PolicyViolationError::new("write queries are disabled (MAOO_ENABLE_DB_WRITES=false)")
            .with_diagnostics(&[("sql", Value::String(sql.to_string()))]));
    }
    Ok(())
}

/// A restricted arithmetic grammar: numeric literals, unary `+`/`-`, and
/// binary `+ - * / // % **`. Anything else (identifiers, calls, parens around
/// non-numeric content the tokenizer can't classify) is rejected up front.
pub fn check_calc_expression(expression: &str) -> Result<(), PolicyViolationError> {
    let allowed_chars = |c: char| c.is_ascii_digit() || c == '.' || " +-*/%()".contains(c);
    if expression.trim().is_empty() {
        return Err(PolicyViolationError::new("empty expression"));
    }
    if !expression.chars().all(allowed_chars) {
        return Err(PolicyViolationError::new("expression contains disallowed characters")
            .with_diagnostics(&[("expression", Value::String(expression.to_string()))]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            app_name: "test".into(),
            env: "test".into(),
            log_level: "info".into(),
            log_to_file: false,
            runtime_dir: "runtime".into(),
            logs_dir: "runtime/logs".into(),
            traces_dir: "runtime/traces".into(),
            workspace_dir: "runtime/workspace".into(),
            file_workspace_root: "runtime/workspace".into(),
            memory_store_path: "runtime/memory/store.json".into(),
            no_llm_mode: true,
            openai_base_url: None,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            enable_real_http: false,
            allowed_http_hosts: vec!["localhost".into(), "127.0.0.1".into()],
            mock_api_base_url: "http://127.0.0.1:8001".into(),
            default_http_timeout_s: 2.0,
            default_max_steps: 12,
            default_max_retries_per_step: 2,
            default_budget_units: 50,
            non_progress_threshold: 3,
            random_seed: 42,
            enable_db_writes: false,
        }
    }

    #[test]
    fn rejects_disallowed_host() {
        let config = test_config();
        let mut args = HashMap::new();
        args.insert("url".to_string(), Value::String("http://evil.example.com/".into()));
        assert!(check_http(&config, &args).is_err());
    }

    #[test]
    fn allows_allowlisted_host() {
        let config = test_config();
        let mut args = HashMap::new();
        args.insert("url".to_string(), Value::String("http://localhost:8001/data".into()));
        assert!(check_http(&config, &args).is_ok());
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(check_file_write("../../etc/passwd").is_err());
        assert!(check_file_write("/etc/passwd").is_err());
        assert!(check_file_write("notes/today.txt").is_ok());
    }

    #[test]
    fn rejects_non_select_sql_when_readonly() {
        let config = test_config();
        assert!(check_db_query(&config, "DELETE FROM demo_numbers", true).is_err());
        assert!(check_db_query(&config, "SELECT * FROM demo_numbers -- trailing", true).is_ok());
    }

    #[test]
    fn rejects_non_arithmetic_expression() {
        assert!(check_calc_expression("__import__('os')").is_err());
        assert!(check_calc_expression("2 + 2 * (3 - 1)").is_ok());
    }
}

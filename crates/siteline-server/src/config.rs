//! Server Settings
//!
//! Read once at startup from the Shuttle secret store. Parsing goes through
//! a plain lookup function so tests can supply a map.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// PDF report provider credentials
#[derive(Debug, Clone)]
pub struct PdfMonkeySettings {
    pub api_key: String,
    pub template_id: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub webhook_secret: String,
    pub admin_api_key: Option<String>,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,

    pub bridge_url: String,
    pub bridge_signing_secret: Option<String>,

    pub soniox_api_key: Option<String>,
    pub pdfmonkey: Option<PdfMonkeySettings>,

    pub rate_limit_max_messages: u64,
    pub rate_limit_window: Duration,
    pub site_cache_ttl: Duration,
    pub agent_max_iterations: u32,
    pub stt_timeout: Duration,
    pub max_request_body_bytes: usize,
    pub max_description_length: usize,

    pub worker_max_jobs: usize,
    pub job_timeout: Duration,
    pub job_max_tries: i32,
    pub dedup_retention: Option<chrono::Duration>,
}

impl Settings {
    pub fn from_secrets(secrets: &shuttle_runtime::SecretStore) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| secrets.get(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let pdfmonkey = match (get("PDFMONKEY_API_KEY"), get("PDFMONKEY_TEMPLATE_ID")) {
            (Some(api_key), Some(template_id)) => Some(PdfMonkeySettings {
                api_key,
                template_id,
            }),
            _ => None,
        };

        Ok(Self {
            webhook_secret: required("WEBHOOK_SECRET")?,
            admin_api_key: get("ADMIN_API_KEY"),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4.1-mini".to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            bridge_url: get("BRIDGE_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            bridge_signing_secret: get("BRIDGE_SIGNING_SECRET"),
            soniox_api_key: get("SONIOX_API_KEY"),
            pdfmonkey,
            rate_limit_max_messages: parse_or(&get, "RATE_LIMIT_MAX_MESSAGES", 20)?,
            rate_limit_window: Duration::from_secs(parse_or(
                &get,
                "RATE_LIMIT_WINDOW_SECONDS",
                60,
            )?),
            site_cache_ttl: Duration::from_secs(parse_or(&get, "SITE_CACHE_TTL_SECONDS", 300)?),
            agent_max_iterations: parse_or(&get, "AGENT_MAX_ITERATIONS", 3)?,
            stt_timeout: Duration::from_secs(parse_or(&get, "STT_TIMEOUT_SECONDS", 60)?),
            max_request_body_bytes: parse_or(&get, "MAX_REQUEST_BODY_BYTES", 1_048_576)?,
            max_description_length: parse_or(&get, "MAX_DESCRIPTION_LENGTH", 500)?,
            worker_max_jobs: parse_or(&get, "WORKER_MAX_JOBS", 10)?,
            job_timeout: Duration::from_secs(parse_or(&get, "JOB_TIMEOUT_SECONDS", 300)?),
            job_max_tries: parse_or(&get, "JOB_MAX_TRIES", 3)?,
            dedup_retention: get("DEDUP_RETENTION_DAYS")
                .map(|raw| parse_value("DEDUP_RETENTION_DAYS", &raw))
                .transpose()?
                .map(chrono::Duration::days),
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [("WEBHOOK_SECRET", "s3cret"), ("OPENAI_API_KEY", "sk-test")];

    #[test]
    fn test_defaults() {
        let s = settings(&REQUIRED).unwrap();
        assert_eq!(s.rate_limit_max_messages, 20);
        assert_eq!(s.rate_limit_window, Duration::from_secs(60));
        assert_eq!(s.site_cache_ttl, Duration::from_secs(300));
        assert_eq!(s.agent_max_iterations, 3);
        assert_eq!(s.worker_max_jobs, 10);
        assert_eq!(s.job_timeout, Duration::from_secs(300));
        assert_eq!(s.job_max_tries, 3);
        assert_eq!(s.openai_model, "gpt-4.1-mini");
        assert!(s.pdfmonkey.is_none());
        assert!(s.dedup_retention.is_none());
    }

    #[test]
    fn test_missing_required() {
        let err = settings(&[("OPENAI_API_KEY", "sk-test")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("WEBHOOK_SECRET"));

        let err = settings(&[("WEBHOOK_SECRET", "  "), ("OPENAI_API_KEY", "sk")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("WEBHOOK_SECRET"));
    }

    #[test]
    fn test_invalid_number() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AGENT_MAX_ITERATIONS", "three"));
        let err = settings(&pairs).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "AGENT_MAX_ITERATIONS",
                value: "three".to_string()
            }
        );
    }

    #[test]
    fn test_pdfmonkey_needs_both_keys() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PDFMONKEY_API_KEY", "pm"));
        assert!(settings(&pairs).unwrap().pdfmonkey.is_none());

        pairs.push(("PDFMONKEY_TEMPLATE_ID", "tpl"));
        pairs.push(("DEDUP_RETENTION_DAYS", "30"));
        let s = settings(&pairs).unwrap();
        assert_eq!(s.pdfmonkey.unwrap().template_id, "tpl");
        assert_eq!(s.dedup_retention, Some(chrono::Duration::days(30)));
    }
}

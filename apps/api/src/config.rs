use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which screening capability backs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process: Anthropic for parsing/scoring/email, pdf-extract for ingest.
    Llm,
    /// A separate processor service reached over HTTP.
    Remote,
    /// Placeholder random scores with simulated delays. No network.
    Mock,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(BackendKind::Llm),
            "remote" => Ok(BackendKind::Remote),
            "mock" => Ok(BackendKind::Mock),
            other => bail!("SCREENING_BACKEND must be one of llm, remote, mock (got '{other}')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable required by the selected backend is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub anthropic_api_key: Option<String>,
    pub processor_base_url: Option<String>,
    /// Upper bound on in-flight per-resume / per-candidate calls.
    pub item_concurrency: usize,
    pub max_resume_files: usize,
    pub http_timeout_secs: u64,
    pub mock_delay_ms: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let backend: BackendKind = optional_env("SCREENING_BACKEND")
            .unwrap_or_else(|| "llm".to_string())
            .parse()?;

        let anthropic_api_key = optional_env("ANTHROPIC_API_KEY");
        let processor_base_url = optional_env("PROCESSOR_BASE_URL");

        match backend {
            BackendKind::Llm if anthropic_api_key.is_none() => {
                require_env("ANTHROPIC_API_KEY")?;
            }
            BackendKind::Remote if processor_base_url.is_none() => {
                require_env("PROCESSOR_BASE_URL")?;
            }
            _ => {}
        }

        let item_concurrency: usize = parse_env("ITEM_CONCURRENCY", 4)?;
        if item_concurrency == 0 {
            bail!("ITEM_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            backend,
            anthropic_api_key,
            processor_base_url,
            item_concurrency,
            max_resume_files: parse_env("MAX_RESUME_FILES", 10)?,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 120)?,
            mock_delay_ms: parse_env("MOCK_DELAY_MS", 0)?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parses_case_insensitively() {
        assert_eq!("LLM".parse::<BackendKind>().unwrap(), BackendKind::Llm);
        assert_eq!(" remote ".parse::<BackendKind>().unwrap(), BackendKind::Remote);
        assert_eq!("mock".parse::<BackendKind>().unwrap(), BackendKind::Mock);
    }

    #[test]
    fn test_backend_kind_rejects_unknown() {
        let err = "openai".parse::<BackendKind>().unwrap_err();
        assert!(err.to_string().contains("openai"));
    }
}

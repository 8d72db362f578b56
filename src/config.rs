//! Validated runtime configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

use crate::cli::Cli;

pub const API_KEY_ENV: &str = "XAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key: pass --api-key or set XAI_API_KEY")]
    MissingApiKey,

    #[error("invalid base URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),
}

/// Model used by each phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Models {
    pub refiner: String,
    pub planner: String,
    pub engineer: String,
}

impl Default for Models {
    fn default() -> Self {
        Self {
            refiner: "grok-4-0709".to_string(),
            planner: "grok-code-fast-1".to_string(),
            engineer: "grok-code-fast-1".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub models: Models,
    pub tofu_bin: String,
    pub timeout: Option<Duration>,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = cli.base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(cli.base_url.clone()));
        }

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            models: Models {
                refiner: cli.prompt_model.clone(),
                planner: cli.model.clone(),
                engineer: cli.model.clone(),
            },
            tofu_bin: cli.tofu_bin.clone(),
            timeout: cli.timeout_secs.filter(|&secs| secs > 0).map(Duration::from_secs),
            log_file: cli.log_file.clone(),
        })
    }
}

/// Load a dotenv file into the process environment. A missing file is not
/// an error; returns whether a file was read.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Parse a level name, falling back to INFO.
pub fn log_level(name: Option<&str>) -> Level {
    name.and_then(|n| n.trim().parse().ok()).unwrap_or(Level::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        let mut cli = Cli::try_parse_from(std::iter::once("tofumatic").chain(args.iter().copied())).unwrap();
        if !args.contains(&"--api-key") {
            cli.api_key = None;
        }
        cli
    }

    #[test]
    fn missing_api_key_is_rejected() {
        assert!(matches!(Config::from_cli(&cli(&[])), Err(ConfigError::MissingApiKey)));
        assert!(matches!(
            Config::from_cli(&cli(&["--api-key", "  "])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn models_split_between_phases() {
        let config = Config::from_cli(&cli(&["--api-key", "xai-123", "--prompt-model", "big", "--model", "small"])).unwrap();
        assert_eq!(config.api_key, "xai-123");
        assert_eq!(config.models.refiner, "big");
        assert_eq!(config.models.planner, "small");
        assert_eq!(config.models.engineer, "small");
        assert_eq!(config.base_url, "https://api.x.ai/v1");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn base_url_is_normalised_and_checked() {
        let config = Config::from_cli(&cli(&["--api-key", "k", "--base-url", "http://localhost:8080/v1/"])).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/v1");

        let err = Config::from_cli(&cli(&["--api-key", "k", "--base-url", "localhost"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn zero_timeout_means_none() {
        let config = Config::from_cli(&cli(&["--api-key", "k", "--timeout-secs", "0"])).unwrap();
        assert_eq!(config.timeout, None);
        let config = Config::from_cli(&cli(&["--api-key", "k", "--timeout-secs", "45"])).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn missing_env_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_env_file(&dir.path().join(".env.secure")).unwrap());
    }

    #[test]
    fn env_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "TOFUMATIC_TEST_ONLY_VAR=from-dotenv").unwrap();
        assert!(load_env_file(file.path()).unwrap());
        assert_eq!(std::env::var("TOFUMATIC_TEST_ONLY_VAR").unwrap(), "from-dotenv");
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level(None), Level::INFO);
        assert_eq!(log_level(Some("debug")), Level::DEBUG);
        assert_eq!(log_level(Some("WARN")), Level::WARN);
        assert_eq!(log_level(Some("chatty")), Level::INFO);
    }
}

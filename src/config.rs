//! Startup configuration: an optional TOML file overlaid by environment variables.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{NotifyError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "notify_config.toml";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const CONFIG_PATH_ENV: &str = "NOTIFY_CONFIG";
pub const PROVIDER_ENV: &str = "NOTIFY_PROVIDER";
pub const WEBHOOK_URL_ENV: &str = "SLACK_WEBHOOK_URL";
pub const MODE_ENV: &str = "NOTIFY_MODE";
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";
pub const TIMEOUT_ENV: &str = "DELIVERY_TIMEOUT_SECS";
pub const LOG_DIR_ENV: &str = "LOG_DIR";

/// Source of inbound notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
}

impl FromStr for Provider {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "github" => Ok(Provider::GitHub),
            other => Err(NotifyError::ConfigError(format!(
                "Invalid {}: {:?}",
                PROVIDER_ENV, other
            ))),
        }
    }
}

/// How the process is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Serve webhook requests over HTTP, one pipeline run per request.
    Serve,
    /// Run the pipeline once on a canned event, then exit.
    SingleShot,
}

impl FromStr for RunMode {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "serve" => Ok(RunMode::Serve),
            "single_shot" => Ok(RunMode::SingleShot),
            other => Err(NotifyError::ConfigError(format!(
                "Invalid {}: {:?} (expected \"serve\" or \"single_shot\")",
                MODE_ENV, other
            ))),
        }
    }
}

/// Config file contents; every key is optional so the environment can fill gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub provider: Option<String>,
    pub webhook_url: Option<String>,
    pub mode: Option<String>,
    pub bind_address: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub provider: Provider,
    pub webhook_url: String,
    pub mode: RunMode,
    pub bind_address: String,
    pub timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

impl NotifierConfig {
    /// Merge `file` with values from `env`; the environment wins.
    pub fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider = env(PROVIDER_ENV)
            .or(file.provider)
            .ok_or_else(|| NotifyError::ConfigError(format!("Invalid {}", PROVIDER_ENV)))?
            .parse::<Provider>()?;

        let webhook_url = env(WEBHOOK_URL_ENV)
            .or(file.webhook_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| NotifyError::ConfigError(format!("{} is blank", WEBHOOK_URL_ENV)))?;

        let mode = match env(MODE_ENV).or(file.mode) {
            Some(m) => m.parse::<RunMode>()?,
            None => RunMode::Serve,
        };

        let bind_address = env(BIND_ADDRESS_ENV)
            .or(file.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let timeout_secs = match env(TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                NotifyError::ConfigError(format!("Invalid {} {:?}: {}", TIMEOUT_ENV, raw, e))
            })?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(NotifyError::ConfigError(format!(
                "{} must be greater than zero",
                TIMEOUT_ENV
            )));
        }

        let log_dir = env(LOG_DIR_ENV).map(PathBuf::from).or(file.log_dir);

        Ok(Self {
            provider,
            webhook_url,
            mode,
            bind_address,
            timeout: Duration::from_secs(timeout_secs),
            log_dir,
        })
    }
}

/// Read the config file at `path` if it exists.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let config_str = fs::read_to_string(path).map_err(|e| {
        NotifyError::ConfigError(format!("Failed to read config file '{}': {}", path.display(), e))
    })?;
    let file: ConfigFile = toml::from_str(&config_str)?;
    Ok(file)
}

/// Load configuration from `path` (if present) and the process environment.
pub fn load_config(path: &Path) -> Result<NotifierConfig> {
    let file = read_config_file(path)?;
    NotifierConfig::from_sources(file, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_only() {
        let config = NotifierConfig::from_sources(
            ConfigFile::default(),
            env_of(&[(PROVIDER_ENV, "github"), (WEBHOOK_URL_ENV, "https://hooks.example")]),
        )
        .unwrap();
        assert_eq!(config.provider, Provider::GitHub);
        assert_eq!(config.mode, RunMode::Serve);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn environment_overrides_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            provider = "github"
            webhook_url = "https://file.example"
            mode = "single_shot"
            timeout_secs = 3
            "#,
        )
        .unwrap();
        let config =
            NotifierConfig::from_sources(file, env_of(&[(WEBHOOK_URL_ENV, "https://env.example")]))
                .unwrap();
        assert_eq!(config.webhook_url, "https://env.example");
        assert_eq!(config.mode, RunMode::SingleShot);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_provider() {
        let err = NotifierConfig::from_sources(
            ConfigFile::default(),
            env_of(&[(PROVIDER_ENV, "gitlab"), (WEBHOOK_URL_ENV, "https://hooks.example")]),
        )
        .unwrap_err();
        assert!(matches!(err, NotifyError::ConfigError(_)));

        let err = NotifierConfig::from_sources(
            ConfigFile::default(),
            env_of(&[(WEBHOOK_URL_ENV, "https://hooks.example")]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Invalid NOTIFY_PROVIDER");
    }

    #[test]
    fn blank_webhook_url() {
        let err = NotifierConfig::from_sources(
            ConfigFile::default(),
            env_of(&[(PROVIDER_ENV, "github"), (WEBHOOK_URL_ENV, "  ")]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: SLACK_WEBHOOK_URL is blank");
    }

    #[test]
    fn bad_mode_and_timeout() {
        let base = [(PROVIDER_ENV, "github"), (WEBHOOK_URL_ENV, "https://hooks.example")];
        let mut pairs = base.to_vec();
        pairs.push((MODE_ENV, "lambda"));
        assert!(NotifierConfig::from_sources(ConfigFile::default(), env_of(&pairs)).is_err());

        let mut pairs = base.to_vec();
        pairs.push((TIMEOUT_ENV, "0"));
        assert!(NotifierConfig::from_sources(ConfigFile::default(), env_of(&pairs)).is_err());
    }

    #[test]
    fn missing_file_is_empty() {
        let file = read_config_file(Path::new("/definitely/not/here.toml")).unwrap();
        assert!(file.provider.is_none());
    }

    #[test]
    fn unparseable_file_is_a_toml_error() {
        let path = std::env::temp_dir().join(format!("notify_config_{}.toml", uuid::Uuid::now_v7()));
        fs::write(&path, "webhook_url = \"unterminated\n").unwrap();
        let err = read_config_file(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, NotifyError::TomlParseError(_)), "{:?}", err);
        assert!(err.to_string().starts_with("TOML parsing error"));

        let path = std::env::temp_dir().join(format!("notify_config_{}.toml", uuid::Uuid::now_v7()));
        fs::write(&path, "webhook_url = \"https://hooks.slack.com/x\"\ncolour = \"red\"\n").unwrap();
        let err = read_config_file(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, NotifyError::TomlParseError(_)), "{:?}", err);
    }
}

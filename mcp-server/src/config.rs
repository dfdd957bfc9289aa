//! Configuration surface for the Marcus service: loaded with the `config`
//! crate from a baked-in default, an optional file override, then
//! `MARCUS_`-prefixed environment variables, in that precedence order.

use anyhow::{Context, Result};
use config_rs::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;

use marcus_core::provider::ProviderKind;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub ai: AiConfig,
    pub monitor: MonitorConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub planka: Option<PlankaCredentials>,
    pub github: Option<GithubCredentials>,
    pub linear: Option<LinearCredentials>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlankaCredentials {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GithubCredentials {
    pub token: String,
    pub repo: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LinearCredentials {
    pub api_key: String,
    pub team_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AiConfig {
    /// Absent means the AI Enrichment Adapter always falls back to
    /// deterministic templates; Marcus ships no concrete vendor client.
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonitorConfig {
    pub interval_seconds: u64,
    pub stall_threshold_hours: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub port: u16,
    pub tool_call_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Empty disables auth: every SSE request is let through.
    pub tokens: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PersistenceConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (pretty, json, compact)
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Config {
    /// Load configuration from the baked-in default plus environment
    /// variable overrides.
    pub fn from_env() -> Result<Self> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from_str(
                include_str!("../config/default.toml"),
                FileFormat::Toml,
            ))
            .add_source(
                Environment::with_prefix("MARCUS")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder.build().context("failed to build configuration")?;
        config.try_deserialize().context("failed to deserialize configuration")
    }

    /// Load configuration from the baked-in default, a file override, then
    /// environment variables, in that precedence order.
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from_str(
                include_str!("../config/default.toml"),
                FileFormat::Toml,
            ))
            .add_source(File::with_name(path).required(false).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix("MARCUS")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder
            .build()
            .context("failed to build configuration from file")?;
        config
            .try_deserialize()
            .context("failed to deserialize configuration from file")
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.listen_addr, self.server.port)
    }

    /// Checks every precondition startup relies on, returning the first
    /// violation found. Called from `main` before construction continues;
    /// a failure here exits with code 1.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "invalid log level: {}. must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ));
            }
        }

        if self.persistence.path.trim().is_empty() {
            return Err(anyhow::anyhow!("persistence.path must not be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server.port cannot be 0"));
        }

        if self.ai.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("ai.timeout_seconds must be greater than 0"));
        }

        match self.provider.kind {
            ProviderKind::Memory => {}
            ProviderKind::Planka if self.provider.planka.is_some() => {}
            ProviderKind::Github if self.provider.github.is_some() => {}
            ProviderKind::Linear if self.provider.linear.is_some() => {}
            other => {
                return Err(anyhow::anyhow!(
                    "provider.kind is {other:?} but no matching credentials section was configured"
                ));
            }
        }

        Ok(())
    }

    /// Standard environment variables applied after the `config` crate
    /// pass, for compatibility with common deployment patterns that don't
    /// use the `MARCUS_` prefix.
    fn apply_standard_env_vars(&mut self) {
        if let Ok(path) = env::var("PERSISTENCE_PATH") {
            self.persistence.path = path;
        }
        if let Ok(listen_addr) = env::var("LISTEN_ADDR") {
            self.server.listen_addr = listen_addr;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.logging.level = log_level;
        }
    }

    pub fn merge_with_env(mut self) -> Self {
        self.apply_standard_env_vars();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                kind: ProviderKind::Memory,
                planka: None,
                github: None,
                linear: None,
            },
            ai: AiConfig { api_key: None, timeout_seconds: 10 },
            monitor: MonitorConfig { interval_seconds: 60, stall_threshold_hours: 24 },
            server: ServerConfig {
                listen_addr: "127.0.0.1".to_string(),
                port: 3000,
                tool_call_timeout_seconds: 30,
            },
            auth: AuthConfig { tokens: Vec::new() },
            persistence: PersistenceConfig { path: "data/assignments.json".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Pretty },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn server_address_combines_host_and_port() {
        let config = Config::default();
        assert_eq!(config.server_address(), "127.0.0.1:3000");
    }

    #[test]
    fn invalid_log_level_fails_validation() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_persistence_path_fails_validation() {
        let mut config = Config::default();
        config.persistence.path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_port_fails_validation() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn planka_provider_without_credentials_fails_validation() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Planka;
        assert!(config.validate().is_err());
    }

    #[test]
    fn planka_provider_with_credentials_passes_validation() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Planka;
        config.provider.planka = Some(PlankaCredentials {
            base_url: "https://planka.example.com".to_string(),
            token: "secret".to_string(),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_env_loads_the_baked_in_default() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.provider.kind, ProviderKind::Memory);
    }
}

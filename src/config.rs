//! Process configuration. Precedence: CLI > environment > config files > defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::pod::DEFAULT_NAMESPACE;

pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub connection_url: Option<String>,
    pub log_config: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub namespace: Option<String>,
    pub call_timeout_ms: Option<u64>,
    pub ping_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Fills fields still unset from `other`.
    pub fn merge(&mut self, other: Self) {
        let Self {
            connection_url,
            log_config,
            log_level,
            log_dir,
            namespace,
            call_timeout_ms,
            ping_timeout_secs,
        } = other;
        self.connection_url = self.connection_url.take().or(connection_url);
        self.log_config = self.log_config.take().or(log_config);
        self.log_level = self.log_level.take().or(log_level);
        self.log_dir = self.log_dir.take().or(log_dir);
        self.namespace = self.namespace.take().or(namespace);
        self.call_timeout_ms = self.call_timeout_ms.or(call_timeout_ms);
        self.ping_timeout_secs = self.ping_timeout_secs.or(ping_timeout_secs);
    }

    /// Reads a TOML config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&s).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
    }

    /// Reads settings from environment variables through `lookup`.
    ///
    /// # Errors
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let num = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(var)
                .map(|value| value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv { var, value }))
                .transpose()
        };
        Ok(Self {
            connection_url: lookup("MONGODB_CONNECTION_URL"),
            log_config: lookup("MONGOPOD_LOG_CONFIG").map(PathBuf::from),
            log_level: lookup("MONGOPOD_LOG_LEVEL"),
            log_dir: lookup("MONGOPOD_LOG_DIR").map(PathBuf::from),
            namespace: lookup("MONGOPOD_NAMESPACE"),
            call_timeout_ms: num("MONGOPOD_CALL_TIMEOUT_MS")?,
            ping_timeout_secs: num("MONGOPOD_PING_TIMEOUT_SECS")?,
        })
    }

    #[must_use]
    pub fn namespace_or_default(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    #[must_use]
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs.unwrap_or(DEFAULT_PING_TIMEOUT_SECS))
    }
}

/// Candidate config files, highest priority first.
#[must_use]
pub fn config_paths(cli_cfg: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = vec![];
    if let Some(p) = cli_cfg {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("MONGOPOD_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("mongopod.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("mongopod.toml"));
    }
    paths
}

/// Layers `cli` over the environment over existing config files.
///
/// # Errors
/// Returns an error if an existing config file is invalid or an environment value does not parse.
pub fn load(cli: AppConfig, cli_cfg: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = cli;
    cfg.merge(AppConfig::from_env_with(|k| std::env::var(k).ok())?);
    for p in config_paths(cli_cfg) {
        if p.exists() {
            cfg.merge(AppConfig::from_file(&p)?);
        }
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn earlier_layers_win() {
        let mut cfg = AppConfig { namespace: Some("cli".into()), ..AppConfig::default() };
        cfg.merge(AppConfig {
            namespace: Some("env".into()),
            call_timeout_ms: Some(50),
            ..AppConfig::default()
        });
        assert_eq!(cfg.namespace_or_default(), "cli");
        assert_eq!(cfg.call_timeout(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.namespace_or_default(), "netpod.jlabath.mongo");
        assert_eq!(cfg.ping_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.call_timeout(), None);
    }

    #[test]
    fn reads_env_through_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MONGODB_CONNECTION_URL", "mongodb://localhost:27017"),
            ("MONGOPOD_CALL_TIMEOUT_MS", "250"),
        ]);
        let cfg = AppConfig::from_env_with(|k| env.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(cfg.connection_url.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(cfg.call_timeout_ms, Some(250));
    }

    #[test]
    fn bad_numeric_env_is_an_error() {
        let e = AppConfig::from_env_with(|k| (k == "MONGOPOD_PING_TIMEOUT_SECS").then(|| "soon".into()))
            .unwrap_err();
        assert!(matches!(e, ConfigError::InvalidEnv { var: "MONGOPOD_PING_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn parses_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mongopod.toml");
        std::fs::write(&path, "namespace = \"acme.mongo\"\nping_timeout_secs = 2\n").unwrap();
        let cfg = AppConfig::from_file(&path).unwrap();
        assert_eq!(cfg.namespace.as_deref(), Some("acme.mongo"));
        assert_eq!(cfg.ping_timeout(), Duration::from_secs(2));
        std::fs::write(&path, "nonsense = 1\n").unwrap();
        assert!(matches!(AppConfig::from_file(&path), Err(ConfigError::Toml { .. })));
    }
}

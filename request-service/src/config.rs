//! Layered configuration for the request service.
//!
//! Precedence (later layers override earlier):
//! 1. Defaults
//! 2. TOML file: an explicit `--config` path, else
//!    `$SERVICEDESK_HOME/request-service.toml` (default home `~/.servicedesk`)
//! 3. Environment overrides (`SERVICEDESK_*`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 3002
//! api_key = "change-me"
//! classifier_url = "http://localhost:3003"
//! classifier_timeout_ms = 5000
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use servicedesk_core::classifier::ClassifierConfig;

/// File name looked up inside the service home directory.
pub const CONFIG_FILENAME: &str = "request-service.toml";

/// Key used when none is configured. Only suitable for local development.
pub const DEV_API_KEY: &str = "dev-api-key-12345";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid value for ${var}: '{value}' (expected: {expected})")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: String,
    },

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub classifier: ClassifierConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            api_key: DEV_API_KEY.to_string(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "api_key must not be empty".to_string(),
            ));
        }
        let endpoint = &self.classifier.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigLoadError::Validation(format!(
                "classifier_url must be an http(s) URL, got '{endpoint}'"
            )));
        }
        if self.classifier.timeout.is_zero() {
            return Err(ConfigLoadError::Validation(
                "classifier_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// On-disk shape. Every field is optional so a file can override a subset.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    classifier_url: Option<String>,
    classifier_timeout_ms: Option<u64>,
}

impl FileConfig {
    fn merge_into(self, config: &mut ServiceConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(url) = self.classifier_url {
            config.classifier.endpoint = url;
        }
        if let Some(ms) = self.classifier_timeout_ms {
            config.classifier.timeout = Duration::from_millis(ms);
        }
    }
}

/// Builder for layered configuration loading.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    home: Option<PathBuf>,
    env_prefix: String,
    skip_file: bool,
    skip_env: bool,
    /// Replaces the process environment when set.
    env: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            home: None,
            env_prefix: "SERVICEDESK".to_string(),
            skip_file: false,
            skip_env: false,
            env: None,
        }
    }

    /// Read this file instead of looking in the home directory.
    /// Unlike the home file, it must exist.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn with_home(mut self, path: PathBuf) -> Self {
        self.home = Some(path);
        self
    }

    /// Default is "SERVICEDESK", i.e. `SERVICEDESK_PORT`, `SERVICEDESK_API_KEY`, ...
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Read overrides from `vars` instead of the process environment.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    pub fn skip_file_layer(mut self) -> Self {
        self.skip_file = true;
        self
    }

    pub fn skip_env_layer(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load and validate. Precedence: default < file < environment.
    pub fn load(self) -> Result<ServiceConfig, ConfigLoadError> {
        let mut config = ServiceConfig::default();

        if !self.skip_file {
            let file_config = match &self.config_path {
                Some(path) => Self::load_from_file(path)?,
                None => match self.resolve_home() {
                    Some(home) => Self::load_optional_file(&home.join(CONFIG_FILENAME))?,
                    None => FileConfig::default(),
                },
            };
            file_config.merge_into(&mut config);
        }

        if !self.skip_env {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Priority: builder home, `$SERVICEDESK_HOME`, `~/.servicedesk`.
    fn resolve_home(&self) -> Option<PathBuf> {
        if let Some(path) = &self.home {
            return Some(path.clone());
        }
        if let Some(path) = self.env_var(&format!("{}_HOME", self.env_prefix)) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(".servicedesk"))
    }

    fn load_from_file(path: &Path) -> Result<FileConfig, ConfigLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    fn load_optional_file(path: &Path) -> Result<FileConfig, ConfigLoadError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("{} not found, using defaults", path.display());
                Ok(FileConfig::default())
            }
            Err(source) => Err(ConfigLoadError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        match &self.env {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }

    fn apply_env_overrides(&self, config: &mut ServiceConfig) -> Result<(), ConfigLoadError> {
        let prefix = &self.env_prefix;

        if let Some(host) = self.env_var(&format!("{prefix}_HOST")) {
            config.host = host;
        }
        if let Some(port) = self.env_var(&format!("{prefix}_PORT")) {
            config.port = port
                .parse()
                .map_err(|_| ConfigLoadError::InvalidEnvValue {
                    var: format!("{prefix}_PORT"),
                    value: port.clone(),
                    expected: "port number (0-65535)".to_string(),
                })?;
        }
        if let Some(api_key) = self.env_var(&format!("{prefix}_API_KEY")) {
            config.api_key = api_key;
        }
        if let Some(url) = self.env_var(&format!("{prefix}_CLASSIFIER_URL")) {
            config.classifier.endpoint = url;
        }
        if let Some(ms) = self.env_var(&format!("{prefix}_CLASSIFIER_TIMEOUT_MS")) {
            let parsed: u64 = ms.parse().map_err(|_| ConfigLoadError::InvalidEnvValue {
                var: format!("{prefix}_CLASSIFIER_TIMEOUT_MS"),
                value: ms.clone(),
                expected: "milliseconds as an unsigned integer".to_string(),
            })?;
            config.classifier.timeout = Duration::from_millis(parsed);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn write(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, contents).unwrap_or_else(|e| panic!("write config: {e}"));
        path
    }

    #[test]
    fn defaults_without_file_or_env() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let config = ConfigLoader::new()
            .with_home(dir.path().to_path_buf())
            .with_env_vars(HashMap::new())
            .load()
            .unwrap_or_else(|e| panic!("load: {e}"));
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3002");
    }

    #[test]
    fn file_then_env_precedence() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        write(
            &dir,
            r#"
port = 8080
api_key = "from-file"
classifier_url = "http://classifier:9000"
classifier_timeout_ms = 750
"#,
        );

        let config = ConfigLoader::new()
            .with_home(dir.path().to_path_buf())
            .with_env_vars(env(&[("SERVICEDESK_API_KEY", "from-env")]))
            .load()
            .unwrap_or_else(|e| panic!("load: {e}"));

        assert_eq!(config.port, 8080);
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.classifier.endpoint, "http://classifier:9000");
        assert_eq!(config.classifier.timeout, Duration::from_millis(750));
    }

    #[test]
    fn home_from_env_var() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        write(&dir, "port = 4100\n");
        let home = dir.path().to_string_lossy().to_string();

        let config = ConfigLoader::new()
            .with_env_vars(env(&[("SERVICEDESK_HOME", home.as_str())]))
            .load()
            .unwrap_or_else(|e| panic!("load: {e}"));
        assert_eq!(config.port, 4100);
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let err = ConfigLoader::new()
            .with_config_path(dir.path().join("missing.toml"))
            .skip_env_layer()
            .load()
            .err();
        assert!(matches!(err, Some(ConfigLoadError::Io { .. })));
    }

    #[test]
    fn unknown_file_key_is_rejected() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let path = write(&dir, "prot = 1\n");
        let err = ConfigLoader::new()
            .with_config_path(path)
            .skip_env_layer()
            .load()
            .err();
        assert!(matches!(err, Some(ConfigLoadError::TomlParse(_))));
    }

    #[test]
    fn invalid_env_port() {
        let err = ConfigLoader::new()
            .skip_file_layer()
            .with_env_vars(env(&[("SERVICEDESK_PORT", "eighty")]))
            .load()
            .err();
        match err {
            Some(ConfigLoadError::InvalidEnvValue { var, value, .. }) => {
                assert_eq!(var, "SERVICEDESK_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected InvalidEnvValue, got {other:?}"),
        }
    }

    #[test]
    fn custom_prefix() {
        let config = ConfigLoader::new()
            .skip_file_layer()
            .with_env_prefix("DESK")
            .with_env_vars(env(&[
                ("DESK_PORT", "9001"),
                ("SERVICEDESK_PORT", "1"),
            ]))
            .load()
            .unwrap_or_else(|e| panic!("load: {e}"));
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let err = ConfigLoader::new()
            .skip_file_layer()
            .with_env_vars(env(&[("SERVICEDESK_API_KEY", "  ")]))
            .load()
            .err();
        assert!(matches!(err, Some(ConfigLoadError::Validation(_))));

        let err = ConfigLoader::new()
            .skip_file_layer()
            .with_env_vars(env(&[("SERVICEDESK_CLASSIFIER_URL", "classifier:3003")]))
            .load()
            .err();
        assert!(matches!(err, Some(ConfigLoadError::Validation(_))));

        let err = ConfigLoader::new()
            .skip_file_layer()
            .with_env_vars(env(&[("SERVICEDESK_CLASSIFIER_TIMEOUT_MS", "0")]))
            .load()
            .err();
        assert!(matches!(err, Some(ConfigLoadError::Validation(_))));
    }
}

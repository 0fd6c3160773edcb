//! Authorization engine configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [cache]
//! enabled = true
//!
//! [providers]
//! order = ["database", "annotated"]
//!
//! [decision]
//! menu_transitive = true
//! log_decisions = false
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Root authorization configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Resolved role cache configuration.
    pub cache: CacheConfig,

    /// Role provider configuration.
    pub providers: ProvidersConfig,

    /// Decision layer configuration.
    pub decision: DecisionConfig,
}

/// Resolved role cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache merged roles per code.
    /// When disabled, every lookup resolves the hierarchy again.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Role provider configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Provider names in lookup order.
    /// When two providers define the same role code, the earlier one wins.
    /// Providers not listed keep their registration order after the listed ones.
    pub order: Vec<String>,
}

/// Decision layer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Resource name that grants access to every resource of a type.
    pub wildcard_resource: String,

    /// Treat a menu item as permitted when any of its descendants is.
    pub menu_transitive: bool,

    /// Emit a debug event for every access decision.
    pub log_decisions: bool,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            wildcard_resource: crate::model::WILDCARD.to_string(),
            menu_transitive: true,
            log_decisions: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthorizationConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::InvalidValue` if validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.as_ref().display(), "Authorization configuration loaded");
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The wildcard resource is empty
    /// - A provider name is empty or listed twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decision.wildcard_resource.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "decision.wildcard_resource cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.providers.order {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "providers.order contains an empty provider name".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "providers.order lists provider '{}' more than once",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AuthorizationConfig::default();
        assert!(config.cache.enabled);
        assert!(config.providers.order.is_empty());
        assert_eq!(config.decision.wildcard_resource, "*");
        assert!(config.decision.menu_transitive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = AuthorizationConfig::from_toml_str(
            r#"
            [cache]
            enabled = false

            [providers]
            order = ["database", "annotated"]

            [decision]
            log_decisions = true
            "#,
        )
        .unwrap();

        assert!(!config.cache.enabled);
        assert_eq!(config.providers.order, vec!["database", "annotated"]);
        assert!(config.decision.log_decisions);
        assert!(config.decision.menu_transitive);
    }

    #[test]
    fn test_empty_wildcard_fails_validation() {
        let mut config = AuthorizationConfig::default();
        config.decision.wildcard_resource = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("wildcard_resource"));
    }

    #[test]
    fn test_duplicate_provider_fails_validation() {
        let mut config = AuthorizationConfig::default();
        config.providers.order = vec!["database".to_string(), "database".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = AuthorizationConfig::from_toml_str("[cache\nenabled = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[providers]\norder = [\"annotated\"]").unwrap();

        let config = AuthorizationConfig::load(file.path()).unwrap();
        assert_eq!(config.providers.order, vec!["annotated"]);
    }

    #[test]
    fn test_missing_file() {
        let err = AuthorizationConfig::load("/nonexistent/rolegate.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

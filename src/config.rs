//! Application settings.
//!
//! Settings are read once, before routes are registered, and are shared
//! immutably afterwards. The TOML layout mirrors the dotted keys used by
//! the resolver:
//!
//! ```toml
//! case_sensitive = true
//! base_url = "/app/"
//!
//! [controller]
//! prefix = "\\App\\Controllers\\"
//! suffix = "Controller"
//! action_prefix = ""
//! action_suffix = "Action"
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Naming conventions applied when a `"Controller:action"` target is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Prepended to relative class names.
    pub prefix: String,
    /// Appended to every class name, relative or absolute.
    pub suffix: String,
    pub action_prefix: String,
    pub action_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether route patterns match the request path case-sensitively.
    pub case_sensitive: bool,
    /// Root that [`Router::url_for_base`](crate::router::Router::url_for_base)
    /// falls back to when no route is named `base`.
    pub base_url: String,
    pub controller: ControllerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            base_url: "/".to_string(),
            controller: ControllerConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        tracing::info!(path = ?path, "Settings loaded");
        Ok(settings)
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn controller_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.controller.prefix = prefix.into();
        self
    }

    pub fn controller_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.controller.suffix = suffix.into();
        self
    }

    pub fn action_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.controller.action_prefix = prefix.into();
        self
    }

    pub fn action_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.controller.action_suffix = suffix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty_and_case_sensitive() {
        let settings = Settings::default();
        assert!(settings.case_sensitive);
        assert_eq!(settings.base_url, "/");
        assert_eq!(settings.controller, ControllerConfig::default());
        assert!(settings.controller.prefix.is_empty());
    }

    #[test]
    fn parses_controller_table() {
        let settings = Settings::from_toml_str(
            r#"
            case_sensitive = false
            base_url = "/app/"

            [controller]
            prefix = "\\App\\"
            suffix = "Controller"
            "#,
        )
        .unwrap();
        assert!(!settings.case_sensitive);
        assert_eq!(settings.base_url, "/app/");
        assert_eq!(settings.controller.prefix, "\\App\\");
        assert_eq!(settings.controller.suffix, "Controller");
        assert_eq!(settings.controller.action_suffix, "");
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Settings::from_toml_str("case_sensitive = \"maybe\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Settings::load("/nonexistent/settings.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

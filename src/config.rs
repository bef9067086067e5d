//! Settings loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! bind = "127.0.0.1:8080"
//! language = "en"
//!
//! [log]
//! level = "debug"
//! json = false
//!
//! [messages.en]
//! "application.unauthorized.error" = "Please sign in to use {0}"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Process settings consumed at startup.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// `host:port` the server binds to.
    pub bind: String,
    /// Active message language.
    pub language: String,
    pub log: LogSettings,
    /// `language → code → pattern` overrides for the message catalogue.
    pub messages: HashMap<String, HashMap<String, String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_owned(),
            language: "en".to_owned(),
            log: LogSettings::default(),
            messages: HashMap::new(),
        }
    }
}

/// Logging settings. `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    /// JSON lines instead of the human-readable formatter.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_owned(), json: false }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML settings file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind, "0.0.0.0:8080");
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            bind = "127.0.0.1:9000"
            [log]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.bind, "127.0.0.1:9000");
        assert!(settings.log.json);
        assert_eq!(settings.log.level, "info");
        assert_eq!(settings.language, "en");
    }

    #[test]
    fn malformed_toml_is_a_settings_error() {
        let err = Settings::from_toml_str("bind = ").unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Settings::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

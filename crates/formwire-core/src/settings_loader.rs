//! Reading [`Settings`] from TOML or JSON documents and the environment.
//!
//! Every key is optional: [`Settings`] deserializes with `#[serde(default)]`,
//! so a document only lists what it changes. Unknown keys are rejected to
//! catch typos. Environment variables win over file contents:
//!
//! | Variable | Setting |
//! |---|---|
//! | `FORMWIRE_DEBUG` | `debug` |
//! | `FORMWIRE_LOG_LEVEL` | `log_level` |
//! | `FORMWIRE_MAX_DEPTH` | `max_depth` |
//! | `FORMWIRE_LABEL_SUFFIX` | `label_suffix` |
//!
//! ```rust,no_run
//! use formwire_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("formwire.toml").unwrap();
//! assert!(settings.max_depth > 0);
//! ```

use std::path::Path;

use crate::error::{FormwireError, FormwireResult};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy)]
enum Format {
    Toml,
    Json,
}

impl Format {
    const fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    fn parse(self, text: &str) -> FormwireResult<Settings> {
        let parsed: Result<Settings, String> = match self {
            Self::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| {
            FormwireError::ConfigurationError(format!("invalid {} settings: {reason}", self.name()))
        })
    }

    fn load(self, path: &Path) -> FormwireResult<Settings> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FormwireError::ConfigurationError(format!(
                "cannot read {} settings from {}: {e}",
                self.name(),
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), format = self.name(), "loading settings");
        self.parse(&text)
    }
}

/// Parses settings from TOML text.
pub fn from_toml_str(text: &str) -> FormwireResult<Settings> {
    Format::Toml.parse(text)
}

/// Reads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> FormwireResult<Settings> {
    Format::Toml.load(path.as_ref())
}

/// Reads settings from a TOML file, then applies the environment.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> FormwireResult<Settings> {
    from_toml_file(path).map(with_env)
}

/// Parses settings from JSON text.
pub fn from_json_str(text: &str) -> FormwireResult<Settings> {
    Format::Json.parse(text)
}

/// Reads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> FormwireResult<Settings> {
    Format::Json.load(path.as_ref())
}

/// Reads settings from a JSON file, then applies the environment.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> FormwireResult<Settings> {
    from_json_file(path).map(with_env)
}

/// The defaults with the environment applied.
pub fn from_env() -> Settings {
    with_env(Settings::default())
}

/// Overwrites `settings` with any `FORMWIRE_*` variables that are set.
///
/// `FORMWIRE_DEBUG` is true for `1`, `true`, `yes` or `on` (any case).
/// `FORMWIRE_MAX_DEPTH` must be a positive integer; other values are logged
/// and ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(flag) = env_var("FORMWIRE_DEBUG") {
        settings.debug = matches!(
            flag.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
    if let Some(level) = env_var("FORMWIRE_LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Some(depth) = env_var("FORMWIRE_MAX_DEPTH") {
        match depth.trim().parse::<usize>() {
            Ok(n) if n > 0 => settings.max_depth = n,
            _ => tracing::warn!(value = %depth, "ignoring invalid FORMWIRE_MAX_DEPTH"),
        }
    }
    if let Some(suffix) = env_var("FORMWIRE_LABEL_SUFFIX") {
        settings.label_suffix = suffix;
    }
}

fn with_env(mut settings: Settings) -> Settings {
    apply_env_overrides(&mut settings);
    settings
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("formwire-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_toml_overrides_only_listed_keys() {
        let settings = from_toml_str(
            r#"
            debug = false
            max_depth = 32
            label_suffix = " -"
            "#,
        )
        .unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.max_depth, 32);
        assert_eq!(settings.label_suffix, " -");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.date_input_format, "%Y-%m-%d");
    }

    #[test]
    fn test_empty_documents_give_defaults() {
        assert_eq!(from_toml_str("").unwrap(), Settings::default());
        assert_eq!(from_json_str("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_documents() {
        for result in [from_toml_str("max_depth = ["), from_json_str("{not json")] {
            assert!(matches!(result, Err(FormwireError::ConfigurationError(_))));
        }
    }

    #[test]
    fn test_wrong_type_names_the_format() {
        let err = from_toml_str(r#"max_depth = "deep""#).unwrap_err();
        assert!(err.to_string().contains("invalid TOML settings"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = from_json_str(r#"{"max_dept": 3}"#).unwrap_err();
        assert!(err.to_string().contains("invalid JSON settings"));
    }

    #[test]
    fn test_json_text() {
        let settings =
            from_json_str(r#"{"log_level": "debug", "time_input_format": "%H:%M"}"#).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.time_input_format, "%H:%M");
        assert_eq!(settings.max_depth, crate::settings::DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_files() {
        let toml_path = scratch_file("formwire.toml", "max_depth = 12\n");
        assert_eq!(from_toml_file(&toml_path).unwrap().max_depth, 12);

        let json_path = scratch_file("formwire.json", r#"{"debug": false}"#);
        assert!(!from_json_file(&json_path).unwrap().debug);

        for path in [toml_path, json_path] {
            if let Some(dir) = path.parent() {
                std::fs::remove_dir_all(dir).ok();
            }
        }
    }

    #[test]
    fn test_missing_file() {
        let err = from_toml_file("/nonexistent/formwire.toml").unwrap_err();
        assert!(err.to_string().contains("cannot read TOML settings"));
        assert!(from_json_file("/nonexistent/formwire.json").is_err());
    }

    #[test]
    fn test_env_label_suffix() {
        std::env::set_var("FORMWIRE_LABEL_SUFFIX", " =");
        assert_eq!(from_env().label_suffix, " =");
        std::env::remove_var("FORMWIRE_LABEL_SUFFIX");
    }

    #[test]
    fn test_env_max_depth_must_be_positive() {
        let mut settings = Settings::default();
        for (value, expected) in [("64", 64), ("0", 64), ("lots", 64), (" 8 ", 8)] {
            std::env::set_var("FORMWIRE_MAX_DEPTH", value);
            apply_env_overrides(&mut settings);
            assert_eq!(settings.max_depth, expected, "FORMWIRE_MAX_DEPTH={value:?}");
        }
        std::env::remove_var("FORMWIRE_MAX_DEPTH");
    }
}

//! Settings for formwire.
//!
//! [`Settings`] holds everything the normalizer and the form describer can be
//! configured with. Defaults are chosen so that `Settings::default()` works
//! without any configuration file; see [`settings_loader`](crate::settings_loader)
//! for loading overrides.

use serde::{Deserialize, Serialize};

/// The default maximum nesting depth accepted by the normalizer.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The complete set of formwire settings.
///
/// # Examples
///
/// ```
/// use formwire_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.max_depth, 128);
/// assert_eq!(settings.label_suffix, ":");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled. Selects pretty log output.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter directive (e.g. "info", "formwire_normalize=debug").
    pub log_level: String,

    // ── Normalizer ───────────────────────────────────────────────────

    /// Maximum nesting depth before normalization fails.
    pub max_depth: usize,

    // ── Forms ────────────────────────────────────────────────────────

    /// Label suffix used when a form does not set its own.
    pub label_suffix: String,
    /// Format for date initial values when the field has no input formats.
    pub date_input_format: String,
    /// Format for date-time initial values when the field has no input formats.
    pub datetime_input_format: String,
    /// Format for time initial values when the field has no input formats.
    pub time_input_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            label_suffix: ":".to_string(),
            date_input_format: "%Y-%m-%d".to_string(),
            datetime_input_format: "%Y-%m-%d %H:%M:%S".to_string(),
            time_input_format: "%H:%M:%S".to_string(),
        }
    }
}

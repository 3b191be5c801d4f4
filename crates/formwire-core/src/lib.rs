//! # formwire-core
//!
//! Core types shared by every formwire crate: error types, settings, settings
//! loading, and logging setup. This crate has no formwire dependencies.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Normalizer and describer configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{FormwireError, FormwireResult, NormalizationError};
pub use settings::Settings;

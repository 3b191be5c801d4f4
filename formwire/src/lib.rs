//! # formwire
//!
//! Describe server-side forms as plain, JSON-ready mappings for remote
//! clients.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formwire` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```
//! use formwire::prelude::*;
//!
//! let form = FormDef::new("NewsletterForm", vec![
//!     FieldDef::new("email", FieldKind::Email { min_length: None, max_length: Some(254) }),
//! ]);
//! let described = RemoteForm::new(&form).as_dict().unwrap();
//! assert_eq!(described["fields"]["email"]["widget"]["input_type"], "email");
//! ```

/// Errors, settings, settings loading, and logging setup.
pub use formwire_core as core;

/// The value normalizer.
#[cfg(feature = "normalize")]
pub use formwire_normalize as normalize;

/// Form, field, and widget descriptions.
#[cfg(feature = "forms")]
pub use formwire_forms as forms;

// Third-party re-exports.
pub use chrono;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// The types most applications need.
pub mod prelude {
    pub use formwire_core::logging::setup_logging;
    pub use formwire_core::{FormwireError, FormwireResult, NormalizationError, Settings};

    #[cfg(feature = "normalize")]
    pub use formwire_normalize::{
        normalize, ChoiceIteratorValue, CollectingSink, Deferred, DeferredError, Diagnostic,
        DiagnosticKind, DiagnosticSink, Entity, EntityError, LazySequence, LazyText, Mapping,
        Normalizer, OpaqueValue, TracingSink,
    };

    #[cfg(feature = "forms")]
    pub use formwire_forms::{
        Choice, ChoiceList, FieldDef, FieldKind, Fieldset, FormDef, Registry, RemoteForm,
        Widget, WidgetKind,
    };
}

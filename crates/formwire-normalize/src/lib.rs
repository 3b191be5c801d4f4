//! # formwire-normalize
//!
//! Reduces an [`OpaqueValue`] tree (mappings, sequences, lazy text, thunks,
//! foreign entities, and scalars) to a [`serde_json::Value`] containing only
//! objects, arrays, strings, numbers, booleans, and null.
//!
//! ```
//! use formwire_normalize::{normalize, Mapping, OpaqueValue, TracingSink};
//!
//! let mut map = Mapping::new();
//! map.insert("a", 1);
//! map.insert(
//!     "b",
//!     vec![OpaqueValue::from(1), OpaqueValue::from(2), OpaqueValue::invocable(|| "x".into())],
//! );
//!
//! let value = normalize(&OpaqueValue::Mapping(map), &TracingSink).unwrap();
//! assert_eq!(value, serde_json::json!({"a": 1, "b": [1, 2, "x"]}));
//! ```

pub mod diagnostics;
pub mod form_errors;
pub mod normalizer;
pub mod value;

pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use formwire_core::NormalizationError;
pub use normalizer::{normalize, Normalizer};
pub use value::{
    ChoiceIteratorValue, Deferred, DeferredError, Entity, EntityError, LazySequence, LazyText,
    Mapping, OpaqueValue, Thunk,
};

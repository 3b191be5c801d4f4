//! Form definitions.
//!
//! A [`FormDef`] is the server-side state of a form that is about to be
//! described: its fields in declaration order, optional prefix and label
//! suffix, form-level initial data, and (once bound) the submitted data and
//! validation errors. Validation itself happens elsewhere; a `FormDef` only
//! carries its outcome.

use formwire_normalize::{Mapping, OpaqueValue};

use crate::fields::FieldDef;

/// The state of a form to be described.
///
/// # Examples
///
/// ```
/// use formwire_forms::fields::{FieldDef, FieldKind};
/// use formwire_forms::form::FormDef;
///
/// let form = FormDef::new(
///     "ContactForm",
///     vec![
///         FieldDef::new("name", FieldKind::char()),
///         FieldDef::new("message", FieldKind::char()).required(false),
///     ],
/// )
/// .with_prefix("contact");
///
/// assert_eq!(form.fields.len(), 2);
/// assert!(!form.is_bound);
/// assert!(form.field("message").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct FormDef {
    /// The form's title, usually its type name.
    pub title: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Prefix namespacing the fields' HTML names.
    pub prefix: Option<String>,
    /// Suffix appended to labels; `None` uses the configured default.
    pub label_suffix: Option<String>,
    /// Whether submitted data has been bound.
    pub is_bound: bool,
    /// Form-level initial values, overriding the fields' own.
    pub initial: Mapping,
    /// The submitted data, when bound.
    pub data: Mapping,
    /// Errors keyed by field name.
    pub errors: Mapping,
    /// Errors not attached to any field.
    pub non_field_errors: Vec<OpaqueValue>,
}

impl FormDef {
    /// Creates an unbound form with the given fields.
    pub fn new(title: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            title: title.into(),
            fields,
            prefix: None,
            label_suffix: None,
            is_bound: false,
            initial: Mapping::new(),
            data: Mapping::new(),
            errors: Mapping::new(),
            non_field_errors: Vec::new(),
        }
    }

    /// Sets the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the label suffix.
    #[must_use]
    pub fn with_label_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.label_suffix = Some(suffix.into());
        self
    }

    /// Sets form-level initial values.
    #[must_use]
    pub fn with_initial(mut self, initial: Mapping) -> Self {
        self.initial = initial;
        self
    }

    /// Binds submitted data.
    #[must_use]
    pub fn bind(mut self, data: Mapping) -> Self {
        self.data = data;
        self.is_bound = true;
        self
    }

    /// Records per-field errors.
    #[must_use]
    pub fn with_errors(mut self, errors: Mapping) -> Self {
        self.errors = errors;
        self
    }

    /// Records errors not attached to a field.
    #[must_use]
    pub fn with_non_field_errors(mut self, errors: Vec<OpaqueValue>) -> Self {
        self.non_field_errors = errors;
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

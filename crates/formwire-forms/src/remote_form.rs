//! Whole-form descriptions.
//!
//! [`RemoteForm`] selects, orders, and groups the fields of a [`FormDef`],
//! describes each of them, and normalizes the result into a single
//! [`serde_json::Value`] that a remote client can rebuild the form from.

use once_cell::sync::Lazy;
use serde_json::Value;

use formwire_core::logging::describe_span;
use formwire_core::{FormwireError, FormwireResult, Settings};
use formwire_normalize::{DiagnosticSink, Mapping, Normalizer, OpaqueValue, TracingSink};

use crate::fields::FieldDef;
use crate::form::FormDef;
use crate::registry::{DescribeContext, Registry};
use crate::remote_field::RemoteField;

/// Key of the fieldset used when none are configured.
pub const BASE_FIELDSET: &str = "__base_fieldset__";

static DEFAULT_SETTINGS: Lazy<Settings> = Lazy::new(Settings::default);
static DEFAULT_SINK: TracingSink = TracingSink;

/// A named group of fields.
#[derive(Debug, Clone)]
pub struct Fieldset {
    /// Identifies the fieldset.
    pub key: String,
    /// Optional heading.
    pub legend: Option<OpaqueValue>,
    /// Field names, in display order.
    pub fields: Vec<String>,
}

impl Fieldset {
    /// Creates a fieldset without a legend.
    pub fn new<S: Into<String>>(key: impl Into<String>, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            key: key.into(),
            legend: None,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the legend.
    #[must_use]
    pub fn legend(mut self, legend: impl Into<OpaqueValue>) -> Self {
        self.legend = Some(legend.into());
        self
    }
}

/// Describes a form for a remote client.
///
/// # Examples
///
/// ```
/// use formwire_forms::fields::{FieldDef, FieldKind};
/// use formwire_forms::form::FormDef;
/// use formwire_forms::remote_form::RemoteForm;
///
/// let form = FormDef::new("LoginForm", vec![
///     FieldDef::new("username", FieldKind::char()),
///     FieldDef::new("password", FieldKind::char()),
/// ]);
///
/// let described = RemoteForm::new(&form).readonly(["username"]).as_dict().unwrap();
/// assert_eq!(described["title"], "LoginForm");
/// assert_eq!(described["fields"]["username"]["readonly"], true);
/// assert_eq!(described["ordered_fields"], serde_json::json!(["username", "password"]));
/// ```
pub struct RemoteForm<'a> {
    form: &'a FormDef,
    fields: Option<Vec<String>>,
    exclude: Vec<String>,
    readonly: Vec<String>,
    ordering: Vec<String>,
    fieldsets: Vec<Fieldset>,
    registry: &'a Registry,
    settings: &'a Settings,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> RemoteForm<'a> {
    /// Wraps `form` with the builtin registry, default settings, and
    /// diagnostics logged through `tracing`.
    pub fn new(form: &'a FormDef) -> Self {
        Self {
            form,
            fields: None,
            exclude: Vec::new(),
            readonly: Vec::new(),
            ordering: Vec::new(),
            fieldsets: Vec::new(),
            registry: Registry::global(),
            settings: &DEFAULT_SETTINGS,
            sink: &DEFAULT_SINK,
        }
    }

    /// Describes only the named fields.
    #[must_use]
    pub fn fields<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Leaves the named fields out.
    #[must_use]
    pub fn exclude<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the named fields read-only.
    #[must_use]
    pub fn readonly<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.readonly = names.into_iter().map(Into::into).collect();
        self
    }

    /// Lists fields first, in this order. Unlisted fields follow in
    /// declaration order.
    #[must_use]
    pub fn ordering<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.ordering = names.into_iter().map(Into::into).collect();
        self
    }

    /// Groups fields into fieldsets.
    #[must_use]
    pub fn fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets = fieldsets;
        self
    }

    /// Uses `registry` to look up kind handlers.
    #[must_use]
    pub fn registry(mut self, registry: &'a Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Uses `settings` for formats, label suffix, and depth limit.
    #[must_use]
    pub fn settings(mut self, settings: &'a Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Reports soft diagnostics to `sink`.
    #[must_use]
    pub fn sink(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    /// Describes the form as a normalized JSON object.
    pub fn as_dict(&self) -> FormwireResult<Value> {
        let span = describe_span(&self.form.title);
        let _guard = span.enter();

        self.check_names()?;
        let ordered = self.ordered_fields();
        let ctx = DescribeContext::new(self.registry, self.settings, self.sink);
        let normalizer = Normalizer::from_settings(self.settings, self.sink);

        // Thunks run once here; the field description and `data` share the result.
        let resolved: Vec<(FieldDef, OpaqueValue)> = ordered
            .iter()
            .map(|field| (resolve_choices(field), self.resolve_initial(field)))
            .collect();

        let mut fields = Mapping::new();
        for (field, initial) in &resolved {
            let path = format!("$.fields.{}", field.name);
            let mut described = RemoteField::new(field, ctx.at(&path))
                .with_initial(Some(initial))
                .as_mapping();
            described.insert("readonly", self.readonly.contains(&field.name));
            fields.insert(field.name.clone(), described);
        }

        let ordered_names: Vec<OpaqueValue> = ordered
            .iter()
            .map(|f| OpaqueValue::from(f.name.as_str()))
            .collect();

        let mut out = Mapping::new();
        out.insert("title", self.form.title.as_str());
        out.insert(
            "non_field_errors",
            normalizer.normalize_error_list(&self.form.non_field_errors)?,
        );
        out.insert(
            "label_suffix",
            self.form
                .label_suffix
                .as_deref()
                .unwrap_or(self.settings.label_suffix.as_str()),
        );
        out.insert("is_bound", self.form.is_bound);
        out.insert("prefix", self.form.prefix.as_deref());
        out.insert("fields", fields);
        out.insert("fieldsets", self.describe_fieldsets(&ordered));
        out.insert("ordered_fields", ordered_names);
        out.insert(
            "errors",
            Value::Object(normalizer.normalize_error_dict(&self.form.errors)?),
        );
        out.insert("data", self.data(&resolved));

        let value = normalizer.normalize(&OpaqueValue::Mapping(out))?;
        tracing::debug!(fields = ordered.len(), "form described");
        Ok(value)
    }

    /// Describes the form as compact JSON text.
    pub fn to_json_string(&self) -> FormwireResult<String> {
        Ok(serde_json::to_string(&self.as_dict()?)?)
    }

    /// Describes the form as indented JSON text.
    pub fn to_json_string_pretty(&self) -> FormwireResult<String> {
        Ok(serde_json::to_string_pretty(&self.as_dict()?)?)
    }

    fn check_names(&self) -> FormwireResult<()> {
        let fieldset_names = self.fieldsets.iter().flat_map(|fs| fs.fields.iter());
        self.fields
            .iter()
            .flatten()
            .chain(&self.exclude)
            .chain(&self.readonly)
            .chain(&self.ordering)
            .chain(fieldset_names)
            .find(|name| self.form.field(name).is_none())
            .map_or(Ok(()), |name| {
                Err(FormwireError::UnknownField(name.clone()))
            })
    }

    fn is_included(&self, name: &str) -> bool {
        let selected = self
            .fields
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == name));
        selected && !self.exclude.iter().any(|n| n == name)
    }

    fn ordered_fields(&self) -> Vec<&'a FieldDef> {
        let form = self.form;
        let mut ordered: Vec<&'a FieldDef> = Vec::with_capacity(form.fields.len());
        for name in &self.ordering {
            if let Some(field) = form.field(name) {
                if self.is_included(name) && !ordered.iter().any(|f| f.name == *name) {
                    ordered.push(field);
                }
            }
        }
        for field in &form.fields {
            if self.is_included(&field.name) && !ordered.iter().any(|f| f.name == field.name) {
                ordered.push(field);
            }
        }
        ordered
    }

    fn describe_fieldsets(&self, ordered: &[&FieldDef]) -> OpaqueValue {
        if self.fieldsets.is_empty() {
            let names = ordered.iter().map(|f| f.name.as_str()).collect();
            return OpaqueValue::Sequence(vec![fieldset_entry(BASE_FIELDSET, None, names)]);
        }
        OpaqueValue::Sequence(
            self.fieldsets
                .iter()
                .map(|fs| {
                    let names = fs
                        .fields
                        .iter()
                        .map(String::as_str)
                        .filter(|name| self.is_included(name))
                        .collect();
                    fieldset_entry(&fs.key, fs.legend.as_ref(), names)
                })
                .collect(),
        )
    }

    fn resolve_initial(&self, field: &FieldDef) -> OpaqueValue {
        match self.form.initial.get(&field.name).unwrap_or(&field.initial) {
            OpaqueValue::Invocable(thunk) => thunk(),
            other => other.clone(),
        }
    }

    fn data(&self, resolved: &[(FieldDef, OpaqueValue)]) -> Mapping {
        if self.form.is_bound {
            return self.form.data.clone();
        }
        resolved
            .iter()
            .map(|(field, initial)| {
                (
                    field.name.clone(),
                    field.wire_initial(initial, self.settings),
                )
            })
            .collect()
    }
}

/// Copies `field` with deferred choices evaluated. A widget drawing on the
/// same source as its field reuses the field's options.
fn resolve_choices(field: &FieldDef) -> FieldDef {
    let mut resolved = field.clone();
    let mut from_field = None;
    if let Some(choices) = resolved.kind.choices_mut() {
        let fixed = choices.resolved();
        from_field = Some((std::mem::replace(choices, fixed.clone()), fixed));
    }
    if let Some(choices) = resolved.widget.kind.choices_mut() {
        *choices = match &from_field {
            Some((source, fixed)) if choices.shares_source(source) => fixed.clone(),
            _ => choices.resolved(),
        };
    }
    resolved
}

fn fieldset_entry(key: &str, legend: Option<&OpaqueValue>, names: Vec<&str>) -> OpaqueValue {
    let mut entry = Mapping::new();
    entry.insert("key", key);
    entry.insert("legend", legend.cloned());
    entry.insert("fields", names);
    OpaqueValue::Mapping(entry)
}

impl std::fmt::Debug for RemoteForm<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteForm")
            .field("form", &self.form.title)
            .field("fields", &self.fields)
            .field("exclude", &self.exclude)
            .field("readonly", &self.readonly)
            .field("ordering", &self.ordering)
            .field("fieldsets", &self.fieldsets)
            .finish_non_exhaustive()
    }
}

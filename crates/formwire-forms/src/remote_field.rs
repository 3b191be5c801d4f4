//! Field descriptions.
//!
//! [`RemoteField::as_mapping`] emits the base keys of a field, its widget
//! description, and then the keys contributed by the kind's handler.

use formwire_normalize::{Diagnostic, DiagnosticKind, Mapping, OpaqueValue};

use crate::fields::{FieldDef, FieldKind};
use crate::registry::{DescribeContext, Registry};
use crate::remote_widget::RemoteWidget;

/// Describes one field for a remote client.
///
/// Initial data supplied by the form takes precedence over the field's own
/// initial value.
#[derive(Debug, Clone, Copy)]
pub struct RemoteField<'a> {
    field: &'a FieldDef,
    initial: Option<&'a OpaqueValue>,
    ctx: DescribeContext<'a>,
}

impl<'a> RemoteField<'a> {
    /// Wraps `field` for description within `ctx`.
    pub const fn new(field: &'a FieldDef, ctx: DescribeContext<'a>) -> Self {
        Self {
            field,
            initial: None,
            ctx,
        }
    }

    /// Overrides the field's initial value with form-level initial data.
    #[must_use]
    pub const fn with_initial(mut self, initial: Option<&'a OpaqueValue>) -> Self {
        self.initial = initial;
        self
    }

    /// The initial value to describe, before wire formatting.
    pub fn initial(&self) -> &'a OpaqueValue {
        self.initial.unwrap_or(&self.field.initial)
    }

    /// Builds the field description.
    pub fn as_mapping(&self) -> Mapping {
        let field = self.field;
        let ctx = &self.ctx;
        let mut out = Mapping::new();
        out.insert("title", field.kind.name());
        out.insert("required", field.required);
        out.insert("label", field.label.clone());
        out.insert("initial", field.wire_initial(self.initial(), ctx.settings));
        out.insert("help_text", field.help_text.clone());
        out.insert("error_messages", field.error_messages.clone());
        out.insert("disabled", field.disabled);

        let widget_path = format!("{}.widget", ctx.path);
        let widget = RemoteWidget::new(&field.widget, ctx.at(&widget_path));
        out.insert("widget", widget.as_mapping());

        match ctx.registry.field_handler(field.kind.name()) {
            Some(handler) => handler(field, ctx, &mut out),
            None => {
                tracing::debug!(
                    kind = field.kind.name(),
                    path = ctx.path,
                    "no field handler registered"
                );
                ctx.sink.report(Diagnostic::new(
                    ctx.path,
                    DiagnosticKind::UnregisteredKind,
                    format!("no handler for field kind {}", field.kind.name()),
                ));
            }
        }
        out
    }
}

pub(crate) fn register_builtin(registry: &mut Registry) {
    registry
        .register_field("CharField", describe_lengths)
        .register_field("EmailField", describe_lengths)
        .register_field("URLField", describe_lengths)
        .register_field("RegexField", describe_regex)
        .register_field("IntegerField", describe_bounds)
        .register_field("FloatField", describe_bounds)
        .register_field("DecimalField", describe_bounds)
        .register_field("DateField", describe_input_formats)
        .register_field("TimeField", describe_input_formats)
        .register_field("DateTimeField", describe_input_formats)
        .register_field("SplitDateTimeField", describe_input_formats)
        .register_field("BooleanField", describe_nothing)
        .register_field("NullBooleanField", describe_nothing)
        .register_field("ChoiceField", describe_choices)
        .register_field("TypedChoiceField", describe_choices)
        .register_field("MultipleChoiceField", describe_choices)
        .register_field("ModelChoiceField", describe_choices)
        .register_field("ModelMultipleChoiceField", describe_choices)
        .register_field("FileField", describe_file)
        .register_field("ImageField", describe_file);
}

fn describe_nothing(_: &FieldDef, _: &DescribeContext<'_>, _: &mut Mapping) {}

fn describe_lengths(field: &FieldDef, _: &DescribeContext<'_>, out: &mut Mapping) {
    if let FieldKind::Char {
        min_length,
        max_length,
    }
    | FieldKind::Email {
        min_length,
        max_length,
    }
    | FieldKind::Url {
        min_length,
        max_length,
    } = &field.kind
    {
        out.insert("max_length", *max_length);
        out.insert("min_length", *min_length);
    }
}

fn describe_regex(field: &FieldDef, _: &DescribeContext<'_>, out: &mut Mapping) {
    if let FieldKind::Regex {
        regex,
        min_length,
        max_length,
    } = &field.kind
    {
        out.insert("regex", regex.as_str());
        out.insert("max_length", *max_length);
        out.insert("min_length", *min_length);
    }
}

fn describe_bounds(field: &FieldDef, _: &DescribeContext<'_>, out: &mut Mapping) {
    match &field.kind {
        FieldKind::Integer {
            min_value,
            max_value,
        } => {
            out.insert("max_value", *max_value);
            out.insert("min_value", *min_value);
        }
        FieldKind::Float {
            min_value,
            max_value,
        } => {
            out.insert("max_value", *max_value);
            out.insert("min_value", *min_value);
        }
        FieldKind::Decimal {
            min_value,
            max_value,
            max_digits,
            decimal_places,
        } => {
            out.insert("max_value", *max_value);
            out.insert("min_value", *min_value);
            out.insert("max_digits", *max_digits);
            out.insert("decimal_places", *decimal_places);
        }
        _ => {}
    }
}

fn describe_input_formats(field: &FieldDef, _: &DescribeContext<'_>, out: &mut Mapping) {
    match &field.kind {
        FieldKind::Date { input_formats }
        | FieldKind::Time { input_formats }
        | FieldKind::DateTime { input_formats } => {
            out.insert("input_formats", input_formats.clone());
        }
        FieldKind::SplitDateTime {
            input_date_formats,
            input_time_formats,
        } => {
            out.insert("input_date_formats", input_date_formats.clone());
            out.insert("input_time_formats", input_time_formats.clone());
        }
        _ => {}
    }
}

fn describe_choices(field: &FieldDef, _: &DescribeContext<'_>, out: &mut Mapping) {
    if let Some(choices) = field.kind.choices() {
        out.insert("choices", choices.to_opaque());
    }
    match &field.kind {
        FieldKind::TypedChoice { empty_value, .. } => {
            out.insert("empty_value", empty_value.clone());
        }
        FieldKind::ModelChoice { empty_label, .. } => {
            out.insert("empty_label", empty_label.clone());
        }
        _ => {}
    }
}

fn describe_file(field: &FieldDef, _: &DescribeContext<'_>, out: &mut Mapping) {
    if let FieldKind::File {
        max_length,
        allow_empty_file,
    }
    | FieldKind::Image {
        max_length,
        allow_empty_file,
    } = &field.kind
    {
        out.insert("max_length", *max_length);
        out.insert("allow_empty_file", *allow_empty_file);
    }
}

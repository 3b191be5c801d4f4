//! Form field descriptors.
//!
//! Each [`FieldDef`] describes a single form field: its [`FieldKind`] (with
//! the kind's constraints), label, help text, initial value, error messages,
//! and widget. Labels, help texts, and initial values are [`OpaqueValue`]s so
//! they can be lazy text, thunks, or entity references; the normalizer
//! resolves them when the form is described.

use std::fmt::{self, Write as _};

use regex::Regex;

use formwire_core::Settings;
use formwire_normalize::{Mapping, OpaqueValue};

use crate::widgets::{ChoiceList, Widget, WidgetKind};

/// Defines the kind of a form field, including kind-specific constraints.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Free text.
    Char {
        /// Shortest accepted value, in characters.
        min_length: Option<usize>,
        /// Longest accepted value, in characters.
        max_length: Option<usize>,
    },
    /// An integer field.
    Integer {
        /// Lower bound, inclusive.
        min_value: Option<i64>,
        /// Upper bound, inclusive.
        max_value: Option<i64>,
    },
    /// A float.
    Float {
        /// Lower bound, inclusive.
        min_value: Option<f64>,
        /// Upper bound, inclusive.
        max_value: Option<f64>,
    },
    /// A fixed-precision decimal field.
    Decimal {
        /// Lower bound, inclusive.
        min_value: Option<f64>,
        /// Upper bound, inclusive.
        max_value: Option<f64>,
        /// Maximum total number of digits.
        max_digits: Option<u32>,
        /// Number of digits after the decimal point.
        decimal_places: Option<u32>,
    },
    /// A date field.
    Date {
        /// Accepted input formats, most preferred first.
        input_formats: Vec<String>,
    },
    /// A time field.
    Time {
        /// Accepted input formats, most preferred first.
        input_formats: Vec<String>,
    },
    /// A date-time field.
    DateTime {
        /// Accepted input formats, most preferred first.
        input_formats: Vec<String>,
    },
    /// A date-time entered as separate date and time parts.
    SplitDateTime {
        /// Accepted formats of the date part.
        input_date_formats: Vec<String>,
        /// Accepted formats of the time part.
        input_time_formats: Vec<String>,
    },
    /// A field validated against a regular expression.
    Regex {
        /// The compiled pattern.
        regex: Regex,
        /// Shortest accepted value, in characters.
        min_length: Option<usize>,
        /// Longest accepted value, in characters.
        max_length: Option<usize>,
    },
    /// An email address field.
    Email {
        /// Shortest accepted value, in characters.
        min_length: Option<usize>,
        /// Longest accepted value, in characters.
        max_length: Option<usize>,
    },
    /// A URL field.
    Url {
        /// Shortest accepted value, in characters.
        min_length: Option<usize>,
        /// Longest accepted value, in characters.
        max_length: Option<usize>,
    },
    /// A checkbox: true or false.
    Boolean,
    /// Yes, no, or unknown.
    NullBoolean,
    /// A single-choice field.
    Choice {
        /// Available choices.
        choices: ChoiceList,
    },
    /// A single-choice field whose value is coerced after selection.
    TypedChoice {
        /// Available choices.
        choices: ChoiceList,
        /// The value used when nothing is selected.
        empty_value: OpaqueValue,
    },
    /// A multiple-choice field.
    MultipleChoice {
        /// Available choices.
        choices: ChoiceList,
    },
    /// A single choice among domain entities.
    ModelChoice {
        /// Available choices, usually deferred.
        choices: ChoiceList,
        /// Label of the empty option, if the field offers one.
        empty_label: Option<OpaqueValue>,
    },
    /// Several choices among domain entities.
    ModelMultipleChoice {
        /// Available choices, usually deferred.
        choices: ChoiceList,
    },
    /// A file upload field.
    File {
        /// Maximum file name length.
        max_length: Option<usize>,
        /// Whether empty files are accepted.
        allow_empty_file: bool,
    },
    /// An image upload field.
    Image {
        /// Maximum file name length.
        max_length: Option<usize>,
        /// Whether empty files are accepted.
        allow_empty_file: bool,
    },
}

impl FieldKind {
    /// The kind's name, used as its title and registry key.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Char { .. } => "CharField",
            Self::Integer { .. } => "IntegerField",
            Self::Float { .. } => "FloatField",
            Self::Decimal { .. } => "DecimalField",
            Self::Date { .. } => "DateField",
            Self::Time { .. } => "TimeField",
            Self::DateTime { .. } => "DateTimeField",
            Self::SplitDateTime { .. } => "SplitDateTimeField",
            Self::Regex { .. } => "RegexField",
            Self::Email { .. } => "EmailField",
            Self::Url { .. } => "URLField",
            Self::Boolean => "BooleanField",
            Self::NullBoolean => "NullBooleanField",
            Self::Choice { .. } => "ChoiceField",
            Self::TypedChoice { .. } => "TypedChoiceField",
            Self::MultipleChoice { .. } => "MultipleChoiceField",
            Self::ModelChoice { .. } => "ModelChoiceField",
            Self::ModelMultipleChoice { .. } => "ModelMultipleChoiceField",
            Self::File { .. } => "FileField",
            Self::Image { .. } => "ImageField",
        }
    }

    /// A `Char` kind without length limits.
    pub const fn char() -> Self {
        Self::Char {
            min_length: None,
            max_length: None,
        }
    }

    /// A `Date` kind accepting only ISO dates.
    pub fn date() -> Self {
        Self::Date {
            input_formats: vec!["%Y-%m-%d".to_string()],
        }
    }

    /// The choices carried by this kind, if any.
    pub const fn choices(&self) -> Option<&ChoiceList> {
        match self {
            Self::Choice { choices }
            | Self::TypedChoice { choices, .. }
            | Self::MultipleChoice { choices }
            | Self::ModelChoice { choices, .. }
            | Self::ModelMultipleChoice { choices } => Some(choices),
            _ => None,
        }
    }

    pub(crate) fn choices_mut(&mut self) -> Option<&mut ChoiceList> {
        match self {
            Self::Choice { choices }
            | Self::TypedChoice { choices, .. }
            | Self::MultipleChoice { choices }
            | Self::ModelChoice { choices, .. }
            | Self::ModelMultipleChoice { choices } => Some(choices),
            _ => None,
        }
    }
}

/// Returns the default widget kind for a given field kind.
pub fn default_widget_for_kind(kind: &FieldKind) -> WidgetKind {
    match kind {
        FieldKind::Char { .. } | FieldKind::Regex { .. } => WidgetKind::TextInput,
        FieldKind::Integer { .. } | FieldKind::Float { .. } | FieldKind::Decimal { .. } => {
            WidgetKind::NumberInput
        }
        FieldKind::Date { .. } => WidgetKind::DateInput { format: None },
        FieldKind::Time { .. } => WidgetKind::TimeInput { format: None },
        FieldKind::DateTime { .. } => WidgetKind::DateTimeInput { format: None },
        FieldKind::SplitDateTime { .. } => WidgetKind::SplitDateTime {
            date_format: None,
            time_format: None,
        },
        FieldKind::Email { .. } => WidgetKind::EmailInput,
        FieldKind::Url { .. } => WidgetKind::UrlInput,
        FieldKind::Boolean => WidgetKind::CheckboxInput { check_test: false },
        FieldKind::NullBoolean => WidgetKind::NullBooleanSelect,
        FieldKind::Choice { choices }
        | FieldKind::TypedChoice { choices, .. }
        | FieldKind::ModelChoice { choices, .. } => WidgetKind::Select {
            choices: choices.clone(),
        },
        FieldKind::MultipleChoice { choices } | FieldKind::ModelMultipleChoice { choices } => {
            WidgetKind::SelectMultiple {
                choices: choices.clone(),
            }
        }
        FieldKind::File { .. } | FieldKind::Image { .. } => WidgetKind::clearable_file(),
    }
}

/// Complete descriptor of a form field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The field name (HTML name attribute).
    pub name: String,
    /// The field kind, carrying its constraints.
    pub kind: FieldKind,
    /// Whether this field is required.
    pub required: bool,
    /// Human-readable label.
    pub label: OpaqueValue,
    /// Value shown before the user edits the field.
    pub initial: OpaqueValue,
    /// Help text displayed alongside the field.
    pub help_text: OpaqueValue,
    /// Message overrides, keyed by error code.
    pub error_messages: Mapping,
    /// The widget used for presentation.
    pub widget: Widget,
    /// Whether the field is disabled (shown but not editable).
    pub disabled: bool,
}

impl FieldDef {
    /// Creates a field of the given kind.
    ///
    /// The field is required, uses the default widget for its kind, and is
    /// labelled after its name.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let widget = Widget::new(default_widget_for_kind(&kind)).required(true);
        let label = OpaqueValue::String(name.replace('_', " "));
        Self {
            name,
            kind,
            required: true,
            label,
            initial: OpaqueValue::Null,
            help_text: OpaqueValue::String(String::new()),
            error_messages: Mapping::new(),
            widget,
            disabled: false,
        }
    }

    /// Sets whether this field is required. The widget follows.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self.widget.is_required = required;
        self
    }

    /// Sets the initial value.
    pub fn initial(mut self, value: impl Into<OpaqueValue>) -> Self {
        self.initial = value.into();
        self
    }

    /// Sets the help text.
    pub fn help_text(mut self, text: impl Into<OpaqueValue>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<OpaqueValue>) -> Self {
        self.label = label.into();
        self
    }

    /// Replaces the widget. Its required flag is set from the field.
    pub fn widget(mut self, widget: impl Into<Widget>) -> Self {
        self.widget = widget.into();
        self.widget.is_required = self.required;
        self
    }

    /// Sets a custom error message for a given code.
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<OpaqueValue>) -> Self {
        self.error_messages.insert(code, msg);
        self
    }

    /// Sets whether this field is disabled.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Prepares an initial value for the wire.
    ///
    /// Dates and times are rendered with the field's preferred input format
    /// (falling back to the configured default) so the client can submit
    /// them back unchanged. Callable initials are wrapped so the formatting
    /// happens after they are invoked.
    pub fn wire_initial(&self, value: &OpaqueValue, settings: &Settings) -> OpaqueValue {
        let formats = TemporalFormats::for_field(&self.kind, settings);
        match value {
            OpaqueValue::Invocable(thunk) => {
                let thunk = thunk.clone();
                OpaqueValue::invocable(move || formats.apply(thunk()))
            }
            other => formats.apply(other.clone()),
        }
    }
}

/// The formats used to render temporal initial values for one field.
#[derive(Debug, Clone)]
struct TemporalFormats {
    date: String,
    datetime: String,
    time: String,
}

impl TemporalFormats {
    fn for_field(kind: &FieldKind, settings: &Settings) -> Self {
        let mut formats = Self {
            date: settings.date_input_format.clone(),
            datetime: settings.datetime_input_format.clone(),
            time: settings.time_input_format.clone(),
        };
        match kind {
            FieldKind::Date { input_formats } => {
                if let Some(first) = input_formats.first() {
                    formats.date.clone_from(first);
                }
            }
            FieldKind::Time { input_formats } => {
                if let Some(first) = input_formats.first() {
                    formats.time.clone_from(first);
                }
            }
            FieldKind::DateTime { input_formats } => {
                if let Some(first) = input_formats.first() {
                    formats.datetime.clone_from(first);
                }
            }
            FieldKind::SplitDateTime {
                input_date_formats,
                input_time_formats,
            } => {
                if let Some(first) = input_date_formats.first() {
                    formats.date.clone_from(first);
                }
                if let Some(first) = input_time_formats.first() {
                    formats.time.clone_from(first);
                }
            }
            _ => {}
        }
        formats
    }

    /// A format chrono cannot render for the value leaves the value typed,
    /// so it reaches the wire in its ISO form.
    fn apply(&self, value: OpaqueValue) -> OpaqueValue {
        let rendered = match &value {
            OpaqueValue::Date(d) => render(&d.format(&self.date), &self.date),
            OpaqueValue::DateTime(dt) => render(&dt.format(&self.datetime), &self.datetime),
            OpaqueValue::Time(t) => render(&t.format(&self.time), &self.time),
            _ => None,
        };
        rendered.map_or(value, OpaqueValue::String)
    }
}

fn render(formatted: &impl fmt::Display, format: &str) -> Option<String> {
    let mut out = String::new();
    match write!(out, "{formatted}") {
        Ok(()) => Some(out),
        Err(_) => {
            tracing::warn!(format, "cannot render initial value with input format, using ISO");
            None
        }
    }
}

//! Widget descriptors.
//!
//! A [`Widget`] records how a field is meant to be presented: its
//! [`WidgetKind`] (with kind-specific parameters such as choices or date
//! formats), its HTML attributes, and the required/localized flags. Widgets
//! are never rendered here; they are described for a remote client by
//! [`RemoteWidget`](crate::remote_widget::RemoteWidget).

use std::fmt;
use std::sync::Arc;

use formwire_normalize::{Mapping, OpaqueValue};

/// One selectable option.
#[derive(Debug, Clone)]
pub struct Choice {
    /// The submitted value. May be a model choice wrapper.
    pub value: OpaqueValue,
    /// The human-readable label. May be lazy text.
    pub label: OpaqueValue,
}

impl Choice {
    /// Creates a choice.
    pub fn new(value: impl Into<OpaqueValue>, label: impl Into<OpaqueValue>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    fn to_opaque(&self) -> OpaqueValue {
        let mut entry = Mapping::new();
        entry.insert("value", self.value.clone());
        entry.insert("display", self.label.clone());
        OpaqueValue::Mapping(entry)
    }
}

type ChoiceSource = Arc<dyn Fn() -> Vec<Choice> + Send + Sync>;

/// The options of a choice field or widget.
///
/// Choices backed by a query are only known when the form is described, so
/// they can be supplied as a closure that is evaluated during normalization.
#[derive(Clone)]
pub enum ChoiceList {
    /// Options known up front.
    Fixed(Vec<Choice>),
    /// Options computed when described.
    Deferred(ChoiceSource),
}

impl ChoiceList {
    /// Creates a deferred choice list.
    pub fn deferred(source: impl Fn() -> Vec<Choice> + Send + Sync + 'static) -> Self {
        Self::Deferred(Arc::new(source))
    }

    /// Builds a fixed list from `(value, label)` pairs.
    pub fn from_pairs<V, L>(pairs: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<OpaqueValue>,
        L: Into<OpaqueValue>,
    {
        Self::Fixed(pairs.into_iter().map(|(v, l)| Choice::new(v, l)).collect())
    }

    /// Describes the options as a sequence of `{"value", "display"}` mappings.
    pub fn to_opaque(&self) -> OpaqueValue {
        match self {
            Self::Fixed(choices) => {
                OpaqueValue::Sequence(choices.iter().map(Choice::to_opaque).collect())
            }
            Self::Deferred(source) => {
                let source = Arc::clone(source);
                OpaqueValue::invocable(move || {
                    OpaqueValue::Sequence(source().iter().map(Choice::to_opaque).collect())
                })
            }
        }
    }

    /// Evaluates a deferred source once, giving a fixed list.
    #[must_use]
    pub fn resolved(&self) -> Self {
        match self {
            Self::Fixed(choices) => Self::Fixed(choices.clone()),
            Self::Deferred(source) => Self::Fixed(source()),
        }
    }

    /// Whether both lists are deferred to the same source.
    pub fn shares_source(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Deferred(a), Self::Deferred(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for ChoiceList {
    fn default() -> Self {
        Self::Fixed(Vec::new())
    }
}

impl fmt::Debug for ChoiceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(choices) => f.debug_tuple("Fixed").field(choices).finish(),
            Self::Deferred(_) => write!(f, "Deferred(<fn>)"),
        }
    }
}

/// Enumerates the widget kinds formwire can describe.
#[derive(Debug, Clone)]
pub enum WidgetKind {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="url">`.
    UrlInput,
    /// `<input type="password">`.
    PasswordInput,
    /// `<input type="hidden">`.
    HiddenInput,
    /// One hidden input per selected value.
    MultipleHiddenInput {
        /// Available choices.
        choices: ChoiceList,
    },
    /// `<input type="file">`.
    FileInput,
    /// `<input type="file">` with a clear checkbox.
    ClearableFileInput {
        /// Text shown before the current file.
        initial_text: OpaqueValue,
        /// Text shown before the upload input.
        input_text: OpaqueValue,
        /// Label of the clear checkbox.
        clear_checkbox_label: OpaqueValue,
    },
    /// `<textarea>`.
    Textarea,
    /// A text input for dates.
    DateInput {
        /// Explicit display format; `None` uses the configured default.
        format: Option<String>,
    },
    /// A text input for date-times.
    DateTimeInput {
        /// Explicit display format; `None` uses the configured default.
        format: Option<String>,
    },
    /// A text input for times.
    TimeInput {
        /// Explicit display format; `None` uses the configured default.
        format: Option<String>,
    },
    /// `<input type="checkbox">`.
    CheckboxInput {
        /// Whether a custom check test decides the checked state. Without
        /// one the input accepts null values.
        check_test: bool,
    },
    /// `<select>`.
    Select {
        /// Available choices.
        choices: ChoiceList,
    },
    /// A select offering unknown/yes/no.
    NullBooleanSelect,
    /// `<select multiple>`.
    SelectMultiple {
        /// Available choices.
        choices: ChoiceList,
    },
    /// A set of `<input type="radio">` elements.
    RadioSelect {
        /// Available choices.
        choices: ChoiceList,
    },
    /// A set of `<input type="checkbox">` elements.
    CheckboxSelectMultiple {
        /// Available choices.
        choices: ChoiceList,
    },
    /// Separate date and time inputs.
    SplitDateTime {
        /// Format of the date part.
        date_format: Option<String>,
        /// Format of the time part.
        time_format: Option<String>,
    },
    /// Separate hidden date and time inputs.
    SplitHiddenDateTime {
        /// Format of the date part.
        date_format: Option<String>,
        /// Format of the time part.
        time_format: Option<String>,
    },
}

impl WidgetKind {
    /// The kind's name, used as its title and registry key.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::EmailInput => "EmailInput",
            Self::UrlInput => "URLInput",
            Self::PasswordInput => "PasswordInput",
            Self::HiddenInput => "HiddenInput",
            Self::MultipleHiddenInput { .. } => "MultipleHiddenInput",
            Self::FileInput => "FileInput",
            Self::ClearableFileInput { .. } => "ClearableFileInput",
            Self::Textarea => "Textarea",
            Self::DateInput { .. } => "DateInput",
            Self::DateTimeInput { .. } => "DateTimeInput",
            Self::TimeInput { .. } => "TimeInput",
            Self::CheckboxInput { .. } => "CheckboxInput",
            Self::Select { .. } => "Select",
            Self::NullBooleanSelect => "NullBooleanSelect",
            Self::SelectMultiple { .. } => "SelectMultiple",
            Self::RadioSelect { .. } => "RadioSelect",
            Self::CheckboxSelectMultiple { .. } => "CheckboxSelectMultiple",
            Self::SplitDateTime { .. } => "SplitDateTimeWidget",
            Self::SplitHiddenDateTime { .. } => "SplitHiddenDateTimeWidget",
        }
    }

    /// A `ClearableFileInput` with the usual texts.
    pub fn clearable_file() -> Self {
        Self::ClearableFileInput {
            initial_text: "Currently".into(),
            input_text: "Change".into(),
            clear_checkbox_label: "Clear".into(),
        }
    }

    /// The choices carried by this kind, if any.
    pub const fn choices(&self) -> Option<&ChoiceList> {
        match self {
            Self::MultipleHiddenInput { choices }
            | Self::Select { choices }
            | Self::SelectMultiple { choices }
            | Self::RadioSelect { choices }
            | Self::CheckboxSelectMultiple { choices } => Some(choices),
            _ => None,
        }
    }

    pub(crate) fn choices_mut(&mut self) -> Option<&mut ChoiceList> {
        match self {
            Self::MultipleHiddenInput { choices }
            | Self::Select { choices }
            | Self::SelectMultiple { choices }
            | Self::RadioSelect { choices }
            | Self::CheckboxSelectMultiple { choices } => Some(choices),
            _ => None,
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A widget descriptor.
///
/// # Examples
///
/// ```
/// use formwire_forms::widgets::{Widget, WidgetKind};
///
/// let widget = Widget::new(WidgetKind::PasswordInput).attr("autocomplete", "off");
/// assert_eq!(widget.title(), "PasswordInput");
/// assert_eq!(widget.input_type(), Some("password"));
/// assert!(!widget.is_hidden());
/// ```
#[derive(Debug, Clone)]
pub struct Widget {
    /// The widget kind and its parameters.
    pub kind: WidgetKind,
    /// Extra HTML attributes, in declaration order.
    pub attrs: Mapping,
    /// Whether the owning field is required.
    pub is_required: bool,
    /// Whether values are displayed localized.
    pub is_localized: bool,
}

impl Widget {
    /// Creates a widget of the given kind with no attributes.
    pub const fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            attrs: Mapping::new(),
            is_required: false,
            is_localized: false,
        }
    }

    /// Adds an HTML attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<OpaqueValue>) -> Self {
        self.attrs.insert(name, value);
        self
    }

    /// Sets the required flag.
    pub fn required(mut self, required: bool) -> Self {
        self.is_required = required;
        self
    }

    /// Sets the localized flag.
    pub fn localized(mut self, localized: bool) -> Self {
        self.is_localized = localized;
        self
    }

    /// The widget's title (its kind name).
    pub const fn title(&self) -> &'static str {
        self.kind.name()
    }

    /// Whether the widget renders as hidden input(s).
    pub const fn is_hidden(&self) -> bool {
        matches!(
            self.kind,
            WidgetKind::HiddenInput
                | WidgetKind::MultipleHiddenInput { .. }
                | WidgetKind::SplitHiddenDateTime { .. }
        )
    }

    /// Whether a form containing this widget must be submitted as multipart.
    pub const fn needs_multipart_form(&self) -> bool {
        matches!(
            self.kind,
            WidgetKind::FileInput | WidgetKind::ClearableFileInput { .. }
        )
    }

    /// The HTML input type, for `<input>`-based widgets.
    pub const fn input_type(&self) -> Option<&'static str> {
        match self.kind {
            WidgetKind::TextInput
            | WidgetKind::DateInput { .. }
            | WidgetKind::DateTimeInput { .. }
            | WidgetKind::TimeInput { .. } => Some("text"),
            WidgetKind::NumberInput => Some("number"),
            WidgetKind::EmailInput => Some("email"),
            WidgetKind::UrlInput => Some("url"),
            WidgetKind::PasswordInput => Some("password"),
            WidgetKind::HiddenInput | WidgetKind::MultipleHiddenInput { .. } => Some("hidden"),
            WidgetKind::FileInput | WidgetKind::ClearableFileInput { .. } => Some("file"),
            _ => None,
        }
    }

    /// The component widgets of a split widget; empty for everything else.
    pub fn subwidgets(&self) -> Vec<Self> {
        match &self.kind {
            WidgetKind::SplitDateTime {
                date_format,
                time_format,
            } => vec![
                self.component(WidgetKind::DateInput {
                    format: date_format.clone(),
                }),
                self.component(WidgetKind::TimeInput {
                    format: time_format.clone(),
                }),
            ],
            WidgetKind::SplitHiddenDateTime { .. } => vec![
                self.component(WidgetKind::HiddenInput),
                self.component(WidgetKind::HiddenInput),
            ],
            _ => Vec::new(),
        }
    }

    fn component(&self, kind: WidgetKind) -> Self {
        Self {
            kind,
            attrs: self.attrs.clone(),
            is_required: self.is_required,
            is_localized: self.is_localized,
        }
    }
}

impl From<WidgetKind> for Widget {
    fn from(kind: WidgetKind) -> Self {
        Self::new(kind)
    }
}

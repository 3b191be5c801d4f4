//! Kind name to describer lookup.
//!
//! Every field and widget description starts with a fixed set of base keys.
//! The keys that depend on the kind are added by a handler looked up here by
//! [`FieldKind::name`](crate::fields::FieldKind::name) or
//! [`WidgetKind::name`](crate::widgets::WidgetKind::name). Applications can
//! replace the handler for any kind, or register one for a kind the builtin
//! table leaves out.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use formwire_core::Settings;
use formwire_normalize::{DiagnosticSink, Mapping};

use crate::fields::FieldDef;
use crate::widgets::Widget;

/// Everything a handler may consult while describing one form.
#[derive(Clone, Copy)]
pub struct DescribeContext<'a> {
    /// The registry in use, for describing nested widgets.
    pub registry: &'a Registry,
    /// Formatting defaults.
    pub settings: &'a Settings,
    /// Receives soft diagnostics.
    pub sink: &'a dyn DiagnosticSink,
    /// Location of the description being built, for diagnostics.
    pub path: &'a str,
}

impl<'a> DescribeContext<'a> {
    /// Creates a context rooted at `$`.
    pub const fn new(
        registry: &'a Registry,
        settings: &'a Settings,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            registry,
            settings,
            sink,
            path: "$",
        }
    }

    /// The same context, located at `path`.
    #[must_use]
    pub const fn at<'b>(&self, path: &'b str) -> DescribeContext<'b>
    where
        'a: 'b,
    {
        DescribeContext {
            registry: self.registry,
            settings: self.settings,
            sink: self.sink,
            path,
        }
    }
}

impl fmt::Debug for DescribeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescribeContext")
            .field("registry", self.registry)
            .field("settings", self.settings)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Adds the kind-specific keys of a field description.
pub type FieldHandler = fn(&FieldDef, &DescribeContext<'_>, &mut Mapping);

/// Adds the kind-specific keys of a widget description.
pub type WidgetHandler = fn(&Widget, &DescribeContext<'_>, &mut Mapping);

static BUILTIN: Lazy<Registry> = Lazy::new(Registry::builtin);

/// Maps kind names to describe handlers.
///
/// # Examples
///
/// ```
/// use formwire_forms::registry::Registry;
///
/// let registry = Registry::builtin();
/// assert!(registry.field_handler("CharField").is_some());
/// assert!(registry.widget_handler("Select").is_some());
/// assert!(registry.field_handler("ColorField").is_none());
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    fields: HashMap<&'static str, FieldHandler>,
    widgets: HashMap<&'static str, WidgetHandler>,
}

impl Registry {
    /// Creates a registry without any handlers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with a handler for every builtin kind.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        crate::remote_field::register_builtin(&mut registry);
        crate::remote_widget::register_builtin(&mut registry);
        registry
    }

    /// The shared builtin registry.
    pub fn global() -> &'static Self {
        &BUILTIN
    }

    /// Registers (or replaces) the field handler for `kind`.
    pub fn register_field(&mut self, kind: &'static str, handler: FieldHandler) -> &mut Self {
        self.fields.insert(kind, handler);
        self
    }

    /// Registers (or replaces) the widget handler for `kind`.
    pub fn register_widget(&mut self, kind: &'static str, handler: WidgetHandler) -> &mut Self {
        self.widgets.insert(kind, handler);
        self
    }

    /// Looks up the field handler for `kind`.
    pub fn field_handler(&self, kind: &str) -> Option<FieldHandler> {
        self.fields.get(kind).copied()
    }

    /// Looks up the widget handler for `kind`.
    pub fn widget_handler(&self, kind: &str) -> Option<WidgetHandler> {
        self.widgets.get(kind).copied()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.fields.keys().collect();
        fields.sort();
        let mut widgets: Vec<_> = self.widgets.keys().collect();
        widgets.sort();
        f.debug_struct("Registry")
            .field("fields", &fields)
            .field("widgets", &widgets)
            .finish()
    }
}

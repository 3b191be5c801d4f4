//! # formwire-forms
//!
//! Describes server-side forms for remote clients. A [`FormDef`] lists
//! [`FieldDef`]s, each with a [`FieldKind`] and a [`Widget`]; [`RemoteForm`]
//! turns the whole thing into a normalized JSON object that a client-side
//! form library can rebuild the form from.
//!
//! Kind-specific keys come from handlers in a [`Registry`], so applications
//! can describe their own field and widget kinds.

pub mod fields;
pub mod form;
pub mod registry;
pub mod remote_field;
pub mod remote_form;
pub mod remote_widget;
pub mod widgets;

pub use fields::{FieldDef, FieldKind};
pub use form::FormDef;
pub use registry::{DescribeContext, FieldHandler, Registry, WidgetHandler};
pub use remote_field::RemoteField;
pub use remote_form::{Fieldset, RemoteForm};
pub use remote_widget::RemoteWidget;
pub use widgets::{Choice, ChoiceList, Widget, WidgetKind};

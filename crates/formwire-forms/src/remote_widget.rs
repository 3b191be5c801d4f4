//! Widget descriptions.
//!
//! [`RemoteWidget::as_mapping`] produces the base keys shared by every widget
//! and then runs the kind's handler from the [`Registry`]. The result is an
//! unnormalized [`Mapping`]; attributes and choices may still hold lazy text,
//! thunks, or entities.

use formwire_normalize::{Diagnostic, DiagnosticKind, Mapping, OpaqueValue};

use crate::registry::{DescribeContext, Registry};
use crate::widgets::{ChoiceList, Widget, WidgetKind};

/// Describes one widget for a remote client.
#[derive(Debug, Clone, Copy)]
pub struct RemoteWidget<'a> {
    widget: &'a Widget,
    ctx: DescribeContext<'a>,
}

impl<'a> RemoteWidget<'a> {
    /// Wraps `widget` for description within `ctx`.
    pub const fn new(widget: &'a Widget, ctx: DescribeContext<'a>) -> Self {
        Self { widget, ctx }
    }

    /// Builds the widget description.
    pub fn as_mapping(&self) -> Mapping {
        let widget = self.widget;
        let mut out = Mapping::new();
        out.insert("title", widget.title());
        out.insert("is_hidden", widget.is_hidden());
        out.insert("needs_multipart_form", widget.needs_multipart_form());
        out.insert("is_localized", widget.is_localized);
        out.insert("is_required", widget.is_required);
        out.insert("attrs", widget.attrs.clone());

        match self.ctx.registry.widget_handler(widget.title()) {
            Some(handler) => handler(widget, &self.ctx, &mut out),
            None => {
                tracing::debug!(
                    kind = widget.title(),
                    path = self.ctx.path,
                    "no widget handler registered"
                );
                self.ctx.sink.report(Diagnostic::new(
                    self.ctx.path,
                    DiagnosticKind::UnregisteredKind,
                    format!("no handler for widget kind {}", widget.title()),
                ));
            }
        }
        out
    }
}

pub(crate) fn register_builtin(registry: &mut Registry) {
    for kind in [
        "TextInput",
        "NumberInput",
        "EmailInput",
        "URLInput",
        "PasswordInput",
        "HiddenInput",
        "FileInput",
    ] {
        registry.register_widget(kind, describe_input);
    }
    registry
        .register_widget("MultipleHiddenInput", describe_multiple_hidden)
        .register_widget("ClearableFileInput", describe_clearable_file)
        .register_widget("Textarea", describe_textarea)
        .register_widget("DateInput", describe_temporal_input)
        .register_widget("DateTimeInput", describe_temporal_input)
        .register_widget("TimeInput", describe_temporal_input)
        .register_widget("CheckboxInput", describe_checkbox)
        .register_widget("Select", describe_choices)
        .register_widget("SelectMultiple", describe_choices)
        .register_widget("RadioSelect", describe_choices)
        .register_widget("CheckboxSelectMultiple", describe_choices)
        .register_widget("NullBooleanSelect", describe_null_boolean_select)
        .register_widget("SplitDateTimeWidget", describe_split)
        .register_widget("SplitHiddenDateTimeWidget", describe_split);
}

fn describe_input(widget: &Widget, _: &DescribeContext<'_>, out: &mut Mapping) {
    out.insert("input_type", widget.input_type());
}

fn describe_textarea(_: &Widget, _: &DescribeContext<'_>, _: &mut Mapping) {}

fn describe_multiple_hidden(widget: &Widget, ctx: &DescribeContext<'_>, out: &mut Mapping) {
    describe_input(widget, ctx, out);
    describe_choices(widget, ctx, out);
}

fn describe_clearable_file(widget: &Widget, ctx: &DescribeContext<'_>, out: &mut Mapping) {
    describe_input(widget, ctx, out);
    if let WidgetKind::ClearableFileInput {
        initial_text,
        input_text,
        clear_checkbox_label,
    } = &widget.kind
    {
        out.insert("initial_text", initial_text.clone());
        out.insert("input_text", input_text.clone());
        out.insert("clear_checkbox_label", clear_checkbox_label.clone());
    }
}

fn describe_temporal_input(widget: &Widget, ctx: &DescribeContext<'_>, out: &mut Mapping) {
    describe_input(widget, ctx, out);
    let settings = ctx.settings;
    let (format, default) = match &widget.kind {
        WidgetKind::DateInput { format } => (format, &settings.date_input_format),
        WidgetKind::DateTimeInput { format } => (format, &settings.datetime_input_format),
        WidgetKind::TimeInput { format } => (format, &settings.time_input_format),
        _ => return,
    };
    out.insert("format", format.as_ref().unwrap_or(default).as_str());
    out.insert("manual_format", format.is_some());
}

fn describe_checkbox(widget: &Widget, _: &DescribeContext<'_>, out: &mut Mapping) {
    let check_test = matches!(widget.kind, WidgetKind::CheckboxInput { check_test: true });
    out.insert("check_test", check_test.then_some(true));
}

fn describe_choices(widget: &Widget, _: &DescribeContext<'_>, out: &mut Mapping) {
    if let Some(choices) = widget.kind.choices() {
        out.insert("choices", choices.to_opaque());
    }
}

fn describe_null_boolean_select(_: &Widget, _: &DescribeContext<'_>, out: &mut Mapping) {
    let choices =
        ChoiceList::from_pairs([("unknown", "Unknown"), ("true", "Yes"), ("false", "No")]);
    out.insert("choices", choices.to_opaque());
}

fn describe_split(widget: &Widget, ctx: &DescribeContext<'_>, out: &mut Mapping) {
    let parts: Vec<OpaqueValue> = widget
        .subwidgets()
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let path = format!("{}.widgets[{i}]", ctx.path);
            OpaqueValue::Mapping(RemoteWidget::new(part, ctx.at(&path)).as_mapping())
        })
        .collect();
    out.insert("widgets", parts);

    let (date_format, time_format) = match &widget.kind {
        WidgetKind::SplitDateTime {
            date_format,
            time_format,
        }
        | WidgetKind::SplitHiddenDateTime {
            date_format,
            time_format,
        } => (date_format, time_format),
        _ => return,
    };
    let settings = ctx.settings;
    out.insert(
        "date_format",
        date_format
            .as_ref()
            .unwrap_or(&settings.date_input_format)
            .as_str(),
    );
    out.insert(
        "time_format",
        time_format
            .as_ref()
            .unwrap_or(&settings.time_input_format)
            .as_str(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwire_core::Settings;
    use formwire_normalize::{normalize, CollectingSink};
    use serde_json::{json, Value};

    fn describe(widget: &Widget) -> Value {
        let settings = Settings::default();
        let sink = CollectingSink::new();
        let ctx = DescribeContext::new(Registry::global(), &settings, &sink);
        let mapping = RemoteWidget::new(widget, ctx).as_mapping();
        normalize(&mapping.into(), &sink).unwrap()
    }

    #[test]
    fn test_base_keys_in_order() {
        let widget = Widget::new(WidgetKind::TextInput)
            .attr("placeholder", "Your name")
            .required(true);
        let out = describe(&widget);
        let keys: Vec<&str> = out.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "title",
                "is_hidden",
                "needs_multipart_form",
                "is_localized",
                "is_required",
                "attrs",
                "input_type",
            ]
        );
        assert_eq!(out["attrs"], json!({"placeholder": "Your name"}));
        assert_eq!(out["is_required"], json!(true));
        assert_eq!(out["input_type"], json!("text"));
    }

    #[test]
    fn test_textarea_has_no_input_type() {
        let out = describe(&Widget::new(WidgetKind::Textarea));
        assert_eq!(out["title"], json!("Textarea"));
        assert!(out.get("input_type").is_none());
    }

    #[test]
    fn test_date_input_format_defaults() {
        let out = describe(&Widget::new(WidgetKind::DateInput { format: None }));
        assert_eq!(out["format"], json!("%Y-%m-%d"));
        assert_eq!(out["manual_format"], json!(false));

        let out = describe(&Widget::new(WidgetKind::TimeInput {
            format: Some("%H:%M".into()),
        }));
        assert_eq!(out["format"], json!("%H:%M"));
        assert_eq!(out["manual_format"], json!(true));
    }

    #[test]
    fn test_checkbox_check_test() {
        let out = describe(&Widget::new(WidgetKind::CheckboxInput { check_test: false }));
        assert_eq!(out["check_test"], Value::Null);
        let out = describe(&Widget::new(WidgetKind::CheckboxInput { check_test: true }));
        assert_eq!(out["check_test"], json!(true));
    }

    #[test]
    fn test_select_choices() {
        let widget = Widget::new(WidgetKind::Select {
            choices: ChoiceList::from_pairs([("s", "Small"), ("l", "Large")]),
        });
        let out = describe(&widget);
        assert_eq!(
            out["choices"],
            json!([{"value": "s", "display": "Small"}, {"value": "l", "display": "Large"}])
        );
    }

    #[test]
    fn test_deferred_choices_are_evaluated() {
        let widget = Widget::new(WidgetKind::RadioSelect {
            choices: ChoiceList::deferred(|| {
                vec![crate::widgets::Choice::new(
                    1,
                    OpaqueValue::lazy_text(|| Ok("One".into())),
                )]
            }),
        });
        let out = describe(&widget);
        assert_eq!(out["choices"], json!([{"value": 1, "display": "One"}]));
    }

    #[test]
    fn test_null_boolean_select() {
        let out = describe(&Widget::new(WidgetKind::NullBooleanSelect));
        assert_eq!(out["choices"][1], json!({"value": "true", "display": "Yes"}));
        assert_eq!(out["choices"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_clearable_file_texts() {
        let out = describe(&Widget::new(WidgetKind::clearable_file()));
        assert_eq!(out["needs_multipart_form"], json!(true));
        assert_eq!(out["input_type"], json!("file"));
        assert_eq!(out["initial_text"], json!("Currently"));
        assert_eq!(out["clear_checkbox_label"], json!("Clear"));
    }

    #[test]
    fn test_split_widget_describes_parts() {
        let widget = Widget::new(WidgetKind::SplitDateTime {
            date_format: Some("%d/%m/%Y".into()),
            time_format: None,
        });
        let out = describe(&widget);
        assert_eq!(out["title"], json!("SplitDateTimeWidget"));
        assert_eq!(out["widgets"][0]["title"], json!("DateInput"));
        assert_eq!(out["widgets"][0]["format"], json!("%d/%m/%Y"));
        assert_eq!(out["widgets"][1]["manual_format"], json!(false));
        assert_eq!(out["date_format"], json!("%d/%m/%Y"));
        assert_eq!(out["time_format"], json!("%H:%M:%S"));
    }

    #[test]
    fn test_unregistered_widget_reports() {
        let settings = Settings::default();
        let sink = CollectingSink::new();
        let registry = Registry::empty();
        let path = "$.fields.bio.widget".to_string();
        let ctx = DescribeContext::new(&registry, &settings, &sink).at(&path);
        let widget = Widget::new(WidgetKind::Textarea);
        let mapping = RemoteWidget::new(&widget, ctx).as_mapping();
        assert_eq!(mapping.len(), 6);
        let reports = sink.diagnostics();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, DiagnosticKind::UnregisteredKind);
        assert_eq!(reports[0].path, "$.fields.bio.widget");
    }
}

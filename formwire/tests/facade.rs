//! Checks that the facade exposes a working stack.

use formwire::prelude::*;
use serde_json::json;

#[test]
fn test_settings_drive_the_normalizer() {
    let settings = formwire::core::settings_loader::from_toml_str("max_depth = 1").unwrap();
    let sink = CollectingSink::new();
    let normalizer = Normalizer::from_settings(&settings, &sink);

    let shallow: OpaqueValue = vec![1, 2].into();
    assert_eq!(normalizer.normalize(&shallow).unwrap(), json!([1, 2]));

    let deep: OpaqueValue = vec![vec![1]].into();
    assert!(matches!(
        normalizer.normalize(&deep),
        Err(NormalizationError::DepthExceeded { limit: 1 })
    ));
}

#[test]
fn test_form_through_the_prelude() {
    setup_logging(&Settings::default());
    let form = FormDef::new(
        "Feedback",
        vec![FieldDef::new("comment", FieldKind::char())
            .widget(WidgetKind::Textarea)
            .help_text(OpaqueValue::lazy_text(|| Ok("Be kind.".into())))],
    );
    let out = RemoteForm::new(&form).as_dict().unwrap();
    assert_eq!(out["fields"]["comment"]["help_text"], json!("Be kind."));
    assert_eq!(out["fields"]["comment"]["widget"]["title"], json!("Textarea"));
}

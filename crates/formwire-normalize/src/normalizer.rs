//! The value normalizer.
//!
//! [`Normalizer::normalize`] walks an [`OpaqueValue`] depth first and builds
//! a [`serde_json::Value`] with the same shape:
//!
//! 1. Mappings keep their keys and key order; each value is normalized. A
//!    [`ChoiceValue`](OpaqueValue::ChoiceValue) stored directly under a key
//!    is replaced by its `value`.
//! 2. Sequences keep their length and order.
//! 3. Deferred values are forced to a string. If forcing fails they are
//!    iterated as sequences; if that fails too, normalization fails with
//!    [`NormalizationError::Unresolvable`].
//! 4. Invocables are called once and their result is normalized.
//! 5. Entities become their identity value. An unreadable identity is
//!    reported to the [`DiagnosticSink`] and the value is omitted: the key is
//!    dropped from its mapping, a sequence slot becomes `null`.
//! 6. Scalars are copied. Dates and times become ISO-8601 strings, UUIDs
//!    their hyphenated form.

use std::fmt::Write as _;

use formwire_core::{NormalizationError, Settings};
use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::value::{Deferred, Entity, Mapping, OpaqueValue};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Normalizes a value with default settings.
///
/// # Examples
///
/// ```
/// use formwire_normalize::{normalize, OpaqueValue, TracingSink};
///
/// let thunk = OpaqueValue::invocable(|| OpaqueValue::from("hello"));
/// assert_eq!(normalize(&thunk, &TracingSink).unwrap(), "hello");
/// ```
pub fn normalize(
    value: &OpaqueValue,
    sink: &dyn DiagnosticSink,
) -> Result<Value, NormalizationError> {
    Normalizer::new(sink).normalize(value)
}

/// Reduces [`OpaqueValue`]s to JSON-ready data.
///
/// A `Normalizer` holds no mutable state of its own; the same instance can
/// normalize any number of values.
#[derive(Clone, Copy)]
pub struct Normalizer<'a> {
    sink: &'a dyn DiagnosticSink,
    max_depth: usize,
}

impl<'a> Normalizer<'a> {
    /// Creates a normalizer reporting to `sink`, with the default depth limit.
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            sink,
            max_depth: formwire_core::settings::DEFAULT_MAX_DEPTH,
        }
    }

    /// Creates a normalizer using the depth limit from `settings`.
    pub fn from_settings(settings: &Settings, sink: &'a dyn DiagnosticSink) -> Self {
        Self::new(sink).with_max_depth(settings.max_depth)
    }

    /// Sets how many levels below the root a value may nest.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the configured depth limit.
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the sink soft diagnostics are reported to.
    pub fn sink(&self) -> &'a dyn DiagnosticSink {
        self.sink
    }

    /// Normalizes `value`.
    ///
    /// A root value that ends up omitted (an entity with an unreadable
    /// identity) normalizes to `null`.
    pub fn normalize(&self, value: &OpaqueValue) -> Result<Value, NormalizationError> {
        let mut walk = Walk {
            normalizer: *self,
            path: Vec::new(),
        };
        Ok(walk.node(value, 0)?.unwrap_or(Value::Null))
    }
}

impl std::fmt::Debug for Normalizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

enum Segment {
    Key(String),
    Index(usize),
}

/// One traversal. Tracks the current path for diagnostics.
struct Walk<'a> {
    normalizer: Normalizer<'a>,
    path: Vec<Segment>,
}

impl Walk<'_> {
    /// Returns `None` when the value is to be omitted from its parent.
    fn node(
        &mut self,
        value: &OpaqueValue,
        depth: usize,
    ) -> Result<Option<Value>, NormalizationError> {
        if depth > self.normalizer.max_depth {
            tracing::debug!(
                path = %self.render_path(),
                kind = value.kind_name(),
                limit = self.normalizer.max_depth,
                "nesting limit exceeded"
            );
            return Err(NormalizationError::DepthExceeded {
                limit: self.normalizer.max_depth,
            });
        }

        let normalized = match value {
            OpaqueValue::Mapping(map) => Value::Object(self.mapping(map, depth)?),
            OpaqueValue::Sequence(items) => Value::Array(self.sequence(items, depth)?),
            OpaqueValue::Deferred(deferred) => self.deferred(deferred.as_ref(), depth)?,
            OpaqueValue::Invocable(thunk) => {
                let produced = thunk();
                return self.node(&produced, depth + 1);
            }
            OpaqueValue::Entity(entity) => return self.entity(entity.as_ref(), depth),
            OpaqueValue::ChoiceValue(choice) => {
                return self.entity(choice.instance.as_ref(), depth)
            }
            OpaqueValue::Null => Value::Null,
            OpaqueValue::Bool(b) => Value::Bool(*b),
            OpaqueValue::Number(n) => Value::Number(n.clone()),
            OpaqueValue::String(s) => Value::String(s.clone()),
            OpaqueValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            OpaqueValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
            OpaqueValue::Time(t) => Value::String(t.format(TIME_FORMAT).to_string()),
            OpaqueValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
        };
        Ok(Some(normalized))
    }

    fn mapping(
        &mut self,
        map: &Mapping,
        depth: usize,
    ) -> Result<Map<String, Value>, NormalizationError> {
        let mut out = Map::new();
        for (key, value) in map.iter() {
            self.path.push(Segment::Key(key.to_string()));
            let result = self.node_under_key(value, depth + 1);
            self.path.pop();
            if let Some(normalized) = result? {
                out.insert(key.to_string(), normalized);
            }
        }
        Ok(out)
    }

    /// Model choice wrappers under a key stand for their submitted value,
    /// including wrappers a thunk produces.
    fn node_under_key(
        &mut self,
        value: &OpaqueValue,
        depth: usize,
    ) -> Result<Option<Value>, NormalizationError> {
        match value {
            OpaqueValue::Invocable(thunk) => {
                if depth > self.normalizer.max_depth {
                    return Err(NormalizationError::DepthExceeded {
                        limit: self.normalizer.max_depth,
                    });
                }
                let produced = thunk();
                self.node_under_key(&produced, depth + 1)
            }
            OpaqueValue::ChoiceValue(choice) => self.node(&choice.value, depth),
            other => self.node(other, depth),
        }
    }

    fn sequence(
        &mut self,
        items: &[OpaqueValue],
        depth: usize,
    ) -> Result<Vec<Value>, NormalizationError> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            self.path.push(Segment::Index(index));
            let result = self.node(item, depth + 1);
            self.path.pop();
            out.push(result?.unwrap_or(Value::Null));
        }
        Ok(out)
    }

    fn deferred(
        &mut self,
        deferred: &dyn Deferred,
        depth: usize,
    ) -> Result<Value, NormalizationError> {
        let force_err = match deferred.force() {
            Ok(text) => return Ok(Value::String(text)),
            Err(err) => err,
        };

        match deferred.iterate() {
            Ok(items) => {
                tracing::trace!(
                    path = %self.render_path(),
                    "deferred value has no string form, normalizing as a sequence"
                );
                Ok(Value::Array(self.sequence(&items, depth)?))
            }
            Err(iter_err) => Err(NormalizationError::unresolvable(format!(
                "{} at {} (force: {force_err}; iterate: {iter_err})",
                deferred.describe(),
                self.render_path(),
            ))),
        }
    }

    fn entity(
        &mut self,
        entity: &dyn Entity,
        depth: usize,
    ) -> Result<Option<Value>, NormalizationError> {
        match entity.identity() {
            Ok(identity) => self.node(&identity, depth + 1),
            Err(err) => {
                self.normalizer.sink.report(Diagnostic::new(
                    self.render_path(),
                    DiagnosticKind::EntityIdentity,
                    format!("cannot read identity of {}: {err}", entity.model_name()),
                ));
                Ok(None)
            }
        }
    }

    /// Renders the current path, e.g. `$.fields.owner.choices[2]`.
    fn render_path(&self) -> String {
        let mut rendered = String::from("$");
        for segment in &self.path {
            match segment {
                Segment::Key(key) => {
                    let _ = write!(rendered, ".{key}");
                }
                Segment::Index(index) => {
                    let _ = write!(rendered, "[{index}]");
                }
            }
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::value::{ChoiceIteratorValue, DeferredError, EntityError, LazySequence};
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct User {
        id: Option<i64>,
    }

    impl Entity for User {
        fn model_name(&self) -> &str {
            "auth.user"
        }

        fn identity(&self) -> Result<OpaqueValue, EntityError> {
            self.id
                .map(OpaqueValue::from)
                .ok_or_else(|| EntityError::new("row was deleted"))
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Deferred for Broken {
        fn force(&self) -> Result<String, DeferredError> {
            Err(DeferredError::new("no translation catalog"))
        }
    }

    fn run(value: &OpaqueValue) -> Result<Value, NormalizationError> {
        normalize(value, &CollectingSink::new())
    }

    #[test]
    fn test_scalars_unchanged() {
        assert_eq!(run(&OpaqueValue::Null).unwrap(), Value::Null);
        assert_eq!(run(&true.into()).unwrap(), json!(true));
        assert_eq!(run(&42.into()).unwrap(), json!(42));
        assert_eq!(run(&2.5.into()).unwrap(), json!(2.5));
        assert_eq!(run(&"text".into()).unwrap(), json!("text"));
    }

    #[test]
    fn test_typed_scalars_become_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(run(&date.into()).unwrap(), json!("2024-02-29"));
        assert_eq!(run(&time.into()).unwrap(), json!("09:05:00"));
        assert_eq!(
            run(&date.and_time(time).into()).unwrap(),
            json!("2024-02-29T09:05:00")
        );
        let id = uuid::Uuid::nil();
        assert_eq!(
            run(&id.into()).unwrap(),
            json!("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn test_mixed_example() {
        let mut map = Mapping::new();
        map.insert("a", 1);
        map.insert(
            "b",
            vec![
                OpaqueValue::from(1),
                OpaqueValue::from(2),
                OpaqueValue::invocable(|| "x".into()),
            ],
        );
        let out = run(&map.into()).unwrap();
        assert_eq!(out, json!({"a": 1, "b": [1, 2, "x"]}));
    }

    #[test]
    fn test_mapping_preserves_key_order() {
        let map: Mapping = [("zeta", 1), ("alpha", 2), ("mid", 3)].into_iter().collect();
        let out = run(&map.into()).unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_invocable_called_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let thunk = OpaqueValue::invocable(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![1, 2].into()
        });
        assert_eq!(run(&thunk).unwrap(), json!([1, 2]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deferred_forced_to_string() {
        let lazy = OpaqueValue::lazy_text(|| Ok("hello".to_string()));
        assert_eq!(run(&lazy).unwrap(), json!("hello"));
    }

    #[test]
    fn test_deferred_falls_back_to_sequence() {
        let lazy = OpaqueValue::deferred(LazySequence::new(|| {
            Ok(vec![OpaqueValue::from("a"), OpaqueValue::lazy_text(|| Ok("b".into()))])
        }));
        assert_eq!(run(&lazy).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_deferred_double_failure_is_error() {
        let mut map = Mapping::new();
        map.insert("label", OpaqueValue::deferred(Broken));
        let err = run(&map.into()).unwrap_err();
        match err {
            NormalizationError::Unresolvable { description } => {
                assert!(description.contains("Broken"));
                assert!(description.contains("$.label"));
                assert!(description.contains("no translation catalog"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_entity_identity() {
        let user = OpaqueValue::entity(User { id: Some(42) });
        assert_eq!(run(&user).unwrap(), json!(42));
    }

    #[test]
    fn test_entity_failure_omits_key_and_reports() {
        let sink = CollectingSink::new();
        let mut map = Mapping::new();
        map.insert("owner", OpaqueValue::entity(User { id: None }));
        map.insert("name", "kept");
        let out = normalize(&map.into(), &sink).unwrap();
        assert_eq!(out, json!({"name": "kept"}));

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "$.owner");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::EntityIdentity);
        assert!(diagnostics[0].message.contains("auth.user"));
    }

    #[test]
    fn test_entity_failure_in_sequence_is_null() {
        let sink = CollectingSink::new();
        let seq = OpaqueValue::Sequence(vec![
            OpaqueValue::entity(User { id: Some(1) }),
            OpaqueValue::entity(User { id: None }),
        ]);
        assert_eq!(normalize(&seq, &sink).unwrap(), json!([1, null]));
        assert_eq!(sink.diagnostics()[0].path, "$[1]");
    }

    #[test]
    fn test_entity_failure_at_root_is_null() {
        let sink = CollectingSink::new();
        let out = normalize(&OpaqueValue::entity(User { id: None }), &sink).unwrap();
        assert_eq!(out, Value::Null);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_choice_value_under_key_uses_value() {
        let instance: Arc<dyn Entity> = Arc::new(User { id: Some(7) });
        let mut choice = Mapping::new();
        choice.insert("value", ChoiceIteratorValue::new("seven", instance.clone()));
        choice.insert("display", "Seven");
        assert_eq!(
            run(&choice.into()).unwrap(),
            json!({"value": "seven", "display": "Seven"})
        );

        let in_sequence = OpaqueValue::Sequence(vec![ChoiceIteratorValue::new("seven", instance).into()]);
        assert_eq!(run(&in_sequence).unwrap(), json!([7]));
    }

    #[test]
    fn test_thunk_producing_choice_value_under_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut map = Mapping::new();
        map.insert(
            "value",
            OpaqueValue::invocable(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let instance: Arc<dyn Entity> = Arc::new(User { id: Some(99) });
                ChoiceIteratorValue::new("seven", instance).into()
            }),
        );
        assert_eq!(run(&map.into()).unwrap(), json!({"value": "seven"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_producing_thunk_under_key_hits_depth_limit() {
        fn forever() -> OpaqueValue {
            OpaqueValue::invocable(forever)
        }
        let mut map = Mapping::new();
        map.insert("loop", forever());
        let sink = CollectingSink::new();
        let err = Normalizer::new(&sink)
            .with_max_depth(8)
            .normalize(&map.into())
            .unwrap_err();
        assert_eq!(err, NormalizationError::DepthExceeded { limit: 8 });
    }

    #[test]
    fn test_depth_limit() {
        let nested: OpaqueValue = vec![vec![vec![1]]].into();
        let sink = CollectingSink::new();
        let shallow = Normalizer::new(&sink).with_max_depth(2);
        assert_eq!(
            shallow.normalize(&nested).unwrap_err(),
            NormalizationError::DepthExceeded { limit: 2 }
        );
        let enough = Normalizer::new(&sink).with_max_depth(3);
        assert_eq!(enough.normalize(&nested).unwrap(), json!([[[1]]]));
    }

    #[test]
    fn test_self_producing_thunk_hits_depth_limit() {
        fn forever() -> OpaqueValue {
            OpaqueValue::invocable(forever)
        }
        let sink = CollectingSink::new();
        let err = Normalizer::new(&sink)
            .with_max_depth(16)
            .normalize(&forever())
            .unwrap_err();
        assert_eq!(err, NormalizationError::DepthExceeded { limit: 16 });
    }

    #[test]
    fn test_from_settings_uses_max_depth() {
        let settings = Settings {
            max_depth: 5,
            ..Settings::default()
        };
        let sink = CollectingSink::new();
        assert_eq!(Normalizer::from_settings(&settings, &sink).max_depth(), 5);
    }
}

//! The input side of normalization.
//!
//! [`OpaqueValue`] is a closed tagged union over every shape the normalizer
//! understands. Host code builds it from whatever its form objects hold:
//! plain scalars, dates, ordered [`Mapping`]s, sequences, lazily computed text
//! ([`Deferred`]), zero-argument thunks, and references to foreign domain
//! objects ([`Entity`]).

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Number;
use thiserror::Error;
use uuid::Uuid;

/// A deferred value could not produce the requested form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DeferredError(pub String);

impl DeferredError {
    /// Creates a new `DeferredError` with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An entity's identity field could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EntityError(pub String);

impl EntityError {
    /// Creates a new `EntityError` with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A value whose string form is computed on demand and may fail.
///
/// Some deferred values are really deferred sequences; those fail to force
/// and succeed at [`iterate`](Deferred::iterate) instead.
pub trait Deferred: Send + Sync + fmt::Debug {
    /// Computes the string form.
    fn force(&self) -> Result<String, DeferredError>;

    /// Computes the elements, for deferred values that are sequences.
    fn iterate(&self) -> Result<Vec<OpaqueValue>, DeferredError> {
        Err(DeferredError::new("value is not iterable"))
    }

    /// Describes the value for error messages.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// A reference to an object from an external domain model.
pub trait Entity: Send + Sync + fmt::Debug {
    /// The model the entity belongs to (e.g. "auth.user").
    fn model_name(&self) -> &str;

    /// Reads the identity field, typically an integer or string primary key.
    fn identity(&self) -> Result<OpaqueValue, EntityError>;
}

/// A zero-argument computation. Must be side-effect free and idempotent.
pub type Thunk = Arc<dyn Fn() -> OpaqueValue + Send + Sync>;

/// A choice value paired with the entity it was produced from.
///
/// Model-backed choice iterators hand out these wrappers instead of the raw
/// key. Under a mapping key the wrapper is replaced by its `value`; anywhere
/// else it stands for its `instance`.
#[derive(Debug, Clone)]
pub struct ChoiceIteratorValue {
    /// The value submitted for this choice.
    pub value: Box<OpaqueValue>,
    /// The entity the choice was built from.
    pub instance: Arc<dyn Entity>,
}

impl ChoiceIteratorValue {
    /// Creates a wrapper for `instance` with the given submitted value.
    pub fn new(value: impl Into<OpaqueValue>, instance: Arc<dyn Entity>) -> Self {
        Self {
            value: Box::new(value.into()),
            instance,
        }
    }
}

/// Any value the normalizer accepts.
#[derive(Clone)]
pub enum OpaqueValue {
    /// Null / absent.
    Null,
    /// A boolean.
    Bool(bool),
    /// A finite number.
    Number(Number),
    /// A string.
    String(String),
    /// A calendar date.
    Date(NaiveDate),
    /// A date and time without timezone.
    DateTime(NaiveDateTime),
    /// A time of day.
    Time(NaiveTime),
    /// A UUID.
    Uuid(Uuid),
    /// An ordered mapping with unique string keys.
    Mapping(Mapping),
    /// An ordered sequence.
    Sequence(Vec<OpaqueValue>),
    /// Lazily computed text (or a lazily computed sequence).
    Deferred(Arc<dyn Deferred>),
    /// A zero-argument thunk.
    Invocable(Thunk),
    /// A foreign-entity reference.
    Entity(Arc<dyn Entity>),
    /// A model choice wrapper.
    ChoiceValue(ChoiceIteratorValue),
}

impl OpaqueValue {
    /// Wraps a closure as an [`Invocable`](Self::Invocable).
    pub fn invocable(f: impl Fn() -> Self + Send + Sync + 'static) -> Self {
        Self::Invocable(Arc::new(f))
    }

    /// Wraps a deferred value.
    pub fn deferred(value: impl Deferred + 'static) -> Self {
        Self::Deferred(Arc::new(value))
    }

    /// Wraps an entity reference.
    pub fn entity(entity: impl Entity + 'static) -> Self {
        Self::Entity(Arc::new(entity))
    }

    /// Builds a lazily computed string.
    pub fn lazy_text(f: impl Fn() -> Result<String, DeferredError> + Send + Sync + 'static) -> Self {
        Self::deferred(LazyText::new(f))
    }

    /// The variant name, used in diagnostics and debug output.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Time(_) => "time",
            Self::Uuid(_) => "uuid",
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Deferred(_) => "deferred",
            Self::Invocable(_) => "invocable",
            Self::Entity(_) => "entity",
            Self::ChoiceValue(_) => "choice_value",
        }
    }

    /// Returns `true` for [`Null`](Self::Null).
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            Self::Time(t) => f.debug_tuple("Time").field(t).finish(),
            Self::Uuid(u) => f.debug_tuple("Uuid").field(u).finish(),
            Self::Mapping(m) => f.debug_tuple("Mapping").field(m).finish(),
            Self::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Self::Deferred(d) => f.debug_tuple("Deferred").field(d).finish(),
            Self::Invocable(_) => write!(f, "Invocable(<fn>)"),
            Self::Entity(e) => f.debug_tuple("Entity").field(e).finish(),
            Self::ChoiceValue(c) => f.debug_tuple("ChoiceValue").field(c).finish(),
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for OpaqueValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for OpaqueValue {
    fn from(v: i32) -> Self {
        Self::Number(Number::from(v))
    }
}

impl From<i64> for OpaqueValue {
    fn from(v: i64) -> Self {
        Self::Number(Number::from(v))
    }
}

impl From<u32> for OpaqueValue {
    fn from(v: u32) -> Self {
        Self::Number(Number::from(v))
    }
}

impl From<u64> for OpaqueValue {
    fn from(v: u64) -> Self {
        Self::Number(Number::from(v))
    }
}

impl From<usize> for OpaqueValue {
    fn from(v: usize) -> Self {
        Self::Number(Number::from(v))
    }
}

/// Non-finite floats have no JSON representation and become [`OpaqueValue::Null`].
impl From<f64> for OpaqueValue {
    fn from(v: f64) -> Self {
        Number::from_f64(v).map_or(Self::Null, Self::Number)
    }
}

impl From<String> for OpaqueValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for OpaqueValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for OpaqueValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for OpaqueValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveTime> for OpaqueValue {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<Uuid> for OpaqueValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<Mapping> for OpaqueValue {
    fn from(v: Mapping) -> Self {
        Self::Mapping(v)
    }
}

impl From<ChoiceIteratorValue> for OpaqueValue {
    fn from(v: ChoiceIteratorValue) -> Self {
        Self::ChoiceValue(v)
    }
}

impl<T: Into<Self>> From<Vec<T>> for OpaqueValue {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for OpaqueValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Already-normalized data converts back losslessly, so normalized output
/// can be fed through the normalizer again.
impl From<serde_json::Value> for OpaqueValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => Self::Mapping(map.into_iter().collect()),
        }
    }
}

// ── Mapping ────────────────────────────────────────────────────────────

/// An insertion-ordered mapping with unique string keys.
///
/// Inserting an existing key replaces its value in place, keeping the key's
/// original position.
///
/// # Examples
///
/// ```
/// use formwire_normalize::Mapping;
///
/// let mut m = Mapping::new();
/// m.insert("b", 1);
/// m.insert("a", 2);
/// m.insert("b", 3);
///
/// let keys: Vec<&str> = m.keys().collect();
/// assert_eq!(keys, vec!["b", "a"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, OpaqueValue)>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a value, returning the previous value for the key if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OpaqueValue>,
    ) -> Option<OpaqueValue> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Returns the value for a key.
    pub fn get(&self, key: &str) -> Option<&OpaqueValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<OpaqueValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OpaqueValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<OpaqueValue>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Mapping {
    type Item = (String, OpaqueValue);
    type IntoIter = std::vec::IntoIter<(String, OpaqueValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ── Deferred implementations ───────────────────────────────────────────

type TextResolver = Arc<dyn Fn() -> Result<String, DeferredError> + Send + Sync>;

/// A string computed each time it is forced.
///
/// This is the shape of translated labels and help texts: the final text
/// depends on state (such as the active language) at the moment of
/// serialization, not at the moment the form was declared.
#[derive(Clone)]
pub struct LazyText {
    name: String,
    resolver: TextResolver,
}

impl LazyText {
    /// Creates a lazy string from a resolver.
    pub fn new(resolver: impl Fn() -> Result<String, DeferredError> + Send + Sync + 'static) -> Self {
        Self {
            name: String::from("<lazy>"),
            resolver: Arc::new(resolver),
        }
    }

    /// Names the value for error messages (typically its message id).
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Debug for LazyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LazyText").field(&self.name).finish()
    }
}

impl Deferred for LazyText {
    fn force(&self) -> Result<String, DeferredError> {
        (self.resolver)()
    }
}

type SequenceResolver = Arc<dyn Fn() -> Result<Vec<OpaqueValue>, DeferredError> + Send + Sync>;

/// A sequence computed each time it is iterated, such as a lazily
/// evaluated list of choices. It has no string form.
#[derive(Clone)]
pub struct LazySequence {
    name: String,
    resolver: SequenceResolver,
}

impl LazySequence {
    /// Creates a lazy sequence from a resolver.
    pub fn new(
        resolver: impl Fn() -> Result<Vec<OpaqueValue>, DeferredError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: String::from("<lazy sequence>"),
            resolver: Arc::new(resolver),
        }
    }

    /// Names the value for error messages.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Debug for LazySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LazySequence").field(&self.name).finish()
    }
}

impl Deferred for LazySequence {
    fn force(&self) -> Result<String, DeferredError> {
        Err(DeferredError::new("lazy sequence has no string form"))
    }

    fn iterate(&self) -> Result<Vec<OpaqueValue>, DeferredError> {
        (self.resolver)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_insert_replaces_in_place() {
        let mut m = Mapping::new();
        assert!(m.insert("x", 1).is_none());
        m.insert("y", 2);
        let old = m.insert("x", 3);
        assert!(matches!(old, Some(OpaqueValue::Number(_))));
        assert_eq!(m.len(), 2);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_mapping_remove_keeps_order() {
        let mut m: Mapping = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert!(m.remove("b").is_some());
        assert!(m.remove("b").is_none());
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(m.contains_key("c"));
        assert!(!m.contains_key("b"));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(OpaqueValue::from(f64::NAN).is_null());
        assert!(OpaqueValue::from(f64::INFINITY).is_null());
        assert!(matches!(OpaqueValue::from(1.5), OpaqueValue::Number(_)));
    }

    #[test]
    fn test_option_and_vec_conversions() {
        assert!(OpaqueValue::from(None::<i64>).is_null());
        match OpaqueValue::from(vec!["a", "b"]) {
            OpaqueValue::Sequence(items) => assert_eq!(items.len(), 2),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_json_conversion_preserves_object_order() {
        let json = serde_json::json!({"z": 1, "a": [true, null]});
        match OpaqueValue::from(json) {
            OpaqueValue::Mapping(m) => assert_eq!(m.keys().collect::<Vec<_>>(), vec!["z", "a"]),
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_lazy_text_forces_every_time() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy = LazyText::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("Name".to_string())
        });
        assert_eq!(lazy.force().unwrap(), "Name");
        assert_eq!(lazy.force().unwrap(), "Name");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(lazy.iterate().is_err());
    }

    #[test]
    fn test_lazy_sequence_has_no_string_form() {
        let lazy = LazySequence::new(|| Ok(vec![OpaqueValue::from(1)])).named("choices");
        assert!(lazy.force().is_err());
        assert_eq!(lazy.iterate().unwrap().len(), 1);
        assert!(lazy.describe().contains("choices"));
    }

    #[test]
    fn test_debug_hides_thunk() {
        let value = OpaqueValue::invocable(|| OpaqueValue::Null);
        assert_eq!(format!("{value:?}"), "Invocable(<fn>)");
        assert_eq!(value.kind_name(), "invocable");
    }
}

//! Form error containers.
//!
//! Forms report errors either as a flat list of messages (non-field errors)
//! or as a mapping from field name to a list of messages. Messages are often
//! lazy text. These helpers flatten both shapes into plain strings.

use serde_json::{Map, Value};

use crate::normalizer::Normalizer;
use crate::value::{Mapping, OpaqueValue};
use formwire_core::NormalizationError;

impl Normalizer<'_> {
    /// Normalizes an error container of any shape.
    ///
    /// Sequences become lists of strings, mappings become mappings of
    /// (lists of) strings, anything else goes through
    /// [`normalize`](Normalizer::normalize).
    ///
    /// # Examples
    ///
    /// ```
    /// use formwire_normalize::{Mapping, Normalizer, OpaqueValue, TracingSink};
    ///
    /// let mut errors = Mapping::new();
    /// errors.insert("email", vec!["Enter a valid email address."]);
    ///
    /// let out = Normalizer::new(&TracingSink)
    ///     .normalize_errors(&errors.into())
    ///     .unwrap();
    /// assert_eq!(out, serde_json::json!({"email": ["Enter a valid email address."]}));
    /// ```
    pub fn normalize_errors(&self, container: &OpaqueValue) -> Result<Value, NormalizationError> {
        match container {
            OpaqueValue::Sequence(items) => Ok(Value::Array(
                self.normalize_error_list(items)?
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            )),
            OpaqueValue::Mapping(map) => Ok(Value::Object(self.normalize_error_dict(map)?)),
            other => self.normalize(other),
        }
    }

    /// Converts every message in `items` to its string form.
    pub fn normalize_error_list(
        &self,
        items: &[OpaqueValue],
    ) -> Result<Vec<String>, NormalizationError> {
        items.iter().map(|item| self.message_text(item)).collect()
    }

    /// Converts an error mapping. Sequence details become message lists,
    /// every other detail becomes a single string.
    pub fn normalize_error_dict(
        &self,
        errors: &Mapping,
    ) -> Result<Map<String, Value>, NormalizationError> {
        let mut out = Map::new();
        for (key, detail) in errors.iter() {
            let normalized = match detail {
                OpaqueValue::Sequence(items) => Value::Array(
                    self.normalize_error_list(items)?
                        .into_iter()
                        .map(Value::String)
                        .collect(),
                ),
                other => Value::String(self.message_text(other)?),
            };
            out.insert(key.to_string(), normalized);
        }
        Ok(out)
    }

    /// The display text of one message.
    fn message_text(&self, message: &OpaqueValue) -> Result<String, NormalizationError> {
        Ok(match self.normalize(message)? {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

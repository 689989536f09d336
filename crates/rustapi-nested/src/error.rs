//! Error types for nested validation.
//!
//! Validation failures are data: they live in a [`MessageBag`] and never
//! interrupt control flow. Only programming errors raised by a rule's hooks
//! surface as `Err`.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Iter;
use std::collections::HashMap;
use std::fmt;

/// A failed field rule.
///
/// The message is kept as a template until the engine knows the field's
/// label. `{name}` placeholders are filled from `params` in insertion order,
/// then `{attribute}` is replaced by the label, so text inside a label is
/// never treated as a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    /// Rule code (`required`, `email`, `min`, ...)
    pub code: &'static str,
    /// Message template
    pub template: &'static str,
    /// Values for the template's own placeholders
    pub params: Vec<(&'static str, String)>,
}

impl RuleError {
    /// Create an error for `code` with a message template.
    pub fn new(code: &'static str, template: &'static str) -> Self {
        Self {
            code,
            template,
            params: Vec::new(),
        }
    }

    /// Attach a value for a `{name}` placeholder.
    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    /// Render the message for a field labelled `label`.
    pub fn render(&self, label: &str) -> String {
        let message = self
            .params
            .iter()
            .fold(self.template.to_string(), |message, (name, value)| {
                message.replace(&format!("{{{name}}}"), value)
            });
        message.replace("{attribute}", label)
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.render("value"))
    }
}

impl std::error::Error for RuleError {}

/// Error messages keyed by field name or attribute path.
///
/// Messages for one key keep their insertion order. Hosts usually show only
/// the [`first`](MessageBag::first) message per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBag {
    #[serde(flatten)]
    fields: HashMap<String, Vec<String>>,
}

impl MessageBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for a key.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(key.into())
            .or_default()
            .push(message.into());
    }

    /// Append several messages for a key.
    pub fn add_all<I, S>(&mut self, key: impl Into<String>, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.fields.entry(key.into()).or_default();
        entry.extend(messages.into_iter().map(Into::into));
    }

    /// Replace the messages stored for a key.
    ///
    /// An empty list removes the key.
    pub fn insert(&mut self, key: impl Into<String>, messages: Vec<String>) {
        let key = key.into();
        if messages.is_empty() {
            self.fields.remove(&key);
        } else {
            self.fields.insert(key, messages);
        }
    }

    /// Merge another bag into this one.
    ///
    /// Keys present in `other` replace the matching keys here; every other
    /// key is left untouched. Merging the same bag twice is therefore a no-op
    /// the second time.
    pub fn merge(&mut self, other: MessageBag) {
        for (key, messages) in other.fields {
            self.insert(key, messages);
        }
    }

    /// Get the messages for a key.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.fields.get(key).map(Vec::as_slice)
    }

    /// Get the first message for a key.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Check whether a key has messages.
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the total number of messages.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    /// Get all keys with messages.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Iterate over keys and their messages.
    pub fn iter(&self) -> Iter<'_, String, Vec<String>> {
        self.fields.iter()
    }

    /// Convert to Result - Ok if no errors, Err otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for MessageBag {
    type Item = (String, Vec<String>);
    type IntoIter = std::collections::hash_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageBag {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<(String, Vec<String>)> for MessageBag {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        let mut bag = MessageBag::new();
        for (key, messages) in iter {
            bag.add_all(key, messages);
        }
        bag
    }
}

impl fmt::Display for MessageBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {} error(s)", self.len())
    }
}

impl std::error::Error for MessageBag {}

/// Error raised by a nested rule's `rules()` or `attribute_labels()` hook.
///
/// A hook failure is a bug in the rule, not a validation outcome, so it is
/// handed back to the caller as-is.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct HookError(Box<dyn std::error::Error + Send + Sync>);

impl HookError {
    /// Wrap any error.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self(error.into())
    }

    /// Create a hook error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Unwrap the original error.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl From<RuleParseError> for HookError {
    fn from(error: RuleParseError) -> Self {
        Self::new(error)
    }
}

impl From<serde_json::Error> for HookError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error)
    }
}

/// Error returned when a textual field rule cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    /// The rule name is not known.
    #[error("unknown rule '{0}'")]
    Unknown(String),

    /// The rule needs a parameter (e.g. `min:3`) but none was given.
    #[error("rule '{0}' requires a parameter")]
    MissingParameter(String),

    /// The parameter could not be parsed.
    #[error("invalid parameter '{param}' for rule '{rule}'")]
    InvalidParameter {
        /// Rule name
        rule: String,
        /// Offending parameter
        param: String,
    },
}

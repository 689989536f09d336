//! Parent validator capability and an in-memory implementation.

use crate::error::{HookError, MessageBag};
use crate::path::{self, WILDCARD};
use crate::remap::CustomAttributes;
use crate::rule::AttributeRule;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// What a nested rule needs from the validator that runs it.
///
/// Label lookups come from the [`CustomAttributes`] supertrait.
pub trait ParentValidator: CustomAttributes {
    /// Merge messages into the error bag.
    ///
    /// Keys in `messages` replace the matching keys; all other keys are kept.
    fn merge_errors(&mut self, messages: MessageBag);

    /// Overwrite the stored value at an attribute path.
    fn set_value(&mut self, path: &str, value: Value);
}

/// In-memory parent validator over a JSON document.
///
/// Holds the data under validation, the custom attribute labels and the
/// accumulated error bag.
///
/// ## Example
///
/// ```rust,ignore
/// use rustapi_nested::prelude::*;
///
/// let mut ctx = ParentContext::builder()
///     .data(json!({"items": [{"email": "a@b.io"}, {"email": "bad"}]}))
///     .attribute("items.*", "Item")
///     .build();
///
/// let mut rule = NestedRule::new(ItemRules);
/// ctx.apply_each("items.*", &mut rule)?;
///
/// assert!(ctx.errors().has("items.1.email"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParentContext {
    data: Value,
    attributes: HashMap<String, String>,
    errors: MessageBag,
}

impl ParentContext {
    /// Create a context over `data` with no labels.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Create a builder for constructing a parent context.
    pub fn builder() -> ParentContextBuilder {
        ParentContextBuilder::new()
    }

    /// Get the data under validation.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consume the context, returning the (possibly rewritten) data.
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Get the custom attribute labels.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Get the error bag.
    pub fn errors(&self) -> &MessageBag {
        &self.errors
    }

    /// Ok with the data if no errors were recorded, the error bag otherwise.
    pub fn into_result(self) -> Result<Value, MessageBag> {
        self.errors.into_result()?;
        Ok(self.data)
    }

    /// Look up the value at a dotted path.
    ///
    /// Numeric segments index into arrays.
    pub fn value(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.data);
        }
        path::segments(path).try_fold(&self.data, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Expand `*` segments against the data.
    ///
    /// `items.*.tags` yields one path per element of `items`. Literal
    /// segments are kept even when nothing exists there yet.
    pub fn expand(&self, pattern: &str) -> Vec<String> {
        let segments: Vec<&str> = path::segments(pattern).collect();
        let mut out = Vec::new();
        expand_into(Some(&self.data), &segments, String::new(), &mut out);
        out
    }

    /// Run a rule against the value at `attribute`.
    ///
    /// A missing value is passed to the rule as null.
    pub fn apply(
        &mut self,
        attribute: &str,
        rule: &mut dyn AttributeRule,
    ) -> Result<(), HookError> {
        let value = self.value(attribute).cloned().unwrap_or(Value::Null);
        rule.validate(self, attribute, &value)
    }

    /// Run a rule against every path matching `pattern`.
    ///
    /// Returns the concrete paths that were validated.
    pub fn apply_each(
        &mut self,
        pattern: &str,
        rule: &mut dyn AttributeRule,
    ) -> Result<Vec<String>, HookError> {
        let paths = self.expand(pattern);
        tracing::debug!(pattern, count = paths.len(), "expanded attribute pattern");

        for attribute in &paths {
            self.apply(attribute, rule)?;
        }
        Ok(paths)
    }

    fn write(&mut self, path: &str, value: Value) {
        if path.is_empty() {
            self.data = value;
            return;
        }

        let mut node = &mut self.data;
        for segment in path::segments(path) {
            node = match child_mut(node, segment) {
                Some(child) => child,
                None => {
                    tracing::debug!(path, segment, "attribute path not writable, value kept");
                    return;
                }
            };
        }
        *node = value;
    }
}

fn expand_into(node: Option<&Value>, segments: &[&str], prefix: String, out: &mut Vec<String>) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push(prefix);
        return;
    };

    if *segment == WILDCARD {
        let keys: Vec<String> = match node {
            Some(Value::Array(items)) => (0..items.len()).map(|i| i.to_string()).collect(),
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        for key in keys {
            let child = node.and_then(|n| child_ref(n, &key));
            expand_into(child, rest, path::join(&prefix, &key), out);
        }
    } else {
        let child = node.and_then(|n| child_ref(n, segment));
        expand_into(child, rest, path::join(&prefix, segment), out);
    }
}

fn child_ref<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Get a mutable child, creating it when missing.
///
/// Null becomes an empty object and objects gain missing keys. Arrays are
/// only indexed in bounds or appended to at their length. Any other step
/// yields `None` so existing data is never replaced.
fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => Some(map.entry(segment).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = segment.parse::<usize>().ok()?;
            if index == items.len() {
                items.push(Value::Null);
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

impl CustomAttributes for ParentContext {
    fn custom_attribute(&self, path: &str) -> Option<&str> {
        self.attributes.custom_attribute(path)
    }
}

impl ParentValidator for ParentContext {
    fn merge_errors(&mut self, messages: MessageBag) {
        self.errors.merge(messages);
    }

    fn set_value(&mut self, path: &str, value: Value) {
        self.write(path, value);
    }
}

/// Builder for constructing a [`ParentContext`].
#[derive(Debug, Default)]
pub struct ParentContextBuilder {
    data: Value,
    attributes: HashMap<String, String>,
}

impl ParentContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data under validation.
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Register a label for an attribute path (`items.*` covers all items).
    pub fn attribute(mut self, path: impl Into<String>, label: impl Into<String>) -> Self {
        self.attributes.insert(path.into(), label.into());
        self
    }

    /// Register several labels.
    pub fn attributes<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Build the parent context.
    pub fn build(self) -> ParentContext {
        ParentContext {
            data: self.data,
            attributes: self.attributes,
            errors: MessageBag::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_builder() {
        let ctx = ParentContext::builder()
            .data(json!({"a": 1}))
            .attribute("contact", "Contact Info")
            .attributes([("items.*", "Item")])
            .build();

        assert_eq!(ctx.custom_attribute("contact"), Some("Contact Info"));
        assert_eq!(ctx.custom_attribute("items.*"), Some("Item"));
        assert!(ctx.custom_attribute("other").is_none());
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn empty_context() {
        let ctx = ParentContext::default();
        assert_eq!(ctx.data(), &Value::Null);
        assert!(ctx.attributes().is_empty());
    }

    #[test]
    fn value_lookup() {
        let ctx = ParentContext::new(json!({"orders": [{"address": {"city": "Oslo"}}]}));
        assert_eq!(ctx.value("orders.0.address.city"), Some(&json!("Oslo")));
        assert!(ctx.value("orders.1.address").is_none());
        assert!(ctx.value("orders.x").is_none());
        assert_eq!(ctx.value(""), Some(ctx.data()));
    }

    #[test]
    fn set_value_overwrites_and_creates() {
        let mut ctx = ParentContext::new(json!({"contact": {"email": "a@b.io", "x": 1}}));
        ctx.set_value("contact", json!({"email": "a@b.io"}));
        ctx.set_value("meta.source", json!("api"));
        ctx.set_value("list.2", json!(true));

        assert_eq!(
            ctx.into_data(),
            json!({
                "contact": {"email": "a@b.io"},
                "meta": {"source": "api"},
                "list": {"2": true},
            })
        );
    }

    #[test]
    fn set_value_indexes_existing_arrays() {
        let mut ctx = ParentContext::new(json!({"items": [{"a": 1}]}));
        ctx.set_value("items.0", json!({"b": 2}));
        ctx.set_value("items.1", json!(3));

        assert_eq!(ctx.data(), &json!({"items": [{"b": 2}, 3]}));
    }

    #[test]
    fn set_value_ignores_out_of_range_indexes() {
        let data = json!({"items": [{"note": "a"}]});
        let mut ctx = ParentContext::new(data.clone());
        ctx.set_value("items.18446744073709551615", json!({}));
        ctx.set_value("items.4000000000", json!({}));
        ctx.set_value("items.5.note", json!("b"));

        assert_eq!(ctx.data(), &data);
    }

    #[test]
    fn set_value_keeps_arrays_and_scalars() {
        let data = json!({"items": [1, 2, 3], "count": 4});
        let mut ctx = ParentContext::new(data.clone());
        ctx.set_value("items.meta", json!(true));
        ctx.set_value("count.value", json!(5));

        assert_eq!(ctx.data(), &data);
    }

    #[test]
    fn merge_errors_keeps_unrelated_entries() {
        let mut ctx = ParentContext::default();
        let mut first = MessageBag::new();
        first.add("name", "Name is required.");
        ctx.merge_errors(first);

        let mut second = MessageBag::new();
        second.add("contact.email", "Email is invalid.");
        ctx.merge_errors(second);

        assert_eq!(ctx.errors().len(), 2);
        assert!(ctx.into_result().is_err());
    }

    #[test]
    fn expand_wildcards() {
        let ctx = ParentContext::new(json!({
            "items": [{"tags": ["a"]}, {"tags": ["b", "c"]}],
            "contact": {},
        }));

        assert_eq!(ctx.expand("items.*"), ["items.0", "items.1"]);
        assert_eq!(
            ctx.expand("items.*.tags.*"),
            ["items.0.tags.0", "items.1.tags.0", "items.1.tags.1"]
        );
        assert_eq!(ctx.expand("contact"), ["contact"]);
        assert_eq!(ctx.expand("missing.*"), Vec::<String>::new());
    }
}

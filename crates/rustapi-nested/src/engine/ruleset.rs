//! Rule sets: nested field name to the rules applied to it.

use super::rules::FieldRule;
use crate::error::RuleParseError;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Iter;
use std::collections::BTreeMap;

/// Rules for the fields of a nested object.
///
/// ## Example
///
/// ```rust,ignore
/// use rustapi_nested::prelude::*;
///
/// let rules = RuleSet::new()
///     .field("email", [FieldRule::Required, FieldRule::Email])
///     .field("name", [FieldRule::String, FieldRule::Max(255.0)]);
///
/// let same = RuleSet::parse([("email", "required|email"), ("name", "string|max:255")])?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    fields: BTreeMap<String, Vec<FieldRule>>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rules for a field, keeping rules added earlier.
    pub fn field(
        mut self,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = FieldRule>,
    ) -> Self {
        self.fields.entry(name.into()).or_default().extend(rules);
        self
    }

    /// Add a single rule for a field.
    pub fn rule(&mut self, name: impl Into<String>, rule: FieldRule) {
        self.fields.entry(name.into()).or_default().push(rule);
    }

    /// Parse `field -> "rule|rule:param"` pairs.
    pub fn parse<'a, I>(fields: I) -> Result<Self, RuleParseError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = Self::new();
        for (name, rules) in fields {
            let parsed = parse_rules(rules)?;
            set = set.field(name, parsed);
        }
        Ok(set)
    }

    /// Get the rules for a field.
    pub fn get(&self, name: &str) -> Option<&[FieldRule]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Check if no field has rules.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the number of ruled fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over fields and their rules in field-name order.
    pub fn iter(&self) -> Iter<'_, String, Vec<FieldRule>> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = (&'a String, &'a Vec<FieldRule>);
    type IntoIter = Iter<'a, String, Vec<FieldRule>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Parse a pipe-separated rule list such as `required|email|max:255`.
///
/// Empty segments are ignored. Note that `regex` patterns therefore cannot
/// contain `|`; build [`FieldRule::Regex`] directly for those.
pub fn parse_rules(rules: &str) -> Result<Vec<FieldRule>, RuleParseError> {
    rules
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

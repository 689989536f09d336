//! Reference nested validation engine.
//!
//! [`NestedRule`](crate::NestedRule) only needs something implementing
//! [`NestedEngine`]; hosts with their own rule execution plug that in
//! instead. [`RuleEngine`] runs a [`RuleSet`] of [`FieldRule`]s over a flat
//! JSON object and is the default engine.

mod rules;
mod ruleset;

pub use rules::{FieldRule, Pattern};
pub use ruleset::{parse_rules, RuleSet};

use crate::error::MessageBag;
use crate::rule::{Labels, NestedEngine, NestedOutcome};
use serde_json::{Map, Value};

/// Engine running [`RuleSet`]s.
///
/// For each ruled field:
/// - a missing field is only checked by `required`
/// - a null field marked `nullable` skips its other rules
/// - every failing rule adds one message, in rule order
///
/// Fields that are ruled and present in the data make up the validated
/// output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    /// Create the engine.
    pub fn new() -> Self {
        Self
    }

    fn label(field: &str, labels: &Labels) -> String {
        labels
            .get(field)
            .cloned()
            .unwrap_or_else(|| field.replace('_', " "))
    }
}

impl NestedEngine<RuleSet> for RuleEngine {
    fn run(&self, data: &Map<String, Value>, rules: &RuleSet, labels: &Labels) -> NestedOutcome {
        let mut errors = MessageBag::new();
        let mut validated = Map::new();

        for (field, field_rules) in rules {
            let value = data.get(field.as_str());
            let nullable = field_rules.contains(&FieldRule::Nullable);
            let skip_optional = match value {
                None => true,
                Some(Value::Null) => nullable,
                Some(_) => false,
            };

            for rule in field_rules {
                if skip_optional && !rule.is_implicit() {
                    continue;
                }
                if let Err(e) = rule.check(value) {
                    errors.add(field.clone(), e.render(&Self::label(field, labels)));
                }
            }

            if let Some(value) = value {
                validated.insert(field.clone(), value.clone());
            }
        }

        NestedOutcome { errors, validated }
    }
}

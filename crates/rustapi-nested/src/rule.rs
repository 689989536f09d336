//! The nested validation rule.
//!
//! A [`NestedRule`] validates the object found at one attribute of a larger
//! record with its own rules and labels, then folds the resulting errors back
//! into the parent validator under the attribute's path.

use crate::context::ParentValidator;
use crate::engine::RuleEngine;
use crate::error::{HookError, MessageBag};
use crate::remap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Human-readable labels for nested field names.
pub type Labels = HashMap<String, String>;

/// The two hooks a nested rule supplies.
///
/// ## Example
///
/// ```rust,ignore
/// use rustapi_nested::prelude::*;
///
/// struct Address;
///
/// impl NestedRules for Address {
///     type Rules = RuleSet;
///
///     fn rules(&self, _attribute: &str, data: &Map<String, Value>) -> Result<RuleSet, HookError> {
///         let mut rules = RuleSet::parse([("city", "required|string")])?;
///         // Conditional rules can look at the data.
///         if data.contains_key("country") {
///             rules.rule("zip", FieldRule::Required);
///         }
///         Ok(rules)
///     }
///
///     fn attribute_labels(&self) -> Result<Labels, HookError> {
///         Ok(Labels::from([("city".to_string(), "City".to_string())]))
///     }
/// }
/// ```
pub trait NestedRules {
    /// Rule set type understood by the engine.
    type Rules;

    /// Build the rules for one nested pass.
    ///
    /// Called once per validation with the attribute path and the coerced
    /// data. Must depend on its inputs only.
    fn rules(&self, attribute: &str, data: &Map<String, Value>) -> Result<Self::Rules, HookError>;

    /// Labels for nested field names.
    fn attribute_labels(&self) -> Result<Labels, HookError>;
}

/// Result of a nested validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedOutcome {
    /// Errors keyed by nested field name; empty iff the pass succeeded
    pub errors: MessageBag,
    /// The ruled fields of the data
    pub validated: Map<String, Value>,
}

impl NestedOutcome {
    /// Check whether the pass succeeded.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs rules against a nested object.
pub trait NestedEngine<R: ?Sized> {
    /// Validate `data` against `rules`, using `labels` in messages.
    fn run(&self, data: &Map<String, Value>, rules: &R, labels: &Labels) -> NestedOutcome;
}

impl<R: ?Sized, E: NestedEngine<R> + ?Sized> NestedEngine<R> for &E {
    fn run(&self, data: &Map<String, Value>, rules: &R, labels: &Labels) -> NestedOutcome {
        (**self).run(data, rules, labels)
    }
}

/// Generic shape of a rule applied by a host validator to one attribute.
pub trait AttributeRule {
    /// Validate `value`, found at `attribute`, reporting into `parent`.
    fn validate(
        &mut self,
        parent: &mut dyn ParentValidator,
        attribute: &str,
        value: &Value,
    ) -> Result<(), HookError>;
}

/// Serializable settings for a [`NestedRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedRuleConfig {
    /// Replace the parent's value with the validated fields after a
    /// successful pass, dropping fields without rules.
    pub exclude_unvalidated: bool,
}

/// Coerce a raw value into the mapping a nested pass runs on.
///
/// Objects are used as they are, arrays are keyed by index (`"0"`, `"1"`,
/// ...) and every other value becomes an empty mapping.
pub fn coerce(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item.clone()))
            .collect(),
        _ => Map::new(),
    }
}

/// Validation rule for an embedded object.
///
/// The hooks `H` supply the rules and labels; the engine `E` runs them.
/// A rule keeps the outcome of its last pass, so it should not be shared
/// between overlapping validations.
///
/// ## Example
///
/// ```rust,ignore
/// use rustapi_nested::prelude::*;
///
/// let mut parent = ParentContext::builder()
///     .data(json!({"contact": {"email": "bad"}}))
///     .attribute("contact", "Contact Info")
///     .build();
///
/// let mut rule = NestedRule::new(ContactRules);
/// parent.apply("contact", &mut rule)?;
///
/// assert_eq!(
///     parent.errors().first("contact.email"),
///     Some("Contact Info The Email field must be a valid email address."),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct NestedRule<H, E = RuleEngine> {
    hooks: H,
    engine: E,
    exclude_unvalidated: bool,
    nested: Option<NestedOutcome>,
}

impl<H> NestedRule<H> {
    /// Create a rule running on the default [`RuleEngine`].
    pub fn new(hooks: H) -> Self {
        Self::with_engine(hooks, RuleEngine)
    }

    /// Create a rule from serialized settings.
    pub fn from_config(hooks: H, config: &NestedRuleConfig) -> Self {
        Self::new(hooks).exclude_unvalidated(config.exclude_unvalidated)
    }
}

impl<H, E> NestedRule<H, E> {
    /// Create a rule running on a custom engine.
    pub fn with_engine(hooks: H, engine: E) -> Self {
        Self {
            hooks,
            engine,
            exclude_unvalidated: false,
            nested: None,
        }
    }

    /// Replace the parent's value with the validated fields on success.
    pub fn exclude_unvalidated(mut self, exclude: bool) -> Self {
        self.exclude_unvalidated = exclude;
        self
    }

    /// Get the hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Get the current settings.
    pub fn config(&self) -> NestedRuleConfig {
        NestedRuleConfig {
            exclude_unvalidated: self.exclude_unvalidated,
        }
    }

    /// Validated fields of the last nested pass, if one has run.
    pub fn validated(&self) -> Option<&Map<String, Value>> {
        self.nested.as_ref().map(|outcome| &outcome.validated)
    }

    /// Full outcome of the last nested pass, if one has run.
    pub fn outcome(&self) -> Option<&NestedOutcome> {
        self.nested.as_ref()
    }
}

impl<H, E> NestedRule<H, E>
where
    H: NestedRules,
    E: NestedEngine<H::Rules>,
{
    /// Validate the value found at `attribute`.
    ///
    /// The value is coerced with [`coerce`] first, so scalars and null are
    /// validated as an empty object. Validation failures end up in the
    /// parent's error bag; only hook errors are returned.
    pub fn validate(
        &mut self,
        parent: &mut (impl ParentValidator + ?Sized),
        attribute: &str,
        value: &Value,
    ) -> Result<(), HookError> {
        let data = coerce(value);
        self.validate_nested(parent, attribute, data)
    }

    /// Run the nested pass over already coerced data.
    pub fn validate_nested(
        &mut self,
        parent: &mut (impl ParentValidator + ?Sized),
        attribute: &str,
        data: Map<String, Value>,
    ) -> Result<(), HookError> {
        let rules = self.hooks.rules(attribute, &data)?;
        let labels = self.hooks.attribute_labels()?;

        let outcome = self.engine.run(&data, &rules, &labels);
        let outcome = self.nested.insert(outcome);

        tracing::debug!(
            attribute,
            error_count = outcome.errors.len(),
            exclude_unvalidated = self.exclude_unvalidated,
            "nested validation finished"
        );

        if !outcome.errors.is_empty() {
            let messages = remap::remap(attribute, &*parent, &outcome.errors);
            parent.merge_errors(messages);
        } else if self.exclude_unvalidated {
            parent.set_value(attribute, Value::Object(outcome.validated.clone()));
        }

        Ok(())
    }

    /// Bind a parent validator for fluent use.
    pub fn bind<'a, P>(&'a mut self, parent: &'a mut P) -> BoundNestedRule<'a, H, E, P>
    where
        P: ParentValidator + ?Sized,
    {
        BoundNestedRule { rule: self, parent }
    }
}

impl<H, E> AttributeRule for NestedRule<H, E>
where
    H: NestedRules,
    E: NestedEngine<H::Rules>,
{
    fn validate(
        &mut self,
        parent: &mut dyn ParentValidator,
        attribute: &str,
        value: &Value,
    ) -> Result<(), HookError> {
        NestedRule::validate(self, parent, attribute, value)
    }
}

/// A [`NestedRule`] bound to its parent validator.
pub struct BoundNestedRule<'a, H, E, P: ?Sized> {
    rule: &'a mut NestedRule<H, E>,
    parent: &'a mut P,
}

impl<H, E, P> BoundNestedRule<'_, H, E, P>
where
    H: NestedRules,
    E: NestedEngine<H::Rules>,
    P: ParentValidator + ?Sized,
{
    /// Validate the value found at `attribute` against the bound parent.
    pub fn validate(&mut self, attribute: &str, value: &Value) -> Result<(), HookError> {
        self.rule.validate(&mut *self.parent, attribute, value)
    }

    /// Validated fields of the last nested pass, if one has run.
    pub fn validated(&self) -> Option<&Map<String, Value>> {
        self.rule.validated()
    }

    /// Get the bound parent.
    pub fn parent(&self) -> &P {
        self.parent
    }
}

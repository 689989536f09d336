//! # RustAPI Nested Validation
//!
//! Validates objects embedded in a larger record with their own rules and
//! labels, then folds the errors back into the parent validator under the
//! embedded object's path.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rustapi_nested::prelude::*;
//!
//! struct ContactRules;
//!
//! impl NestedRules for ContactRules {
//!     type Rules = RuleSet;
//!
//!     fn rules(&self, _attribute: &str, _data: &Map<String, Value>) -> Result<RuleSet, HookError> {
//!         Ok(RuleSet::parse([("email", "required|email")])?)
//!     }
//!
//!     fn attribute_labels(&self) -> Result<Labels, HookError> {
//!         Ok(Labels::from([("email".to_string(), "Email".to_string())]))
//!     }
//! }
//!
//! let mut parent = ParentContext::builder()
//!     .data(json!({"items": [{"email": "bad"}]}))
//!     .attribute("items.*", "Item")
//!     .build();
//!
//! parent.apply_each("items.*", &mut NestedRule::new(ContactRules))?;
//! ```
//!
//! ## Error Keys
//!
//! Nested errors are stored under `attribute.field`. When the parent has a
//! label for the attribute, the first message of each field is prefixed with
//! it. Labels for array elements are looked up with the trailing index
//! collapsed to `*`, so `items.2` uses the label registered for `items.*`:
//!
//! ```json
//! {
//!   "items.2.email": ["Item The Email field must be a valid email address."]
//! }
//! ```

mod context;
mod error;
mod remap;
mod rule;

pub mod engine;
pub mod path;

#[cfg(test)]
mod tests;

pub use context::{ParentContext, ParentContextBuilder, ParentValidator};
pub use engine::{FieldRule, Pattern, RuleEngine, RuleSet};
pub use error::{HookError, MessageBag, RuleError, RuleParseError};
pub use remap::{message_prefix, remap, CustomAttributes};
pub use rule::{
    coerce, AttributeRule, BoundNestedRule, Labels, NestedEngine, NestedOutcome, NestedRule,
    NestedRuleConfig, NestedRules,
};

/// Prelude module for nested validation
pub mod prelude {
    pub use crate::context::{ParentContext, ParentContextBuilder, ParentValidator};
    pub use crate::engine::{FieldRule, RuleEngine, RuleSet};
    pub use crate::error::{HookError, MessageBag, RuleError, RuleParseError};
    pub use crate::remap::CustomAttributes;
    pub use crate::rule::{
        AttributeRule, Labels, NestedEngine, NestedOutcome, NestedRule, NestedRuleConfig,
        NestedRules,
    };
    pub use serde_json::{json, Map, Value};
}

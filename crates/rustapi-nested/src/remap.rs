//! Re-keying of nested error messages into the parent's namespace.

use crate::error::MessageBag;
use crate::path;
use std::collections::{BTreeMap, HashMap};

/// Read access to a registry of display labels keyed by attribute path.
pub trait CustomAttributes {
    /// Get the label registered for an attribute path.
    fn custom_attribute(&self, path: &str) -> Option<&str>;
}

impl CustomAttributes for HashMap<String, String> {
    fn custom_attribute(&self, path: &str) -> Option<&str> {
        self.get(path).map(String::as_str)
    }
}

impl CustomAttributes for BTreeMap<String, String> {
    fn custom_attribute(&self, path: &str) -> Option<&str> {
        self.get(path).map(String::as_str)
    }
}

impl<T: CustomAttributes + ?Sized> CustomAttributes for &T {
    fn custom_attribute(&self, path: &str) -> Option<&str> {
        (**self).custom_attribute(path)
    }
}

/// Compute the label prefix for errors nested under `attribute`.
///
/// The label is looked up under the wildcard-collapsed key, so `items.2`
/// picks up a label registered for `items.*`. Returns the label followed by
/// a space, or an empty string when nothing is registered.
pub fn message_prefix(attribute: &str, registry: &(impl CustomAttributes + ?Sized)) -> String {
    let parent_key = path::parent_key(attribute);
    registry
        .custom_attribute(&parent_key)
        .map(|label| format!("{label} "))
        .unwrap_or_default()
}

/// Re-key a nested error bag under `attribute`.
///
/// Every nested field `f` becomes `attribute.f`. The first message of each
/// field gets the [`message_prefix`]; later messages are kept verbatim.
pub fn remap(
    attribute: &str,
    registry: &(impl CustomAttributes + ?Sized),
    nested: &MessageBag,
) -> MessageBag {
    let prefix = message_prefix(attribute, registry);

    nested
        .iter()
        .map(|(field, messages)| {
            let key = path::join(attribute, field);
            let mut messages = messages.clone();
            if let Some(first) = messages.first_mut() {
                first.insert_str(0, &prefix);
            }
            tracing::trace!(key = %key, count = messages.len(), "remapped nested errors");
            (key, messages)
        })
        .collect()
}

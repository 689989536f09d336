//! Property-based tests for nested validation.

#[cfg(test)]
mod property_tests {
    use crate::context::{ParentContext, ParentValidator};
    use crate::engine::{FieldRule, RuleSet};
    use crate::error::{HookError, MessageBag};
    use crate::path::parent_key;
    use crate::remap::remap;
    use crate::rule::{Labels, NestedRule, NestedRules};
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};
    use std::collections::HashMap;

    /// Every listed field is required, `code` must also be a short string.
    struct RequiredFields(Vec<String>);

    impl NestedRules for RequiredFields {
        type Rules = RuleSet;

        fn rules(
            &self,
            _attribute: &str,
            _data: &Map<String, Value>,
        ) -> Result<RuleSet, HookError> {
            let mut rules = RuleSet::new();
            for field in &self.0 {
                rules.rule(field.clone(), FieldRule::Required);
            }
            rules.rule("code", FieldRule::Max(4.0));
            Ok(rules)
        }

        fn attribute_labels(&self) -> Result<Labels, HookError> {
            Ok(Labels::new())
        }
    }

    fn segment_strategy() -> impl Strategy<Value = String> {
        "[a-z_]{1,8}"
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![segment_strategy(), (0u32..1000).prop_map(|i| i.to_string())],
            1..5,
        )
        .prop_map(|segments| segments.join("."))
    }

    fn scalar_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
        ]
    }

    fn bag_strategy() -> impl Strategy<Value = MessageBag> {
        prop::collection::hash_map(
            segment_strategy(),
            prop::collection::vec("[a-zA-Z ]{1,20}", 1..4),
            0..5,
        )
        .prop_map(|fields| fields.into_iter().collect())
    }

    fn object_strategy() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(segment_strategy(), scalar_strategy(), 0..6)
            .prop_map(|fields| fields.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // A trailing array index collapses to `*`.
        #[test]
        fn prop_trailing_index_collapses(prefix in path_strategy(), index in 0u32..100_000) {
            let attribute = format!("{prefix}.{index}");
            prop_assert_eq!(parent_key(&attribute), format!("{prefix}.*"));
        }

        // Paths ending in a named segment are left alone.
        #[test]
        fn prop_named_tail_unchanged(prefix in path_strategy(), tail in segment_strategy()) {
            let attribute = format!("{prefix}.{tail}");
            prop_assert_eq!(parent_key(&attribute), attribute);
        }

        // Remapping keeps one entry per field and every message, and only the
        // first message of a field changes.
        #[test]
        fn prop_remap_preserves_messages(
            attribute in path_strategy(),
            nested in bag_strategy(),
            label in prop::option::of("[A-Z][a-z]{1,10}"),
        ) {
            let mut registry = HashMap::new();
            if let Some(label) = &label {
                registry.insert(parent_key(&attribute), label.clone());
            }

            let out = remap(&attribute, &registry, &nested);
            prop_assert_eq!(out.field_names().len(), nested.field_names().len());
            prop_assert_eq!(out.len(), nested.len());

            for (field, messages) in &nested {
                let key = format!("{attribute}.{field}");
                let remapped = out.get(&key).unwrap();
                prop_assert_eq!(remapped.len(), messages.len());

                let expected_first = match &label {
                    Some(label) => format!("{label} {}", messages[0]),
                    None => messages[0].clone(),
                };
                prop_assert_eq!(&remapped[0], &expected_first);
                prop_assert_eq!(&remapped[1..], &messages[1..]);
            }
        }

        // Scalars and null validate as an empty object, so each required
        // field fails under `attribute.field`.
        #[test]
        fn prop_scalar_values_fail_required_fields(
            value in scalar_strategy(),
            fields in prop::collection::btree_set(segment_strategy(), 1..4),
        ) {
            let fields: Vec<String> = fields.into_iter().filter(|f| f != "code").collect();
            let mut parent = ParentContext::default();
            let mut rule = NestedRule::new(RequiredFields(fields.clone()));

            rule.validate(&mut parent, "payload", &value).unwrap();

            prop_assert_eq!(parent.errors().field_names().len(), fields.len());
            for field in &fields {
                let key = format!("payload.{field}");
                prop_assert!(parent.errors().has(&key));
            }
            prop_assert!(rule.validated().unwrap().is_empty());
        }

        // Running the same rule twice leaves the same error bag.
        #[test]
        fn prop_validate_is_idempotent(data in object_strategy()) {
            let value = Value::Object(data);
            let mut parent = ParentContext::builder().attribute("entry", "Entry").build();
            let mut rule = NestedRule::new(RequiredFields(vec!["name".to_string()]));

            rule.validate(&mut parent, "entry", &value).unwrap();
            let first = parent.errors().clone();
            rule.validate(&mut parent, "entry", &value).unwrap();

            prop_assert_eq!(parent.errors(), &first);
        }

        // On success the stored value is untouched unless unvalidated fields
        // are excluded, in which case it is a subset of the input.
        #[test]
        fn prop_success_value_handling(mut data in object_strategy(), exclude in any::<bool>()) {
            data.insert("name".to_string(), json!("present"));
            data.remove("code");
            let original = Value::Object(data.clone());

            let mut parent = ParentContext::new(json!({"entry": original.clone()}));
            let mut rule = NestedRule::new(RequiredFields(vec!["name".to_string()]))
                .exclude_unvalidated(exclude);

            rule.validate(&mut parent, "entry", &original).unwrap();
            prop_assert!(parent.errors().is_empty());

            let stored = parent.value("entry").cloned().unwrap();
            if exclude {
                let stored = stored.as_object().unwrap();
                prop_assert!(stored.keys().all(|k| data.contains_key(k)));
                prop_assert_eq!(stored.get("name"), Some(&json!("present")));
                prop_assert_eq!(stored.len(), 1);
            } else {
                prop_assert_eq!(stored, original);
            }
        }
    }

    #[test]
    fn parent_validator_is_object_safe() {
        let mut ctx = ParentContext::default();
        let parent: &mut dyn ParentValidator = &mut ctx;
        parent.set_value("a", json!(1));
        assert_eq!(ctx.value("a"), Some(&json!(1)));
    }
}

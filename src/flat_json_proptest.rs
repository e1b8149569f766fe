//! Property-based tests for the flat JSON differ.

#[cfg(test)]
mod proptest_tests {
    use crate::flat_json::{apply, compare, flatten_value, ChangeKind, FlatJson};
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    /// Objects nested up to three levels with string, boolean and string-list leaves.
    fn json_object() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            "[a-z0-9.]{0,8}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Bool),
            prop::collection::vec("[a-z]{0,4}".prop_map(Value::String), 0..3).prop_map(Value::Array),
        ];
        let tree = leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map("[a-z]{1,5}", inner, 1..4)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>()))
        });
        prop::collection::btree_map("[a-z]{1,5}", tree, 0..4)
            .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>()))
    }

    proptest! {
        /// Property: a snapshot never differs from itself
        #[test]
        fn compare_with_self_is_empty(json in json_object()) {
            let flat = flatten_value(&json);
            prop_assert!(compare(&flat, &flat).unwrap().is_empty());
        }

        /// Property: diffing against nothing adds every key, in key order
        #[test]
        fn compare_with_empty_adds_everything(json in json_object()) {
            let flat = flatten_value(&json);
            let changes = compare(&FlatJson::new(), &flat).unwrap();
            prop_assert_eq!(changes.len(), flat.len());
            prop_assert!(changes.iter().all(|c| c.kind == ChangeKind::Added));
            prop_assert!(changes.windows(2).all(|w| w[0].name < w[1].name));
        }

        /// Property: replaying a diff onto the old document reproduces the new flattened view
        #[test]
        fn apply_replays_compare(old in json_object(), new in json_object()) {
            let old_flat = flatten_value(&old);
            let new_flat = flatten_value(&new);
            if let Ok(changes) = compare(&old_flat, &new_flat) {
                if let Ok(replayed) = apply(&old, &changes) {
                    prop_assert_eq!(flatten_value(&replayed), new_flat);
                }
            }
        }

        /// Property: replaying an all-additions diff onto an empty root rebuilds the flattened view
        #[test]
        fn apply_rebuilds_from_scratch(json in json_object()) {
            let flat = flatten_value(&json);
            let changes = compare(&FlatJson::new(), &flat).unwrap();
            let rebuilt = apply(&Value::Object(Map::new()), &changes).unwrap();
            prop_assert_eq!(flatten_value(&rebuilt), flat);
        }
    }
}

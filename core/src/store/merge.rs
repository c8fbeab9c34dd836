//! Shallow-merge semantics for non-replacing updates.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde_json::Value;


/// How a partial update is folded into the current state.
///
/// Implementations follow object-spread semantics: top-level keys present in
/// `patch` override the current ones, keys absent from `patch` are kept.
/// Nested values are replaced wholesale, never merged recursively.
pub trait Merge {
    fn merge(&mut self, patch: Self);
}

/// Objects are spread key by key. Any other combination (a scalar or array on
/// either side) replaces the current value with the patch.
impl Merge for Value {
    fn merge(&mut self, patch: Value) {
        match (self, patch) {
            (Value::Object(current), Value::Object(update)) => current.extend(update),
            (slot, update) => *slot = update,
        }
    }
}

impl<K: Eq + Hash, V> Merge for HashMap<K, V> {
    fn merge(&mut self, patch: Self) {
        self.extend(patch);
    }
}

impl<K: Ord, V> Merge for BTreeMap<K, V> {
    fn merge(&mut self, patch: Self) {
        self.extend(patch);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_override_and_preserve() {
        let mut state = json!({"a": 1, "x": 0});
        state.merge(json!({"x": 1}));
        assert_eq!(state, json!({"a": 1, "x": 1}));
    }

    #[test]
    fn merge_is_shallow() {
        let mut state = json!({"user": {"name": "ada", "age": 36}, "n": 1});
        state.merge(json!({"user": {"name": "grace"}}));
        assert_eq!(state, json!({"user": {"name": "grace"}, "n": 1}));
    }

    #[test]
    fn non_object_patch_replaces() {
        let mut state = json!({"a": 1});
        state.merge(json!([1, 2]));
        assert_eq!(state, json!([1, 2]));

        let mut scalar = json!(5);
        scalar.merge(json!({"a": 1}));
        assert_eq!(scalar, json!({"a": 1}));
    }

    #[test]
    fn null_patch_replaces() {
        let mut state = json!({"a": 1});
        state.merge(Value::Null);
        assert!(state.is_null());
    }

    #[test]
    fn hashmap_extend() {
        let mut state: HashMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
        state.merge([("b", 20), ("c", 3)].into_iter().collect());
        assert_eq!(state.len(), 3);
        assert_eq!(state["a"], 1);
        assert_eq!(state["b"], 20);
        assert_eq!(state["c"], 3);
    }

    #[test]
    fn btreemap_extend() {
        let mut state: BTreeMap<String, u8> = BTreeMap::new();
        state.insert("k".into(), 1);
        let mut patch = BTreeMap::new();
        patch.insert("k".into(), 2);
        Merge::merge(&mut state, patch);
        assert_eq!(state.get("k"), Some(&2));
    }
}

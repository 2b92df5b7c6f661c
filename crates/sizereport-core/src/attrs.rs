#![forbid(unsafe_code)]

//! Separates element configuration from attributes forwarded to the
//! rendered element.

use crate::props::Props;

/// Names of the configuration props.
pub mod keys {
    pub const ON_SIZE_UPDATED: &str = "onSizeUpdated";
    pub const STYLE: &str = "style";
    pub const REPORTING_MODE: &str = "reportingMode";
    pub const TIMEOUT_MS: &str = "timeoutMs";
}

/// Props consumed by the wrapper itself and never forwarded.
pub const RESERVED_KEYS: [&str; 4] = [
    keys::ON_SIZE_UPDATED,
    keys::STYLE,
    keys::REPORTING_MODE,
    keys::TIMEOUT_MS,
];

/// Copy of `props` without the `reserved` keys.
///
/// Values are shared with the input, not deep-copied. Reserved keys absent
/// from `props` are ignored.
#[must_use]
pub fn filter_attributes(props: &Props, reserved: &[&str]) -> Props {
    props
        .iter()
        .filter(|(key, _)| !reserved.contains(key))
        .map(|(key, value)| (key.to_owned(), value.clone()))
        .collect()
}

/// Attributes destined for the rendered element.
#[must_use]
pub fn forwarded_attributes(props: &Props) -> Props {
    filter_attributes(props, &RESERVED_KEYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropValue;
    use serde_json::json;

    #[test]
    fn removes_exactly_the_reserved_keys() {
        let props = Props::new()
            .with("a", 1)
            .with("style", json!({}))
            .with("b", 2)
            .with("reportingMode", "x")
            .with("timeoutMs", 5);

        let filtered = filter_attributes(&props, &["style", "reportingMode", "timeoutMs"]);

        assert_eq!(filtered, Props::new().with("a", 1).with("b", 2));
    }

    #[test]
    fn absent_reserved_keys_are_noops() {
        let props = Props::new().with("id", "root");
        assert_eq!(forwarded_attributes(&props), props);
        assert!(forwarded_attributes(&Props::new()).is_empty());
    }

    #[test]
    fn forwarded_values_keep_identity() {
        let props = Props::new()
            .with("data-meta", json!({"deep": {"list": [1, 2]}}))
            .with_callback("onClick", |_, _| {});
        let filtered = forwarded_attributes(&props);
        for (key, value) in props.iter() {
            let kept = filtered.get(key).expect("non-reserved key kept");
            assert!(kept.same_ref(value));
        }
    }

    #[test]
    fn default_reserved_set_strips_configuration() {
        let props = Props::new()
            .with_callback("onSizeUpdated", |_, _| {})
            .with("style", json!({"color": "red"}))
            .with("reportingMode", "debounce")
            .with("timeoutMs", 100)
            .with("className", "panel");
        let filtered = forwarded_attributes(&props);
        assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["className"]);
        assert_eq!(filtered.get("className"), Some(&PropValue::from("panel")));
    }

    mod proptests {
        use super::*;
        use proptest::collection::{btree_set, vec};
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn filter_is_exact_set_difference(
                keys in btree_set("[a-z]{1,6}", 0..12),
                reserved in vec("[a-z]{1,6}", 0..6),
            ) {
                let props: Props = keys
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (k.clone(), PropValue::from(i as u32)))
                    .collect();
                let reserved_refs: Vec<&str> = reserved.iter().map(String::as_str).collect();

                let filtered = filter_attributes(&props, &reserved_refs);

                for key in &keys {
                    prop_assert_eq!(filtered.contains_key(key), !reserved.contains(key));
                    if let Some(kept) = filtered.get(key) {
                        prop_assert_eq!(Some(kept), props.get(key));
                    }
                }
                prop_assert!(filtered.keys().all(|k| keys.contains(k)));
            }
        }
    }
}

//! # Data Resolution
//!
//! Every renderable element gets its value through one precedence chain:
//!
//! 1. If the element names a lookup key, the key is tried against the
//!    label context first, then the shared payload. A *present* value wins
//!    even when it is falsy ("" / 0 / false) — presence, not truthiness,
//!    decides.
//! 2. Only when no lookup key is named, or the key is absent from both
//!    sources, does the element's literal base field apply.
//! 3. If a `datakey` is declared, indexing into the resolved mapping is
//!    authoritative: a miss (or a non-mapping value) yields the default,
//!    never the un-indexed value.
//! 4. Explicit JSON null is treated as absent at every step.

use serde_json::Value;

use crate::context::LabelContext;
use crate::template::{Element, Payload};

/// Resolve with the conventional field names: literal under `data`,
/// lookup key under `key`.
pub fn resolve(
    element: &Element,
    ctx: &LabelContext,
    payload: &Payload,
    default: Option<&Value>,
) -> Option<Value> {
    resolve_fields(element, ctx, payload, "data", "key", default)
}

/// Resolve with custom field names, for elements whose value lives under
/// another field (e.g. an image handler sourcing `url`).
pub fn resolve_fields(
    element: &Element,
    ctx: &LabelContext,
    payload: &Payload,
    base_field: &str,
    lookup_field: &str,
    default: Option<&Value>,
) -> Option<Value> {
    let mut value: Option<Value> = None;
    let mut resolved = false;

    if let Some(key) = element.field_str(lookup_field) {
        if let Some(v) = ctx.lookup(&key) {
            value = Some(v);
            resolved = true;
        } else if let Some(v) = payload.get(&key) {
            // null in the payload counts as absent, not as a hit
            if !v.is_null() {
                value = Some(v.clone());
                resolved = true;
            }
        }
    }
    if !resolved {
        value = element.field(base_field);
    }

    if let Some(datakey) = element.datakey.as_deref() {
        value = match value {
            Some(Value::Object(map)) => map.get(datakey).cloned().filter(|v| !v.is_null()),
            _ => None,
        };
    }

    if value.is_none() {
        value = default.cloned();
    }
    value
}

/// The resolved value as display text. Strings come through verbatim;
/// other scalars use their JSON rendering.
pub fn resolve_text(
    element: &Element,
    ctx: &LabelContext,
    payload: &Payload,
    default: Option<&Value>,
) -> Option<String> {
    resolve(element, ctx, payload, default).map(|v| match v {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};
    use std::path::PathBuf;

    fn ctx() -> LabelContext {
        LabelContext::fixed(100, 50, PathBuf::from("/tmp/font.ttf"), 40)
    }

    fn payload(pairs: &[(&str, Value)]) -> Payload {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        map
    }

    fn element(json: Value) -> Element {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_literal_data_only() {
        let el = element(json!({"type": "text", "data": "hello"}));
        assert_eq!(resolve(&el, &ctx(), &payload(&[]), None), Some(json!("hello")));
    }

    #[test]
    fn test_key_beats_literal() {
        let el = element(json!({"type": "text", "data": "fallback", "key": "product"}));
        let p = payload(&[("product", json!("Milk"))]);
        assert_eq!(resolve(&el, &ctx(), &p, None), Some(json!("Milk")));
    }

    #[test]
    fn test_context_beats_payload() {
        let mut c = ctx();
        c.insert("product", json!("from-context"));
        let el = element(json!({"type": "text", "key": "product"}));
        let p = payload(&[("product", json!("from-payload"))]);
        assert_eq!(resolve(&el, &c, &p, None), Some(json!("from-context")));
    }

    #[test]
    fn test_falsy_hit_wins() {
        // present-but-empty payload value still beats the literal
        let el = element(json!({"type": "text", "data": "fallback", "key": "note"}));
        let p = payload(&[("note", json!(""))]);
        assert_eq!(resolve(&el, &ctx(), &p, None), Some(json!("")));

        let p = payload(&[("note", json!(0))]);
        assert_eq!(resolve(&el, &ctx(), &p, None), Some(json!(0)));

        let p = payload(&[("note", json!(false))]);
        assert_eq!(resolve(&el, &ctx(), &p, None), Some(json!(false)));
    }

    #[test]
    fn test_missing_key_falls_back_to_literal() {
        let el = element(json!({"type": "text", "data": "fallback", "key": "absent"}));
        assert_eq!(resolve(&el, &ctx(), &payload(&[]), None), Some(json!("fallback")));
    }

    #[test]
    fn test_null_payload_value_is_absent() {
        let el = element(json!({"type": "text", "data": "fallback", "key": "gone"}));
        let p = payload(&[("gone", Value::Null)]);
        assert_eq!(resolve(&el, &ctx(), &p, None), Some(json!("fallback")));
    }

    #[test]
    fn test_nothing_resolves_to_default() {
        let el = element(json!({"type": "text"}));
        let default = json!("n/a");
        assert_eq!(
            resolve(&el, &ctx(), &payload(&[]), Some(&default)),
            Some(json!("n/a"))
        );
        assert_eq!(resolve(&el, &ctx(), &payload(&[]), None), None);
    }

    #[test]
    fn test_datakey_indexes_mapping() {
        let el = element(json!({"type": "text", "key": "product", "datakey": "name"}));
        let p = payload(&[("product", json!({"name": "Milk", "id": 5}))]);
        assert_eq!(resolve(&el, &ctx(), &p, None), Some(json!("Milk")));
    }

    #[test]
    fn test_datakey_miss_yields_default_not_mapping() {
        let el = element(json!({"type": "text", "key": "product", "datakey": "missing"}));
        let p = payload(&[("product", json!({"name": "Milk"}))]);
        let default = json!("?");
        // indexing is authoritative: never the un-indexed mapping
        assert_eq!(resolve(&el, &ctx(), &p, Some(&default)), Some(json!("?")));
        assert_eq!(resolve(&el, &ctx(), &p, None), None);
    }

    #[test]
    fn test_datakey_into_scalar_yields_default() {
        let el = element(json!({"type": "text", "data": "scalar", "datakey": "name"}));
        let default = json!("?");
        assert_eq!(
            resolve(&el, &ctx(), &payload(&[]), Some(&default)),
            Some(json!("?"))
        );
    }

    #[test]
    fn test_datakey_null_value_is_absent() {
        let el = element(json!({"type": "text", "key": "product", "datakey": "name"}));
        let p = payload(&[("product", json!({"name": null}))]);
        assert_eq!(resolve(&el, &ctx(), &p, None), None);
    }

    #[test]
    fn test_custom_base_and_lookup_fields() {
        let el = element(json!({"type": "image_url", "url": "http://literal/", "urlkey": "img"}));
        let p = payload(&[("img", json!("http://from-payload/"))]);
        assert_eq!(
            resolve_fields(&el, &ctx(), &p, "url", "urlkey", None),
            Some(json!("http://from-payload/"))
        );
        assert_eq!(
            resolve_fields(&el, &ctx(), &payload(&[]), "url", "urlkey", None),
            Some(json!("http://literal/"))
        );
    }

    #[test]
    fn test_resolve_text_renders_scalars() {
        let el = element(json!({"type": "text", "data": 42}));
        assert_eq!(resolve_text(&el, &ctx(), &payload(&[]), None), Some("42".to_string()));
        let el = element(json!({"type": "text", "data": "plain"}));
        assert_eq!(resolve_text(&el, &ctx(), &payload(&[]), None), Some("plain".to_string()));
    }

    #[test]
    fn test_context_builtin_dates_resolve() {
        let el = element(json!({"type": "text", "key": "iso_date"}));
        let value = resolve_text(&el, &ctx(), &payload(&[]), None).unwrap();
        assert_eq!(value.len(), 10); // YYYY-MM-DD
    }
}

//! # Template Model
//!
//! A label template is a tree of typed elements, deserialized from the
//! stored JSON definition once per render and disposable afterwards.
//!
//! The `type` tag is an open string: templates authored against a superset
//! of handlers still parse, and the compositor skips kinds no registered
//! handler matches. Unknown *fields* are captured in `rest` so custom
//! handlers and the inject element can read and write them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::Alignment;
use crate::error::RotuloError;

/// The open data bag shared by reference across one render.
pub type Payload = Map<String, Value>;

/// A requested pixel size for an encoded symbol: `"WxH"` or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImgSize {
    Pixels(u32),
    Text(String),
}

impl ImgSize {
    /// Parse into `(width, Option<height>)`. A bare number has no height;
    /// the handler decides whether that means square or proportional.
    pub fn parse(&self) -> Option<(u32, Option<u32>)> {
        match self {
            ImgSize::Pixels(n) => Some((*n, None)),
            ImgSize::Text(s) => {
                let lower = s.to_ascii_lowercase();
                match lower.split_once('x') {
                    Some((w, h)) => Some((w.trim().parse().ok()?, Some(h.trim().parse().ok()?))),
                    None => Some((lower.trim().parse().ok()?, None)),
                }
            }
        }
    }
}

/// One node of the template tree.
///
/// Only `type` is meaningful for dispatch; every other field is read by
/// the handler that matches. Handlers may rewrite a *copy* of a node (the
/// grocy sugar does) but never the template itself, which may be shared
/// across concurrent renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    // Data sourcing (see the resolver)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datakey: Option<String>,

    // Layout
    pub horizontal_offset: i64,
    pub vertical_offset: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<usize>,
    pub shrink: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<[u8; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,

    // Codes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_size: Option<ImgSize>,

    // Images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "maintainAR", skip_serializing_if = "Option::is_none")]
    pub maintain_ar: Option<bool>,

    // Fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datakeyname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grocycode: Option<String>,

    // Reshaping / injection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,
    #[serde(rename = "override")]
    pub override_existing: bool,

    #[serde(rename = "elements", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,

    /// Fields this model doesn't know about. Kept for custom handlers and
    /// for generic field access in the resolver.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Element {
    /// A bare element of the given kind, for programmatic construction.
    pub fn of_kind(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    /// Generic field access by name, covering the data-sourcing fields and
    /// anything in `rest`. Explicit nulls read as absent.
    pub fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "data" => self.data.clone(),
            "key" => self.key.clone().map(Value::String),
            "datakey" => self.datakey.clone().map(Value::String),
            "url" => self.url.clone().map(Value::String),
            "file" => self.file.clone().map(|p| Value::String(p.display().to_string())),
            "endpoint" => self.endpoint.clone().map(Value::String),
            "grocycode" => self.grocycode.clone().map(Value::String),
            "target_key" => self.target_key.clone().map(Value::String),
            _ => self.rest.get(name).cloned(),
        };
        value.filter(|v| !v.is_null())
    }

    /// String form of a field, for fields that name lookup keys.
    pub fn field_str(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Copy of this element with its base data replaced. How parents feed
    /// resolved values to children.
    pub fn with_data(&self, value: Value) -> Element {
        let mut copy = self.clone();
        copy.data = Some(value);
        copy
    }

    /// Copy of this element with an arbitrary field set, honoring the
    /// inject element's override rule: an existing (non-null) field is
    /// kept unless `override_existing` is true.
    ///
    /// Goes through the JSON representation so any field — typed or not —
    /// can be targeted.
    pub fn with_field(
        &self,
        name: &str,
        value: &Value,
        override_existing: bool,
    ) -> Result<Element, RotuloError> {
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Ok(self.clone()),
        };
        let present = map.get(name).is_some_and(|v| !v.is_null());
        if override_existing || !present {
            map.insert(name.to_string(), value.clone());
        }
        serde_json::from_value(Value::Object(map))
            .map_err(|e| RotuloError::Template(format!("cannot set field '{}': {}", name, e)))
    }
}

/// A stored template: canvas overrides plus the root element list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_right: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_bottom: Option<u32>,
    #[serde(rename = "elements", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Template {
    pub fn from_str(json: &str) -> Result<Self, RotuloError> {
        serde_json::from_str(json)
            .map_err(|e| RotuloError::Template(format!("invalid template: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, RotuloError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_str(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_minimal_template() {
        let t = Template::from_str(
            r#"{"elements": [{"type": "text", "data": "A", "horizontal_offset": 5}]}"#,
        )
        .unwrap();
        assert_eq!(t.children.len(), 1);
        assert_eq!(t.children[0].kind, "text");
        assert_eq!(t.children[0].horizontal_offset, 5);
        assert_eq!(t.children[0].data, Some(json!("A")));
    }

    #[test]
    fn test_unknown_kind_parses() {
        let t = Template::from_str(r#"{"elements": [{"type": "hologram", "sparkle": true}]}"#)
            .unwrap();
        assert_eq!(t.children[0].kind, "hologram");
        assert_eq!(t.children[0].field("sparkle"), Some(json!(true)));
    }

    #[test]
    fn test_nested_children() {
        let t = Template::from_str(
            r#"{"elements": [{"type": "from_json_payload", "elements": [
                {"type": "text", "key": "product"}]}]}"#,
        )
        .unwrap();
        assert_eq!(t.children[0].children.len(), 1);
        assert_eq!(t.children[0].children[0].key.as_deref(), Some("product"));
    }

    #[test]
    fn test_field_null_is_absent() {
        let t = Template::from_str(r#"{"elements": [{"type": "text", "data": null}]}"#).unwrap();
        assert_eq!(t.children[0].field("data"), None);
    }

    #[test]
    fn test_img_size_parse() {
        assert_eq!(ImgSize::Pixels(120).parse(), Some((120, None)));
        assert_eq!(ImgSize::Text("150x100".into()).parse(), Some((150, Some(100))));
        assert_eq!(ImgSize::Text("120X120".into()).parse(), Some((120, Some(120))));
        assert_eq!(ImgSize::Text("80".into()).parse(), Some((80, None)));
        assert_eq!(ImgSize::Text("bogus".into()).parse(), None);
    }

    #[test]
    fn test_with_field_respects_override() {
        let el = Element {
            kind: "text".into(),
            datakey: Some("old".into()),
            ..Default::default()
        };
        let kept = el.with_field("datakey", &json!("new"), false).unwrap();
        assert_eq!(kept.datakey.as_deref(), Some("old"));
        let replaced = el.with_field("datakey", &json!("new"), true).unwrap();
        assert_eq!(replaced.datakey.as_deref(), Some("new"));
    }

    #[test]
    fn test_with_field_sets_unknown_fields() {
        let el = Element::of_kind("text");
        let updated = el.with_field("badge", &json!(7), false).unwrap();
        assert_eq!(updated.field("badge"), Some(json!(7)));
    }

    #[test]
    fn test_with_data_leaves_original() {
        let el = Element::of_kind("text");
        let fed = el.with_data(json!("value"));
        assert_eq!(fed.data, Some(json!("value")));
        assert_eq!(el.data, None);
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let el = Element::of_kind("text");
        let json = serde_json::to_value(&el).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("type"));
        assert!(!obj.contains_key("data"));
        assert!(!obj.contains_key("elements"));
    }
}

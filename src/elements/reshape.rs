//! Data-reshaping elements: `"data_array_index"` picks one entry of an
//! array, `"data_dict_item"` one member of a mapping, and feeds it to the
//! children. When the selection cannot be made — no data, wrong shape,
//! out of range — the whole branch is skipped, matching how an absent
//! element behaves.

use serde_json::{Value, json};

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::resolve;
use crate::template::{Element, Payload};

pub struct DataArrayIndexHandler;

impl ElementHandler for DataArrayIndexHandler {
    fn kind(&self) -> &'static str {
        "data_array_index"
    }

    fn process(
        &self,
        element: &Element,
        composer: &Composer,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        let Some(index) = element.index else {
            eprintln!("[reshape] data_array_index without index, skipping");
            return Ok(());
        };
        let selected = match resolve::resolve(element, ctx, payload, None) {
            Some(Value::Array(items)) => items.into_iter().nth(index),
            _ => None,
        };
        let Some(selected) = selected else {
            // out of range or not an array: the branch renders nothing
            return Ok(());
        };
        feed_children(&selected, element, composer, canvas, frame, payload, ctx)
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "data_array_index",
            "description": "Select one entry of an array for the children",
            "fields": {
                "data": "literal array",
                "key": "context/payload lookup key",
                "index": "zero-based entry index",
                "elements": "children fed the selected entry",
            },
        }))
    }
}

pub struct DataDictItemHandler;

impl ElementHandler for DataDictItemHandler {
    fn kind(&self) -> &'static str {
        "data_dict_item"
    }

    fn process(
        &self,
        element: &Element,
        composer: &Composer,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        let Some(item) = element.datakey.as_deref() else {
            eprintln!("[reshape] data_dict_item without datakey, skipping");
            return Ok(());
        };
        // resolve the base value without the datakey step; the selection is
        // this handler's job, and a miss skips the branch instead of
        // falling back to a default
        let mut base = element.clone();
        base.datakey = None;
        let selected = match resolve::resolve(&base, ctx, payload, None) {
            Some(Value::Object(map)) => map.get(item).cloned().filter(|v| !v.is_null()),
            _ => None,
        };
        let Some(selected) = selected else {
            return Ok(());
        };
        feed_children(&selected, element, composer, canvas, frame, payload, ctx)
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "data_dict_item",
            "description": "Select one member of a mapping for the children",
            "fields": {
                "data": "literal mapping",
                "key": "context/payload lookup key",
                "datakey": "member name to select",
                "elements": "children fed the selected member",
            },
        }))
    }
}

fn feed_children(
    selected: &Value,
    element: &Element,
    composer: &Composer,
    canvas: &mut Canvas,
    frame: &Frame,
    payload: &mut Payload,
    ctx: &LabelContext,
) -> Result<(), RotuloError> {
    for child in &element.children {
        let fed = child.with_data(selected.clone());
        composer.process_element(&fed, canvas, frame, payload, ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::HandlerRegistry;
    use crate::font::FontStore;
    use pretty_assertions::assert_eq;
    use serde_json::Map;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<Option<Value>>>>);
    impl ElementHandler for Recorder {
        fn kind(&self) -> &'static str {
            "recorder"
        }
        fn process(
            &self,
            element: &Element,
            _: &Composer,
            _: &mut Canvas,
            _: &Frame,
            _: &mut Payload,
            _: &LabelContext,
        ) -> Result<(), RotuloError> {
            self.0.lock().unwrap().push(element.data.clone());
            Ok(())
        }
    }

    fn run(element: Value, payload: &mut Payload) -> Vec<Option<Value>> {
        let recorder = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.register(Box::new(DataArrayIndexHandler));
        registry.register(Box::new(DataDictItemHandler));
        registry.register(Box::new(Recorder(recorder.clone())));
        let composer = Composer::with_registry(FontStore::new(), registry);

        let element: Element = serde_json::from_value(element).unwrap();
        let ctx = LabelContext::fixed(50, 50, PathBuf::from("/tmp/font.ttf"), 24);
        let frame = Frame {
            width: 50,
            height: 50,
            margin_left: 0,
            margin_top: 0,
            margin_right: 0,
            margin_bottom: 0,
        };
        let mut canvas = Canvas::new(50, 50);
        composer
            .process_element(&element, &mut canvas, &frame, payload, &ctx)
            .unwrap();
        let log = recorder.lock().unwrap().clone();
        log
    }

    #[test]
    fn test_array_index_selects_entry() {
        let fed = run(
            json!({
                "type": "data_array_index",
                "data": ["a", "b", "c"],
                "index": 1,
                "elements": [{"type": "recorder"}],
            }),
            &mut Map::new(),
        );
        assert_eq!(fed, vec![Some(json!("b"))]);
    }

    #[test]
    fn test_array_index_out_of_range_skips_branch() {
        let fed = run(
            json!({
                "type": "data_array_index",
                "data": ["a"],
                "index": 5,
                "elements": [{"type": "recorder"}],
            }),
            &mut Map::new(),
        );
        assert_eq!(fed, Vec::<Option<Value>>::new());
    }

    #[test]
    fn test_array_index_on_non_array_skips_branch() {
        let fed = run(
            json!({
                "type": "data_array_index",
                "data": {"not": "an array"},
                "index": 0,
                "elements": [{"type": "recorder"}],
            }),
            &mut Map::new(),
        );
        assert_eq!(fed, Vec::<Option<Value>>::new());
    }

    #[test]
    fn test_array_index_from_payload_key() {
        let mut payload = Map::new();
        payload.insert("rows".into(), json!([10, 20]));
        let fed = run(
            json!({
                "type": "data_array_index",
                "key": "rows",
                "index": 0,
                "elements": [{"type": "recorder"}],
            }),
            &mut payload,
        );
        assert_eq!(fed, vec![Some(json!(10))]);
    }

    #[test]
    fn test_dict_item_selects_member() {
        let fed = run(
            json!({
                "type": "data_dict_item",
                "data": {"name": "Milk", "id": 5},
                "datakey": "name",
                "elements": [{"type": "recorder"}],
            }),
            &mut Map::new(),
        );
        assert_eq!(fed, vec![Some(json!("Milk"))]);
    }

    #[test]
    fn test_dict_item_missing_member_skips_branch() {
        let fed = run(
            json!({
                "type": "data_dict_item",
                "data": {"name": "Milk"},
                "datakey": "absent",
                "elements": [{"type": "recorder"}],
            }),
            &mut Map::new(),
        );
        assert_eq!(fed, Vec::<Option<Value>>::new());
    }

    #[test]
    fn test_dict_item_on_non_mapping_skips_branch() {
        let fed = run(
            json!({
                "type": "data_dict_item",
                "data": [1, 2, 3],
                "datakey": "name",
                "elements": [{"type": "recorder"}],
            }),
            &mut Map::new(),
        );
        assert_eq!(fed, Vec::<Option<Value>>::new());
    }
}

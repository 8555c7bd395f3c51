//! The `"from_json_payload"` element: projects the shared payload onto its
//! children without any network round trip. The request-body twin of
//! `"json_api"`.

use serde_json::{Value, json};

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::template::{Element, Payload};

pub struct FromJsonPayloadHandler;

impl ElementHandler for FromJsonPayloadHandler {
    fn kind(&self) -> &'static str {
        "from_json_payload"
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
        // An empty payload still projects: children get the empty map.
        let snapshot = Value::Object(payload.clone());
        for child in &element.children {
            let value = child
                .key
                .as_deref()
                .and_then(|key| payload.get(key))
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| snapshot.clone());
            let fed = child.with_data(value);
            composer.process_element(&fed, canvas, frame, payload, ctx)?;
        }
        Ok(())
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "from_json_payload",
            "description": "Feed the request payload to the children",
            "fields": {
                "elements": "children; each gets payload[key], or the whole payload",
            },
        }))
    }
}

//! The `"passthrough"` element: paints nothing, groups children.

use serde_json::{Value, json};

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::template::{Element, Payload};

pub struct PassthroughHandler;

impl ElementHandler for PassthroughHandler {
    fn kind(&self) -> &'static str {
        "passthrough"
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
        composer.process_children(&element.children, canvas, frame, payload, ctx)
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "passthrough",
            "description": "Structural grouping, no paint of its own",
            "fields": { "elements": "children" },
        }))
    }
}

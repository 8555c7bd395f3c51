//! The `"inject_data"` element: writes its literal `data` under
//! `target_key` into one of three destinations before recursing —
//!
//! * `"context"`  — a branch-scoped context clone (siblings unaffected),
//! * `"payload"`  — the shared payload (visible to later siblings),
//! * `"children"` — the field on each child's processed copy.
//!
//! An existing value is never clobbered unless `override` is set.

use serde_json::{Value, json};

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::template::{Element, Payload};

pub struct InjectDataHandler;

impl ElementHandler for InjectDataHandler {
    fn kind(&self) -> &'static str {
        "inject_data"
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
        let (Some(target_key), Some(data)) = (element.target_key.as_deref(), &element.data)
        else {
            eprintln!("[inject] inject_data without target_key/data, passing through");
            return composer.process_children(&element.children, canvas, frame, payload, ctx);
        };
        let target = element.target.as_deref().unwrap_or("payload");

        match target {
            "context" => {
                let mut branch = ctx.clone();
                if element.override_existing || branch.lookup(target_key).is_none() {
                    branch.insert(target_key, data.clone());
                }
                composer.process_children(&element.children, canvas, frame, payload, &branch)
            }
            "payload" => {
                if element.override_existing || !payload.contains_key(target_key) {
                    payload.insert(target_key.to_string(), data.clone());
                }
                composer.process_children(&element.children, canvas, frame, payload, ctx)
            }
            "children" => {
                for child in &element.children {
                    let fed = child.with_field(target_key, data, element.override_existing)?;
                    composer.process_element(&fed, canvas, frame, payload, ctx)?;
                }
                Ok(())
            }
            other => {
                eprintln!("[inject] unknown target '{}', passing through", other);
                composer.process_children(&element.children, canvas, frame, payload, ctx)
            }
        }
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "inject_data",
            "description": "Inject a literal value before processing children",
            "fields": {
                "data": "value to inject",
                "target_key": "destination key / field name",
                "target": "context | payload | children (default payload)",
                "override": "replace an existing value",
                "elements": "children",
            },
        }))
    }
}

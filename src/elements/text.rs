//! The `"text"` element: resolved data drawn as multi-line text, with
//! optional word wrap and shrink-to-fit.

use image::Rgb;
use serde_json::{Value, json};

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::font;
use crate::resolve;
use crate::template::{Element, Payload};

/// Smallest size the shrink search will consider.
const MIN_FONT_SIZE: u32 = 2;

pub struct TextHandler;

impl ElementHandler for TextHandler {
    fn kind(&self) -> &'static str {
        "text"
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
        // Nothing resolved means nothing painted, not an error.
        let Some(text) = resolve::resolve_text(element, ctx, payload, None) else {
            return Ok(());
        };
        let text = match element.wrap {
            Some(width) => font::wrap_text(&text, width),
            None => text,
        };

        // Per-element font override; the context font is the usual case.
        let font = match element.font_family.as_deref() {
            Some(family) => {
                let style = element.font_style.as_deref().unwrap_or("Regular");
                font::load_font(composer.fonts().lookup(family, style)?)?
            }
            None => font::load_font(&ctx.font_path)?,
        };

        let (ox, oy) = frame.origin();
        let x = ox + element.horizontal_offset;
        let y = oy + element.vertical_offset;

        let nominal = element.font_size.unwrap_or(ctx.font_size);
        let size = if element.shrink {
            // The offset plus the far margin is unusable space in each axis.
            let reserved_h = x.max(0) as u32 + frame.margin_right;
            let reserved_v = y.max(0) as u32 + frame.margin_bottom;
            font::fit_font_size(
                &font,
                &text,
                frame.width,
                frame.height,
                MIN_FONT_SIZE,
                nominal,
                reserved_h,
                reserved_v,
            )
        } else {
            nominal
        };

        let fill = Rgb(element.fill_color.unwrap_or(ctx.fill_color));
        let align = element.align.unwrap_or(ctx.align);
        font::draw_multiline(canvas, &font, &text, size, x, y, fill, align);
        Ok(())
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "text",
            "description": "Draw resolved data as text",
            "fields": {
                "data": "literal text",
                "key": "context/payload lookup key",
                "datakey": "index into a resolved mapping",
                "horizontal_offset": "x offset in dots",
                "vertical_offset": "y offset in dots",
                "wrap": "wrap at N characters",
                "shrink": "shrink font to fit the label",
                "font_family": "font family override",
                "font_style": "font style override",
                "font_size": "nominal size override",
                "align": "left | center | right",
                "fill_color": "[r, g, b]",
            },
        }))
    }
}

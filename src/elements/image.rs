//! The `"image_file"` / `"image_url"` elements: raster images from disk or
//! the network, scaled and blitted onto the label.
//!
//! A load or decode failure is a soft failure: the composer logs it and
//! the branch paints nothing, so one broken image never kills a label.

use image::{RgbImage, imageops};
use serde_json::{Value, json};

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::resolve;
use crate::template::{Element, Payload};

pub struct ImageFileHandler;

impl ElementHandler for ImageFileHandler {
    fn kind(&self) -> &'static str {
        "image_file"
    }

    fn process(
        &self,
        element: &Element,
        _composer: &Composer,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        let Some(path) = resolve_source(element, ctx, payload, "file") else {
            return Ok(());
        };
        let img = image::open(&path)
            .map_err(|e| RotuloError::Image(format!("cannot load {}: {}", path, e)))?
            .to_rgb8();
        place(canvas, frame, element, img);
        Ok(())
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(image_schema("image_file", "file", "Blit an image from disk"))
    }
}

pub struct ImageUrlHandler;

impl ElementHandler for ImageUrlHandler {
    fn kind(&self) -> &'static str {
        "image_url"
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
        let Some(url) = resolve_source(element, ctx, payload, "url") else {
            return Ok(());
        };
        let bytes = composer
            .http()
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| RotuloError::Http(format!("cannot fetch {}: {}", url, e)))?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| RotuloError::Image(format!("cannot decode {}: {}", url, e)))?
            .to_rgb8();
        place(canvas, frame, element, img);
        Ok(())
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(image_schema("image_url", "url", "Blit an image fetched over HTTP"))
    }
}

/// The image source resolves like data: `key` indirection beats the literal
/// `file`/`url` field.
fn resolve_source(
    element: &Element,
    ctx: &LabelContext,
    payload: &Payload,
    base_field: &str,
) -> Option<String> {
    resolve::resolve_fields(element, ctx, payload, base_field, "key", None).map(|v| match v {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Scale per the element's sizing fields and blit.
fn place(canvas: &mut Canvas, frame: &Frame, element: &Element, img: RgbImage) {
    // A 4-value position is an absolute bounding box on the canvas;
    // otherwise the image lands at the element offset at its scaled size.
    if let Some([x1, y1, x2, y2]) = element.position.as_deref().and_then(four) {
        let box_w = (x2 - x1).max(1) as u32;
        let box_h = (y2 - y1).max(1) as u32;
        let scaled = if element.maintain_ar.unwrap_or(true) {
            let ratio = (box_w as f32 / img.width() as f32)
                .min(box_h as f32 / img.height() as f32);
            scale(&img, ratio)
        } else {
            imageops::resize(&img, box_w, box_h, imageops::FilterType::Triangle)
        };
        canvas.paste(&scaled, x1, y1);
        return;
    }

    let scaled = match (element.width, element.height) {
        (Some(w), Some(h)) => imageops::resize(&img, w.max(1), h.max(1), imageops::FilterType::Triangle),
        (Some(w), None) => scale(&img, w as f32 / img.width() as f32),
        (None, Some(h)) => scale(&img, h as f32 / img.height() as f32),
        (None, None) => img,
    };
    let (ox, oy) = frame.origin();
    canvas.paste(
        &scaled,
        ox + element.horizontal_offset,
        oy + element.vertical_offset,
    );
}

fn scale(img: &RgbImage, ratio: f32) -> RgbImage {
    let w = ((img.width() as f32 * ratio) as u32).max(1);
    let h = ((img.height() as f32 * ratio) as u32).max(1);
    imageops::resize(img, w, h, imageops::FilterType::Triangle)
}

fn four(position: &[i64]) -> Option<[i64; 4]> {
    <[i64; 4]>::try_from(position).ok()
}

fn image_schema(kind: &str, source_field: &str, description: &str) -> Value {
    json!({
        "type": kind,
        "description": description,
        "fields": {
            source_field: "image source",
            "key": "context/payload lookup key for the source",
            "position": "[x, y, x2, y2] bounding box (absolute)",
            "maintainAR": "preserve aspect ratio inside the box",
            "width": "target width (proportional when height absent)",
            "height": "target height (proportional when width absent)",
            "horizontal_offset": "x offset in dots",
            "vertical_offset": "y offset in dots",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};
    use crate::font::FontStore;
    use pretty_assertions::assert_eq;
    use serde_json::Map;
    use std::path::PathBuf;

    fn frame() -> Frame {
        Frame {
            width: 100,
            height: 100,
            margin_left: 0,
            margin_top: 0,
            margin_right: 0,
            margin_bottom: 0,
        }
    }

    #[test]
    fn test_missing_file_is_soft_image_error() {
        let composer = Composer::new(FontStore::new());
        let ctx = LabelContext::fixed(100, 100, PathBuf::from("/tmp/font.ttf"), 24);
        let mut canvas = Canvas::new(100, 100);
        let element: Element =
            serde_json::from_value(json!({"type": "image_file", "file": "/nonexistent.png"}))
                .unwrap();
        let err = ImageFileHandler
            .process(&element, &composer, &mut canvas, &frame(), &mut Map::new(), &ctx)
            .unwrap_err();
        assert!(err.is_soft());
        assert!(matches!(err, RotuloError::Image(_)));
    }

    #[test]
    fn test_no_source_paints_nothing() {
        let composer = Composer::new(FontStore::new());
        let ctx = LabelContext::fixed(100, 100, PathBuf::from("/tmp/font.ttf"), 24);
        let mut canvas = Canvas::new(100, 100);
        let element: Element = serde_json::from_value(json!({"type": "image_file"})).unwrap();
        ImageFileHandler
            .process(&element, &composer, &mut canvas, &frame(), &mut Map::new(), &ctx)
            .unwrap();
        assert_eq!(canvas.pixel(0, 0), WHITE);
    }

    #[test]
    fn test_box_placement_maintains_aspect() {
        // 2:1 source into a 40x40 box scales by the smaller ratio
        let src = RgbImage::from_pixel(20, 10, image::Rgb([0, 0, 0]));
        let mut canvas = Canvas::new(100, 100);
        let element: Element = serde_json::from_value(
            json!({"type": "image_file", "position": [10, 10, 50, 50]}),
        )
        .unwrap();
        place(&mut canvas, &frame(), &element, src);
        assert_eq!(canvas.pixel(10, 10), BLACK);
        assert_eq!(canvas.pixel(49, 10), BLACK); // full 40 wide
        assert_eq!(canvas.pixel(10, 29), BLACK); // 20 tall
        assert_eq!(canvas.pixel(10, 31), WHITE);
    }

    #[test]
    fn test_box_placement_stretches_without_ar() {
        let src = RgbImage::from_pixel(20, 10, image::Rgb([0, 0, 0]));
        let mut canvas = Canvas::new(100, 100);
        let element: Element = serde_json::from_value(
            json!({"type": "image_file", "position": [0, 0, 40, 40], "maintainAR": false}),
        )
        .unwrap();
        place(&mut canvas, &frame(), &element, src);
        assert_eq!(canvas.pixel(39, 39), BLACK);
    }

    #[test]
    fn test_single_axis_scaling_is_proportional() {
        let src = RgbImage::from_pixel(20, 10, image::Rgb([0, 0, 0]));
        let mut canvas = Canvas::new(100, 100);
        let element: Element =
            serde_json::from_value(json!({"type": "image_file", "width": 40})).unwrap();
        place(&mut canvas, &frame(), &element, src);
        assert_eq!(canvas.pixel(39, 19), BLACK);
        assert_eq!(canvas.pixel(39, 21), WHITE);
    }

    #[test]
    fn test_offset_placement_at_natural_size() {
        let src = RgbImage::from_pixel(5, 5, image::Rgb([0, 0, 0]));
        let mut canvas = Canvas::new(100, 100);
        let element: Element = serde_json::from_value(
            json!({"type": "image_file", "horizontal_offset": 30, "vertical_offset": 40}),
        )
        .unwrap();
        place(&mut canvas, &frame(), &element, src);
        assert_eq!(canvas.pixel(30, 40), BLACK);
        assert_eq!(canvas.pixel(34, 44), BLACK);
        assert_eq!(canvas.pixel(29, 40), WHITE);
    }
}

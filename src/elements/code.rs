//! The `"code"` element: machine-readable symbols (QR plus the common 1-D
//! symbologies), encoded from resolved data and blitted at the element
//! offset.

use barcoders::sym::code39::Code39;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean13::{EAN13, UPCA};
use barcoders::sym::tf::TF;
use image::{Rgb, RgbImage};
use qrcode::QrCode;
use serde_json::{Value, json};

use crate::canvas::{self, Canvas, WHITE};
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::elements::{ElementHandler, Frame};
use crate::error::RotuloError;
use crate::resolve;
use crate::template::{Element, Payload};

/// Default bar height for 1-D symbols when no img_size is given.
const BAR_HEIGHT: u32 = 80;
/// Default QR module edge in pixels.
const QR_MODULE: u32 = 4;

pub struct CodeHandler;

impl ElementHandler for CodeHandler {
    fn kind(&self) -> &'static str {
        "code"
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
        let Some(text) = resolve::resolve_text(element, ctx, payload, None) else {
            return Ok(());
        };

        // Side-channel for sibling branches: a value resolved through a key
        // is memoized into the payload unless the key is already taken.
        if let Some(key) = element.key.as_deref() {
            if !payload.contains_key(key) {
                payload.insert(key.to_string(), Value::String(text.clone()));
            }
        }

        let fill = Rgb(element.fill_color.unwrap_or(ctx.fill_color));
        let code_type = element.code_type.as_deref().unwrap_or("code39");
        let symbol = match code_type {
            "qr" => render_qr(&text, fill)?,
            other => bars_to_image(&encode_bars(other, &text)?, fill),
        };

        let symbol = match element.img_size.as_ref().and_then(|s| s.parse()) {
            Some((w, h)) => resize_symbol(symbol, code_type == "qr", w, h),
            None => symbol,
        };

        let (ox, oy) = frame.origin();
        canvas.paste(
            &symbol,
            ox + element.horizontal_offset,
            oy + element.vertical_offset,
        );
        Ok(())
    }

    fn schema_definition(&self) -> Option<Value> {
        Some(json!({
            "type": "code",
            "description": "Encode resolved data as a scannable symbol",
            "fields": {
                "data": "literal value",
                "key": "context/payload lookup key (resolved value is memoized)",
                "datakey": "index into a resolved mapping",
                "code_type": "qr | code39 | code128 | ean13 | upca | itf (default code39)",
                "img_size": "target size, \"WxH\" or a single number; 1-D symbols keep their aspect",
                "horizontal_offset": "x offset in dots",
                "vertical_offset": "y offset in dots",
            },
        }))
    }
}

/// Apply the requested `img_size`. QR symbols resize to the box exactly
/// (square on a bare number); 1-D symbols never distort — a "WxH" box is
/// filled by the smaller axis ratio, a bare width scales the height
/// proportionally.
fn resize_symbol(symbol: RgbImage, exact: bool, w: u32, h: Option<u32>) -> RgbImage {
    if exact {
        return canvas::resize_nearest(&symbol, w, h.unwrap_or(w));
    }
    let ratio = match h {
        Some(h) => {
            (w as f32 / symbol.width() as f32).min(h as f32 / symbol.height() as f32)
        }
        None => w as f32 / symbol.width() as f32,
    };
    let tw = (symbol.width() as f32 * ratio) as u32;
    let th = (symbol.height() as f32 * ratio) as u32;
    canvas::resize_nearest(&symbol, tw, th)
}

/// Encode a 1-D symbology into its bar pattern (1 = bar, 0 = space).
fn encode_bars(code_type: &str, data: &str) -> Result<Vec<u8>, RotuloError> {
    let reject = |e: barcoders::error::Error| {
        RotuloError::Encoder(format!("{} rejected '{}': {}", code_type, data, e))
    };
    match code_type {
        // Code128 wants an explicit character-set prefix; set B covers the
        // printable ASCII templates use.
        "code128" => Ok(Code128::new(format!("\u{0181}{}", data))
            .map_err(reject)?
            .encode()),
        "code39" => Ok(Code39::new(data).map_err(reject)?.encode()),
        "ean13" => Ok(EAN13::new(data).map_err(reject)?.encode()),
        "upca" => Ok(UPCA::new(data).map_err(reject)?.encode()),
        "itf" => Ok(TF::interleaved(data).map_err(reject)?.encode()),
        other => Err(RotuloError::Encoder(format!(
            "unknown code type '{}'",
            other
        ))),
    }
}

/// Paint a bar pattern as a 1px-per-module image at the default height.
fn bars_to_image(bars: &[u8], fill: Rgb<u8>) -> RgbImage {
    let mut img = RgbImage::from_pixel(bars.len().max(1) as u32, BAR_HEIGHT, WHITE);
    for (x, bar) in bars.iter().enumerate() {
        if *bar == 1 {
            for y in 0..BAR_HEIGHT {
                img.put_pixel(x as u32, y, fill);
            }
        }
    }
    img
}

/// Encode and rasterize a QR symbol with the default module size.
fn render_qr(data: &str, fill: Rgb<u8>) -> Result<RgbImage, RotuloError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| RotuloError::Encoder(format!("qr rejected '{}': {}", data, e)))?;
    let luma = code
        .render::<image::Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(QR_MODULE, QR_MODULE)
        .build();
    let mut img = RgbImage::from_pixel(luma.width(), luma.height(), WHITE);
    for (x, y, px) in luma.enumerate_pixels() {
        if px.0[0] == 0 {
            img.put_pixel(x, y, fill);
        }
    }
    Ok(img)
}

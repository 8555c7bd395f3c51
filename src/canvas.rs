//! Label canvas: the single mutable RGB surface every handler paints into.
//!
//! One `Canvas` is created per render at the final target dimensions and is
//! threaded by `&mut` through the whole element tree. Later paints occlude
//! earlier ones at the same coordinates, which is how templates express
//! z-ordering.

use image::{Rgb, RgbImage, imageops};
use std::io::Cursor;

use crate::error::RotuloError;

/// White background for new labels.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
/// Default fill color for black/white media.
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A mutable RGB raster surface.
#[derive(Debug)]
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Create a white canvas of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Read a pixel; out-of-bounds reads come back white.
    pub fn pixel(&self, x: i64, y: i64) -> Rgb<u8> {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return WHITE;
        }
        *self.image.get_pixel(x as u32, y as u32)
    }

    /// Blend `color` over the existing pixel with the given coverage
    /// (0.0 = keep background, 1.0 = full color). Out-of-bounds is a no-op.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let c = coverage.clamp(0.0, 1.0);
        let bg = self.image.get_pixel_mut(x as u32, y as u32);
        for i in 0..3 {
            bg[i] = (bg[i] as f32 * (1.0 - c) + color[i] as f32 * c).round() as u8;
        }
    }

    /// Blit `src` at `(x, y)`, clipping anything that falls off the canvas.
    pub fn paste(&mut self, src: &RgbImage, x: i64, y: i64) {
        for (sx, sy, px) in src.enumerate_pixels() {
            let dx = x + sx as i64;
            let dy = y + sy as i64;
            if dx < 0 || dy < 0 || dx >= self.width() as i64 || dy >= self.height() as i64 {
                continue;
            }
            self.image.put_pixel(dx as u32, dy as u32, *px);
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Serialize the finished label as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, RotuloError> {
        let mut out = Cursor::new(Vec::new());
        self.image
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| RotuloError::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(out.into_inner())
    }
}

/// Nearest-neighbor rescale. Used for barcode/matrix bitmaps where sharp
/// module edges must survive scaling.
pub fn resize_nearest(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(src, width.max(1), height.max(1), imageops::FilterType::Nearest)
}

//! # Fonts
//!
//! Font discovery, text measurement, glyph drawing, and the shrink-to-fit
//! size search.
//!
//! `FontStore` scans configured directories once at startup and maps
//! `(family, style)` to a file path via the TTF name table. Lookups that
//! miss fail the request; default-font substitution is the caller's policy,
//! applied before the core is invoked. Fonts themselves are loaded fresh
//! per render.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::Rgb;

use crate::canvas::Canvas;
use crate::context::Alignment;
use crate::error::RotuloError;

// ============================================================================
// FONT STORE
// ============================================================================

/// Maps font family → style → file path.
///
/// Built once at startup, read-only afterwards, safe to share across
/// concurrent renders. BTreeMaps keep listing output stable.
#[derive(Debug, Default)]
pub struct FontStore {
    families: BTreeMap<String, BTreeMap<String, PathBuf>>,
}

impl FontStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan directories recursively for `.ttf`/`.otf` files.
    /// Unreadable or unparsable files are skipped with a log line.
    pub fn discover(dirs: &[PathBuf]) -> Self {
        let mut store = Self::new();
        for dir in dirs {
            store.scan_dir(dir);
        }
        store
    }

    fn scan_dir(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("[fonts] cannot read {}: {}", dir.display(), e);
                return;
            }
        };
        // Sort for deterministic discovery regardless of filesystem order
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                self.scan_dir(&path);
                continue;
            }
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            if !matches!(ext.as_deref(), Some("ttf") | Some("otf")) {
                continue;
            }
            match read_font_names(&path) {
                Ok((family, style)) => self.insert(&family, &style, path),
                Err(e) => eprintln!("[fonts] skipping {}: {}", path.display(), e),
            }
        }
    }

    /// Register a font file under an explicit family/style.
    pub fn insert(&mut self, family: &str, style: &str, path: PathBuf) {
        self.families
            .entry(family.to_string())
            .or_default()
            .insert(style.to_string(), path);
    }

    /// Resolve `(family, style)` to a font file.
    ///
    /// A miss is a request-level failure; the core never substitutes a
    /// default here.
    pub fn lookup(&self, family: &str, style: &str) -> Result<&Path, RotuloError> {
        self.families
            .get(family)
            .and_then(|styles| styles.get(style))
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                RotuloError::Lookup(format!("font '{}' ({}) not found", family, style))
            })
    }

    /// All known `(family, [styles...])` pairs, sorted.
    pub fn families(&self) -> Vec<(String, Vec<String>)> {
        self.families
            .iter()
            .map(|(family, styles)| (family.clone(), styles.keys().cloned().collect()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// Read family and subfamily from a font file's name table.
fn read_font_names(path: &Path) -> Result<(String, String), RotuloError> {
    let data = fs::read(path)?;
    let face = ttf_parser::Face::parse(&data, 0)
        .map_err(|e| RotuloError::Lookup(format!("unparsable font: {}", e)))?;

    let name = |id: u16| -> Option<String> {
        let names = face.names();
        (0..names.len())
            .filter_map(|i| names.get(i))
            .filter(|n| n.name_id == id && n.is_unicode())
            .find_map(|n| n.to_string())
    };

    let fallback = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();
    let family = name(ttf_parser::name_id::TYPOGRAPHIC_FAMILY)
        .or_else(|| name(ttf_parser::name_id::FAMILY))
        .unwrap_or(fallback);
    let style = name(ttf_parser::name_id::TYPOGRAPHIC_SUBFAMILY)
        .or_else(|| name(ttf_parser::name_id::SUBFAMILY))
        .unwrap_or_else(|| "Regular".to_string());
    Ok((family, style))
}

/// Load a font file for rendering. Failure fails the request.
pub fn load_font(path: &Path) -> Result<FontVec, RotuloError> {
    let data = fs::read(path)
        .map_err(|e| RotuloError::Lookup(format!("cannot read font {}: {}", path.display(), e)))?;
    FontVec::try_from_vec(data)
        .map_err(|e| RotuloError::Lookup(format!("cannot load font {}: {}", path.display(), e)))
}

// ============================================================================
// MEASUREMENT & DRAWING
// ============================================================================

/// Advance width of a single line at the given pixel size.
fn line_width<F: Font>(font: &F, line: &str, size: u32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size as f32));
    let mut caret = 0.0f32;
    let mut prev = None;
    for ch in line.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, id);
        }
        caret += scaled.h_advance(id);
        prev = Some(id);
    }
    caret
}

/// Vertical advance from one baseline to the next.
fn line_advance<F: Font>(font: &F, size: u32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size as f32));
    scaled.ascent() - scaled.descent() + scaled.line_gap()
}

/// Bounding box of multi-line text at an integer pixel size.
///
/// Deterministic for fixed inputs: width is the widest line's advance,
/// height is the line count times the font's line advance.
pub fn measure_multiline<F: Font>(font: &F, text: &str, size: u32) -> (u32, u32) {
    let lines: Vec<&str> = text.split('\n').collect();
    let width = lines
        .iter()
        .map(|line| line_width(font, line, size))
        .fold(0.0f32, f32::max);
    let height = lines.len() as u32 * line_advance(font, size).ceil() as u32;
    (width.ceil() as u32, height)
}

/// Draw multi-line text into the canvas at `(x, y)` (top-left of the text
/// block) with the given fill color and per-line alignment.
pub fn draw_multiline<F: Font>(
    canvas: &mut Canvas,
    font: &F,
    text: &str,
    size: u32,
    x: i64,
    y: i64,
    fill: Rgb<u8>,
    align: Alignment,
) {
    let scale = PxScale::from(size as f32);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let advance = line_advance(font, size);

    let lines: Vec<&str> = text.split('\n').collect();
    let block_width = lines
        .iter()
        .map(|line| line_width(font, line, size))
        .fold(0.0f32, f32::max);

    for (i, line) in lines.iter().enumerate() {
        let this_width = line_width(font, line, size);
        let indent = match align {
            Alignment::Left => 0.0,
            Alignment::Center => (block_width - this_width) / 2.0,
            Alignment::Right => block_width - this_width,
        };
        let baseline = y as f32 + i as f32 * advance + ascent;

        let mut caret = x as f32 + indent;
        let mut prev = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let dx = px as i64 + bounds.min.x as i64;
                    let dy = py as i64 + bounds.min.y as i64;
                    canvas.blend_pixel(dx, dy, fill, coverage);
                });
            }
        }
    }
}

/// Greedy word wrap at a character-count width, mirroring classic
/// fixed-width template wrapping. Words longer than the width stand alone.
pub fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        lines.push(current);
    }
    lines.join("\n")
}

// ============================================================================
// FONT-FIT SOLVER
// ============================================================================

/// Whether `text` at `size` fits the box once the reserved space is added.
fn font_fits<F: Font>(
    font: &F,
    text: &str,
    size: u32,
    box_w: u32,
    box_h: u32,
    reserved_h: u32,
    reserved_v: u32,
) -> bool {
    let (w, h) = measure_multiline(font, text, size);
    w + reserved_h < box_w && h + reserved_v < box_h
}

/// Largest integer font size in `[min_size, max_size]` whose rendered
/// bounding box (plus reserved space) fits inside `box_w × box_h`.
///
/// Relies on monotonicity: if a size fits, every smaller size fits too.
/// Binary search with a terminal re-validation that decrements the last
/// candidate once when it does not fit, so the result can undershoot
/// `min_size` by exactly one when nothing fits.
pub fn fit_font_size<F: Font>(
    font: &F,
    text: &str,
    box_w: u32,
    box_h: u32,
    min_size: u32,
    max_size: u32,
    reserved_h: u32,
    reserved_v: u32,
) -> u32 {
    if min_size >= max_size || font_fits(font, text, max_size, box_w, box_h, reserved_h, reserved_v)
    {
        return max_size;
    }

    let mut low = min_size;
    let mut high = max_size;
    let mut mid = low;
    while low < high {
        mid = low + (high - low) / 2;
        if font_fits(font, text, mid, box_w, box_h, reserved_h, reserved_v) {
            low = mid + 1;
        } else {
            high = mid;
        }
    }

    if !font_fits(font, text, mid, box_w, box_h, reserved_h, reserved_v) {
        mid = mid.saturating_sub(1);
    }
    mid
}

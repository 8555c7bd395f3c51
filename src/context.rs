//! # Label Context
//!
//! The per-render parameter bag: target dimensions, margins, font, fill
//! color, alignment, orientation, plus an open `extra` map for
//! caller-supplied keys (e.g. `grocycode`, `product`, printer identifiers).
//!
//! The context is logically immutable per render. Structural elements that
//! need to expose additional keys to their descendants clone the context
//! for that branch (copy-on-branch); siblings never see the extension.
//! This is the asymmetry to the payload, which is shared by reference.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::error::RotuloError;
use crate::font::FontStore;
use crate::media;

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    fn parse(s: &str) -> Alignment {
        match s {
            "left" => Alignment::Left,
            "right" => Alignment::Right,
            _ => Alignment::Center,
        }
    }
}

/// Label orientation. Rotated swaps the printable axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Standard,
    Rotated,
}

/// Per-render parameters, visible to every element via the data resolver.
#[derive(Debug, Clone)]
pub struct LabelContext {
    /// Target canvas dimensions in dots. Height 0 means the media is
    /// endless and the template must supply one.
    pub width: u32,
    pub height: u32,
    /// Requested margins in dots. Zero reads as "no request": the
    /// composer then uses the template's margins or its defaults. An
    /// explicit zero margin is expressed on the template, which always
    /// wins.
    pub margin_left: u32,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub font_path: PathBuf,
    pub font_size: u32,
    pub font_family: String,
    pub font_style: String,
    pub fill_color: [u8; 3],
    pub align: Alignment,
    pub orientation: Orientation,
    pub label_size: String,
    /// Open key/value bag: built-in date keys, then caller params.
    pub extra: Map<String, Value>,
}

/// Built-in keys seeded into every context so templates can reference the
/// render date by `key` without the caller passing anything.
fn builtin_extras() -> Map<String, Value> {
    use chrono::Local;

    let now = Local::now();
    let mut extra = Map::new();
    extra.insert("date".into(), json!(now.format("%B %-d, %Y").to_string()));
    extra.insert("iso_date".into(), json!(now.format("%Y-%m-%d").to_string()));
    extra.insert("time".into(), json!(now.format("%H:%M").to_string()));
    extra.insert("year".into(), json!(now.format("%Y").to_string()));
    extra
}

impl LabelContext {
    /// Build a context from flat request parameters (query string or form
    /// fields), the app configuration, and the font store.
    ///
    /// Font resolution happens here — before the core renders — so a bad
    /// family/style fails the request up front. The configured default
    /// font is the *caller's* fallback policy, applied when the request
    /// names no family at all.
    pub fn from_params(
        params: &HashMap<String, String>,
        config: &Config,
        fonts: &FontStore,
    ) -> Result<Self, RotuloError> {
        let (font_family, font_style) = match params.get("font_family") {
            // "Family (Style)" form, as sent by the label designer UI
            Some(spec) => parse_font_spec(spec),
            None => (
                config.default_font_family.clone(),
                config.default_font_style.clone(),
            ),
        };
        let font_path = fonts.lookup(&font_family, &font_style)?.to_path_buf();

        let font_size = parse_num(params, "font_size", config.default_font_size);
        let label_size = params
            .get("label_size")
            .cloned()
            .unwrap_or_else(|| config.default_label_size.clone());

        let (mut width, mut height) = media::dimensions(&label_size)?;
        if height > width {
            std::mem::swap(&mut width, &mut height);
        }
        let orientation = match params.get("orientation").map(String::as_str) {
            Some("rotated") => Orientation::Rotated,
            _ => Orientation::Standard,
        };
        if orientation == Orientation::Rotated {
            std::mem::swap(&mut width, &mut height);
        }

        // Margins are fractions of the font size, given as percentages
        let margin_pct = |key: &str, default: f32| -> u32 {
            let pct = params
                .get(key)
                .and_then(|v| v.parse::<f32>().ok())
                .map(|v| v / 100.0)
                .unwrap_or(default);
            (font_size as f32 * pct) as u32
        };

        let fill_color = if label_size.contains("red") {
            [255, 0, 0]
        } else {
            [0, 0, 0]
        };

        let mut extra = builtin_extras();
        let reserved = [
            "font_family",
            "font_size",
            "label_size",
            "orientation",
            "align",
            "margin_top",
            "margin_bottom",
            "margin_left",
            "margin_right",
        ];
        for (key, value) in params {
            if !reserved.contains(&key.as_str()) {
                extra.insert(key.clone(), Value::String(value.clone()));
            }
        }

        Ok(Self {
            width,
            height,
            margin_top: margin_pct("margin_top", 0.24),
            margin_bottom: margin_pct("margin_bottom", 0.45),
            margin_left: margin_pct("margin_left", 0.35),
            margin_right: margin_pct("margin_right", 0.35),
            font_path,
            font_size,
            font_family,
            font_style,
            fill_color,
            align: Alignment::parse(params.get("align").map(String::as_str).unwrap_or("center")),
            orientation,
            label_size,
            extra,
        })
    }

    /// Look a key up for the data resolver: named fields first, then the
    /// open `extra` bag. Absent keys (and null extras) return `None`.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        match key {
            "width" => Some(json!(self.width)),
            "height" => Some(json!(self.height)),
            "margin_left" => Some(json!(self.margin_left)),
            "margin_top" => Some(json!(self.margin_top)),
            "margin_right" => Some(json!(self.margin_right)),
            "margin_bottom" => Some(json!(self.margin_bottom)),
            "font_size" => Some(json!(self.font_size)),
            "font_family" => Some(json!(self.font_family)),
            "font_style" => Some(json!(self.font_style)),
            "font_path" => Some(json!(self.font_path.display().to_string())),
            "label_size" => Some(json!(self.label_size)),
            _ => self.extra.get(key).filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Add a scoped key. Callers clone the context first so the extension
    /// is only visible to one branch.
    pub fn insert(&mut self, key: &str, value: Value) {
        self.extra.insert(key.to_string(), value);
    }

    /// A minimal context for tests and direct library use: fixed
    /// dimensions, no margin request (the composer's template margins or
    /// defaults apply), black fill, no font store interaction.
    pub fn fixed(width: u32, height: u32, font_path: PathBuf, font_size: u32) -> Self {
        Self {
            width,
            height,
            margin_left: 0,
            margin_top: 0,
            margin_right: 0,
            margin_bottom: 0,
            font_path,
            font_size,
            font_family: String::new(),
            font_style: String::new(),
            fill_color: [0, 0, 0],
            align: Alignment::Left,
            orientation: Orientation::Standard,
            label_size: String::new(),
            extra: builtin_extras(),
        }
    }
}

/// Split `"Family (Style)"` into its parts; a bare family gets style
/// "Regular".
fn parse_font_spec(spec: &str) -> (String, String) {
    match spec.rsplit_once('(') {
        Some((family, style)) => (
            family.trim().to_string(),
            style.trim_end_matches(')').trim().to_string(),
        ),
        None => (spec.trim().to_string(), "Regular".to_string()),
    }
}

fn parse_num(params: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

//! # Label Media
//!
//! Printable dimensions for supported label media, keyed by the size names
//! templates and requests use (e.g. `"62"`, `"29x90"`, `"d24"`).
//!
//! Dimensions are printable dots at 300 dpi. Endless media has height 0:
//! the length along the feed direction is open-ended, so a render needs an
//! explicit height from the template or request context.

use crate::error::RotuloError;

/// Physical category of a label roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Continuous tape, cut to length after printing.
    Endless,
    /// Pre-cut rectangular labels.
    DieCut,
    /// Pre-cut round labels.
    RoundDieCut,
}

/// One supported media size.
#[derive(Debug, Clone, Copy)]
pub struct Media {
    pub name: &'static str,
    pub kind: MediaKind,
    /// Printable (width, height) in dots. Height 0 for endless media.
    pub dots: (u32, u32),
    /// Whether the media supports a red second color.
    pub two_color: bool,
}

use MediaKind::*;

/// All supported media, in catalog order.
pub const MEDIA: &[Media] = &[
    Media { name: "12", kind: Endless, dots: (106, 0), two_color: false },
    Media { name: "29", kind: Endless, dots: (306, 0), two_color: false },
    Media { name: "38", kind: Endless, dots: (413, 0), two_color: false },
    Media { name: "50", kind: Endless, dots: (554, 0), two_color: false },
    Media { name: "54", kind: Endless, dots: (590, 0), two_color: false },
    Media { name: "62", kind: Endless, dots: (696, 0), two_color: false },
    Media { name: "62red", kind: Endless, dots: (696, 0), two_color: true },
    Media { name: "102", kind: Endless, dots: (1164, 0), two_color: false },
    Media { name: "17x54", kind: DieCut, dots: (165, 566), two_color: false },
    Media { name: "17x87", kind: DieCut, dots: (165, 956), two_color: false },
    Media { name: "23x23", kind: DieCut, dots: (202, 202), two_color: false },
    Media { name: "29x42", kind: DieCut, dots: (306, 425), two_color: false },
    Media { name: "29x90", kind: DieCut, dots: (306, 991), two_color: false },
    Media { name: "39x90", kind: DieCut, dots: (413, 991), two_color: false },
    Media { name: "39x48", kind: DieCut, dots: (425, 495), two_color: false },
    Media { name: "52x29", kind: DieCut, dots: (578, 271), two_color: false },
    Media { name: "62x29", kind: DieCut, dots: (696, 271), two_color: false },
    Media { name: "62x100", kind: DieCut, dots: (696, 1109), two_color: false },
    Media { name: "102x51", kind: DieCut, dots: (1164, 526), two_color: false },
    Media { name: "102x152", kind: DieCut, dots: (1164, 1660), two_color: false },
    Media { name: "d12", kind: RoundDieCut, dots: (94, 94), two_color: false },
    Media { name: "d24", kind: RoundDieCut, dots: (236, 236), two_color: false },
    Media { name: "d58", kind: RoundDieCut, dots: (618, 618), two_color: false },
];

/// Find a media entry by size name.
pub fn by_name(name: &str) -> Option<&'static Media> {
    MEDIA.iter().find(|m| m.name == name)
}

/// Printable dimensions for a size name.
///
/// Unknown names are a request-level lookup failure; callers decide the
/// fallback policy before asking the core to render.
pub fn dimensions(name: &str) -> Result<(u32, u32), RotuloError> {
    by_name(name)
        .map(|m| m.dots)
        .ok_or_else(|| RotuloError::Lookup(format!("unknown label size '{}'", name)))
}

/// Size names in catalog order, for discovery endpoints.
pub fn list_names() -> Vec<&'static str> {
    MEDIA.iter().map(|m| m.name).collect()
}

//! # rotulo
//!
//! A template-driven label rendering engine with an HTTP front end.
//!
//! Labels are described as JSON templates: a tree of typed elements (text,
//! QR/barcodes, images, data fetches, reshaping steps) that is walked
//! depth-first onto a single RGB canvas sized for the target label media.
//! Element data flows through one resolver with a fixed precedence
//! (context key, payload key, literal, default), so a template renders the
//! same whether its values come from the request URL, the JSON payload, or
//! the template itself.
//!
//! ## Library use
//!
//! ```no_run
//! use rotulo::{Composer, FontStore, LabelContext, Template};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), rotulo::RotuloError> {
//! let template = Template::from_str(r#"{
//!     "width": 696, "height": 300,
//!     "elements": [{"type": "text", "data": "Hello"}]
//! }"#)?;
//!
//! let composer = Composer::new(FontStore::discover(&[PathBuf::from("/usr/share/fonts")]));
//! let ctx = LabelContext::fixed(696, 300, PathBuf::from("DejaVuSans.ttf"), 40);
//! let mut payload = serde_json::Map::new();
//! let canvas = composer.render_template(&template, &ctx, &mut payload)?;
//! std::fs::write("label.png", canvas.to_png()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Server use
//!
//! `rotulo serve` exposes stored templates over HTTP: `POST
//! /api/template/:name/preview` renders query parameters plus a JSON
//! payload into a PNG; `/print` spools the result for a printer daemon.

pub mod canvas;
pub mod compose;
pub mod config;
pub mod context;
pub mod elements;
pub mod error;
pub mod font;
pub mod media;
pub mod printer;
pub mod resolve;
pub mod server;
pub mod template;

pub use canvas::Canvas;
pub use compose::Composer;
pub use config::Config;
pub use context::{Alignment, LabelContext, Orientation};
pub use elements::{ElementHandler, HandlerRegistry};
pub use error::RotuloError;
pub use font::FontStore;
pub use template::{Element, Payload, Template};

//! # Composition
//!
//! The composer owns the handler registry and the shared services, computes
//! the target label box, and walks the element tree depth-first in document
//! order. It is read-only after construction and safe to share across
//! concurrent renders; all per-render mutable state (canvas, payload)
//! travels through the walk by `&mut`.

use std::time::Duration;

use crate::canvas::Canvas;
use crate::context::LabelContext;
use crate::elements::{Frame, HandlerRegistry};
use crate::error::RotuloError;
use crate::font::FontStore;
use crate::template::{Element, Payload, Template};

/// Template margin defaults, in dots, when neither the template nor the
/// context supplies a value.
const DEFAULT_MARGIN_LEFT: u32 = 15;
const DEFAULT_MARGIN_TOP: u32 = 22;

pub struct Composer {
    registry: HandlerRegistry,
    fonts: FontStore,
    http: reqwest::blocking::Client,
}

impl Composer {
    /// Composer with the built-in handler set and a 30-second HTTP client.
    pub fn new(fonts: FontStore) -> Self {
        Self::with_registry(fonts, HandlerRegistry::with_builtins())
    }

    /// Composer with a caller-assembled registry, for embedders that add
    /// or shadow handlers.
    pub fn with_registry(fonts: FontStore, registry: HandlerRegistry) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            registry,
            fonts,
            http,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn fonts(&self) -> &FontStore {
        &self.fonts
    }

    pub fn http(&self) -> &reqwest::blocking::Client {
        &self.http
    }

    /// Render a template against a context and payload, producing the
    /// finished canvas.
    ///
    /// Dimensions come from the context (media lookup) with template
    /// overrides on top. Endless media reports height 0, so a render on it
    /// needs a height from the template; otherwise the request fails.
    pub fn render_template(
        &self,
        template: &Template,
        ctx: &LabelContext,
        payload: &mut Payload,
    ) -> Result<Canvas, RotuloError> {
        let width = template.width.unwrap_or(ctx.width);
        let height = match template.height {
            Some(h) => h,
            None if ctx.height > 0 => ctx.height,
            None => {
                return Err(RotuloError::Lookup(format!(
                    "label size '{}' is endless; template or request must set a height",
                    ctx.label_size
                )));
            }
        };

        let margin_left = resolve_margin(template.margin_left, ctx.margin_left, DEFAULT_MARGIN_LEFT);
        let margin_top = resolve_margin(template.margin_top, ctx.margin_top, DEFAULT_MARGIN_TOP);
        let frame = Frame {
            width,
            height,
            margin_left,
            margin_top,
            margin_right: resolve_margin(template.margin_right, ctx.margin_right, margin_left),
            margin_bottom: resolve_margin(template.margin_bottom, ctx.margin_bottom, margin_top),
        };

        let mut canvas = Canvas::new(width, height);
        for element in &template.children {
            self.process_element(element, &mut canvas, &frame, payload, ctx)?;
        }
        Ok(canvas)
    }

    /// Process a single element: dispatch, run the handler, degrade soft
    /// failures.
    ///
    /// Unknown kinds are skipped, not failed, so templates written for a
    /// larger handler set still render their known parts. Image and network
    /// errors surface here as typed errors from the handler and degrade to
    /// a logged no-op; everything else fails the render.
    pub fn process_element(
        &self,
        element: &Element,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        let Some(handler) = self.registry.dispatch(element) else {
            eprintln!("[compose] no handler for element type '{}', skipping", element.kind);
            return Ok(());
        };
        match handler.process(element, self, canvas, frame, payload, ctx) {
            Ok(()) => Ok(()),
            Err(e) if e.is_soft() => {
                eprintln!("[compose] element '{}' degraded: {}", element.kind, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Process children in document order. The standard recursion step for
    /// structural handlers.
    pub fn process_children(
        &self,
        children: &[Element],
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError> {
        for child in children {
            self.process_element(child, canvas, frame, payload, ctx)?;
        }
        Ok(())
    }
}

/// Template margin first (including an explicit zero), then the context's
/// request, then the default. A context margin of 0 reads as "no request"
/// — context margins are derived from a font-size percentage, so a real
/// zero is expressed on the template.
fn resolve_margin(template: Option<u32>, context: u32, default: u32) -> u32 {
    match template {
        Some(m) => m,
        None if context > 0 => context,
        None => default,
    }
}

//! # Element Handlers
//!
//! Each template element kind is implemented by a handler registered in a
//! [`HandlerRegistry`]. Dispatch walks the registered handlers in order and
//! picks the first whose predicate matches; elements no handler claims are
//! skipped with a log line, so templates written against a richer handler
//! set degrade instead of failing.
//!
//! Handlers are stateless and constructed without side effects. Shared
//! services (fonts, HTTP client) live on the [`Composer`] passed into
//! `process`, which is also how handlers recurse into their children.

pub mod code;
pub mod fetch;
pub mod image;
pub mod inject;
pub mod passthrough;
pub mod projection;
pub mod reshape;
pub mod text;

use serde_json::Value;

use crate::canvas::Canvas;
use crate::compose::Composer;
use crate::context::LabelContext;
use crate::error::RotuloError;
use crate::template::{Element, Payload};

/// The label box a render is working inside: full canvas dimensions plus
/// the resolved margins. Shared by every element of one render.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub margin_left: u32,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
}

impl Frame {
    /// Top-left corner of the printable area. Element offsets are relative
    /// to this point.
    pub fn origin(&self) -> (i64, i64) {
        (self.margin_left as i64, self.margin_top as i64)
    }
}

/// One element kind's implementation.
pub trait ElementHandler: Send + Sync {
    /// Primary kind tag, used for listings and schema aggregation.
    fn kind(&self) -> &'static str;

    /// Whether this handler claims the element. Defaults to a kind-tag
    /// comparison; handlers covering several kinds override this.
    fn matches(&self, element: &Element) -> bool {
        element.kind == self.kind()
    }

    /// Perform the element's paint or structural step. Handlers with
    /// children recurse through the composer.
    fn process(
        &self,
        element: &Element,
        composer: &Composer,
        canvas: &mut Canvas,
        frame: &Frame,
        payload: &mut Payload,
        ctx: &LabelContext,
    ) -> Result<(), RotuloError>;

    /// Editor descriptor for this kind, if the handler publishes one.
    fn schema_definition(&self) -> Option<Value> {
        None
    }
}

/// Ordered list of handlers. Registration order is the dispatch order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn ElementHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in handlers, registered in lexical module order so the
    /// dispatch order is deterministic and documented.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(code::CodeHandler));
        registry.register(Box::new(fetch::JsonApiHandler));
        registry.register(Box::new(fetch::GrocyApiHandler));
        registry.register(Box::new(fetch::GrocyEntryHandler));
        registry.register(Box::new(image::ImageFileHandler));
        registry.register(Box::new(image::ImageUrlHandler));
        registry.register(Box::new(inject::InjectDataHandler));
        registry.register(Box::new(passthrough::PassthroughHandler));
        registry.register(Box::new(projection::FromJsonPayloadHandler));
        registry.register(Box::new(reshape::DataArrayIndexHandler));
        registry.register(Box::new(reshape::DataDictItemHandler));
        registry.register(Box::new(text::TextHandler));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn ElementHandler>) {
        self.handlers.push(handler);
    }

    /// First registered handler claiming the element, if any.
    pub fn dispatch(&self, element: &Element) -> Option<&dyn ElementHandler> {
        self.handlers
            .iter()
            .map(Box::as_ref)
            .find(|h| h.matches(element))
    }

    /// Registered kind tags in dispatch order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.kind()).collect()
    }

    /// Aggregated editor descriptors from every handler that publishes one.
    pub fn schema(&self) -> Vec<Value> {
        self.handlers
            .iter()
            .filter_map(|h| h.schema_definition())
            .collect()
    }
}

//! # Error Types
//!
//! This module defines error types used throughout the rotulo library.
//!
//! Two families matter to callers: hard failures (`Lookup`, `Encoder`,
//! `Template`) fail the whole render request, while soft failures (`Image`,
//! `Http`) are caught at the handler boundary and degrade the affected
//! branch to a no-op paint.

use thiserror::Error;

/// Main error type for rotulo operations
#[derive(Debug, Error)]
pub enum RotuloError {
    /// Font family/style or media size not found
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Barcode/QR encoder rejected the data
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Malformed template or template contract violation
    #[error("Template error: {0}")]
    Template(String),

    /// Image loading or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Outbound HTTP error (fetch elements, image URLs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RotuloError {
    /// Whether this error degrades a branch to a no-op instead of failing
    /// the render.
    pub fn is_soft(&self) -> bool {
        matches!(self, RotuloError::Image(_) | RotuloError::Http(_))
    }
}

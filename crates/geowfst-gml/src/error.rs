//! Error types for GML encoding and decoding.
//!
//! Structured errors using `thiserror`, so callers can distinguish a geometry
//! that can never be encoded from malformed XML input.

use thiserror::Error;

/// Errors raised while encoding or decoding GML geometry.
#[derive(Debug, Error)]
pub enum GmlError {
    /// The geometry variant has no representation for the requested target
    #[error("Unsupported geometry type: {geometry_type}")]
    UnsupportedGeometryType {
        /// The offending geometry or element name
        geometry_type: String,
    },

    /// Coordinate text could not be interpreted
    #[error("Invalid coordinate text '{text}': {message}")]
    InvalidCoordinates {
        /// The raw coordinate text
        text: String,
        /// Description of the problem
        message: String,
    },

    /// The document structure does not match the GML subset this crate emits
    #[error("Failed to parse GML: {message}")]
    Parse {
        /// Description of the structural problem
        message: String,
    },

    /// XML reader error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML writer error
    #[error("XML write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Type alias for Results using [`GmlError`].
pub type Result<T> = std::result::Result<T, GmlError>;

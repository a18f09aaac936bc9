//! Error types for request building and schema handling.

use thiserror::Error;

/// Errors raised while building WFS-T requests or parsing schemas.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The feature's geometry family cannot satisfy the schema's declared
    /// geometry element. `expected` is the schema's property type name,
    /// for example `gml:MultiSurfacePropertyType`.
    #[error("geometry does not match the feature type schema, expected {expected}")]
    InvalidGeometry { expected: String },

    /// The schema declares a geometry property type outside the GML
    /// vocabulary this client speaks.
    #[error("unsupported schema geometry type '{type_name}'")]
    UnsupportedSchemaGeometry { type_name: String },

    /// The descriptor has no geometry element, so mutations cannot be
    /// built against it.
    #[error("feature type '{type_name}' has no geometry element")]
    MissingGeometryField { type_name: String },

    /// The operation targets a single feature but none was identified.
    #[error("a feature id is required for {operation}")]
    MissingFeatureId { operation: &'static str },

    /// A DescribeFeatureType document could not be read.
    #[error("failed to parse feature type schema: {message}")]
    Schema { message: String },

    /// Geometry encoding failed.
    #[error(transparent)]
    Gml(#[from] geowfst_gml::GmlError),

    /// Low-level XML reading or writing failed.
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    /// The underlying writer failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

//! `geowfst-gml` is the geometry layer of the `geowfst` project: a GML 3.2
//! (and legacy 3.1.1) codec for the geometry shapes a transactional WFS
//! client has to produce and read back.
//!
//! This crate includes:
//! - **Geometry Model**: GeoJSON-flavoured geometry variants with per-node
//!   ids and CRS names, plus features with scalar properties.
//! - **Axis Resolution**: CRS-driven axis-order rules deciding when
//!   coordinates are written latitude first.
//! - **Encoding and Decoding**: streaming GML writers and the matching
//!   round-trip decoder for the emitted subset.
//! - **Reshaping**: widening primitives into the multi containers WFS
//!   schemas declare, and flattening collections back apart.

pub mod axes;
pub mod decode;
pub mod encode;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod wrap;

// Re-export commonly used types
pub use decode::decode_geometry;
pub use encode::{CoordDimension, EncodeOptions, GmlVersion, encode_geometry, write_geometry};
pub use error::{GmlError, Result};
pub use feature::{Feature, Properties, PropertyValue, encode_feature};
pub use geometry::{Coord, Geometry, GeometryKind, Line, Rings};
pub use wrap::{decompose, reshape};

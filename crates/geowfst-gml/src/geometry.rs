//! Geometry model for GML encoding.
//!
//! The shapes mirror what a WFS 2.0 server exchanges: primitives, the
//! homogeneous multi-variants (including the GML `MultiCurve`/`MultiSurface`
//! aggregates), and the heterogeneous `MultiGeometry`. Every variant carries
//! the identifier and `srsName` that end up as attributes on its root element.

use serde::{Deserialize, Serialize};

/// A single position: two horizontal ordinates and an optional elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Coord {
    /// 2D position.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// 3D position.
    #[must_use]
    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A linear ring or line: an ordered coordinate sequence.
pub type Line = Vec<Coord>;

/// Polygon rings. Index 0 is the exterior ring, the rest are holes.
pub type Rings = Vec<Line>;

/// Geometry variants understood by the GML codec.
///
/// `GeometryCollection` is the GeoJSON-style alias of `MultiGeometry`; both
/// encode to `gml:MultiGeometry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        coordinates: Coord,
    },
    LineString {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        coordinates: Line,
    },
    Polygon {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        rings: Rings,
    },
    MultiPoint {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        points: Vec<Coord>,
    },
    MultiLineString {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        lines: Vec<Line>,
    },
    MultiCurve {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        lines: Vec<Line>,
    },
    MultiPolygon {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        polygons: Vec<Rings>,
    },
    MultiSurface {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        polygons: Vec<Rings>,
    },
    MultiGeometry {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        geometries: Vec<Geometry>,
    },
    GeometryCollection {
        #[serde(default)]
        id: String,
        #[serde(default)]
        srs_name: String,
        geometries: Vec<Geometry>,
    },
}

/// Geometry type vocabulary, used for schema compatibility checks and
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiCurve,
    MultiPolygon,
    MultiSurface,
    MultiGeometry,
    GeometryCollection,
}

impl GeometryKind {
    /// Canonical type name, matching the variant name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiCurve => "MultiCurve",
            Self::MultiPolygon => "MultiPolygon",
            Self::MultiSurface => "MultiSurface",
            Self::MultiGeometry => "MultiGeometry",
            Self::GeometryCollection => "GeometryCollection",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Geometry {
    /// The geometry identifier, written as `gml:id` when non-empty.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Point { id, .. }
            | Self::LineString { id, .. }
            | Self::Polygon { id, .. }
            | Self::MultiPoint { id, .. }
            | Self::MultiLineString { id, .. }
            | Self::MultiCurve { id, .. }
            | Self::MultiPolygon { id, .. }
            | Self::MultiSurface { id, .. }
            | Self::MultiGeometry { id, .. }
            | Self::GeometryCollection { id, .. } => id,
        }
    }

    /// The coordinate reference system name, written as `srsName` when
    /// non-empty.
    #[must_use]
    pub fn srs_name(&self) -> &str {
        match self {
            Self::Point { srs_name, .. }
            | Self::LineString { srs_name, .. }
            | Self::Polygon { srs_name, .. }
            | Self::MultiPoint { srs_name, .. }
            | Self::MultiLineString { srs_name, .. }
            | Self::MultiCurve { srs_name, .. }
            | Self::MultiPolygon { srs_name, .. }
            | Self::MultiSurface { srs_name, .. }
            | Self::MultiGeometry { srs_name, .. }
            | Self::GeometryCollection { srs_name, .. } => srs_name,
        }
    }

    /// Replaces the CRS name on this geometry and every nested member.
    pub fn set_srs_name(&mut self, srs: &str) {
        match self {
            Self::Point { srs_name, .. }
            | Self::LineString { srs_name, .. }
            | Self::Polygon { srs_name, .. }
            | Self::MultiPoint { srs_name, .. }
            | Self::MultiLineString { srs_name, .. }
            | Self::MultiCurve { srs_name, .. }
            | Self::MultiPolygon { srs_name, .. }
            | Self::MultiSurface { srs_name, .. } => {
                *srs_name = srs.to_string();
            },
            Self::MultiGeometry {
                srs_name,
                geometries,
                ..
            }
            | Self::GeometryCollection {
                srs_name,
                geometries,
                ..
            } => {
                *srs_name = srs.to_string();
                for geometry in geometries {
                    geometry.set_srs_name(srs);
                }
            },
        }
    }

    /// Replaces the CRS name on the root element only, leaving nested
    /// members untouched.
    pub fn set_root_srs_name(&mut self, srs: &str) {
        match self {
            Self::Point { srs_name, .. }
            | Self::LineString { srs_name, .. }
            | Self::Polygon { srs_name, .. }
            | Self::MultiPoint { srs_name, .. }
            | Self::MultiLineString { srs_name, .. }
            | Self::MultiCurve { srs_name, .. }
            | Self::MultiPolygon { srs_name, .. }
            | Self::MultiSurface { srs_name, .. }
            | Self::MultiGeometry { srs_name, .. }
            | Self::GeometryCollection { srs_name, .. } => {
                *srs_name = srs.to_string();
            },
        }
    }

    /// The variant discriminator.
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point { .. } => GeometryKind::Point,
            Self::LineString { .. } => GeometryKind::LineString,
            Self::Polygon { .. } => GeometryKind::Polygon,
            Self::MultiPoint { .. } => GeometryKind::MultiPoint,
            Self::MultiLineString { .. } => GeometryKind::MultiLineString,
            Self::MultiCurve { .. } => GeometryKind::MultiCurve,
            Self::MultiPolygon { .. } => GeometryKind::MultiPolygon,
            Self::MultiSurface { .. } => GeometryKind::MultiSurface,
            Self::MultiGeometry { .. } => GeometryKind::MultiGeometry,
            Self::GeometryCollection { .. } => GeometryKind::GeometryCollection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_point() -> Geometry {
        Geometry::Point {
            id: "p1".to_string(),
            srs_name: "EPSG:4326".to_string(),
            coordinates: Coord::new(10.0, 20.0),
        }
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(sample_point().kind(), GeometryKind::Point);
        assert_eq!(GeometryKind::MultiSurface.as_str(), "MultiSurface");
    }

    #[test]
    fn set_srs_name_recurses_into_collections() {
        let mut collection = Geometry::MultiGeometry {
            id: String::new(),
            srs_name: "EPSG:4326".to_string(),
            geometries: vec![sample_point()],
        };
        collection.set_srs_name("urn:ogc:def:crs:EPSG:4326");

        assert_eq!(collection.srs_name(), "urn:ogc:def:crs:EPSG:4326");
        let Geometry::MultiGeometry { geometries, .. } = collection else {
            panic!("expected MultiGeometry");
        };
        assert_eq!(geometries[0].srs_name(), "urn:ogc:def:crs:EPSG:4326");
    }

    #[test]
    fn coord_json_omits_missing_elevation() {
        let json = serde_json::to_string(&Coord::new(1.0, 2.0)).expect("serialize");
        assert!(!json.contains("\"z\""));
        let json3d = serde_json::to_string(&Coord::with_z(1.0, 2.0, 3.0)).expect("serialize");
        assert!(json3d.contains("\"z\":3.0"));
    }
}

//! Reshaping geometries to fit a schema's declared geometry element.
//!
//! WFS schemas usually declare multi-valued geometry properties
//! (`gml:MultiSurfacePropertyType` and friends). A client holding a plain
//! `Polygon` must widen it into the multi container before it can be sent.
//! [`reshape`] performs that widening, and [`decompose`] does the reverse
//! flattening used when several geometries are merged into one collection.

use crate::geometry::{Geometry, GeometryKind};

/// Flattens collections and multi geometries into their primitive parts.
///
/// `MultiGeometry` and `GeometryCollection` members are flattened
/// recursively. Coordinate-backed multis split into one primitive per entry;
/// the split parts carry no id or CRS of their own. Primitives pass through
/// unchanged, attributes included.
pub fn decompose(geometries: Vec<Geometry>) -> Vec<Geometry> {
    let mut flattened = Vec::new();
    for geometry in geometries {
        match geometry {
            Geometry::MultiGeometry { geometries, .. }
            | Geometry::GeometryCollection { geometries, .. } => {
                flattened.extend(decompose(geometries));
            },
            Geometry::MultiPoint { points, .. } => {
                flattened.extend(points.into_iter().map(|coordinates| Geometry::Point {
                    id: String::new(),
                    srs_name: String::new(),
                    coordinates,
                }));
            },
            Geometry::MultiLineString { lines, .. } | Geometry::MultiCurve { lines, .. } => {
                flattened.extend(lines.into_iter().map(|coordinates| Geometry::LineString {
                    id: String::new(),
                    srs_name: String::new(),
                    coordinates,
                }));
            },
            Geometry::MultiPolygon { polygons, .. } | Geometry::MultiSurface { polygons, .. } => {
                flattened.extend(polygons.into_iter().map(|rings| Geometry::Polygon {
                    id: String::new(),
                    srs_name: String::new(),
                    rings,
                }));
            },
            primitive => flattened.push(primitive),
        }
    }
    flattened
}

/// Collects the given geometries into a single `MultiGeometry`.
///
/// Inputs are [`decompose`]d first, so nested collections flatten into one
/// level of members. The wrapper takes the first non-empty member CRS and
/// the synthetic id `aMultiGeometry`.
pub fn wrap_into_collection(geometries: Vec<Geometry>) -> Geometry {
    let srs_name = geometries
        .iter()
        .map(Geometry::srs_name)
        .find(|srs| !srs.is_empty())
        .unwrap_or_default()
        .to_string();
    Geometry::MultiGeometry {
        id: "aMultiGeometry".to_string(),
        srs_name,
        geometries: decompose(geometries),
    }
}

/// Renames a `MultiPolygon` into the `MultiSurface` it is spelled as in
/// GML 3.2, keeping id, CRS and coordinates. Anything else passes through.
pub fn retag_multi_polygon(geometry: Geometry) -> Geometry {
    match geometry {
        Geometry::MultiPolygon {
            id,
            srs_name,
            polygons,
        } => Geometry::MultiSurface {
            id,
            srs_name,
            polygons,
        },
        other => other,
    }
}

/// Widens `geometry` so its outer element matches the schema's `target`
/// kind.
///
/// A `MultiGeometry` target absorbs anything by decomposing it into a fresh
/// collection. Multi surface, curve and point targets wrap the matching
/// primitive, giving the wrapper a synthetic id and the primitive's CRS.
/// Every other combination passes through unchanged, after which any
/// `MultiPolygon` is renamed to `MultiSurface` for the wire.
///
/// Compatibility between the input and the target is not checked here;
/// callers validate against the schema before reshaping.
pub fn reshape(geometry: Geometry, target: GeometryKind) -> Geometry {
    let shaped = match (target, geometry) {
        (GeometryKind::MultiGeometry | GeometryKind::GeometryCollection, geometry) => {
            wrap_into_collection(vec![geometry])
        },
        (
            kind @ (GeometryKind::MultiSurface | GeometryKind::MultiPolygon),
            Geometry::Polygon { srs_name, rings, .. },
        ) => {
            let id = "aMultiSurface".to_string();
            let polygons = vec![rings];
            if kind == GeometryKind::MultiSurface {
                Geometry::MultiSurface {
                    id,
                    srs_name,
                    polygons,
                }
            } else {
                Geometry::MultiPolygon {
                    id,
                    srs_name,
                    polygons,
                }
            }
        },
        (
            kind @ (GeometryKind::MultiCurve | GeometryKind::MultiLineString),
            Geometry::LineString {
                srs_name,
                coordinates,
                ..
            },
        ) => {
            let id = "aMultiCurve".to_string();
            let lines = vec![coordinates];
            if kind == GeometryKind::MultiCurve {
                Geometry::MultiCurve {
                    id,
                    srs_name,
                    lines,
                }
            } else {
                Geometry::MultiLineString {
                    id,
                    srs_name,
                    lines,
                }
            }
        },
        (
            GeometryKind::MultiPoint,
            Geometry::Point {
                srs_name,
                coordinates,
                ..
            },
        ) => Geometry::MultiPoint {
            id: "aMultiPoint".to_string(),
            srs_name,
            points: vec![coordinates],
        },
        (_, geometry) => geometry,
    };
    retag_multi_polygon(shaped)
}

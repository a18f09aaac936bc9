//! GeoJSON conversion for features.
//!
//! Lock sessions persist their pending features as GeoJSON strings, and
//! services configured for a JSON output format answer queries with
//! GeoJSON collections; this module maps both onto the crate's feature
//! model.
//!
//! The CRS travels as a `srsName` member on the geometry object, the
//! same extension the service side understands, normalized so `CRS:84`
//! becomes its EPSG URN. GML-only aggregates flatten on the way out
//! (`MultiCurve` becomes a GeoJSON `MultiLineString`, `MultiSurface` a
//! `MultiPolygon`, `MultiGeometry` a `GeometryCollection`); the request
//! builder reshapes them back to whatever the schema declares.
//! Geometry-level GML ids are not carried.

use geojson::feature::Id;
use geojson::{GeoJson, JsonObject, Value};
use serde_json::Value as JsonValue;

use geowfst_gml::axes::normalize_srs_name;
use geowfst_gml::{Coord, Feature, Geometry, Line, Properties, PropertyValue, Rings};

use crate::error::CodecError;

type CodecResult<T> = std::result::Result<T, CodecError>;

/// Converts a geometry into its GeoJSON value, CRS attached.
#[must_use]
pub fn geometry_to_geojson(geometry: &Geometry) -> geojson::Geometry {
    let value = match geometry {
        Geometry::Point { coordinates, .. } => Value::Point(position(coordinates)),
        Geometry::LineString { coordinates, .. } => Value::LineString(positions(coordinates)),
        Geometry::Polygon { rings, .. } => Value::Polygon(ring_positions(rings)),
        Geometry::MultiPoint { points, .. } => Value::MultiPoint(positions(points)),
        Geometry::MultiLineString { lines, .. } | Geometry::MultiCurve { lines, .. } => {
            Value::MultiLineString(lines.iter().map(|line| positions(line)).collect())
        },
        Geometry::MultiPolygon { polygons, .. } | Geometry::MultiSurface { polygons, .. } => {
            Value::MultiPolygon(polygons.iter().map(|rings| ring_positions(rings)).collect())
        },
        Geometry::MultiGeometry { geometries, .. }
        | Geometry::GeometryCollection { geometries, .. } => {
            Value::GeometryCollection(geometries.iter().map(geometry_to_geojson).collect())
        },
    };

    let mut converted = geojson::Geometry::new(value);
    let srs_name = geometry.srs_name();
    if !srs_name.is_empty() {
        let mut members = JsonObject::new();
        members.insert(
            "srsName".to_string(),
            JsonValue::String(normalize_srs_name(srs_name).to_string()),
        );
        converted.foreign_members = Some(members);
    }
    converted
}

/// Reads a GeoJSON geometry back into the crate's model.
///
/// Children of a collection inherit the root's CRS when they do not
/// carry their own.
///
/// # Errors
///
/// Fails on positions with fewer than two ordinates.
pub fn geometry_from_geojson(geometry: &geojson::Geometry) -> CodecResult<Geometry> {
    let srs_name = foreign_srs_name(geometry);
    let mut converted = convert_value(&geometry.value)?;
    if !srs_name.is_empty() {
        inherit_srs(&mut converted, &srs_name);
    }
    Ok(converted)
}

// Fills empty CRS slots top-down without touching members that declared
// their own.
fn inherit_srs(geometry: &mut Geometry, srs: &str) {
    if geometry.srs_name().is_empty() {
        geometry.set_root_srs_name(srs);
    }
    if let Geometry::MultiGeometry { geometries, .. }
    | Geometry::GeometryCollection { geometries, .. } = geometry
    {
        for child in geometries {
            inherit_srs(child, srs);
        }
    }
}

/// Converts a feature into a GeoJSON feature object.
#[must_use]
pub fn feature_to_geojson(feature: &Feature) -> geojson::Feature {
    let mut properties = JsonObject::new();
    for (name, value) in &feature.properties {
        properties.insert(name.clone(), property_to_json(value));
    }
    geojson::Feature {
        bbox: None,
        geometry: feature.geometry.as_ref().map(geometry_to_geojson),
        id: feature.id.clone().map(Id::String),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Reads a GeoJSON feature back into the crate's model.
///
/// # Errors
///
/// Fails when the geometry does not convert.
pub fn feature_from_geojson(feature: &geojson::Feature) -> CodecResult<Feature> {
    let geometry = match &feature.geometry {
        Some(geometry) => Some(geometry_from_geojson(geometry)?),
        None => None,
    };
    let mut properties = Properties::new();
    if let Some(map) = &feature.properties {
        for (name, value) in map {
            properties.insert(name.clone(), property_from_json(value));
        }
    }
    Ok(Feature {
        id: feature.id.as_ref().map(|id| match id {
            Id::String(text) => text.clone(),
            Id::Number(number) => number.to_string(),
        }),
        geometry,
        properties,
    })
}

/// Serializes a feature as a GeoJSON string, the form lock sessions
/// persist.
///
/// # Errors
///
/// Fails only if JSON serialization fails.
pub fn feature_to_json(feature: &Feature) -> CodecResult<String> {
    Ok(serde_json::to_string(&feature_to_geojson(feature))?)
}

/// Parses one GeoJSON feature from text.
///
/// # Errors
///
/// Fails on invalid GeoJSON or a non-feature document.
pub fn feature_from_json(text: &str) -> CodecResult<Feature> {
    match text.parse::<GeoJson>()? {
        GeoJson::Feature(feature) => feature_from_geojson(&feature),
        other => Err(CodecError::UnexpectedValue {
            expected: "Feature",
            found: geojson_kind(&other).to_string(),
        }),
    }
}

/// Parses the features of a GeoJSON document; a bare feature counts as
/// a collection of one.
///
/// # Errors
///
/// Fails on invalid GeoJSON or a bare geometry document.
pub fn features_from_json(text: &str) -> CodecResult<Vec<Feature>> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .iter()
            .map(feature_from_geojson)
            .collect(),
        GeoJson::Feature(feature) => Ok(vec![feature_from_geojson(&feature)?]),
        other @ GeoJson::Geometry(_) => Err(CodecError::UnexpectedValue {
            expected: "FeatureCollection",
            found: geojson_kind(&other).to_string(),
        }),
    }
}

fn convert_value(value: &Value) -> CodecResult<Geometry> {
    Ok(match value {
        Value::Point(point) => Geometry::Point {
            id: String::new(),
            srs_name: String::new(),
            coordinates: coord(point)?,
        },
        Value::LineString(line) => Geometry::LineString {
            id: String::new(),
            srs_name: String::new(),
            coordinates: coords(line)?,
        },
        Value::Polygon(rings) => Geometry::Polygon {
            id: String::new(),
            srs_name: String::new(),
            rings: coord_rings(rings)?,
        },
        Value::MultiPoint(points) => Geometry::MultiPoint {
            id: String::new(),
            srs_name: String::new(),
            points: coords(points)?,
        },
        Value::MultiLineString(lines) => Geometry::MultiLineString {
            id: String::new(),
            srs_name: String::new(),
            lines: lines.iter().map(|line| coords(line)).collect::<CodecResult<_>>()?,
        },
        Value::MultiPolygon(polygons) => Geometry::MultiPolygon {
            id: String::new(),
            srs_name: String::new(),
            polygons: polygons
                .iter()
                .map(|rings| coord_rings(rings))
                .collect::<CodecResult<_>>()?,
        },
        Value::GeometryCollection(geometries) => Geometry::GeometryCollection {
            id: String::new(),
            srs_name: String::new(),
            geometries: geometries
                .iter()
                .map(geometry_from_geojson)
                .collect::<CodecResult<_>>()?,
        },
    })
}

fn position(coord: &Coord) -> Vec<f64> {
    match coord.z {
        Some(z) => vec![coord.x, coord.y, z],
        None => vec![coord.x, coord.y],
    }
}

fn positions(line: &Line) -> Vec<Vec<f64>> {
    line.iter().map(position).collect()
}

fn ring_positions(rings: &Rings) -> Vec<Vec<Vec<f64>>> {
    rings.iter().map(|ring| positions(ring)).collect()
}

fn coord(position: &[f64]) -> CodecResult<Coord> {
    match position {
        [x, y] => Ok(Coord::new(*x, *y)),
        [x, y, z, ..] => Ok(Coord::with_z(*x, *y, *z)),
        short => Err(CodecError::ShortPosition { count: short.len() }),
    }
}

fn coords(positions: &[Vec<f64>]) -> CodecResult<Line> {
    positions.iter().map(|p| coord(p)).collect()
}

fn coord_rings(rings: &[Vec<Vec<f64>>]) -> CodecResult<Rings> {
    rings.iter().map(|ring| coords(ring)).collect()
}

fn property_to_json(value: &PropertyValue) -> JsonValue {
    match value {
        PropertyValue::Null => JsonValue::Null,
        PropertyValue::Boolean(flag) => JsonValue::Bool(*flag),
        PropertyValue::Number(number) => serde_json::Number::from_f64(*number)
            .map_or(JsonValue::Null, JsonValue::Number),
        PropertyValue::String(text) => JsonValue::String(text.clone()),
    }
}

fn property_from_json(value: &JsonValue) -> PropertyValue {
    match value {
        JsonValue::Null => PropertyValue::Null,
        JsonValue::Bool(flag) => PropertyValue::Boolean(*flag),
        JsonValue::Number(number) => PropertyValue::Number(number.as_f64().unwrap_or(0.0)),
        JsonValue::String(text) => PropertyValue::String(text.clone()),
        // Arrays and objects flatten to their JSON text.
        other => PropertyValue::String(other.to_string()),
    }
}

fn foreign_srs_name(geometry: &geojson::Geometry) -> String {
    geometry
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("srsName"))
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}

fn geojson_kind(value: &GeoJson) -> &'static str {
    match value {
        GeoJson::Geometry(_) => "Geometry",
        GeoJson::Feature(_) => "Feature",
        GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}

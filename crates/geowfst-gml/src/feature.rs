//! Features: a geometry plus scalar properties, and their GML rendering.

use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};

use crate::encode::{EncodeOptions, into_document_string, write_geometry};
use crate::error::Result;
use crate::geometry::Geometry;

/// A scalar property value as it appears in feature JSON.
///
/// The variants mirror the JSON value space the WFS schemas map onto:
/// nulls, booleans, numbers and strings. Anything richer is flattened to
/// text before it reaches the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl PropertyValue {
    /// The text form written into XML elements. `Null` becomes the empty
    /// string.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Null => String::new(),
            PropertyValue::Boolean(value) => value.to_string(),
            PropertyValue::Number(value) => value.to_string(),
            PropertyValue::String(value) => value.clone(),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

/// Property map of a feature, ordered by name for stable output.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A vector feature: optional id, optional geometry, scalar properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// Encodes a feature as a standalone `gml:Feature` fragment.
///
/// Properties are written first as `gml:`-prefixed elements in name order,
/// every property included, then the geometry inside an unqualified
/// `<geometry>` wrapper. The root carries the feature id as `gml:id` when
/// one is set, and the `gml` namespace for the selected version.
///
/// # Errors
///
/// Fails only if the geometry cannot be encoded or the writer errors.
pub fn encode_feature(feature: &Feature, options: &EncodeOptions) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_feature(&mut writer, feature, options)?;
    into_document_string(writer.into_inner())
}

/// Streams a feature into an existing writer. See [`encode_feature`].
pub fn write_feature<W: Write>(
    writer: &mut Writer<W>,
    feature: &Feature,
    options: &EncodeOptions,
) -> Result<()> {
    let mut root = BytesStart::new("gml:Feature");
    if let Some(id) = &feature.id {
        root.push_attribute(("gml:id", id.as_str()));
    }
    root.push_attribute(("xmlns:gml", options.version.namespace()));
    writer.write_event(Event::Start(root))?;

    for (name, value) in &feature.properties {
        let tag = format!("gml:{name}");
        writer.write_event(Event::Start(BytesStart::new(tag.as_str())))?;
        writer.write_event(Event::Text(BytesText::new(&value.as_text())))?;
        writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
    }

    if let Some(geometry) = &feature.geometry {
        writer.write_event(Event::Start(BytesStart::new("geometry")))?;
        write_geometry(writer, geometry, options)?;
        writer.write_event(Event::End(BytesEnd::new("geometry")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("gml:Feature")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coord;

    #[test]
    fn property_value_text_forms() {
        assert_eq!(PropertyValue::Null.as_text(), "");
        assert_eq!(PropertyValue::from(true).as_text(), "true");
        assert_eq!(PropertyValue::from(82.0).as_text(), "82");
        assert_eq!(PropertyValue::from(1.5).as_text(), "1.5");
        assert_eq!(PropertyValue::from("Alabama").as_text(), "Alabama");
    }

    #[test]
    fn feature_round_trips_through_json() {
        let mut feature = Feature::with_id("states.1");
        feature.geometry = Some(Geometry::Point {
            id: String::new(),
            srs_name: "EPSG:4326".to_string(),
            coordinates: Coord::new(1.0, 2.0),
        });
        feature
            .properties
            .insert("STATE_NAME".to_string(), "Alabama".into());
        feature
            .properties
            .insert("SUB_REGION".to_string(), PropertyValue::Null);

        let json = serde_json::to_string(&feature).expect("serialize");
        let parsed: Feature = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, feature);
    }

    #[test]
    fn encodes_properties_then_geometry() {
        let mut feature = Feature::with_id("states.1");
        feature.geometry = Some(Geometry::Point {
            id: String::new(),
            srs_name: String::new(),
            coordinates: Coord::new(1.0, 2.0),
        });
        feature
            .properties
            .insert("STATE_NAME".to_string(), "Alabama".into());

        let gml = encode_feature(&feature, &EncodeOptions::default()).expect("encode");
        assert_eq!(
            gml,
            "<gml:Feature gml:id=\"states.1\" xmlns:gml=\"http://www.opengis.net/gml/3.2\">\
             <gml:STATE_NAME>Alabama</gml:STATE_NAME>\
             <geometry><gml:Point><gml:pos>1 2</gml:pos></gml:Point></geometry>\
             </gml:Feature>"
        );
    }

    #[test]
    fn every_property_is_written_in_name_order() {
        let mut feature = Feature::new();
        feature.properties.insert("zone".to_string(), 4.0.into());
        feature.properties.insert("area".to_string(), PropertyValue::Null);
        feature.properties.insert("name".to_string(), "x".into());

        let gml = encode_feature(&feature, &EncodeOptions::default()).expect("encode");
        let area = gml.find("<gml:area>").expect("area element");
        let name = gml.find("<gml:name>").expect("name element");
        let zone = gml.find("<gml:zone>").expect("zone element");
        assert!(area < name && name < zone);
        assert!(gml.contains("<gml:area></gml:area>"));
    }

    #[test]
    fn feature_without_geometry_skips_the_wrapper() {
        let feature = Feature::with_id("f1");
        let gml = encode_feature(&feature, &EncodeOptions::default()).expect("encode");
        assert!(!gml.contains("<geometry>"));
    }
}

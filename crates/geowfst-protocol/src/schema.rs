//! DescribeFeatureType introspection.
//!
//! A WFS advertises each feature type as an XML Schema: a complex type
//! extending `gml:AbstractFeatureType` whose sequence lists the geometry
//! element and the scalar properties. [`FeatureTypeDescriptor::parse`]
//! reduces such a document to the template the request builders validate
//! and coerce features against.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use serde::{Deserialize, Serialize};

use geowfst_gml::geometry::GeometryKind;
use geowfst_gml::{Properties, PropertyValue};

use crate::error::{ProtocolError, Result};

const XML_SCHEMA_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Scalar value space a schema property maps onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    /// Unrecognized XSD type, treated as a string downstream.
    Unknown,
}

impl ScalarType {
    /// Maps a prefixed XSD type name (`xsd:string`, `xsd:int`, ...) to its
    /// scalar category.
    #[must_use]
    pub fn from_xsd(type_name: &str) -> Self {
        match type_name {
            "xsd:string" | "xsd:duration" | "xsd:dateTime" | "xsd:time" | "xsd:date"
            | "xsd:gYearMonth" | "xsd:gMonthDay" | "xsd:gDay" | "xsd:gMonth" | "xsd:hexBinary"
            | "xsd:base64Binary" | "xsd:anyURI" | "xsd:QName" | "xsd:NOTATION" => {
                ScalarType::String
            },
            "xsd:decimal" | "xsd:float" | "xsd:double" | "xsd:int" | "xsd:integer"
            | "xsd:gYear" | "xsd:nonPositiveInteger" | "xsd:negativeInteger" | "xsd:long"
            | "xsd:short" | "xsd:byte" | "xsd:nonNegativeInteger" | "xsd:unsignedLong"
            | "xsd:unsignedInt" | "xsd:unsignedShort" | "xsd:unsignedByte"
            | "xsd:positiveInteger" => ScalarType::Number,
            "xsd:boolean" => ScalarType::Boolean,
            _ => ScalarType::Unknown,
        }
    }

    /// The default value a property of this type starts from.
    #[must_use]
    pub fn zero(self) -> PropertyValue {
        match self {
            ScalarType::String | ScalarType::Unknown => PropertyValue::String(String::new()),
            ScalarType::Number => PropertyValue::Number(0.0),
            ScalarType::Boolean => PropertyValue::Boolean(false),
        }
    }
}

/// Geometry shapes a schema can declare for its geometry element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaGeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiCurve,
    MultiPolygon,
    MultiSurface,
    /// `gml:GeometryPropertyType`, accepts anything and forces no shape.
    Geometry,
    /// `gml:MultiGeometryPropertyType`, accepts anything collected into
    /// one `MultiGeometry`.
    MultiGeometry,
}

impl SchemaGeometryType {
    /// Resolves a `gml:...PropertyType` name. Unknown names yield `None`.
    #[must_use]
    pub fn from_property_type(type_name: &str) -> Option<Self> {
        match type_name {
            "gml:PointPropertyType" => Some(SchemaGeometryType::Point),
            "gml:LineStringPropertyType" => Some(SchemaGeometryType::LineString),
            "gml:PolygonPropertyType" => Some(SchemaGeometryType::Polygon),
            "gml:MultiPointPropertyType" => Some(SchemaGeometryType::MultiPoint),
            "gml:MultiLineStringPropertyType" => Some(SchemaGeometryType::MultiLineString),
            "gml:MultiCurvePropertyType" => Some(SchemaGeometryType::MultiCurve),
            "gml:MultiPolygonPropertyType" => Some(SchemaGeometryType::MultiPolygon),
            "gml:MultiSurfacePropertyType" => Some(SchemaGeometryType::MultiSurface),
            "gml:GeometryPropertyType" => Some(SchemaGeometryType::Geometry),
            "gml:MultiGeometryPropertyType" => Some(SchemaGeometryType::MultiGeometry),
            _ => None,
        }
    }

    /// The reshaping target for this schema type. The generic `Geometry`
    /// type imposes no shape.
    #[must_use]
    pub fn target_kind(self) -> Option<GeometryKind> {
        match self {
            SchemaGeometryType::Point => Some(GeometryKind::Point),
            SchemaGeometryType::LineString => Some(GeometryKind::LineString),
            SchemaGeometryType::Polygon => Some(GeometryKind::Polygon),
            SchemaGeometryType::MultiPoint => Some(GeometryKind::MultiPoint),
            SchemaGeometryType::MultiLineString => Some(GeometryKind::MultiLineString),
            SchemaGeometryType::MultiCurve => Some(GeometryKind::MultiCurve),
            SchemaGeometryType::MultiPolygon => Some(GeometryKind::MultiPolygon),
            SchemaGeometryType::MultiSurface => Some(GeometryKind::MultiSurface),
            SchemaGeometryType::MultiGeometry => Some(GeometryKind::MultiGeometry),
            SchemaGeometryType::Geometry => None,
        }
    }

    /// Whether a feature geometry of the given kind can be sent into this
    /// schema type, possibly after widening.
    ///
    /// A primitive fits its own multi container; the generic `Geometry`
    /// and `MultiGeometry` types absorb everything; a multi never narrows
    /// back into a primitive.
    #[must_use]
    pub fn accepts(self, kind: GeometryKind) -> bool {
        use GeometryKind as K;
        match self {
            SchemaGeometryType::Geometry | SchemaGeometryType::MultiGeometry => true,
            SchemaGeometryType::Point => matches!(kind, K::Point),
            SchemaGeometryType::MultiPoint => matches!(kind, K::Point | K::MultiPoint),
            SchemaGeometryType::LineString => matches!(kind, K::LineString),
            SchemaGeometryType::MultiLineString | SchemaGeometryType::MultiCurve => {
                matches!(kind, K::LineString | K::MultiLineString | K::MultiCurve)
            },
            SchemaGeometryType::Polygon => matches!(kind, K::Polygon),
            SchemaGeometryType::MultiPolygon | SchemaGeometryType::MultiSurface => {
                matches!(kind, K::Polygon | K::MultiPolygon | K::MultiSurface)
            },
        }
    }
}

/// A scalar property element from the schema's sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyField {
    pub name: String,
    /// Prefixed XSD type name, for example `xsd:string`.
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_occurs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_group: Option<String>,
}

impl PropertyField {
    #[must_use]
    pub fn scalar(&self) -> ScalarType {
        ScalarType::from_xsd(&self.type_name)
    }
}

/// The geometry element from the schema's sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryField {
    pub name: String,
    /// Prefixed GML property type name, for example
    /// `gml:MultiSurfacePropertyType`.
    pub type_name: String,
}

impl GeometryField {
    #[must_use]
    pub fn geometry_type(&self) -> Option<SchemaGeometryType> {
        SchemaGeometryType::from_property_type(&self.type_name)
    }
}

/// The top-level element substituting `gml:AbstractFeature`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureElement {
    pub name: String,
    pub type_name: String,
}

/// Parsed template for one remote feature type.
///
/// Built once per feature type from a DescribeFeatureType response and
/// never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTypeDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryField>,
    #[serde(default)]
    pub properties: Vec<PropertyField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<FeatureElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_prefix: Option<String>,
}

impl FeatureTypeDescriptor {
    /// Parses a DescribeFeatureType document.
    ///
    /// The descriptor comes from the first extension of
    /// `gml:AbstractFeatureType`: elements in its sequence typed `gml:*`
    /// become the geometry field (first wins), elements typed `xsd:*`
    /// become scalar properties. A document without such an extension
    /// parses into an empty descriptor rather than failing; callers treat
    /// a missing geometry field as "not usable for mutation".
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Schema`] only for malformed XML.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        let mut descriptor = FeatureTypeDescriptor::default();

        let mut saw_root = false;
        let mut in_extension = false;
        let mut extension_done = false;
        let mut in_sequence = false;
        let mut sequence_done = false;

        loop {
            match reader
                .read_resolved_event()
                .map_err(|e| ProtocolError::Schema {
                    message: e.to_string(),
                })? {
                (resolve, Event::Start(e)) => {
                    let schema_ns = is_schema_ns(&resolve);
                    if !saw_root {
                        saw_root = true;
                        descriptor.target_namespace = attr_value(&e, b"targetNamespace")?;
                        continue;
                    }
                    if schema_ns && e.local_name().as_ref() == b"extension" {
                        if !in_extension
                            && !extension_done
                            && attr_value(&e, b"base")?.as_deref()
                                == Some("gml:AbstractFeatureType")
                        {
                            in_extension = true;
                        }
                        continue;
                    }
                    if schema_ns && e.local_name().as_ref() == b"sequence" {
                        if in_extension && !sequence_done {
                            in_sequence = true;
                        }
                        continue;
                    }
                    if schema_ns && e.local_name().as_ref() == b"element" {
                        collect_element(&mut descriptor, &e, in_sequence)?;
                    }
                },
                (resolve, Event::Empty(e)) => {
                    if !saw_root {
                        saw_root = true;
                        descriptor.target_namespace = attr_value(&e, b"targetNamespace")?;
                        continue;
                    }
                    if is_schema_ns(&resolve) && e.local_name().as_ref() == b"element" {
                        collect_element(&mut descriptor, &e, in_sequence)?;
                    }
                },
                (resolve, Event::End(e)) => {
                    if is_schema_ns(&resolve) {
                        match e.local_name().as_ref() {
                            b"sequence" if in_sequence => {
                                in_sequence = false;
                                sequence_done = true;
                            },
                            b"extension" if in_extension => {
                                in_extension = false;
                                extension_done = true;
                            },
                            _ => {},
                        }
                    }
                },
                (_, Event::Eof) => break,
                _ => {},
            }
        }

        descriptor.namespace_prefix = descriptor
            .feature
            .as_ref()
            .and_then(|feature| feature.type_name.split(':').next())
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string);
        Ok(descriptor)
    }

    /// Whether the schema declared a geometry element. Without one the
    /// feature type cannot be mutated.
    #[must_use]
    pub fn supports_mutation(&self) -> bool {
        self.geometry.is_some()
    }

    /// Looks up a declared property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyField> {
        self.properties.iter().find(|field| field.name == name)
    }
}

fn collect_element(
    descriptor: &mut FeatureTypeDescriptor,
    e: &BytesStart<'_>,
    in_sequence: bool,
) -> Result<()> {
    let name = attr_value(e, b"name")?;
    let type_name = attr_value(e, b"type")?;
    let substitution_group = attr_value(e, b"substitutionGroup")?;

    if substitution_group.as_deref() == Some("gml:AbstractFeature") && descriptor.feature.is_none()
    {
        if let (Some(name), Some(type_name)) = (name.clone(), type_name.clone()) {
            descriptor.feature = Some(FeatureElement { name, type_name });
        }
    }

    if !in_sequence {
        return Ok(());
    }
    let (Some(name), Some(type_name)) = (name, type_name) else {
        return Ok(());
    };

    if type_name.starts_with("gml:") {
        if descriptor.geometry.is_none() {
            descriptor.geometry = Some(GeometryField { name, type_name });
        }
    } else if type_name.starts_with("xsd:") {
        let min_occurs = attr_value(e, b"minOccurs")?.and_then(|value| value.parse().ok());
        descriptor.properties.push(PropertyField {
            name,
            type_name,
            min_occurs,
            substitution_group,
        });
    }
    Ok(())
}

fn is_schema_ns(resolve: &ResolveResult<'_>) -> bool {
    matches!(resolve, ResolveResult::Bound(ns) if ns.as_ref() == XML_SCHEMA_NS.as_bytes())
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ProtocolError::Schema {
            message: format!("bad attribute: {err}"),
        })?;
        if attr.key.as_ref() == name {
            let raw = String::from_utf8_lossy(&attr.value);
            let value = quick_xml::escape::unescape(&raw).map_err(|err| ProtocolError::Schema {
                message: format!("bad attribute value: {err}"),
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Result of forcing a feature's properties into the schema template.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardizedProperties {
    pub properties: Properties,
    /// False when a declared property was missing from the input; the
    /// record is incomplete and should not be submitted silently.
    pub valid: bool,
}

/// Coerces the input properties onto the schema's declared set.
///
/// Every declared property appears in the output, starting from its type's
/// zero value. Input values present under a declared name are coerced to
/// the declared scalar type; input keys the schema does not declare are
/// dropped. A declared property absent from the input, or an entirely
/// empty input, marks the result invalid.
#[must_use]
pub fn standardize_properties(
    descriptor: &FeatureTypeDescriptor,
    input: &Properties,
) -> StandardizedProperties {
    let mut properties = Properties::new();
    for field in &descriptor.properties {
        properties.insert(field.name.clone(), field.scalar().zero());
    }

    if input.is_empty() {
        return StandardizedProperties {
            properties,
            valid: false,
        };
    }

    let mut valid = true;
    for field in &descriptor.properties {
        match input.get(&field.name) {
            Some(value) => {
                properties.insert(field.name.clone(), coerce(value, field.scalar()));
            },
            None => valid = false,
        }
    }
    StandardizedProperties { properties, valid }
}

fn coerce(value: &PropertyValue, scalar: ScalarType) -> PropertyValue {
    match scalar {
        ScalarType::String | ScalarType::Unknown => PropertyValue::String(value.as_text()),
        ScalarType::Number => PropertyValue::Number(to_number(value)),
        ScalarType::Boolean => PropertyValue::Boolean(to_truthy(value)),
    }
}

fn to_number(value: &PropertyValue) -> f64 {
    match value {
        PropertyValue::Null => 0.0,
        PropertyValue::Boolean(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        },
        PropertyValue::Number(number) => *number,
        PropertyValue::String(text) => text.trim().parse().unwrap_or(0.0),
    }
}

fn to_truthy(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Null => false,
        PropertyValue::Boolean(flag) => *flag,
        PropertyValue::Number(number) => *number != 0.0 && !number.is_nan(),
        PropertyValue::String(text) => !text.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:gml="http://www.opengis.net/gml/3.2"
            xmlns:topp="http://www.openplans.org/topp"
            xmlns:xsd="http://www.w3.org/2001/XMLSchema"
            elementFormDefault="qualified"
            targetNamespace="http://www.openplans.org/topp">
  <xsd:import namespace="http://www.opengis.net/gml/3.2"
              schemaLocation="http://localhost:8080/geoserver/schemas/gml/3.2.1/gml.xsd"/>
  <xsd:complexType name="statesType">
    <xsd:complexContent>
      <xsd:extension base="gml:AbstractFeatureType">
        <xsd:sequence>
          <xsd:element maxOccurs="1" minOccurs="0" name="the_geom" nillable="true" type="gml:MultiSurfacePropertyType"/>
          <xsd:element maxOccurs="1" minOccurs="0" name="STATE_NAME" nillable="true" type="xsd:string"/>
          <xsd:element maxOccurs="1" minOccurs="0" name="PERSONS" nillable="true" type="xsd:int"/>
        </xsd:sequence>
      </xsd:extension>
    </xsd:complexContent>
  </xsd:complexType>
  <xsd:element name="states" substitutionGroup="gml:AbstractFeature" type="topp:statesType"/>
</xsd:schema>"#;

    fn states_descriptor() -> FeatureTypeDescriptor {
        FeatureTypeDescriptor::parse(STATES_SCHEMA).expect("parse")
    }

    #[test]
    fn parses_a_geoserver_feature_schema() {
        let descriptor = states_descriptor();

        let geometry = descriptor.geometry.as_ref().expect("geometry field");
        assert_eq!(geometry.name, "the_geom");
        assert_eq!(geometry.type_name, "gml:MultiSurfacePropertyType");
        assert_eq!(
            geometry.geometry_type(),
            Some(SchemaGeometryType::MultiSurface)
        );

        assert_eq!(descriptor.properties.len(), 2);
        assert_eq!(descriptor.properties[0].name, "STATE_NAME");
        assert_eq!(descriptor.properties[0].scalar(), ScalarType::String);
        assert_eq!(descriptor.properties[1].name, "PERSONS");
        assert_eq!(descriptor.properties[1].scalar(), ScalarType::Number);
        assert_eq!(descriptor.properties[1].min_occurs, Some(0));

        let feature = descriptor.feature.as_ref().expect("feature element");
        assert_eq!(feature.name, "states");
        assert_eq!(feature.type_name, "topp:statesType");

        assert_eq!(
            descriptor.target_namespace.as_deref(),
            Some("http://www.openplans.org/topp")
        );
        assert_eq!(descriptor.namespace_prefix.as_deref(), Some("topp"));
        assert!(descriptor.supports_mutation());
    }

    #[test]
    fn schema_without_feature_extension_yields_an_empty_descriptor() {
        let xml = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                                 targetNamespace="http://example.com/ns">
            <xsd:element name="plain" type="xsd:string"/>
        </xsd:schema>"#;
        let descriptor = FeatureTypeDescriptor::parse(xml).expect("parse");
        assert!(descriptor.geometry.is_none());
        assert!(descriptor.properties.is_empty());
        assert_eq!(
            descriptor.target_namespace.as_deref(),
            Some("http://example.com/ns")
        );
        assert!(!descriptor.supports_mutation());
    }

    #[test]
    fn only_the_first_extension_contributes_fields() {
        let xml = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
          <xsd:complexType name="aType">
            <xsd:complexContent>
              <xsd:extension base="gml:AbstractFeatureType">
                <xsd:sequence>
                  <xsd:element name="geom" type="gml:PointPropertyType"/>
                  <xsd:element name="first" type="xsd:string"/>
                </xsd:sequence>
              </xsd:extension>
            </xsd:complexContent>
          </xsd:complexType>
          <xsd:complexType name="bType">
            <xsd:complexContent>
              <xsd:extension base="gml:AbstractFeatureType">
                <xsd:sequence>
                  <xsd:element name="second" type="xsd:string"/>
                </xsd:sequence>
              </xsd:extension>
            </xsd:complexContent>
          </xsd:complexType>
        </xsd:schema>"#;
        let descriptor = FeatureTypeDescriptor::parse(xml).expect("parse");
        assert_eq!(descriptor.geometry.as_ref().map(|g| g.name.as_str()), Some("geom"));
        assert_eq!(descriptor.properties.len(), 1);
        assert_eq!(descriptor.properties[0].name, "first");
    }

    #[test]
    fn xsd_scalar_table() {
        assert_eq!(ScalarType::from_xsd("xsd:string"), ScalarType::String);
        assert_eq!(ScalarType::from_xsd("xsd:dateTime"), ScalarType::String);
        assert_eq!(ScalarType::from_xsd("xsd:anyURI"), ScalarType::String);
        assert_eq!(ScalarType::from_xsd("xsd:int"), ScalarType::Number);
        assert_eq!(ScalarType::from_xsd("xsd:double"), ScalarType::Number);
        assert_eq!(ScalarType::from_xsd("xsd:gYear"), ScalarType::Number);
        assert_eq!(ScalarType::from_xsd("xsd:unsignedByte"), ScalarType::Number);
        assert_eq!(ScalarType::from_xsd("xsd:boolean"), ScalarType::Boolean);
        assert_eq!(ScalarType::from_xsd("xsd:madeUp"), ScalarType::Unknown);
        assert_eq!(ScalarType::Unknown.zero(), PropertyValue::String(String::new()));
    }

    #[test]
    fn geometry_compatibility_matrix() {
        use GeometryKind as K;
        assert!(SchemaGeometryType::MultiSurface.accepts(K::Polygon));
        assert!(!SchemaGeometryType::Polygon.accepts(K::Point));
        assert!(SchemaGeometryType::Geometry.accepts(K::GeometryCollection));
        assert!(SchemaGeometryType::MultiGeometry.accepts(K::Point));
        assert!(SchemaGeometryType::MultiCurve.accepts(K::MultiLineString));
        assert!(SchemaGeometryType::MultiPolygon.accepts(K::MultiSurface));
        assert!(!SchemaGeometryType::MultiPoint.accepts(K::LineString));
        assert!(!SchemaGeometryType::Point.accepts(K::MultiPoint));
    }

    #[test]
    fn standardize_defaults_missing_properties_and_flags_the_record() {
        let descriptor = states_descriptor();
        let mut input = Properties::new();
        input.insert("STATE_NAME".to_string(), "Alabama".into());

        let result = standardize_properties(&descriptor, &input);
        assert!(!result.valid);
        assert_eq!(
            result.properties.get("PERSONS"),
            Some(&PropertyValue::Number(0.0))
        );
        assert_eq!(
            result.properties.get("STATE_NAME"),
            Some(&PropertyValue::String("Alabama".to_string()))
        );
    }

    #[test]
    fn standardize_coerces_values_to_declared_types() {
        let descriptor = states_descriptor();
        let mut input = Properties::new();
        input.insert("STATE_NAME".to_string(), PropertyValue::Number(7.0));
        input.insert("PERSONS".to_string(), "4040587".into());

        let result = standardize_properties(&descriptor, &input);
        assert!(result.valid);
        assert_eq!(
            result.properties.get("STATE_NAME"),
            Some(&PropertyValue::String("7".to_string()))
        );
        assert_eq!(
            result.properties.get("PERSONS"),
            Some(&PropertyValue::Number(4_040_587.0))
        );
    }

    #[test]
    fn standardize_rejects_an_empty_input() {
        let descriptor = states_descriptor();
        let result = standardize_properties(&descriptor, &Properties::new());
        assert!(!result.valid);
        assert_eq!(result.properties.len(), 2);
    }

    #[test]
    fn standardize_drops_undeclared_properties() {
        let descriptor = states_descriptor();
        let mut input = Properties::new();
        input.insert("STATE_NAME".to_string(), "Utah".into());
        input.insert("PERSONS".to_string(), PropertyValue::Number(1.0));
        input.insert("UNRELATED".to_string(), "x".into());

        let result = standardize_properties(&descriptor, &input);
        assert!(result.valid);
        assert!(!result.properties.contains_key("UNRELATED"));
    }

    #[test]
    fn non_numeric_text_coerces_to_zero() {
        let descriptor = states_descriptor();
        let mut input = Properties::new();
        input.insert("STATE_NAME".to_string(), "x".into());
        input.insert("PERSONS".to_string(), "not a number".into());

        let result = standardize_properties(&descriptor, &input);
        assert_eq!(
            result.properties.get("PERSONS"),
            Some(&PropertyValue::Number(0.0))
        );
    }
}

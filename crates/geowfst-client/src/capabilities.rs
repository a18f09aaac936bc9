//! Extraction from a `WFS_Capabilities` document.
//!
//! The client needs four things out of a capabilities response: the
//! effective GET/POST endpoints of `GetFeature`, the advertised WFS-T
//! operations with their POST endpoints and declared formats, the
//! feature-type catalog, and enough format information to pick an output
//! format. Everything else in the document is ignored.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use serde::{Deserialize, Serialize};

use geowfst_protocol::{DEFAULT_OUTPUT_FORMAT, ProtocolError, WFS_VERSION};

use crate::error::Result;

/// Namespace family of the OWS common vocabulary, any version.
const OWS_FAMILY: &str = "http://www.opengis.net/ows";
/// Namespace family of the WFS vocabulary, any version.
const WFS_FAMILY: &str = "http://www.opengis.net/wfs";

/// Preferred JSON output format.
pub const JSON_OUTPUT_FORMAT: &str = "application/json";
/// Default GML output format for WFS 1.x services.
pub const GML311_OUTPUT_FORMAT: &str = "text/xml; subtype=gml/3.1.1";

/// One advertised WFS-T operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WfstOperation {
    pub name: String,
    /// POST endpoint from the operation's first DCP entry.
    pub post: Option<String>,
    /// Allowed values of the operation's first parameter.
    pub formats: Vec<String>,
}

/// The transactional operations a service advertises.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WfstOperations {
    pub lock_feature: Option<WfstOperation>,
    pub transaction: Option<WfstOperation>,
    pub get_feature_with_lock: Option<WfstOperation>,
}

impl WfstOperations {
    /// A service is transaction capable when it advertises `Transaction`.
    #[must_use]
    pub fn transaction_capable(&self) -> bool {
        self.transaction.is_some()
    }
}

/// One entry of the feature-type catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTypeEntry {
    pub name: String,
    pub title: Option<String>,
    pub default_crs: Option<String>,
    pub other_crs: Vec<String>,
    /// Per-type output formats; often empty, the service-wide defaults
    /// then apply.
    pub output_formats: Vec<String>,
}

/// What the client keeps from a capabilities document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCapabilities {
    pub version: String,
    /// `GetFeature` GET endpoint, trailing `?` stripped.
    pub get_feature_get: Option<String>,
    /// `GetFeature` POST endpoint, trailing `?` stripped.
    pub get_feature_post: Option<String>,
    pub feature_types: Vec<FeatureTypeEntry>,
    pub operations: WfstOperations,
}

impl ServiceCapabilities {
    /// Parses a capabilities document.
    ///
    /// Missing sections leave their fields empty; only malformed XML
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns the underlying XML error for documents that do not parse.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut caps = ServiceCapabilities::default();
        let mut reader = NsReader::from_str(xml);

        let mut saw_root = false;
        let mut operation: Option<OperationAcc> = None;
        let mut feature_type: Option<FeatureTypeEntry> = None;
        let mut target: Option<TextTarget> = None;
        let mut text = String::new();

        loop {
            match reader.read_resolved_event().map_err(ProtocolError::from)? {
                (resolve, Event::Start(e) | Event::Empty(e)) => {
                    let local = e.local_name();
                    match local.as_ref() {
                        b"WFS_Capabilities" if !saw_root => {
                            saw_root = true;
                            if let Some(version) = attr_local(&e, b"version") {
                                caps.version = version;
                            }
                        },
                        b"Operation" if in_family(&resolve, OWS_FAMILY) => {
                            operation = attr_local(&e, b"name").map(OperationAcc::new);
                        },
                        b"Get" if in_family(&resolve, OWS_FAMILY) => {
                            if let (Some(op), Some(href)) =
                                (operation.as_mut(), attr_local(&e, b"href"))
                            {
                                op.get.get_or_insert(href);
                            }
                        },
                        b"Post" if in_family(&resolve, OWS_FAMILY) => {
                            if let (Some(op), Some(href)) =
                                (operation.as_mut(), attr_local(&e, b"href"))
                            {
                                op.post.get_or_insert(href);
                            }
                        },
                        b"Parameter" if in_family(&resolve, OWS_FAMILY) => {
                            if let Some(op) = operation.as_mut()
                                && !op.first_parameter_done
                            {
                                op.in_parameter = true;
                            }
                        },
                        b"Value" if in_family(&resolve, OWS_FAMILY) => {
                            if operation.as_ref().is_some_and(|op| op.in_parameter) {
                                target = Some(TextTarget::OperationValue);
                                text.clear();
                            }
                        },
                        b"FeatureType" if in_family(&resolve, WFS_FAMILY) => {
                            feature_type = Some(FeatureTypeEntry::default());
                        },
                        b"Name" if feature_type.is_some() => {
                            target = Some(TextTarget::Name);
                            text.clear();
                        },
                        b"Title" if feature_type.is_some() => {
                            target = Some(TextTarget::Title);
                            text.clear();
                        },
                        b"DefaultCRS" | b"DefaultSRS" if feature_type.is_some() => {
                            target = Some(TextTarget::DefaultCrs);
                            text.clear();
                        },
                        b"OtherCRS" | b"OtherSRS" if feature_type.is_some() => {
                            target = Some(TextTarget::OtherCrs);
                            text.clear();
                        },
                        b"Format" if feature_type.is_some() => {
                            target = Some(TextTarget::Format);
                            text.clear();
                        },
                        _ => {},
                    }
                },
                (_, Event::Text(t)) => {
                    if target.is_some()
                        && let Ok(chunk) = t.unescape()
                    {
                        text.push_str(&chunk);
                    }
                },
                (_, Event::End(e)) => match e.local_name().as_ref() {
                    b"Value" => {
                        if matches!(target.take(), Some(TextTarget::OperationValue))
                            && let Some(op) = operation.as_mut()
                        {
                            let value = text.trim();
                            if !value.is_empty() {
                                op.formats.push(value.to_string());
                            }
                        }
                    },
                    b"Parameter" => {
                        if let Some(op) = operation.as_mut()
                            && op.in_parameter
                        {
                            op.in_parameter = false;
                            op.first_parameter_done = true;
                        }
                    },
                    b"Operation" => {
                        if let Some(op) = operation.take() {
                            caps.commit_operation(op);
                        }
                    },
                    b"Name" => {
                        if matches!(target.take(), Some(TextTarget::Name))
                            && let Some(entry) = feature_type.as_mut()
                        {
                            entry.name = text.trim().to_string();
                        }
                    },
                    b"Title" => {
                        if matches!(target.take(), Some(TextTarget::Title))
                            && let Some(entry) = feature_type.as_mut()
                        {
                            let title = text.trim();
                            if !title.is_empty() {
                                entry.title = Some(title.to_string());
                            }
                        }
                    },
                    b"DefaultCRS" | b"DefaultSRS" => {
                        if matches!(target.take(), Some(TextTarget::DefaultCrs))
                            && let Some(entry) = feature_type.as_mut()
                        {
                            let crs = text.trim();
                            if !crs.is_empty() {
                                entry.default_crs = Some(crs.to_string());
                            }
                        }
                    },
                    b"OtherCRS" | b"OtherSRS" => {
                        if matches!(target.take(), Some(TextTarget::OtherCrs))
                            && let Some(entry) = feature_type.as_mut()
                        {
                            let crs = text.trim();
                            if !crs.is_empty() {
                                entry.other_crs.push(crs.to_string());
                            }
                        }
                    },
                    b"Format" => {
                        if matches!(target.take(), Some(TextTarget::Format))
                            && let Some(entry) = feature_type.as_mut()
                        {
                            let format = text.trim();
                            if !format.is_empty() {
                                entry.output_formats.push(format.to_string());
                            }
                        }
                    },
                    b"FeatureType" => {
                        if let Some(entry) = feature_type.take()
                            && !entry.name.is_empty()
                        {
                            caps.feature_types.push(entry);
                        }
                    },
                    _ => {},
                },
                (_, Event::Eof) => break,
                _ => {},
            }
        }

        if caps.version.is_empty() {
            caps.version = WFS_VERSION.to_string();
        }
        Ok(caps)
    }

    /// Looks up a catalog entry by qualified name.
    #[must_use]
    pub fn feature_type(&self, name: &str) -> Option<&FeatureTypeEntry> {
        self.feature_types.iter().find(|entry| entry.name == name)
    }

    /// See [`WfstOperations::transaction_capable`].
    #[must_use]
    pub fn transaction_capable(&self) -> bool {
        self.operations.transaction_capable()
    }

    fn commit_operation(&mut self, op: OperationAcc) {
        match op.name.as_str() {
            "GetFeature" => {
                self.get_feature_get = op.get.map(clean_endpoint);
                self.get_feature_post = op.post.map(clean_endpoint);
            },
            "LockFeature" => self.operations.lock_feature = Some(op.into_operation()),
            "Transaction" => self.operations.transaction = Some(op.into_operation()),
            "GetFeatureWithLock" => {
                self.operations.get_feature_with_lock = Some(op.into_operation());
            },
            _ => {},
        }
    }
}

enum TextTarget {
    OperationValue,
    Name,
    Title,
    DefaultCrs,
    OtherCrs,
    Format,
}

struct OperationAcc {
    name: String,
    get: Option<String>,
    post: Option<String>,
    formats: Vec<String>,
    in_parameter: bool,
    first_parameter_done: bool,
}

impl OperationAcc {
    fn new(name: String) -> Self {
        Self {
            name,
            get: None,
            post: None,
            formats: Vec::new(),
            in_parameter: false,
            first_parameter_done: false,
        }
    }

    fn into_operation(self) -> WfstOperation {
        WfstOperation {
            name: self.name,
            post: self.post.map(clean_endpoint),
            formats: self.formats,
        }
    }
}

/// Picks the output format for a store, preferring JSON whenever the
/// service offers any JSON format, then the version-appropriate GML
/// default, then the first GML-looking format.
#[must_use]
pub fn select_output_format(versions: &[String], offered: &[String]) -> String {
    let json = offered.iter().any(|format| is_json_format(format));
    let gml = offered.iter().any(|format| is_gml_format(format));
    if json || !gml {
        if offered.iter().any(|format| format == JSON_OUTPUT_FORMAT) {
            return JSON_OUTPUT_FORMAT.to_string();
        }
        return offered
            .iter()
            .find(|format| is_json_format(format))
            .cloned()
            .unwrap_or_else(|| JSON_OUTPUT_FORMAT.to_string());
    }
    if versions.iter().any(|v| v.starts_with("2."))
        && offered.iter().any(|format| format == DEFAULT_OUTPUT_FORMAT)
    {
        return DEFAULT_OUTPUT_FORMAT.to_string();
    }
    if versions.iter().any(|v| v.starts_with("1."))
        && offered.iter().any(|format| format == GML311_OUTPUT_FORMAT)
    {
        return GML311_OUTPUT_FORMAT.to_string();
    }
    offered
        .iter()
        .find(|format| is_gml_format(format))
        .cloned()
        .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.to_string())
}

/// Whether an output format is JSON flavoured.
#[must_use]
pub fn is_json_format(format: &str) -> bool {
    format.to_ascii_lowercase().contains("json")
}

fn is_gml_format(format: &str) -> bool {
    let format = format.to_ascii_lowercase();
    format.contains("gml") || format.contains("text/xml")
}

/// Endpoints in capability documents often end in `?`; strip it.
fn clean_endpoint(url: String) -> String {
    match url.strip_suffix('?') {
        Some(stripped) => stripped.to_string(),
        None => url,
    }
}

fn in_family(resolve: &ResolveResult<'_>, family: &str) -> bool {
    match resolve {
        ResolveResult::Bound(ns) => ns.as_ref().starts_with(family.as_bytes()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => true,
    }
}

fn attr_local(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            let raw = String::from_utf8_lossy(&attr.value);
            return Some(
                quick_xml::escape::unescape(&raw)
                    .map_or_else(|_| raw.to_string(), |value| value.into_owned()),
            );
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="2.0.0"
    xmlns:wfs="http://www.opengis.net/wfs/2.0"
    xmlns:ows="http://www.opengis.net/ows/1.1"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <ows:ServiceIdentification>
    <ows:Title>GeoServer WFS</ows:Title>
  </ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetFeature">
      <ows:DCP><ows:HTTP>
        <ows:Get xlink:href="http://example.com/geoserver/wfs?"/>
        <ows:Post xlink:href="http://example.com/geoserver/wfs"/>
      </ows:HTTP></ows:DCP>
      <ows:Parameter name="outputFormat">
        <ows:AllowedValues>
          <ows:Value>application/gml+xml; version=3.2</ows:Value>
          <ows:Value>application/json</ows:Value>
        </ows:AllowedValues>
      </ows:Parameter>
    </ows:Operation>
    <ows:Operation name="Transaction">
      <ows:DCP><ows:HTTP>
        <ows:Post xlink:href="http://example.com/geoserver/wfs"/>
      </ows:HTTP></ows:DCP>
      <ows:Parameter name="inputFormat">
        <ows:AllowedValues>
          <ows:Value>application/gml+xml; version=3.2</ows:Value>
        </ows:AllowedValues>
      </ows:Parameter>
      <ows:Parameter name="releaseAction">
        <ows:AllowedValues>
          <ows:Value>ALL</ows:Value>
          <ows:Value>SOME</ows:Value>
        </ows:AllowedValues>
      </ows:Parameter>
    </ows:Operation>
    <ows:Operation name="LockFeature">
      <ows:DCP><ows:HTTP>
        <ows:Post xlink:href="http://example.com/geoserver/wfs?"/>
      </ows:HTTP></ows:DCP>
    </ows:Operation>
  </ows:OperationsMetadata>
  <wfs:FeatureTypeList>
    <wfs:FeatureType>
      <wfs:Name>topp:states</wfs:Name>
      <wfs:Title>USA Population</wfs:Title>
      <wfs:DefaultCRS>urn:ogc:def:crs:EPSG::4326</wfs:DefaultCRS>
      <wfs:OtherCRS>urn:ogc:def:crs:EPSG::3857</wfs:OtherCRS>
      <ows:WGS84BoundingBox>
        <ows:LowerCorner>-124.731 24.956</ows:LowerCorner>
        <ows:UpperCorner>-66.97 49.372</ows:UpperCorner>
      </ows:WGS84BoundingBox>
    </wfs:FeatureType>
    <wfs:FeatureType>
      <wfs:Name>topp:tasmania_roads</wfs:Name>
      <wfs:DefaultCRS>urn:ogc:def:crs:EPSG::4326</wfs:DefaultCRS>
    </wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

    #[test]
    fn endpoints_are_extracted_and_cleaned() {
        let caps = ServiceCapabilities::parse(CAPABILITIES).expect("parse");
        assert_eq!(caps.version, "2.0.0");
        assert_eq!(
            caps.get_feature_get.as_deref(),
            Some("http://example.com/geoserver/wfs")
        );
        assert_eq!(
            caps.get_feature_post.as_deref(),
            Some("http://example.com/geoserver/wfs")
        );
    }

    #[test]
    fn wfst_operations_carry_post_url_and_first_parameter_values() {
        let caps = ServiceCapabilities::parse(CAPABILITIES).expect("parse");
        assert!(caps.transaction_capable());
        let transaction = caps.operations.transaction.as_ref().expect("transaction");
        assert_eq!(
            transaction.post.as_deref(),
            Some("http://example.com/geoserver/wfs")
        );
        assert_eq!(transaction.formats, ["application/gml+xml; version=3.2"]);

        let lock = caps.operations.lock_feature.as_ref().expect("lock");
        assert_eq!(lock.post.as_deref(), Some("http://example.com/geoserver/wfs"));
        assert!(lock.formats.is_empty());
        assert!(caps.operations.get_feature_with_lock.is_none());
    }

    #[test]
    fn the_feature_type_catalog_is_read() {
        let caps = ServiceCapabilities::parse(CAPABILITIES).expect("parse");
        assert_eq!(caps.feature_types.len(), 2);
        let states = caps.feature_type("topp:states").expect("states");
        assert_eq!(states.title.as_deref(), Some("USA Population"));
        assert_eq!(states.default_crs.as_deref(), Some("urn:ogc:def:crs:EPSG::4326"));
        assert_eq!(states.other_crs, ["urn:ogc:def:crs:EPSG::3857"]);
        assert!(caps.feature_type("topp:missing").is_none());
    }

    #[test]
    fn a_document_without_operations_is_not_transaction_capable() {
        let caps = ServiceCapabilities::parse(
            "<WFS_Capabilities version=\"1.1.0\"></WFS_Capabilities>",
        )
        .expect("parse");
        assert_eq!(caps.version, "1.1.0");
        assert!(!caps.transaction_capable());
        assert!(caps.feature_types.is_empty());
    }

    #[test]
    fn json_wins_when_offered() {
        let versions = vec!["2.0.0".to_string()];
        let offered = vec![
            "application/gml+xml; version=3.2".to_string(),
            "application/json".to_string(),
        ];
        assert_eq!(select_output_format(&versions, &offered), "application/json");
    }

    #[test]
    fn a_json_variant_is_taken_when_the_plain_type_is_absent() {
        let versions = vec!["2.0.0".to_string()];
        let offered = vec![
            "application/gml+xml; version=3.2".to_string(),
            "application/json; subtype=geojson".to_string(),
        ];
        assert_eq!(
            select_output_format(&versions, &offered),
            "application/json; subtype=geojson"
        );
    }

    #[test]
    fn gml_defaults_follow_the_version() {
        let offered = vec![
            "text/xml; subtype=gml/3.1.1".to_string(),
            "application/gml+xml; version=3.2".to_string(),
        ];
        assert_eq!(
            select_output_format(&["2.0.0".to_string()], &offered),
            "application/gml+xml; version=3.2"
        );
        assert_eq!(
            select_output_format(&["1.1.0".to_string()], &offered),
            "text/xml; subtype=gml/3.1.1"
        );
    }

    #[test]
    fn an_empty_offer_falls_back_to_json() {
        assert_eq!(
            select_output_format(&["2.0.0".to_string()], &[]),
            "application/json"
        );
    }

    #[test]
    fn unversioned_gml_offers_take_the_first_gml_format() {
        let offered = vec!["text/xml; subtype=gml/2.1.2".to_string()];
        assert_eq!(
            select_output_format(&["3.0.0".to_string()], &offered),
            "text/xml; subtype=gml/2.1.2"
        );
    }
}

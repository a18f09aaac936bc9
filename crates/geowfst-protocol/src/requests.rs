//! WFS 2.0.0 request documents.
//!
//! [`RequestBuilder`] assembles the complete XML bodies a transactional
//! client POSTs: queries by resource id, insert/update/delete transactions,
//! lock acquisition and release, and the single transaction that commits a
//! locked editing session. Geometry compatibility against the feature type
//! schema is validated here, before anything touches the network.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use geowfst_gml::axes::normalize_srs_name;
use geowfst_gml::encode::{EncodeOptions, write_geometry};
use geowfst_gml::geometry::Geometry;
use geowfst_gml::wrap::reshape;
use geowfst_gml::Feature;

use crate::error::{ProtocolError, Result};
use crate::schema::{FeatureTypeDescriptor, GeometryField, SchemaGeometryType};

pub const WFS_NAMESPACE: &str = "http://www.opengis.net/wfs/2.0";
pub const FES_NAMESPACE: &str = "http://www.opengis.net/fes/2.0";
pub const OWS_NAMESPACE: &str = "http://www.opengis.net/ows/1.1";
pub const XML_SCHEMA_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Output format requested when the caller does not override it.
pub const DEFAULT_OUTPUT_FORMAT: &str = "application/gml+xml; version=3.2";

/// Protocol version stamped on every request.
pub const WFS_VERSION: &str = "2.0.0";

/// Upper bound on features returned by a query-by-ids request.
const QUERY_COUNT: &str = "500";

/// Lock expiry sent when the caller does not choose one, in seconds.
const DEFAULT_EXPIRY_SECONDS: &str = "300";

/// Pending edits of a locked session, flattened for a commit transaction.
#[derive(Clone, Debug, Default)]
pub struct LockCommit {
    pub lock_id: String,
    pub inserts: Vec<Feature>,
    /// Each update carries its properties-only flag; when set the geometry
    /// is left out of the update block.
    pub updates: Vec<(Feature, bool)>,
    pub deletes: Vec<String>,
}

/// Builds WFS-T request documents for one feature type.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    type_name: String,
    descriptor: FeatureTypeDescriptor,
    output_format: String,
    srs_name: Option<String>,
    encode: EncodeOptions,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(type_name: impl Into<String>, descriptor: FeatureTypeDescriptor) -> Self {
        Self {
            type_name: type_name.into(),
            descriptor,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            srs_name: None,
            encode: EncodeOptions::default(),
        }
    }

    /// Output format for query responses. Defaults to GML 3.2.
    #[must_use]
    pub fn with_output_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = output_format.into();
        self
    }

    /// CRS stamped on outgoing geometries. When unset, each geometry's own
    /// CRS is kept.
    #[must_use]
    pub fn with_srs_name(mut self, srs_name: impl Into<String>) -> Self {
        self.srs_name = Some(srs_name.into());
        self
    }

    /// Geometry encoding options (GML version, axis inversion, dimension).
    #[must_use]
    pub fn with_encode_options(mut self, encode: EncodeOptions) -> Self {
        self.encode = encode;
        self
    }

    #[must_use]
    pub fn descriptor(&self) -> &FeatureTypeDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `GetFeature` querying the given resource ids.
    ///
    /// # Errors
    ///
    /// Fails only on writer errors.
    pub fn get_feature_by_ids(&self, ids: &[String]) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("wfs:GetFeature");
        root.push_attribute(("xmlns:xsd", XML_SCHEMA_NAMESPACE));
        root.push_attribute(("xmlns:wfs", WFS_NAMESPACE));
        root.push_attribute(("xmlns:fes", FES_NAMESPACE));
        root.push_attribute(("xmlns:gml", self.encode.version.namespace()));
        root.push_attribute(("service", "WFS"));
        root.push_attribute(("outputFormat", self.output_format.as_str()));
        root.push_attribute(("count", QUERY_COUNT));
        root.push_attribute(("version", WFS_VERSION));
        writer.write_event(Event::Start(root))?;

        self.write_query(&mut writer, ids)?;
        writer.write_event(Event::End(BytesEnd::new("wfs:GetFeature")))?;
        Ok(document(writer))
    }

    /// Transaction inserting one feature.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidGeometry`] when the feature's geometry family
    /// cannot satisfy the schema, [`ProtocolError::MissingGeometryField`] /
    /// [`ProtocolError::UnsupportedSchemaGeometry`] when the schema itself
    /// cannot take mutations.
    pub fn insert(&self, feature: &Feature) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        writer.write_event(Event::Start(self.transaction_root(None)))?;
        self.write_insert_block(&mut writer, feature)?;
        writer.write_event(Event::End(BytesEnd::new("wfs:Transaction")))?;
        Ok(document(writer))
    }

    /// Transaction updating one feature in place.
    ///
    /// With `properties_only` set the geometry property is omitted and only
    /// scalar values are sent.
    ///
    /// # Errors
    ///
    /// Same schema conditions as [`RequestBuilder::insert`], plus
    /// [`ProtocolError::MissingFeatureId`] when the feature has no id.
    pub fn update(&self, feature: &Feature, properties_only: bool) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        writer.write_event(Event::Start(self.transaction_root(None)))?;
        self.write_update_block(&mut writer, feature, properties_only)?;
        writer.write_event(Event::End(BytesEnd::new("wfs:Transaction")))?;
        Ok(document(writer))
    }

    /// Transaction deleting one feature by resource id.
    ///
    /// # Errors
    ///
    /// Fails only on writer errors.
    pub fn delete(&self, id: &str) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        writer.write_event(Event::Start(self.transaction_root(None)))?;
        self.write_delete_block(&mut writer, id)?;
        writer.write_event(Event::End(BytesEnd::new("wfs:Transaction")))?;
        Ok(document(writer))
    }

    /// `LockFeature` over the given resource ids.
    ///
    /// `expiry_minutes` converts to the protocol's seconds; unset means
    /// five minutes.
    ///
    /// # Errors
    ///
    /// Fails only on writer errors.
    pub fn lock_features(&self, ids: &[String], expiry_minutes: Option<u32>) -> Result<String> {
        self.lock_document("wfs:LockFeature", false, ids, expiry_minutes)
    }

    /// `GetFeatureWithLock`: locks and returns the features in one round
    /// trip.
    ///
    /// # Errors
    ///
    /// Fails only on writer errors.
    pub fn get_feature_with_lock(
        &self,
        ids: &[String],
        expiry_minutes: Option<u32>,
    ) -> Result<String> {
        self.lock_document("wfs:GetFeatureWithLock", true, ids, expiry_minutes)
    }

    /// The single transaction committing a locked session: all inserts,
    /// then all updates, then all deletes, under the session's lock id.
    ///
    /// # Errors
    ///
    /// Any insert or update block can fail with the same schema conditions
    /// as the standalone operations.
    pub fn commit_lock(&self, commit: &LockCommit) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        writer.write_event(Event::Start(
            self.transaction_root(Some(commit.lock_id.as_str())),
        ))?;
        for feature in &commit.inserts {
            self.write_insert_block(&mut writer, feature)?;
        }
        for (feature, properties_only) in &commit.updates {
            self.write_update_block(&mut writer, feature, *properties_only)?;
        }
        for id in &commit.deletes {
            self.write_delete_block(&mut writer, id)?;
        }
        writer.write_event(Event::End(BytesEnd::new("wfs:Transaction")))?;
        Ok(document(writer))
    }

    /// Standalone `ReleaseLock` document for an abandoned session.
    ///
    /// # Errors
    ///
    /// Fails only on writer errors.
    pub fn release_lock(lock_id: &str) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        let mut root = BytesStart::new("wfs:ReleaseLock");
        root.push_attribute(("service", "WFS"));
        root.push_attribute(("version", WFS_VERSION));
        root.push_attribute(("lockId", lock_id));
        root.push_attribute(("xmlns:wfs", WFS_NAMESPACE));
        writer.write_event(Event::Start(root))?;
        writer.write_event(Event::End(BytesEnd::new("wfs:ReleaseLock")))?;
        Ok(document(writer))
    }

    fn transaction_root(&self, lock_id: Option<&str>) -> BytesStart<'static> {
        let mut root = BytesStart::new("wfs:Transaction");
        root.push_attribute(("version", WFS_VERSION));
        if let Some(lock_id) = lock_id {
            root.push_attribute(("lockId", lock_id));
        }
        root.push_attribute(("service", "WFS"));
        root.push_attribute(("xmlns:fes", FES_NAMESPACE));
        root.push_attribute(("xmlns:gml", self.encode.version.namespace()));
        root.push_attribute(("xmlns:wfs", WFS_NAMESPACE));
        root
    }

    fn lock_document(
        &self,
        tag: &str,
        with_output_format: bool,
        ids: &[String],
        expiry_minutes: Option<u32>,
    ) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

        let mut root = BytesStart::new(tag);
        root.push_attribute(("service", "WFS"));
        root.push_attribute(("version", WFS_VERSION));
        root.push_attribute(("xmlns:wfs", WFS_NAMESPACE));
        root.push_attribute(("xmlns:fes", FES_NAMESPACE));
        root.push_attribute(("xmlns:gml", self.encode.version.namespace()));
        if with_output_format {
            root.push_attribute(("outputFormat", DEFAULT_OUTPUT_FORMAT));
        }
        root.push_attribute(("expiry", expiry_seconds(expiry_minutes).as_str()));
        root.push_attribute(("lockAction", "ALL"));
        writer.write_event(Event::Start(root))?;

        self.write_query(&mut writer, ids)?;
        writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(document(writer))
    }

    fn write_query<W: Write>(&self, writer: &mut Writer<W>, ids: &[String]) -> Result<()> {
        let mut query = BytesStart::new("wfs:Query");
        query.push_attribute(("typeNames", self.type_name.as_str()));
        writer.write_event(Event::Start(query))?;

        writer.write_event(Event::Start(BytesStart::new("fes:Filter")))?;
        writer.write_event(Event::Start(BytesStart::new("fes:Or")))?;
        for id in ids {
            write_resource_id(writer, id)?;
        }
        writer.write_event(Event::End(BytesEnd::new("fes:Or")))?;
        writer.write_event(Event::End(BytesEnd::new("fes:Filter")))?;

        writer.write_event(Event::End(BytesEnd::new("wfs:Query")))?;
        Ok(())
    }

    fn write_insert_block<W: Write>(&self, writer: &mut Writer<W>, feature: &Feature) -> Result<()> {
        let field = self.geometry_field()?;
        let schema_type = schema_geometry_type(field)?;
        let shaped = self.shape_feature_geometry(feature, field, schema_type)?;

        let mut insert = BytesStart::new("wfs:Insert");
        insert.push_attribute(("handle", "AddHandle"));
        writer.write_event(Event::Start(insert))?;

        let element_tag = format!("tns:{}", local_type_name(&self.type_name));
        let mut element = BytesStart::new(element_tag.as_str());
        if let Some(tns) = self.insert_namespace() {
            element.push_attribute(("xmlns:tns", tns));
        }
        writer.write_event(Event::Start(element))?;

        let geometry_tag = format!("tns:{}", field.name);
        writer.write_event(Event::Start(BytesStart::new(geometry_tag.as_str())))?;
        write_geometry(writer, &shaped, &self.encode)?;
        writer.write_event(Event::End(BytesEnd::new(geometry_tag.as_str())))?;

        for (name, value) in &feature.properties {
            let property_tag = format!("tns:{name}");
            writer.write_event(Event::Start(BytesStart::new(property_tag.as_str())))?;
            writer.write_event(Event::Text(BytesText::new(&value.as_text())))?;
            writer.write_event(Event::End(BytesEnd::new(property_tag.as_str())))?;
        }

        writer.write_event(Event::End(BytesEnd::new(element_tag.as_str())))?;
        writer.write_event(Event::End(BytesEnd::new("wfs:Insert")))?;
        Ok(())
    }

    fn write_update_block<W: Write>(
        &self,
        writer: &mut Writer<W>,
        feature: &Feature,
        properties_only: bool,
    ) -> Result<()> {
        let id = feature
            .id
            .as_deref()
            .ok_or(ProtocolError::MissingFeatureId {
                operation: "update",
            })?;

        let mut update = BytesStart::new("wfs:Update");
        update.push_attribute(("typeName", self.type_name.as_str()));
        writer.write_event(Event::Start(update))?;

        for (name, value) in &feature.properties {
            write_scalar_property(writer, name, &value.as_text())?;
        }

        if !properties_only {
            let field = self.geometry_field()?;
            let schema_type = schema_geometry_type(field)?;
            let shaped = self.shape_feature_geometry(feature, field, schema_type)?;

            writer.write_event(Event::Start(BytesStart::new("wfs:Property")))?;
            writer.write_event(Event::Start(BytesStart::new("wfs:ValueReference")))?;
            writer.write_event(Event::Text(BytesText::new(&field.name)))?;
            writer.write_event(Event::End(BytesEnd::new("wfs:ValueReference")))?;
            writer.write_event(Event::Start(BytesStart::new("wfs:Value")))?;
            write_geometry(writer, &shaped, &self.encode)?;
            writer.write_event(Event::End(BytesEnd::new("wfs:Value")))?;
            writer.write_event(Event::End(BytesEnd::new("wfs:Property")))?;
        }

        writer.write_event(Event::Start(BytesStart::new("fes:Filter")))?;
        write_resource_id(writer, id)?;
        writer.write_event(Event::End(BytesEnd::new("fes:Filter")))?;

        writer.write_event(Event::End(BytesEnd::new("wfs:Update")))?;
        Ok(())
    }

    fn write_delete_block<W: Write>(&self, writer: &mut Writer<W>, id: &str) -> Result<()> {
        let mut delete = BytesStart::new("wfs:Delete");
        delete.push_attribute(("typeName", self.type_name.as_str()));
        writer.write_event(Event::Start(delete))?;

        writer.write_event(Event::Start(BytesStart::new("fes:Filter")))?;
        write_resource_id(writer, id)?;
        writer.write_event(Event::End(BytesEnd::new("fes:Filter")))?;

        writer.write_event(Event::End(BytesEnd::new("wfs:Delete")))?;
        Ok(())
    }

    /// Validates the geometry against the schema, widens it to the declared
    /// shape and stamps the effective CRS on the root.
    fn shape_feature_geometry(
        &self,
        feature: &Feature,
        field: &GeometryField,
        schema_type: SchemaGeometryType,
    ) -> Result<Geometry> {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| ProtocolError::InvalidGeometry {
                expected: field.type_name.clone(),
            })?;
        if !schema_type.accepts(geometry.kind()) {
            return Err(ProtocolError::InvalidGeometry {
                expected: field.type_name.clone(),
            });
        }

        let mut shaped = match schema_type.target_kind() {
            Some(kind) => reshape(geometry.clone(), kind),
            None => geometry.clone(),
        };

        let chosen = self
            .srs_name
            .clone()
            .unwrap_or_else(|| shaped.srs_name().to_string());
        let normalized = normalize_srs_name(&chosen);
        if !normalized.is_empty() {
            shaped.set_root_srs_name(normalized);
        }
        Ok(shaped)
    }

    fn geometry_field(&self) -> Result<&GeometryField> {
        self.descriptor
            .geometry
            .as_ref()
            .ok_or_else(|| ProtocolError::MissingGeometryField {
                type_name: self.type_name.clone(),
            })
    }

    fn insert_namespace(&self) -> Option<&str> {
        if let Some(tns) = self.descriptor.target_namespace.as_deref() {
            return Some(tns);
        }
        self.type_name.split_once(':').map(|(prefix, _)| prefix)
    }
}

fn local_type_name(type_name: &str) -> &str {
    type_name.split_once(':').map_or(type_name, |(_, local)| local)
}

fn schema_geometry_type(field: &GeometryField) -> Result<SchemaGeometryType> {
    field
        .geometry_type()
        .ok_or_else(|| ProtocolError::UnsupportedSchemaGeometry {
            type_name: field.type_name.clone(),
        })
}

fn write_scalar_property<W: Write>(
    writer: &mut Writer<W>,
    reference: &str,
    value: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("wfs:Property")))?;
    writer.write_event(Event::Start(BytesStart::new("wfs:ValueReference")))?;
    writer.write_event(Event::Text(BytesText::new(reference)))?;
    writer.write_event(Event::End(BytesEnd::new("wfs:ValueReference")))?;
    writer.write_event(Event::Start(BytesStart::new("wfs:Value")))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("wfs:Value")))?;
    writer.write_event(Event::End(BytesEnd::new("wfs:Property")))?;
    Ok(())
}

fn write_resource_id<W: Write>(writer: &mut Writer<W>, id: &str) -> Result<()> {
    let mut rid = BytesStart::new("fes:ResourceId");
    rid.push_attribute(("rid", id));
    writer.write_event(Event::Empty(rid))?;
    Ok(())
}

fn expiry_seconds(expiry_minutes: Option<u32>) -> String {
    match expiry_minutes {
        Some(minutes) => (u64::from(minutes) * 60).to_string(),
        None => DEFAULT_EXPIRY_SECONDS.to_string(),
    }
}

fn document(writer: Writer<Vec<u8>>) -> String {
    let bytes = writer.into_inner();
    String::from_utf8_lossy(&bytes).into_owned()
}

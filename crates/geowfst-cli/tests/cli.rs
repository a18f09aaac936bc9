//! End-to-end tests driving the compiled `geowfst` binary.

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

use geowfst_locks::{EditedFeature, FileKeyValueStore, LockSession, LockSessionStore};

const STATES_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:gml="http://www.opengis.net/gml/3.2"
    xmlns:topp="http://www.openplans.org/topp"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema" elementFormDefault="qualified"
    targetNamespace="http://www.openplans.org/topp">
  <xsd:import namespace="http://www.opengis.net/gml/3.2"/>
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

const EXCEPTION_REPORT: &str = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidValue" locator="PERSONS">
    <ows:ExceptionText>Cannot coerce.</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;

const EDITED_STATE: &str = r#"{"type":"Feature","id":"states.6",
  "geometry":{"type":"Polygon","coordinates":[[[-88.0,30.0],[-88.0,35.0],[-85.0,35.0],[-88.0,30.0]]]},
  "properties":{"STATE_NAME":"Alabama","PERSONS":4040587}}"#;

/// Test that `describe` renders the schema template as tables.
#[test]
fn describe_prints_the_property_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let schema = dir.path().join("states.xsd");
    fs::write(&schema, STATES_SCHEMA)?;

    Command::cargo_bin("geowfst")?
        .args(["describe", schema.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("gml:MultiSurfacePropertyType"))
        .stdout(predicate::str::contains("STATE_NAME"))
        .stdout(predicate::str::contains("topp:statesType"));
    Ok(())
}

/// Test that `request delete` writes the transaction to standard output.
#[test]
fn request_delete_writes_a_transaction() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let schema = dir.path().join("states.xsd");
    fs::write(&schema, STATES_SCHEMA)?;

    Command::cargo_bin("geowfst")?
        .args([
            "request",
            "delete",
            "--schema",
            schema.to_str().unwrap(),
            "--type-name",
            "topp:states",
            "--id",
            "states.6",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("wfs:Transaction"))
        .stdout(predicate::str::contains("wfs:Delete"))
        .stdout(predicate::str::contains(r#"rid="states.6""#));
    Ok(())
}

/// Test that `response --kind exception` surfaces the code and message.
#[test]
fn response_summarizes_an_exception() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("reply.xml");
    fs::write(&file, EXCEPTION_REPORT)?;

    Command::cargo_bin("geowfst")?
        .args(["response", file.to_str().unwrap(), "--kind", "exception"])
        .assert()
        .success()
        .stdout(predicate::str::contains("InvalidValue"))
        .stdout(predicate::str::contains("Cannot coerce."));
    Ok(())
}

/// Test the stored-session flow: seed a session on disk, list it, then
/// build its commit transaction.
#[test]
fn seeded_session_lists_and_commits() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let schema = dir.path().join("states.xsd");
    fs::write(&schema, STATES_SCHEMA)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let created = runtime.block_on(async {
        let store = LockSessionStore::new(Arc::new(FileKeyValueStore::new(dir.path())));
        let created = store
            .create(LockSession {
                lock_id: "GeoServer_lock9".to_string(),
                lock_name: "edit states".to_string(),
                type_name: "topp:states".to_string(),
                expiry: 5,
                unchanged: vec!["states.6".to_string()],
                ..LockSession::default()
            })
            .await?;
        store
            .apply_update(
                &created.id,
                EditedFeature {
                    id: "states.6".to_string(),
                    feature: EDITED_STATE.to_string(),
                    properties_only: true,
                },
            )
            .await?;
        Ok::<_, anyhow::Error>(created)
    })?;

    Command::cargo_bin("geowfst")?
        .args(["locks", "list", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("GeoServer_lock9"))
        .stdout(predicate::str::contains("edit states"));

    Command::cargo_bin("geowfst")?
        .args([
            "request",
            "commit",
            "--schema",
            schema.to_str().unwrap(),
            "--type-name",
            "topp:states",
            "--dir",
            dir.path().to_str().unwrap(),
            "--session",
            &created.id,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"lockId="GeoServer_lock9""#))
        .stdout(predicate::str::contains("wfs:Update"))
        .stdout(predicate::str::contains("Alabama"));

    // The session has five minutes left, so nothing is swept.
    Command::cargo_bin("geowfst")?
        .args(["locks", "sweep", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Swept 0 expired session(s)."));
    Ok(())
}

//! Command-line interface for `geowfst`, a transactional WFS 2.0 client
//! toolkit.
//!
//! This binary provides a user-friendly CLI over the [`geowfst_client`],
//! [`geowfst_protocol`] and [`geowfst_locks`] crates, enabling users to
//! inspect WFS documents, build WFS-T request documents offline and manage
//! lock sessions stored on the local filesystem.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for
//! structured logging. It acts as a thin façade that parses arguments,
//! configures logging, and delegates to command handlers. Network delivery
//! stays out of scope: schemas, capabilities and responses are read from
//! files, and built requests go to standard output where any HTTP client
//! can pick them up.
//!
//! # Available Commands
//!
//! - `describe` - Inspect a DescribeFeatureType response
//! - `capabilities` - Inspect a GetCapabilities document
//! - `request` - Build WFS-T request documents
//! - `response` - Summarize a service response document
//! - `locks` - Manage lock sessions stored on the local filesystem

mod display;

use std::fs;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{Level, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geowfst_client::{
    ServiceCapabilities, StoreConfig, TransactionResult, codec, lock_commit_from_session,
};
use geowfst_gml::{EncodeOptions, Feature};
use geowfst_locks::{FileKeyValueStore, LockQuery, LockSessionStore};
use geowfst_protocol::{
    FeatureTypeDescriptor, RequestBuilder, ServiceException, parse_exception_report,
    parse_lock_response, parse_transaction_response,
};

#[derive(Parser)]
#[command(
    name = "geowfst",
    version,
    about = "Transactional WFS 2.0 client toolkit",
    long_about = "geowfst inspects WFS capabilities and schema documents, builds WFS-T 2.0\n\
                  request documents for any HTTP client to deliver, and manages locked\n\
                  editing sessions stored on the local filesystem."
)]
/// Command-line arguments and options for the `geowfst` CLI.
///
/// This struct defines the top-level CLI interface, including global flags
/// for logging verbosity and the subcommand to execute.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `geowfst` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Inspects a DescribeFeatureType response.
    ///
    /// Parses the schema document into the feature-type template that
    /// transaction building uses, and prints its geometry slot and declared
    /// properties.
    Describe {
        /// Path to the DescribeFeatureType response (XML Schema).
        #[arg(value_name = "SCHEMA")]
        schema: String,
    },

    /// Inspects a GetCapabilities document.
    ///
    /// Prints the feature-type catalog and the advertised transactional
    /// operations. With `--type-name`, also resolves the settings a feature
    /// store would use for that type.
    Capabilities {
        /// Path to the GetCapabilities response.
        #[arg(value_name = "CAPABILITIES")]
        capabilities: String,

        /// Resolve store settings for this feature type.
        #[arg(long, value_name = "NAME")]
        type_name: Option<String>,

        /// Service endpoint to record instead of the advertised one.
        #[arg(long, value_name = "URL")]
        service_url: Option<String>,
    },

    /// Builds a WFS-T request document on standard output.
    Request {
        #[command(subcommand)]
        operation: RequestCommands,
    },

    /// Summarizes a WFS response document.
    Response {
        /// Path to the response document.
        #[arg(value_name = "FILE")]
        file: String,

        /// How to read the document.
        #[arg(long, value_enum, default_value = "transaction")]
        kind: ResponseKind,
    },

    /// Manages lock sessions stored on the local filesystem.
    Locks {
        #[command(subcommand)]
        command: LocksCommands,
    },
}

/// Arguments shared by every request that needs the feature-type schema.
#[derive(Args)]
struct RequestTarget {
    /// Path to the DescribeFeatureType response for the feature type.
    #[arg(long, value_name = "SCHEMA")]
    schema: String,

    /// Qualified feature type name (e.g., "topp:states").
    #[arg(long, value_name = "NAME")]
    type_name: String,

    /// CRS to stamp on outgoing geometries instead of their own.
    #[arg(long, value_name = "CRS")]
    srs_name: Option<String>,

    /// Output format requested on queries.
    #[arg(long, value_name = "FORMAT")]
    output_format: Option<String>,

    /// Flip the encoded axis order for north-east CRS definitions.
    #[arg(long)]
    swap_axes: bool,
}

/// Request documents the CLI can build.
#[derive(Subcommand)]
enum RequestCommands {
    /// Builds a transaction inserting one feature.
    Insert {
        #[command(flatten)]
        target: RequestTarget,

        /// Path to the feature as GeoJSON.
        #[arg(long, value_name = "FILE")]
        feature: String,
    },

    /// Builds a transaction updating one feature.
    ///
    /// The feature's "id" member selects the remote feature to update.
    Update {
        #[command(flatten)]
        target: RequestTarget,

        /// Path to the feature as GeoJSON.
        #[arg(long, value_name = "FILE")]
        feature: String,

        /// Update scalar properties only, leaving the geometry untouched.
        #[arg(long)]
        properties_only: bool,
    },

    /// Builds a transaction deleting one feature by id.
    Delete {
        #[command(flatten)]
        target: RequestTarget,

        /// Resource id of the feature to delete.
        #[arg(long, value_name = "ID")]
        id: String,
    },

    /// Builds a GetFeature query for one or more resource ids.
    Query {
        #[command(flatten)]
        target: RequestTarget,

        /// Resource id to fetch; repeat the flag for several.
        #[arg(long = "id", value_name = "ID", required = true)]
        ids: Vec<String>,
    },

    /// Builds a LockFeature request for one or more resource ids.
    Lock {
        #[command(flatten)]
        target: RequestTarget,

        /// Resource id to lock; repeat the flag for several.
        #[arg(long = "id", value_name = "ID", required = true)]
        ids: Vec<String>,

        /// Lock lifetime in minutes.
        #[arg(long, value_name = "MINUTES")]
        expiry: Option<u32>,
    },

    /// Builds a GetFeatureWithLock request for one or more resource ids.
    GetWithLock {
        #[command(flatten)]
        target: RequestTarget,

        /// Resource id to lock and fetch; repeat the flag for several.
        #[arg(long = "id", value_name = "ID", required = true)]
        ids: Vec<String>,

        /// Lock lifetime in minutes.
        #[arg(long, value_name = "MINUTES")]
        expiry: Option<u32>,
    },

    /// Builds the commit transaction for a stored lock session.
    Commit {
        #[command(flatten)]
        target: RequestTarget,

        /// Directory holding the lock-session records.
        #[arg(long, value_name = "DIR")]
        dir: String,

        /// Record id of the session to commit.
        #[arg(long, value_name = "ID")]
        session: String,
    },

    /// Builds a ReleaseLock request for a lock token.
    Release {
        /// Lock token to release.
        #[arg(long, value_name = "TOKEN")]
        lock_id: String,
    },
}

/// How the `response` command reads the document.
#[derive(Clone, Copy, ValueEnum)]
enum ResponseKind {
    /// Totals and ids from a TransactionResponse.
    Transaction,
    /// Lock metadata from a LockFeature or GetFeatureWithLock reply.
    Lock,
    /// Code and message from an ows:ExceptionReport.
    Exception,
}

/// Operations over lock sessions stored on the local filesystem.
#[derive(Subcommand)]
enum LocksCommands {
    /// Lists stored sessions with optional search and paging.
    List {
        /// Directory holding the lock-session records.
        #[arg(long, value_name = "DIR")]
        dir: String,

        /// Substring matched against lock names and lock tokens.
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,

        /// Zero-based page number.
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Sessions per page.
        #[arg(long, default_value_t = 20)]
        page_size: usize,
    },

    /// Prints one stored session as JSON.
    Show {
        /// Directory holding the lock-session records.
        #[arg(long, value_name = "DIR")]
        dir: String,

        /// Record id of the session.
        #[arg(long, value_name = "ID")]
        id: String,
    },

    /// Deletes every expired session.
    Sweep {
        /// Directory holding the lock-session records.
        #[arg(long, value_name = "DIR")]
        dir: String,
    },
}

/// Entry point for the `geowfst` command-line interface.
///
/// This function parses command-line arguments, configures the logging
/// system based on verbosity flags, and dispatches to the appropriate
/// command handler.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system
/// cannot be initialized.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true) // Show module paths for better context
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute the command
    match cli.command {
        Commands::Describe { schema } => {
            info!("Describing schema {schema}");
            handle_describe(&schema)?;
        },
        Commands::Capabilities {
            capabilities,
            type_name,
            service_url,
        } => {
            info!("Reading capabilities {capabilities}");
            handle_capabilities(&capabilities, type_name.as_deref(), service_url.as_deref())?;
        },
        Commands::Request { operation } => {
            handle_request(operation).await?;
        },
        Commands::Response { file, kind } => {
            info!("Summarizing response {file}");
            handle_response(&file, kind)?;
        },
        Commands::Locks { command } => {
            handle_locks(command).await?;
        },
    }

    Ok(())
}

fn read_input(path: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|err| anyhow!("cannot read '{path}': {err}"))
}

fn handle_describe(schema: &str) -> Result<()> {
    let descriptor = FeatureTypeDescriptor::parse(&read_input(schema)?)?;
    display::display_descriptor(&descriptor);
    Ok(())
}

fn handle_capabilities(
    path: &str,
    type_name: Option<&str>,
    service_url: Option<&str>,
) -> Result<()> {
    let capabilities = ServiceCapabilities::parse(&read_input(path)?)?;
    display::display_capabilities(&capabilities);

    if let Some(name) = type_name {
        let endpoint = service_url
            .map(ToString::to_string)
            .or_else(|| capabilities.get_feature_post.clone())
            .or_else(|| capabilities.get_feature_get.clone())
            .ok_or_else(|| anyhow!("No service endpoint advertised; pass --service-url."))?;
        let config = StoreConfig::from_capabilities(&capabilities, endpoint, name, &[])?;

        let methods: Vec<&str> = config.methods.iter().map(|method| method.as_str()).collect();
        let crs = if config.srs_name.is_empty() {
            "service default"
        } else {
            config.srs_name.as_str()
        };

        println!("\nResolved settings for '{name}':");
        println!("Service endpoint: {}", config.service_url);
        println!(
            "Transaction endpoint: {}",
            config
                .post_service_url
                .clone()
                .unwrap_or_else(|| config.service_url.clone())
        );
        println!("Output format: {}", config.output_format);
        println!("CRS: {crs}");
        println!("Methods: {}", methods.join(", "));
        println!(
            "Transactions: {}",
            if config.operations.transaction_capable() {
                "supported"
            } else {
                "not advertised"
            }
        );
    }

    Ok(())
}

/// Builds the request template from the target's schema file and flags.
fn request_builder(target: &RequestTarget) -> Result<RequestBuilder> {
    let descriptor = FeatureTypeDescriptor::parse(&read_input(&target.schema)?)?;
    let options = EncodeOptions {
        invert_axes: target.swap_axes,
        ..EncodeOptions::default()
    };

    let mut builder =
        RequestBuilder::new(target.type_name.clone(), descriptor).with_encode_options(options);
    if let Some(format) = &target.output_format {
        builder = builder.with_output_format(format.clone());
    }
    if let Some(srs) = &target.srs_name {
        builder = builder.with_srs_name(srs.clone());
    }
    Ok(builder)
}

fn read_feature(path: &str) -> Result<Feature> {
    Ok(codec::feature_from_json(&read_input(path)?)?)
}

async fn handle_request(operation: RequestCommands) -> Result<()> {
    let document = match operation {
        RequestCommands::Insert { target, feature } => {
            request_builder(&target)?.insert(&read_feature(&feature)?)?
        },
        RequestCommands::Update {
            target,
            feature,
            properties_only,
        } => request_builder(&target)?.update(&read_feature(&feature)?, properties_only)?,
        RequestCommands::Delete { target, id } => request_builder(&target)?.delete(&id)?,
        RequestCommands::Query { target, ids } => {
            request_builder(&target)?.get_feature_by_ids(&ids)?
        },
        RequestCommands::Lock {
            target,
            ids,
            expiry,
        } => request_builder(&target)?.lock_features(&ids, expiry)?,
        RequestCommands::GetWithLock {
            target,
            ids,
            expiry,
        } => request_builder(&target)?.get_feature_with_lock(&ids, expiry)?,
        RequestCommands::Commit {
            target,
            dir,
            session,
        } => {
            let store = open_lock_store(&dir);
            let session = store
                .get(&session)
                .await?
                .ok_or_else(|| anyhow!("no stored lock session '{session}'"))?;
            let commit = lock_commit_from_session(&session)?;
            request_builder(&target)?.commit_lock(&commit)?
        },
        RequestCommands::Release { lock_id } => RequestBuilder::release_lock(&lock_id)?,
    };

    println!("{document}");
    Ok(())
}

fn handle_response(path: &str, kind: ResponseKind) -> Result<()> {
    let xml = read_input(path)?;
    match kind {
        ResponseKind::Transaction => {
            let exception = parse_exception_report(&xml);
            if !exception.is_empty() {
                print_exception(&exception);
                return Ok(());
            }
            let result = TransactionResult::from_summary(&parse_transaction_response(&xml));
            println!("Inserted: {}", result.inserted);
            println!("Updated:  {}", result.updated);
            println!("Deleted:  {}", result.deleted);
            println!("Replaced: {}", result.replaced);
            if let Some(resource_id) = &result.resource_id {
                println!("Resource id: {resource_id}");
            }
            if let Some(lock_id) = &result.lock_id {
                println!("Lock id: {lock_id}");
            }
        },
        ResponseKind::Lock => {
            let summary = parse_lock_response(&xml);
            match &summary.lock_id {
                Some(lock_id) => println!("Lock id: {lock_id}"),
                None => println!("Lock id: none granted"),
            }
            let or_na = |value: &Option<String>| {
                value.clone().unwrap_or_else(|| "N/A".to_string())
            };
            println!("Matched:   {}", or_na(&summary.number_matched));
            println!("Returned:  {}", or_na(&summary.number_returned));
            println!("Timestamp: {}", or_na(&summary.time_stamp));
        },
        ResponseKind::Exception => {
            let exception = parse_exception_report(&xml);
            if exception.is_empty() {
                println!("Not an exception report.");
            } else {
                print_exception(&exception);
            }
        },
    }
    Ok(())
}

fn print_exception(exception: &ServiceException) {
    println!(
        "Service exception: {}",
        exception
            .code
            .clone()
            .unwrap_or_else(|| "unknown code".to_string())
    );
    if let Some(text) = &exception.text {
        println!("{text}");
    }
}

fn open_lock_store(dir: &str) -> LockSessionStore {
    LockSessionStore::new(Arc::new(FileKeyValueStore::new(dir)))
}

async fn handle_locks(command: LocksCommands) -> Result<()> {
    match command {
        LocksCommands::List {
            dir,
            search,
            page,
            page_size,
        } => {
            let store = open_lock_store(&dir);
            let result = store
                .query(&LockQuery {
                    text: search.unwrap_or_default(),
                    page_number: page,
                    page_size,
                })
                .await?;
            display::display_lock_page(&result);
        },
        LocksCommands::Show { dir, id } => {
            let store = open_lock_store(&dir);
            let session = store
                .get(&id)
                .await?
                .ok_or_else(|| anyhow!("no stored lock session '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        },
        LocksCommands::Sweep { dir } => {
            let store = open_lock_store(&dir);
            let swept = store.sweep().await?;
            println!("Swept {swept} expired session(s).");
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use geowfst_locks::LockSession;

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

    const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="2.0.0"
    xmlns:wfs="http://www.opengis.net/wfs/2.0"
    xmlns:ows="http://www.opengis.net/ows/1.1"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <ows:OperationsMetadata>
    <ows:Operation name="GetFeature">
      <ows:DCP><ows:HTTP>
        <ows:Get xlink:href="https://example.com/geoserver/wfs?"/>
        <ows:Post xlink:href="https://example.com/geoserver/wfs"/>
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
        <ows:Post xlink:href="https://example.com/geoserver/wfs"/>
      </ows:HTTP></ows:DCP>
    </ows:Operation>
  </ows:OperationsMetadata>
  <wfs:FeatureTypeList>
    <wfs:FeatureType>
      <wfs:Name>topp:states</wfs:Name>
      <wfs:Title>USA Population</wfs:Title>
      <wfs:DefaultCRS>urn:ogc:def:crs:EPSG::4326</wfs:DefaultCRS>
      <wfs:OutputFormats>
        <wfs:Format>application/json</wfs:Format>
      </wfs:OutputFormats>
    </wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

    const EXCEPTION_REPORT: &str = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidValue" locator="PERSONS">
    <ows:ExceptionText>Cannot coerce.</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;

    const TRANSACTION_RESPONSE: &str = r#"<wfs:TransactionResponse xmlns:wfs="http://www.opengis.net/wfs/2.0">
  <wfs:TransactionSummary>
    <wfs:totalInserted>1</wfs:totalInserted>
    <wfs:totalUpdated>0</wfs:totalUpdated>
    <wfs:totalDeleted>2</wfs:totalDeleted>
  </wfs:TransactionSummary>
</wfs:TransactionResponse>"#;

    const FEATURE_JSON: &str = r#"{
  "type": "Feature",
  "id": "states.6",
  "geometry": {"type": "Polygon", "coordinates": [[[-88.0, 30.0], [-88.0, 35.0], [-85.0, 35.0], [-88.0, 30.0]]]},
  "properties": {"STATE_NAME": "Alabama", "PERSONS": 4040587}
}"#;

    fn write_temp(content: &str) -> Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        Ok(file)
    }

    fn path_of(file: &tempfile::NamedTempFile) -> String {
        file.path().to_str().unwrap().to_string()
    }

    fn target(schema_path: String) -> RequestTarget {
        RequestTarget {
            schema: schema_path,
            type_name: "topp:states".to_string(),
            srs_name: None,
            output_format: None,
            swap_axes: false,
        }
    }

    #[test]
    fn test_handle_describe_valid_schema() -> Result<()> {
        let schema = write_temp(STATES_SCHEMA)?;
        handle_describe(&path_of(&schema))
    }

    #[test]
    fn test_handle_describe_missing_file() {
        let result = handle_describe("/nonexistent/states.xsd");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot read"));
    }

    #[test]
    fn test_handle_capabilities_resolves_type() -> Result<()> {
        let capabilities = write_temp(CAPABILITIES)?;
        handle_capabilities(&path_of(&capabilities), Some("topp:states"), None)
    }

    #[test]
    fn test_handle_capabilities_unknown_type() -> Result<()> {
        let capabilities = write_temp(CAPABILITIES)?;
        let result = handle_capabilities(&path_of(&capabilities), Some("topp:missing"), None);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_request_builder_applies_overrides() -> Result<()> {
        let schema = write_temp(STATES_SCHEMA)?;
        let mut target = target(path_of(&schema));
        target.output_format = Some("application/json".to_string());

        let builder = request_builder(&target)?;
        let document = builder.get_feature_by_ids(&["states.6".to_string()])?;
        assert!(document.contains(r#"outputFormat="application/json""#));
        assert!(document.contains(r#"count="500""#));
        assert!(document.contains(r#"rid="states.6""#));
        Ok(())
    }

    #[test]
    fn test_insert_document_uses_schema_namespace() -> Result<()> {
        let schema = write_temp(STATES_SCHEMA)?;
        let feature = write_temp(FEATURE_JSON)?;

        let builder = request_builder(&target(path_of(&schema)))?;
        let document = builder.insert(&read_feature(&path_of(&feature))?)?;
        assert!(document.contains("wfs:Transaction"));
        assert!(document.contains(r#"<tns:states xmlns:tns="http://www.openplans.org/topp">"#));
        assert!(document.contains("gml:MultiSurface"));
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_request_update_prints_document() -> Result<()> {
        let schema = write_temp(STATES_SCHEMA)?;
        let feature = write_temp(FEATURE_JSON)?;

        let operation = RequestCommands::Update {
            target: target(path_of(&schema)),
            feature: path_of(&feature),
            properties_only: true,
        };
        handle_request(operation).await
    }

    #[tokio::test]
    async fn test_handle_request_release() -> Result<()> {
        let operation = RequestCommands::Release {
            lock_id: "GeoServer_lock9".to_string(),
        };
        handle_request(operation).await
    }

    #[tokio::test]
    async fn test_commit_request_from_stored_session() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dir_path = dir.path().to_str().unwrap().to_string();

        let store = open_lock_store(&dir_path);
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
        store.apply_removal(&created.id, "states.6").await?;

        let schema = write_temp(STATES_SCHEMA)?;
        let operation = RequestCommands::Commit {
            target: target(path_of(&schema)),
            dir: dir_path,
            session: created.id.clone(),
        };
        handle_request(operation).await
    }

    #[tokio::test]
    async fn test_commit_request_unknown_session() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let schema = write_temp(STATES_SCHEMA)?;

        let operation = RequestCommands::Commit {
            target: target(path_of(&schema)),
            dir: dir.path().to_str().unwrap().to_string(),
            session: "WFSTFeatureLock-gone".to_string(),
        };
        let result = handle_request(operation).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "no stored lock session 'WFSTFeatureLock-gone'"
        );
        Ok(())
    }

    #[test]
    fn test_handle_response_transaction() -> Result<()> {
        let file = write_temp(TRANSACTION_RESPONSE)?;
        handle_response(&path_of(&file), ResponseKind::Transaction)
    }

    #[test]
    fn test_handle_response_transaction_with_exception() -> Result<()> {
        let file = write_temp(EXCEPTION_REPORT)?;
        handle_response(&path_of(&file), ResponseKind::Transaction)
    }

    #[test]
    fn test_handle_response_exception_on_plain_reply() -> Result<()> {
        let file = write_temp(TRANSACTION_RESPONSE)?;
        handle_response(&path_of(&file), ResponseKind::Exception)
    }

    #[tokio::test]
    async fn test_handle_locks_sweep_empty_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        handle_locks(LocksCommands::Sweep {
            dir: dir.path().to_str().unwrap().to_string(),
        })
        .await
    }

    #[tokio::test]
    async fn test_handle_locks_show_missing_session() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let result = handle_locks(LocksCommands::Show {
            dir: dir.path().to_str().unwrap().to_string(),
            id: "WFSTFeatureLock-gone".to_string(),
        })
        .await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "no stored lock session 'WFSTFeatureLock-gone'"
        );
        Ok(())
    }
}

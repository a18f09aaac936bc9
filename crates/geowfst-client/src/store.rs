//! The transactional feature store.
//!
//! [`WfstFeatureStore`] turns feature edits into WFS-T round trips against
//! one feature type at one endpoint: add, put, remove, query by resource
//! id, lock acquisition and the transaction committing a locked editing
//! session.
//!
//! Every mutating call follows the same shape. The schema template is
//! fetched once per store via DescribeFeatureType and cached; requests are
//! built against it, POSTed through the service layer and their response
//! parsed into a [`TransactionOutcome`]. Remote failures a caller is
//! expected to handle come back as outcome variants, not errors; only
//! conditions that stop a request from being built at all (no schema, an
//! incompatible geometry) use the error channel. A zero-count response is
//! the soft [`TransactionOutcome::NoEffect`], never a hard failure.
//!
//! Successful mutations notify subscribed observers synchronously with a
//! [`StoreEvent`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::warn;
use tokio::sync::OnceCell;

use geowfst_gml::{EncodeOptions, Feature};
use geowfst_locks::LockSession;
use geowfst_protocol::{
    FeatureTypeDescriptor, LockCommit, RequestBuilder, TransactionSummary, WFS_VERSION,
    parse_lock_response, parse_transaction_response, standardize_properties,
};

use crate::capabilities::{
    JSON_OUTPUT_FORMAT, ServiceCapabilities, WfstOperations, is_json_format, select_output_format,
};
use crate::codec;
use crate::error::{RemoteError, Result, WfstError};
use crate::service::{ServiceConfig, WfstService};
use crate::transport::{HttpMethod, Transport};

/// Lock lifetime requested when the caller does not choose one, in
/// minutes.
const DEFAULT_LOCK_EXPIRY_MINUTES: u32 = 5;

/// Totals and identifiers reported by a committed transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionResult {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
    pub replaced: u64,
    /// First inserted resource id, when the response carried one.
    pub resource_id: Option<String>,
    /// Lock id echoed by release-lock responses.
    pub lock_id: Option<String>,
}

impl TransactionResult {
    /// Reads the counts out of a parsed summary. Missing or non-numeric
    /// totals count as zero.
    #[must_use]
    pub fn from_summary(summary: &TransactionSummary) -> Self {
        Self {
            inserted: count(summary.total_inserted.as_deref()),
            updated: count(summary.total_updated.as_deref()),
            deleted: count(summary.total_deleted.as_deref()),
            replaced: count(summary.total_replaced.as_deref()),
            resource_id: summary.resource_id.clone(),
            lock_id: summary.lock_id.clone(),
        }
    }

    /// Sum of all four totals.
    #[must_use]
    pub fn total_changes(&self) -> u64 {
        self.inserted + self.updated + self.deleted + self.replaced
    }
}

fn count(raw: Option<&str>) -> u64 {
    raw.and_then(|text| text.trim().parse().ok()).unwrap_or(0)
}

/// How a mutating call ended.
///
/// Remote failures are outcomes rather than errors so a caller can match
/// on them without unwinding; the service already classified the status
/// for display.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionOutcome {
    /// The server reported at least the expected change.
    Committed(TransactionResult),
    /// Declared properties were missing from the input; nothing was sent.
    /// Carries the feature with every declared property filled in, the
    /// missing ones at their zero values, for the caller to complete.
    IncompleteProperties(Feature),
    /// The response parsed but reported zero affected records.
    NoEffect,
    /// HTTP 400 with the parsed exception details.
    Rejected { code: String, text: String },
    /// HTTP 401.
    Unauthorized,
    /// HTTP 500.
    ServerError,
    /// Any other non-2xx status.
    HttpError(u16),
    /// No response was obtained at all.
    TransportFailed(String),
}

impl TransactionOutcome {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, TransactionOutcome::Committed(_))
    }
}

impl From<RemoteError> for TransactionOutcome {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Rejected { code, text } => Self::Rejected { code, text },
            RemoteError::Unauthorized => Self::Unauthorized,
            RemoteError::Server => Self::ServerError,
            RemoteError::Other { status } => Self::HttpError(status),
            RemoteError::Transport { message } => Self::TransportFailed(message),
        }
    }
}

/// Change notification delivered to subscribers after a successful
/// mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// A feature was inserted; its id is the server-assigned resource id
    /// when the response carried one.
    Added { id: String, feature: Feature },
    Updated { id: String, feature: Feature },
    Removed { id: String },
}

/// Handle returned by [`WfstFeatureStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

type Observer = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// A query reply, decoded when the configured output format is JSON and
/// passed through verbatim otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryReply {
    Features(Vec<Feature>),
    Raw(String),
}

/// Everything a store needs to know about one feature type at one
/// endpoint.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Qualified feature type name, e.g. `topp:states`.
    pub type_name: String,
    /// Base URL for GET requests.
    pub service_url: String,
    /// Transaction POST URL when it differs from `service_url`.
    pub post_service_url: Option<String>,
    /// Protocol version stamped on DescribeFeatureType requests.
    pub version: String,
    /// Output format requested on queries.
    pub output_format: String,
    /// CRS stamped on outgoing geometries; empty keeps each geometry's
    /// own.
    pub srs_name: String,
    /// Flip the CRS-resolved axis order when encoding coordinates.
    pub swap_axes: bool,
    /// HTTP methods the endpoint accepts for GetFeature.
    pub methods: Vec<HttpMethod>,
    /// Advertised WFS-T operations, carried from the capabilities
    /// document.
    pub operations: WfstOperations,
    /// Extra headers sent with every request.
    pub request_headers: Vec<(String, String)>,
    /// Whether ambient credentials travel with requests.
    pub credentials: bool,
}

impl StoreConfig {
    /// A minimal configuration: WFS 2.0.0, JSON output, both HTTP
    /// methods, no advertised operations.
    #[must_use]
    pub fn new(type_name: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            service_url: service_url.into(),
            post_service_url: None,
            version: WFS_VERSION.to_string(),
            output_format: JSON_OUTPUT_FORMAT.to_string(),
            srs_name: String::new(),
            swap_axes: false,
            methods: vec![HttpMethod::Get, HttpMethod::Post],
            operations: WfstOperations::default(),
            request_headers: Vec::new(),
            credentials: false,
        }
    }

    /// Configuration resolved from a parsed capabilities document: the
    /// catalog entry supplies the CRS and the offered output formats, the
    /// Transaction operation supplies the POST endpoint, and the
    /// requested HTTP methods are merged against the advertised ones.
    ///
    /// # Errors
    ///
    /// [`WfstError::UnknownFeatureType`] when the catalog has no entry
    /// for `type_name`.
    pub fn from_capabilities(
        capabilities: &ServiceCapabilities,
        service_url: impl Into<String>,
        type_name: &str,
        requested_methods: &[HttpMethod],
    ) -> Result<Self> {
        let entry = capabilities
            .feature_type(type_name)
            .ok_or_else(|| WfstError::UnknownFeatureType {
                name: type_name.to_string(),
            })?;

        let mut advertised = Vec::new();
        if capabilities.get_feature_get.is_some() {
            advertised.push(HttpMethod::Get);
        }
        if capabilities.get_feature_post.is_some() {
            advertised.push(HttpMethod::Post);
        }

        let mut config = Self::new(type_name, service_url);
        config.version = capabilities.version.clone();
        config.output_format = select_output_format(
            std::slice::from_ref(&capabilities.version),
            &entry.output_formats,
        );
        config.srs_name = entry.default_crs.clone().unwrap_or_default();
        config.post_service_url = capabilities
            .operations
            .transaction
            .as_ref()
            .and_then(|operation| operation.post.clone());
        config.methods = merge_methods(requested_methods, &advertised);
        config.operations = capabilities.operations.clone();
        Ok(config)
    }

    /// The request builder for this configuration and a parsed schema.
    #[must_use]
    pub fn request_builder(&self, descriptor: FeatureTypeDescriptor) -> RequestBuilder {
        let encode = EncodeOptions {
            invert_axes: self.swap_axes,
            ..EncodeOptions::default()
        };
        let mut builder = RequestBuilder::new(self.type_name.clone(), descriptor)
            .with_output_format(self.output_format.clone())
            .with_encode_options(encode);
        if !self.srs_name.is_empty() {
            builder = builder.with_srs_name(self.srs_name.clone());
        }
        builder
    }

    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            service_url: self.service_url.clone(),
            post_service_url: self.post_service_url.clone(),
            request_headers: self.request_headers.clone(),
            credentials: self.credentials,
        }
    }
}

/// Intersects the requested HTTP methods with the advertised ones. An
/// empty request accepts the advertised set; an empty intersection warns
/// and falls back to it.
#[must_use]
pub fn merge_methods(requested: &[HttpMethod], advertised: &[HttpMethod]) -> Vec<HttpMethod> {
    if requested.is_empty() {
        return advertised.to_vec();
    }
    let merged: Vec<HttpMethod> = requested
        .iter()
        .copied()
        .filter(|method| advertised.contains(method))
        .collect();
    if merged.is_empty() {
        warn!("none of the requested HTTP methods are advertised; keeping the advertised set");
        return advertised.to_vec();
    }
    merged
}

/// Transactional store for one WFS feature type.
pub struct WfstFeatureStore {
    config: StoreConfig,
    service: WfstService,
    schema: OnceCell<RequestBuilder>,
    observers: Mutex<HashMap<u64, Observer>>,
    next_observer: AtomicU64,
}

impl WfstFeatureStore {
    /// Binds the configuration to a transport. The schema template is
    /// fetched lazily on the first call that needs it.
    ///
    /// # Errors
    ///
    /// [`WfstError::InvalidUrl`] when a configured URL does not parse.
    pub fn new(config: StoreConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let service = WfstService::new(config.service_config(), transport)?;
        Ok(Self {
            config,
            service,
            schema: OnceCell::new(),
            observers: Mutex::new(HashMap::new()),
            next_observer: AtomicU64::new(0),
        })
    }

    /// Like [`WfstFeatureStore::new`] but with the feature type schema
    /// already in hand, skipping the DescribeFeatureType round trip.
    ///
    /// # Errors
    ///
    /// [`WfstError::InvalidUrl`] when a configured URL does not parse.
    pub fn with_descriptor(
        config: StoreConfig,
        transport: Arc<dyn Transport>,
        descriptor: FeatureTypeDescriptor,
    ) -> Result<Self> {
        let service = WfstService::new(config.service_config(), transport)?;
        let schema = OnceCell::new_with(Some(config.request_builder(descriptor)));
        Ok(Self {
            config,
            service,
            schema,
            observers: Mutex::new(HashMap::new()),
            next_observer: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// `"{service url}|{type name}"`, both trimmed. Stable across store
    /// instances pointed at the same feature type.
    #[must_use]
    pub fn store_identity(&self) -> String {
        format!(
            "{}|{}",
            self.config.service_url.trim(),
            self.config.type_name.trim()
        )
    }

    /// Whether the carried capabilities advertise `Transaction`.
    #[must_use]
    pub fn transaction_capable(&self) -> bool {
        self.config.operations.transaction_capable()
    }

    /// Inserts a feature.
    ///
    /// Properties are standardized against the schema first; when a
    /// declared property is missing the call returns
    /// [`TransactionOutcome::IncompleteProperties`] with the defaulted
    /// feature and nothing is sent. On success the returned resource id
    /// replaces the feature id in the emitted [`StoreEvent::Added`].
    ///
    /// # Errors
    ///
    /// Schema unavailability and geometry incompatibility; remote
    /// failures come back as outcome variants.
    pub async fn add(&self, feature: &Feature) -> Result<TransactionOutcome> {
        let builder = self.builder().await?;

        let standardized = standardize_properties(builder.descriptor(), &feature.properties);
        let mut prepared = feature.clone();
        prepared.properties = standardized.properties;
        if !standardized.valid {
            warn!(
                "feature for {} is missing declared properties",
                self.config.type_name
            );
            return Ok(TransactionOutcome::IncompleteProperties(prepared));
        }

        let body = builder.insert(&prepared)?;
        let response = match self.service.transaction(body).await {
            Ok(response) => response,
            Err(error) => return Ok(error.into()),
        };

        let result = TransactionResult::from_summary(&parse_transaction_response(&response));
        if result.inserted == 0 {
            warn!("insert into {} affected no records", self.config.type_name);
            return Ok(TransactionOutcome::NoEffect);
        }
        if let Some(rid) = &result.resource_id {
            prepared.id = Some(rid.clone());
        }
        self.emit(&StoreEvent::Added {
            id: prepared.id.clone().unwrap_or_default(),
            feature: prepared,
        });
        Ok(TransactionOutcome::Committed(result))
    }

    /// Updates a feature in place, geometry included.
    ///
    /// # Errors
    ///
    /// Schema unavailability, a missing feature id and geometry
    /// incompatibility; remote failures come back as outcome variants.
    pub async fn put(&self, feature: &Feature) -> Result<TransactionOutcome> {
        self.update_feature(feature, false).await
    }

    /// Updates only the scalar properties of a feature.
    ///
    /// # Errors
    ///
    /// Same conditions as [`WfstFeatureStore::put`].
    pub async fn put_properties(&self, feature: &Feature) -> Result<TransactionOutcome> {
        self.update_feature(feature, true).await
    }

    async fn update_feature(
        &self,
        feature: &Feature,
        properties_only: bool,
    ) -> Result<TransactionOutcome> {
        let builder = self.builder().await?;
        let body = builder.update(feature, properties_only)?;
        let response = match self.service.transaction(body).await {
            Ok(response) => response,
            Err(error) => return Ok(error.into()),
        };

        let result = TransactionResult::from_summary(&parse_transaction_response(&response));
        if result.updated == 0 {
            warn!(
                "update of {:?} in {} affected no records",
                feature.id, self.config.type_name
            );
            return Ok(TransactionOutcome::NoEffect);
        }

        // The canonical id stays the caller's; a different resource id in
        // the response is logged, not adopted.
        let id = feature.id.clone().unwrap_or_default();
        if let Some(rid) = &result.resource_id
            && *rid != id
        {
            warn!("update response named resource id {rid}, expected {id}");
        }
        self.emit(&StoreEvent::Updated {
            id,
            feature: feature.clone(),
        });
        Ok(TransactionOutcome::Committed(result))
    }

    /// Deletes a feature by resource id.
    ///
    /// # Errors
    ///
    /// Schema unavailability; remote failures come back as outcome
    /// variants.
    pub async fn remove(&self, id: &str) -> Result<TransactionOutcome> {
        let builder = self.builder().await?;
        let body = builder.delete(id)?;
        let response = match self.service.transaction(body).await {
            Ok(response) => response,
            Err(error) => return Ok(error.into()),
        };

        let result = TransactionResult::from_summary(&parse_transaction_response(&response));
        if result.deleted == 0 {
            warn!(
                "delete of {id} in {} affected no records",
                self.config.type_name
            );
            return Ok(TransactionOutcome::NoEffect);
        }
        self.emit(&StoreEvent::Removed { id: id.to_string() });
        Ok(TransactionOutcome::Committed(result))
    }

    /// Fetches features by resource id through the transaction channel.
    ///
    /// JSON output formats are decoded into features; anything else comes
    /// back as the raw response body for the caller's own codec.
    ///
    /// # Errors
    ///
    /// Schema unavailability, remote failures and, for JSON replies, a
    /// body that does not decode.
    pub async fn query_by_ids(&self, ids: &[String]) -> Result<QueryReply> {
        let builder = self.builder().await?;
        let body = builder.get_feature_by_ids(ids)?;
        let response = self.service.transaction(body).await?;
        if is_json_format(&self.config.output_format) {
            return Ok(QueryReply::Features(codec::features_from_json(&response)?));
        }
        Ok(QueryReply::Raw(response))
    }

    /// Locks features without fetching them.
    ///
    /// The returned session starts with every id in `unchanged` and is
    /// not yet persisted; hand it to a session store to keep it.
    ///
    /// # Errors
    ///
    /// Schema unavailability, remote failures, and
    /// [`WfstError::LockNotGranted`] when the response carries no lock
    /// id.
    pub async fn lock_features(
        &self,
        ids: &[String],
        expiry_minutes: Option<u32>,
    ) -> Result<LockSession> {
        let builder = self.builder().await?;
        let body = builder.lock_features(ids, expiry_minutes)?;
        let response = self.service.transaction(body).await?;
        self.session_from_lock(ids, expiry_minutes, &response)
    }

    /// Locks features and fetches them in the same round trip. The
    /// response's feature payload is not decoded here; only the lock
    /// metadata feeds the session.
    ///
    /// # Errors
    ///
    /// Same conditions as [`WfstFeatureStore::lock_features`].
    pub async fn get_feature_with_lock(
        &self,
        ids: &[String],
        expiry_minutes: Option<u32>,
    ) -> Result<LockSession> {
        let builder = self.builder().await?;
        let body = builder.get_feature_with_lock(ids, expiry_minutes)?;
        let response = self.service.transaction(body).await?;
        self.session_from_lock(ids, expiry_minutes, &response)
    }

    /// Commits a locked editing session: one transaction carrying the
    /// session's inserts, updates and deletes under its lock id.
    ///
    /// Zero totals are not a failure here; a session of pure no-ops
    /// commits cleanly.
    ///
    /// # Errors
    ///
    /// Schema unavailability, a session payload that does not decode, and
    /// geometry incompatibility; remote failures come back as outcome
    /// variants.
    pub async fn commit_lock_session(&self, session: &LockSession) -> Result<TransactionOutcome> {
        let builder = self.builder().await?;
        let commit = lock_commit_from_session(session)?;
        let body = builder.commit_lock(&commit)?;
        let response = match self.service.transaction(body).await {
            Ok(response) => response,
            Err(error) => return Ok(error.into()),
        };
        let result = TransactionResult::from_summary(&parse_transaction_response(&response));
        Ok(TransactionOutcome::Committed(result))
    }

    /// Releases a lock without committing anything.
    ///
    /// # Errors
    ///
    /// Remote failures come back as outcome variants; this never needs
    /// the schema.
    pub async fn release_lock(&self, lock_id: &str) -> Result<TransactionOutcome> {
        let body = RequestBuilder::release_lock(lock_id)?;
        let response = match self.service.transaction(body).await {
            Ok(response) => response,
            Err(error) => return Ok(error.into()),
        };
        let result = TransactionResult::from_summary(&parse_transaction_response(&response));
        Ok(TransactionOutcome::Committed(result))
    }

    /// Registers an observer called synchronously after every successful
    /// mutation.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionHandle
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let handle = self.next_observer.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(observer));
        SubscriptionHandle(handle)
    }

    /// Removes an observer. Returns false when the handle was already
    /// gone.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0)
            .is_some()
    }

    async fn builder(&self) -> Result<&RequestBuilder> {
        self.schema.get_or_try_init(|| self.fetch_template()).await
    }

    async fn fetch_template(&self) -> Result<RequestBuilder> {
        let xml = self
            .service
            .describe_feature_type(&self.config.type_name, &self.config.version)
            .await
            .map_err(|error| WfstError::SchemaUnavailable {
                message: error.to_string(),
            })?;
        let descriptor =
            FeatureTypeDescriptor::parse(&xml).map_err(|error| WfstError::SchemaUnavailable {
                message: error.to_string(),
            })?;
        Ok(self.config.request_builder(descriptor))
    }

    fn session_from_lock(
        &self,
        ids: &[String],
        expiry_minutes: Option<u32>,
        response: &str,
    ) -> Result<LockSession> {
        let summary = parse_lock_response(response);
        let Some(lock_id) = summary.lock_id else {
            return Err(WfstError::LockNotGranted);
        };
        Ok(LockSession {
            lock_id,
            type_name: self.config.type_name.clone(),
            srs_name: self.config.srs_name.clone(),
            expiry: expiry_minutes.unwrap_or(DEFAULT_LOCK_EXPIRY_MINUTES),
            unchanged: ids.to_vec(),
            time_stamp: summary.time_stamp,
            number_matched: summary.number_matched,
            number_returned: summary.number_returned,
            ..LockSession::default()
        })
    }

    fn emit(&self, event: &StoreEvent) {
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for observer in observers {
            observer(event);
        }
    }
}

/// Decodes a session's buckets into the flat commit document input:
/// inserts, then updates with their properties-only flags, then deletes.
///
/// # Errors
///
/// Fails when a persisted feature payload no longer parses as GeoJSON.
pub fn lock_commit_from_session(session: &LockSession) -> Result<LockCommit> {
    let mut commit = LockCommit {
        lock_id: session.lock_id.clone(),
        ..LockCommit::default()
    };
    for inserted in &session.inserted {
        commit.inserts.push(codec::feature_from_json(&inserted.feature)?);
    }
    for edited in &session.updated {
        let mut feature = codec::feature_from_json(&edited.feature)?;
        feature.id.get_or_insert_with(|| edited.id.clone());
        commit.updates.push((feature, edited.properties_only));
    }
    commit.deletes = session.deleted.clone();
    Ok(commit)
}

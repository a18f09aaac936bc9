//! `geowfst-client` is the orchestration layer of the `geowfst` project:
//! a transactional WFS feature store over an injected HTTP transport.
//!
//! This crate includes:
//! - **Transport Seam**: the [`Transport`] trait plus the request and
//!   response shapes it exchanges; any HTTP client can sit behind it.
//! - **Service Layer**: [`WfstService`] owns the endpoint URLs and turns
//!   HTTP statuses into classified remote failures.
//! - **Capabilities**: a lenient GetCapabilities reader feeding store
//!   configuration, output-format selection included.
//! - **Feature Store**: [`WfstFeatureStore`] implements add, put, remove,
//!   query by id, lock acquisition and locked-session commits, with
//!   schema-template caching and change notifications.
//! - **GeoJSON Codec**: feature conversion for lock-session payloads and
//!   JSON query replies.

pub mod capabilities;
pub mod codec;
pub mod error;
pub mod service;
pub mod store;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use capabilities::{
    FeatureTypeEntry, ServiceCapabilities, WfstOperation, WfstOperations, select_output_format,
};
pub use error::{CodecError, RemoteError, Result, WfstError};
pub use service::{ServiceConfig, WfstService};
pub use store::{
    QueryReply, StoreConfig, StoreEvent, SubscriptionHandle, TransactionOutcome,
    TransactionResult, WfstFeatureStore, lock_commit_from_session, merge_methods,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

//! WFS-T 2.0 protocol documents.
//!
//! Everything a transactional WFS client exchanges with a server is built
//! or read here:
//!
//! - **Schema introspection**: [`FeatureTypeDescriptor`] reduces a
//!   DescribeFeatureType document to the geometry element and scalar
//!   properties a feature type declares.
//! - **Request building**: [`RequestBuilder`] emits GetFeature queries,
//!   insert/update/delete transactions, lock documents and the single
//!   transaction that commits a locked editing session.
//! - **Response parsing**: lenient readers for transaction summaries,
//!   lock metadata and `ows:ExceptionReport` bodies.
//!
//! Requests are built against the schema: a feature's geometry is
//! validated and widened to the declared shape before it is serialized,
//! so incompatible edits fail before they reach the network.

pub mod error;
pub mod requests;
pub mod responses;
pub mod schema;

// Re-export commonly used types
pub use error::{ProtocolError, Result};
pub use requests::{DEFAULT_OUTPUT_FORMAT, LockCommit, RequestBuilder, WFS_VERSION};
pub use responses::{
    LockSummary, ServiceException, TransactionSummary, parse_exception_report,
    parse_lock_response, parse_transaction_response,
};
pub use schema::{
    FeatureElement, FeatureTypeDescriptor, GeometryField, PropertyField, ScalarType,
    SchemaGeometryType, StandardizedProperties, standardize_properties,
};

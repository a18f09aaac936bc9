//! Error types for the WFS-T client.
//!
//! [`WfstError`] is the root error: it aggregates the lower crates'
//! errors transparently and adds the client-only conditions that stop an
//! operation before any request is sent. Remote failures that a caller
//! is expected to handle (rejections, authorization, server errors) are
//! not raised through it on the mutation paths; those return a
//! [`TransactionOutcome`](crate::store::TransactionOutcome) instead.

use thiserror::Error;

/// Main error type for WFS-T client operations.
#[derive(Debug, Error)]
pub enum WfstError {
    /// Geometry encoding or decoding failed
    #[error(transparent)]
    Gml(#[from] geowfst_gml::GmlError),

    /// Schema introspection, request building or response handling failed
    #[error(transparent)]
    Protocol(#[from] geowfst_protocol::ProtocolError),

    /// Lock-session persistence failed
    #[error(transparent)]
    Lock(#[from] geowfst_locks::LockError),

    /// GeoJSON conversion failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A query or schema request failed at the HTTP or transport level
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The DescribeFeatureType round trip failed; mutation is blocked
    /// until the schema template can be loaded.
    #[error("feature type schema unavailable: {message}")]
    SchemaUnavailable {
        /// What went wrong fetching or parsing the schema
        message: String,
    },

    /// A configured service URL could not be parsed
    #[error("invalid service URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser diagnostic
        message: String,
    },

    /// The capabilities document does not advertise the feature type
    #[error("no feature type '{name}' in the capabilities document")]
    UnknownFeatureType {
        /// The requested feature type name
        name: String,
    },

    /// A lock request succeeded at the HTTP level but carried no lock id
    #[error("the server granted no lock id")]
    LockNotGranted,
}

/// A classified remote failure: the HTTP status buckets the original
/// service distinguishes, plus transport failures that produced no
/// status at all.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP 400 with the OWS exception details parsed out of the body
    #[error("{code}: {text}")]
    Rejected {
        /// Exception code, `Error 400` when the body carried none
        code: String,
        /// Exception text, `Bad Request` when the body carried none
        text: String,
    },

    /// HTTP 401
    #[error("Unauthorized")]
    Unauthorized,

    /// HTTP 500
    #[error("Internal Server Error")]
    Server,

    /// Any other non-2xx status
    #[error("Error Code {status}")]
    Other {
        /// The HTTP status code
        status: u16,
    },

    /// No response was obtained at all
    #[error("Unknown Error: {message}")]
    Transport {
        /// The transport's own diagnostic
        message: String,
    },
}

/// GeoJSON conversion errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A position array was too short to carry x and y
    #[error("a GeoJSON position needs at least two ordinates, got {count}")]
    ShortPosition {
        /// Number of ordinates found
        count: usize,
    },

    /// The document held a different GeoJSON object than required
    #[error("expected a GeoJSON {expected}, got {found}")]
    UnexpectedValue {
        /// What the caller needed
        expected: &'static str,
        /// What the document contained
        found: String,
    },

    /// The text was not valid GeoJSON
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    /// The text was not valid JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results using `WfstError`.
pub type Result<T> = std::result::Result<T, WfstError>;

impl WfstError {
    /// Get a user-friendly error message.
    ///
    /// Formats the error the way it should be shown to an end user, with
    /// enough context to act on.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote(e) => e.user_message(),
            Self::SchemaUnavailable { message } => {
                format!("The feature type schema could not be loaded: {message}")
            },
            Self::UnknownFeatureType { name } => {
                format!("The service does not offer a feature type named '{name}'.")
            },
            Self::LockNotGranted => "The server did not grant a feature lock.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Remote(e) => e.recovery_suggestion(),
            Self::SchemaUnavailable { .. } => Some(
                "Check that the service URL answers DescribeFeatureType requests.".to_string(),
            ),
            Self::UnknownFeatureType { .. } => {
                Some("List the capabilities document to see the advertised types.".to_string())
            },
            Self::InvalidUrl { .. } => {
                Some("Ensure the service URL includes a scheme and a host.".to_string())
            },
            Self::LockNotGranted => Some(
                "The features may already be locked; retry once the other lock expires."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl RemoteError {
    fn user_message(&self) -> String {
        match self {
            Self::Rejected { code, text } => format!("{code}:\r\n{text}"),
            Self::Unauthorized | Self::Server | Self::Other { .. } => {
                format!("WFS-T:\r\n{self}")
            },
            Self::Transport { .. } => "WFS-T: Unknown Error".to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Rejected { .. } => {
                Some("Check the request against the service exception text.".to_string())
            },
            Self::Unauthorized => Some("Provide credentials for the service.".to_string()),
            Self::Transport { .. } => {
                Some("Check the network connection and the service URL.".to_string())
            },
            Self::Server | Self::Other { .. } => None,
        }
    }
}

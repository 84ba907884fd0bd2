/// Error types shared by the Savanna, Glance and Nova clients
use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by the cluster-service client and its collaborators
#[derive(Error, Debug)]
pub enum SavannaError {
    /// The service could not be reached (connect, TLS, timeout)
    #[error("Failed to reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a status the operation does not accept
    #[error("API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body was not the JSON shape we expected
    #[error("Failed to parse {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required field was absent from an otherwise valid response
    #[error("Response for {context} is missing field '{field}'")]
    MissingField { context: String, field: &'static str },

    /// An image, VM or flavor lookup failed
    #[error("Failed to resolve {what} '{id}': {source}")]
    Lookup {
        what: &'static str,
        id: String,
        #[source]
        source: Box<SavannaError>,
    },

    /// A flavor, image or server does not exist
    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },

    /// An id that is not a single URL path segment
    #[error("Invalid resource id '{0}'")]
    InvalidResourceId(String),

    #[error("Invalid node type '{0}'")]
    InvalidNodeType(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SavannaError>;

impl SavannaError {
    /// Wrap a collaborator failure with what was being resolved
    pub fn lookup(what: &'static str, id: impl Into<String>, source: SavannaError) -> Self {
        SavannaError::Lookup {
            what,
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// True when the service was reached and rejected the request
    pub fn is_rejected(&self) -> bool {
        matches!(self, SavannaError::Status { .. })
    }
}

/// Opt back into the swallow-and-continue behaviour for list views.
///
/// Only a status rejection turns into an empty list; transport, decode and
/// lookup failures still propagate.
pub trait OrEmptyWhenRejected<T> {
    fn or_empty_when_rejected(self) -> Result<Vec<T>>;
}

impl<T> OrEmptyWhenRejected<T> for Result<Vec<T>> {
    fn or_empty_when_rejected(self) -> Result<Vec<T>> {
        match self {
            Err(e) if e.is_rejected() => {
                tracing::warn!("Treating rejected list request as empty: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

//! Error types for sandpiper-core.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for sandpiper-core operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while reconciling a sandbox.
///
/// The validation variants are local failures raised before any network
/// call. Everything else is fatal to the current reconciliation attempt;
/// no error is retried inside this crate.
#[derive(Debug, Error)]
pub enum ClientError {
    /// owner_email does not match the accepted email shape
    #[error("invalid owner_email: {0}")]
    InvalidEmail(String),

    /// ttl_days is outside the accepted range
    #[error("ttl_days must be between 1 and 30, got {0}")]
    InvalidTtl(i64),

    /// An entry of allowed_cidrs does not match the dotted-quad shape
    #[error("invalid cidr range in allowed_cidrs: {0}")]
    InvalidCidr(String),

    /// Update or delete was requested without a sandbox id
    #[error("sandbox_id is required for {action}")]
    MissingResourceId {
        /// The action that needed the id
        action: &'static str,
    },

    /// Connection, DNS, TLS, or request timeout failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// The control plane rejected the request
    #[error("API failure: status {status}")]
    Api {
        /// HTTP status code of the rejection
        status: u16,
        /// Error body returned by the control plane, verbatim
        body: serde_json::Value,
    },

    /// A long-running operation did not reach a terminal phase in time
    #[error("operation {operation_id} did not reach a terminal phase within {waited:?}")]
    PollTimeout {
        /// Reference of the operation that was being polled
        operation_id: String,
        /// How long the poller waited before giving up
        waited: Duration,
    },

    /// A response status outside the known success and error sets
    #[error("unhandled response status {status} from {path}")]
    UnexpectedStatus {
        /// HTTP status code that was received
        status: u16,
        /// Request path that produced it
        path: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error taxonomy for board operations.
//!
//! Every failure leaves the in-memory board in a previously-valid state:
//! optimistic writes are rolled back before the error reaches the caller,
//! and no error is fatal to the application.

use thiserror::Error;

/// Failures surfaced by board operations.
#[derive(Debug, Error)]
pub enum BoardError {
    /// A mutation or deletion was attempted on an entity the server has not
    /// assigned an id yet. Refused locally; no network call is made and no
    /// state changes.
    #[error("{entity} has no server-assigned id")]
    MissingIdentifier { entity: &'static str },

    /// Input rejected before any network call.
    #[error("validation failed: {detail}")]
    ValidationFailed { detail: String },

    /// A field mutation failed remotely. The optimistic value has already
    /// been rolled back when this is returned; `detail` carries the
    /// server-provided message when one was present.
    #[error("failed to update {field} on task {entity_id}: {detail}")]
    RemoteMutationFailed {
        field: &'static str,
        entity_id: String,
        detail: String,
    },

    /// A non-mutation gateway call failed (listing, creation, deletion).
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Transport and protocol failures reported by the remote gateways.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The server answered with an error status. The payload is the
    /// server-provided detail when the response body carried one, otherwise
    /// the bare HTTP status.
    #[error("server rejected the request: {0}")]
    Rejected(String),

    #[error("could not decode server response: {0}")]
    Decode(String),
}

//! Error types for each layer of the session client.

use thiserror::Error;

/// Errors returned by the backend collaborator (`AuthApi`).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered 401: the credential is missing, invalid or expired.
    #[error("credential rejected by backend")]
    Unauthorized,

    /// The backend answered with another non-success status.
    #[error("backend rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// A success response carried a body that could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Errors raised by a durable client storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage contents are corrupt: {0}")]
    Corrupt(String),

    #[error("storage i/o failed")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced to callers of `SessionStore`.
///
/// Login and registration failures keep the underlying cause as their source,
/// while the user-facing notification stays generic.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("login failed")]
    LoginFailed(#[source] ApiError),

    #[error("incomplete form: {0} is required")]
    IncompleteForm(&'static str),

    #[error("unknown role: {0:?}")]
    InvalidRole(String),

    #[error("registration failed")]
    RegistrationFailed(#[source] ApiError),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("session expired")]
    Expired,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

use thiserror::Error;

/// Failure taxonomy for the relay pipeline.
///
/// Verdict-level outcomes from a reachable backend (duplicate, rejection,
/// unrecognized payload) are data, not errors; see
/// [`crate::services::backend::UploadVerdict`]. Everything here is terminal
/// for the operation that produced it and is converted to a user-visible
/// reply at the handler boundary.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Downloading or persisting the inbound file locally failed.
    #[error("staging failed: {0}")]
    Staging(String),

    /// Network-level failure talking to the backend, timeouts included.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

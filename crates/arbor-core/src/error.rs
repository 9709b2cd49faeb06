//! Error taxonomy for the graph engine

use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum Error {
    /// Cooperative cancellation surfaced at a loop or I/O boundary.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid or missing configuration. Fatal before any scan/build work.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Bail out with `Error::Cancelled` if the token has been triggered.
pub fn check_cancelled(ct: &CancellationToken) -> Result<()> {
    if ct.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

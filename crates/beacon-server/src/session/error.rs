//! Why a session pump stopped.

use beacon_core::errors::ReportError;
use thiserror::Error;

/// A pump failure. Logged when the session ends, never sent to the peer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from the peer failed.
    #[error("read failed: {0}")]
    Read(#[source] axum::Error),
    /// Writing to the peer failed.
    #[error("write failed: {0}")]
    Write(#[source] axum::Error),
    /// The peer sent something that is not a coordinate report.
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl SessionError {
    /// Short label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::Report(_) => "report",
        }
    }
}

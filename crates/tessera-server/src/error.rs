//! Server error types.

use std::path::PathBuf;

/// Error starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Static file root is missing or not a directory.
    #[error("Site root is not a directory: {}", .0.display())]
    RootDir(PathBuf),

    /// Listener could not be bound.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address as configured (`host:port`).
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Server failed while running.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

//! HTTP server for Tessera.
//!
//! Serves a static site with axum and composes every HTML response on the
//! way out: `<include>` directives are replaced by the fragments they name,
//! with `<fill>` content placed into the fragments' slots.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use std::time::Duration;
//! use tessera_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 7878,
//!         root_dir: PathBuf::from("public"),
//!         base_url: None,
//!         timeout: Duration::from_secs(30),
//!         max_body_bytes: 16 * 1024 * 1024,
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (tessera-server)
//!                        │
//!                        ├─► TraceLayer
//!                        │
//!                        ├─► compose middleware ──► Composer (blocking pool)
//!                        │                              │
//!                        │                              └─► HTTP GET per include
//!                        │
//!                        └─► Static files (tower-http ServeDir)
//! ```

mod app;
mod error;
mod middleware;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tessera_compose::{Composer, DEFAULT_TIMEOUT, HttpSource};
use tessera_config::DEFAULT_MAX_BODY_BYTES;

pub use error::ServerError;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory static files are served from.
    pub root_dir: PathBuf,
    /// Origin include paths are resolved against (`None` uses the request's
    /// `Host` header).
    pub base_url: Option<String>,
    /// Timeout for a single fragment fetch.
    pub timeout: Duration,
    /// Largest HTML body composed; larger responses are served as-is.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7878,
            root_dir: PathBuf::from("public"),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the root directory is missing, the address can't be
/// bound, or the server fails while running.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    if !config.root_dir.is_dir() {
        return Err(ServerError::RootDir(config.root_dir));
    }

    let state = Arc::new(AppState {
        composer: Composer::new(Arc::new(HttpSource::new(config.timeout))),
        base_url: config.base_url.clone(),
        max_body_bytes: config.max_body_bytes,
    });
    let app = app::create_router(state, &config.root_dir);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(
        address = %address,
        root_dir = %config.root_dir.display(),
        "Starting server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from Tessera config.
#[must_use]
pub fn server_config_from_config(config: &tessera_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root_dir: config.site_resolved.root_dir.clone(),
        base_url: config.includes.base_url.clone(),
        timeout: config.includes.timeout(),
        max_body_bytes: config.server.max_body_bytes,
    }
}

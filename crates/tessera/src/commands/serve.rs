//! `tessera serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use tessera_config::{CliSettings, Config};
use tessera_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover tessera.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve static files from (overrides config).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Origin to resolve include paths against instead of the request's
    /// Host header (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Fragment fetch timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Largest HTML body to compose, in bytes; larger responses are served
    /// as-is (overrides config).
    #[arg(long)]
    max_body_bytes: Option<usize>,

    /// Enable verbose output (request and include logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Site root: {}",
            config.site_resolved.root_dir.display()
        ));
        match &config.includes.base_url {
            Some(base_url) => output.info(&format!("Include base URL: {base_url}")),
            None => output.info("Include base URL: request host"),
        }

        run_server(server_config_from_config(&config)).await?;

        Ok(())
    }

    /// Config overrides given on the command line.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            root_dir: self.root.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

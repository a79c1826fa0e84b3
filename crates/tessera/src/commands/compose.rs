//! `tessera compose` command implementation.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tessera_compose::{Composer, HttpSource};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the compose command.
#[derive(Args)]
pub(crate) struct ComposeArgs {
    /// HTML file to compose.
    file: PathBuf,

    /// URL the document is served at; include paths resolve against it.
    #[arg(long)]
    base_url: String,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fragment fetch timeout in seconds.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=300))]
    timeout: u64,
}

impl ComposeArgs {
    /// Execute the compose command.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or a file can't be
    /// read or written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let source = Arc::new(HttpSource::new(Duration::from_secs(self.timeout)));
        let html = self.compose_with(&Composer::new(source))?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, html)?;
                Output::new().success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.flush()?;
            }
        }

        Ok(())
    }

    fn compose_with(&self, composer: &Composer) -> Result<String, CliError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CliError::Validation(format!(
                "--base-url must start with http:// or https://, got {}",
                self.base_url
            )));
        }

        let html = std::fs::read_to_string(&self.file)?;
        tracing::info!(file = %self.file.display(), base_url = %self.base_url, "Composing");
        Ok(composer.compose(&html, &self.base_url))
    }
}

//! Fragment sources.
//!
//! A [`FragmentSource`] retrieves the body of an included fragment by URL.
//! [`HttpSource`] does so with a blocking `ureq` agent; tests use the
//! in-memory [`MemorySource`].

use std::time::Duration;

use ureq::Agent;
use url::Url;

/// Default timeout for fragment requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error retrieving a fragment.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Include path could not be resolved to a URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request failed (network error, timeout, unreadable body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] ureq::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}

/// Retrieves fragment bodies.
pub trait FragmentSource: Send + Sync {
    /// Fetch the body at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the fragment can't be retrieved or the
    /// response status is not a success.
    fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Fragment source issuing one HTTP GET per fragment.
pub struct HttpSource {
    agent: Agent,
}

impl HttpSource {
    /// Create a source whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl FragmentSource for HttpSource {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.agent.get(url.as_str()).call()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let mut body = response.into_body();
        Ok(body.read_to_string()?)
    }
}

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use url::Url;

    use super::{FetchError, FragmentSource};

    /// In-memory fragment source for testing.
    ///
    /// Unknown URLs answer with status 404. Every requested URL is recorded.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tessera_compose::MemorySource;
    ///
    /// let source = MemorySource::new()
    ///     .with_fragment("https://example.com/card.html", "<div>card</div>");
    /// ```
    #[derive(Debug, Default)]
    pub struct MemorySource {
        fragments: HashMap<String, Result<String, u16>>,
        requests: Mutex<Vec<String>>,
    }

    impl MemorySource {
        /// Create an empty source.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve `body` at `url`.
        #[must_use]
        pub fn with_fragment(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.fragments.insert(url.into(), Ok(body.into()));
            self
        }

        /// Answer `url` with a non-success `status`.
        #[must_use]
        pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
            self.fragments.insert(url.into(), Err(status));
            self
        }

        /// URLs requested so far, in request order.
        #[must_use]
        pub fn requests(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl FragmentSource for MemorySource {
        fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(url.to_string());
            match self.fragments.get(url.as_str()) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status { status: *status }),
                None => Err(FetchError::Status { status: 404 }),
            }
        }
    }

}

#[cfg(any(test, feature = "mock"))]
pub use mock::MemorySource;

//! Application state.

use tessera_compose::Composer;

/// State shared by the composition middleware.
pub(crate) struct AppState {
    /// Composer used for every HTML response.
    pub(crate) composer: Composer,
    /// Origin include paths are resolved against, overriding the request's.
    pub(crate) base_url: Option<String>,
    /// Largest HTML body buffered for composition.
    pub(crate) max_body_bytes: usize,
}

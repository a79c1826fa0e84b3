//! Router construction.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::compose;
use crate::state::AppState;

/// Create the application router.
///
/// Static files under `root_dir` are served for every path, with
/// `index.html` standing in for directories. Responses pass through the
/// composition middleware inside the request trace.
pub(crate) fn create_router(state: Arc<AppState>, root_dir: &Path) -> Router {
    let static_files = ServeDir::new(root_dir).append_index_html_on_directories(true);

    Router::new().fallback_service(static_files).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn_with_state(
                state,
                compose::compose_html,
            )),
    )
}

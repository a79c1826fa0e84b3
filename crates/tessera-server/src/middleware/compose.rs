//! Composition middleware.
//!
//! Rewrites HTML responses through the [`Composer`], whatever their status.
//! Every other response passes through untouched, as does an HTML response
//! whose declared length is over the configured body limit.
//!
//! [`Composer`]: tessera_compose::Composer

use std::sync::Arc;

use axum::body::{Body, HttpBody};
use axum::extract::{Request, State};
use axum::http::uri::{Authority, PathAndQuery};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tessera_compose::is_html;

use crate::state::AppState;

/// Compose the HTML body of the inner service's response.
///
/// The body is buffered up to the state's `max_body_bytes`, composed on the
/// blocking pool and returned without its original `Content-Length`. A body
/// that turns out longer than the limit while buffering yields a 500.
pub(crate) async fn compose_html(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let base_url = request_url(state.base_url.as_deref(), &request);
    let response = next.run(request).await;
    if !should_compose(&response) {
        return response;
    }
    let limit = state.max_body_bytes;
    if let Some(length) = declared_length(&response).filter(|&length| length > limit) {
        tracing::warn!(url = %base_url, length, limit, "Response too large to compose, passing through");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(url = %base_url, error = %err, "Failed to read response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let Ok(html) = std::str::from_utf8(&bytes).map(str::to_owned) else {
        tracing::warn!(url = %base_url, "Response is not valid UTF-8, skipping composition");
        return Response::from_parts(parts, Body::from(bytes));
    };

    let composer = state.composer.clone();
    let url = base_url.clone();
    let composed = tokio::task::spawn_blocking(move || composer.compose(&html, &url)).await;
    let html = match composed {
        Ok(html) => html,
        Err(err) => {
            tracing::error!(url = %base_url, error = %err, "Composition task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

fn should_compose(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_html)
}

/// Body length known before reading, from `Content-Length` or the body's
/// size hint.
fn declared_length(response: &Response) -> Option<usize> {
    let header = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    let hint = response.body().size_hint().lower();
    let hint = usize::try_from(hint).unwrap_or(usize::MAX);
    match header {
        Some(length) => Some(length.max(hint)),
        None => (hint > 0).then_some(hint),
    }
}

/// Absolute URL of `request`, used as the base for include paths.
///
/// A configured origin wins over the request's `Host` header.
fn request_url(configured: Option<&str>, request: &Request) -> String {
    let path = request
        .uri()
        .path_and_query()
        .map_or("/", PathAndQuery::as_str);

    if let Some(origin) = configured {
        return format!("{}{path}", origin.trim_end_matches('/'));
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().authority().map(Authority::as_str))
        .unwrap_or("localhost");
    format!("http://{host}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::response::Html;
    use axum::routing::get;
    use pretty_assertions::assert_eq;
    use tessera_compose::{Composer, FragmentSource, MemorySource};
    use tessera_config::DEFAULT_MAX_BODY_BYTES;
    use tower::ServiceExt;

    const PAGE: &str = r#"<main><include path="/card.html"><fill slot="title">Hi</fill></include></main>"#;

    fn state(source: &Arc<MemorySource>, base_url: Option<&str>) -> Arc<AppState> {
        Arc::new(AppState {
            composer: Composer::new(Arc::clone(source) as Arc<dyn FragmentSource>),
            base_url: base_url.map(str::to_owned),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    fn card_source() -> Arc<MemorySource> {
        Arc::new(MemorySource::new().with_fragment(
            "https://example.com/card.html",
            r#"<h1><slot name="title"></slot></h1>"#,
        ))
    }

    fn app(router: Router, state: Arc<AppState>) -> Router {
        router.layer(axum::middleware::from_fn_with_state(state, compose_html))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_html_response_is_composed() {
        let source = card_source();
        let router = Router::new().route("/", get(|| async { Html(PAGE) }));
        let app = app(router, state(&source, Some("https://example.com")));

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "<main><h1>Hi</h1></main>");
        assert_eq!(source.requests(), vec!["https://example.com/card.html"]);
    }

    #[tokio::test]
    async fn test_non_html_passes_through() {
        let source = card_source();
        let router = Router::new().route("/data.txt", get(|| async { PAGE }));
        let app = app(router, state(&source, Some("https://example.com")));

        let response = app.oneshot(get_request("/data.txt")).await.unwrap();

        assert_eq!(body_string(response).await, PAGE);
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_html_error_page_is_composed() {
        let source = card_source();
        let router = Router::new().route(
            "/",
            get(|| async { (StatusCode::NOT_FOUND, Html(PAGE)) }),
        );
        let app = app(router, state(&source, Some("https://example.com")));

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "<main><h1>Hi</h1></main>");
        assert_eq!(source.requests(), vec!["https://example.com/card.html"]);
    }

    #[tokio::test]
    async fn test_base_url_from_host_header() {
        let source = Arc::new(MemorySource::new());
        let router = Router::new().route("/docs/page", get(|| async { Html(PAGE) }));
        let app = app(router, state(&source, None));
        let request = Request::builder()
            .uri("/docs/page")
            .header(header::HOST, "site.test:8080")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            body_string(response).await,
            "<main><!-- Failed to include: /card.html --></main>"
        );
        assert_eq!(source.requests(), vec!["http://site.test:8080/card.html"]);
    }

    #[tokio::test]
    async fn test_static_file_composed_without_content_length() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("index.html"), PAGE).unwrap();
        let source = card_source();
        let router = Router::new().fallback_service(
            tower_http::services::ServeDir::new(root.path()).append_index_html_on_directories(true),
        );
        let app = app(router, state(&source, Some("https://example.com/")));

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(body_string(response).await, "<main><h1>Hi</h1></main>");
    }

    #[tokio::test]
    async fn test_oversized_html_passes_through_uncomposed() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("index.html"), PAGE).unwrap();
        let source = card_source();
        let router = Router::new().fallback_service(
            tower_http::services::ServeDir::new(root.path()).append_index_html_on_directories(true),
        );
        let state = Arc::new(AppState {
            composer: Composer::new(Arc::clone(&source) as Arc<dyn FragmentSource>),
            base_url: Some("https://example.com".to_owned()),
            max_body_bytes: PAGE.len() - 1,
        });
        let app = app(router, state);

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_LENGTH],
            PAGE.len().to_string()
        );
        assert_eq!(body_string(response).await, PAGE);
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_html_at_body_limit_is_composed() {
        let source = card_source();
        let router = Router::new().route("/", get(|| async { Html(PAGE) }));
        let state = Arc::new(AppState {
            composer: Composer::new(Arc::clone(&source) as Arc<dyn FragmentSource>),
            base_url: Some("https://example.com".to_owned()),
            max_body_bytes: PAGE.len(),
        });
        let app = app(router, state);

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(body_string(response).await, "<main><h1>Hi</h1></main>");
    }

    #[test]
    fn test_declared_length_from_header_or_hint() {
        let response = Html(PAGE).into_response();
        assert_eq!(declared_length(&response), Some(PAGE.len()));

        let mut response = Response::new(Body::empty());
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, "42".parse().unwrap());
        assert_eq!(declared_length(&response), Some(42));

        assert_eq!(declared_length(&Response::new(Body::empty())), None);
    }

    #[test]
    fn test_request_url_prefers_configured_origin() {
        let request = Request::builder()
            .uri("/a/b.html?x=1")
            .header(header::HOST, "ignored.test")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            request_url(Some("https://example.com/"), &request),
            "https://example.com/a/b.html?x=1"
        );
        assert_eq!(
            request_url(None, &request),
            "http://ignored.test/a/b.html?x=1"
        );
    }

    #[test]
    fn test_request_url_without_host() {
        let request = get_request("/page.html");

        assert_eq!(request_url(None, &request), "http://localhost/page.html");
    }
}

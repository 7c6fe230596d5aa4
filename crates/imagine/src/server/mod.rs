//! HTTP layer: the resolve route, a health check and, for the filesystem
//! adapter, the cache directory itself.

mod error;

pub use error::AppError;

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use imagine_core::{FilesystemAdapter, Imagine};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub imagine: Arc<Imagine>,
}

impl AppState {
    pub fn new(imagine: Imagine) -> Self {
        Self {
            imagine: Arc::new(imagine),
        }
    }
}

/// Assemble the router for a configured [`Imagine`].
pub fn router(state: AppState) -> Router {
    let config = state.imagine.config();
    let prefix = config.server.url_prefix.trim_end_matches('/');

    let mut router = Router::new()
        .route(&format!("{prefix}/{{filter_set}}/{{*path}}"), get(resolve))
        .route("/health", get(health));

    // Redirect targets only resolve in-process when the cache is local.
    let public_url = config.adapter.public_url.trim_end_matches('/');
    if config.server.serve_cache
        && config.adapter.name == FilesystemAdapter::NAME
        && public_url.starts_with('/')
    {
        tracing::debug!(
            "Serving {} under {public_url}",
            config.cache_root().display()
        );
        let cache: Router = Router::new()
            .fallback_service(ServeDir::new(config.cache_root()))
            .layer(middleware::from_fn(hide_dot_files));
        router = router.nest_service(public_url, cache);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// GET `<url_prefix>/{filter_set}/{*path}` → 302 to the artifact.
async fn resolve(
    State(state): State<AppState>,
    Path((filter_set, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let location = state.imagine.resolve(&filter_set, &path).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

async fn health() -> &'static str {
    "ok"
}

/// 404 for any path segment starting with `.`, which covers in-progress
/// temp files next to cached artifacts.
async fn hide_dot_files(request: Request, next: Next) -> Response {
    let hidden = request.uri().path().split('/').any(|segment| {
        percent_decode_str(segment)
            .decode_utf8_lossy()
            .starts_with('.')
    });
    if hidden {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

//! HTTP surface: the page, the data endpoint, and the icon.
//!
//! Handlers only ever read the store through `snapshot()`; they never see a
//! block halfway through a tick.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use dazibao_core::render::{PageRenderer, render_json};
use dazibao_core::store::ConfigStore;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: ConfigStore,
    pub renderer: PageRenderer,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/data", get(data_handler))
        .route("/icons/dazibao.png", get(icon_handler))
        .with_state(state)
}

async fn root_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.store.snapshot();
    match state.renderer.render(&snapshot) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(event = "cli.server.page_render_failed", error = %e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate page").into_response()
        }
    }
}

async fn data_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.store.snapshot();
    match render_json(&snapshot) {
        Ok(json) => {
            debug!(
                event = "cli.server.data_served",
                block_count = snapshot.blocks.len()
            );
            ([(header::CONTENT_TYPE, "application/json")], json).into_response()
        }
        Err(e) => {
            error!(event = "cli.server.data_render_failed", error = %e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode data").into_response()
        }
    }
}

async fn icon_handler(State(state): State<AppState>) -> Response {
    let path = state.renderer.icon_path();
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(event = "cli.server.icon_not_found", path = %path.display());
            (StatusCode::NOT_FOUND, "Icon not found").into_response()
        }
        Err(e) => {
            error!(
                event = "cli.server.icon_read_failed",
                path = %path.display(),
                error = %e
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

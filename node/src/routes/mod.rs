//! HTTP routes of the node.

use axum::http::StatusCode;
use axum::response::Html;

pub mod blocks;
pub mod logs;
pub mod txion;

/// `GET /`
///
/// Static greeting so humans and health checks can tell the node is up.
pub async fn index() -> Html<&'static str> {
    Html("<h1>Time Release Blockchain Node</h1>")
}

/// Maps a store failure to the 500 the affected handler must surface.
pub(crate) fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("store failure in handler: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("store error: {e}\n"))
}

//! Local auxiliary bridge service.
//!
//! Runs as a separate process next to the gateway. Exposes a liveness
//! check, a `/exec` endpoint with canned responses for a fixed set of
//! local tools, and a `/sync` listing of a local directory.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Shared state for the bridge handlers.
pub struct BridgeState {
    /// Directory listed by `GET /sync`.
    pub sync_dir: PathBuf,
}

/// Payload of `POST /exec`.
#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    pub tool: String,
    #[serde(default)]
    pub params: Value,
}

/// Build the bridge router.
pub fn router(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/exec", post(exec))
        .route("/sync", get(sync))
        .with_state(state)
}

async fn liveness() -> &'static str {
    "Bridge server is running"
}

async fn exec(Json(request): Json<ExecRequest>) -> impl IntoResponse {
    let result = match request.tool.as_str() {
        "pixelDetect" => "Pixel detection simulated.",
        "screenCapture" => "Screen capture simulated.",
        "syncFiles" => "File sync simulated.",
        other => {
            warn!(tool = %other, "unknown bridge tool");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Unknown tool" })),
            );
        }
    };

    (
        StatusCode::OK,
        Json(json!({ "result": result, "params": request.params })),
    )
}

async fn sync(State(state): State<Arc<BridgeState>>) -> impl IntoResponse {
    match list_files(&state.sync_dir).await {
        Ok(files) => (StatusCode::OK, Json(json!({ "files": files }))),
        Err(e) => {
            warn!(dir = %state.sync_dir.display(), error = %e, "sync listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

async fn list_files(dir: &PathBuf) -> anyhow::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();
    Ok(files)
}

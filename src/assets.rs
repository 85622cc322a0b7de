//! Static file server for the browser controller page

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

const INDEX_FILE: &str = "index.html";

#[derive(Clone)]
struct AssetState {
    root: Arc<PathBuf>,
}

/// Router serving every path under `root`; `/` maps to `index.html`
pub fn router(root: PathBuf) -> Router {
    Router::new().fallback(serve_file).with_state(AssetState {
        root: Arc::new(root),
    })
}

/// Serve assets on `listener` until the server stops
pub async fn serve_assets(listener: TcpListener, root: PathBuf) -> Result<()> {
    info!(
        "Serving assets from {} on {}",
        root.display(),
        listener.local_addr()?
    );
    axum::serve(listener, router(root)).await?;
    Ok(())
}

async fn serve_file(State(state): State<AssetState>, uri: Uri) -> Response {
    let Some(relative) = resolve(uri.path()) else {
        return not_found(uri.path());
    };
    let path = state.root.join(&relative);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("GET {} -> {}", uri.path(), path.display());
            ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response()
        }
        Err(_) => not_found(uri.path()),
    }
}

/// Map a request path to a file path relative to the asset root.
///
/// Returns `None` for anything that would escape the root.
fn resolve(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Some(PathBuf::from(INDEX_FILE));
    }

    let candidate = Path::new(trimmed);
    if candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Some(candidate.to_path_buf())
    } else {
        None
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found", "path": path })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn asset_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>remote</html>").unwrap();
        std::fs::create_dir(dir.path().join("js")).unwrap();
        std::fs::write(dir.path().join("js").join("main.js"), "connect();").unwrap();
        dir
    }

    async fn get(app: Router, path: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let dir = asset_dir();
        let (status, content_type, body) = get(router(dir.path().to_path_buf()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(body, b"<html>remote</html>");
    }

    #[tokio::test]
    async fn test_nested_file() {
        let dir = asset_dir();
        let (status, content_type, body) =
            get(router(dir.path().to_path_buf()), "/js/main.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/javascript; charset=utf-8"));
        assert_eq!(body, b"connect();");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = asset_dir();
        let (status, _, body) = get(router(dir.path().to_path_buf()), "/nope.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "not found");
        assert_eq!(value["path"], "/nope.css");
    }

    #[tokio::test]
    async fn test_directory_is_404() {
        let dir = asset_dir();
        let (status, _, _) = get(router(dir.path().to_path_buf()), "/js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_resolve_rejects_parent_components() {
        assert_eq!(resolve("/"), Some(PathBuf::from("index.html")));
        assert_eq!(resolve("/a/b.js"), Some(PathBuf::from("a/b.js")));
        assert_eq!(resolve("/../secret"), None);
        assert_eq!(resolve("/a/../../secret"), None);
        assert_eq!(resolve("/./a"), None);
    }
}

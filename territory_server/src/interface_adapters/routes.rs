// HTTP surface: published artifacts as static files plus a liveness probe.

use axum::{
    Router,
    http::{HeaderValue, header::CACHE_CONTROL},
    routing::get,
};
use std::path::Path;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

// Artifacts are replaced in place every cycle.
const CACHE_POLICY: &str = "max-age=60";

pub fn router(www_dir: &Path) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(ServeDir::new(www_dir))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_POLICY),
        ))
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn when_healthz_is_requested_then_ok_is_returned() {
        let dir = tempfile::tempdir().expect("tempdir");

        let response = get(router(dir.path()), "/healthz").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64)
            .await
            .expect("body");
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn when_artifact_exists_then_it_is_served_with_cache_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("gameTiles")).expect("mkdir");
        std::fs::write(dir.path().join("gameTiles/world.map"), [2u8, 0, 1, 0]).expect("seed");

        let response = get(router(dir.path()), "/gameTiles/world.map?t=42").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "max-age=60");
        let body = axum::body::to_bytes(response.into_body(), 64)
            .await
            .expect("body");
        assert_eq!(&body[..], &[2u8, 0, 1, 0]);
    }

    #[tokio::test]
    async fn when_artifact_is_missing_then_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");

        let response = get(router(dir.path()), "/territoryTiles/0/0/0.png").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

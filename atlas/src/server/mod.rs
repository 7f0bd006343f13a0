//! HTTP front end of the tile proxy.
//!
//! One route, `GET /tile/{server_id}/{address}`. The address may itself
//! contain slashes (`12/2047/1362`). Any failure is answered with an empty
//! 404 so map clients simply leave the tile blank.

use std::io;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::provider::AsyncHttpClient;
use crate::service::TileProxy;

/// Builds the router serving `proxy`.
pub fn router<C: AsyncHttpClient + 'static>(proxy: Arc<TileProxy<C>>) -> Router {
    Router::new()
        .route("/tile/:server_id/*address", get(serve_tile::<C>))
        .with_state(proxy)
}

async fn serve_tile<C: AsyncHttpClient + 'static>(
    State(proxy): State<Arc<TileProxy<C>>>,
    Path((server_id, address)): Path<(String, String)>,
) -> Response {
    match proxy.serve_tile(&server_id, &address).await {
        Ok(tile) => (
            [
                (header::CONTENT_TYPE, tile.content_type),
                (header::CACHE_CONTROL, "public"),
                (header::EXPIRES, "never"),
            ],
            tile.bytes,
        )
            .into_response(),
        Err(e) => {
            debug!(server = %server_id, address = %address, error = %e, "answering 404");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Serves `router` on `listener` until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "tile proxy listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("tile proxy stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TileServerRegistry;
    use crate::geodetic::GeodeticTransform;
    use crate::provider::{FetchError, MockHttpClient};
    use bytes::Bytes;

    async fn start(client: MockHttpClient, root: &std::path::Path) -> (String, CancellationToken) {
        let text = r#"[{"id": "osm", "folder": "osm", "type": "zxy", "url": "http://origin.test/{z}/{x}/{y}.png"}]"#;
        let registry = TileServerRegistry::from_json(text, root, GeodeticTransform::national_grid()).unwrap();
        let proxy = Arc::new(TileProxy::new(Arc::new(registry), client, false));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = CancellationToken::new();
        tokio::spawn(serve(listener, router(proxy), shutdown.clone()));
        (base, shutdown)
    }

    #[tokio::test]
    async fn test_serves_tile_with_cache_headers() {
        let dir = tempfile::tempdir().unwrap();
        let (base, shutdown) = start(MockHttpClient::ok(b"png"), dir.path()).await;

        let response = reqwest::get(format!("{}/tile/osm/12/2047/1362", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "image/jpeg");
        assert_eq!(headers["cache-control"], "public");
        assert_eq!(headers["expires"], "never");
        assert_eq!(response.bytes().await.unwrap(), Bytes::from_static(b"png"));

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_failures_are_empty_404s() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockHttpClient::failing(FetchError::Http("HTTP 500".to_string()));
        let (base, shutdown) = start(client, dir.path()).await;

        for path in ["/tile/osm/12/2047/1362", "/tile/nope/1/0/0", "/tile/osm/not-a-tile", "/elsewhere"] {
            let response = reqwest::get(format!("{}{}", base, path)).await.unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND, "{}", path);
            assert!(response.bytes().await.unwrap().is_empty(), "{}", path);
        }

        shutdown.cancel();
    }
}

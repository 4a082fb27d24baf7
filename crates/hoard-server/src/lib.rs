//! HTTP server for hoard.
//!
//! Wraps a [`hoard_sdk::Hoard`] engine in an axum router exposing blob
//! upload, retrieval, time-range listing, and statistics.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{CounterBudgetConfig, ServerConfig, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::HoardServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use hoard_protocol::{BlobsResponse, ErrorBody, HealthResponse, StatsResponse, UploadResponse};
    use hoard_sdk::Hoard;
    use hoard_types::BlobId;
    use tower::util::ServiceExt;

    const BOUNDARY: &str = "hoard-test-boundary";

    async fn app_with_limit(max_upload_bytes: usize) -> Router {
        let hoard = Hoard::in_memory("test-bucket", "test-index").with_page_size(3);
        hoard.init().await.unwrap();
        build_router(AppState::new(Arc::new(hoard), max_upload_bytes))
    }

    async fn app() -> Router {
        app_with_limit(1024 * 1024).await
    }

    fn multipart_body(parts: &[(Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, data) in parts {
            let disposition = match name {
                Some(name) => format!("form-data; name=\"{name}\""),
                None => "form-data".to_string(),
            };
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(prefix: &str, parts: &[(Option<&str>, &[u8])]) -> Request<Body> {
        let body = multipart_body(parts);
        Request::builder()
            .method("POST")
            .uri(format!("{prefix}/upload"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn upload(app: &Router, data: &[u8]) -> UploadResponse {
        let id = BlobId::from_bytes(data).to_hex();
        let (status, body) = send(app, upload_request("", &[(Some(id.as_str()), data)])).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    fn error_code(body: &[u8]) -> u16 {
        serde_json::from_slice::<ErrorBody>(body).unwrap().error.code
    }

    // -----------------------------------------------------------------------
    // Health and stats
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint() {
        let app = app().await;
        let (status, body) = send(&app, get("/_health")).await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn stats_reflect_uploads() {
        let app = app().await;
        upload(&app, &[7u8; 50]).await;
        upload(&app, &[8u8; 30]).await;
        upload(&app, &[7u8; 50]).await;

        let (status, body) = send(&app, get("/_stats")).await;
        assert_eq!(status, StatusCode::OK);
        let stats: StatsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats.blob_count, 2);
        assert_eq!(stats.blob_size, 80);
        assert_eq!(stats.bucket, "test-bucket");
        assert_eq!(stats.index_domain, "test-index");
    }

    // -----------------------------------------------------------------------
    // Upload and fetch
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn upload_then_fetch() {
        let app = app().await;
        let resp = upload(&app, b"hello hoard").await;
        assert_eq!(resp.blobs.len(), 1);
        let uploaded = &resp.blobs[0];
        assert!(uploaded.new);
        assert_eq!(uploaded.size, 11);

        let response = app
            .clone()
            .oneshot(get(&format!("/blob/{}", uploaded.hash)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"hello hoard");
    }

    #[tokio::test]
    async fn duplicate_upload_is_not_new() {
        let app = app().await;
        assert!(upload(&app, b"same").await.blobs[0].new);
        assert!(!upload(&app, b"same").await.blobs[0].new);
    }

    #[tokio::test]
    async fn multi_part_upload_keeps_order() {
        let app = app().await;
        let payloads: [&[u8]; 3] = [b"first", b"second", b"third"];
        let ids: Vec<String> = payloads.iter().map(|p| BlobId::from_bytes(p).to_hex()).collect();
        let parts: Vec<(Option<&str>, &[u8])> = ids
            .iter()
            .zip(payloads)
            .map(|(id, p)| (Some(id.as_str()), p))
            .collect();

        let (status, body) = send(&app, upload_request("", &parts)).await;
        assert_eq!(status, StatusCode::OK);
        let resp: UploadResponse = serde_json::from_slice(&body).unwrap();
        let got: Vec<String> = resp.blobs.iter().map(|b| b.hash.to_hex()).collect();
        assert_eq!(got, ids);
    }

    #[tokio::test]
    async fn hash_mismatch_is_bad_request() {
        let app = app().await;
        let wrong = BlobId::from_bytes(b"other").to_hex();
        let (status, body) = send(&app, upload_request("", &[(Some(wrong.as_str()), &b"payload"[..])])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), 400);

        let id = BlobId::from_bytes(b"payload");
        let (status, _) = send(&app, get(&format!("/blob/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unnamed_part_is_bad_request() {
        let app = app().await;
        let (status, body) = send(&app, upload_request("", &[(None, &b"anonymous"[..])])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), 400);
    }

    #[tokio::test]
    async fn non_multipart_upload_is_rejected() {
        let app = app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = app_with_limit(64).await;
        let data = [1u8; 200];
        let id = BlobId::from_bytes(&data).to_hex();
        let (status, _) = send(&app, upload_request("", &[(Some(id.as_str()), &data[..])])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unknown_blob_is_not_found() {
        let app = app().await;
        let id = BlobId::from_bytes(b"never uploaded");
        let (status, body) = send(&app, get(&format!("/blob/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), 404);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let app = app().await;
        let (status, body) = send(&app, get("/blob/not-a-hash")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), 400);
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_blobs_pages_in_upload_order() {
        let app = app().await;
        let mut ids = Vec::new();
        for i in 0..5u8 {
            ids.push(upload(&app, &[i; 4]).await.blobs[0].hash);
        }

        let (status, body) = send(&app, get("/blobs")).await;
        assert_eq!(status, StatusCode::OK);
        let first: BlobsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(first.blobs.len(), 3);
        assert_eq!(first.blobs.iter().map(|b| b.hash).collect::<Vec<_>>(), ids[..3]);

        let uri = format!("/blobs?start={}&end={}", first.blobs[2].time, first.end);
        let (_, body) = send(&app, get(&uri)).await;
        let second: BlobsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(second.blobs.iter().map(|b| b.hash).collect::<Vec<_>>(), ids[3..]);
        assert_eq!(second.end, first.end);

        let uri = format!("/blobs?start={}&end={}", second.blobs[1].time, first.end);
        let (_, body) = send(&app, get(&uri)).await;
        let third: BlobsResponse = serde_json::from_slice(&body).unwrap();
        assert!(third.blobs.is_empty());
    }

    #[tokio::test]
    async fn list_blobs_honours_limit() {
        let app = app().await;
        for i in 0..3u8 {
            upload(&app, &[i]).await;
        }
        let (_, body) = send(&app, get("/blobs?limit=1")).await;
        let page: BlobsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.blobs.len(), 1);
    }

    #[tokio::test]
    async fn zero_start_lists_from_the_beginning() {
        let app = app().await;
        upload(&app, b"early").await;
        let (status, body) = send(&app, get("/blobs?start=0&end=")).await;
        assert_eq!(status, StatusCode::OK);
        let page: BlobsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.blobs.len(), 1);
    }

    #[tokio::test]
    async fn bad_timestamp_is_bad_request() {
        let app = app().await;
        let (status, body) = send(&app, get("/blobs?start=yesterday")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), 400);

        let (status, _) = send(&app, get("/blobs?limit=lots")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_prefix_aliases_blob_routes() {
        let app = app().await;
        let data: &[u8] = b"via api";
        let id = BlobId::from_bytes(data);
        let (status, _) =
            send(&app, upload_request("/api", &[(Some(id.to_hex().as_str()), data)])).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get(&format!("/api/blob/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, data);

        let (status, body) = send(&app, get("/api/blobs")).await;
        assert_eq!(status, StatusCode::OK);
        let page: BlobsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.blobs.len(), 1);
    }

    #[tokio::test]
    async fn unknown_route_gets_json_404() {
        let app = app().await;
        let (status, body) = send(&app, get("/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), 404);
    }
}

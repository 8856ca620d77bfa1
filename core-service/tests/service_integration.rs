//! End-to-end checks of the service façade against in-memory collaborators.

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    CredentialStore, Credentials, HttpClient, HttpRequest, HttpResponse, HttpStreamResponse,
};
use bytes::Bytes;
use core_library::TimelineFilters;
use core_runtime::config::BridgeConfig;
use core_service::{CoreError, PhotoBridgeService, RequestContext};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

const API_KEY: &str = "k3y-do-not-leak";

#[derive(Default)]
struct InMemoryCredentials {
    table: Mutex<HashMap<String, Credentials>>,
}

impl InMemoryCredentials {
    async fn set(&self, user: &str, base_url: &str, api_key: &str) {
        self.table
            .lock()
            .await
            .insert(user.to_string(), Credentials::new(base_url, api_key));
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentials {
    async fn credentials_for(&self, user_id: &str) -> BridgeResult<Option<Credentials>> {
        Ok(self.table.lock().await.get(user_id).cloned())
    }
}

#[derive(Clone)]
struct Route {
    status: u16,
    content_type: Option<&'static str>,
    body: Vec<u8>,
}

/// Serves canned responses by exact URL and records every request
#[derive(Default)]
struct FakeServer {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeServer {
    async fn route(&self, url: &str, status: u16, content_type: Option<&'static str>, body: &[u8]) {
        self.routes.lock().await.insert(
            url.to_string(),
            Route {
                status,
                content_type,
                body: body.to_vec(),
            },
        );
    }

    async fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    async fn lookup(&self, request: HttpRequest) -> Route {
        let route = self.routes.lock().await.get(&request.url).cloned();
        self.requests.lock().await.push(request);
        route.unwrap_or(Route {
            status: 404,
            content_type: Some("application/json"),
            body: br#"{"message":"Not found"}"#.to_vec(),
        })
    }
}

fn headers(content_type: Option<&str>) -> HashMap<String, String> {
    content_type
        .map(|ct| HashMap::from([("Content-Type".to_string(), ct.to_string())]))
        .unwrap_or_default()
}

#[async_trait]
impl HttpClient for FakeServer {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let route = self.lookup(request).await;
        Ok(HttpResponse {
            status: route.status,
            headers: headers(route.content_type),
            body: Bytes::from(route.body),
        })
    }

    async fn execute_stream(&self, request: HttpRequest) -> BridgeResult<HttpStreamResponse> {
        let route = self.lookup(request).await;
        Ok(HttpStreamResponse {
            status: route.status,
            headers: headers(route.content_type),
            body: Box::new(Cursor::new(route.body)),
        })
    }
}

struct Harness {
    service: PhotoBridgeService,
    server: Arc<FakeServer>,
    credentials: Arc<InMemoryCredentials>,
    storage: tempfile::TempDir,
}

async fn harness() -> Harness {
    let server = Arc::new(FakeServer::default());
    let credentials = Arc::new(InMemoryCredentials::default());
    let storage = tempfile::tempdir().unwrap();

    let config = BridgeConfig::builder()
        .http_client(server.clone())
        .file_system(Arc::new(TokioFileSystem::with_storage_root(
            storage.path().to_path_buf(),
        )))
        .credential_store(credentials.clone())
        .build()
        .unwrap();

    Harness {
        service: PhotoBridgeService::new(config).unwrap(),
        server,
        credentials,
        storage,
    }
}

async fn configured_harness() -> Harness {
    let h = harness().await;
    h.credentials
        .set("alice", "https://photos.example.com/api/", API_KEY)
        .await;
    h
}

fn alice() -> RequestContext {
    RequestContext::for_user("alice")
}

#[tokio::test]
async fn unconfigured_user_fails_every_upstream_operation_without_network() {
    let h = harness().await;
    let ctx = alice();

    let errors = vec![
        h.service.get_albums(&ctx).await.unwrap_err(),
        h.service.get_album(&ctx, "al1").await.unwrap_err(),
        h.service.get_assets(&ctx, "al1").await.unwrap_err(),
        h.service.get_tags(&ctx).await.unwrap_err(),
        h.service
            .get_timeline(&ctx, &TimelineFilters::default(), 1)
            .await
            .unwrap_err(),
        h.service
            .search_assets(&ctx, 1, None, None)
            .await
            .unwrap_err(),
        h.service.get_thumbnail(&ctx, "a1", None).await.unwrap_err(),
        h.service.get_preview(&ctx, "a1").await.unwrap_err(),
        h.service.get_original(&ctx, "a1").await.unwrap_err(),
        h.service
            .save_to_folder(&ctx, "a1", "/", "photo.jpg")
            .await
            .unwrap_err(),
    ];

    for err in &errors {
        assert!(err.is_not_configured(), "unexpected error: {}", err);
        assert_eq!(err.status_code(), 412);
    }
    assert!(h.server.requested_urls().await.is_empty());
}

#[tokio::test]
async fn anonymous_requests_are_rejected() {
    let h = configured_harness().await;

    let err = h
        .service
        .get_albums(&RequestContext::anonymous())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Unauthenticated));
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.to_payload().error, "Not authenticated");
}

#[tokio::test]
async fn config_status_never_exposes_the_key() {
    let h = configured_harness().await;

    let status = h.service.config_status(&alice()).await.unwrap();
    assert!(status.configured);
    assert_eq!(status.base_url.as_deref(), Some("https://photos.example.com/api"));
    assert!(!serde_json::to_string(&status).unwrap().contains(API_KEY));

    let status = h
        .service
        .config_status(&RequestContext::for_user("bob"))
        .await
        .unwrap();
    assert!(!status.configured);
    assert_eq!(status.base_url, None);
}

#[tokio::test]
async fn albums_are_projected_and_authenticated() {
    let h = configured_harness().await;
    h.server
        .route(
            "https://photos.example.com/api/albums",
            200,
            Some("application/json"),
            br#"[{"id":"al1","albumName":"Summer","assetCount":3}]"#,
        )
        .await;

    let albums = h.service.get_albums(&alice()).await.unwrap();

    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].title, "Summer");
    let requests = h.server.requests.lock().await;
    assert_eq!(
        requests[0].headers.get("x-api-key").map(String::as_str),
        Some(API_KEY)
    );
}

#[tokio::test]
async fn credential_changes_apply_to_the_next_request() {
    let h = configured_harness().await;
    h.server
        .route("https://photos.example.com/api/tags", 200, None, b"[]")
        .await;
    h.server
        .route("https://other.example.org/api/tags", 200, None, br#"[{"id":"t1","name":"Cats"}]"#)
        .await;

    assert!(h.service.get_tags(&alice()).await.unwrap().is_empty());

    h.credentials
        .set("alice", "https://other.example.org/api", "new-key")
        .await;
    let tags = h.service.get_tags(&alice()).await.unwrap();

    assert_eq!(tags[0].name, "Cats");
}

#[tokio::test]
async fn upstream_failures_map_to_bad_gateway_without_the_key() {
    let h = configured_harness().await;
    h.server
        .route(
            "https://photos.example.com/api/albums",
            401,
            Some("application/json"),
            br#"{"message":"Invalid API key"}"#,
        )
        .await;

    let err = h.service.get_albums(&alice()).await.unwrap_err();

    assert_eq!(err.status_code(), 502);
    let payload = err.to_payload();
    assert!(payload.error.contains("Invalid API key"));
    assert!(!payload.error.contains(API_KEY));
}

#[tokio::test]
async fn preview_falls_back_to_thumbnail_and_carries_cache_hint() {
    let h = configured_harness().await;
    let thumb = "https://photos.example.com/api/assets/a1/thumbnail";
    h.server
        .route(&format!("{}?key=preview", thumb), 400, None, b"bad key")
        .await;
    h.server
        .route(&format!("{}?size=preview", thumb), 200, Some("application/json"), b"{}")
        .await;
    h.server.route(thumb, 200, Some("image/jpeg"), b"jpeg").await;

    let mut asset = h.service.get_preview(&alice(), "a1").await.unwrap();

    assert_eq!(asset.content_type, "image/jpeg");
    assert_eq!(asset.cache_control(), "max-age=3600");
    let mut body = Vec::new();
    asset.body.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"jpeg");
}

#[tokio::test]
async fn thumbnail_forwards_only_the_size_hint() {
    let h = configured_harness().await;
    let thumb = "https://photos.example.com/api/assets/a1/thumbnail";
    h.server
        .route(&format!("{}?size=thumbnail", thumb), 200, Some("image/webp"), b"webp")
        .await;

    let asset = h
        .service
        .get_thumbnail(&alice(), "a1", Some("thumbnail"))
        .await
        .unwrap();

    assert_eq!(asset.content_type, "image/webp");
    assert_eq!(
        h.server.requested_urls().await,
        vec![format!("{}?size=thumbnail", thumb)]
    );
}

#[tokio::test]
async fn save_resolves_collisions_with_numbered_suffixes() {
    let h = configured_harness().await;
    h.server
        .route(
            "https://photos.example.com/api/assets/a1/original",
            200,
            Some("image/jpeg"),
            b"original-bytes",
        )
        .await;
    let folder = h.storage.path().join("alice").join("Photos");
    tokio::fs::create_dir_all(&folder).await.unwrap();
    tokio::fs::write(folder.join("photo.jpg"), b"existing").await.unwrap();

    let first = h
        .service
        .save_to_folder(&alice(), "a1", "/Photos/", "photo.jpg")
        .await
        .unwrap();
    let second = h
        .service
        .save_to_folder(&alice(), "a1", "Photos", "photo.jpg")
        .await
        .unwrap();

    assert!(first.success);
    assert_eq!(first.path, "Photos/photo_1.jpg");
    assert_eq!(second.path, "Photos/photo_2.jpg");
    assert_eq!(tokio::fs::read(folder.join("photo.jpg")).await.unwrap(), b"existing");
    assert_eq!(
        tokio::fs::read(folder.join("photo_2.jpg")).await.unwrap(),
        b"original-bytes"
    );
}

#[tokio::test]
async fn save_into_missing_folder_is_rejected_before_download() {
    let h = configured_harness().await;

    let err = h
        .service
        .save_to_folder(&alice(), "a1", "Nope", "photo.jpg")
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert!(h.server.requested_urls().await.is_empty());
    assert!(!h.storage.path().join("alice").join("Nope").exists());
}

#[tokio::test]
async fn save_without_usable_name_uses_asset_id() {
    let h = configured_harness().await;
    h.server
        .route(
            "https://photos.example.com/api/assets/a9/original",
            200,
            Some("image/jpeg"),
            b"bytes",
        )
        .await;

    let saved = h
        .service
        .save_to_folder(&alice(), "a9", "/", "")
        .await
        .unwrap();

    assert_eq!(saved.path, "/image_a9.jpg");
    assert!(h.storage.path().join("alice").join("image_a9.jpg").exists());
}

#[tokio::test]
async fn save_fallback_name_cannot_escape_the_target_folder() {
    let h = configured_harness().await;
    h.server
        .route(
            "https://photos.example.com/api/assets/x%2F..%2F..%2Fbob%2Fowned/original",
            200,
            Some("image/jpeg"),
            b"bytes",
        )
        .await;
    let root = h.storage.path();
    tokio::fs::create_dir_all(root.join("alice").join("image_x"))
        .await
        .unwrap();
    tokio::fs::create_dir_all(root.join("bob")).await.unwrap();

    let saved = h
        .service
        .save_to_folder(&alice(), "x/../../bob/owned", "/", "")
        .await
        .unwrap();

    assert_eq!(saved.path, "/image_x_.._.._bob_owned.jpg");
    assert!(root.join("alice").join("image_x_.._.._bob_owned.jpg").is_file());
    assert!(!root.join("bob").join("owned.jpg").exists());
}

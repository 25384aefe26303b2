//! Vault behaviour against a real HTTP server

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tpen_cache::{HttpFetcher, ResourceKind, Vault};
use tpen_config::VaultSettings;
use tpen_core::constants::EVENT_VAULT_ERROR;
use tpen_core::events::handler;
use tpen_core::EventDispatcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_vault(dispatcher: Arc<EventDispatcher>) -> Vault {
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    Vault::new(Arc::new(fetcher), dispatcher)
}

#[tokio::test]
async fn concurrent_requests_issue_one_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "m1", "type": "Manifest", "items": [] }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let vault = http_vault(EventDispatcher::new());
    let uri = format!("{}/manifest/1", server.uri());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let vault = vault.clone();
        let uri = uri.clone();
        tasks.push(tokio::spawn(async move {
            vault.get(&uri, ResourceKind::Manifest, false, None).await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_some());
    }

    assert_eq!(vault.stats().fetches, 1);
    server.verify().await;
}

#[tokio::test]
async fn server_errors_resolve_to_none_and_emit_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dispatcher = EventDispatcher::new();
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reasons);
    dispatcher.on(
        EVENT_VAULT_ERROR,
        handler(move |event| {
            if let Some(failure) = event.detail.as_resource_failure() {
                sink.lock().push(failure.reason.clone());
            }
            Ok(())
        }),
    );

    let vault = http_vault(Arc::clone(&dispatcher));
    let result = vault
        .get(&format!("{}/canvas/9", server.uri()), "canvas", false, Some("workspace"))
        .await;

    assert!(result.is_none());
    assert!(vault.is_empty());
    let reasons = reasons.lock();
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("500"));
}

#[tokio::test]
async fn unreachable_host_settles() {
    let vault = Vault::from_settings(
        &VaultSettings {
            request_timeout_secs: 1,
            prefetch_limit: 10,
        },
        EventDispatcher::new(),
    )
    .unwrap();

    // Port 9 (discard) on localhost is not expected to serve HTTP
    let result = vault.get("http://127.0.0.1:9/nothing", "canvas", false, None).await;
    assert!(result.is_none());
    assert_eq!(vault.stats().failures, 1);
}

#[tokio::test]
async fn manifest_walk_serves_canvas_without_second_request() {
    let server = MockServer::start().await;
    let canvas_uri = format!("{}/canvas/1", server.uri());
    Mock::given(method("GET"))
        .and(path("/manifest/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": format!("{}/manifest/2", server.uri()),
            "type": "Manifest",
            "items": [{ "id": canvas_uri, "type": "Canvas", "height": 4000, "width": 3000 }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/canvas/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": "Canvas" })))
        .expect(0)
        .mount(&server)
        .await;

    let vault = http_vault(EventDispatcher::new());
    vault.register_manifest_hint(&canvas_uri, &format!("{}/manifest/2", server.uri()));
    let canvas = vault.get(&canvas_uri, "canvas", false, None).await.unwrap();
    assert_eq!(canvas["height"], 4000);
    server.verify().await;
}

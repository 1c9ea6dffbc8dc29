//! HTTP source tests against an in-process server

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tempfile::tempdir;

use common::{eventually, serve, RecordingTarget};
use config_courier::common::ErrorKind;
use config_courier::config::{
    ConfigManagerFactory, ConfigSource, HttpSource, PollingConfigManager, ResponseCache, Schedule,
    Settings, Source,
};

/// Router answering `/config` with a fixed body, counting hits
fn fixed(content_type: &'static str, body: &'static str) -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let router = Router::new().route(
        "/config",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ([(header::CONTENT_TYPE, content_type)], body)
            }
        }),
    );

    (router, hits)
}

/// Identical bodies are applied once however often they are fetched
#[tokio::test]
async fn test_identical_bodies_applied_once() {
    let (router, hits) = fixed("application/json", r#"{"feature": {"enabled": true}}"#);
    let addr = serve(router).await;

    let source = HttpSource::new(&format!("http://{}/config", addr), None).unwrap();
    let target = Arc::new(RecordingTarget::default());
    let mut manager =
        PollingConfigManager::new(Box::new(source), target.clone(), Duration::from_millis(20));
    manager.start();

    eventually("three fetches", || hits.load(Ordering::SeqCst) >= 3).await;
    manager.stop().await;

    assert_eq!(target.applied(), vec![json!({"feature": {"enabled": true}})]);
}

/// Changed content lands in the cache with its content type
#[tokio::test]
async fn test_changed_content_is_cached() {
    let (router, _) = fixed("application/json; charset=utf-8", r#"{"n": 1}"#);
    let addr = serve(router).await;
    let dir = tempdir().unwrap();

    let url = format!("http://{}/config", addr);
    let mut source = HttpSource::new(&url, Some(ResponseCache::for_key(dir.path(), &url))).unwrap();

    assert!(source.needs_reload().await);
    assert_eq!(source.reload().await.unwrap(), json!({"n": 1}));
    assert!(!source.needs_reload().await);

    let cached = ResponseCache::for_key(dir.path(), &url).read().unwrap().unwrap();
    assert_eq!(cached.content_type, "application/json; charset=utf-8");
    assert_eq!(cached.body, r#"{"n": 1}"#);
}

/// Non-200 responses are errors and never reach the cache
#[tokio::test]
async fn test_error_status_not_cached() {
    let router = Router::new().route(
        "/config",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response() }),
    );
    let addr = serve(router).await;
    let dir = tempdir().unwrap();

    let url = format!("http://{}/config", addr);
    let cache = ResponseCache::for_key(dir.path(), &url);
    let mut source = HttpSource::new(&url, Some(cache.clone())).unwrap();

    assert!(!source.needs_reload().await);
    let err = source.reload().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("500"));
    assert!(!cache.path().exists());
}

/// A cached response is served before the endpoint answers
#[tokio::test]
async fn test_cache_seeds_cold_start() {
    let dir = tempdir().unwrap();
    let url = "http://127.0.0.1:9/config";
    ResponseCache::for_key(dir.path(), url)
        .store("application/yaml", "replicas: 4\n")
        .await
        .unwrap();

    let mut source = HttpSource::new(url, Some(ResponseCache::for_key(dir.path(), url))).unwrap();

    assert!(source.needs_reload().await);
    assert_eq!(source.reload().await.unwrap(), json!({"replicas": 4}));
    assert!(!source.needs_reload().await);
}

/// Content types pick the parser; unknown ones are refused
#[tokio::test]
async fn test_content_types() {
    let (router, _) = fixed("text/yaml", "name: edge\nports: [80, 443]\n");
    let addr = serve(router).await;
    let mut source = HttpSource::new(&format!("http://{}/config", addr), None).unwrap();
    assert!(source.needs_reload().await);
    assert_eq!(source.reload().await.unwrap(), json!({"name": "edge", "ports": [80, 443]}));

    let (router, _) = fixed("text/html", "<html></html>");
    let addr = serve(router).await;
    let mut source = HttpSource::new(&format!("http://{}/config", addr), None).unwrap();
    assert!(!source.needs_reload().await);
    assert_eq!(source.reload().await.unwrap_err().kind(), ErrorKind::Structural);
}

/// Malformed JSON neither reaches the target nor stops polling
#[tokio::test]
async fn test_malformed_body_keeps_polling() {
    let (router, hits) = fixed("application/json", "{ \"truncated\": ");
    let addr = serve(router).await;

    let source = HttpSource::new(&format!("http://{}/config", addr), None).unwrap();
    let target = Arc::new(RecordingTarget::default());
    let mut manager =
        PollingConfigManager::new(Box::new(source), target.clone(), Duration::from_millis(20));
    manager.start();

    eventually("repeated fetches", || hits.load(Ordering::SeqCst) >= 3).await;
    manager.stop().await;

    assert_eq!(target.apply_count(), 0);
}

/// The factory wires the cache directory and interval into HTTP sources
#[tokio::test]
async fn test_factory_http_source_uses_cache_dir() {
    let (router, _) = fixed("application/json", r#"{"from": "server"}"#);
    let addr = serve(router).await;
    let dir = tempdir().unwrap();

    let factory = ConfigManagerFactory::new().with_settings(Settings {
        configuration_cache: Some(dir.path().to_path_buf()),
        ..Settings::default()
    });

    let address = format!("http://{}/config#pollTime=45", addr);
    let (source, schedule) = factory.create_source(&address).unwrap();
    assert_eq!(schedule, Schedule::Every(Duration::from_secs(45)));

    let mut source = match source {
        Source::Http(source) => source,
        other => panic!("unexpected source {:?}", other),
    };
    assert!(source.needs_reload().await);
    source.reload().await.unwrap();

    let cached = ResponseCache::for_key(dir.path(), &format!("http://{}/config", addr))
        .load_value()
        .unwrap();
    assert_eq!(cached, json!({"from": "server"}));
}

//! Integration tests for the CacheEngine public interface.
//!
//! These drive a fully built engine through install, activation and request
//! handling with a scripted network and a recording window host.

use async_trait::async_trait;
use azsw_core::{
    CacheEngine, CacheStorage, ClickOutcome, ClientHost, Destination, EngineConfig, FetchOutcome,
    Fetcher, MemoryStorage, NotificationClick, NotificationSpec, Notifier, Request, RequestClass,
    RequestKey, RequestMode, Response, ResponseSource, SqliteStorage, SwError, SyncOutcome,
    WindowClient, WorkerState,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const ORIGIN: &str = "https://www.azfanpage.nl";

fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

enum Route {
    Respond(Response),
    Hang,
}

/// Network that answers from a route table and can be switched off.
struct FakeNetwork {
    routes: Mutex<HashMap<String, Route>>,
    online: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeNetwork {
    fn new() -> Self {
        let network = Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        };
        network.serve("/", Response::ok("<html>shell</html>"));
        network.serve("/index.html", Response::ok("<html>index</html>"));
        network.serve("/manifest.json", Response::ok("{}"));
        network.serve("/favicon.ico", Response::ok("ico"));
        network
    }

    fn serve(&self, path: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path), Route::Respond(response));
    }

    fn hang(&self, path: &str) {
        self.routes.lock().unwrap().insert(url(path), Route::Hang);
    }

    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> azsw_core::Result<Response> {
        let target = request.url.to_string();
        self.calls.lock().unwrap().push(target.clone());

        if !self.online.load(Ordering::SeqCst) {
            return Err(SwError::network(&target, "offline"));
        }
        let answer = match self.routes.lock().unwrap().get(&target) {
            Some(Route::Respond(response)) => Some(response.clone()),
            Some(Route::Hang) => None,
            None => return Ok(Response::new(404, "not found")),
        };
        match answer {
            Some(response) => Ok(response),
            None => futures::future::pending().await,
        }
    }
}

/// Window host recording every call.
#[derive(Default)]
struct FakeHost {
    windows: Vec<WindowClient>,
    log: Mutex<Vec<String>>,
    shown: Mutex<Vec<NotificationSpec>>,
}

impl FakeHost {
    fn with_windows(urls: &[&str]) -> Self {
        let windows = urls
            .iter()
            .enumerate()
            .map(|(i, u)| WindowClient {
                id: format!("client-{}", i),
                url: u.to_string(),
                controlled: i % 2 == 0,
            })
            .collect();
        Self {
            windows,
            ..Self::default()
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl ClientHost for FakeHost {
    async fn claim(&self) -> azsw_core::Result<()> {
        self.record("claim".into());
        Ok(())
    }

    async fn match_all(&self, include_uncontrolled: bool) -> azsw_core::Result<Vec<WindowClient>> {
        self.record(format!("match_all({})", include_uncontrolled));
        Ok(self
            .windows
            .iter()
            .filter(|w| include_uncontrolled || w.controlled)
            .cloned()
            .collect())
    }

    async fn focus(&self, client_id: &str) -> azsw_core::Result<()> {
        self.record(format!("focus({})", client_id));
        Ok(())
    }

    async fn open_window(&self, url: &str) -> azsw_core::Result<()> {
        self.record(format!("open_window({})", url));
        Ok(())
    }
}

#[async_trait]
impl Notifier for FakeHost {
    async fn show(&self, spec: &NotificationSpec) -> azsw_core::Result<()> {
        self.shown.lock().unwrap().push(spec.clone());
        Ok(())
    }

    async fn close(&self, tag: &str) -> azsw_core::Result<()> {
        self.record(format!("close({})", tag));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    engine: CacheEngine,
    network: Arc<FakeNetwork>,
    host: Arc<FakeHost>,
    storage: Arc<dyn CacheStorage>,
}

fn harness_with(storage: Arc<dyn CacheStorage>, host: FakeHost) -> Harness {
    let network = Arc::new(FakeNetwork::new());
    let host = Arc::new(host);
    let engine = CacheEngine::builder(EngineConfig::default())
        .storage(storage.clone())
        .fetcher(network.clone())
        .client_host(host.clone())
        .notifier(host.clone())
        .build()
        .unwrap();
    Harness {
        engine,
        network,
        host,
        storage,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(MemoryStorage::new()), FakeHost::default())
}

async fn activated() -> Harness {
    let h = harness();
    h.engine.install().await.unwrap();
    h.engine.activate().await.unwrap();
    h
}

fn navigation(path: &str) -> Request {
    Request::get(&url(path))
        .unwrap()
        .with_mode(RequestMode::Navigate)
        .with_header("Accept", "text/html,application/xhtml+xml")
}

fn image(path: &str) -> Request {
    Request::get(&url(path))
        .unwrap()
        .with_destination(Destination::Image)
}

fn key(path: &str) -> RequestKey {
    Request::get(&url(path)).unwrap().key()
}

fn body(outcome: &FetchOutcome) -> String {
    let response = outcome.response().expect("expected a response");
    String::from_utf8(response.body.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_classification_precedence() {
    let h = harness();
    let classify = |request: Request| h.engine.classify(&request);

    // Navigation wins over every extension rule.
    assert_eq!(
        classify(navigation("/bundle.js")),
        Some(RequestClass::Navigation)
    );
    // Font hosts win over image extensions.
    assert_eq!(
        classify(Request::get("https://fonts.gstatic.com/s/roboto/icon.png").unwrap()),
        Some(RequestClass::Font)
    );
    // Image destination wins over API markers.
    assert_eq!(classify(image("/api/avatar")), Some(RequestClass::Image));
    // API markers win over static extensions.
    assert_eq!(
        classify(Request::get("https://abc.supabase.co/rest/v1/app.js").unwrap()),
        Some(RequestClass::Api)
    );
    assert_eq!(
        classify(Request::get(&url("/wp-json/wp/v2/posts")).unwrap()),
        Some(RequestClass::Api)
    );
    assert_eq!(
        classify(Request::get(&url("/assets/APP.CSS")).unwrap()),
        Some(RequestClass::StaticAsset)
    );
    assert_eq!(
        classify(Request::get(&url("/robots.txt")).unwrap()),
        Some(RequestClass::Default)
    );
}

#[tokio::test]
async fn test_excluded_requests_are_bypassed() {
    let h = activated().await;

    let post = Request::get(&url("/api/comments"))
        .unwrap()
        .with_method(reqwest::Method::POST);
    assert_eq!(h.engine.handle_fetch(&post).await.unwrap(), FetchOutcome::Bypassed);

    let extension = Request::get("chrome-extension://abcdef/script.js").unwrap();
    assert_eq!(
        h.engine.handle_fetch(&extension).await.unwrap(),
        FetchOutcome::Bypassed
    );
    assert!(!h.network.calls().iter().any(|c| c.contains("comments")));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_install_precaches_seed_set() {
    let h = harness();
    let report = h.engine.install().await.unwrap();

    assert_eq!(report.cached, 4);
    assert!(report.skip_waiting);
    assert_eq!(h.engine.state().await, WorkerState::Installed);
    assert_eq!(h.storage.len("az-static-v1.0.0").unwrap(), 4);
}

#[tokio::test]
async fn test_failed_install_keeps_previous_partitions() {
    let storage: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new());
    storage
        .put("az-static-v0.9.0", &key("/"), &Response::ok("old shell"))
        .unwrap();
    let h = harness_with(storage, FakeHost::default());
    h.network.serve("/manifest.json", Response::new(500, "boom"));

    let err = h.engine.install().await.unwrap_err();
    assert!(matches!(err, SwError::InstallFailed { .. }));
    assert_eq!(h.engine.state().await, WorkerState::Redundant);
    assert_eq!(h.storage.partition_names().unwrap(), vec!["az-static-v0.9.0"]);
}

#[tokio::test]
async fn test_version_migration_deletes_only_stale_partitions() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("cache.db");

    {
        let storage = SqliteStorage::open_path(&db_path).unwrap();
        for name in [
            "az-static-v0.9.0",
            "az-static-v1.0.0",
            "az-dynamic-v1.0.0",
            "az-image-v1.0.0",
            "other-cache",
        ] {
            storage.put(name, &key("/"), &Response::ok(name)).unwrap();
        }
    }

    let storage: Arc<dyn CacheStorage> = Arc::new(SqliteStorage::open_path(&db_path).unwrap());
    let h = harness_with(storage, FakeHost::default());
    h.engine.install().await.unwrap();
    let report = h.engine.activate().await.unwrap();

    assert_eq!(report.deleted, vec!["az-static-v0.9.0"]);
    assert!(report.claimed);
    assert_eq!(h.host.log(), vec!["claim"]);

    drop(h);
    let reopened = SqliteStorage::open_path(&db_path).unwrap();
    assert_eq!(
        reopened.partition_names().unwrap(),
        vec![
            "az-static-v1.0.0",
            "az-dynamic-v1.0.0",
            "az-image-v1.0.0",
            "other-cache"
        ]
    );
    assert_eq!(
        reopened
            .get("other-cache", &key("/"))
            .unwrap()
            .map(|r| r.body),
        Some(bytes::Bytes::from_static(b"other-cache"))
    );
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_image_partition_evicts_oldest_entries() {
    let h = activated().await;
    for i in 0..105 {
        let path = format!("/img/{}.jpg", i);
        h.network.serve(&path, Response::ok(format!("image {}", i)));
        let outcome = h.engine.handle_fetch(&image(&path)).await.unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert!(h.storage.len("az-image-v1.0.0").unwrap() <= 100);
    }

    let keys = h.storage.keys("az-image-v1.0.0").unwrap();
    assert_eq!(keys.len(), 100);
    assert_eq!(keys[0], key("/img/5.jpg"));
    assert_eq!(keys[99], key("/img/104.jpg"));
    assert_eq!(h.storage.get("az-image-v1.0.0", &key("/img/4.jpg")).unwrap(), None);
}

#[tokio::test]
async fn test_api_partition_is_capped_and_served_offline() {
    let h = activated().await;
    for i in 0..52 {
        let path = format!("/wp-json/wp/v2/posts/{}", i);
        h.network.serve(&path, Response::ok(format!("post {}", i)));
        h.engine
            .handle_fetch(&Request::get(&url(&path)).unwrap())
            .await
            .unwrap();
    }
    assert_eq!(h.storage.len("az-dynamic-v1.0.0").unwrap(), 50);

    h.network.set_online(false);
    let cached = h
        .engine
        .handle_fetch(&Request::get(&url("/wp-json/wp/v2/posts/51")).unwrap())
        .await
        .unwrap();
    assert_eq!(cached.source(), Some(ResponseSource::Cache));
    assert_eq!(body(&cached), "post 51");

    let evicted = h
        .engine
        .handle_fetch(&Request::get(&url("/wp-json/wp/v2/posts/0")).unwrap())
        .await
        .unwrap();
    assert_eq!(evicted, FetchOutcome::Unavailable);
}

#[tokio::test]
async fn test_stale_while_revalidate_ignores_hanging_network() {
    let h = activated().await;
    h.storage
        .put("az-static-v1.0.0", &key("/app.js"), &Response::ok("cached js"))
        .unwrap();
    h.network.hang("/app.js");

    let request = Request::get(&url("/app.js")).unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), h.engine.handle_fetch(&request))
        .await
        .expect("cached response must not wait for the network")
        .unwrap();

    assert_eq!(outcome.source(), Some(ResponseSource::Cache));
    assert_eq!(body(&outcome), "cached js");
}

#[tokio::test]
async fn test_stale_while_revalidate_refreshes_in_background() {
    let h = activated().await;
    h.storage
        .put("az-static-v1.0.0", &key("/app.css"), &Response::ok("old css"))
        .unwrap();
    h.network.serve("/app.css", Response::ok("new css"));

    let outcome = h
        .engine
        .handle_fetch(&Request::get(&url("/app.css")).unwrap())
        .await
        .unwrap();
    assert_eq!(body(&outcome), "old css");

    let mut refreshed = false;
    for _ in 0..100 {
        let stored = h.storage.get("az-static-v1.0.0", &key("/app.css")).unwrap();
        if stored.map(|r| r.body) == Some(bytes::Bytes::from_static(b"new css")) {
            refreshed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(refreshed, "background revalidation never updated the cache");
}

#[tokio::test]
async fn test_navigation_offline_chain() {
    let h = activated().await;
    h.network.serve("/nieuws", Response::ok("<html>nieuws</html>"));
    let online = h.engine.handle_fetch(&navigation("/nieuws")).await.unwrap();
    assert_eq!(online.source(), Some(ResponseSource::Network));

    h.network.set_online(false);

    // Exact match first.
    let exact = h.engine.handle_fetch(&navigation("/nieuws")).await.unwrap();
    assert_eq!(exact.source(), Some(ResponseSource::Cache));
    assert_eq!(body(&exact), "<html>nieuws</html>");

    // Then the offline shell.
    let shell = h.engine.handle_fetch(&navigation("/wedstrijden")).await.unwrap();
    assert_eq!(body(&shell), "<html>shell</html>");

    // Then nothing.
    h.storage.delete_partition("az-static-v1.0.0").unwrap();
    let nothing = h.engine.handle_fetch(&navigation("/wedstrijden")).await.unwrap();
    assert_eq!(nothing, FetchOutcome::Unavailable);
}

#[tokio::test]
async fn test_offline_image_falls_back_to_placeholder() {
    let h = activated().await;
    h.network.serve("/placeholder.svg", Response::ok("<svg/>"));
    h.engine
        .handle_fetch(&image("/placeholder.svg"))
        .await
        .unwrap();

    h.network.set_online(false);
    let outcome = h.engine.handle_fetch(&image("/spelers/1.webp")).await.unwrap();
    assert_eq!(outcome.source(), Some(ResponseSource::Cache));
    assert_eq!(body(&outcome), "<svg/>");
}

#[tokio::test]
async fn test_uncached_font_propagates_network_error() {
    let h = activated().await;
    h.network.set_online(false);

    let font = Request::get("https://fonts.gstatic.com/s/inter/v1/inter.woff2").unwrap();
    let err = h.engine.handle_fetch(&font).await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_default_class_is_never_stored() {
    let h = activated().await;
    h.network.serve("/robots.txt", Response::ok("User-agent: *"));
    let before = h.engine.stats().unwrap();

    let outcome = h
        .engine
        .handle_fetch(&Request::get(&url("/robots.txt")).unwrap())
        .await
        .unwrap();
    assert_eq!(outcome.source(), Some(ResponseSource::Network));
    assert_eq!(h.engine.stats().unwrap(), before);
}

// ---------------------------------------------------------------------------
// Push, click and sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_plain_text_push_becomes_body() {
    let h = harness();
    let spec = h.engine.handle_push(Some(b"Hello fans")).await.unwrap();

    assert_eq!(spec.title, "AZ Alkmaar");
    assert_eq!(spec.options.body, "Hello fans");
    assert_eq!(h.host.shown.lock().unwrap().as_slice(), &[spec]);
}

#[tokio::test]
async fn test_json_push_overrides_defaults() {
    let h = harness();
    let payload = json!({
        "title": "Doelpunt!",
        "data": { "url": "/wedstrijd/123" }
    })
    .to_string();

    let spec = h.engine.handle_push(Some(payload.as_bytes())).await.unwrap();
    assert_eq!(spec.title, "Doelpunt!");
    assert_eq!(spec.options.body, "Je hebt een nieuwe notificatie");
    assert_eq!(spec.target_url(), "/wedstrijd/123");
    assert_eq!(spec.options.actions.len(), 2);
}

#[tokio::test]
async fn test_click_focuses_exact_match() {
    let h = harness_with(
        Arc::new(MemoryStorage::new()),
        FakeHost::with_windows(&["/", "/wedstrijd/123"]),
    );
    let click = NotificationClick::new("open", "az-notification", json!({"url": "/wedstrijd/123"}));

    let outcome = h.engine.handle_notification_click(&click).await.unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Focused {
            client_id: "client-1".to_string(),
            url: "/wedstrijd/123".to_string(),
        }
    );
    assert_eq!(
        h.host.log(),
        vec!["close(az-notification)", "match_all(true)", "focus(client-1)"]
    );
}

#[tokio::test]
async fn test_click_without_match_opens_window() {
    let h = harness_with(
        Arc::new(MemoryStorage::new()),
        FakeHost::with_windows(&["/wedstrijd/123/"]),
    );
    let click = NotificationClick::new("", "az-notification", json!({"url": "/wedstrijd/123"}));

    let outcome = h.engine.handle_notification_click(&click).await.unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Opened {
            url: "/wedstrijd/123".to_string()
        }
    );
    assert!(h.host.log().contains(&"open_window(/wedstrijd/123)".to_string()));
}

#[tokio::test]
async fn test_dismiss_enumerates_nothing() {
    let h = harness_with(Arc::new(MemoryStorage::new()), FakeHost::with_windows(&["/"]));
    let click = NotificationClick::new("dismiss", "az-notification", json!({"url": "/"}));

    let outcome = h.engine.handle_notification_click(&click).await.unwrap();
    assert_eq!(outcome, ClickOutcome::Dismissed);
    assert_eq!(h.host.log(), vec!["close(az-notification)"]);
}

#[tokio::test]
async fn test_sync_is_inert() {
    let h = activated().await;
    let calls_before = h.network.calls().len();

    assert_eq!(h.engine.handle_sync("background-sync"), SyncOutcome::Completed);
    assert_eq!(h.engine.handle_sync("outbox"), SyncOutcome::Ignored);
    assert_eq!(h.network.calls().len(), calls_before);
}

// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Html,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use linker_server::{
    db::{ParsedLinkStore, SavedLinkStore},
    error::{AppError, AppResult},
    handlers::{self, saved_links},
    models::{
        LinkCategory, LinkRecord, NewSavedLink, PageRequest, ParsedLink, SaveOutcome, SavedLink,
        SavedLinkFilter, SavedLinkUpdate,
    },
    resolver::{FetchError, FetcherConfig, HttpFetcher, LinkResolver, PageFetcher},
    session::SESSION_HEADER,
    state::AppState,
};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Both stores kept in memory, with the same lookup, ownership and ordering
/// rules as the Postgres stores.
#[derive(Default)]
pub struct MemoryStore {
    parsed: Mutex<Vec<ParsedLink>>,
    saved: Mutex<Vec<SavedLink>>,
    pub fail_ping: bool,
}

impl MemoryStore {
    /// A store whose health check always fails.
    pub fn unreachable() -> Self {
        MemoryStore {
            fail_ping: true,
            ..MemoryStore::default()
        }
    }

    /// Number of parsed links stored.
    pub fn len(&self) -> usize {
        self.parsed.lock().unwrap().len()
    }

    pub fn saved_len(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    /// Insert a parsed link directly, bypassing resolution.
    pub fn add_parsed(&self, url: &str, category: LinkCategory) -> ParsedLink {
        let mut record = LinkRecord::failed(url, None, Utc::now(), "Invalid URL format");
        record.category = category;
        let row = ParsedLink::from_record(Uuid::new_v4(), record);
        self.parsed.lock().unwrap().push(row.clone());
        row
    }

    fn modify(
        &self,
        owner_id: &str,
        id: Uuid,
        change: impl FnOnce(&mut SavedLink),
    ) -> Option<SavedLink> {
        let mut saved = self.saved.lock().unwrap();
        let link = saved
            .iter_mut()
            .find(|link| link.id == id && link.owner_id == owner_id)?;
        change(link);
        Some(link.clone())
    }
}

#[async_trait]
impl ParsedLinkStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> AppResult<Option<ParsedLink>> {
        let rows = self.parsed.lock().unwrap();
        Ok(rows.iter().find(|row| row.original_url == url).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ParsedLink>> {
        let rows = self.parsed.lock().unwrap();
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<ParsedLink>> {
        let rows = self.parsed.lock().unwrap();
        Ok(rows.iter().filter(|row| ids.contains(&row.id)).cloned().collect())
    }

    async fn insert(&self, record: LinkRecord) -> AppResult<ParsedLink> {
        let row = ParsedLink::from_record(Uuid::new_v4(), record);
        self.parsed.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn ping(&self) -> AppResult<()> {
        if self.fail_ping {
            Err(AppError::Internal)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SavedLinkStore for MemoryStore {
    async fn save(&self, new: NewSavedLink) -> AppResult<SaveOutcome> {
        let mut saved = self.saved.lock().unwrap();
        if let Some(existing) = saved
            .iter()
            .find(|link| link.owner_id == new.owner_id && link.parsed_link_id == new.parsed_link_id)
        {
            return Ok(SaveOutcome::Existing(existing.clone()));
        }
        let link = SavedLink::new(new, Utc::now());
        saved.push(link.clone());
        Ok(SaveOutcome::Created(link))
    }

    async fn get(&self, owner_id: &str, id: Uuid) -> AppResult<Option<SavedLink>> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .find(|link| link.id == id && link.owner_id == owner_id)
            .cloned())
    }

    async fn list(
        &self,
        owner_id: &str,
        filter: SavedLinkFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<SavedLink>, i64)> {
        let parsed = self.parsed.lock().unwrap();
        let saved = self.saved.lock().unwrap();

        let mut matches: Vec<SavedLink> = saved
            .iter()
            .filter(|link| link.owner_id == owner_id)
            .filter(|link| filter.status.map_or(true, |s| link.status == s))
            .filter(|link| {
                filter.category.map_or(true, |c| {
                    parsed
                        .iter()
                        .any(|p| p.id == link.parsed_link_id && p.category == c)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then(a.id.cmp(&b.id)));

        let total = matches.len() as i64;
        let rows = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();
        Ok((rows, total))
    }

    async fn update(
        &self,
        owner_id: &str,
        id: Uuid,
        update: &SavedLinkUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SavedLink>> {
        Ok(self.modify(owner_id, id, |link| update.apply(link, now)))
    }

    async fn mark_read(
        &self,
        owner_id: &str,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SavedLink>> {
        Ok(self.modify(owner_id, id, |link| link.mark_read(now)))
    }

    async fn toggle_favourite(&self, owner_id: &str, id: Uuid) -> AppResult<Option<SavedLink>> {
        Ok(self.modify(owner_id, id, SavedLink::toggle_favourite))
    }

    async fn delete(&self, owner_id: &str, id: Uuid) -> AppResult<bool> {
        let mut saved = self.saved.lock().unwrap();
        let before = saved.len();
        saved.retain(|link| !(link.id == id && link.owner_id == owner_id));
        Ok(saved.len() < before)
    }
}

/// Fetcher that serves one fixed page for every URL and counts calls.
pub struct FixedPageFetcher {
    html: String,
    pub calls: AtomicUsize,
}

impl FixedPageFetcher {
    pub fn new(html: &str) -> Arc<Self> {
        Arc::new(FixedPageFetcher {
            html: html.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FixedPageFetcher {
    async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.html.clone())
    }
}

// ── App wiring ───────────────────────────────────────────────────────────────

pub fn create_test_app(store: Arc<MemoryStore>, fetcher: Arc<dyn PageFetcher>) -> Router {
    let state = AppState {
        store: store.clone(),
        saved: store,
        resolver: LinkResolver::new(fetcher),
    };
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/links/parse", post(handlers::links::parse_link))
        .route("/links/save", post(saved_links::save_link))
        .route("/links/mine", get(saved_links::list_saved_links))
        .route(
            "/links/:id",
            get(saved_links::get_saved_link)
                .patch(saved_links::update_saved_link)
                .delete(saved_links::delete_saved_link),
        )
        .route("/links/:id/mark-read", post(saved_links::mark_read))
        .route(
            "/links/:id/toggle-favourite",
            post(saved_links::toggle_favourite),
        )
        .with_state(state)
}

/// `HttpFetcher` that is allowed to talk to the loopback test site.
pub fn loopback_fetcher(timeout: Duration) -> HttpFetcher {
    HttpFetcher::new(&FetcherConfig {
        timeout,
        block_private_addresses: false,
        ..FetcherConfig::default()
    })
    .unwrap()
}

// ── Local test site ──────────────────────────────────────────────────────────

pub const ARTICLE_HTML: &str = r#"<!doctype html>
<html><head>
  <title>Fallback Title</title>
  <meta property="og:title" content="Understanding Async Rust"/>
  <meta property="og:description" content="A deep dive into futures for developers"/>
  <meta property="og:image" content="/static/cover.png"/>
  <meta property="og:site_name" content="Ferris Blog"/>
  <meta name="author" content="Ferris Crab"/>
</head><body><p>Hello</p></body></html>"#;

pub const BARE_HTML: &str = "<html><head></head><body>nothing here</body></html>";

/// A page whose body dwarfs its `<head>`.
pub fn large_html() -> String {
    format!(
        r#"<html><head><meta property="og:title" content="Large Page"/></head><body>{}</body></html>"#,
        "x".repeat(256 * 1024)
    )
}

/// Serve a handful of pages on an ephemeral loopback port.
pub async fn spawn_test_site() -> SocketAddr {
    let app = Router::new()
        .route("/article", get(|| async { Html(ARTICLE_HTML) }))
        .route("/bare", get(|| async { Html(BARE_HTML) }))
        .route("/large", get(|| async { Html(large_html()) }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "no such page") }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Html(BARE_HTML)
            }),
        )
        .route(
            "/whoami",
            get(|headers: axum::http::HeaderMap| async move {
                let ua = headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Html(format!(
                    r#"<html><head><meta name="description" content="{ua}"/></head></html>"#
                ))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn get_no_auth(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send a request as the given session, with an optional JSON body.
pub async fn request_as(
    app: Router,
    method: Method,
    uri: &str,
    session: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(SESSION_HEADER, session);
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, req).await
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

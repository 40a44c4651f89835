//! End-to-end tests for the authentication middleware.
//!
//! A probe handler stands in for the downstream application so the tests
//! can observe exactly when the gate forwards, rejects, or attaches a
//! principal.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Extension, Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::from_fn_with_state,
    routing::get,
};
use chrono::{DateTime, Duration, Utc};
use tower::ServiceExt;

use flightdeck_core::config::AuthConfig;
use flightdeck_server::config::AppConfig;
use flightdeck_server::middleware::{CurrentUser, require_auth};
use flightdeck_server::state::AppState;
use flightdeck_server::store::{
    InMemorySessionStore, NewUser, SessionMemoryStore, StoreError, User, UserStore,
};
use flightdeck_token::ManualClock;

/// User store over a fixed map, with a switchable outage.
struct MapUserStore {
    users: HashMap<String, User>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

impl MapUserStore {
    fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.email.clone(), u)).collect(),
            unavailable: AtomicBool::new(false),
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UserStore for MapUserStore {
    async fn create(&self, _new_user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Unavailable("read-only test store".into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("test outage".into()));
        }
        Ok(self.users.get(email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(email))
    }

    async fn set_token_expiration(
        &self,
        _user_id: i64,
        _expiration: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_expired(&self, _now: DateTime<Utc>) -> Result<Vec<User>, StoreError> {
        Ok(Vec::new())
    }
}

fn test_user(id: i64, email: &str) -> User {
    User {
        id,
        name: format!("User {id}"),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        phone: None,
        created_at: Utc::now(),
        token_expiration: None,
    }
}

struct Harness {
    app: Router,
    state: AppState,
    clock: Arc<ManualClock>,
    users: Arc<MapUserStore>,
    handler_hits: Arc<AtomicUsize>,
}

fn harness(users: Vec<User>) -> Harness {
    let cfg = AppConfig {
        auth: AuthConfig {
            secret: "test-gate-secret".to_string(),
            secret_env: None,
            excluded_paths: vec!["/health".to_string(), "/public/*".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let users = Arc::new(MapUserStore::with_users(users));
    let memory: Arc<dyn SessionMemoryStore> = Arc::new(InMemorySessionStore::new());
    let state = AppState::with_stores(cfg, users.clone(), memory, clock.clone()).unwrap();

    let handler_hits = Arc::new(AtomicUsize::new(0));
    let hits = handler_hits.clone();
    let probe = move |current_user: Option<Extension<CurrentUser>>| {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            match current_user {
                Some(Extension(current)) => format!("user:{}", current.user.email),
                None => "anonymous".to_string(),
            }
        }
    };

    let app = Router::new()
        .route("/{*rest}", get(probe))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    Harness {
        app,
        state,
        clock,
        users,
        handler_hits,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get_request(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn bearer_request(path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn excluded_path_is_forwarded_without_credentials() {
    let h = harness(vec![]);
    let (status, body) = send(&h.app, get_request("/public/report/2024")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "anonymous");
    assert_eq!(h.users.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_token_fails_closed() {
    let h = harness(vec![test_user(1, "alice@example.com")]);
    let (status, body) = send(&h.app, get_request("/users/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"detail":"No authentication token provided"}"#);
    // The downstream handler was never invoked.
    assert_eq!(h.handler_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn valid_bearer_token_attaches_principal() {
    let h = harness(vec![test_user(1, "alice@example.com")]);
    let token = h
        .state
        .codec
        .issue("alice@example.com", Duration::minutes(60))
        .unwrap();

    let (status, body) = send(&h.app, bearer_request("/users/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "user:alice@example.com");
    assert_eq!(h.handler_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn header_token_wins_over_cookie_token() {
    let h = harness(vec![
        test_user(1, "alice@example.com"),
        test_user(2, "bob@example.com"),
    ]);
    let header_token = h
        .state
        .codec
        .issue("alice@example.com", Duration::minutes(60))
        .unwrap();
    let cookie_token = h
        .state
        .codec
        .issue("bob@example.com", Duration::minutes(60))
        .unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {header_token}"))
        .header(header::COOKIE, format!("access_token={cookie_token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "user:alice@example.com");
}

#[tokio::test]
async fn cookie_token_authenticates_without_header() {
    let h = harness(vec![test_user(1, "alice@example.com")]);
    let token = h
        .state
        .codec
        .issue("alice@example.com", Duration::minutes(60))
        .unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header(header::COOKIE, format!("access_token={token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "user:alice@example.com");
}

#[tokio::test]
async fn garbage_token_is_rejected_uniformly() {
    let h = harness(vec![test_user(1, "alice@example.com")]);
    let (status, body) = send(&h.app, bearer_request("/users/me", "invalid.token.here")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"detail":"Invalid or expired token"}"#);
}

#[tokio::test]
async fn unknown_subject_is_rejected_like_a_bad_token() {
    let h = harness(vec![test_user(1, "alice@example.com")]);
    let token = h
        .state
        .codec
        .issue("ghost@example.com", Duration::minutes(60))
        .unwrap();

    let (status, body) = send(&h.app, bearer_request("/users/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Same body as a signature failure: no oracle for which step failed.
    assert_eq!(body, r#"{"detail":"Invalid or expired token"}"#);
}

#[tokio::test]
async fn token_expires_between_requests() {
    let h = harness(vec![test_user(1, "alice@example.com")]);
    let token = h
        .state
        .codec
        .issue("alice@example.com", Duration::minutes(60))
        .unwrap();

    h.clock.advance(Duration::minutes(59));
    let (status, body) = send(&h.app, bearer_request("/users/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "user:alice@example.com");

    h.clock.advance(Duration::minutes(2));
    let (status, body) = send(&h.app, bearer_request("/users/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"detail":"Invalid or expired token"}"#);
}

#[tokio::test]
async fn store_outage_is_a_500_not_a_401() {
    let h = harness(vec![test_user(1, "alice@example.com")]);
    let token = h
        .state
        .codec
        .issue("alice@example.com", Duration::minutes(60))
        .unwrap();

    h.users.unavailable.store(true, Ordering::SeqCst);
    let (status, body) = send(&h.app, bearer_request("/users/me", &token)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"detail":"Internal server error"}"#);
    assert_eq!(h.handler_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn default_exclusions_cover_the_public_surface() {
    let h = harness(vec![]);
    // The harness overrides exclusions; check the shipped defaults too.
    let defaults = AuthConfig::default().excluded_paths;
    for path in ["/health", "/users/login", "/users/register", "/flights/search"] {
        assert!(defaults.iter().any(|p| p == path), "{path} should ship excluded");
    }

    let (status, _) = send(&h.app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use api::auth::hash_password;
use api::db::{MemoryUserStore, UserStore};
use api::models::{NewUser, User};
use api::routes::router;
use api::{AppState, Settings};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use gate::Role;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_sessions::session::{Id, Record};
use tower_sessions::{session_store, MemoryStore, SessionManagerLayer, SessionStore};

const PASSWORD: &str = "password123";

fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

struct TestApp {
    router: Router,
    users: MemoryUserStore,
}

impl TestApp {
    fn new() -> Self {
        Self::with_settings("")
    }

    fn with_settings(toml: &str) -> Self {
        Self::with_store(toml, MemoryStore::default())
    }

    fn with_store(toml: &str, sessions: impl SessionStore + Clone) -> Self {
        let settings = Settings::from_toml(toml).unwrap();
        let users = MemoryUserStore::new();
        let state = AppState::new(&settings, Arc::new(users.clone()));
        let router = router(state, "tests/assets").layer(SessionManagerLayer::new(sessions));
        Self { router, users }
    }

    async fn user(&self, email: &str, role: Role, onboarded: bool, banned: bool) -> User {
        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                name: "Test".to_string(),
                password_hash: password_hash(),
                role,
            })
            .await
            .unwrap()
            .unwrap();
        if onboarded {
            self.users
                .complete_onboarding(user.id, "tester", None)
                .await
                .unwrap();
        }
        if banned {
            self.users.set_banned(user.id, true).await.unwrap();
        }
        self.users.find(user.id).await.unwrap().unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("GET", uri, cookie, None).await
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.send("POST", uri, cookie, Some(body)).await
    }

    /// Log in and return the session cookie.
    async fn login(&self, email: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response)
    }
}

/// Session store that counts deletions, i.e. completed sign-outs.
#[derive(Clone, Debug, Default)]
struct CountingStore {
    inner: MemoryStore,
    deletes: Arc<AtomicUsize>,
}

impl CountingStore {
    fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        self.inner.create(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.inner.save(record).await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        self.inner.load(session_id).await
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(session_id).await
    }
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn static_assets_pass_without_session() {
    let app = TestApp::new();
    let response = app.get("/robots.txt", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // a missing asset is the file server's 404, not a redirect to login
    let response = app.get("/icons/icon-192x192.png", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_routes_pass_with_and_without_session() {
    let app = TestApp::new();
    assert_eq!(app.get("/login", None).await.status(), StatusCode::OK);

    app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("ana@example.com").await;
    assert_eq!(app.get("/login", Some(&cookie)).await.status(), StatusCode::OK);
    assert_eq!(app.get("/register", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_is_redirected_or_rejected() {
    let app = TestApp::new();

    let response = app.get("/discover", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = app.get("/", None).await;
    assert_eq!(location(&response), "/login");

    let response = app.get("/api/admin/users", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn incomplete_onboarding_is_held_on_onboarding() {
    let app = TestApp::new();
    app.user("new@example.com", Role::User, false, false).await;
    let cookie = app.login("new@example.com").await;

    let response = app.get("/discover", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/onboarding");

    assert_eq!(app.get("/onboarding", Some(&cookie)).await.status(), StatusCode::OK);

    // API callers get JSON, never the onboarding redirect
    let response = app.get("/api/auth/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["onboarding_complete"], false);
}

#[tokio::test]
async fn completing_onboarding_opens_the_app() {
    let app = TestApp::new();
    app.user("new@example.com", Role::User, false, false).await;
    let cookie = app.login("new@example.com").await;

    let response = app
        .post("/api/onboarding/complete", Some(&cookie), json!({ "display_name": "  " }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/onboarding/complete",
            Some(&cookie),
            json!({ "display_name": "Sam", "bio": "Hiking and coffee" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let info = json_body(response).await;
    assert_eq!(info["display_name"], "Sam");
    assert_eq!(info["onboarding_complete"], true);

    assert_eq!(app.get("/discover", Some(&cookie)).await.status(), StatusCode::OK);
    let response = app.get("/onboarding", Some(&cookie)).await;
    assert_eq!(location(&response), "/discover");
}

#[tokio::test]
async fn admin_bypasses_onboarding() {
    let app = TestApp::new();
    app.user("root@example.com", Role::Admin, false, false).await;
    let cookie = app.login("root@example.com").await;

    assert_eq!(app.get("/discover", Some(&cookie)).await.status(), StatusCode::OK);
    assert_eq!(app.get("/admin", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn finished_users_are_kept_off_onboarding() {
    let app = TestApp::new();
    app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("ana@example.com").await;

    let response = app.get("/onboarding", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/discover");
}

#[tokio::test]
async fn banned_session_is_evicted() {
    let app = TestApp::new();
    app.user("bad@example.com", Role::User, true, true).await;
    let cookie = app.login("bad@example.com").await;

    let response = app.get("/discover", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=Banned");

    // the login page stays reachable and shows the error code
    let response = app.get("/login?error=Banned", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // sign-out runs in the background; the session goes away shortly after
    let mut me = Value::Null;
    for _ in 0..20 {
        tokio::task::yield_now().await;
        me = json_body(app.get("/api/auth/me", Some(&cookie)).await).await;
        if me.is_null() {
            break;
        }
    }
    assert!(me.is_null());

    let response = app.get("/discover", Some(&cookie)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn banned_session_is_signed_out_once() {
    let sessions = CountingStore::default();
    let app = TestApp::with_store("", sessions.clone());
    app.user("bad@example.com", Role::User, true, true).await;
    let cookie = app.login("bad@example.com").await;
    let before = sessions.deletes();

    // both requests land before the background sign-out gets to run
    for _ in 0..2 {
        let response = app.get("/discover", Some(&cookie)).await;
        assert_eq!(location(&response), "/login?error=Banned");
    }

    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(sessions.deletes() - before, 1);
}

#[tokio::test]
async fn banned_api_caller_gets_json() {
    let app = TestApp::new();
    app.user("bad@example.com", Role::User, true, true).await;
    let cookie = app.login("bad@example.com").await;

    let response = app
        .post("/api/push/unsubscribe", Some(&cookie), json!({ "endpoint": "x" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Banned");
}

#[tokio::test]
async fn ban_is_enforced_live_before_token_refresh() {
    let app = TestApp::with_settings("[features]\npush = true");
    let user = app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("ana@example.com").await;

    app.users.set_banned(user.id, true).await.unwrap();

    // the edge still trusts the old token
    assert_eq!(app.get("/discover", Some(&cookie)).await.status(), StatusCode::OK);

    // privileged handlers check the record
    let response = app
        .post(
            "/api/push/subscribe",
            Some(&cookie),
            json!({
                "endpoint": "https://push.example.com/1",
                "keys": { "p256dh": "k", "auth": "a" },
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.users.push_subscriptions(user.id).is_empty());
}

#[tokio::test]
async fn role_gate_protects_admin_routes() {
    let app = TestApp::new();
    app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("ana@example.com").await;

    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/discover");

    let response = app.get("/api/admin/users", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "Forbidden");
}

#[tokio::test]
async fn demoted_admin_is_rejected_live() {
    let app = TestApp::new();
    let admin = app.user("root@example.com", Role::Admin, true, false).await;
    let cookie = app.login("root@example.com").await;

    let response = app.get("/api/admin/users", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    app.users.set_role(admin.id, Role::User).await.unwrap();

    let response = app.get("/api/admin/users", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // the stale token was replaced, so the edge now agrees
    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(location(&response), "/discover");
}

#[tokio::test]
async fn live_requests_keep_refreshing_the_token() {
    // half of a one second lifetime rounds to zero, so every live check refreshes
    let app = TestApp::with_settings("[auth]\ntoken_ttl_secs = 1");
    app.user("root@example.com", Role::Admin, true, false).await;
    let cookie = app.login("root@example.com").await;

    for _ in 0..3 {
        let response = app.get("/api/admin/users", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let me = json_body(app.get("/api/auth/me", Some(&cookie)).await).await;
    assert_eq!(me["email"], "root@example.com");
}

#[tokio::test]
async fn admin_can_ban_and_promote() {
    let app = TestApp::new();
    let admin = app.user("root@example.com", Role::Admin, true, false).await;
    let target = app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("root@example.com").await;

    let response = app
        .post(
            &format!("/api/admin/users/{}/ban", target.id),
            Some(&cookie),
            json!({ "banned": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["is_banned"], true);

    let response = app
        .post(
            &format!("/api/admin/users/{}/ban", admin.id),
            Some(&cookie),
            json!({ "banned": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            &format!("/api/admin/users/{}/role", target.id),
            Some(&cookie),
            json!({ "role": "admin" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["role"], "admin");

    let response = app
        .post(
            &format!("/api/admin/users/{}/ban", uuid::Uuid::new_v4()),
            Some(&cookie),
            json!({ "banned": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_signs_in_and_requires_onboarding() {
    let app = TestApp::new();
    let response = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": " Sam@Example.com ", "password": PASSWORD, "name": "Sam" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let info = json_body(response).await;
    assert_eq!(info["email"], "sam@example.com");
    assert_eq!(info["role"], "user");

    let response = app.get("/discover", Some(&cookie)).await;
    assert_eq!(location(&response), "/onboarding");

    let response = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "sam@example.com", "password": PASSWORD, "name": "Sam" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "other@example.com", "password": "short", "name": "Sam" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_create_one_account() {
    let app = TestApp::new();
    let body = json!({ "email": "sam@example.com", "password": PASSWORD, "name": "Sam" });

    let attempts: Vec<_> = (0..4)
        .map(|_| {
            let request = Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            tokio::spawn(app.router.clone().oneshot(request))
        })
        .collect();

    let mut statuses = Vec::new();
    for attempt in attempts {
        statuses.push(attempt.await.unwrap().unwrap().status());
    }
    statuses.sort();
    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::CONFLICT,
            StatusCode::CONFLICT,
            StatusCode::CONFLICT
        ]
    );

    let accounts = app.users.list().await.unwrap();
    assert_eq!(accounts.len(), 1);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new();
    app.user("ana@example.com", Role::User, true, false).await;
    let response = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid email or password");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new();
    app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("ana@example.com").await;
    assert_eq!(app.get("/discover", Some(&cookie)).await.status(), StatusCode::OK);

    let response = app.post("/api/auth/logout", Some(&cookie), json!({})).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/discover", Some(&cookie)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn push_routes_are_404_while_disabled() {
    let app = TestApp::new();
    app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("ana@example.com").await;

    let response = app
        .post(
            "/api/push/subscribe",
            Some(&cookie),
            json!({
                "endpoint": "https://push.example.com/1",
                "keys": { "p256dh": "k", "auth": "a" },
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn push_subscribe_and_unsubscribe() {
    let app = TestApp::with_settings("[features]\npush = true");
    let user = app.user("ana@example.com", Role::User, true, false).await;
    let cookie = app.login("ana@example.com").await;
    let subscription =
        json!({ "endpoint": "https://push.example.com/1", "keys": { "p256dh": "k", "auth": "a" } });

    let response = app.post("/api/push/subscribe", Some(&cookie), subscription).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.users.push_subscriptions(user.id).len(), 1);

    let body = json!({ "endpoint": "https://push.example.com/1" });
    let response = app.post("/api/push/unsubscribe", Some(&cookie), body.clone()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.post("/api/push/unsubscribe", Some(&cookie), body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_requests_get_the_same_decision() {
    let app = TestApp::new();
    app.user("new@example.com", Role::User, false, false).await;
    let cookie = app.login("new@example.com").await;

    for uri in ["/discover", "/admin", "/onboarding"] {
        let first = app.get(uri, Some(&cookie)).await;
        let second = app.get(uri, Some(&cookie)).await;
        assert_eq!(first.status(), second.status());
        assert_eq!(
            first.headers().get(header::LOCATION),
            second.headers().get(header::LOCATION)
        );
    }
}

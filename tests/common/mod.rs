#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use agora::app::auth::{hash_password, AuthService};
use agora::domain::user::{NewUser, Role};
use agora::infra::memory::MemoryStore;
use agora::infra::store::Store;
use agora::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Test-only key, never used outside this harness.
const TEST_PASETO_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
pub const DEFAULT_PASSWORD: &str = "testpassword123";

// Argon2 is slow in debug builds; hash the shared password once per binary.
static DEFAULT_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

fn default_password_hash() -> String {
    DEFAULT_PASSWORD_HASH
        .get_or_init(|| hash_password(DEFAULT_PASSWORD).expect("password hash failed"))
        .clone()
}

// ---------------------------------------------------------------------------
// TestApp: one fresh in-memory store per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body_bytes).into_owned()
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub access_token: String,
}

pub fn app() -> TestApp {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = AppState {
        store,
        paseto_access_key: TEST_PASETO_ACCESS_KEY,
        access_ttl_minutes: 60,
    };
    let router = agora::http::router(state.clone());

    TestApp { router, state }
}

impl TestApp {
    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    /// POST without a body, as used by the follow and like routes.
    pub async fn post(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, None, &headers).await
    }

    pub async fn patch_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::PATCH, path, Some(body), &headers)
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::DELETE, path, None, &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Insert a user straight into the store and issue an access token.
    pub async fn create_user(&self, suffix: &str) -> TestUser {
        self.create_user_with_role(suffix, Role::User).await
    }

    pub async fn create_admin(&self, suffix: &str) -> TestUser {
        self.create_user_with_role(suffix, Role::Admin).await
    }

    async fn create_user_with_role(&self, suffix: &str, role: Role) -> TestUser {
        let name = format!("Test User {}", suffix);
        let email = format!("test_{}@example.com", suffix);

        let user = self
            .state
            .store
            .insert_user(
                Uuid::new_v4(),
                NewUser {
                    name: name.clone(),
                    email: email.clone(),
                    password_hash: default_password_hash(),
                    role,
                },
            )
            .await
            .expect("insert test user failed");

        let auth_service = AuthService::new(
            self.state.store.clone(),
            self.state.paseto_access_key,
            self.state.access_ttl_minutes,
        );
        let token = auth_service
            .issue_access_token(&user)
            .expect("issue_access_token failed");

        TestUser {
            id: user.id,
            name,
            email,
            access_token: token.token,
        }
    }

    /// Create a post through the API and return its id.
    pub async fn create_post_for_user(&self, user: &TestUser, description: &str) -> Uuid {
        let resp = self
            .post_json(
                "/v1/posts",
                json!({ "description": description }),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "create post failed: {}", resp.text());

        resp.json()["id"]
            .as_str()
            .and_then(|id| id.parse().ok())
            .expect("post id missing")
    }

    pub async fn follow(&self, actor: &TestUser, target: &TestUser) {
        let resp = self
            .post(&format!("/v1/users/{}/follow", target.id), Some(&actor.access_token))
            .await;
        assert_eq!(resp.status, StatusCode::OK, "follow failed: {}", resp.text());
    }
}

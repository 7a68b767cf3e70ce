#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use confgate::{
    auth::federation::{ExternalIdentity, IdentityProvider},
    build_app,
    config::AppConfig,
    users::{NewUser, ProfileFields, User},
    AppState,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// Identity provider that answers every code with a fixed identity.
pub struct FakeProvider {
    pub identity: ExternalIdentity,
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn authorize_url(&self, state: &str) -> String {
        format!("https://idp.test/authorize?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalIdentity> {
        if code == "bad-code" {
            anyhow::bail!("code rejected");
        }
        Ok(self.identity.clone())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::from_state(AppState::fake())
    }

    pub fn with_provider(identity: ExternalIdentity) -> Self {
        let base = AppState::fake();
        let provider = Arc::new(FakeProvider { identity }) as Arc<dyn IdentityProvider>;
        Self::from_state(AppState::from_parts(base.store, base.config, Some(provider)))
    }

    pub fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let base = AppState::fake();
        let mut config = (*base.config).clone();
        tweak(&mut config);
        Self::from_state(AppState::from_parts(base.store, Arc::new(config), None))
    }

    fn from_state(state: AppState) -> Self {
        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response<Body> {
        self.post_json(
            "/api/register",
            json!({"name": name, "email": email, "password": password}),
            None,
        )
        .await
    }

    /// Logs in and returns the access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .post_json("/api/auth/login", json!({"email": email, "password": password}), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "login for {email} failed");
        let body = body_json(resp).await;
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Registers, logs in and returns the access token.
    pub async fn signup(&self, email: &str, password: &str) -> String {
        let resp = self.register("Test User", email, password).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        self.login(email, password).await
    }

    /// The administrator account, onboarded and approved, logged in.
    pub async fn admin_token(&self) -> String {
        let hash = confgate::auth::password::hash_password(ADMIN_PASSWORD).unwrap();
        let admin = self
            .state
            .store
            .create(NewUser {
                email: ADMIN_EMAIL.into(),
                password_hash: Some(hash),
                name: Some("Admin".into()),
                image: None,
                is_profile_complete: true,
            })
            .await
            .unwrap();
        self.state.store.set_approval(admin.id, true).await.unwrap();
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn user(&self, email: &str) -> User {
        self.state.store.find_by_email(email).await.unwrap().unwrap()
    }
}

pub fn profile() -> ProfileFields {
    ProfileFields {
        committee: "UNSC".into(),
        portfolio: "France".into(),
        class: "11".into(),
        school: "Central High".into(),
    }
}

pub fn profile_json() -> Value {
    json!({
        "committee": "UNSC",
        "portfolio": "France",
        "class": "11",
        "school": "Central High"
    })
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap())
        .unwrap_or("")
}

/// `name=value` of a cookie set on the response, if any.
pub fn set_cookie(resp: &Response<Body>, name: &str) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

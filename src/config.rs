use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// OAuth client credentials for the Google identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs against the in-memory user store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    /// Designated administrator, already trimmed and lowercased.
    pub admin_email: Option<String>,
    /// Public base URL, used to build the federation callback URL.
    pub app_url: String,
    pub google: Option<GoogleConfig>,
    pub cookie_secure: bool,
    /// When set, credential registrations go through onboarding like federated ones.
    pub registration_requires_onboarding: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = non_empty_var("DATABASE_URL");
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "confgate".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "confgate-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 30),
        };

        let google = match (
            non_empty_var("GOOGLE_CLIENT_ID"),
            non_empty_var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt,
            admin_email: non_empty_var("ADMIN_EMAIL").map(|v| v.to_lowercase()),
            app_url: std::env::var("APP_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            google,
            cookie_secure: flag_var("COOKIE_SECURE"),
            registration_requires_onboarding: flag_var("REGISTRATION_REQUIRES_ONBOARDING"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag_var(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(false)
}

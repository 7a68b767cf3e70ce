//! Session token issuance and materialization.
//!
//! The token is a cache of store state. Every time a session is materialized
//! the subject's record is re-read and the snapshot rebuilt from the full
//! record, so an administrator's change shows up on the subject's next
//! request without a new login.

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use time::Duration as TimeDuration;
use tracing::debug;
use uuid::Uuid;

use super::claims::SessionUser;
use super::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::UserStore;

pub const SESSION_COOKIE: &str = "session_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Cookie,
}

/// A session re-synced from the store during this request.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: SessionUser,
    pub source: TokenSource,
}

/// Token pair handed out at login and on refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// First issuance: the snapshot comes straight from the identity claim.
pub fn issue_tokens(keys: &JwtKeys, user: &SessionUser) -> anyhow::Result<IssuedTokens> {
    Ok(IssuedTokens {
        access_token: keys.sign_access(user)?,
        refresh_token: keys.sign_refresh(user.id)?,
    })
}

/// Loads the full current record for `subject`. `None` when it no longer exists.
pub async fn sync_from_store(
    store: &dyn UserStore,
    subject: Uuid,
) -> Result<Option<SessionUser>, AppError> {
    let user = store.find_by_id(subject).await?;
    Ok(user.as_ref().map(SessionUser::from))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Access tokens in the order they are tried: bearer header, then cookie.
pub fn presented_tokens<'a>(headers: &'a HeaderMap, jar: &'a CookieJar) -> Vec<(&'a str, TokenSource)> {
    let cookie = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value())
        .filter(|v| !v.is_empty());

    bearer_token(headers)
        .map(|t| (t, TokenSource::Header))
        .into_iter()
        .chain(cookie.map(|v| (v, TokenSource::Cookie)))
        .collect()
}

/// Subject of a valid refresh cookie, used once the access token has lapsed.
pub fn refresh_cookie_subject(keys: &JwtKeys, jar: &CookieJar) -> Option<Uuid> {
    let token = jar.get(REFRESH_COOKIE).map(|c| c.value()).filter(|v| !v.is_empty())?;
    match keys.verify_refresh(token) {
        Ok(claims) => Some(claims.sub),
        Err(e) => {
            debug!(error = %e, "rejecting refresh cookie");
            None
        }
    }
}

/// Materializes the request's session: verify the access token, then re-read
/// the store. A header token that fails verification falls through to the
/// cookie, and a valid refresh cookie re-opens a cookie session whose access
/// token expired. Invalid tokens and vanished subjects yield `None`.
pub async fn resolve(
    state: &AppState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> Result<Option<ResolvedSession>, AppError> {
    let keys = JwtKeys::from(&state.config.jwt);

    let verified = presented_tokens(headers, jar)
        .into_iter()
        .find_map(|(token, source)| match keys.verify_access(token) {
            Ok(claims) => Some((claims, source)),
            Err(e) => {
                debug!(error = %e, source = ?source, "rejecting session token");
                None
            }
        });

    let (subject, snapshot, source) = match verified {
        Some((claims, source)) => (claims.sub, claims.user, source),
        None => match refresh_cookie_subject(&keys, jar) {
            Some(subject) => {
                debug!(user_id = %subject, "session re-opened from refresh cookie");
                (subject, None, TokenSource::Cookie)
            }
            None => return Ok(None),
        },
    };

    let Some(user) = sync_from_store(state.store.as_ref(), subject).await? else {
        debug!(user_id = %subject, "session subject no longer exists");
        return Ok(None);
    };

    if snapshot.as_ref() != Some(&user) {
        debug!(user_id = %user.id, "session snapshot was stale; refreshed from store");
    }

    Ok(Some(ResolvedSession { user, source }))
}

fn base_cookie(name: &'static str, value: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    let mut cookie = base_cookie(SESSION_COOKIE, token, config);
    cookie.set_max_age(TimeDuration::minutes(config.jwt.refresh_ttl_minutes));
    cookie
}

pub fn refresh_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    let mut cookie = base_cookie(REFRESH_COOKIE, token, config);
    cookie.set_max_age(TimeDuration::minutes(config.jwt.refresh_ttl_minutes));
    cookie
}

/// Adds both session cookies for a freshly issued token pair.
pub fn with_session_cookies(jar: CookieJar, tokens: &IssuedTokens, config: &AppConfig) -> CookieJar {
    jar.add(session_cookie(tokens.access_token.clone(), config))
        .add(refresh_cookie(tokens.refresh_token.clone(), config))
}

pub fn without_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

use axum::{
    extract::{rejection::JsonRejection, FromRef, Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::{distributions::Alphanumeric, Rng};
use time::Duration as TimeDuration;
use tracing::{error, info, instrument, warn};

use super::{
    credentials::verify_credentials,
    dto::{AuthResponse, LoginRequest, OAuthCallbackParams, RefreshRequest, RegisterRequest, UserEnvelope},
    federation::reconcile_identity,
    google::CALLBACK_PATH,
    jwt::JwtKeys,
    password::{hash_password_blocking, MIN_PASSWORD_LEN},
    session::{
        self, issue_tokens, sync_from_store, with_session_cookies, without_session_cookies,
        TokenSource, REFRESH_COOKIE,
    },
    claims::SessionUser,
};
use crate::{
    access::gate::{DASHBOARD_PATH, LOGIN_PATH},
    error::{AppError, Result},
    state::AppState,
    users::{is_valid_email, normalize_email, NewUser},
};

const OAUTH_STATE_COOKIE: &str = "oauth_state";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/session", get(current_session))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/signin/google", get(federated_signin))
        .route(CALLBACK_PATH, get(federated_callback))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserEnvelope>)> {
    let Json(payload) = payload?;
    let name = payload.name.trim();
    let email = normalize_email(&payload.email);

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email, and password are required.".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }

    // Ensure email is not taken
    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict(
            "User with this email already exists.".into(),
        ));
    }

    let hash = hash_password_blocking(payload.password).await.map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::Internal(e)
    })?;

    // The unique index still catches a concurrent registration of the same email.
    let user = state
        .store
        .create(NewUser {
            email,
            password_hash: Some(hash),
            name: Some(name.to_string()),
            image: None,
            is_profile_complete: !state.config.registration_requires_onboarding,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User registered successfully!".into(),
            user,
        }),
    ))
}

fn signed_in(
    state: &AppState,
    jar: CookieJar,
    user: SessionUser,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let keys = JwtKeys::from_ref(state);
    let tokens = issue_tokens(&keys, &user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })?;
    let jar = with_session_cookies(jar, &tokens, &state.config);
    Ok((
        jar,
        Json(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user,
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Please enter email and password.".into(),
        ));
    }

    let user = verify_credentials(state.store.as_ref(), &payload.email, &payload.password)
        .await
        .map_err(|e| {
            warn!(email = %normalize_email(&payload.email), reason = %e, "credential login failed");
            e
        })?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    signed_in(&state, jar, user)
}

/// Explicit client-triggered refresh: re-reads the store and issues a new pair.
///
/// The token comes from the body, or from the refresh cookie when the body
/// carries none.
#[instrument(skip(state, jar, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let token = payload
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            jar.get(REFRESH_COOKIE)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        })
        .ok_or_else(|| AppError::Unauthenticated("Missing refresh token".into()))?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        AppError::Unauthenticated("Invalid or expired refresh token".into())
    })?;

    let user = sync_from_store(state.store.as_ref(), claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User not found".into()))?;

    signed_in(&state, jar, user)
}

/// Returns the materialized session, or `null`. Cookie sessions get their
/// cookie rewritten with the fresh snapshot.
#[instrument(skip(state, headers, jar))]
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Option<SessionUser>>)> {
    let Some(resolved) = session::resolve(&state, &headers, &jar).await? else {
        return Ok((jar, Json(None)));
    };

    let jar = if resolved.source == TokenSource::Cookie {
        let token = JwtKeys::from_ref(&state)
            .sign_access(&resolved.user)
            .map_err(AppError::Internal)?;
        jar.add(session::session_cookie(token, &state.config))
    } else {
        jar
    };
    Ok((jar, Json(Some(resolved.user))))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (without_session_cookies(jar), StatusCode::NO_CONTENT)
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn login_error(code: &str) -> Redirect {
    Redirect::temporary(&format!("{LOGIN_PATH}?error={}", urlencoding::encode(code)))
}

/// Starts the federation flow: remember a random state, redirect to the provider.
#[instrument(skip(state, jar))]
pub async fn federated_signin(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let provider = state
        .identity_provider
        .clone()
        .ok_or_else(|| AppError::NotFound("Identity provider not configured".into()))?;

    let oauth_state = random_state();
    let cookie = Cookie::build((OAUTH_STATE_COOKIE, oauth_state.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(TimeDuration::minutes(10))
        .build();

    info!(provider = provider.name(), "starting federated sign-in");
    Ok((jar.add(cookie), Redirect::temporary(&provider.authorize_url(&oauth_state))))
}

/// Provider callback: check state, exchange the code, reconcile, sign in.
#[instrument(skip(state, jar, params))]
pub async fn federated_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let provider = state
        .identity_provider
        .clone()
        .ok_or_else(|| AppError::NotFound("Identity provider not configured".into()))?;

    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"));

    if let Some(err) = params.error {
        warn!(provider = provider.name(), error = %err, "provider returned an error");
        return Ok((jar, login_error(&err)));
    }

    let state_ok = matches!(
        (expected_state.as_deref(), params.state.as_deref()),
        (Some(expected), Some(got)) if !expected.is_empty() && expected == got
    );
    if !state_ok {
        warn!(provider = provider.name(), "oauth state mismatch");
        return Ok((jar, login_error("OAuthState")));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Ok((jar, login_error("OAuthCallback")));
    };

    let identity = match provider.exchange_code(&code).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "code exchange failed");
            return Ok((jar, login_error("OAuthCallback")));
        }
    };

    let user = match reconcile_identity(state.store.as_ref(), &identity).await {
        Ok(user) => user,
        Err(e) => {
            error!(provider = provider.name(), error = %e, "reconciling federated identity failed");
            return Ok((jar, login_error("OAuthCallback")));
        }
    };
    info!(user_id = %user.id, email = %user.email, provider = provider.name(), "federated login");

    let (jar, _) = signed_in(&state, jar, user)?;
    // The gate routes the subject on from here according to its state.
    Ok((jar, Redirect::temporary(DASHBOARD_PATH)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_state_is_alphanumeric_and_unique() {
        let a = random_state();
        let b = random_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn login_error_redirect_encodes_code() {
        let resp = axum::response::IntoResponse::into_response(login_error("access denied"));
        let location = resp.headers().get(axum::http::header::LOCATION).unwrap();
        assert_eq!(location, "/login?error=access%20denied");
    }
}

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use super::claims::SessionUser;
use super::session;
use crate::error::AppError;
use crate::state::AppState;

/// The caller's materialized session; rejects with 401 when there is none.
///
/// Reuses the snapshot the access gate stored in the request extensions and
/// only materializes on its own for routes the gate doesn't cover.
pub struct CurrentSession(pub SessionUser);

/// A session belonging to the designated administrator; 403 otherwise.
pub struct AdminSession(pub SessionUser);

async fn materialize(parts: &Parts, state: &AppState) -> Result<Option<SessionUser>, AppError> {
    if let Some(user) = parts.extensions.get::<SessionUser>() {
        return Ok(Some(user.clone()));
    }
    let jar = CookieJar::from_headers(&parts.headers);
    Ok(session::resolve(state, &parts.headers, &jar)
        .await?
        .map(|resolved| resolved.user))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        materialize(parts, state)
            .await?
            .map(CurrentSession)
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentSession(user) = CurrentSession::from_request_parts(parts, state).await?;
        if !state.admin.is_admin(&user.email) {
            tracing::warn!(email = %user.email, "non-administrator hit an administrator endpoint");
            return Err(AppError::Forbidden("Unauthorized access".into()));
        }
        Ok(AdminSession(user))
    }
}

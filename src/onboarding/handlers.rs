use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::CompleteProfileRequest;
use crate::{
    access::gate::COMPLETE_PROFILE_PATH,
    auth::{extractors::CurrentSession, UserEnvelope},
    error::{AppError, Result},
    state::AppState,
};

pub fn onboarding_routes() -> Router<AppState> {
    Router::new().route(COMPLETE_PROFILE_PATH, post(complete_profile))
}

/// Stores the onboarding attributes and marks the caller's profile complete.
///
/// Resubmitting overwrites the attributes; approval is left untouched.
#[instrument(skip(state, session, payload))]
pub async fn complete_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    payload: std::result::Result<Json<CompleteProfileRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>> {
    let Json(payload) = payload?;
    let Some(fields) = payload.into_fields() else {
        return Err(AppError::Validation(
            "Please provide all required profile details.".into(),
        ));
    };

    let Some(user) = state.store.complete_profile(session.id, &fields).await? else {
        warn!(user_id = %session.id, "profile completion for a missing user");
        return Err(AppError::NotFound("User not found.".into()));
    };

    info!(user_id = %user.id, email = %user.email, "profile completed");
    Ok(Json(UserEnvelope {
        message: "Profile updated successfully!".into(),
        user,
    }))
}

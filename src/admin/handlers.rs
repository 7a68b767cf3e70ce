use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{ToggleApprovalRequest, ToggleTarget};
use crate::{
    auth::{extractors::AdminSession, UserEnvelope},
    error::{AppError, Result},
    state::AppState,
    users::User,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/toggle-approval", post(toggle_approval))
}

/// Every user record, newest first, without password hashes.
#[instrument(skip(state, admin))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
) -> Result<Json<Vec<User>>> {
    let users = state.store.list().await?;
    info!(admin = %admin.email, count = users.len(), "listed users");
    Ok(Json(users))
}

/// Sets a user's approval flag to exactly the requested value.
#[instrument(skip(state, admin, payload))]
pub async fn toggle_approval(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    payload: std::result::Result<Json<ToggleApprovalRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>> {
    let Json(payload) = payload?;
    let change = match payload.validate()? {
        ToggleTarget::Change(change) => change,
        ToggleTarget::Unknown => return Err(AppError::NotFound("User not found.".into())),
    };

    let Some(user) = state.store.set_approval(change.target, change.approved).await? else {
        warn!(admin = %admin.email, user_id = %change.target, "approval toggle for a missing user");
        return Err(AppError::NotFound("User not found.".into()));
    };

    info!(
        admin = %admin.email,
        user_id = %user.id,
        approved = user.is_approved,
        "user approval updated"
    );
    Ok(Json(UserEnvelope {
        message: "User approval status updated successfully!".into(),
        user,
    }))
}

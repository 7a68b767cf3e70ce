//! Views behind the gated pages. Rendering lives in the frontend; each
//! endpoint returns the session and access state the page is drawn from.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{
    access::{
        derive_access_state,
        gate::{DASHBOARD_PATH, ONBOARDING_PATH, PENDING_APPROVAL_PATH},
        AccessState,
    },
    auth::{
        extractors::{AdminSession, CurrentSession},
        SessionUser,
    },
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: &'static str,
    pub access: AccessState,
    pub is_admin: bool,
    pub user: SessionUser,
}

fn view(state: &AppState, page: &'static str, user: SessionUser) -> Json<PageView> {
    Json(PageView {
        page,
        access: derive_access_state(Some(&user)),
        is_admin: state.admin.is_admin(&user.email),
        user,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(DASHBOARD_PATH, get(dashboard))
        .route(ONBOARDING_PATH, get(onboarding))
        .route(PENDING_APPROVAL_PATH, get(pending_approval))
        .route("/admin/manage-users", get(manage_users))
}

pub async fn dashboard(State(state): State<AppState>, CurrentSession(user): CurrentSession) -> Json<PageView> {
    view(&state, "dashboard", user)
}

pub async fn onboarding(State(state): State<AppState>, CurrentSession(user): CurrentSession) -> Json<PageView> {
    view(&state, "onboarding", user)
}

pub async fn pending_approval(
    State(state): State<AppState>,
    CurrentSession(user): CurrentSession,
) -> Json<PageView> {
    view(&state, "pending-approval", user)
}

pub async fn manage_users(State(state): State<AppState>, AdminSession(user): AdminSession) -> Json<PageView> {
    view(&state, "manage-users", user)
}

use serde::Serialize;

use crate::auth::SessionUser;

/// Where a subject stands in the onboarding lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessState {
    Unauthenticated,
    NeedsOnboarding,
    PendingApproval,
    Approved,
}

/// Derived purely from the materialized session.
pub fn derive_access_state(session: Option<&SessionUser>) -> AccessState {
    match session {
        None => AccessState::Unauthenticated,
        Some(user) if !user.is_profile_complete => AccessState::NeedsOnboarding,
        Some(user) if !user.is_approved => AccessState::PendingApproval,
        Some(_) => AccessState::Approved,
    }
}

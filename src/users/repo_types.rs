use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the store.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // absent for federation-only accounts
    pub name: Option<String>,
    pub image: Option<String>,
    pub committee: Option<String>,
    pub portfolio: Option<String>,
    pub class: Option<String>,
    pub school: Option<String>,
    pub is_profile_complete: bool,
    pub is_approved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Insert payload. New users are never approved.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub is_profile_complete: bool,
}

/// The four onboarding attributes, all non-empty once constructed by the onboarding flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub committee: String,
    pub portfolio: String,
    pub class: String,
    pub school: String,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::User;

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// Identity claim: the authorization-relevant snapshot of a user.
///
/// Produced by credential verification and by identity federation alike,
/// embedded in access tokens, and re-synced from the store whenever a session
/// is materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub is_profile_complete: bool,
    pub is_approved: bool,
    pub committee: Option<String>,
    pub portfolio: Option<String>,
    pub class: Option<String>,
    pub school: Option<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            is_profile_complete: user.is_profile_complete,
            is_approved: user.is_approved,
            committee: user.committee.clone(),
            portfolio: user.portfolio.clone(),
            class: user.class.clone(),
            school: user.school.clone(),
        }
    }
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    pub kind: TokenKind, // token type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>, // snapshot, access tokens only
}

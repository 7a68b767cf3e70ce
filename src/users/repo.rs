use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewUser, ProfileFields, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Single source of truth for user records.
///
/// Every mutation is one atomic update of one record and bumps `updated_at`.
/// Update methods return `Ok(None)` when no record has the given id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Overwrites `name`/`image` only where a value is given.
    async fn update_display(
        &self,
        id: Uuid,
        name: Option<String>,
        image: Option<String>,
    ) -> Result<Option<User>, StoreError>;

    /// Sets the four attributes and `is_profile_complete = true` together.
    async fn complete_profile(
        &self,
        id: Uuid,
        profile: &ProfileFields,
    ) -> Result<Option<User>, StoreError>;

    async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Option<User>, StoreError>;
}

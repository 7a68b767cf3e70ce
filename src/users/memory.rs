use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, ProfileFields, User};

/// Process-local store with the same uniqueness rules as the Postgres one.
/// Used by the test suite and when no `DATABASE_URL` is configured.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<Option<User>, StoreError>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            apply(user);
            user.updated_at = OffsetDateTime::now_utc();
            user.clone()
        }))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(StoreError::DuplicateEmail);
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            image: new_user.image,
            committee: None,
            portfolio: None,
            class: None,
            school: None,
            is_profile_complete: new_user.is_profile_complete,
            is_approved: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_display(
        &self,
        id: Uuid,
        name: Option<String>,
        image: Option<String>,
    ) -> Result<Option<User>, StoreError> {
        self.update(id, |user| {
            if let Some(name) = name {
                user.name = Some(name);
            }
            if let Some(image) = image {
                user.image = Some(image);
            }
        })
        .await
    }

    async fn complete_profile(
        &self,
        id: Uuid,
        profile: &ProfileFields,
    ) -> Result<Option<User>, StoreError> {
        let profile = profile.clone();
        self.update(id, move |user| {
            user.committee = Some(profile.committee);
            user.portfolio = Some(profile.portfolio);
            user.class = Some(profile.class);
            user.school = Some(profile.school);
            user.is_profile_complete = true;
        })
        .await
    }

    async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Option<User>, StoreError> {
        self.update(id, |user| user.is_approved = approved).await
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, ProfileFields, User};

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Applies `migrations/`. The store is unusable without the `users` table,
    /// so a failure is returned rather than logged.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("running database migrations")?;
        info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, image, committee, portfolio, class, school,
                   is_profile_complete, is_approved, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, image, committee, portfolio, class, school,
                   is_profile_complete, is_approved, created_at, updated_at
            FROM users
            WHERE lower(email) = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, image, committee, portfolio, class, school,
                   is_profile_complete, is_approved, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, image, is_profile_complete)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, name, image, committee, portfolio, class, school,
                      is_profile_complete, is_approved, created_at, updated_at
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(&new_user.image)
        .bind(new_user.is_profile_complete)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn update_display(
        &self,
        id: Uuid,
        name: Option<String>,
        image: Option<String>,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                image = COALESCE($3, image),
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, name, image, committee, portfolio, class, school,
                      is_profile_complete, is_approved, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(image)
        .fetch_optional(&self.db)
        .await
        .context("update display fields")?;
        Ok(user)
    }

    async fn complete_profile(
        &self,
        id: Uuid,
        profile: &ProfileFields,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET committee = $2,
                portfolio = $3,
                class = $4,
                school = $5,
                is_profile_complete = TRUE,
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, name, image, committee, portfolio, class, school,
                      is_profile_complete, is_approved, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&profile.committee)
        .bind(&profile.portfolio)
        .bind(&profile.class)
        .bind(&profile.school)
        .fetch_optional(&self.db)
        .await
        .context("complete profile")?;
        Ok(user)
    }

    async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_approved = $2,
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, name, image, committee, portfolio, class, school,
                      is_profile_complete, is_approved, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.db)
        .await
        .context("set approval")?;
        Ok(user)
    }
}

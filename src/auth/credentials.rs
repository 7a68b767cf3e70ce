//! Email/password verification against the credential store.

use tracing::debug;

use super::claims::SessionUser;
use super::password::verify_password_blocking;
use crate::error::AppError;
use crate::users::{normalize_email, StoreError, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("no user found with this email")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(e) => CredentialError::Internal(e),
            other => CredentialError::Internal(other.into()),
        }
    }
}

/// Both failure kinds surface identically so responses don't reveal which emails exist.
impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NotFound | CredentialError::InvalidCredentials => {
                AppError::Unauthenticated("Invalid email or password.".into())
            }
            CredentialError::Internal(e) => AppError::Internal(e),
        }
    }
}

/// Read-only. The returned claim carries the store's current flags and profile.
pub async fn verify_credentials(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<SessionUser, CredentialError> {
    let email = normalize_email(email);
    let user = store
        .find_by_email(&email)
        .await?
        .ok_or(CredentialError::NotFound)?;

    // Federation-only accounts have no hash and can never match.
    let Some(hash) = user.password_hash.clone() else {
        debug!(user_id = %user.id, "credential login against passwordless account");
        return Err(CredentialError::InvalidCredentials);
    };

    if !verify_password_blocking(password.to_owned(), hash).await? {
        return Err(CredentialError::InvalidCredentials);
    }

    Ok(SessionUser::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::users::{InMemoryUserStore, NewUser, ProfileFields};

    async fn seeded_store() -> InMemoryUserStore {
        let store = InMemoryUserStore::new();
        store
            .create(NewUser {
                email: "alice@x.com".into(),
                password_hash: Some(hash_password("secret1").unwrap()),
                name: Some("Alice".into()),
                image: None,
                is_profile_complete: true,
            })
            .await
            .unwrap();
        store
            .create(NewUser {
                email: "social@x.com".into(),
                password_hash: None,
                name: None,
                image: None,
                is_profile_complete: false,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let store = seeded_store().await;
        let err = verify_credentials(&store, "nobody@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid() {
        let store = seeded_store().await;
        let err = verify_credentials(&store, "alice@x.com", "nope").await.unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }

    #[tokio::test]
    async fn passwordless_account_is_invalid() {
        let store = seeded_store().await;
        let err = verify_credentials(&store, "social@x.com", "").await.unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }

    #[tokio::test]
    async fn email_is_trimmed_and_case_insensitive() {
        let store = seeded_store().await;
        let claim = verify_credentials(&store, "  ALICE@x.com ", "secret1").await.unwrap();
        assert_eq!(claim.email, "alice@x.com");
        assert!(claim.is_profile_complete);
        assert!(!claim.is_approved);
    }

    #[tokio::test]
    async fn claim_reflects_current_store_values() {
        let store = seeded_store().await;
        let alice = store.find_by_email("alice@x.com").await.unwrap().unwrap();
        store.set_approval(alice.id, true).await.unwrap();
        store
            .complete_profile(
                alice.id,
                &ProfileFields {
                    committee: "UNHRC".into(),
                    portfolio: "Chile".into(),
                    class: "11".into(),
                    school: "North".into(),
                },
            )
            .await
            .unwrap();

        let claim = verify_credentials(&store, "alice@x.com", "secret1").await.unwrap();
        assert!(claim.is_approved);
        assert_eq!(claim.portfolio.as_deref(), Some("Chile"));
    }

    #[test]
    fn failures_share_one_public_message() {
        let a: AppError = CredentialError::NotFound.into();
        let b: AppError = CredentialError::InvalidCredentials.into();
        assert_eq!(a.to_string(), b.to_string());
    }
}

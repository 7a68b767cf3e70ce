//! Reconciles externally-authenticated identities with the credential store.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::claims::SessionUser;
use crate::error::AppError;
use crate::users::{normalize_email, NewUser, StoreError, UserStore};

/// Identity asserted by an external provider after it verified the user.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// An OAuth-style identity provider driving the redirect/callback flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Where to send the browser to start a sign-in carrying `state`.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchanges a callback authorization code for a verified identity.
    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalIdentity>;
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Finds or creates the local record for `identity` and returns its claim.
///
/// New records start with both lifecycle flags false and no password. Existing
/// records only pick up a non-empty name or image; flags and profile
/// attributes are never taken from the provider.
pub async fn reconcile_identity(
    store: &dyn UserStore,
    identity: &ExternalIdentity,
) -> Result<SessionUser, AppError> {
    let email = normalize_email(&identity.email);
    if email.is_empty() {
        return Err(AppError::Validation(
            "Identity provider did not supply an email.".into(),
        ));
    }
    let name = non_empty(identity.name.as_deref());
    let image = non_empty(identity.image.as_deref());

    let user = match store.find_by_email(&email).await? {
        None => {
            let created = store
                .create(NewUser {
                    email: email.clone(),
                    password_hash: None,
                    name,
                    image,
                    is_profile_complete: false,
                })
                .await;
            match created {
                Ok(user) => {
                    info!(user_id = %user.id, email = %user.email, "new federated user created");
                    user
                }
                // A concurrent first sign-in won the insert.
                Err(StoreError::DuplicateEmail) => store
                    .find_by_email(&email)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("user {email} vanished after duplicate insert"))?,
                Err(e) => return Err(e.into()),
            }
        }
        Some(existing) if name.is_some() || image.is_some() => {
            let id = existing.id;
            let updated = store.update_display(id, name, image).await?;
            info!(user_id = %id, email = %email, "existing federated user updated");
            updated.unwrap_or(existing)
        }
        Some(existing) => existing,
    };

    Ok(SessionUser::from(&user))
}

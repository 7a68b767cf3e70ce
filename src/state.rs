use std::sync::Arc;

use crate::access::AdminPolicy;
use crate::auth::federation::IdentityProvider;
use crate::auth::google::GoogleProvider;
use crate::config::AppConfig;
use crate::users::{InMemoryUserStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub admin: AdminPolicy,
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?;
                let store = PgUserStore::new(db);
                store.migrate().await?;
                Arc::new(store) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        let identity_provider = match &config.google {
            Some(google) => {
                Some(Arc::new(GoogleProvider::new(google, &config.app_url)?) as Arc<dyn IdentityProvider>)
            }
            None => {
                tracing::info!("google sign-in disabled; GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set");
                None
            }
        };

        Ok(Self::from_parts(store, config, identity_provider))
    }

    pub fn from_parts(
        store: Arc<dyn UserStore>,
        config: Arc<AppConfig>,
        identity_provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        Self {
            admin: AdminPolicy::from_config(&config),
            store,
            config,
            identity_provider,
        }
    }

    /// In-memory store, fixed test secrets, `admin@example.com` as administrator.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            admin_email: Some("admin@example.com".into()),
            app_url: "http://localhost:8080".into(),
            google: None,
            cookie_secure: false,
            registration_requires_onboarding: false,
        });

        Self::from_parts(Arc::new(InMemoryUserStore::new()), config, None)
    }
}

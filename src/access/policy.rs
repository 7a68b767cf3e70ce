use std::sync::Arc;

use crate::config::AppConfig;

/// The one administrator check, shared by the gate, endpoint guards and page guards.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admin_email: Option<Arc<str>>,
}

impl AdminPolicy {
    /// `None` or an empty value designates nobody.
    pub fn new(admin_email: Option<String>) -> Self {
        Self {
            admin_email: admin_email
                .filter(|e| !e.is_empty())
                .map(Arc::from),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.admin_email.clone())
    }

    /// Exact match against the session's email claim.
    pub fn is_admin(&self, email: &str) -> bool {
        matches!(&self.admin_email, Some(admin) if admin.as_ref() == email)
    }
}

//! Credential store: persisted user records and the backends that hold them.

mod memory;
mod pg;
mod repo;
mod repo_types;

use lazy_static::lazy_static;
use regex::Regex;

pub use memory::InMemoryUserStore;
pub use pg::PgUserStore;
pub use repo::{StoreError, UserStore};
pub use repo_types::{NewUser, ProfileFields, User};

/// Emails are stored and compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod credentials;
mod dto;
pub mod extractors;
pub mod federation;
pub mod google;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod session;

pub use claims::SessionUser;
pub(crate) use dto::UserEnvelope;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}

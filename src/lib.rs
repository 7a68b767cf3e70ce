pub mod access;
pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod pages;
pub mod state;
pub mod users;

pub use app::{build_app, serve};
pub use state::AppState;

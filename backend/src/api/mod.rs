pub mod admin;
pub mod ai_routing;
pub mod analyze;
pub mod api_keys;
pub mod auth;
pub mod common;
pub mod health;
pub mod setup;

pub use health::{health, status};

// Library entry point, shared by the server binary, the CLI and tests
pub mod analyzers;
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod rate_limit;
pub mod routing;
pub mod state;

pub use db::Database;
pub use state::AppState;

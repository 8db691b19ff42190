// HTTP-level integration tests, driven through the router
pub mod admin_test;
pub mod analyze_test;
pub mod auth_test;
pub mod health_test;
pub mod setup_test;

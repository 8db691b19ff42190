// Database integration tests module
pub mod api_keys_test;
pub mod history_test;
pub mod sessions_test;
pub mod users_test;

pub mod reset_password;
pub mod status;
pub mod sync_api_keys;

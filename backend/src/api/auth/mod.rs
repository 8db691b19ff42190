pub mod handlers;
pub mod helpers;
pub mod middleware;

pub use handlers::*;
pub use middleware::{require_session, AdminUser};

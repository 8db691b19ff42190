// Session authentication: stores, credential lookup and login policy
pub mod credentials;
pub mod directory;
pub mod session;

pub use credentials::{AuthError, Authenticator, CredentialSource, LoginPolicy, StoredCredential};
pub use directory::{AdminDirectory, CONFIG_ADMIN_ID};
pub use session::{
  spawn_session_sweeper, MemorySessionStore, Session, SessionStatus, SessionStore,
  SqlSessionStore,
};

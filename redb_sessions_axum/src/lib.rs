//! redb_sessions_axum - Axum integration for redb_sessions
//!
//! Store calls are blocking redb transactions; the helpers here run them on
//! tokio's blocking pool and hand back the `Set-Cookie` headers to attach to
//! the response.

mod config;
mod error;
mod session;

pub use config::{
    SESSION_COOKIE_NAME, SESSION_COOKIE_SECURE, SESSION_DB_PATH, SESSION_REISSUE_ON_MISSING,
    key_pairs_from_env,
};
pub use error::IntoResponseError;
pub use session::{CookieSession, destroy_session, init_store, load_session, save_session};

// Re-export the core crate
pub use redb_sessions;

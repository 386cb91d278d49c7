mod cookie;
mod store;
mod types;

pub use store::{SessionStore, SessionStoreBuilder};
pub use types::{SameSite, Session, SessionOptions, SessionValues};

pub mod client;
pub mod session;
pub mod storage;

pub use client::ApiClient;
pub use session::SessionManager;
pub use storage::{SessionStore, StoredSession};

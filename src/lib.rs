//! Komunal social-feed client.
//!
//! SYSTEM CONTEXT
//! ==============
//! `util::storage` provides durable key/value backends, `state` owns the
//! session store and the app-lifetime auth state, and `net` talks to the
//! REST backend. Front ends (the `komunal` CLI, or a browser shell built with
//! the `browser` feature) drive everything through `net::api::ApiClient`.

pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod util;

pub use config::ClientConfig;
pub use error::{ClientError, Operation};
pub use net::api::ApiClient;
pub use net::types::{Post, PostAuthor, Session, User};
pub use state::auth::{AuthEvent, AuthState, SessionManager};
pub use state::session::SessionStore;
pub use util::storage::{FileStore, KeyValueStore, MemoryStore};

//! Persisted session: bearer token plus cached user.
//!
//! DESIGN
//! ======
//! Two string entries, `token` and `user` (JSON). `save` writes the user
//! first and the token last, undoing the user write if the token write fails,
//! so `load` never sees a token without its user.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use crate::error::ClientError;
use crate::net::types::{Session, User};
use crate::util::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Session persistence over any `KeyValueStore`.
#[derive(Debug)]
pub struct SessionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Persist `session`, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if either entry cannot be written; no
    /// half-written session is left behind.
    pub fn save(&mut self, session: &Session) -> Result<(), ClientError> {
        self.backend.remove(TOKEN_KEY)?;
        self.write_user(&session.user)?;
        if let Err(e) = self.backend.set(TOKEN_KEY, &session.token) {
            let _ = self.backend.remove(USER_KEY);
            return Err(e);
        }
        Ok(())
    }

    /// The stored session, or `None` if absent or unreadable.
    pub fn load(&self) -> Option<Session> {
        let token = self.backend.get(TOKEN_KEY).filter(|t| !t.is_empty())?;
        let raw = self.backend.get(USER_KEY)?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                tracing::warn!(error = %e, "stored user is malformed; treating session as absent");
                None
            }
        }
    }

    /// Replace the cached user, leaving the token alone.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the entry cannot be written.
    pub fn update_user(&mut self, user: &User) -> Result<(), ClientError> {
        self.write_user(user)
    }

    /// Purge the backend, session keys included, in a single write.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the backend cannot be cleared; the
    /// stored session is then still intact.
    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.backend.clear()
    }

    /// Give back the underlying backend.
    pub fn into_inner(self) -> S {
        self.backend
    }

    fn write_user(&mut self, user: &User) -> Result<(), ClientError> {
        let raw = serde_json::to_string(user).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.backend.set(USER_KEY, &raw)
    }
}

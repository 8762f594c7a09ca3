//! Auth-session state for the current client instance.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionManager` is the single owner of the session store. The API client
//! reads the bearer token through it and reports successful signins, profile
//! updates and 401s back to it; front ends watch `AuthState` or listen for
//! `AuthEvent`s instead of polling storage.
//!
//! DESIGN
//! ======
//! `AuthState` is never set directly. Every mutation writes the store and
//! then re-derives the state from what the store now holds, so a stored token
//! and `is_authenticated` cannot drift apart even when a write fails halfway.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};

use crate::error::ClientError;
use crate::net::types::{Session, User};
use crate::state::session::SessionStore;
use crate::util::storage::KeyValueStore;

const EVENT_CAPACITY: usize = 16;

/// Authentication state tracking the current user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

impl AuthState {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(user: User) -> Self {
        Self { is_authenticated: true, user: Some(user) }
    }

    fn from_session(session: Option<Session>) -> Self {
        session.map_or_else(Self::anonymous, |s| Self::authenticated(s.user))
    }
}

/// Auth transitions published to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    /// Signup or signin succeeded.
    SignedIn(User),
    /// The user signed out.
    SignedOut,
    /// The backend rejected the stored token with a 401.
    Expired,
    /// A profile update replaced the cached user.
    ProfileUpdated(User),
}

/// Owner of the persisted session and the derived `AuthState`.
pub struct SessionManager<S> {
    store: Mutex<SessionStore<S>>,
    state: watch::Sender<AuthState>,
    events: broadcast::Sender<AuthEvent>,
}

impl<S: KeyValueStore> SessionManager<S> {
    /// Load any persisted session from `backend` and seed the auth state.
    pub fn init(backend: S) -> Self {
        let store = SessionStore::new(backend);
        let initial = AuthState::from_session(store.load());
        tracing::debug!(authenticated = initial.is_authenticated, "session manager initialized");
        let (state, _) = watch::channel(initial);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store: Mutex::new(store), state, events }
    }

    /// Release the backend. Subscribers see their channels close.
    pub fn teardown(self) -> S {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner).into_inner()
    }

    /// Snapshot of the current auth state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Bearer token for outgoing requests, read from the store.
    pub fn token(&self) -> Option<String> {
        self.lock().load().map(|s| s.token)
    }

    /// Watch the auth state; the receiver sees every transition's result.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Receive auth transitions as they happen.
    pub fn events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Persist a freshly issued session and become authenticated.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the session could not be persisted;
    /// the state then stays as the store reports it.
    pub fn establish(&self, session: &Session) -> Result<(), ClientError> {
        let mut store = self.lock();
        let result = store.save(session);
        self.publish(&store);
        result?;
        tracing::info!(user_id = %session.user.id, username = %session.user.username, "session established");
        let _ = self.events.send(AuthEvent::SignedIn(session.user.clone()));
        Ok(())
    }

    /// Sign out locally: wipe the store and become anonymous.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store could not be cleared.
    pub fn signout(&self) -> Result<(), ClientError> {
        let mut store = self.lock();
        let result = store.clear();
        self.publish(&store);
        result?;
        tracing::info!("signed out");
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    /// Drop the session after the backend rejected `token`.
    ///
    /// Only the session holding that token is dropped: a rejection that
    /// arrives after a newer signin leaves the newer session alone.
    /// Publishes `AuthEvent::Expired` only when a session was actually
    /// cleared. A storage failure here is logged rather than returned so it
    /// cannot mask the 401 that triggered it.
    pub fn invalidate(&self, token: &str) {
        let mut store = self.lock();
        if store.load().is_none_or(|s| s.token != token) {
            tracing::debug!("rejected token no longer stored; session kept");
            return;
        }
        if let Err(e) = store.clear() {
            tracing::warn!(error = %e, "failed to clear invalidated session");
        }
        self.publish(&store);
        drop(store);
        tracing::warn!("session rejected by server; signed out");
        let _ = self.events.send(AuthEvent::Expired);
    }

    /// Replace the cached user after a successful profile update.
    ///
    /// Ignored while anonymous: there is no session to attach the user to.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the user could not be written.
    pub fn update_user(&self, user: &User) -> Result<(), ClientError> {
        let mut store = self.lock();
        if store.load().is_none() {
            return Ok(());
        }
        let result = store.update_user(user);
        self.publish(&store);
        result?;
        let _ = self.events.send(AuthEvent::ProfileUpdated(user.clone()));
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SessionStore<S>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, store: &SessionStore<S>) {
        let next = AuthState::from_session(store.load());
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

//! Client-side session state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` persists the token and cached user; `auth` owns that store for
//! the lifetime of the app and derives the observable `AuthState` from it.

pub mod auth;
pub mod session;

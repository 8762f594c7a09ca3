//! Networking modules for the REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` issues the HTTP calls and applies the session policy, and `types`
//! defines the per-endpoint wire schema.

pub mod api;
pub mod types;

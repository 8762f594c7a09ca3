//! Helpers shared by the state and network layers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` isolates the durable key/value backend and `validation` holds
//! the form checks that gate requests before they reach the network.

pub mod storage;
pub mod validation;

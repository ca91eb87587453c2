//! I/O helpers for conductor commands.

pub mod agents;
pub mod atomic;
pub mod config;
pub mod layout;
pub mod session_store;

//! Deterministic, pure logic shared by the conductor.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod agent_def;
pub mod codec;
pub mod progression;
pub mod registry;
pub mod text;
pub mod types;

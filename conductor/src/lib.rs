//! Phased-session coordinator for agent-driven work.
//!
//! A session is a linear list of agent-assigned phases persisted in a single
//! markdown document (`.claude/tasks/session-current.md`). The crate decides
//! which phase runs next and records that it finished; the work itself is done
//! by an external agent. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (codec, phase progression,
//!   registry validation/generation, agent-definition extraction). No I/O.
//! - **[`io`]**: Side-effecting operations (layout, config, session storage,
//!   agent discovery).
//!
//! Orchestration modules ([`audit`], [`session_ops`]) combine core logic with
//! I/O to implement the CLI commands and the tool surface used by an outer
//! orchestration loop.
//!
//! At most one writer process per project may touch the session document at
//! a time; concurrent writers race on load-modify-save and the last write wins.

pub mod audit;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
pub mod session_ops;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

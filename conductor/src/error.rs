//! Typed error conditions surfaced by session and registry operations.
//!
//! I/O failures stay `anyhow::Error` with path context; these variants name
//! the domain conditions callers are expected to branch on.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The store has no current session document.
    #[error("no session file found at {}", path.display())]
    NoSessionFound { path: PathBuf },

    /// A referenced phase number is absent from the session.
    #[error("phase {0} not found")]
    PhaseNotFound(u32),

    /// A required document section is missing (strict decoding only).
    #[error("malformed session document: missing section '{0}'")]
    MalformedSection(String),

    /// A line in the phase list does not match `N. [x| ] agent - description`
    /// (strict decoding only).
    #[error("malformed phase line: '{line}'")]
    MalformedPhaseLine { line: String },

    /// The agent registry failed validation.
    #[error("agent registry invalid: {}", .0.join("; "))]
    RegistryInvalid(Vec<String>),

    /// A session plan cannot be encoded as a well-formed document.
    #[error("invalid session plan: {0}")]
    InvalidPlan(String),
}

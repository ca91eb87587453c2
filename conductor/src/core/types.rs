//! Shared deterministic result types for core session logic.
//!
//! These are the structured payloads handed to the orchestration layer. They
//! serialize to JSON for the CLI and must stay stable across runs.

use serde::Serialize;

/// The next incomplete phase, with the agents that already finished before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextPhase {
    pub phase_number: u32,
    pub agent: String,
    pub description: String,
    /// Agents of completed phases numbered below this one, in phase order.
    pub depends_on: Vec<String>,
    pub user_request: String,
}

/// Summary of a successful `mark_complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseMarked {
    pub phase_marked: u32,
    pub agent: String,
    pub next_phase: Option<u32>,
    pub next_agent: Option<String>,
    pub all_complete: bool,
}

/// Progress counts over the phase flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub complete: bool,
    pub completed_count: usize,
    pub total_count: usize,
    /// Remaining phases rendered as `"<n>. <agent> - <description>"`.
    pub remaining: Vec<String>,
}

/// Input for writing a fresh session document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub name: String,
    pub user_request: String,
    /// `(agent, description)` in execution order.
    pub phases: Vec<(String, String)>,
}

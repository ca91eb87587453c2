//! In-memory model of a session document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Agent token written to `Current Agent` once every phase is complete.
pub const NO_AGENT: &str = "none";

/// Lifecycle keyword from the `- State:` status line.
///
/// Words other than `pending`, `complete`, and `unknown` are carried verbatim
/// so hand-edited documents survive a decode/encode cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionState {
    Pending,
    Complete,
    #[default]
    Unknown,
    Other(String),
}

impl SessionState {
    pub fn parse(word: &str) -> Self {
        match word {
            "pending" => Self::Pending,
            "complete" => Self::Complete,
            "unknown" | "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Unknown => "unknown",
            Self::Other(word) => word,
        }
    }
}

impl From<String> for SessionState {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<SessionState> for String {
    fn from(value: SessionState) -> Self {
        value.as_str().to_string()
    }
}

/// One ordered, agent-assigned unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// 1-based sequence number; defines execution order.
    pub number: u32,
    /// Opaque agent token (no whitespace).
    pub agent: String,
    pub description: String,
    pub complete: bool,
}

/// A whole session document.
///
/// `phase`, `current_agent`, and `state` are a cache of what the phase flags
/// already say; [`crate::core::progression`] keeps them in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub phase: u32,
    pub total_phases: u32,
    pub current_agent: String,
    pub state: SessionState,
    pub user_request: String,
    pub phases: Vec<Phase>,
    pub work_log: String,
}

impl Session {
    pub fn find_phase(&self, number: u32) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.number == number)
    }

    /// Append an entry to the work log, never rewriting earlier text.
    pub fn append_log(&mut self, entry: &WorkLogEntry) {
        let rendered = entry.render();
        if self.work_log.trim().is_empty() {
            self.work_log = rendered;
        } else {
            self.work_log.push_str("\n\n");
            self.work_log.push_str(&rendered);
        }
    }
}

/// A single appended record in the `## Work Log` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLogEntry {
    pub phase: u32,
    pub agent: String,
    pub notes: String,
    pub recorded_on: NaiveDate,
}

impl WorkLogEntry {
    /// Render as `### Phase <n> (<agent>) - <date>` followed by the notes.
    pub fn render(&self) -> String {
        format!(
            "### Phase {} ({}) - {}\n{}",
            self.phase,
            self.agent,
            self.recorded_on.format("%Y-%m-%d"),
            self.notes.trim()
        )
    }
}

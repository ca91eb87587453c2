//! Session operations exposed to the outer orchestration loop.
//!
//! Each operation loads the current session through a [`SessionStore`],
//! applies the pure logic from [`crate::core::progression`], and writes back
//! when something changed. Expected conditions (no session, unknown phase,
//! everything done) come back as tagged outcomes rather than errors, so the
//! CLI can print them as JSON.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::progression;
use crate::core::types::{CompletionReport, NextPhase, PhaseMarked, SessionPlan};
use crate::error::Error;
use crate::io::session_store::{ArchivedSession, SessionStore};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StatusOutcome {
    NoSession,
    Found(Session),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum NextPhaseOutcome {
    NoSession,
    AllComplete,
    Found(NextPhase),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MarkOutcome {
    NoSession,
    PhaseNotFound { phase_number: u32 },
    Marked(PhaseMarked),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CompletionOutcome {
    NoSession,
    Report(CompletionReport),
}

/// Result of `new`: the archived session, if there was one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSessionOutcome {
    pub archived_number: Option<u32>,
    pub archived_path: Option<String>,
}

impl From<Option<ArchivedSession>> for NewSessionOutcome {
    fn from(archived: Option<ArchivedSession>) -> Self {
        match archived {
            Some(archived) => Self {
                archived_number: Some(archived.number),
                archived_path: Some(archived.path.display().to_string()),
            },
            None => Self {
                archived_number: None,
                archived_path: None,
            },
        }
    }
}

/// Result of `plan`: the freshly written session plus what it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSession {
    pub archived_number: Option<u32>,
    pub session: Session,
}

fn load_checked<S: SessionStore>(store: &S) -> Result<Option<Session>> {
    let session = store.load()?;
    if let Some(session) = &session
        && progression::state_disagreement(session)
    {
        warn!(
            state = session.state.as_str(),
            "session state word disagrees with phase flags; using the flags"
        );
    }
    Ok(session)
}

/// The whole current session.
pub fn session_status<S: SessionStore>(store: &S) -> Result<StatusOutcome> {
    Ok(match load_checked(store)? {
        Some(session) => StatusOutcome::Found(session),
        None => StatusOutcome::NoSession,
    })
}

/// The first incomplete phase and the agents that finished before it.
pub fn next_phase<S: SessionStore>(store: &S) -> Result<NextPhaseOutcome> {
    let Some(session) = load_checked(store)? else {
        return Ok(NextPhaseOutcome::NoSession);
    };
    Ok(match progression::next_phase(&session) {
        Some(next) => NextPhaseOutcome::Found(next),
        None => NextPhaseOutcome::AllComplete,
    })
}

/// Mark `phase_number` complete, append `notes` to the work log, and save.
///
/// The document is only rewritten when the phase exists.
pub fn mark_phase_complete<S: SessionStore>(
    store: &S,
    phase_number: u32,
    notes: &str,
    recorded_on: NaiveDate,
) -> Result<MarkOutcome> {
    let Some(mut session) = load_checked(store)? else {
        return Ok(MarkOutcome::NoSession);
    };
    match progression::mark_complete(&mut session, phase_number, notes, recorded_on) {
        Ok(marked) => {
            store.save(&session)?;
            info!(
                phase = phase_number,
                agent = %marked.agent,
                all_complete = marked.all_complete,
                "phase marked complete"
            );
            Ok(MarkOutcome::Marked(marked))
        }
        Err(Error::PhaseNotFound(number)) => {
            debug!(phase = number, "phase not found");
            Ok(MarkOutcome::PhaseNotFound {
                phase_number: number,
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Completion counts and the remaining phases.
pub fn check_completion<S: SessionStore>(store: &S) -> Result<CompletionOutcome> {
    Ok(match load_checked(store)? {
        Some(session) => CompletionOutcome::Report(progression::completion_report(&session)),
        None => CompletionOutcome::NoSession,
    })
}

/// Archive the current session so a new one can be planned.
pub fn start_new_session<S: SessionStore>(store: &S) -> Result<NewSessionOutcome> {
    Ok(store.archive()?.into())
}

/// Write a fresh session from `plan`, archiving any existing one first.
///
/// The plan is validated before anything is archived.
pub fn plan_session<S: SessionStore>(store: &S, plan: &SessionPlan) -> Result<PlannedSession> {
    let session = progression::plan_session(plan)?;
    let archived = store.archive()?;
    store.save(&session)?;
    info!(
        name = %session.name,
        phases = session.total_phases,
        "planned new session"
    );
    Ok(PlannedSession {
        archived_number: archived.map(|archived| archived.number),
        session,
    })
}

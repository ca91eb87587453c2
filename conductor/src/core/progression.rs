//! Phase progression over a [`Session`].
//!
//! The phase flags are the source of truth. `phase`, `current_agent` and
//! `state` in the status block are recomputed from them on every transition,
//! and a flag that is set never goes back to `false`.

use chrono::NaiveDate;

use crate::core::types::{CompletionReport, NextPhase, PhaseMarked, SessionPlan};
use crate::error::Error;
use crate::session::{NO_AGENT, Phase, Session, SessionState, WorkLogEntry};

/// First phase in document order with `complete=false`.
///
/// Returns `None` when every phase is complete or there are no phases.
pub fn current_phase(session: &Session) -> Option<&Phase> {
    session.phases.iter().find(|phase| !phase.complete)
}

/// Mark `phase_number` complete and advance the status block.
///
/// Non-blank `notes` are appended to the work log as an entry attributed to
/// the phase's agent and dated `recorded_on`.
pub fn mark_complete(
    session: &mut Session,
    phase_number: u32,
    notes: &str,
    recorded_on: NaiveDate,
) -> Result<PhaseMarked, Error> {
    let marked = session
        .phases
        .iter_mut()
        .find(|phase| phase.number == phase_number)
        .ok_or(Error::PhaseNotFound(phase_number))?;
    marked.complete = true;
    let agent = marked.agent.clone();

    let next = current_phase(session).map(|phase| (phase.number, phase.agent.clone()));
    match &next {
        Some((number, next_agent)) => {
            session.phase = *number;
            session.current_agent = next_agent.clone();
            session.state = SessionState::Pending;
        }
        None => {
            session.state = SessionState::Complete;
            session.current_agent = NO_AGENT.to_string();
        }
    }

    if !notes.trim().is_empty() {
        session.append_log(&WorkLogEntry {
            phase: phase_number,
            agent: agent.clone(),
            notes: notes.to_string(),
            recorded_on,
        });
    }

    let (next_phase, next_agent) = next.unzip();
    Ok(PhaseMarked {
        phase_marked: phase_number,
        agent,
        all_complete: next_phase.is_none(),
        next_phase,
        next_agent,
    })
}

/// Whether the session is finished.
///
/// With phases present the flags decide, whatever the `state` word says. Only
/// a session without phases falls back to `state == complete`.
pub fn is_complete(session: &Session) -> bool {
    if session.phases.is_empty() {
        return session.state == SessionState::Complete;
    }
    session.phases.iter().all(|phase| phase.complete)
}

/// True when the `state` word and the phase flags tell different stories
/// (only possible for hand-edited documents).
pub fn state_disagreement(session: &Session) -> bool {
    if session.phases.is_empty() {
        return false;
    }
    let flags_done = session.phases.iter().all(|phase| phase.complete);
    flags_done != (session.state == SessionState::Complete)
}

/// Agents of completed phases numbered below `phase_number`, in phase order.
pub fn dependencies_for(session: &Session, phase_number: u32) -> Vec<String> {
    session
        .phases
        .iter()
        .filter(|phase| phase.complete && phase.number < phase_number)
        .map(|phase| phase.agent.clone())
        .collect()
}

/// The current phase packaged with its dependency hint.
pub fn next_phase(session: &Session) -> Option<NextPhase> {
    let phase = current_phase(session)?;
    Some(NextPhase {
        phase_number: phase.number,
        agent: phase.agent.clone(),
        description: phase.description.clone(),
        depends_on: dependencies_for(session, phase.number),
        user_request: session.user_request.clone(),
    })
}

pub fn completion_report(session: &Session) -> CompletionReport {
    let completed_count = session.phases.iter().filter(|phase| phase.complete).count();
    let remaining = session
        .phases
        .iter()
        .filter(|phase| !phase.complete)
        .map(|phase| format!("{}. {} - {}", phase.number, phase.agent, phase.description))
        .collect();
    CompletionReport {
        complete: is_complete(session),
        completed_count,
        total_count: session.phases.len(),
        remaining,
    }
}

/// Build the initial session for a plan: phase 1 current, nothing complete.
///
/// Agents must be single tokens and descriptions single non-empty lines, so
/// the resulting document decodes back to the same session.
pub fn plan_session(plan: &SessionPlan) -> Result<Session, Error> {
    if plan.phases.is_empty() {
        return Err(Error::InvalidPlan("at least one phase is required".to_string()));
    }
    if plan.name.trim().is_empty() || plan.name.contains('\n') {
        return Err(Error::InvalidPlan(
            "name must be a single non-empty line".to_string(),
        ));
    }

    if plan.user_request.lines().any(|line| line.starts_with("## ")) {
        return Err(Error::InvalidPlan(
            "user request must not contain '## ' headings".to_string(),
        ));
    }

    let mut phases = Vec::with_capacity(plan.phases.len());
    for (idx, (agent, description)) in plan.phases.iter().enumerate() {
        let number = u32::try_from(idx + 1)
            .map_err(|_| Error::InvalidPlan("too many phases".to_string()))?;
        if agent.is_empty() || agent.chars().any(char::is_whitespace) {
            return Err(Error::InvalidPlan(format!(
                "phase {number}: agent '{agent}' must be a single token"
            )));
        }
        let description = description.trim();
        if description.is_empty() || description.contains('\n') {
            return Err(Error::InvalidPlan(format!(
                "phase {number}: description must be a single non-empty line"
            )));
        }
        phases.push(Phase {
            number,
            agent: agent.clone(),
            description: description.to_string(),
            complete: false,
        });
    }

    Ok(Session {
        name: plan.name.trim().to_string(),
        phase: 1,
        total_phases: phases.len() as u32,
        current_agent: phases[0].agent.clone(),
        state: SessionState::Pending,
        user_request: plan.user_request.trim().to_string(),
        phases,
        work_log: String::new(),
    })
}

//! Line-oriented codec for the session document.
//!
//! ```text
//! # Session: <name>
//!
//! ## Status
//! - Phase: <int> of <int>
//! - Current Agent: <token>
//! - State: <word>
//!
//! ## User Request
//! <verbatim text>
//!
//! ## Phases
//! <n>. [x| ] <agent-token> - <description>
//!
//! ## Work Log
//! <free text>
//! ```
//!
//! Decoding is permissive. [`parse_document`] records every section as an
//! explicit `Option` and keeps the phase lines it could not read, then
//! [`decode`] folds absent pieces into zero values. Hand-edited documents
//! therefore always parse; [`decode_strict`] is the opt-in rejecting variant.
//!
//! `## ` headings end the current section. Inside `## Work Log` only a
//! required section that has not appeared yet does; any other heading is
//! part of the log text, so appended notes can never truncate it.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::session::{Phase, Session, SessionState};

/// Text written in place of an empty work log; decodes back to an empty log.
pub const WORK_LOG_PLACEHOLDER: &str = "(agents will update this)";

const HEADER_PREFIX: &str = "# Session:";
const SECTION_PREFIX: &str = "## ";

static PHASE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\. \[([x ])\] (\S+) - (.+)$").unwrap());
static PHASE_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Phase: (\d+) of (\d+)").unwrap());
static CURRENT_AGENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Current Agent: (\S+)").unwrap());
static STATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"State: (\w+)").unwrap());

/// Required `## ` sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Status,
    UserRequest,
    Phases,
    WorkLog,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Status,
        Section::UserRequest,
        Section::Phases,
        Section::WorkLog,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            Section::Status => "Status",
            Section::UserRequest => "User Request",
            Section::Phases => "Phases",
            Section::WorkLog => "Work Log",
        }
    }

    fn from_heading(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.heading() == text)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Values read from the `- key: value` lines of `## Status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBlock {
    pub phase: Option<u32>,
    pub total_phases: Option<u32>,
    pub current_agent: Option<String>,
    pub state: Option<String>,
}

/// Result of reading a document without applying any defaults.
///
/// `None` means the section heading was absent. Present-but-empty sections are
/// `Some` with empty contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub name: Option<String>,
    pub status: Option<StatusBlock>,
    pub user_request: Option<String>,
    pub phases: Option<Vec<Phase>>,
    pub work_log: Option<String>,
    /// Non-blank lines under `## Phases` that are not `N. [x| ] agent - desc`.
    pub skipped_phase_lines: Vec<String>,
}

impl ParsedDocument {
    pub fn missing_sections(&self) -> Vec<Section> {
        let present = [
            self.status.is_some(),
            self.user_request.is_some(),
            self.phases.is_some(),
            self.work_log.is_some(),
        ];
        Section::ALL
            .into_iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(section, _)| section)
            .collect()
    }

    /// Fold into a [`Session`], substituting zero values for anything absent.
    pub fn into_session(self) -> Session {
        let status = self.status.unwrap_or_default();
        Session {
            name: self.name.unwrap_or_default(),
            phase: status.phase.unwrap_or(0),
            total_phases: status.total_phases.unwrap_or(0),
            current_agent: status.current_agent.unwrap_or_default(),
            state: status
                .state
                .map(|word| SessionState::parse(&word))
                .unwrap_or_default(),
            user_request: self.user_request.unwrap_or_default(),
            phases: self.phases.unwrap_or_default(),
            work_log: self.work_log.unwrap_or_default(),
        }
    }
}

/// Read every recognizable piece of `text`.
pub fn parse_document(text: &str) -> ParsedDocument {
    let mut doc = ParsedDocument::default();
    let mut bodies: [Option<Vec<&str>>; 4] = Default::default();
    let mut active = Cursor::Preamble;

    for line in text.lines() {
        if let Some(heading) = line.strip_prefix(SECTION_PREFIX) {
            let unseen = Section::from_heading(heading.trim())
                .filter(|section| bodies[section.index()].is_none());
            // Inside the work log only an unseen required section ends it.
            if active != Cursor::In(Section::WorkLog) || unseen.is_some() {
                active = match unseen {
                    Some(section) => {
                        bodies[section.index()] = Some(Vec::new());
                        Cursor::In(section)
                    }
                    None => Cursor::Ignored,
                };
                continue;
            }
        }

        match active {
            Cursor::Preamble => {
                if doc.name.is_none()
                    && let Some(rest) = line.strip_prefix(HEADER_PREFIX)
                {
                    let name = rest.trim();
                    if !name.is_empty() {
                        doc.name = Some(name.to_string());
                    }
                }
            }
            Cursor::In(section) => {
                if let Some(body) = bodies[section.index()].as_mut() {
                    body.push(line);
                }
            }
            Cursor::Ignored => {}
        }
    }

    let [status, user_request, phases, work_log] = bodies;
    doc.status = status.map(|lines| parse_status(&lines));
    doc.user_request = user_request.map(|lines| join_block(&lines));
    doc.phases = phases.map(|lines| {
        let mut parsed = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_phase_line(trimmed) {
                Some(phase) => parsed.push(phase),
                None => doc.skipped_phase_lines.push(trimmed.to_string()),
            }
        }
        parsed
    });
    doc.work_log = work_log.map(|lines| {
        let body = join_block(&lines);
        if body == WORK_LOG_PLACEHOLDER {
            String::new()
        } else {
            body
        }
    });

    doc
}

/// Permissive decode: absent fields become zero values, malformed phase
/// lines are dropped.
pub fn decode(text: &str) -> Session {
    parse_document(text).into_session()
}

/// Strict decode: every required section must be present and every non-blank
/// line under `## Phases` must be a phase line.
pub fn decode_strict(text: &str) -> Result<Session, Error> {
    let doc = parse_document(text);
    if let Some(section) = doc.missing_sections().first() {
        return Err(Error::MalformedSection(section.heading().to_string()));
    }
    if let Some(line) = doc.skipped_phase_lines.first() {
        return Err(Error::MalformedPhaseLine { line: line.clone() });
    }
    Ok(doc.into_session())
}

/// Serialize with fixed section order and a single trailing newline.
pub fn encode(session: &Session) -> String {
    let phases = session
        .phases
        .iter()
        .map(render_phase_line)
        .collect::<Vec<_>>()
        .join("\n");
    let work_log = if session.work_log.trim().is_empty() {
        WORK_LOG_PLACEHOLDER
    } else {
        session.work_log.as_str()
    };

    format!(
        "# Session: {name}\n\n\
         ## Status\n\
         - Phase: {phase} of {total}\n\
         - Current Agent: {agent}\n\
         - State: {state}\n\n\
         ## User Request\n{request}\n\n\
         ## Phases\n{phases}\n\n\
         ## Work Log\n{work_log}\n",
        name = session.name,
        phase = session.phase,
        total = session.total_phases,
        agent = session.current_agent,
        state = session.state.as_str(),
        request = session.user_request,
    )
}

/// `N. [x] agent - description` (or `[ ]` when incomplete).
pub fn render_phase_line(phase: &Phase) -> String {
    format!(
        "{}. [{}] {} - {}",
        phase.number,
        if phase.complete { 'x' } else { ' ' },
        phase.agent,
        phase.description
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Preamble,
    In(Section),
    Ignored,
}

fn parse_phase_line(line: &str) -> Option<Phase> {
    let caps = PHASE_LINE_RE.captures(line)?;
    Some(Phase {
        number: caps[1].parse().ok()?,
        complete: &caps[2] == "x",
        agent: caps[3].to_string(),
        description: caps[4].to_string(),
    })
}

fn parse_status(lines: &[&str]) -> StatusBlock {
    let mut status = StatusBlock::default();
    for item in lines.iter().filter_map(|line| line.trim().strip_prefix("- ")) {
        if status.phase.is_none()
            && let Some(caps) = PHASE_COUNT_RE.captures(item)
        {
            status.phase = caps[1].parse().ok();
            status.total_phases = caps[2].parse().ok();
        }
        if status.current_agent.is_none()
            && let Some(caps) = CURRENT_AGENT_RE.captures(item)
        {
            status.current_agent = Some(caps[1].to_string());
        }
        if status.state.is_none()
            && let Some(caps) = STATE_RE.captures(item)
        {
            status.state = Some(caps[1].to_string());
        }
    }
    status
}

fn join_block(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

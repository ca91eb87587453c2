//! Test-only helpers for sessions, agents, stores, and scratch projects.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use crate::core::agent_def::AgentDescriptor;
use crate::io::layout::ProjectLayout;
use crate::io::session_store::{ArchivedSession, SessionStore};
use crate::session::{NO_AGENT, Phase, Session, SessionState};

/// Three-phase session with phase 1 complete and an empty work log.
pub const SAMPLE_SESSION: &str = "# Session: checkout-flow\n\n## Status\n- Phase: 2 of 3\n- Current Agent: b\n- State: pending\n\n## User Request\nAdd a checkout flow\n\n## Phases\n1. [x] a - x\n2. [ ] b - y\n3. [ ] c - z\n\n## Work Log\n(agents will update this)\n";

/// Create a phase with explicit fields.
pub fn phase(number: u32, agent: &str, description: &str, complete: bool) -> Phase {
    Phase {
        number,
        agent: agent.to_string(),
        description: description.to_string(),
        complete,
    }
}

/// Create a session named `demo` whose status block agrees with `phases`.
pub fn session_with_phases(phases: Vec<Phase>) -> Session {
    let (phase, current_agent, state) = match phases.iter().find(|phase| !phase.complete) {
        Some(open) => (open.number, open.agent.clone(), SessionState::Pending),
        None => (
            phases.last().map_or(0, |phase| phase.number),
            NO_AGENT.to_string(),
            SessionState::Complete,
        ),
    };
    Session {
        name: "demo".to_string(),
        phase,
        total_phases: phases.len() as u32,
        current_agent,
        state,
        user_request: "Build the demo".to_string(),
        phases,
        work_log: String::new(),
    }
}

/// Create an agent descriptor with a deterministic description and file name.
pub fn agent(name: &str, owns: &[&str], never_touches: &[&str]) -> AgentDescriptor {
    AgentDescriptor {
        name: name.to_string(),
        description: format!("{name} agent"),
        file_name: format!("{name}.md"),
        owns: owns.iter().map(|path| path.to_string()).collect(),
        never_touches: never_touches.iter().map(|path| path.to_string()).collect(),
    }
}

/// In-memory [`SessionStore`] that numbers archives sequentially.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: RefCell<Option<Session>>,
    archived: RefCell<Vec<Session>>,
    saves: RefCell<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        let store = Self::default();
        store.current.replace(Some(session));
        store
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn archived(&self) -> Vec<Session> {
        self.archived.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SessionStore for MemorySessionStore {
    fn exists(&self) -> bool {
        self.current.borrow().is_some()
    }

    fn load(&self) -> Result<Option<Session>> {
        Ok(self.current())
    }

    fn save(&self, session: &Session) -> Result<()> {
        self.current.replace(Some(session.clone()));
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn archive(&self) -> Result<Option<ArchivedSession>> {
        let Some(session) = self.current.take() else {
            return Ok(None);
        };
        let mut archived = self.archived.borrow_mut();
        archived.push(session);
        let number = archived.len() as u32;
        Ok(Some(ArchivedSession {
            number,
            path: PathBuf::from(format!("memory/session-{number}.md")),
        }))
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory/session-current.md")
    }
}

/// Temporary project root with the default layout.
pub struct TestProject {
    _dir: TempDir,
    pub layout: ProjectLayout,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = ProjectLayout::with_defaults(dir.path());
        Self { _dir: dir, layout }
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }

    pub fn write_agent(&self, file_name: &str, contents: &str) -> PathBuf {
        write_file(&self.layout.agents_dir.join(file_name), contents)
    }

    pub fn write_registry(&self, contents: &str) -> PathBuf {
        write_file(&self.layout.registry_path, contents)
    }

    pub fn write_session(&self, contents: &str) -> PathBuf {
        write_file(&self.layout.session_path, contents)
    }

    pub fn write_task_file(&self, file_name: &str, contents: &str) -> PathBuf {
        write_file(&self.layout.tasks_dir.join(file_name), contents)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, contents: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
    path.to_path_buf()
}

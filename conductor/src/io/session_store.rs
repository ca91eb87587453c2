//! Persistence of the current session document and its archives.
//!
//! The [`SessionStore`] trait decouples session orchestration from the
//! filesystem. Tests use an in-memory store that records archive calls.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::codec::{decode_strict, encode, parse_document};
use crate::error::Error;
use crate::io::atomic::write_atomic;
use crate::io::layout::ProjectLayout;
use crate::session::Session;

/// An archived session: its sequence number and where it now lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedSession {
    pub number: u32,
    pub path: PathBuf,
}

/// Storage for the single current session plus numbered archives.
///
/// Stores assume a single writer. Two processes saving or archiving the same
/// project concurrently may lose updates or pick the same archive number.
pub trait SessionStore {
    fn exists(&self) -> bool;

    /// Read the current session, or `None` when there is none.
    fn load(&self) -> Result<Option<Session>>;

    /// Replace the current session document.
    fn save(&self, session: &Session) -> Result<()>;

    /// Move the current session to the next free archive slot.
    ///
    /// Returns `None` (and does nothing) when there is no current session.
    fn archive(&self) -> Result<Option<ArchivedSession>>;

    /// Human-readable location of the current session, used in errors.
    fn location(&self) -> PathBuf;

    /// Like [`SessionStore::load`], but a missing session is an error.
    fn require(&self) -> Result<Session> {
        match self.load()? {
            Some(session) => Ok(session),
            None => Err(Error::NoSessionFound {
                path: self.location(),
            }
            .into()),
        }
    }
}

/// Session store backed by the project's tasks directory.
#[derive(Debug, Clone)]
pub struct FsSessionStore {
    layout: ProjectLayout,
    strict: bool,
}

impl FsSessionStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            strict: false,
        }
    }

    /// Reject malformed documents on load instead of reading them permissively.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl SessionStore for FsSessionStore {
    fn exists(&self) -> bool {
        self.layout.session_path.is_file()
    }

    #[instrument(skip_all, fields(strict = self.strict))]
    fn load(&self) -> Result<Option<Session>> {
        let path = &self.layout.session_path;
        if !self.exists() {
            debug!(path = %path.display(), "no current session");
            return Ok(None);
        }
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        if self.strict {
            let session =
                decode_strict(&text).with_context(|| format!("decode {}", path.display()))?;
            return Ok(Some(session));
        }

        let doc = parse_document(&text);
        let missing = doc.missing_sections();
        if !missing.is_empty() {
            warn!(
                path = %path.display(),
                missing = ?missing.iter().map(|s| s.heading()).collect::<Vec<_>>(),
                "session document is missing sections"
            );
        }
        for line in &doc.skipped_phase_lines {
            warn!(line = %line, "skipping malformed phase line");
        }
        Ok(Some(doc.into_session()))
    }

    fn save(&self, session: &Session) -> Result<()> {
        debug!(path = %self.layout.session_path.display(), phase = session.phase, "saving session");
        write_atomic(&self.layout.session_path, &encode(session))
    }

    #[instrument(skip_all)]
    fn archive(&self) -> Result<Option<ArchivedSession>> {
        let current = &self.layout.session_path;
        if !self.exists() {
            debug!("no current session to archive");
            return Ok(None);
        }
        let number = next_archive_number(&self.layout)?;
        let path = self.layout.archive_path(number);
        fs::rename(current, &path)
            .with_context(|| format!("archive {} to {}", current.display(), path.display()))?;
        info!(number, path = %path.display(), "archived session");
        Ok(Some(ArchivedSession { number, path }))
    }

    fn location(&self) -> PathBuf {
        self.layout.session_path.clone()
    }
}

/// One past the highest existing archive number, or 1 if there are none.
///
/// Gaps are never reused: with `session-1.md` and `session-5.md` on disk the
/// next archive is number 6.
pub fn next_archive_number(layout: &ProjectLayout) -> Result<u32> {
    let highest = archive_numbers(&layout.tasks_dir, layout)?
        .into_iter()
        .max()
        .unwrap_or(0);
    highest.checked_add(1).ok_or_else(|| {
        anyhow!(
            "archive numbers exhausted in {} (highest is {highest})",
            layout.tasks_dir.display()
        )
    })
}

fn archive_numbers(dir: &Path, layout: &ProjectLayout) -> Result<Vec<u32>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut numbers = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let name = entry.file_name();
        if let Some(number) = name.to_str().and_then(|name| layout.archive_number(name)) {
            numbers.push(number);
        }
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::WORK_LOG_PLACEHOLDER;
    use crate::session::SessionState;
    use crate::test_support::{SAMPLE_SESSION, TestProject, phase, session_with_phases};

    #[test]
    fn load_missing_session_is_none() {
        let project = TestProject::new();
        let store = FsSessionStore::new(project.layout.clone());
        assert!(!store.exists());
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn require_maps_missing_to_no_session_found() {
        let project = TestProject::new();
        let store = FsSessionStore::new(project.layout.clone());
        let err = store.require().expect_err("missing");
        let typed = err.downcast_ref::<Error>().expect("typed error");
        assert_eq!(
            typed,
            &Error::NoSessionFound {
                path: project.layout.session_path.clone()
            }
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let project = TestProject::new();
        let store = FsSessionStore::new(project.layout.clone());
        let session = session_with_phases(vec![
            phase(1, "a", "first", true),
            phase(2, "b", "second", false),
        ]);
        store.save(&session).expect("save");
        assert!(store.exists());
        assert_eq!(store.load().expect("load"), Some(session));

        let on_disk = fs::read_to_string(&project.layout.session_path).expect("read");
        assert!(on_disk.ends_with(&format!("## Work Log\n{WORK_LOG_PLACEHOLDER}\n")));
    }

    #[test]
    fn lenient_load_skips_malformed_phase_lines() {
        let project = TestProject::new();
        let text = SAMPLE_SESSION.replace("3. [ ] c - z", "3. [?] c - z");
        project.write_session(&text);
        let store = FsSessionStore::new(project.layout.clone());
        let session = store.load().expect("load").expect("session");
        assert_eq!(session.phases.len(), 2);
        assert_eq!(session.state, SessionState::Pending);
    }

    #[test]
    fn strict_load_rejects_malformed_phase_lines() {
        let project = TestProject::new();
        let text = SAMPLE_SESSION.replace("3. [ ] c - z", "3. [?] c - z");
        project.write_session(&text);
        let store = FsSessionStore::new(project.layout.clone()).strict(true);
        let err = store.load().expect_err("strict");
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::MalformedPhaseLine {
                line: "3. [?] c - z".to_string()
            })
        );
    }

    #[test]
    fn archive_without_session_is_noop() {
        let project = TestProject::new();
        let store = FsSessionStore::new(project.layout.clone());
        assert_eq!(store.archive().expect("archive"), None);
        assert_eq!(next_archive_number(&project.layout).expect("next"), 1);
    }

    /// Numbering continues from the highest archive; gaps are not filled.
    #[test]
    fn archive_skips_past_highest_number() {
        let project = TestProject::new();
        project.write_task_file("session-1.md", "old");
        project.write_task_file("session-5.md", "old");
        project.write_task_file("session-draft.md", "ignored");
        project.write_session(SAMPLE_SESSION);

        let store = FsSessionStore::new(project.layout.clone());
        let archived = store.archive().expect("archive").expect("archived");
        assert_eq!(archived.number, 6);
        assert_eq!(archived.path, project.layout.archive_path(6));
        assert!(!store.exists());
        assert_eq!(
            fs::read_to_string(&archived.path).expect("read archive"),
            SAMPLE_SESSION
        );
    }

    /// The highest representable archive number leaves no free slot; the
    /// current session and existing archives stay where they are.
    #[test]
    fn archive_fails_when_numbers_are_exhausted() {
        let project = TestProject::new();
        let last = project.write_task_file("session-4294967295.md", "last");
        project.write_session(SAMPLE_SESSION);
        let store = FsSessionStore::new(project.layout.clone());

        let err = store.archive().expect_err("exhausted");

        assert!(err.to_string().contains("archive numbers exhausted"));
        assert!(store.exists());
        assert_eq!(fs::read_to_string(&last).expect("read"), "last");
        assert!(!project.layout.archive_path(0).exists());
    }

    #[test]
    fn repeated_archives_count_up() {
        let project = TestProject::new();
        let store = FsSessionStore::new(project.layout.clone());
        for expected in 1..=3 {
            project.write_session(SAMPLE_SESSION);
            let archived = store.archive().expect("archive").expect("archived");
            assert_eq!(archived.number, expected);
        }
        assert_eq!(next_archive_number(&project.layout).expect("next"), 4);
    }
}

//! Canonical paths under the project's control directory.
//!
//! Every name is configurable through [`LayoutConfig`]; components receive a
//! [`ProjectLayout`] instead of joining paths themselves, so tests can point
//! them at temporary roots.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory and file names making up the on-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Hidden control directory at the project root.
    pub control_dir: String,
    /// Agent definitions and the registry, inside `control_dir`.
    pub agents_dir: String,
    /// Current and archived sessions, inside `control_dir`.
    pub tasks_dir: String,
    /// Registry document name, inside `agents_dir`.
    pub registry_file: String,
    /// Session documents are named `<prefix>-<current_name>.md` / `<prefix>-<n>.md`.
    pub session_prefix: String,
    pub current_name: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            control_dir: ".claude".to_string(),
            agents_dir: "agents".to_string(),
            tasks_dir: "tasks".to_string(),
            registry_file: "AGENTS.md".to_string(),
            session_prefix: "session".to_string(),
            current_name: "current".to_string(),
        }
    }
}

/// All canonical paths for a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub control_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub tasks_dir: PathBuf,
    pub registry_path: PathBuf,
    pub session_path: PathBuf,
    registry_file: String,
    session_prefix: String,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, config: &LayoutConfig) -> Self {
        let root = root.into();
        let control_dir = root.join(&config.control_dir);
        let agents_dir = control_dir.join(&config.agents_dir);
        let tasks_dir = control_dir.join(&config.tasks_dir);
        Self {
            registry_path: agents_dir.join(&config.registry_file),
            session_path: tasks_dir.join(format!(
                "{}-{}.md",
                config.session_prefix, config.current_name
            )),
            root,
            control_dir,
            agents_dir,
            tasks_dir,
            registry_file: config.registry_file.clone(),
            session_prefix: config.session_prefix.clone(),
        }
    }

    /// Layout with the default `.claude/{agents,tasks}` names.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, &LayoutConfig::default())
    }

    pub fn registry_file_name(&self) -> &str {
        &self.registry_file
    }

    /// Path of archived session number `number`.
    pub fn archive_path(&self, number: u32) -> PathBuf {
        self.tasks_dir
            .join(format!("{}-{}.md", self.session_prefix, number))
    }

    /// Archive number encoded in `file_name`, if it is `<prefix>-<n>.md`.
    pub fn archive_number(&self, file_name: &str) -> Option<u32> {
        file_name
            .strip_prefix(self.session_prefix.as_str())?
            .strip_prefix('-')?
            .strip_suffix(".md")?
            .parse()
            .ok()
    }

    /// Directory name of the project root, or `Project` if it has none.
    pub fn project_dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Project".to_string())
    }

    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_paths_are_stable() {
        let layout = ProjectLayout::with_defaults("/work/shop");
        assert_eq!(layout.control_dir, Path::new("/work/shop/.claude"));
        assert_eq!(layout.agents_dir, Path::new("/work/shop/.claude/agents"));
        assert_eq!(layout.tasks_dir, Path::new("/work/shop/.claude/tasks"));
        assert_eq!(
            layout.registry_path,
            Path::new("/work/shop/.claude/agents/AGENTS.md")
        );
        assert_eq!(
            layout.session_path,
            Path::new("/work/shop/.claude/tasks/session-current.md")
        );
        assert_eq!(
            layout.archive_path(4),
            Path::new("/work/shop/.claude/tasks/session-4.md")
        );
        assert_eq!(layout.project_dir_name(), "shop");
    }

    #[test]
    fn custom_names_flow_into_every_path() {
        let config = LayoutConfig {
            control_dir: ".orchestra".to_string(),
            agents_dir: "crew".to_string(),
            tasks_dir: "runs".to_string(),
            registry_file: "CREW.md".to_string(),
            session_prefix: "run".to_string(),
            current_name: "live".to_string(),
        };
        let layout = ProjectLayout::new("/p", &config);
        assert_eq!(layout.registry_path, Path::new("/p/.orchestra/crew/CREW.md"));
        assert_eq!(layout.session_path, Path::new("/p/.orchestra/runs/run-live.md"));
        assert_eq!(layout.archive_number("run-7.md"), Some(7));
        assert_eq!(layout.archive_number("session-7.md"), None);
    }

    #[test]
    fn archive_number_ignores_non_numeric_names() {
        let layout = ProjectLayout::with_defaults("/p");
        assert_eq!(layout.archive_number("session-12.md"), Some(12));
        assert_eq!(layout.archive_number("session-current.md"), None);
        assert_eq!(layout.archive_number("session-3.md.tmp"), None);
        assert_eq!(layout.archive_number("session-.md"), None);
        assert_eq!(layout.archive_number("notes.md"), None);
    }
}

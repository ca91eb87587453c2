//! Project audit for `conductor audit` and `conductor init`.
//!
//! Checks the control-directory structure, discovers agent definitions, and
//! validates the registry. With auto-fix enabled, missing directories are
//! created and a missing or invalid registry is regenerated.

use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::agent_def::AgentDescriptor;
use crate::core::registry::{RegistrySection, generate, generate_minimal, validate};
use crate::core::text::{title_case, truncate_chars};
use crate::error::Error;
use crate::io::agents::discover_agents;
use crate::io::atomic::write_atomic;
use crate::io::layout::ProjectLayout;

const REPORT_DESCRIPTION_CHARS: usize = 50;
const REPORT_OWNS_SHOWN: usize = 3;

/// A reason the project is not ready for orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "section", rename_all = "snake_case")]
pub enum AuditIssue {
    RegistryMissing,
    MissingSection(RegistrySection),
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditIssue::RegistryMissing => f.write_str("Agent registry not found"),
            AuditIssue::MissingSection(section) => write!(f, "Missing section: {section}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    pub project_root: PathBuf,
    pub has_control_dir: bool,
    pub has_agents_dir: bool,
    pub has_registry: bool,
    pub registry_valid: bool,
    pub discovered_agents: Vec<AgentDescriptor>,
    pub issues: Vec<AuditIssue>,
    pub actions_taken: Vec<String>,
}

impl AuditResult {
    /// Ready when the agents directory exists and the registry validates.
    pub fn is_ready(&self) -> bool {
        self.has_agents_dir && self.registry_valid
    }
}

/// Audit `layout`, optionally repairing structure and registry.
#[instrument(skip_all, fields(root = %layout.root.display(), auto_fix = auto_fix))]
pub fn audit_project(layout: &ProjectLayout, auto_fix: bool) -> Result<AuditResult> {
    let mut result = AuditResult {
        project_root: layout.root.clone(),
        has_control_dir: layout.control_dir.is_dir(),
        has_agents_dir: layout.agents_dir.is_dir(),
        has_registry: layout.registry_path.is_file(),
        registry_valid: false,
        discovered_agents: discover_agents(layout)?,
        issues: Vec::new(),
        actions_taken: Vec::new(),
    };
    debug!(agents = result.discovered_agents.len(), "discovered agents");

    if result.has_registry {
        let path = &layout.registry_path;
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let content = String::from_utf8_lossy(&bytes);
        if matches!(content, Cow::Owned(_)) {
            warn!(path = %path.display(), "registry is not valid UTF-8");
        }
        let validation = validate(&content);
        result.registry_valid = validation.is_valid();
        result
            .issues
            .extend(validation.missing.into_iter().map(AuditIssue::MissingSection));
    } else {
        result.issues.push(AuditIssue::RegistryMissing);
    }

    if auto_fix {
        repair(layout, &mut result)?;
    }

    Ok(result)
}

fn repair(layout: &ProjectLayout, result: &mut AuditResult) -> Result<()> {
    if !result.has_control_dir {
        create_dir(layout, &layout.control_dir, &mut result.actions_taken)?;
        result.has_control_dir = true;
    }
    if !result.has_agents_dir {
        create_dir(layout, &layout.agents_dir, &mut result.actions_taken)?;
        result.has_agents_dir = true;
    }
    if !layout.tasks_dir.is_dir() {
        create_dir(layout, &layout.tasks_dir, &mut result.actions_taken)?;
    }

    if !result.has_registry || !result.registry_valid {
        let registry_name = layout.registry_file_name();
        let (content, action) = if result.discovered_agents.is_empty() {
            (
                generate_minimal(&layout.project_dir_name()),
                format!("Created minimal {registry_name} template"),
            )
        } else {
            (
                generate(
                    &result.discovered_agents,
                    &title_case(&layout.project_dir_name()),
                ),
                format!(
                    "Generated {registry_name} from {} discovered agents",
                    result.discovered_agents.len()
                ),
            )
        };
        write_atomic(&layout.registry_path, &content)?;
        info!(path = %layout.registry_path.display(), "wrote agent registry");
        result.actions_taken.push(action);
        result.has_registry = true;
        result.registry_valid = true;
        result.issues.clear();
    }
    Ok(())
}

fn create_dir(layout: &ProjectLayout, dir: &Path, actions: &mut Vec<String>) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    info!(path = %dir.display(), "created directory");
    actions.push(format!("Created {}/ directory", layout.relative(dir).display()));
    Ok(())
}

/// Fail with [`Error::RegistryInvalid`] unless the project is ready.
pub fn ensure_ready(result: &AuditResult) -> Result<(), Error> {
    if result.is_ready() {
        return Ok(());
    }
    let mut issues: Vec<String> = result.issues.iter().map(ToString::to_string).collect();
    if !result.has_agents_dir {
        issues.insert(0, "Agents directory not found".to_string());
    }
    Err(Error::RegistryInvalid(issues))
}

/// Audit without repairing anything and fail with [`Error::RegistryInvalid`]
/// unless the project is ready to run a session.
pub fn require_ready(layout: &ProjectLayout) -> Result<AuditResult> {
    let result = audit_project(layout, false)?;
    ensure_ready(&result)?;
    Ok(result)
}

/// Human-readable audit report.
pub fn render_report(layout: &ProjectLayout, result: &AuditResult) -> String {
    let mark = |ok: bool| if ok { "✓" } else { "✗" };
    let rule = "=".repeat(60);
    let registry_name = layout.registry_file_name();
    let structure = [
        (
            format!("{}/", layout.relative(&layout.control_dir).display()),
            result.has_control_dir,
        ),
        (
            format!("{}/", layout.relative(&layout.agents_dir).display()),
            result.has_agents_dir,
        ),
        (registry_name.to_string(), result.has_registry),
        (format!("{registry_name} valid"), result.registry_valid),
    ];

    let mut out = String::new();
    let _ = writeln!(out, "{rule}\n  PROJECT AUDIT REPORT\n{rule}");
    let _ = writeln!(out, "Project: {}\n", result.project_root.display());

    out.push_str("Structure:\n");
    for (label, ok) in &structure {
        let _ = writeln!(out, "  {label:<20} {}", mark(*ok));
    }
    out.push('\n');

    if result.discovered_agents.is_empty() {
        out.push_str("Discovered Agents: None\n");
    } else {
        let _ = writeln!(
            out,
            "Discovered Agents ({}):",
            result.discovered_agents.len()
        );
        for agent in &result.discovered_agents {
            let _ = writeln!(
                out,
                "  • {}: {}...",
                agent.name,
                truncate_chars(&agent.description, REPORT_DESCRIPTION_CHARS)
            );
            if !agent.owns.is_empty() {
                let shown: Vec<&str> = agent
                    .owns
                    .iter()
                    .take(REPORT_OWNS_SHOWN)
                    .map(String::as_str)
                    .collect();
                let _ = writeln!(out, "    owns: {}", shown.join(", "));
            }
        }
    }
    out.push('\n');

    if !result.issues.is_empty() {
        out.push_str("Issues:\n");
        for issue in &result.issues {
            let _ = writeln!(out, "  ⚠ {issue}");
        }
        out.push('\n');
    }

    if !result.actions_taken.is_empty() {
        out.push_str("Actions Taken:\n");
        for action in &result.actions_taken {
            let _ = writeln!(out, "  → {action}");
        }
        out.push('\n');
    }

    if result.is_ready() {
        out.push_str("Status: ✓ Ready for orchestration\n");
    } else {
        out.push_str("Status: ✗ Not ready (see issues above)\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestProject;

    const BACKEND_AGENT: &str = "---\nname: backend\ndescription: Owns the HTTP API\n---\n\n## Files I OWN:\n- src/api/\n\n## Files I NEVER touch:\n- web/\n";

    /// An empty directory is repaired into a ready project with a minimal registry.
    #[test]
    fn auto_fix_bootstraps_empty_project() {
        let project = TestProject::new();
        let layout = &project.layout;

        let result = audit_project(layout, true).expect("audit");

        assert!(result.is_ready());
        assert!(result.issues.is_empty());
        assert!(layout.tasks_dir.is_dir());
        assert_eq!(
            result.actions_taken,
            vec![
                "Created .claude/ directory".to_string(),
                "Created .claude/agents/ directory".to_string(),
                "Created .claude/tasks/ directory".to_string(),
                "Created minimal AGENTS.md template".to_string(),
            ]
        );
        let registry = fs::read_to_string(&layout.registry_path).expect("registry");
        assert!(validate(&registry).is_valid());
        assert!(registry.contains("(no domain agents defined)"));
    }

    #[test]
    fn auto_fix_generates_registry_from_agents() {
        let project = TestProject::new();
        project.write_agent("backend.md", BACKEND_AGENT);

        let result = audit_project(&project.layout, true).expect("audit");

        assert!(result.is_ready());
        assert_eq!(result.discovered_agents.len(), 1);
        assert!(
            result
                .actions_taken
                .contains(&"Generated AGENTS.md from 1 discovered agents".to_string())
        );
        let registry = fs::read_to_string(&project.layout.registry_path).expect("registry");
        assert!(registry.contains("| `backend` | `src/api/` | `web/` |"));
    }

    #[test]
    fn audit_without_fix_only_reports() {
        let project = TestProject::new();

        let result = audit_project(&project.layout, false).expect("audit");

        assert!(!result.is_ready());
        assert!(!result.has_control_dir);
        assert_eq!(result.issues, vec![AuditIssue::RegistryMissing]);
        assert!(result.actions_taken.is_empty());
        assert!(!project.layout.control_dir.exists());
        assert_eq!(
            ensure_ready(&result),
            Err(Error::RegistryInvalid(vec![
                "Agents directory not found".to_string(),
                "Agent registry not found".to_string(),
            ]))
        );
    }

    /// An incomplete registry is reported section by section, then replaced on fix.
    #[test]
    fn invalid_registry_is_reported_then_regenerated() {
        let project = TestProject::new();
        project.write_registry("# Team\n\n## Agent Registry\n");

        let report = audit_project(&project.layout, false).expect("audit");
        assert!(report.has_registry);
        assert!(!report.registry_valid);
        assert_eq!(
            report.issues,
            vec![
                AuditIssue::MissingSection(RegistrySection::OwnershipMatrix),
                AuditIssue::MissingSection(RegistrySection::RoutingTable),
            ]
        );

        let fixed = audit_project(&project.layout, true).expect("audit");
        assert!(fixed.is_ready());
        assert!(fixed.issues.is_empty());
        assert_eq!(ensure_ready(&fixed), Ok(()));
    }

    /// A valid project is left alone on repeated runs.
    #[test]
    fn second_fix_takes_no_actions() {
        let project = TestProject::new();
        audit_project(&project.layout, true).expect("first audit");
        let registry_before = fs::read_to_string(&project.layout.registry_path).expect("read");

        let second = audit_project(&project.layout, true).expect("second audit");

        assert!(second.is_ready());
        assert!(second.actions_taken.is_empty());
        let registry_after = fs::read_to_string(&project.layout.registry_path).expect("read");
        assert_eq!(registry_before, registry_after);
    }

    /// A registry that is not UTF-8 is reported invalid and replaced on fix.
    #[test]
    fn non_utf8_registry_is_invalid_not_fatal() {
        let project = TestProject::new();
        project.write_registry("");
        fs::write(&project.layout.registry_path, [0xff, 0xfe, b'#', 0x80]).expect("write");

        let report = audit_project(&project.layout, false).expect("audit");
        assert!(report.has_registry);
        assert!(!report.registry_valid);
        assert_eq!(report.issues.len(), 3);

        let fixed = audit_project(&project.layout, true).expect("audit with fix");
        assert!(fixed.is_ready());
        let registry = fs::read_to_string(&project.layout.registry_path).expect("utf-8 registry");
        assert!(validate(&registry).is_valid());
    }

    #[test]
    fn require_ready_gates_on_registry() {
        let project = TestProject::new();
        let err = require_ready(&project.layout).expect_err("not ready");
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::RegistryInvalid(issues)) if issues.contains(&"Agent registry not found".to_string())
        ));
        assert!(!project.layout.control_dir.exists());

        audit_project(&project.layout, true).expect("init");
        let ready = require_ready(&project.layout).expect("ready");
        assert!(ready.is_ready());
    }

    #[test]
    fn report_lists_structure_agents_and_status() {
        let project = TestProject::new();
        project.write_agent("backend.md", BACKEND_AGENT);
        let result = audit_project(&project.layout, true).expect("audit");

        let report = render_report(&project.layout, &result);

        assert!(report.contains("PROJECT AUDIT REPORT"));
        assert!(report.contains(".claude/agents/"));
        assert!(report.contains("AGENTS.md valid"));
        assert!(report.contains("Discovered Agents (1):\n  • backend: Owns the HTTP API...\n    owns: src/api/\n"));
        assert!(report.contains("Actions Taken:\n"));
        assert!(report.ends_with("Status: ✓ Ready for orchestration\n"));
    }

    #[test]
    fn issue_display_matches_registry_wording() {
        assert_eq!(
            AuditIssue::MissingSection(RegistrySection::RoutingTable).to_string(),
            "Missing section: Routing Table"
        );
    }
}

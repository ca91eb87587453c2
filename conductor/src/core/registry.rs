//! Agent registry (`AGENTS.md`) validation and generation.
//!
//! A registry is valid when it contains three recognizable sections: Agent
//! Registry, Ownership Matrix and Routing Table. Generated registries always
//! pass [`validate`] and are a pure function of their inputs, so regenerating
//! one produces a clean diff.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::agent_def::AgentDescriptor;
use crate::core::text::truncate_chars;

const PURPOSE_MAX_CHARS: usize = 50;
const TRIGGER_MAX_CHARS: usize = 30;
const OWNERSHIP_PATHS_SHOWN: usize = 3;

// The first section also accepts an `Agents` heading at any level.
static AGENT_REGISTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)agent registry|^#{1,6}[ \t]+agents\b").unwrap());
static OWNERSHIP_MATRIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ownership matrix").unwrap());
static ROUTING_TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)routing table").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrySection {
    AgentRegistry,
    OwnershipMatrix,
    RoutingTable,
}

impl RegistrySection {
    pub const ALL: [RegistrySection; 3] = [
        RegistrySection::AgentRegistry,
        RegistrySection::OwnershipMatrix,
        RegistrySection::RoutingTable,
    ];

    pub fn title(self) -> &'static str {
        match self {
            RegistrySection::AgentRegistry => "Agent Registry",
            RegistrySection::OwnershipMatrix => "Ownership Matrix",
            RegistrySection::RoutingTable => "Routing Table",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            RegistrySection::AgentRegistry => &AGENT_REGISTRY_RE,
            RegistrySection::OwnershipMatrix => &OWNERSHIP_MATRIX_RE,
            RegistrySection::RoutingTable => &ROUTING_TABLE_RE,
        }
    }
}

impl fmt::Display for RegistrySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Outcome of [`validate`]: every missing section, in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryValidation {
    pub missing: Vec<RegistrySection>,
}

impl RegistryValidation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    /// Human-readable issues, one per missing section.
    pub fn issues(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|section| format!("Missing section: {section}"))
            .collect()
    }
}

/// Check all three sections; never stops at the first missing one.
pub fn validate(content: &str) -> RegistryValidation {
    RegistryValidation {
        missing: RegistrySection::ALL
            .into_iter()
            .filter(|section| !section.pattern().is_match(content))
            .collect(),
    }
}

/// Registry built from discovered agent descriptors.
pub fn generate(agents: &[AgentDescriptor], project_name: &str) -> String {
    let registry_rows = agents
        .iter()
        .map(|agent| {
            format!(
                "| {} | `{}` | {}... |",
                agent.name,
                agent.file_name,
                truncate_chars(&agent.description, PURPOSE_MAX_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let ownership_rows = agents
        .iter()
        .map(|agent| {
            format!(
                "| `{}` | {} | {} |",
                agent.name,
                path_list(&agent.owns),
                path_list(&agent.never_touches)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let routing_rows = agents
        .iter()
        .map(|agent| {
            let trigger = if agent.description.is_empty() {
                agent.name.as_str()
            } else {
                truncate_chars(&agent.description, TRIGGER_MAX_CHARS)
            };
            format!("| {} | `{}` |", trigger, agent.name)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"# {project_name} Agent System

This document is the **single source of truth** for agent coordination.

---

## Agent Registry

| Agent | File | Purpose |
|-------|------|---------|
{registry_rows}

---

## Ownership Matrix

**Each agent has EXCLUSIVE ownership of specific file paths.**

| Agent | OWNS (only they modify) | NEVER touches |
|-------|-------------------------|---------------|
{ownership_rows}

---

## Routing Table

| IF task involves... | SPAWN this agent |
|---------------------|------------------|
{routing_rows}

---

## Dependency Graph

```
[Define execution order here]
    │
    ▼
finalize (ALWAYS last)
```

---

## Notes

This AGENTS.md was auto-generated by the conductor.
Review and customize the ownership matrix and routing table.
"#
    )
}

/// Registry skeleton for a project without agent definitions.
pub fn generate_minimal(project_name: &str) -> String {
    format!(
        r#"# {project_name} Agent System

This document is the **single source of truth** for agent coordination.

---

## Agent Registry

| Agent | File | Purpose |
|-------|------|---------|
| (no domain agents defined) | - | - |

---

## Ownership Matrix

| Agent | OWNS (only they modify) | NEVER touches |
|-------|-------------------------|---------------|
| (define domain agents) | - | - |

---

## Routing Table

| IF task involves... | SPAWN this agent |
|---------------------|------------------|
| (define routing rules) | - |

---

## Adding Domain Agents

1. Create `.claude/agents/your-agent.md` with:
   ```markdown
   ---
   name: your-agent
   description: What this agent does
   ---

   You are the [Name] Agent...

   ## Files I OWN:
   - path/to/files/

   ## Files I NEVER touch:
   - other/paths/
   ```

2. Update this AGENTS.md to register the agent

---

## Notes

This is a minimal template. Add domain-specific agents for your project.
"#
    )
}

fn path_list(paths: &[String]) -> String {
    if paths.is_empty() {
        return "TBD".to_string();
    }
    paths
        .iter()
        .take(OWNERSHIP_PATHS_SHOWN)
        .map(|path| format!("`{path}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

//! Discovery of agent definitions in the agents directory.

use std::fs;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::agent_def::{AgentDescriptor, extract};
use crate::io::layout::ProjectLayout;

/// Read every `*.md` agent definition, sorted by file name.
///
/// The registry document itself is skipped, as are files without a header
/// block. Unreadable files are logged and skipped. A missing agents directory
/// yields an empty list.
pub fn discover_agents(layout: &ProjectLayout) -> Result<Vec<AgentDescriptor>> {
    let dir = &layout.agents_dir;
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name == layout.registry_file_name() {
            continue;
        }
        files.push((name.to_string(), path));
    }
    files.sort();

    let mut agents = Vec::new();
    for (name, path) in files {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable agent file");
                continue;
            }
        };
        match extract(&content, &name) {
            Some(agent) => agents.push(agent),
            None => debug!(file = %name, "not an agent definition"),
        }
    }
    Ok(agents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestProject;

    #[test]
    fn missing_agents_dir_is_empty() {
        let project = TestProject::new();
        assert!(discover_agents(&project.layout).expect("discover").is_empty());
    }

    #[test]
    fn discovers_sorted_and_skips_registry_and_non_agents() {
        let project = TestProject::new();
        project.write_agent("zeta.md", "---\nname: zeta\n---\n");
        project.write_agent("alpha.md", "---\nname: alpha\ndescription: First\n---\n");
        project.write_agent("notes.md", "# Just notes\n");
        project.write_agent("helper.txt", "---\nname: helper\n---\n");
        project.write_registry("---\nname: registry\n---\n## Agent Registry\n");

        let agents = discover_agents(&project.layout).expect("discover");
        let names: Vec<_> = agents.iter().map(|agent| agent.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(agents[0].description, "First");
        assert_eq!(agents[1].file_name, "zeta.md");
    }
}

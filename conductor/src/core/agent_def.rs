//! Agent-definition documents (`.claude/agents/<name>.md`).
//!
//! Only a document that opens with a `---` key/value header is an agent
//! definition. From it we read `name` and `description`, and scrape the
//! "Files I OWN" / "Files I NEVER touch" bullet lists from the body.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::text::truncate_chars;

/// Longest description kept from the header.
pub const DESCRIPTION_MAX_CHARS: usize = 100;

static OWNS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Files I OWN[:\s]*\n((?:[-*]\s+.+\n?)+)").unwrap());
static NEVER_TOUCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)NEVER touch[:\s]*\n((?:[-*]\s+.+\n?)+)").unwrap());

/// Structured metadata extracted from one agent definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    /// File name of the definition inside the agents directory.
    pub file_name: String,
    pub owns: Vec<String>,
    pub never_touches: Vec<String>,
}

/// Extract a descriptor from `content`, or `None` if it has no header block.
pub fn extract(content: &str, file_name: &str) -> Option<AgentDescriptor> {
    let header = split_header(content)?;

    let mut name = String::new();
    let mut description = String::new();
    for line in header.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("name:") {
            name = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("description:") {
            description = value.trim().to_string();
        }
    }

    if name.is_empty() {
        name = file_stem(file_name).to_string();
    }
    let description = if description.is_empty() {
        format!("Agent from {file_name}")
    } else {
        truncate_chars(&description, DESCRIPTION_MAX_CHARS).to_string()
    };

    Some(AgentDescriptor {
        name,
        description,
        file_name: file_name.to_string(),
        owns: bullet_paths(&OWNS_RE, content),
        never_touches: bullet_paths(&NEVER_TOUCH_RE, content),
    })
}

/// Body of the leading `---` ... `---` block.
fn split_header(content: &str) -> Option<&str> {
    let first_newline = content.find('\n')?;
    if content[..first_newline].trim_end() != "---" {
        return None;
    }
    let after = &content[first_newline + 1..];
    let end = after.find("\n---")?;
    Some(&after[..end])
}

fn bullet_paths(re: &Regex, content: &str) -> Vec<String> {
    let Some(caps) = re.captures(content) else {
        return Vec::new();
    };
    caps[1]
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(['-', '*']))
        .map(|line| {
            line.trim_start_matches(['-', '*', ' '])
                .trim_matches('`')
                .to_string()
        })
        .filter(|path| !path.is_empty())
        .collect()
}

fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

//! `conductor` CLI: audit a project and drive its phased session.
//!
//! Results are printed to stdout (JSON for session commands, a text report for
//! `audit`/`init`); the exit code tells scripts which outcome occurred.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use conductor::audit::{audit_project, render_report, require_ready};
use conductor::error::Error;
use conductor::core::types::SessionPlan;
use conductor::exit_codes;
use conductor::io::config::{CONFIG_FILE, load_config};
use conductor::io::layout::ProjectLayout;
use conductor::io::session_store::FsSessionStore;
use conductor::logging;
use conductor::session_ops::{
    CompletionOutcome, MarkOutcome, NextPhaseOutcome, StatusOutcome, check_completion,
    mark_phase_complete, next_phase, plan_session, session_status, start_new_session,
};

#[derive(Parser)]
#[command(
    name = "conductor",
    version,
    about = "Phased-session coordinator for agent-driven work"
)]
struct Cli {
    /// Project root containing the control directory.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Config file (defaults to `conductor.toml` in the project root).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check directory structure, agent definitions, and the agent registry.
    Audit {
        /// Create missing directories and regenerate a missing or invalid registry.
        #[arg(long)]
        fix: bool,
        /// Print the audit result as JSON instead of the text report.
        #[arg(long)]
        json: bool,
    },
    /// Prepare a project for orchestration (audit with fixes).
    Init,
    /// Print the current session.
    Status,
    /// Print the next incomplete phase.
    Next,
    /// Mark a phase complete and append notes to the work log.
    Complete {
        phase: u32,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Report completion counts; exits with the complete code when done.
    IsComplete,
    /// Archive the current session.
    New,
    /// Write a new session from a phase list, archiving any existing one.
    Plan {
        #[arg(long)]
        name: String,
        #[arg(long)]
        request: String,
        /// Phase as `agent:description`, repeated in execution order.
        #[arg(long = "phase", value_parser = parse_phase_spec, required = true)]
        phases: Vec<(String, String)>,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            let code = match err.downcast_ref::<Error>() {
                Some(Error::RegistryInvalid(_)) => exit_codes::NOT_READY,
                _ => exit_codes::INVALID,
            };
            std::process::exit(code);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let root = cli
        .project
        .canonicalize()
        .with_context(|| format!("resolve project root {}", cli.project.display()))?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| root.join(CONFIG_FILE));
    let config = load_config(&config_path)?;
    let layout = config.layout_for(&root);
    let store = FsSessionStore::new(layout.clone()).strict(config.strict_phase_lines);

    match cli.command {
        Command::Audit { fix, json } => cmd_audit(&layout, fix, json),
        Command::Init => cmd_audit(&layout, true, false),
        Command::Status => {
            let outcome = session_status(&store)?;
            print_json(&outcome)?;
            Ok(match outcome {
                StatusOutcome::Found(_) => exit_codes::OK,
                StatusOutcome::NoSession => exit_codes::NO_SESSION,
            })
        }
        Command::Next => {
            let outcome = next_phase(&store)?;
            print_json(&outcome)?;
            Ok(match outcome {
                NextPhaseOutcome::Found(_) => exit_codes::OK,
                NextPhaseOutcome::AllComplete => exit_codes::COMPLETE,
                NextPhaseOutcome::NoSession => exit_codes::NO_SESSION,
            })
        }
        Command::Complete { phase, notes } => {
            let today = chrono::Local::now().date_naive();
            let outcome = mark_phase_complete(&store, phase, &notes, today)?;
            print_json(&outcome)?;
            Ok(match outcome {
                MarkOutcome::Marked(_) => exit_codes::OK,
                MarkOutcome::PhaseNotFound { .. } => exit_codes::PHASE_NOT_FOUND,
                MarkOutcome::NoSession => exit_codes::NO_SESSION,
            })
        }
        Command::IsComplete => {
            let outcome = check_completion(&store)?;
            print_json(&outcome)?;
            Ok(match outcome {
                CompletionOutcome::Report(report) if report.complete => exit_codes::COMPLETE,
                CompletionOutcome::Report(_) => exit_codes::OK,
                CompletionOutcome::NoSession => exit_codes::NO_SESSION,
            })
        }
        Command::New => {
            require_ready(&layout)?;
            print_json(&start_new_session(&store)?)?;
            Ok(exit_codes::OK)
        }
        Command::Plan {
            name,
            request,
            phases,
        } => {
            let plan = SessionPlan {
                name,
                user_request: request,
                phases,
            };
            require_ready(&layout)?;
            print_json(&plan_session(&store, &plan)?)?;
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_audit(layout: &ProjectLayout, fix: bool, json: bool) -> Result<i32> {
    let result = audit_project(layout, fix)?;
    if json {
        print_json(&result)?;
    } else {
        print!("{}", render_report(layout, &result));
    }
    Ok(if result.is_ready() {
        exit_codes::OK
    } else {
        exit_codes::NOT_READY
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}

/// Parse `agent:description`; the agent is everything before the first colon.
fn parse_phase_spec(raw: &str) -> Result<(String, String), String> {
    let invalid = || format!("expected agent:description, got '{raw}'");
    let (agent, description) = raw.split_once(':').ok_or_else(invalid)?;
    let agent = agent.trim();
    let description = description.trim();
    if agent.is_empty() || description.is_empty() {
        return Err(invalid());
    }
    Ok((agent.to_string(), description.to_string()))
}

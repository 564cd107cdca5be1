//! Quest runner CLI.
//!
//! Works on declarative quest files (`*.toml`) and state snapshots: checks a
//! quest's structure, prints its interleaved plan, and reports which task a
//! run would attempt next. `init` writes a default `quest-runner.toml`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use quest_runner::exit_codes;
use quest_runner::io::config::{RunnerConfig, load_config, write_config};
use quest_runner::logging;
use quest_runner::select::{SelectOutcome, select_from_files};
use quest_runner::validate::{plan_quest_file, render_plan, validate_quest_file};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "quest-runner",
    version,
    about = "Dependency-gated, retry-bounded quest orchestration"
)]
struct Cli {
    /// Runner config file. Missing file means defaults.
    #[arg(long, global = true, default_value = "quest-runner.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file at `--config`.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Check a quest file: chain lengths, names, dependencies, limits.
    Validate {
        /// Quest file.
        quest: PathBuf,
    },
    /// Print the quest's tasks in execution priority order.
    Plan {
        /// Quest file.
        quest: PathBuf,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the task a run would attempt next against a state snapshot.
    Select {
        /// Quest file.
        quest: PathBuf,
        /// State snapshot (flat TOML table).
        #[arg(long)]
        state: PathBuf,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(exit_codes::INVALID as u8)
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Validate { quest } => cmd_validate(&quest, &runner_config(&cli.config)?),
        Command::Plan { quest, json } => cmd_plan(&quest, json, &runner_config(&cli.config)?),
        Command::Select { quest, state, json } => {
            cmd_select(&quest, &state, json, &runner_config(&cli.config)?)
        }
    }
}

fn runner_config(path: &Path) -> Result<RunnerConfig> {
    load_config(path).with_context(|| format!("load config {}", path.display()))
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    write_config(path, &RunnerConfig::default())
        .with_context(|| format!("write config {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(quest: &Path, config: &RunnerConfig) -> Result<i32> {
    let outcome = validate_quest_file(quest, config)?;
    println!(
        "{}: {} tasks ({} boss)",
        outcome.quest, outcome.tasks, outcome.bosses
    );
    Ok(exit_codes::OK)
}

fn cmd_plan(quest: &Path, json: bool, config: &RunnerConfig) -> Result<i32> {
    let entries = plan_quest_file(quest, config)?;
    if json {
        print_json(&entries)?;
    } else {
        print!("{}", render_plan(&entries));
    }
    Ok(exit_codes::OK)
}

fn cmd_select(quest: &Path, state: &Path, json: bool, config: &RunnerConfig) -> Result<i32> {
    let outcome = select_from_files(quest, state, config)?;
    if json {
        print_json(&outcome)?;
    } else {
        match &outcome {
            SelectOutcome::Open(task) => println!("{}", task.name),
            SelectOutcome::Done => println!("done"),
            SelectOutcome::Blocked { waiting } => {
                println!("blocked: {}", waiting.join(", "));
            }
        }
    }
    Ok(match outcome {
        SelectOutcome::Open(_) => exit_codes::OK,
        SelectOutcome::Done => exit_codes::DONE,
        SelectOutcome::Blocked { .. } => exit_codes::BLOCKED,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}

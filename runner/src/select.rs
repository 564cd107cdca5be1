//! Selection helpers for `quest-runner select`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::selector::{Selection, select_task};
use crate::core::types::Limit;
use crate::error::QuestError;
use crate::io::config::RunnerConfig;
use crate::io::quest_file::load_quest;
use crate::io::state_store::{StateStore, load_snapshot};
use crate::quest::{Action, Quest};

/// Structured selection outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectOutcome {
    /// Every task reports completed.
    Done,
    /// Eligible task selected.
    Open(SelectedTask),
    /// Work remains but nothing is eligible.
    Blocked { waiting: Vec<String> },
}

/// Minimal selected task metadata for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedTask {
    pub name: String,
    /// Position in the quest's task list.
    pub position: usize,
    /// Visit target, when the action is a plain visit.
    pub visit: Option<String>,
    pub limit: Limit,
    pub boss: bool,
}

/// Select the next task of an in-memory quest against a state snapshot.
pub fn select_next(quest: &Quest, state: &dyn StateStore) -> Result<SelectOutcome, QuestError> {
    let mut completed = HashSet::new();
    let outcome = match select_task(quest.name(), quest.tasks(), state, &mut completed)? {
        Selection::Done => SelectOutcome::Done,
        Selection::Blocked { waiting } => SelectOutcome::Blocked { waiting },
        Selection::Open(task) => {
            let position = quest
                .tasks()
                .iter()
                .position(|candidate| candidate.name == task.name)
                .unwrap_or_default();
            let visit = match &task.action {
                Action::Visit(target) => Some(target.clone()),
                Action::Call(_) => None,
            };
            SelectOutcome::Open(SelectedTask {
                name: task.name.clone(),
                position,
                visit,
                limit: task.limit,
                boss: task.boss,
            })
        }
    };
    Ok(outcome)
}

/// Load a quest file and a state snapshot from disk, then select the next task.
pub fn select_from_files(
    quest_path: &Path,
    state_path: &Path,
    config: &RunnerConfig,
) -> Result<SelectOutcome> {
    let quest = load_quest(quest_path, config).context("load quest for selection")?;
    let state = load_snapshot(state_path).context("load state for selection")?;
    let outcome = select_next(&quest, &state)?;
    Ok(outcome)
}

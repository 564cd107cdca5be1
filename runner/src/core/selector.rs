//! Deterministic task selection.

use std::collections::HashSet;

use crate::error::QuestError;
use crate::io::state_store::StateStore;
use crate::quest::Task;

/// Result of scanning a quest's task list.
#[derive(Debug)]
pub enum Selection<'q> {
    /// First eligible task in declaration order.
    Open(&'q Task),
    /// Every task reports completed.
    Done,
    /// Work remains but nothing is eligible right now.
    Blocked { waiting: Vec<String> },
}

/// Pick the next task to run.
///
/// Tasks whose `completed` check passes are added to `completed` first, so a
/// dependency satisfied by external state counts even if this run never
/// executed it. Then the first task (in declaration order) that is not
/// complete, has all dependencies in `completed`, and is ready is returned.
/// `quest` labels errors raised by a task's checks.
pub fn select_task<'q>(
    quest: &str,
    tasks: &'q [Task],
    state: &dyn StateStore,
    completed: &mut HashSet<String>,
) -> Result<Selection<'q>, QuestError> {
    for task in tasks {
        let done = completed.contains(&task.name)
            || task
                .is_complete(state)
                .map_err(|err| err.in_task(quest, &task.name))?;
        if done {
            completed.insert(task.name.clone());
        }
    }

    let mut waiting = Vec::new();
    for task in tasks {
        if completed.contains(&task.name) {
            continue;
        }
        if task.dependencies_met(completed)
            && task
                .is_ready(state)
                .map_err(|err| err.in_task(quest, &task.name))?
        {
            return Ok(Selection::Open(task));
        }
        waiting.push(task.name.clone());
    }

    if waiting.is_empty() {
        return Ok(Selection::Done);
    }
    Ok(Selection::Blocked { waiting })
}

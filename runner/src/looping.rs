//! Quest run loop: select, attempt, evaluate, repeat.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use crate::core::encounters::Resolution;
use crate::core::selector::{Selection, select_task};
use crate::core::types::LimitStatus;
use crate::error::QuestError;
use crate::io::config::RunnerConfig;
use crate::io::world::World;
use crate::quest::Quest;
use crate::step::{AttemptOutcome, attempt_task};

/// Reason why a quest run stopped without a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStop {
    /// Every task is complete.
    Done,
    /// Work remains but nothing is eligible; retry later.
    Blocked { waiting: Vec<String> },
    /// The run used up `max_iterations` attempts.
    MaxIterationsExceeded { steps: u32, max_iterations: u32 },
}

/// Summary of one quest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub quest: String,
    pub steps_executed: u32,
    /// Task name of every attempt, in execution order.
    pub trace: Vec<String>,
    /// Tasks that crossed their soft limit during this run.
    pub degraded: Vec<String>,
    pub stop: RunStop,
}

/// Observation handed to the `on_step` callback after each attempt.
#[derive(Debug)]
pub struct StepReport<'a> {
    pub quest: &'a str,
    pub task: &'a str,
    /// 1-indexed step number within the run.
    pub iter: u32,
    /// Failed attempts recorded against the task after this one.
    pub attempts: u32,
    pub outcome: &'a AttemptOutcome,
    /// This attempt pushed the task over its soft limit.
    pub degraded: bool,
    pub resolutions: &'a [Resolution],
}

/// Per-run bookkeeping. Counters start at zero for every new run.
#[derive(Debug, Default)]
pub struct QuestRun {
    attempts: HashMap<String, u32>,
    completed: HashSet<String>,
    trace: Vec<String>,
    degraded: Vec<String>,
}

impl QuestRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self, task: &str) -> u32 {
        self.attempts.get(task).copied().unwrap_or(0)
    }

    pub fn is_completed(&self, task: &str) -> bool {
        self.completed.contains(task)
    }

    /// Drive `quest` until it is done, blocked, or the iteration ceiling is hit.
    ///
    /// Returns `Err` on a hard-limit breach, an unreadable state marker
    /// ([`QuestError::LimitExceeded`] or [`QuestError::Evaluation`]), or any
    /// other fatal error raised by a hook or action.
    #[instrument(skip_all, fields(quest = %quest.name()))]
    pub fn run<W: World, F: FnMut(&StepReport<'_>)>(
        &mut self,
        quest: &Quest,
        world: &mut W,
        config: &RunnerConfig,
        mut on_step: F,
    ) -> Result<RunOutcome, QuestError> {
        let mut steps = 0u32;
        loop {
            if config.iterations_exhausted(steps) {
                warn!(steps, max = config.max_iterations, "iteration ceiling reached");
                return Ok(self.outcome(
                    quest,
                    steps,
                    RunStop::MaxIterationsExceeded {
                        steps,
                        max_iterations: config.max_iterations,
                    },
                ));
            }

            let selection =
                select_task(quest.name(), quest.tasks(), &*world, &mut self.completed)?;
            let task = match selection {
                Selection::Open(task) => task,
                Selection::Done => {
                    info!(steps, "quest done");
                    return Ok(self.outcome(quest, steps, RunStop::Done));
                }
                Selection::Blocked { waiting } => {
                    info!(steps, waiting = ?waiting, "quest blocked");
                    return Ok(self.outcome(quest, steps, RunStop::Blocked { waiting }));
                }
            };
            debug!(task = %task.name, attempts = self.attempts(&task.name), "selected");

            let attempt = attempt_task(quest.name(), task, world, config)?;
            steps += 1;
            self.trace.push(task.name.clone());

            let mut degraded = false;
            if attempt.outcome.is_completed() {
                info!(task = %task.name, "task completed");
                self.completed.insert(task.name.clone());
            } else {
                let count = self.attempts.entry(task.name.clone()).or_insert(0);
                *count += 1;
                let count = *count;
                if task.is_exhausted(count) == LimitStatus::Exhausted {
                    warn!(task = %task.name, attempts = count, "hard limit reached");
                    return Err(QuestError::LimitExceeded {
                        quest: quest.name().to_string(),
                        task: task.name.clone(),
                        attempts: count,
                    });
                }
                if task.limit.crosses_soft(count) {
                    warn!(task = %task.name, attempts = count, "soft limit reached, task degraded");
                    self.degraded.push(task.name.clone());
                    degraded = true;
                }
            }

            on_step(&StepReport {
                quest: quest.name(),
                task: &task.name,
                iter: steps,
                attempts: self.attempts(&task.name),
                outcome: &attempt.outcome,
                degraded,
                resolutions: &attempt.resolutions,
            });
        }
    }

    fn outcome(&self, quest: &Quest, steps: u32, stop: RunStop) -> RunOutcome {
        RunOutcome {
            quest: quest.name().to_string(),
            steps_executed: steps,
            trace: self.trace.clone(),
            degraded: self.degraded.clone(),
            stop,
        }
    }
}

/// Run a quest with fresh counters.
pub fn run_quest<W: World, F: FnMut(&StepReport<'_>)>(
    quest: &Quest,
    world: &mut W,
    config: &RunnerConfig,
    on_step: F,
) -> Result<RunOutcome, QuestError> {
    QuestRun::new().run(quest, world, config, on_step)
}

/// Run quests in order, each with its own counters.
///
/// Stops after the first quest that does not finish; its outcome is the last
/// element of the returned list.
pub fn run_quests<W: World, F: FnMut(&StepReport<'_>)>(
    quests: &[Quest],
    world: &mut W,
    config: &RunnerConfig,
    mut on_step: F,
) -> Result<Vec<RunOutcome>, QuestError> {
    let mut outcomes = Vec::with_capacity(quests.len());
    for quest in quests {
        let outcome = run_quest(quest, world, config, &mut on_step)?;
        let done = outcome.stop == RunStop::Done;
        outcomes.push(outcome);
        if !done {
            break;
        }
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Limit;
    use crate::io::state_store::{MemoryStore, StateStore, read_step};
    use crate::quest::{Action, Task};
    use crate::test_support::{Effect, ScriptedWorld, flag_task};

    fn quiet() -> RunnerConfig {
        RunnerConfig::default()
    }

    #[test]
    fn completed_task_is_never_executed() {
        let quest = Quest::new("q", vec![flag_task("a"), flag_task("b")]).unwrap();
        let mut world =
            ScriptedWorld::new(MemoryStore::new().with("a", "done")).on_visit("b", Effect::done("b"));
        let outcome = run_quest(&quest, &mut world, &quiet(), |_| {}).unwrap();
        assert_eq!(outcome.stop, RunStop::Done);
        assert_eq!(outcome.trace, vec!["b"]);
        assert_eq!(world.visit_count("a"), 0);
    }

    #[test]
    fn hard_limit_one_aborts_after_single_failure() {
        let quest = Quest::new("q", vec![flag_task("once").limit(Limit::hard(1))]).unwrap();
        let mut world = ScriptedWorld::new(MemoryStore::new()).on_visit("once", Effect::fail("no"));
        let err = run_quest(&quest, &mut world, &quiet(), |_| {}).unwrap_err();
        match err {
            QuestError::LimitExceeded {
                quest,
                task,
                attempts,
            } => {
                assert_eq!(quest, "q");
                assert_eq!(task, "once");
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(world.visit_count("once"), 1);
    }

    #[test]
    fn soft_limit_signals_once_and_run_continues() {
        let quest = Quest::new(
            "q",
            vec![flag_task("grind").limit(Limit::soft_and_hard(3, 10))],
        )
        .unwrap();
        let mut world = ScriptedWorld::new(MemoryStore::new())
            .on_visit("grind", Effect::fail("miss"))
            .on_visit("grind", Effect::Nothing)
            .on_visit("grind", Effect::fail("miss"))
            .on_visit("grind", Effect::Nothing)
            .on_visit("grind", Effect::done("grind"));

        let mut signals = 0;
        let outcome = run_quest(&quest, &mut world, &quiet(), |report| {
            if report.degraded {
                signals += 1;
            }
        })
        .unwrap();

        assert_eq!(signals, 1);
        assert_eq!(outcome.degraded, vec!["grind"]);
        assert_eq!(outcome.stop, RunStop::Done);
        assert_eq!(outcome.steps_executed, 5);
    }

    #[test]
    fn state_error_in_action_aborts_without_retrying() {
        let quest = Quest::new(
            "q",
            vec![
                Task::new(
                    "read",
                    |_| Ok(false),
                    Action::call(|world, _| {
                        read_step(&*world, "questBroken")?;
                        Ok(())
                    }),
                )
                .limit(Limit::soft_and_hard(3, 10)),
            ],
        )
        .unwrap();
        let mut world = ScriptedWorld::new(MemoryStore::new().with("questBroken", "halfway"));
        let mut steps = 0;
        let err = run_quest(&quest, &mut world, &quiet(), |_| steps += 1).unwrap_err();
        assert!(matches!(
            err,
            QuestError::Evaluation { ref quest, ref task, .. } if quest == "q" && task == "read"
        ));
        assert!(err.to_string().contains("halfway"));
        assert_eq!(steps, 0);
    }

    #[test]
    fn ready_false_blocks_run() {
        let quest = Quest::new(
            "q",
            vec![
                flag_task("gated").ready(|_| Ok(false)),
                flag_task("after").after(["gated"]),
            ],
        )
        .unwrap();
        let mut world = ScriptedWorld::new(MemoryStore::new());
        let outcome = run_quest(&quest, &mut world, &quiet(), |_| {}).unwrap();
        assert_eq!(
            outcome.stop,
            RunStop::Blocked {
                waiting: vec!["gated".to_string(), "after".to_string()]
            }
        );
        assert!(world.visits.is_empty());
    }

    #[test]
    fn selection_rescans_from_top_after_each_attempt() {
        // "b" enables "a" which is declared first, so "a" runs before "c".
        let quest = Quest::new(
            "q",
            vec![
                flag_task("a").ready(|state| Ok(state.property("b").is_some())),
                flag_task("b"),
                flag_task("c"),
            ],
        )
        .unwrap();
        let mut world = ScriptedWorld::new(MemoryStore::new())
            .on_visit("a", Effect::done("a"))
            .on_visit("b", Effect::done("b"))
            .on_visit("c", Effect::done("c"));
        let outcome = run_quest(&quest, &mut world, &quiet(), |_| {}).unwrap();
        assert_eq!(outcome.trace, vec!["b", "a", "c"]);
    }

    #[test]
    fn iteration_ceiling_stops_unbounded_task() {
        let quest = Quest::new("q", vec![flag_task("forever")]).unwrap();
        let mut world = ScriptedWorld::new(MemoryStore::new());
        let config = RunnerConfig {
            max_iterations: 4,
            ..RunnerConfig::default()
        };
        let outcome = run_quest(&quest, &mut world, &config, |_| {}).unwrap();
        assert_eq!(
            outcome.stop,
            RunStop::MaxIterationsExceeded {
                steps: 4,
                max_iterations: 4
            }
        );
        assert_eq!(world.visit_count("forever"), 4);
    }

    #[test]
    fn attempt_counters_belong_to_the_run() {
        let quest = Quest::new("q", vec![flag_task("a").limit(Limit::hard(2))]).unwrap();
        let config = RunnerConfig {
            max_iterations: 1,
            ..RunnerConfig::default()
        };
        let mut world = ScriptedWorld::new(MemoryStore::new());

        let mut run = QuestRun::new();
        run.run(&quest, &mut world, &config, |_| {}).unwrap();
        assert_eq!(run.attempts("a"), 1);

        // A fresh run starts from zero and may try again.
        let outcome = run_quest(&quest, &mut world, &config, |_| {}).unwrap();
        assert_eq!(outcome.steps_executed, 1);
    }

    #[test]
    fn run_quests_stops_at_first_unfinished_quest() {
        let first = Quest::new("first", vec![flag_task("a")]).unwrap();
        let second = Quest::new("second", vec![flag_task("b").ready(|_| Ok(false))]).unwrap();
        let third = Quest::new("third", vec![flag_task("c")]).unwrap();
        let mut world = ScriptedWorld::new(MemoryStore::new()).on_visit("a", Effect::done("a"));

        let outcomes =
            run_quests(&[first, second, third], &mut world, &quiet(), |_| {}).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].stop, RunStop::Done);
        assert!(matches!(outcomes[1].stop, RunStop::Blocked { .. }));
        assert_eq!(world.visit_count("c"), 0);
    }
}

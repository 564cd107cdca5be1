//! One attempt at one task: prepare, act, then re-read state.

use anyhow::Context;
use tracing::{debug, instrument, warn};

use crate::core::encounters::{EncounterHandler, Resolution, TaskEncounters};
use crate::error::QuestError;
use crate::io::config::RunnerConfig;
use crate::io::world::World;
use crate::quest::{Action, Task};

/// How a single attempt ended.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// `completed` holds after the attempt.
    Completed,
    /// The action returned normally but the task is not complete yet.
    Incomplete,
    /// Prepare hook or action failed recoverably. Always a [`QuestError::TaskExecution`].
    Failed(QuestError),
}

impl AttemptOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AttemptOutcome::Completed)
    }
}

/// Everything observed during one attempt.
#[derive(Debug)]
pub struct Attempt {
    pub outcome: AttemptOutcome,
    pub resolutions: Vec<Resolution>,
}

/// Run `task` once against `world`.
///
/// A failing prepare hook skips the action. Completion is evaluated after
/// every attempt, failed or not, because external state is authoritative.
///
/// Returns `Err` without counting the attempt when the hook or action fails
/// with a fatal [`QuestError`] (anything but `TaskExecution`), or when the
/// completion check hits a state format error.
#[instrument(skip_all, fields(quest = %quest, task = %task.name))]
pub fn attempt_task<W: World>(
    quest: &str,
    task: &Task,
    world: &mut W,
    config: &RunnerConfig,
) -> Result<Attempt, QuestError> {
    let mut encounters = TaskEncounters::new(&task.name, task.combat.as_ref(), &task.choices)
        .verbose(config.log_encounters);

    let executed = (|| -> anyhow::Result<()> {
        if let Some(prepare) = &task.prepare {
            prepare(&mut *world as &mut dyn World).context("prepare hook failed")?;
        }
        match &task.action {
            Action::Visit(target) => {
                debug!(location = %target, "visiting");
                world.visit(target, &mut encounters)
            }
            Action::Call(callback) => callback(
                &mut *world as &mut dyn World,
                &mut encounters as &mut dyn EncounterHandler,
            ),
        }
    })();

    let failure = match executed {
        Ok(()) => None,
        Err(source) => {
            let source = split_fatal(source).map_err(|err| {
                warn!(error = %err, "fatal error during attempt");
                err.in_task(quest, &task.name)
            })?;
            warn!(error = %format!("{source:#}"), "attempt failed");
            Some(QuestError::TaskExecution {
                quest: quest.to_string(),
                task: task.name.clone(),
                source,
            })
        }
    };

    let complete = task
        .is_complete(&*world)
        .map_err(|err| err.in_task(quest, &task.name))?;
    let outcome = if complete {
        if let Some(err) = &failure {
            debug!(error = %err, "task completed despite a failed attempt");
        }
        AttemptOutcome::Completed
    } else {
        match failure {
            Some(err) => AttemptOutcome::Failed(err),
            None => AttemptOutcome::Incomplete,
        }
    };

    Ok(Attempt {
        outcome,
        resolutions: encounters.into_resolutions(),
    })
}

/// Pull a fatal [`QuestError`] out of a hook or action failure.
///
/// Context added on top of the error is dropped; everything else is handed
/// back untouched.
fn split_fatal(source: anyhow::Error) -> Result<anyhow::Error, QuestError> {
    if !source
        .downcast_ref::<QuestError>()
        .is_some_and(QuestError::is_fatal)
    {
        return Ok(source);
    }
    match source.downcast::<QuestError>() {
        Ok(err) => Err(err),
        Err(source) => Ok(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::combat::{CombatStrategy, Policy};
    use crate::core::types::{ChoiceId, EntityId};
    use crate::io::state_store::{MemoryStore, StateStore, read_number, read_step};
    use crate::test_support::{Effect, ScriptedWorld, flag_task};
    use anyhow::anyhow;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn completing_visit_reports_completed() {
        let mut world = ScriptedWorld::new(MemoryStore::new()).on_visit("a", Effect::done("a"));
        let attempt =
            attempt_task("q", &flag_task("a"), &mut world, &RunnerConfig::default()).unwrap();
        assert!(attempt.outcome.is_completed());
        assert_eq!(world.visits, vec!["a"]);
    }

    #[test]
    fn action_error_becomes_task_execution_failure() {
        let mut world = ScriptedWorld::new(MemoryStore::new()).on_visit("a", Effect::fail("lost"));
        let attempt =
            attempt_task("q", &flag_task("a"), &mut world, &RunnerConfig::default()).unwrap();
        match attempt.outcome {
            AttemptOutcome::Failed(QuestError::TaskExecution { quest, task, source }) => {
                assert_eq!(quest, "q");
                assert_eq!(task, "a");
                assert!(source.to_string().contains("lost"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn prepare_failure_skips_action() {
        let mut world = ScriptedWorld::new(MemoryStore::new());
        let task = flag_task("a").prepare(|_| Err(anyhow!("no mp")));
        let attempt = attempt_task("q", &task, &mut world, &RunnerConfig::default()).unwrap();
        assert!(matches!(attempt.outcome, AttemptOutcome::Failed(_)));
        assert!(world.visits.is_empty());
    }

    #[test]
    fn prepare_runs_before_action() {
        let prepared = Rc::new(Cell::new(false));
        let seen = prepared.clone();
        let task = flag_task("a").prepare(move |world| {
            seen.set(world.property("tracking").is_none());
            Ok(())
        });
        let mut world = ScriptedWorld::new(MemoryStore::new());
        let attempt = attempt_task("q", &task, &mut world, &RunnerConfig::default()).unwrap();
        assert!(matches!(attempt.outcome, AttemptOutcome::Incomplete));
        assert!(prepared.get());
    }

    #[test]
    fn encounters_use_task_strategy_and_choices() {
        let task = flag_task("grove")
            .combat(CombatStrategy::new().kill(&[]).banish(&[EntityId(9)]))
            .choice(ChoiceId(560), 1);
        let mut world = ScriptedWorld::new(MemoryStore::new())
            .with_entity("grove", EntityId(9))
            .with_entity("grove", EntityId(3))
            .with_choice("grove", ChoiceId(560))
            .with_choice("grove", ChoiceId(561));

        let attempt = attempt_task("q", &task, &mut world, &RunnerConfig::default()).unwrap();
        assert_eq!(attempt.resolutions.len(), 4);
        assert_eq!(
            world.policies,
            vec![
                ("grove".to_string(), EntityId(9), Policy::Banish),
                ("grove".to_string(), EntityId(3), Policy::Kill),
            ]
        );
        assert_eq!(
            world.answers,
            vec![
                ("grove".to_string(), ChoiceId(560), Some(1)),
                ("grove".to_string(), ChoiceId(561), None),
            ]
        );
    }

    #[test]
    fn state_error_raised_by_action_is_fatal() {
        let mut world = ScriptedWorld::new(MemoryStore::new().with("questBroken", "halfway"));
        let task = crate::quest::Task::new(
            "read",
            |_| Ok(false),
            Action::call(|world, _| {
                read_step(&*world, "questBroken")?;
                Ok(())
            }),
        );
        let err = attempt_task("q", &task, &mut world, &RunnerConfig::default()).unwrap_err();
        match err {
            QuestError::Evaluation { quest, task, source } => {
                assert_eq!((quest.as_str(), task.as_str()), ("q", "read"));
                assert!(
                    matches!(*source, QuestError::StateFormat { ref key, .. } if key == "questBroken")
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn fatal_error_from_prepare_survives_context() {
        let mut world = ScriptedWorld::new(MemoryStore::new());
        let task = flag_task("a").prepare(|world| {
            read_number(&*world, "knownAscensions")?;
            Ok(())
        });
        let err = attempt_task("q", &task, &mut world, &RunnerConfig::default()).unwrap_err();
        assert!(matches!(err, QuestError::Evaluation { ref task, .. } if task == "a"));
        assert!(world.visits.is_empty());
    }

    #[test]
    fn recoverable_quest_error_from_action_is_counted() {
        let mut world = ScriptedWorld::new(MemoryStore::new());
        let task = flag_task("a").prepare(|_| {
            Err(QuestError::TaskExecution {
                quest: "q".to_string(),
                task: "inner".to_string(),
                source: anyhow!("nested"),
            }
            .into())
        });
        let attempt = attempt_task("q", &task, &mut world, &RunnerConfig::default()).unwrap();
        assert!(matches!(attempt.outcome, AttemptOutcome::Failed(_)));
    }

    #[test]
    fn malformed_state_is_fatal() {
        let mut world = ScriptedWorld::new(MemoryStore::new());
        let task = crate::quest::Task::when(
            "a",
            crate::core::condition::Condition::step_at_least("questL05Goblin", 1),
            Action::visit("a"),
        );
        let err = attempt_task("q", &task, &mut world, &RunnerConfig::default()).unwrap_err();
        match err {
            QuestError::Evaluation { quest, task, source } => {
                assert_eq!((quest.as_str(), task.as_str()), ("q", "a"));
                assert!(matches!(*source, QuestError::StateFormat { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

//! Resolution of encounters and decision points while a task's action runs.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::combat::{CombatStrategy, Policy};
use crate::core::types::{ChoiceId, EntityId};

/// Callback surface the world uses while performing an action.
pub trait EncounterHandler {
    /// Decide how to deal with an entity that showed up.
    fn on_encounter(&mut self, entity: EntityId) -> Policy;

    /// Option to pick at a decision point. `None` leaves the world's default.
    fn on_choice(&mut self, choice: ChoiceId) -> Option<u32>;
}

/// One decision taken on behalf of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Encounter { entity: EntityId, policy: Policy },
    Choice { choice: ChoiceId, option: Option<u32> },
}

/// Handler bound to a single task attempt.
///
/// Answers from the task's combat strategy and choice table, and remembers
/// every answer so the attempt can be reported afterwards.
#[derive(Debug)]
pub struct TaskEncounters<'a> {
    task: &'a str,
    combat: Option<&'a CombatStrategy>,
    choices: &'a BTreeMap<ChoiceId, u32>,
    verbose: bool,
    resolutions: Vec<Resolution>,
}

impl<'a> TaskEncounters<'a> {
    pub fn new(
        task: &'a str,
        combat: Option<&'a CombatStrategy>,
        choices: &'a BTreeMap<ChoiceId, u32>,
    ) -> Self {
        Self {
            task,
            combat,
            choices,
            verbose: false,
            resolutions: Vec::new(),
        }
    }

    /// Log every resolution at `info` instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn into_resolutions(self) -> Vec<Resolution> {
        self.resolutions
    }
}

impl EncounterHandler for TaskEncounters<'_> {
    fn on_encounter(&mut self, entity: EntityId) -> Policy {
        let policy = self
            .combat
            .map(|strategy| strategy.resolve(entity))
            .unwrap_or_default();
        if self.verbose {
            info!(task = self.task, %entity, ?policy, "encounter");
        } else {
            debug!(task = self.task, %entity, ?policy, "encounter");
        }
        self.resolutions.push(Resolution::Encounter {
            entity,
            policy: policy.clone(),
        });
        policy
    }

    fn on_choice(&mut self, choice: ChoiceId) -> Option<u32> {
        let option = self.choices.get(&choice).copied();
        if self.verbose {
            info!(task = self.task, %choice, ?option, "decision point");
        } else {
            debug!(task = self.task, %choice, ?option, "decision point");
        }
        self.resolutions.push(Resolution::Choice { choice, option });
        option
    }
}

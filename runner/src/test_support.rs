//! Test-only helpers: task constructors and a scripted world.

use std::collections::{HashMap, VecDeque};

use anyhow::{Result, anyhow};

use crate::core::combat::Policy;
use crate::core::condition::Condition;
use crate::core::encounters::EncounterHandler;
use crate::core::types::{ChoiceId, EntityId};
use crate::io::state_store::{MemoryStore, StateStore};
use crate::io::world::World;
use crate::quest::{Action, Task};

/// Task that visits its own name and never completes.
pub fn task(name: &str) -> Task {
    Task::new(name, |_| Ok(false), Action::visit(name))
}

/// Task that visits its own name and completes once property `name` reads `done`.
pub fn flag_task(name: &str) -> Task {
    Task::when(
        name,
        Condition::PropertyEquals {
            property: name.to_string(),
            value: "done".to_string(),
        },
        Action::visit(name),
    )
}

/// Outcome of one scripted visit.
#[derive(Debug, Clone)]
pub enum Effect {
    Set(String, String),
    Fail(String),
    Nothing,
}

impl Effect {
    pub fn set(key: &str, value: impl ToString) -> Self {
        Effect::Set(key.to_string(), value.to_string())
    }

    /// Shorthand for the effect that completes a [`flag_task`].
    pub fn done(name: &str) -> Self {
        Effect::set(name, "done")
    }

    pub fn fail(msg: &str) -> Self {
        Effect::Fail(msg.to_string())
    }
}

/// World whose visits replay queued effects per target.
///
/// Visiting a target with an empty queue does nothing. Entities and decision
/// points registered for a target are fed to the encounter handler on every
/// visit, and the answers are recorded.
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    pub state: MemoryStore,
    pub visits: Vec<String>,
    pub policies: Vec<(String, EntityId, Policy)>,
    pub answers: Vec<(String, ChoiceId, Option<u32>)>,
    effects: HashMap<String, VecDeque<Effect>>,
    entities: HashMap<String, Vec<EntityId>>,
    choices: HashMap<String, Vec<ChoiceId>>,
}

impl ScriptedWorld {
    pub fn new(state: MemoryStore) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn on_visit(mut self, target: &str, effect: Effect) -> Self {
        self.effects
            .entry(target.to_string())
            .or_default()
            .push_back(effect);
        self
    }

    pub fn with_entity(mut self, target: &str, entity: EntityId) -> Self {
        self.entities
            .entry(target.to_string())
            .or_default()
            .push(entity);
        self
    }

    pub fn with_choice(mut self, target: &str, choice: ChoiceId) -> Self {
        self.choices
            .entry(target.to_string())
            .or_default()
            .push(choice);
        self
    }

    pub fn visit_count(&self, target: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == target).count()
    }
}

impl StateStore for ScriptedWorld {
    fn property(&self, key: &str) -> Option<String> {
        self.state.property(key)
    }
}

impl World for ScriptedWorld {
    fn visit(&mut self, target: &str, encounters: &mut dyn EncounterHandler) -> Result<()> {
        self.visits.push(target.to_string());

        for entity in self.entities.get(target).cloned().unwrap_or_default() {
            let policy = encounters.on_encounter(entity);
            self.policies.push((target.to_string(), entity, policy));
        }
        for choice in self.choices.get(target).cloned().unwrap_or_default() {
            let option = encounters.on_choice(choice);
            self.answers.push((target.to_string(), choice, option));
        }

        let effect = self
            .effects
            .get_mut(target)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Effect::Nothing);
        match effect {
            Effect::Set(key, value) => {
                self.state.set(key, value);
                Ok(())
            }
            Effect::Fail(msg) => Err(anyhow!(msg)),
            Effect::Nothing => Ok(()),
        }
    }
}

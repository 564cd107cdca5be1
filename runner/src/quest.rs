//! Task and quest data model.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::Result;

use crate::core::combat::CombatStrategy;
use crate::core::condition::Condition;
use crate::core::encounters::EncounterHandler;
use crate::core::invariants::validate_quest;
use crate::core::types::{ChoiceId, Limit, LimitStatus};
use crate::error::QuestError;
use crate::io::state_store::StateStore;
use crate::io::world::World;

/// Check over external state. Format errors propagate instead of guessing.
pub type Predicate = Box<dyn Fn(&dyn StateStore) -> Result<bool, QuestError>>;

/// Side-effecting hook run right before a task's action.
///
/// Any error fails the attempt, except a fatal [`QuestError`] (every variant
/// but `TaskExecution`), which aborts the run.
pub type Hook = Box<dyn Fn(&mut dyn World) -> Result<()>>;

/// Arbitrary action body. Errors follow the same rule as [`Hook`].
pub type Callback = Box<dyn Fn(&mut dyn World, &mut dyn EncounterHandler) -> Result<()>>;

/// What a task does when it runs.
pub enum Action {
    /// Interact once with a fixed target.
    Visit(String),
    Call(Callback),
}

impl Action {
    pub fn visit(target: impl Into<String>) -> Self {
        Action::Visit(target.into())
    }

    pub fn call<F>(f: F) -> Self
    where
        F: Fn(&mut dyn World, &mut dyn EncounterHandler) -> Result<()> + 'static,
    {
        Action::Call(Box::new(f))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Visit(target) => f.debug_tuple("Visit").field(target).finish(),
            Action::Call(_) => f.write_str("Call(..)"),
        }
    }
}

/// A dependency-gated, retry-bounded unit of work.
pub struct Task {
    pub name: String,
    pub after: Vec<String>,
    pub ready: Option<Predicate>,
    pub completed: Predicate,
    pub prepare: Option<Hook>,
    pub action: Action,
    pub combat: Option<CombatStrategy>,
    pub choices: BTreeMap<ChoiceId, u32>,
    pub limit: Limit,
    /// One-shot high-stakes encounter; callers prepare harder for these.
    pub boss: bool,
}

impl Task {
    pub fn new<F>(name: impl Into<String>, completed: F, action: Action) -> Self
    where
        F: Fn(&dyn StateStore) -> Result<bool, QuestError> + 'static,
    {
        Self {
            name: name.into(),
            after: Vec::new(),
            ready: None,
            completed: Box::new(completed),
            prepare: None,
            action,
            combat: None,
            choices: BTreeMap::new(),
            limit: Limit::default(),
            boss: false,
        }
    }

    /// Task whose completion is a declarative [`Condition`].
    pub fn when(name: impl Into<String>, completed: Condition, action: Action) -> Self {
        Self::new(name, move |state| completed.evaluate(state), action)
    }

    pub fn after<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn ready<F>(mut self, ready: F) -> Self
    where
        F: Fn(&dyn StateStore) -> Result<bool, QuestError> + 'static,
    {
        self.ready = Some(Box::new(ready));
        self
    }

    pub fn ready_when(self, condition: Condition) -> Self {
        self.ready(move |state| condition.evaluate(state))
    }

    pub fn prepare<F>(mut self, prepare: F) -> Self
    where
        F: Fn(&mut dyn World) -> Result<()> + 'static,
    {
        self.prepare = Some(Box::new(prepare));
        self
    }

    pub fn combat(mut self, strategy: CombatStrategy) -> Self {
        self.combat = Some(strategy);
        self
    }

    pub fn choice(mut self, choice: ChoiceId, option: u32) -> Self {
        self.choices.insert(choice, option);
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = limit;
        self
    }

    pub fn boss(mut self) -> Self {
        self.boss = true;
        self
    }

    pub fn is_complete(&self, state: &dyn StateStore) -> Result<bool, QuestError> {
        (self.completed)(state)
    }

    pub fn is_ready(&self, state: &dyn StateStore) -> Result<bool, QuestError> {
        match &self.ready {
            Some(ready) => ready(state),
            None => Ok(true),
        }
    }

    pub fn dependencies_met(&self, completed: &HashSet<String>) -> bool {
        self.after.iter().all(|dep| completed.contains(dep))
    }

    /// Dependencies done, ready (or no gate), and not already complete.
    pub fn is_eligible(
        &self,
        state: &dyn StateStore,
        completed: &HashSet<String>,
    ) -> Result<bool, QuestError> {
        Ok(self.dependencies_met(completed) && self.is_ready(state)? && !self.is_complete(state)?)
    }

    pub fn is_exhausted(&self, attempts: u32) -> LimitStatus {
        self.limit.check(attempts)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("after", &self.after)
            .field("ready", &self.ready.is_some())
            .field("prepare", &self.prepare.is_some())
            .field("action", &self.action)
            .field("combat", &self.combat)
            .field("choices", &self.choices)
            .field("limit", &self.limit)
            .field("boss", &self.boss)
            .finish()
    }
}

/// Named, ordered collection of tasks. Order is selection priority.
#[derive(Debug)]
pub struct Quest {
    name: String,
    tasks: Vec<Task>,
}

impl Quest {
    /// Build a quest, rejecting duplicate names, dangling dependencies and cycles.
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Result<Self, QuestError> {
        let name = name.into();
        let problems = validate_quest(&tasks);
        if !problems.is_empty() {
            return Err(QuestError::structure(&name, problems));
        }
        Ok(Self { name, tasks })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }
}

//! Encounter handling policies attached to tasks.

use std::collections::BTreeMap;

use crate::core::types::EntityId;

/// Opaque round-by-round script handed to the world for an encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatMacro(pub String);

impl CombatMacro {
    pub fn new(script: impl Into<String>) -> Self {
        Self(script.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How a single encountered entity is dealt with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Policy {
    Kill,
    /// Kill with the strongest preparation available. Used on boss fights.
    KillHard,
    Banish,
    Macro(CombatMacro),
    #[default]
    Ignore,
}

/// Entity-to-policy table with an optional wildcard.
///
/// Built by chaining calls; each call with no entities sets the wildcard.
///
/// ```
/// use quest_runner::core::combat::{CombatStrategy, Policy};
/// use quest_runner::core::types::EntityId;
///
/// let strategy = CombatStrategy::new().kill(&[]).banish(&[EntityId(7)]);
/// assert_eq!(strategy.resolve(EntityId(1)), Policy::Kill);
/// assert_eq!(strategy.resolve(EntityId(7)), Policy::Banish);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatStrategy {
    entries: BTreeMap<EntityId, Policy>,
    wildcard: Option<Policy>,
}

impl CombatStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(mut self, policy: Policy, entities: &[EntityId]) -> Self {
        if entities.is_empty() {
            self.wildcard = Some(policy);
            return self;
        }
        for entity in entities {
            self.entries.insert(*entity, policy.clone());
        }
        self
    }

    pub fn kill(self, entities: &[EntityId]) -> Self {
        self.apply(Policy::Kill, entities)
    }

    pub fn kill_hard(self, entities: &[EntityId]) -> Self {
        self.apply(Policy::KillHard, entities)
    }

    pub fn banish(self, entities: &[EntityId]) -> Self {
        self.apply(Policy::Banish, entities)
    }

    pub fn macro_for(self, script: CombatMacro, entities: &[EntityId]) -> Self {
        self.apply(Policy::Macro(script), entities)
    }

    pub fn ignore(self, entities: &[EntityId]) -> Self {
        self.apply(Policy::Ignore, entities)
    }

    /// Entity entry first, then the wildcard, then [`Policy::Ignore`].
    pub fn resolve(&self, entity: EntityId) -> Policy {
        self.entries
            .get(&entity)
            .or(self.wildcard.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    pub fn wildcard(&self) -> Option<&Policy> {
        self.wildcard.as_ref()
    }

    /// Entities with a specific entry, in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Policy)> {
        self.entries.iter().map(|(id, policy)| (*id, policy))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.wildcard.is_none()
    }
}

//! Shared deterministic types for the quest engine core.
//!
//! These types define stable contracts between core components. They must not
//! depend on external state or I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an entity the world can put in front of us during an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

/// Identifier of a labeled decision point reached during an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "choice#{}", self.0)
    }
}

/// Attempt budget for a task.
///
/// `soft` marks the point after which the task is considered degraded but may
/// keep running. `hard` is the point at which the run aborts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limit {
    pub soft: Option<u32>,
    pub hard: Option<u32>,
}

/// Classification of an attempt count against a [`Limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStatus {
    Within,
    /// At or past the soft ceiling.
    Degraded,
    /// At or past the hard ceiling.
    Exhausted,
}

impl Limit {
    pub fn soft(soft: u32) -> Self {
        Self {
            soft: Some(soft),
            hard: None,
        }
    }

    pub fn hard(hard: u32) -> Self {
        Self {
            soft: None,
            hard: Some(hard),
        }
    }

    pub fn soft_and_hard(soft: u32, hard: u32) -> Self {
        Self {
            soft: Some(soft),
            hard: Some(hard),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.soft.is_none() && self.hard.is_none()
    }

    pub fn check(&self, attempts: u32) -> LimitStatus {
        if self.hard.is_some_and(|hard| attempts >= hard) {
            return LimitStatus::Exhausted;
        }
        if self.soft.is_some_and(|soft| attempts >= soft) {
            return LimitStatus::Degraded;
        }
        LimitStatus::Within
    }

    /// True exactly when `attempts` is the count that first crosses the soft ceiling.
    pub fn crosses_soft(&self, attempts: u32) -> bool {
        self.soft == Some(attempts)
    }
}

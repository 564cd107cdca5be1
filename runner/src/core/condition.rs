//! Declarative predicates over external state.
//!
//! Most `ready`/`completed` checks compare a quest marker against a step or
//! two counters against each other. [`Condition`] names those shapes so they
//! can be written in quest files as well as in code.

use serde::{Deserialize, Serialize};

use crate::error::QuestError;
use crate::io::state_store::{StateStore, read_number, read_step};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Marker at `property` has reached at least `value`.
    StepAtLeast { property: String, value: i32 },
    /// Marker at `property` is exactly `value`.
    StepEquals { property: String, value: i32 },
    /// Counter `property` is strictly below counter `than`.
    NumberBelow { property: String, than: String },
    /// Counters `left` and `right` hold the same value.
    NumbersEqual { left: String, right: String },
    /// Raw value at `property` equals `value`.
    PropertyEquals { property: String, value: String },
    All { of: Vec<Condition> },
    Any { of: Vec<Condition> },
}

impl Condition {
    pub fn step_at_least(property: impl Into<String>, value: i32) -> Self {
        Condition::StepAtLeast {
            property: property.into(),
            value,
        }
    }

    pub fn step_equals(property: impl Into<String>, value: i32) -> Self {
        Condition::StepEquals {
            property: property.into(),
            value,
        }
    }

    pub fn number_below(property: impl Into<String>, than: impl Into<String>) -> Self {
        Condition::NumberBelow {
            property: property.into(),
            than: than.into(),
        }
    }

    pub fn numbers_equal(left: impl Into<String>, right: impl Into<String>) -> Self {
        Condition::NumbersEqual {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn evaluate(&self, store: &dyn StateStore) -> Result<bool, QuestError> {
        match self {
            Condition::StepAtLeast { property, value } => Ok(read_step(store, property)? >= *value),
            Condition::StepEquals { property, value } => Ok(read_step(store, property)? == *value),
            Condition::NumberBelow { property, than } => {
                Ok(read_number(store, property)? < read_number(store, than)?)
            }
            Condition::NumbersEqual { left, right } => {
                Ok(read_number(store, left)? == read_number(store, right)?)
            }
            Condition::PropertyEquals { property, value } => {
                Ok(store.property(property).as_deref() == Some(value.as_str()))
            }
            Condition::All { of } => {
                for condition in of {
                    if !condition.evaluate(store)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any { of } => {
                for condition in of {
                    if condition.evaluate(store)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

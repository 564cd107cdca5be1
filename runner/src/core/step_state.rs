//! Ordinal interpretation of external quest progress markers.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::error::QuestError;

/// The quest has not been offered yet.
pub const UNSTARTED: i32 = -1;
/// The quest was accepted but no step has been reached.
pub const STARTED: i32 = 0;
/// The quest is over. Sorts above every numbered step.
pub const FINISHED: i32 = 999;

/// Marker text that is none of the recognized shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized step marker {raw:?}")]
pub struct StepFormatError {
    pub raw: String,
}

impl StepFormatError {
    /// Attach the property key the marker was read from.
    pub fn for_key(self, key: &str) -> QuestError {
        QuestError::StateFormat {
            key: key.to_string(),
            raw: self.raw,
        }
    }
}

/// Parse a progress marker into its ordinal.
///
/// `unstarted` is -1, `started` is 0, `finished` is 999 and `stepN` is N for
/// N >= 1. Anything else is rejected rather than guessed.
pub fn parse_step(raw: &str) -> Result<i32, StepFormatError> {
    static STEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^step([0-9]+)$").unwrap());

    match raw {
        "unstarted" => return Ok(UNSTARTED),
        "started" => return Ok(STARTED),
        "finished" => return Ok(FINISHED),
        _ => {}
    }

    let invalid = || StepFormatError {
        raw: raw.to_string(),
    };
    let digits = STEP_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .ok_or_else(invalid)?;
    match digits.as_str().parse::<i32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(invalid()),
    }
}

//! Typed errors surfaced by quest construction and quest runs.
//!
//! Every fatal variant names the quest and task that triggered it so a caller
//! can report the failure without re-deriving context from logs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuestError {
    /// A progress marker or counter could not be interpreted.
    #[error("unparseable state `{key}`: {raw:?}")]
    StateFormat { key: String, raw: String },

    /// The quest (or the chains it was merged from) is malformed.
    #[error("quest '{quest}' is malformed:\n- {}", .problems.join("\n- "))]
    Structure { quest: String, problems: Vec<String> },

    /// A prepare hook or action failed. Recoverable: the attempt is counted.
    #[error("quest '{quest}' task '{task}' failed: {source:#}")]
    TaskExecution {
        quest: String,
        task: String,
        #[source]
        source: anyhow::Error,
    },

    /// A readiness or completion check failed while a quest was running.
    #[error("quest '{quest}' task '{task}': {source}")]
    Evaluation {
        quest: String,
        task: String,
        #[source]
        source: Box<QuestError>,
    },

    /// The hard attempt ceiling was reached. The run aborts.
    #[error("quest '{quest}' task '{task}' exhausted its hard limit after {attempts} attempts")]
    LimitExceeded {
        quest: String,
        task: String,
        attempts: u32,
    },
}

impl QuestError {
    pub(crate) fn structure(quest: &str, problems: Vec<String>) -> Self {
        QuestError::Structure {
            quest: quest.to_string(),
            problems,
        }
    }

    /// Attach the quest and task whose check produced a state format error.
    ///
    /// Other variants already carry their origin and are returned unchanged.
    pub fn in_task(self, quest: &str, task: &str) -> Self {
        match self {
            QuestError::StateFormat { .. } => QuestError::Evaluation {
                quest: quest.to_string(),
                task: task.to_string(),
                source: Box::new(self),
            },
            other => other,
        }
    }

    /// True for errors that end a run rather than a single attempt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, QuestError::TaskExecution { .. })
    }
}

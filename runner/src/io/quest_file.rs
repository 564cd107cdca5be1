//! Declarative quest definitions stored as TOML.
//!
//! A quest file describes tasks whose actions are plain visits and whose
//! checks are [`Condition`]s, so a quest can be planned, validated and
//! selected against a state snapshot without writing Rust.
//!
//! ```toml
//! [quest]
//! name = "Suburbs of Dis"
//!
//! [[chains]]
//! name = "Clumsiness"
//!
//! [[chains.tasks]]
//! name = "Enable Clumsiness Bosses"
//! visit = "The Clumsiness Grove"
//! completed = { kind = "step_at_least", property = "questClumsinessGrove", value = 0 }
//! choices = { "560" = 1 }
//! limit = { soft = 30 }
//!
//! [terminal]
//! name = "Boss"
//! visit = "suburbandis.php"
//! completed = { kind = "numbers_equal", left = "lastThingWithNoNameDefeated", right = "knownAscensions" }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::combat::{CombatMacro, CombatStrategy, Policy};
use crate::core::condition::Condition;
use crate::core::interleave::build_quest;
use crate::core::types::{ChoiceId, EntityId, Limit};
use crate::io::config::RunnerConfig;
use crate::quest::{Action, Quest, Task};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuestFile {
    pub quest: QuestHeader,
    /// Standalone tasks, kept in declared order ahead of the chains.
    #[serde(default)]
    pub tasks: Vec<RawTask>,
    /// Chains merged phase by phase.
    #[serde(default)]
    pub chains: Vec<RawChain>,
    /// Final task run once every chain has finished.
    pub terminal: Option<RawTask>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuestHeader {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawChain {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<RawTask>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawTask {
    pub name: String,
    #[serde(default)]
    pub after: Vec<String>,
    pub visit: String,
    pub ready: Option<Condition>,
    pub completed: Condition,
    /// Decision point id (as a string key) to option.
    #[serde(default)]
    pub choices: BTreeMap<String, u32>,
    #[serde(default)]
    pub combat: Vec<RawCombatRule>,
    pub limit: Option<Limit>,
    #[serde(default)]
    pub boss: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Kill,
    KillHard,
    Banish,
    Macro,
    Ignore,
}

/// One combat registration. No entities means the wildcard.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawCombatRule {
    pub policy: PolicyKind,
    #[serde(default)]
    pub entities: Vec<u32>,
    pub script: Option<String>,
}

impl RawCombatRule {
    fn policy(&self) -> Result<Policy> {
        let policy = match self.policy {
            PolicyKind::Kill => Policy::Kill,
            PolicyKind::KillHard => Policy::KillHard,
            PolicyKind::Banish => Policy::Banish,
            PolicyKind::Ignore => Policy::Ignore,
            PolicyKind::Macro => {
                let script = self
                    .script
                    .as_ref()
                    .ok_or_else(|| anyhow!("macro policy requires a script"))?;
                Policy::Macro(CombatMacro::new(script.clone()))
            }
        };
        if self.policy != PolicyKind::Macro && self.script.is_some() {
            return Err(anyhow!("script is only valid with the macro policy"));
        }
        Ok(policy)
    }
}

impl RawTask {
    /// Convert to a runnable task. Tasks without any limit get `default_soft_limit`.
    pub fn into_task(self, config: &RunnerConfig) -> Result<Task> {
        let name = self.name;
        let mut strategy = CombatStrategy::new();
        for rule in &self.combat {
            let policy = rule
                .policy()
                .with_context(|| format!("task '{name}' combat"))?;
            let entities: Vec<EntityId> = rule.entities.iter().copied().map(EntityId).collect();
            strategy = strategy.apply(policy, &entities);
        }

        let limit = match self.limit {
            Some(limit) if !limit.is_unbounded() => limit,
            _ => Limit {
                soft: config.default_soft_limit,
                hard: None,
            },
        };

        let mut task = Task::when(name.clone(), self.completed, Action::visit(self.visit))
            .after(self.after)
            .limit(limit);
        if let Some(ready) = self.ready {
            task = task.ready_when(ready);
        }
        if !strategy.is_empty() {
            task = task.combat(strategy);
        }
        for (key, option) in self.choices {
            let id: u32 = key
                .parse()
                .with_context(|| format!("task '{name}' choice id '{key}' is not a number"))?;
            task = task.choice(ChoiceId(id), option);
        }
        if self.boss {
            task = task.boss();
        }
        Ok(task)
    }
}

impl QuestFile {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("parse quest file")
    }

    /// Build the quest: standalone tasks, then the interleaved chains, then the terminal task.
    pub fn into_quest(self, config: &RunnerConfig) -> Result<Quest> {
        let leading = self
            .tasks
            .into_iter()
            .map(|raw| raw.into_task(config))
            .collect::<Result<Vec<_>>>()?;
        let chains = self
            .chains
            .into_iter()
            .map(|chain| {
                let chain_name = chain.name;
                chain
                    .tasks
                    .into_iter()
                    .map(|raw| raw.into_task(config))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("chain '{chain_name}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        let terminal = self
            .terminal
            .map(|raw| raw.into_task(config))
            .transpose()?;
        let quest = build_quest(&self.quest.name, leading, chains, terminal)?;
        Ok(quest)
    }
}

/// Parse and build a quest from TOML text.
pub fn parse_quest(contents: &str, config: &RunnerConfig) -> Result<Quest> {
    QuestFile::from_toml_str(contents)?.into_quest(config)
}

/// Load and build a quest from a TOML file.
pub fn load_quest(path: &Path, config: &RunnerConfig) -> Result<Quest> {
    debug!(path = %path.display(), "loading quest file");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_quest(&contents, config).with_context(|| format!("load {}", path.display()))
}

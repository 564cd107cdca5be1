//! Validation and planning helpers for quest files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::Limit;
use crate::io::config::RunnerConfig;
use crate::io::quest_file::load_quest;
use crate::quest::{Action, Quest};

/// One row of a quest plan, in execution priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub position: usize,
    pub name: String,
    pub after: Vec<String>,
    pub visit: Option<String>,
    pub limit: Limit,
    pub boss: bool,
    pub gated: bool,
}

/// High-level validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateOutcome {
    pub quest: String,
    pub tasks: usize,
    pub bosses: usize,
}

/// Flatten a quest into plan entries.
pub fn plan(quest: &Quest) -> Vec<PlanEntry> {
    quest
        .tasks()
        .iter()
        .enumerate()
        .map(|(position, task)| PlanEntry {
            position,
            name: task.name.clone(),
            after: task.after.clone(),
            visit: match &task.action {
                Action::Visit(target) => Some(target.clone()),
                Action::Call(_) => None,
            },
            limit: task.limit,
            boss: task.boss,
            gated: task.ready.is_some(),
        })
        .collect()
}

/// Render a plan as aligned text, one task per line.
pub fn render_plan(entries: &[PlanEntry]) -> String {
    let width = entries.iter().map(|entry| entry.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        let mut notes = Vec::new();
        if !entry.after.is_empty() {
            notes.push(format!("after {}", entry.after.join(", ")));
        }
        if let Some(soft) = entry.limit.soft {
            notes.push(format!("soft {soft}"));
        }
        if let Some(hard) = entry.limit.hard {
            notes.push(format!("hard {hard}"));
        }
        if entry.gated {
            notes.push("gated".to_string());
        }
        if entry.boss {
            notes.push("boss".to_string());
        }
        let line = format!(
            "{:>3}  {:<width$}  {}",
            entry.position + 1,
            entry.name,
            notes.join("; ")
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Load and validate a quest file: parse, interleave, structural invariants.
pub fn validate_quest_file(path: &Path, config: &RunnerConfig) -> Result<ValidateOutcome> {
    let quest = load_quest(path, config).context("validate quest file")?;
    Ok(ValidateOutcome {
        quest: quest.name().to_string(),
        tasks: quest.tasks().len(),
        bosses: quest.tasks().iter().filter(|task| task.boss).count(),
    })
}

/// Load a quest file and return its plan.
pub fn plan_quest_file(path: &Path, config: &RunnerConfig) -> Result<Vec<PlanEntry>> {
    let quest = load_quest(path, config).context("plan quest file")?;
    Ok(plan(&quest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::condition::Condition;
    use crate::quest::Task;
    use crate::test_support::task;

    fn quest() -> Quest {
        Quest::new(
            "Dis",
            vec![
                task("Enable").limit(Limit::soft(30)).ready_when(Condition::number_below(
                    "lastThingWithNoNameDefeated",
                    "knownAscensions",
                )),
                Task::new("Boss", |_| Ok(false), Action::call(|_, _| Ok(())))
                    .after(["Enable"])
                    .limit(Limit::hard(1))
                    .boss(),
            ],
        )
        .expect("quest")
    }

    #[test]
    fn plan_lists_tasks_in_order() {
        let entries = plan(&quest());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].visit.as_deref(), Some("Enable"));
        assert!(entries[0].gated);
        assert_eq!(entries[1].visit, None);
        assert_eq!(entries[1].after, vec!["Enable"]);
        assert!(entries[1].boss);
    }

    #[test]
    fn render_plan_shows_limits_and_flags() {
        let text = render_plan(&plan(&quest()));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  1  Enable  soft 30; gated");
        assert_eq!(lines[1], "  2  Boss    after Enable; hard 1; boss");
    }

    #[test]
    fn validate_reports_structure_problems() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("quest.toml");
        std::fs::write(
            &path,
            r#"
[quest]
name = "Broken"

[[tasks]]
name = "A"
after = ["Missing"]
visit = "somewhere"
completed = { kind = "property_equals", property = "a", value = "done" }
"#,
        )
        .expect("write");
        let err = validate_quest_file(&path, &RunnerConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("task 'A' depends on unknown task 'Missing'"));
    }

    #[test]
    fn validate_counts_tasks_and_bosses() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("quest.toml");
        std::fs::write(
            &path,
            r#"
[quest]
name = "Small"

[[tasks]]
name = "A"
visit = "somewhere"
completed = { kind = "property_equals", property = "a", value = "done" }

[terminal]
name = "Boss"
visit = "lair"
boss = true
completed = { kind = "property_equals", property = "boss", value = "dead" }
"#,
        )
        .expect("write");
        let outcome = validate_quest_file(&path, &RunnerConfig::default()).expect("validate");
        assert_eq!(
            outcome,
            ValidateOutcome {
                quest: "Small".to_string(),
                tasks: 2,
                bosses: 1,
            }
        );
        let entries = plan_quest_file(&path, &RunnerConfig::default()).expect("plan");
        assert_eq!(entries[1].limit, Limit::hard(1));
    }
}

//! Phase-by-phase merge of independent task chains.
//!
//! Chains often share a narrow gate (a global counter that must lag another
//! before any chain may enable its bosses). Emitting every chain's phase `i`
//! before any chain's phase `i + 1` spends the cheap phases first, so an
//! expensive phase is never attempted while a sibling could still close the
//! gate.

use tracing::debug;

use crate::core::types::Limit;
use crate::error::QuestError;
use crate::quest::{Quest, Task};

/// Merge equal-length chains breadth-first.
///
/// Emits `chains[0][i], chains[1][i], ...` for each phase `i`. When `terminal`
/// is given it is appended last, made to depend on every chain's final task,
/// and capped at a single attempt.
/// Unequal chain lengths are rejected; `quest` only labels the error.
pub fn interleave(
    quest: &str,
    chains: Vec<Vec<Task>>,
    terminal: Option<Task>,
) -> Result<Vec<Task>, QuestError> {
    let phases = chains.first().map(Vec::len).unwrap_or(0);
    let problems: Vec<String> = chains
        .iter()
        .enumerate()
        .filter(|(_, chain)| chain.len() != phases)
        .map(|(i, chain)| {
            format!(
                "chain {i} has {} tasks but chain 0 has {phases}; chains must be equal length",
                chain.len()
            )
        })
        .collect();
    if !problems.is_empty() {
        return Err(QuestError::structure(quest, problems));
    }

    let tails: Vec<String> = chains
        .iter()
        .filter_map(|chain| chain.last().map(|task| task.name.clone()))
        .collect();

    let width = chains.len();
    let mut columns: Vec<std::vec::IntoIter<Task>> =
        chains.into_iter().map(Vec::into_iter).collect();
    let mut merged = Vec::with_capacity(width * phases + 1);
    for _ in 0..phases {
        for column in &mut columns {
            if let Some(task) = column.next() {
                merged.push(task);
            }
        }
    }

    if let Some(terminal) = terminal {
        let missing: Vec<String> = tails
            .into_iter()
            .filter(|tail| !terminal.after.contains(tail))
            .collect();
        merged.push(terminal.after(missing).limit(Limit::hard(1)));
    }

    debug!(quest, chains = width, phases, tasks = merged.len(), "interleaved chains");
    Ok(merged)
}

/// Compose `leading ++ interleave(chains, terminal)` into a validated quest.
pub fn build_quest(
    name: &str,
    leading: Vec<Task>,
    chains: Vec<Vec<Task>>,
    terminal: Option<Task>,
) -> Result<Quest, QuestError> {
    let mut tasks = leading;
    tasks.extend(interleave(name, chains, terminal)?);
    Quest::new(name, tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::task;

    fn chain(prefix: &str, len: usize) -> Vec<Task> {
        (0..len)
            .map(|i| {
                let t = task(&format!("{prefix}{i}"));
                if i == 0 {
                    t
                } else {
                    t.after([format!("{prefix}{}", i - 1)])
                }
            })
            .collect()
    }

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn three_chains_of_five_merge_by_phase() {
        let merged = interleave(
            "Dis",
            vec![chain("a", 5), chain("b", 5), chain("c", 5)],
            None,
        )
        .expect("interleave");
        assert_eq!(merged.len(), 15);
        assert_eq!(names(&merged)[..3], ["a0", "b0", "c0"]);
        assert_eq!(names(&merged)[12..], ["a4", "b4", "c4"]);
    }

    #[test]
    fn merged_order_preserves_each_chain() {
        let merged = interleave("q", vec![chain("a", 4), chain("b", 4)], None).expect("merge");
        for prefix in ["a", "b"] {
            let positions: Vec<usize> = (0..4)
                .map(|i| {
                    let name = format!("{prefix}{i}");
                    merged.iter().position(|t| t.name == name).expect("present")
                })
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn terminal_depends_on_every_tail() {
        let merged = interleave(
            "q",
            vec![chain("a", 2), chain("b", 2)],
            Some(task("Boss").after(["a1"])),
        )
        .expect("merge");
        let boss = merged.last().expect("terminal");
        assert_eq!(boss.name, "Boss");
        assert_eq!(boss.after, vec!["a1".to_string(), "b1".to_string()]);
        assert_eq!(boss.limit, Limit::hard(1));
    }

    #[test]
    fn unequal_chains_are_rejected() {
        let err = interleave("Dis", vec![chain("a", 5), chain("b", 4)], None).unwrap_err();
        match err {
            QuestError::Structure { quest, problems } => {
                assert_eq!(quest, "Dis");
                assert_eq!(problems.len(), 1);
                assert!(problems[0].contains("chain 1 has 4 tasks"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn no_chains_yields_only_terminal() {
        let merged = interleave("q", Vec::new(), Some(task("Boss"))).expect("merge");
        assert_eq!(names(&merged), vec!["Boss"]);
        assert!(merged[0].after.is_empty());
    }

    #[test]
    fn build_quest_validates_the_result() {
        let quest = build_quest("q", vec![task("Intro")], vec![chain("a", 2)], None)
            .expect("quest");
        assert_eq!(quest.task_names(), vec!["Intro", "a0", "a1"]);

        let err = build_quest("q", vec![task("a0")], vec![chain("a", 2)], None).unwrap_err();
        assert!(err.to_string().contains("duplicate task 'a0'"));
    }
}

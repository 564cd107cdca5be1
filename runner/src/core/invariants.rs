//! Structural invariants of a quest's task list.

use std::collections::HashMap;

use crate::quest::Task;

/// Check structural invariants:
/// - No duplicate task names
/// - Every dependency names a task in the same list
/// - Dependencies form a DAG
/// - A hard limit is positive and never below the soft limit
///
/// Returns every violation found, in task order.
pub fn validate_quest(tasks: &[Task]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (i, task) in tasks.iter().enumerate() {
        if index.insert(task.name.as_str(), i).is_some() {
            errors.push(format!("duplicate task '{}'", task.name));
        }
    }

    for task in tasks {
        for dep in &task.after {
            if !index.contains_key(dep.as_str()) {
                errors.push(format!("task '{}' depends on unknown task '{}'", task.name, dep));
            }
        }
    }

    for task in tasks {
        if task.limit.hard == Some(0) {
            errors.push(format!("task '{}' has a hard limit of 0", task.name));
        }
        if task.limit.soft == Some(0) {
            errors.push(format!("task '{}' has a soft limit of 0", task.name));
        }
        if let (Some(soft), Some(hard)) = (task.limit.soft, task.limit.hard) {
            if soft > hard {
                errors.push(format!(
                    "task '{}' soft limit {soft} exceeds hard limit {hard}",
                    task.name
                ));
            }
        }
    }

    if let Some(cycle) = find_cycle(tasks, &index) {
        errors.push(format!("dependency cycle: {}", cycle.join(" -> ")));
    }

    errors
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first search for a back edge. Returns the cycle path, first node repeated at the end.
///
/// Iterative: `path` holds the nodes on the current branch together with the
/// index of the next dependency to follow, so long chains cannot overflow the
/// call stack.
fn find_cycle(tasks: &[Task], index: &HashMap<&str, usize>) -> Option<Vec<String>> {
    let mut marks = vec![Mark::Unvisited; tasks.len()];
    let mut path: Vec<(usize, usize)> = Vec::new();

    for start in 0..tasks.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::InProgress;
        path.push((start, 0));

        while let Some((node, next_dep)) = path.last_mut() {
            let node = *node;
            let Some(dep) = tasks[node].after.get(*next_dep) else {
                marks[node] = Mark::Done;
                path.pop();
                continue;
            };
            *next_dep += 1;
            let Some(&next) = index.get(dep.as_str()) else {
                continue;
            };
            match marks[next] {
                Mark::InProgress => {
                    let from = path.iter().position(|(n, _)| *n == next).unwrap_or(0);
                    let mut cycle: Vec<String> = path[from..]
                        .iter()
                        .map(|(n, _)| tasks[*n].name.clone())
                        .collect();
                    cycle.push(tasks[next].name.clone());
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    path.push((next, 0));
                }
                Mark::Done => {}
            }
        }
    }
    None
}

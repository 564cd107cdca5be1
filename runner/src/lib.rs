//! Quest orchestration engine.
//!
//! A quest is an ordered list of tasks. Each task carries a dependency list,
//! an optional readiness check, a completion check evaluated against external
//! state, an action, encounter settings and retry limits. The scheduler
//! repeatedly picks the first eligible task, runs it, and re-reads state until
//! the quest is done, blocked, or a hard limit is breached.
//!
//! - **[`core`]**: Pure, deterministic logic (step markers, conditions,
//!   combat strategies, interleaving, invariants, selection).
//! - **[`io`]**: Boundaries to the outside world ([`io::world::World`],
//!   [`io::state_store::StateStore`], quest files, config).
//!
//! Orchestration modules ([`step`], [`looping`], [`select`], [`validate`])
//! combine the two to implement runs and CLI commands.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod quest;
pub mod select;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;

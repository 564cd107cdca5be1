//! Deterministic, pure logic shared by the quest engine.
//!
//! Core modules never perform I/O. External state is only reached through
//! the [`StateStore`](crate::io::state_store::StateStore) trait, so every
//! decision here is reproducible from a snapshot.

pub mod combat;
pub mod condition;
pub mod encounters;
pub mod interleave;
pub mod invariants;
pub mod selector;
pub mod step_state;
pub mod types;

//! Stable exit codes for quest-runner CLI commands.

/// Command succeeded or an eligible task was selected.
pub const OK: i32 = 0;
/// Invalid quest file, state snapshot, config, or any other error.
pub const INVALID: i32 = 1;
/// `quest-runner select` found every task completed.
pub const DONE: i32 = 2;
/// `quest-runner select` found remaining work but nothing eligible.
pub const BLOCKED: i32 = 3;

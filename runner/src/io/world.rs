//! Boundary to the environment that actions mutate.

use anyhow::Result;

use crate::core::encounters::EncounterHandler;
use crate::io::state_store::StateStore;

/// The stateful environment tasks act upon.
///
/// Implementations perform the actual interaction; the engine only decides
/// when to call them and reads state back through [`StateStore`].
pub trait World: StateStore {
    /// Perform one interaction at a fixed target (a location, a page, an item use).
    ///
    /// Encounters and decision points met along the way must be routed
    /// through `encounters`. Return a fatal [`QuestError`] (e.g. from
    /// [`read_step`]) to abort the run; any other error only fails the attempt.
    ///
    /// [`QuestError`]: crate::error::QuestError
    /// [`read_step`]: crate::io::state_store::read_step
    fn visit(&mut self, target: &str, encounters: &mut dyn EncounterHandler) -> Result<()>;
}

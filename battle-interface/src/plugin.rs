//! Registration ABI between the harness and dynamically loaded plugins.
//!
//! Rust shared libraries have no static initializers to piggyback on, so the
//! protocol is explicit: the host appends a name-only registry entry, loads
//! the library, resolves [`PLUGIN_ENTRY_SYMBOL`] and calls it with a
//! [`PluginRegistrar`]. The entry function registers the factories that fill
//! the pending entry; the host then validates completeness and rolls the
//! entry back if anything is missing.
//!
//! Host and plugins must be built with the same toolchain; the entry function
//! deliberately uses the Rust ABI since trait objects cross the boundary.

use crate::{GameManagerFactory, PlayerFactory, TankAlgorithmFactory};

/// Symbol every plugin exports.
pub const PLUGIN_ENTRY_SYMBOL: &[u8] = b"tank_plugin_entry";

/// Signature of the exported entry function.
pub type PluginEntryFn = unsafe extern "Rust" fn(&mut dyn PluginRegistrar);

/// Sink the host passes to a plugin's entry function.
///
/// An algorithm plugin calls `register_player` and `register_tank_algorithm`
/// exactly once each; a game-manager plugin calls `register_game_manager`
/// exactly once. A second call to the same hook is a registration error the
/// host rejects.
pub trait PluginRegistrar {
    fn register_player(&mut self, factory: PlayerFactory);
    fn register_tank_algorithm(&mut self, factory: TankAlgorithmFactory);
    fn register_game_manager(&mut self, factory: GameManagerFactory);
}

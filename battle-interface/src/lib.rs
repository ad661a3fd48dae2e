//! Shared boundary between the tournament harness and its plugins.
//!
//! Two kinds of plugins exist: algorithm plugins (a [`Player`] plus a
//! [`TankAlgorithm`] per tank) and game-manager plugins (a full-rules
//! [`GameManager`] referee). The harness only ever talks to them through the
//! traits in this crate, and plugins only ever receive harness state through
//! [`SatelliteView`] snapshots.
//!
//! Shared libraries export a [`plugin::PluginEntryFn`] under
//! [`plugin::PLUGIN_ENTRY_SYMBOL`]; the harness calls it right after loading
//! and the plugin registers its factories into the provided
//! [`plugin::PluginRegistrar`].

use std::any::Any;
use std::fmt;

pub mod plugin;
mod result;

pub use result::{BoardSnapshot, GameOverReason, GameResult};

/// One action requested by a tank algorithm for the current turn.
///
/// Tanks move one cell per turn, rotate in 45° increments, and may ask the
/// referee to pause and deliver battle info instead of acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionRequest {
    MoveForward,
    MoveBackward,
    RotateLeft90,
    RotateRight90,
    RotateLeft45,
    RotateRight45,
    Shoot,
    GetBattleInfo,
    DoNothing,
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionRequest::MoveForward => "MoveForward",
            ActionRequest::MoveBackward => "MoveBackward",
            ActionRequest::RotateLeft90 => "RotateLeft90",
            ActionRequest::RotateRight90 => "RotateRight90",
            ActionRequest::RotateLeft45 => "RotateLeft45",
            ActionRequest::RotateRight45 => "RotateRight45",
            ActionRequest::Shoot => "Shoot",
            ActionRequest::GetBattleInfo => "GetBattleInfo",
            ActionRequest::DoNothing => "DoNothing",
        };
        f.write_str(name)
    }
}

/// Read-only board snapshot handed to players and returned in results.
///
/// `get_object_at` yields one of `'#'` (wall), `'@'` (mine), `'1'`/`'2'`
/// (tanks), `'*'` (shell), `'%'` (the querying tank), `' '` (empty) or `'&'`
/// for out-of-range queries. Implementations own their data; no view borrows
/// from a live board.
pub trait SatelliteView {
    fn get_object_at(&self, x: usize, y: usize) -> char;
}

/// Opaque battle information passed from a [`Player`] to its tanks.
///
/// The concrete type is private to a plugin: a `Player` builds whatever info
/// its own `TankAlgorithm`s know how to interpret and they recover it via
/// [`Any`] downcasting. Across plugins the type stays opaque.
pub trait BattleInfo: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Per-tank controller supplied by an algorithm plugin.
pub trait TankAlgorithm {
    /// Decide the action for the current turn.
    fn get_action(&mut self) -> ActionRequest;

    /// Receive battle info after a `GetBattleInfo` request. The info comes
    /// from this tank's own [`Player`], which may also read back anything the
    /// tank wrote into it.
    fn update_battle_info(&mut self, info: &mut dyn BattleInfo);
}

/// Per-match player controller supplied by an algorithm plugin.
///
/// When one of its tanks requests `GetBattleInfo`, the referee calls
/// [`Player::update_tank_with_battle_info`] with that tank and a satellite
/// snapshot; the player is expected to call back into the tank with a
/// concrete [`BattleInfo`].
pub trait Player {
    fn update_tank_with_battle_info(
        &mut self,
        tank: &mut dyn TankAlgorithm,
        view: &dyn SatelliteView,
    );
}

/// Creates a [`Player`] from `(player_index, rows, cols, max_steps, num_shells)`.
pub type PlayerFactory =
    Box<dyn Fn(usize, usize, usize, usize, usize) -> Box<dyn Player> + Send + Sync>;

/// Creates a [`TankAlgorithm`] from `(player_index, tank_index)`.
pub type TankAlgorithmFactory =
    Box<dyn Fn(usize, usize) -> Box<dyn TankAlgorithm> + Send + Sync>;

/// Creates a [`GameManager`]; the flag enables verbose per-match transcripts.
pub type GameManagerFactory = Box<dyn Fn(bool) -> Box<dyn GameManager> + Send + Sync>;

/// A full-rules referee: runs one complete match and reports the outcome.
pub trait GameManager {
    /// Run a match on the given map with the two players and one tank
    /// algorithm per tank discovered on the map (created through the
    /// factories). Must be deterministic: identical inputs produce an
    /// identical [`GameResult`].
    #[allow(clippy::too_many_arguments)]
    fn run(
        &mut self,
        map_width: usize,
        map_height: usize,
        map: &dyn SatelliteView,
        map_name: &str,
        max_steps: usize,
        num_shells: usize,
        player1: &mut dyn Player,
        name1: &str,
        player2: &mut dyn Player,
        name2: &str,
        tank_factory1: &TankAlgorithmFactory,
        tank_factory2: &TankAlgorithmFactory,
    ) -> GameResult;
}

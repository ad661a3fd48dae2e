//! Reference game manager for the tank tournament harness.
//!
//! The crate has two layers: a deterministic turn engine ([`GameState`]) that
//! implements the full game rules, and a thin referee
//! ([`RefereeGameManager`]) that drives the engine for a whole match, writes
//! per-turn transcripts and produces a [`battle_interface::GameResult`].
//!
//! Built as a `cdylib` the crate doubles as a loadable game-manager plugin:
//! it exports `tank_plugin_entry` and registers its factory like any
//! third-party referee would.

pub mod board;
pub mod direction;
pub mod game_state;
pub mod manager;
pub mod satellite;
pub mod tank;

pub use board::{Board, Cell, CellContent};
pub use direction::Direction;
pub use game_state::{GameState, TurnReport};
pub use manager::RefereeGameManager;
pub use satellite::SatelliteSnapshot;
pub use tank::{Shell, TankState};

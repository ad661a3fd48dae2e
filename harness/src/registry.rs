//! Process-wide plugin registries.
//!
//! Each registrar is an ordered list of committed entries plus at most one
//! pending registration. The host drives the protocol explicitly:
//! [`begin_registration`](AlgorithmRegistrar::begin_registration) appends the
//! name-only pending entry, loading the library lets its entry function fill
//! the factories in, and [`finish_registration`](AlgorithmRegistrar::finish_registration)
//! either commits the entry or rolls it back with the reason.

use std::sync::Arc;

use battle_interface::plugin::PluginRegistrar;
use battle_interface::{
    GameManager, GameManagerFactory, Player, PlayerFactory, TankAlgorithmFactory,
};
use thiserror::Error;
use tracing::warn;

/// Why a plugin's registration was rejected and rolled back.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("plugin '{name}' did not register a {what}")]
    Missing { name: String, what: &'static str },
    #[error("plugin '{name}' registered a {what} more than once")]
    Duplicate { name: String, what: &'static str },
    #[error("plugin '{name}' registered a {what}, which this registry does not accept")]
    Unexpected { name: String, what: &'static str },
    #[error("no registration in progress")]
    NotStarted,
}

/// Committed algorithm plugin: a player factory plus a tank-algorithm factory.
pub struct AlgorithmEntry {
    name: String,
    player_factory: PlayerFactory,
    tank_factory: TankAlgorithmFactory,
}

impl AlgorithmEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_player(
        &self,
        player_index: usize,
        rows: usize,
        cols: usize,
        max_steps: usize,
        num_shells: usize,
    ) -> Box<dyn Player> {
        (self.player_factory)(player_index, rows, cols, max_steps, num_shells)
    }

    pub fn tank_factory(&self) -> &TankAlgorithmFactory {
        &self.tank_factory
    }
}

struct PendingAlgorithm {
    name: String,
    player_factory: Option<PlayerFactory>,
    tank_factory: Option<TankAlgorithmFactory>,
    error: Option<RegistrationError>,
}

/// Ordered registry of algorithm plugins.
#[derive(Default)]
pub struct AlgorithmRegistrar {
    entries: Vec<Arc<AlgorithmEntry>>,
    pending: Option<PendingAlgorithm>,
}

impl AlgorithmRegistrar {
    pub fn new() -> AlgorithmRegistrar {
        AlgorithmRegistrar::default()
    }

    /// Append the name-only entry the upcoming library load will fill in.
    pub fn begin_registration(&mut self, name: &str) {
        if self.pending.is_some() {
            warn!(name, "previous registration was never finished, dropping it");
        }
        self.pending = Some(PendingAlgorithm {
            name: name.to_string(),
            player_factory: None,
            tank_factory: None,
            error: None,
        });
    }

    /// Validate the pending entry: commit it, or roll it back and say why.
    pub fn finish_registration(&mut self) -> Result<(), RegistrationError> {
        let pending = self.pending.take().ok_or(RegistrationError::NotStarted)?;
        if let Some(error) = pending.error {
            return Err(error);
        }
        let name = pending.name;
        let Some(player_factory) = pending.player_factory else {
            return Err(RegistrationError::Missing { name, what: "player factory" });
        };
        let Some(tank_factory) = pending.tank_factory else {
            return Err(RegistrationError::Missing { name, what: "tank algorithm factory" });
        };
        self.entries.push(Arc::new(AlgorithmEntry { name, player_factory, tank_factory }));
        Ok(())
    }

    /// Drop the pending entry without committing (library failed to load).
    pub fn abort_pending(&mut self) {
        self.pending = None;
    }

    pub fn entries(&self) -> &[Arc<AlgorithmEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PluginRegistrar for AlgorithmRegistrar {
    fn register_player(&mut self, factory: PlayerFactory) {
        let Some(pending) = self.pending.as_mut() else {
            warn!("register_player called outside a plugin load");
            return;
        };
        if pending.player_factory.replace(factory).is_some() {
            pending.error = Some(RegistrationError::Duplicate {
                name: pending.name.clone(),
                what: "player factory",
            });
        }
    }

    fn register_tank_algorithm(&mut self, factory: TankAlgorithmFactory) {
        let Some(pending) = self.pending.as_mut() else {
            warn!("register_tank_algorithm called outside a plugin load");
            return;
        };
        if pending.tank_factory.replace(factory).is_some() {
            pending.error = Some(RegistrationError::Duplicate {
                name: pending.name.clone(),
                what: "tank algorithm factory",
            });
        }
    }

    fn register_game_manager(&mut self, _factory: GameManagerFactory) {
        if let Some(pending) = self.pending.as_mut() {
            pending.error = Some(RegistrationError::Unexpected {
                name: pending.name.clone(),
                what: "game manager factory",
            });
        }
    }
}

/// Committed game-manager plugin.
pub struct GameManagerEntry {
    name: String,
    factory: GameManagerFactory,
}

impl GameManagerEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self, verbose: bool) -> Box<dyn GameManager> {
        (self.factory)(verbose)
    }
}

struct PendingGameManager {
    name: String,
    factory: Option<GameManagerFactory>,
    error: Option<RegistrationError>,
}

/// Ordered registry of game-manager plugins.
#[derive(Default)]
pub struct GameManagerRegistrar {
    entries: Vec<Arc<GameManagerEntry>>,
    pending: Option<PendingGameManager>,
}

impl GameManagerRegistrar {
    pub fn new() -> GameManagerRegistrar {
        GameManagerRegistrar::default()
    }

    pub fn begin_registration(&mut self, name: &str) {
        if self.pending.is_some() {
            warn!(name, "previous registration was never finished, dropping it");
        }
        self.pending = Some(PendingGameManager { name: name.to_string(), factory: None, error: None });
    }

    pub fn finish_registration(&mut self) -> Result<(), RegistrationError> {
        let pending = self.pending.take().ok_or(RegistrationError::NotStarted)?;
        if let Some(error) = pending.error {
            return Err(error);
        }
        let name = pending.name;
        let Some(factory) = pending.factory else {
            return Err(RegistrationError::Missing { name, what: "game manager factory" });
        };
        self.entries.push(Arc::new(GameManagerEntry { name, factory }));
        Ok(())
    }

    /// Drop the pending entry without committing (library failed to load).
    pub fn abort_pending(&mut self) {
        self.pending = None;
    }

    pub fn entries(&self) -> &[Arc<GameManagerEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PluginRegistrar for GameManagerRegistrar {
    fn register_player(&mut self, _factory: PlayerFactory) {
        if let Some(pending) = self.pending.as_mut() {
            pending.error = Some(RegistrationError::Unexpected {
                name: pending.name.clone(),
                what: "player factory",
            });
        }
    }

    fn register_tank_algorithm(&mut self, _factory: TankAlgorithmFactory) {
        if let Some(pending) = self.pending.as_mut() {
            pending.error = Some(RegistrationError::Unexpected {
                name: pending.name.clone(),
                what: "tank algorithm factory",
            });
        }
    }

    fn register_game_manager(&mut self, factory: GameManagerFactory) {
        let Some(pending) = self.pending.as_mut() else {
            warn!("register_game_manager called outside a plugin load");
            return;
        };
        if pending.factory.replace(factory).is_some() {
            pending.error = Some(RegistrationError::Duplicate {
                name: pending.name.clone(),
                what: "game manager factory",
            });
        }
    }
}

//! Fixtures for exercising the scheduler with in-process registered plugins.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use battle_interface::plugin::PluginRegistrar;
use battle_interface::{
    ActionRequest, BattleInfo, BoardSnapshot, GameManager, GameOverReason, GameResult, Player,
    SatelliteView, TankAlgorithm, TankAlgorithmFactory,
};
use tank_harness::registry::{AlgorithmRegistrar, GameManagerRegistrar};
use tank_referee::manager::RefereeGameManager;

pub struct ScriptedTank {
    script: Vec<ActionRequest>,
    cursor: usize,
}

impl ScriptedTank {
    pub fn new(script: Vec<ActionRequest>) -> ScriptedTank {
        ScriptedTank { script, cursor: 0 }
    }
}

impl TankAlgorithm for ScriptedTank {
    fn get_action(&mut self) -> ActionRequest {
        let action = self.script.get(self.cursor).copied().unwrap_or(ActionRequest::DoNothing);
        self.cursor += 1;
        action
    }

    fn update_battle_info(&mut self, _info: &mut dyn BattleInfo) {}
}

pub struct SilentPlayer;

impl Player for SilentPlayer {
    fn update_tank_with_battle_info(
        &mut self,
        _tank: &mut dyn TankAlgorithm,
        _view: &dyn SatelliteView,
    ) {
    }
}

/// Register an algorithm whose tanks replay `script` every match.
pub fn register_scripted_algorithm(
    registrar: &mut AlgorithmRegistrar,
    name: &str,
    script: Vec<ActionRequest>,
) {
    registrar.begin_registration(name);
    registrar.register_player(Box::new(|_, _, _, _, _| Box::new(SilentPlayer)));
    let factory: TankAlgorithmFactory =
        Box::new(move |_, _| Box::new(ScriptedTank::new(script.clone())));
    registrar.register_tank_algorithm(factory);
    registrar.finish_registration().expect("scripted algorithm registers cleanly");
}

/// Register an algorithm whose tanks panic on their first action.
pub fn register_panicking_algorithm(registrar: &mut AlgorithmRegistrar, name: &str) {
    struct PanickingTank;
    impl TankAlgorithm for PanickingTank {
        fn get_action(&mut self) -> ActionRequest {
            panic!("controller crashed");
        }
        fn update_battle_info(&mut self, _info: &mut dyn BattleInfo) {}
    }
    registrar.begin_registration(name);
    registrar.register_player(Box::new(|_, _, _, _, _| Box::new(SilentPlayer)));
    registrar.register_tank_algorithm(Box::new(|_, _| Box::new(PanickingTank)));
    registrar.finish_registration().expect("panicking algorithm registers cleanly");
}

/// Register the reference referee under the given plugin name.
pub fn register_referee(registrar: &mut GameManagerRegistrar, name: &str) {
    registrar.begin_registration(name);
    registrar.register_game_manager(Box::new(|verbose| Box::new(RefereeGameManager::new(verbose))));
    registrar.finish_registration().expect("referee registers cleanly");
}

/// A referee that ignores the match and reports a fixed outcome.
pub struct FixedGameManager {
    pub winner: u8,
}

impl GameManager for FixedGameManager {
    fn run(
        &mut self,
        map_width: usize,
        map_height: usize,
        map: &dyn SatelliteView,
        _map_name: &str,
        _max_steps: usize,
        _num_shells: usize,
        _player1: &mut dyn Player,
        _name1: &str,
        _player2: &mut dyn Player,
        _name2: &str,
        _tank_factory1: &TankAlgorithmFactory,
        _tank_factory2: &TankAlgorithmFactory,
    ) -> GameResult {
        GameResult {
            winner: self.winner,
            reason: GameOverReason::AllTanksDead,
            rounds: 1,
            remaining_tanks: [1, 0],
            game_state: BoardSnapshot::from_fn(map_height, map_width, |x, y| {
                map.get_object_at(x, y)
            }),
        }
    }
}

pub fn register_fixed_game_manager(registrar: &mut GameManagerRegistrar, name: &str, winner: u8) {
    registrar.begin_registration(name);
    registrar.register_game_manager(Box::new(move |_| Box::new(FixedGameManager { winner })));
    registrar.finish_registration().expect("fixed game manager registers cleanly");
}

/// Write a map file and return its path.
pub fn write_map(dir: &Path, file_name: &str, content: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, content).expect("map fixture written");
    path
}

/// A 1x5 map where idle players tie on the step budget.
pub const CALM_MAP: &str = "calm\nRows=1\nCols=5\nMaxSteps=5\nNumShells=3\n1   2\n";

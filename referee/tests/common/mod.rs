//! Scripted fixtures: deterministic players and tank algorithms for driving
//! the engine turn by turn.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use battle_interface::{
    ActionRequest, BattleInfo, BoardSnapshot, Player, SatelliteView, TankAlgorithm,
    TankAlgorithmFactory,
};
use tank_referee::board::Board;
use tank_referee::game_state::GameState;

/// Plays a fixed list of actions, then does nothing forever.
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

/// A player that never interacts with its tanks.
pub struct SilentPlayer;

impl Player for SilentPlayer {
    fn update_tank_with_battle_info(
        &mut self,
        _tank: &mut dyn TankAlgorithm,
        _view: &dyn SatelliteView,
    ) {
    }
}

/// Build a board from one string per row.
pub fn board_from_rows(rows: &[&str]) -> Board {
    let cols = rows[0].len();
    let view = BoardSnapshot::from_fn(rows.len(), cols, |x, y| rows[y].as_bytes()[x] as char);
    let mut board = Board::new(rows.len(), cols);
    board.load_from_view(&view);
    board
}

/// Factory that hands tank `i` of a player the `i`-th script.
pub fn scripted_factory(scripts: Vec<Vec<ActionRequest>>) -> TankAlgorithmFactory {
    Box::new(move |_player, tank_index| {
        let script = scripts.get(tank_index).cloned().unwrap_or_default();
        Box::new(ScriptedTank::new(script))
    })
}

/// Everything a scripted match produced, for assertions.
pub struct MatchOutcome {
    pub transcripts: Vec<String>,
    pub result_text: String,
    pub rounds: usize,
    pub final_state: String,
}

/// Run a whole match with one script per tank per player.
pub fn run_scripted(
    rows: &[&str],
    max_steps: usize,
    num_shells: usize,
    player1_scripts: Vec<Vec<ActionRequest>>,
    player2_scripts: Vec<Vec<ActionRequest>>,
) -> MatchOutcome {
    let board = board_from_rows(rows);
    let mut p1 = SilentPlayer;
    let mut p2 = SilentPlayer;
    let f1 = scripted_factory(player1_scripts);
    let f2 = scripted_factory(player2_scripts);
    let mut state = GameState::new(board, max_steps, num_shells, &mut p1, &mut p2, &f1, &f2);

    let mut transcripts = Vec::new();
    while !state.is_over() {
        transcripts.push(state.advance_one_turn().to_string());
    }
    MatchOutcome {
        transcripts,
        result_text: state.result_text().to_string(),
        rounds: state.turn_count(),
        final_state: state.board_snapshot().render(),
    }
}

/// Battle info carrying the snapshot as text rows; lets tests observe what a
/// player handed its tank.
pub struct GridInfo {
    pub rows: Vec<String>,
}

impl BattleInfo for GridInfo {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Player that forwards the satellite view as a [`GridInfo`].
pub struct RelayPlayer {
    pub rows: usize,
    pub cols: usize,
}

impl Player for RelayPlayer {
    fn update_tank_with_battle_info(
        &mut self,
        tank: &mut dyn TankAlgorithm,
        view: &dyn SatelliteView,
    ) {
        let rows = (0..self.rows)
            .map(|y| (0..self.cols).map(|x| view.get_object_at(x, y)).collect())
            .collect();
        let mut info = GridInfo { rows };
        tank.update_battle_info(&mut info);
    }
}

/// Tank that asks for battle info once and records what it received.
pub struct ObservingTank {
    seen: Arc<Mutex<Vec<Vec<String>>>>,
    asked: bool,
}

impl ObservingTank {
    pub fn new(seen: Arc<Mutex<Vec<Vec<String>>>>) -> ObservingTank {
        ObservingTank { seen, asked: false }
    }
}

impl TankAlgorithm for ObservingTank {
    fn get_action(&mut self) -> ActionRequest {
        if self.asked {
            ActionRequest::DoNothing
        } else {
            self.asked = true;
            ActionRequest::GetBattleInfo
        }
    }

    fn update_battle_info(&mut self, info: &mut dyn BattleInfo) {
        if let Some(grid) = info.as_any().downcast_ref::<GridInfo>() {
            self.seen.lock().expect("mutex poisoning").push(grid.rows.clone());
        }
    }
}

//! The reference referee: drives the turn engine for one whole match.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use battle_interface::plugin::PluginRegistrar;
use battle_interface::{
    GameManager, GameOverReason, GameResult, Player, SatelliteView, TankAlgorithmFactory,
};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{error, trace};

use crate::board::Board;
use crate::game_state::GameState;

/// Reference full-rules game manager. When `verbose` it writes a per-match
/// transcript file with one line per turn plus the final result line.
pub struct RefereeGameManager {
    verbose: bool,
}

impl RefereeGameManager {
    pub fn new(verbose: bool) -> RefereeGameManager {
        RefereeGameManager { verbose }
    }
}

impl GameManager for RefereeGameManager {
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
    ) -> GameResult {
        trace!(map = map_name, "match started");

        let mut board = Board::new(map_height, map_width);
        board.load_from_view(map);
        let mut state = GameState::new(
            board,
            max_steps,
            num_shells,
            player1,
            player2,
            tank_factory1,
            tank_factory2,
        );

        let mut log = if self.verbose {
            MatchLog::create(map_name, name1, name2)
        } else {
            None
        };

        // a side with no tanks at load means there is nothing to play
        let (p1, p2) = state.alive_counts();
        if p1 > 0 && p2 > 0 {
            while !state.is_over() {
                let report = state.advance_one_turn();
                if let Some(log) = log.as_mut() {
                    log.line(&report.to_string());
                }
            }
        }

        let result = finalize(&state, log.as_mut());
        trace!(map = map_name, winner = result.winner, rounds = result.rounds, "match end");
        result
    }
}

fn finalize(state: &GameState<'_>, log: Option<&mut MatchLog>) -> GameResult {
    let (p1, p2) = state.alive_counts();

    let (winner, reason) = if p1 == 0 && p2 == 0 {
        (0, GameOverReason::AllTanksDead)
    } else if p1 == 0 {
        (2, GameOverReason::AllTanksDead)
    } else if p2 == 0 {
        (1, GameOverReason::AllTanksDead)
    } else if state.result_text().contains("zero shells") {
        (0, GameOverReason::ZeroShells)
    } else {
        (0, GameOverReason::MaxSteps)
    };

    // on early termination the engine never produced a result line
    let final_line = if state.result_text().is_empty() {
        if p1 == 0 && p2 == 0 {
            "Tie, both players have zero tanks".to_string()
        } else if p1 == 0 {
            format!("Player 2 won with {p2} tanks still alive")
        } else {
            format!("Player 1 won with {p1} tanks still alive")
        }
    } else {
        state.result_text().to_string()
    };
    if let Some(log) = log {
        log.line(&final_line);
    }

    GameResult {
        winner,
        reason,
        rounds: state.turn_count(),
        remaining_tanks: [p1, p2],
        game_state: state.board_snapshot(),
    }
}

/// Per-match transcript appender. All writes stay on the match's own worker
/// thread; nothing is shared.
struct MatchLog {
    writer: BufWriter<File>,
}

impl MatchLog {
    fn create(map_name: &str, name1: &str, name2: &str) -> Option<MatchLog> {
        let file_name = format!(
            "log_{}_{}_vs_{}_{}.txt",
            base_name(map_name),
            base_name(name1),
            base_name(name2),
            timestamp()
        );
        match File::create(&file_name) {
            Ok(file) => Some(MatchLog { writer: BufWriter::new(file) }),
            Err(err) => {
                error!(file = file_name, %err, "cannot create match transcript");
                None
            }
        }
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.writer, "{text}");
        let _ = self.writer.flush();
    }
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn timestamp() -> String {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).unwrap_or_else(|_| "00000000_000000".to_string())
}

/// Plugin entry: lets the harness load this crate's `cdylib` like any other
/// game-manager plugin.
#[no_mangle]
pub extern "Rust" fn tank_plugin_entry(registrar: &mut dyn PluginRegistrar) {
    registrar.register_game_manager(Box::new(|verbose| Box::new(RefereeGameManager::new(verbose))));
}

//! The deterministic turn engine.
//!
//! One [`GameState`] owns everything mutable about a match: the board, the
//! tanks in row-major discovery order, the shells in flight and the turn
//! counter. [`GameState::advance_one_turn`] runs the fixed phase schedule;
//! nothing in here blocks, suspends or consults anything outside the match.

use std::collections::HashMap;
use std::fmt;

use battle_interface::{ActionRequest, BoardSnapshot, Player, TankAlgorithmFactory};
use tracing::debug;

use crate::board::{Board, CellContent};
use crate::satellite::{self, SatelliteSnapshot};
use crate::tank::{Shell, TankState};

/// Turns a tank must wait after firing before it can fire again.
const SHOOT_COOLDOWN: u8 = 4;
/// Delay counter for a fresh backward request: the request turn and the next
/// are idle, the move fires on the third turn.
const FIRST_BACKWARD_DELAY: u8 = 3;
/// Delay counter for a backward request right after an executed backward:
/// one idle turn, then the move fires.
const REPEAT_BACKWARD_DELAY: u8 = 1;
/// Consecutive all-quiet turns (no side holding any shells) that end the
/// match in a tie.
const ZERO_SHELL_STALL_TURNS: usize = 40;

/// Per-tank transcript of one turn, in tank index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    entries: Vec<String>,
}

impl TurnReport {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for TurnReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entries.join(", "))
    }
}

/// Full rules engine for one match.
pub struct GameState<'m> {
    board: Board,
    tanks: Vec<TankState>,
    algorithms: Vec<Box<dyn battle_interface::TankAlgorithm>>,
    shells: Vec<Shell>,
    player1: &'m mut dyn Player,
    player2: &'m mut dyn Player,
    turn: usize,
    max_steps: usize,
    zero_shell_streak: usize,
    over: bool,
    result_text: String,
}

impl<'m> GameState<'m> {
    /// Scan the board for tanks (row-major, fixing the order used by every
    /// per-turn vector and transcript) and create one algorithm per tank
    /// through the owning player's factory.
    pub fn new(
        board: Board,
        max_steps: usize,
        num_shells: usize,
        player1: &'m mut dyn Player,
        player2: &'m mut dyn Player,
        factory1: &TankAlgorithmFactory,
        factory2: &TankAlgorithmFactory,
    ) -> GameState<'m> {
        let mut tanks = Vec::new();
        let mut algorithms = Vec::new();
        let mut next_index = [0usize; 2];
        for y in 0..board.rows() {
            for x in 0..board.cols() {
                let player_index = match board.cell(x, y).content {
                    CellContent::Tank1 => 1,
                    CellContent::Tank2 => 2,
                    _ => continue,
                };
                let tank_index = next_index[player_index - 1];
                next_index[player_index - 1] += 1;
                tanks.push(TankState::new(player_index, tank_index, x, y, num_shells));
                let factory = if player_index == 1 { factory1 } else { factory2 };
                algorithms.push(factory(player_index, tank_index));
            }
        }
        debug!(
            tanks = tanks.len(),
            rows = board.rows(),
            cols = board.cols(),
            "engine initialized"
        );
        GameState {
            board,
            tanks,
            algorithms,
            shells: Vec::new(),
            player1,
            player2,
            turn: 0,
            max_steps,
            zero_shell_streak: 0,
            over: false,
            result_text: String::new(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    pub fn turn_count(&self) -> usize {
        self.turn
    }

    pub fn tanks(&self) -> &[TankState] {
        &self.tanks
    }

    /// Alive tanks per player as `(player1, player2)`.
    pub fn alive_counts(&self) -> (usize, usize) {
        let p1 = self.tanks.iter().filter(|t| t.alive && t.player_index == 1).count();
        let p2 = self.tanks.iter().filter(|t| t.alive && t.player_index == 2).count();
        (p1, p2)
    }

    /// Owning snapshot of the current board with shells overlaid.
    pub fn board_snapshot(&self) -> BoardSnapshot {
        let shells = satellite::shell_positions(&self.shells);
        BoardSnapshot::from_fn(self.board.rows(), self.board.cols(), |x, y| {
            satellite::render_cell(&self.board, &shells, x, y)
        })
    }

    /// Run exactly one turn and return its transcript. A no-op once the
    /// match is over.
    pub fn advance_one_turn(&mut self) -> TurnReport {
        if self.over {
            return TurnReport { entries: Vec::new() };
        }
        let n = self.tanks.len();
        let mut actions = vec![ActionRequest::DoNothing; n];
        let mut ignored = vec![false; n];

        // 1+2: gather requests, mediating battle info on the spot
        for k in 0..n {
            if !self.tanks[k].alive {
                continue;
            }
            let request = self.algorithms[k].get_action();
            if request == ActionRequest::GetBattleInfo {
                let view = SatelliteSnapshot::of_board(
                    &self.board,
                    &self.shells,
                    Some((self.tanks[k].x, self.tanks[k].y)),
                );
                let player_index = self.tanks[k].player_index;
                let algorithm = self.algorithms[k].as_mut();
                if player_index == 1 {
                    self.player1.update_tank_with_battle_info(algorithm, &view);
                } else {
                    self.player2.update_tank_with_battle_info(algorithm, &view);
                }
            }
            actions[k] = request;
        }
        // transcripts always show the raw requests
        let log_actions = actions.clone();

        self.apply_backward_delay(&mut actions, &mut ignored);
        self.apply_rotations(&actions);
        self.resolve_tank_mines();
        self.move_shells();
        self.resolve_shooting(&actions, &mut ignored);
        self.resolve_movement(&actions, &mut ignored);
        self.refresh_shell_overlays();
        self.check_end_conditions();

        self.turn += 1;
        for tank in &mut self.tanks {
            if tank.shoot_cooldown > 0 {
                tank.shoot_cooldown -= 1;
            }
        }

        self.transcript(&log_actions, &ignored)
    }

    /// Phase 3: the backward-move delay machine.
    ///
    /// A fresh backward request idles the request turn plus one more turn and
    /// fires on the third; a backward requested right after an executed one
    /// idles a single turn. While a move is pending, forward cancels it,
    /// battle info passes through, and everything else idles as ignored.
    fn apply_backward_delay(&mut self, actions: &mut [ActionRequest], ignored: &mut [bool]) {
        for (k, tank) in self.tanks.iter_mut().enumerate() {
            if !tank.alive {
                continue;
            }
            let requested = actions[k];
            if tank.backward_delay > 0 {
                tank.backward_delay -= 1;
                if tank.backward_delay <= 1 {
                    // pending move fires now, whatever was requested
                    tank.backward_delay = 0;
                    tank.last_backward_exec = true;
                    actions[k] = ActionRequest::MoveBackward;
                    ignored[k] = true;
                } else if requested == ActionRequest::MoveForward {
                    tank.backward_delay = 0;
                    tank.last_backward_exec = false;
                    actions[k] = ActionRequest::DoNothing;
                } else if requested == ActionRequest::GetBattleInfo {
                    // handled in phase 2, never ignored
                } else {
                    actions[k] = ActionRequest::DoNothing;
                    ignored[k] = true;
                }
                continue;
            }
            if requested == ActionRequest::MoveBackward {
                tank.backward_delay = if tank.last_backward_exec {
                    REPEAT_BACKWARD_DELAY
                } else {
                    FIRST_BACKWARD_DELAY
                };
                tank.last_backward_exec = false;
                actions[k] = ActionRequest::DoNothing;
            } else {
                tank.last_backward_exec = false;
            }
        }
    }

    /// Phase 4.
    fn apply_rotations(&mut self, actions: &[ActionRequest]) {
        for (k, tank) in self.tanks.iter_mut().enumerate() {
            if !tank.alive {
                continue;
            }
            let steps = match actions[k] {
                ActionRequest::RotateLeft90 => -2,
                ActionRequest::RotateRight90 => 2,
                ActionRequest::RotateLeft45 => -1,
                ActionRequest::RotateRight45 => 1,
                _ => continue,
            };
            tank.direction = tank.direction.rotated(steps);
        }
    }

    /// Phase 5: a tank standing on a mine dies and consumes the mine.
    fn resolve_tank_mines(&mut self) {
        for tank in &mut self.tanks {
            if !tank.alive {
                continue;
            }
            let cell = self.board.cell_mut(tank.x, tank.y);
            if cell.content == CellContent::Mine {
                tank.alive = false;
                cell.content = CellContent::Empty;
            }
        }
    }

    /// Phase 6: every shell advances two cells, one sub-step at a time.
    fn move_shells(&mut self) {
        self.board.clear_shell_marks();
        for _ in 0..2 {
            self.shell_substep();
        }
    }

    fn shell_substep(&mut self) {
        let count = self.shells.len();
        if count == 0 {
            return;
        }
        let old: Vec<(usize, usize)> = self.shells.iter().map(|s| (s.x, s.y)).collect();
        let next: Vec<(usize, usize)> = self
            .shells
            .iter()
            .map(|s| {
                let (dx, dy) = s.dir.delta();
                self.board.wrap(s.x as i32 + dx, s.y as i32 + dy)
            })
            .collect();
        let mut destroyed = vec![false; count];

        // shells swapping cells pass through each other and annihilate
        for i in 0..count {
            for j in i + 1..count {
                if next[i] == old[j] && next[j] == old[i] {
                    destroyed[i] = true;
                    destroyed[j] = true;
                }
            }
        }

        for i in 0..count {
            if destroyed[i] {
                continue;
            }
            let (nx, ny) = next[i];
            self.shells[i].x = nx;
            self.shells[i].y = ny;
            if self.shell_impact(nx, ny) {
                destroyed[i] = true;
            }
        }

        // two or more surviving shells on one cell destroy all of them
        let mut occupied: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for i in 0..count {
            if !destroyed[i] {
                occupied.entry((self.shells[i].x, self.shells[i].y)).or_default().push(i);
            }
        }
        for (_, ids) in occupied {
            if ids.len() > 1 {
                for i in ids {
                    destroyed[i] = true;
                }
            }
        }

        let mut index = 0;
        self.shells.retain(|_| {
            let keep = !destroyed[index];
            index += 1;
            keep
        });
    }

    /// Resolve a shell arriving at `(x, y)`; returns whether it is consumed.
    /// Walls erode on the second hit, tanks die, mines are passed over.
    fn shell_impact(&mut self, x: usize, y: usize) -> bool {
        match self.board.cell(x, y).content {
            CellContent::Wall => {
                let cell = self.board.cell_mut(x, y);
                cell.wall_hits += 1;
                if cell.wall_hits >= 2 {
                    cell.content = CellContent::Empty;
                    cell.wall_hits = 0;
                }
                true
            }
            CellContent::Tank1 | CellContent::Tank2 => {
                self.board.set_cell(x, y, CellContent::Empty);
                if let Some(tank) = self.tanks.iter_mut().find(|t| t.alive && t.x == x && t.y == y) {
                    tank.alive = false;
                }
                true
            }
            _ => false,
        }
    }

    /// Phase 7.
    fn resolve_shooting(&mut self, actions: &[ActionRequest], ignored: &mut [bool]) {
        for k in 0..self.tanks.len() {
            if !self.tanks[k].alive || actions[k] != ActionRequest::Shoot {
                continue;
            }
            if self.tanks[k].shoot_cooldown > 0 {
                ignored[k] = true;
                continue;
            }
            if self.tanks[k].shells_left == 0 {
                ignored[k] = true;
                continue;
            }
            self.tanks[k].shells_left -= 1;
            self.tanks[k].shoot_cooldown = SHOOT_COOLDOWN;
            let dir = self.tanks[k].direction;
            let (dx, dy) = dir.delta();
            let (sx, sy) = self
                .board
                .wrap(self.tanks[k].x as i32 + dx, self.tanks[k].y as i32 + dy);
            // a wall or tank on the spawn cell takes the hit immediately
            if !self.shell_impact(sx, sy) {
                self.shells.push(Shell { x: sx, y: sy, dir });
            }
        }
    }

    /// Phase 8: tank movement and tank-tank collision resolution, computed
    /// over the `(old, next)` position arrays.
    fn resolve_movement(&mut self, actions: &[ActionRequest], ignored: &mut [bool]) {
        let n = self.tanks.len();
        self.board.clear_tank_marks();

        let mut old = Vec::with_capacity(n);
        let mut next = Vec::with_capacity(n);
        for k in 0..n {
            let tank = &self.tanks[k];
            old.push((tank.x, tank.y));
            let moving = tank.alive
                && matches!(actions[k], ActionRequest::MoveForward | ActionRequest::MoveBackward);
            if !moving {
                next.push((tank.x, tank.y));
                continue;
            }
            let dir = if actions[k] == ActionRequest::MoveBackward {
                tank.direction.opposite()
            } else {
                tank.direction
            };
            let (dx, dy) = dir.delta();
            let (nx, ny) = self.board.wrap(tank.x as i32 + dx, tank.y as i32 + dy);
            if self.board.cell(nx, ny).content == CellContent::Wall {
                // blocked; the tank counts as stationary for the rules below
                ignored[k] = true;
                next.push((tank.x, tank.y));
            } else {
                next.push((nx, ny));
            }
        }

        let mut killed = vec![false; n];

        // head-on swaps
        for i in 0..n {
            for j in i + 1..n {
                if !self.tanks[i].alive || !self.tanks[j].alive || killed[i] || killed[j] {
                    continue;
                }
                if next[i] == old[j] && next[j] == old[i] {
                    killed[i] = true;
                    killed[j] = true;
                    self.tanks[i].alive = false;
                    self.tanks[j].alive = false;
                }
            }
        }

        // a mover reaching a stationary tank's cell kills both
        for k in 0..n {
            if !self.tanks[k].alive || killed[k] || next[k] == old[k] {
                continue;
            }
            for j in 0..n {
                if j == k || !self.tanks[j].alive || killed[j] || next[j] != old[j] {
                    continue;
                }
                if next[k] == old[j] {
                    killed[k] = true;
                    killed[j] = true;
                    self.tanks[k].alive = false;
                    self.tanks[j].alive = false;
                }
            }
        }

        // any destination cell with two or more movers kills them all
        let mut destinations: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for k in 0..n {
            if !self.tanks[k].alive || killed[k] || next[k] == old[k] {
                continue;
            }
            destinations.entry(next[k]).or_default().push(k);
        }
        for (_, movers) in destinations {
            if movers.len() > 1 {
                for k in movers {
                    killed[k] = true;
                    self.tanks[k].alive = false;
                }
            }
        }

        // apply surviving moves and re-stamp tank markers
        for k in 0..n {
            if !self.tanks[k].alive {
                continue;
            }
            let (nx, ny) = next[k];
            if (nx, ny) != old[k] {
                if let Some(s) = self.shells.iter().position(|s| (s.x, s.y) == (nx, ny)) {
                    let _ = self.shells.remove(s);
                    self.tanks[k].alive = false;
                    continue;
                }
                if self.board.cell(nx, ny).content == CellContent::Mine {
                    self.board.set_cell(nx, ny, CellContent::Empty);
                    self.tanks[k].alive = false;
                    continue;
                }
                self.tanks[k].x = nx;
                self.tanks[k].y = ny;
            }
            let content = if self.tanks[k].player_index == 1 {
                CellContent::Tank1
            } else {
                CellContent::Tank2
            };
            self.board.set_cell(self.tanks[k].x, self.tanks[k].y, content);
        }
    }

    /// Phase 9 (first half): mark surviving shells for rendering.
    fn refresh_shell_overlays(&mut self) {
        for shell in &self.shells {
            self.board.cell_mut(shell.x, shell.y).shell_overlay = true;
        }
    }

    /// Phase 9 (second half): terminal checks in fixed precedence.
    fn check_end_conditions(&mut self) {
        let (p1, p2) = self.alive_counts();
        let total_shells: usize = self
            .tanks
            .iter()
            .filter(|t| t.alive)
            .map(|t| t.shells_left)
            .sum();
        if total_shells == 0 {
            self.zero_shell_streak += 1;
        } else {
            self.zero_shell_streak = 0;
        }

        if p1 == 0 && p2 == 0 {
            self.over = true;
            self.result_text = "Tie, both players have zero tanks".to_string();
        } else if p1 == 0 {
            self.over = true;
            self.result_text = format!("Player 2 won with {p2} tanks still alive");
        } else if p2 == 0 {
            self.over = true;
            self.result_text = format!("Player 1 won with {p1} tanks still alive");
        } else if self.zero_shell_streak >= ZERO_SHELL_STALL_TURNS {
            self.over = true;
            self.result_text =
                format!("Tie, both players have zero shells for {ZERO_SHELL_STALL_TURNS} steps");
        } else if self.turn + 1 >= self.max_steps {
            self.over = true;
            self.result_text = format!(
                "Tie, reached max steps = {}, player 1 has {p1} tanks, player 2 has {p2} tanks",
                self.max_steps
            );
        }
        if self.over {
            debug!(turn = self.turn, result = %self.result_text, "match over");
        }
    }

    /// Per-turn transcript, one entry per tank in index order.
    fn transcript(&self, log_actions: &[ActionRequest], ignored: &[bool]) -> TurnReport {
        let entries = log_actions
            .iter()
            .enumerate()
            .map(|(k, action)| {
                if self.tanks[k].alive {
                    if ignored[k] && *action != ActionRequest::GetBattleInfo {
                        format!("{action} (ignored)")
                    } else {
                        action.to_string()
                    }
                } else if *action == ActionRequest::DoNothing {
                    "killed".to_string()
                } else {
                    format!("{action} (killed)")
                }
            })
            .collect();
        TurnReport { entries }
    }
}

//! Per-match mutable state of tanks and shells.

use crate::direction::Direction;

/// Live state of one tank. The vector order of tanks inside the engine is
/// row-major discovery order and stays fixed for the whole match; it fixes
/// both action ordering and transcript ordering.
#[derive(Debug, Clone)]
pub struct TankState {
    /// Owning player, 1 or 2.
    pub player_index: usize,
    /// Per-player tank number, starting at 0 in discovery order.
    pub tank_index: usize,
    pub x: usize,
    pub y: usize,
    pub direction: Direction,
    pub alive: bool,
    pub shells_left: usize,
    /// Turns left before another shot can fire.
    pub shoot_cooldown: u8,
    /// Pending backward-move countdown; 0 means no backward is pending.
    pub backward_delay: u8,
    /// Set while the previous executed action was a backward move, enabling
    /// the shortened delay for back-to-back backward requests.
    pub last_backward_exec: bool,
}

impl TankState {
    pub fn new(player_index: usize, tank_index: usize, x: usize, y: usize, num_shells: usize) -> TankState {
        let direction = if player_index == 1 {
            Direction::West
        } else {
            Direction::East
        };
        TankState {
            player_index,
            tank_index,
            x,
            y,
            direction,
            alive: true,
            shells_left: num_shells,
            shoot_cooldown: 0,
            backward_delay: 0,
            last_backward_exec: false,
        }
    }
}

/// A shell in flight. Shells move two cells per turn and carry no state
/// beyond position and heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    pub x: usize,
    pub y: usize,
    pub dir: Direction,
}

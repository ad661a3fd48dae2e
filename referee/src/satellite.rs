//! Owning board snapshots handed to players.

use std::collections::HashSet;

use battle_interface::SatelliteView;

use crate::board::{Board, CellContent};
use crate::tank::Shell;

/// Render one cell with the shell > tank > wall > mine > empty priority.
pub(crate) fn render_cell(board: &Board, shells: &HashSet<(usize, usize)>, x: usize, y: usize) -> char {
    if shells.contains(&(x, y)) {
        return '*';
    }
    match board.cell(x, y).content {
        CellContent::Wall => '#',
        CellContent::Mine => '@',
        CellContent::Tank1 => '1',
        CellContent::Tank2 => '2',
        CellContent::Empty => ' ',
    }
}

pub(crate) fn shell_positions(shells: &[Shell]) -> HashSet<(usize, usize)> {
    shells.iter().map(|s| (s.x, s.y)).collect()
}

/// Immutable mid-match view of the board. The grid is copied out of the live
/// board at construction; nothing borrows into the engine afterwards.
#[derive(Debug, Clone)]
pub struct SatelliteSnapshot {
    rows: usize,
    cols: usize,
    grid: Vec<char>,
}

impl SatelliteSnapshot {
    /// Snapshot the board with shells overlaid. When `marked` names a cell it
    /// is overwritten with `'%'`, marking the querying tank.
    pub fn of_board(board: &Board, shells: &[Shell], marked: Option<(usize, usize)>) -> SatelliteSnapshot {
        let rows = board.rows();
        let cols = board.cols();
        let shells = shell_positions(shells);
        let mut grid = Vec::with_capacity(rows * cols);
        for y in 0..rows {
            for x in 0..cols {
                grid.push(render_cell(board, &shells, x, y));
            }
        }
        if let Some((mx, my)) = marked {
            grid[my * cols + mx] = '%';
        }
        SatelliteSnapshot { rows, cols, grid }
    }
}

impl SatelliteView for SatelliteSnapshot {
    fn get_object_at(&self, x: usize, y: usize) -> char {
        if x >= self.cols || y >= self.rows {
            return '&';
        }
        self.grid[y * self.cols + x]
    }
}

//! Eight-way facing on the toroidal grid.

/// Compass direction, index 0 = north, stepping clockwise by 45°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    /// All directions in index order.
    const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn from_index(index: u8) -> Direction {
        Self::ALL[(index & 7) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Unit step `(dx, dy)` with y growing downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// Rotate by `steps` 45° increments, positive = clockwise.
    pub fn rotated(self, steps: i8) -> Direction {
        let index = (self as u8 as i8 + steps).rem_euclid(8) as u8;
        Direction::from_index(index)
    }

    pub fn opposite(self) -> Direction {
        self.rotated(4)
    }
}

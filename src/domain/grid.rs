/// Tile-grid addressing.
///
/// Rows grow downward, columns grow to the right. Coordinates are signed
/// so a candidate step may leave the grid; `GridMatrix::contains` decides
/// whether it is playable.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub const fn new(row: i32, col: i32) -> Self {
        Coordinate { row, col }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dr, dc) = dir.delta();
        Coordinate { row: self.row + dr, col: self.col + dc }
    }

    pub fn above(self) -> Self {
        Coordinate { row: self.row - 1, col: self.col }
    }

    pub fn below(self) -> Self {
        Coordinate { row: self.row + 1, col: self.col }
    }

    /// Manhattan distance.
    pub fn distance(self, other: Coordinate) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Logical direction of a press. Origin (key, pad, touch) is irrelevant here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit delta as (row, col).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (0, 1),
            Direction::Left  => (0, -1),
            Direction::Up    => (-1, 0),
            Direction::Down  => (1, 0),
        }
    }
}

/// Grid dimensions, fixed for a loaded level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridMatrix {
    pub rows: usize,
    pub cols: usize,
}

impl GridMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        GridMatrix { rows, cols }
    }

    pub fn contains(&self, at: Coordinate) -> bool {
        at.row >= 0 && at.col >= 0
            && (at.row as usize) < self.rows
            && (at.col as usize) < self.cols
    }
}

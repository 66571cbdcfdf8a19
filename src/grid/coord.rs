use cgmath::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer step between two cells.
pub type Offset = Vector2<i32>;

/// The coordinates of a grid cell. Two cells are the same cell iff their coordinates are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

/// A lane direction. `Up` is towards increasing `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The set of cells considered adjacent to a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Neighborhood {
    /// The four orthogonal neighbours.
    Orthogonal,
    /// The orthogonal neighbours plus the four diagonals.
    Moore,
}

/// The orthogonal offsets, in the order neighbours are visited.
static ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// The diagonal offsets.
static DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

impl Coord {
    /// Creates a new coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The Manhattan distance between two coordinates.
    pub fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The coordinate one step away in the given direction.
    pub fn step(self, dir: Direction) -> Coord {
        self + dir.offset()
    }

    /// Whether `other` is one orthogonal or one diagonal step away.
    pub fn is_adjacent(self, other: Coord) -> bool {
        let d = other - self;
        d != Offset::new(0, 0) && d.x.abs() <= 1 && d.y.abs() <= 1
    }

    /// The candidate neighbours of this cell, which may lie outside any grid.
    pub(crate) fn around(self, mode: Neighborhood) -> impl Iterator<Item = Coord> {
        let diagonals = match mode {
            Neighborhood::Orthogonal => &DIAGONAL[..0],
            Neighborhood::Moore => &DIAGONAL[..],
        };
        ORTHOGONAL
            .iter()
            .chain(diagonals)
            .map(move |(dx, dy)| self + Offset::new(*dx, *dy))
    }
}

impl std::ops::Add<Offset> for Coord {
    type Output = Coord;

    fn add(self, rhs: Offset) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Coord {
    type Output = Offset;

    fn sub(self, rhs: Coord) -> Offset {
        Offset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord::new(x, y)
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// The unit offset of a single step in this direction.
    pub fn offset(self) -> Offset {
        match self {
            Direction::Up => Offset::new(0, 1),
            Direction::Down => Offset::new(0, -1),
            Direction::Left => Offset::new(-1, 0),
            Direction::Right => Offset::new(1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Whether the direction runs along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// The two directions perpendicular to this one.
    pub fn perpendicular(self) -> [Direction; 2] {
        if self.is_horizontal() {
            [Direction::Up, Direction::Down]
        } else {
            [Direction::Left, Direction::Right]
        }
    }

    /// The direction of an orthogonal unit offset, or `None` for any other offset.
    pub fn from_offset(offset: Offset) -> Option<Direction> {
        match (offset.x, offset.y) {
            (0, 1) => Some(Direction::Up),
            (0, -1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    /// Splits a unit step into its horizontal and vertical components.
    pub fn components(offset: Offset) -> (Option<Direction>, Option<Direction>) {
        (
            Direction::from_offset(Offset::new(offset.x.signum(), 0)),
            Direction::from_offset(Offset::new(0, offset.y.signum())),
        )
    }
}

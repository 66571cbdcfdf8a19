use crate::config::COST_SCALE;
use crate::Coord;

/// A planned sequence of cells, from the cell it was computed from to the goal inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    cells: Vec<Coord>,
    /// The path cost in internal units.
    cost: u32,
}

impl Route {
    pub(crate) fn new(cells: Vec<Coord>, cost: u32) -> Self {
        debug_assert!(!cells.is_empty());
        Self { cells, cost }
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    /// The cost of the route in steps, including lane change and congestion penalties.
    pub fn cost(&self) -> f64 {
        f64::from(self.cost) / f64::from(COST_SCALE)
    }

    pub fn first(&self) -> Option<Coord> {
        self.cells.first().copied()
    }

    pub fn last(&self) -> Option<Coord> {
        self.cells.last().copied()
    }

    /// The number of cells on the route.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }
}

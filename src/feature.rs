use crate::{Coord, Direction, TrafficLightId};
use rand::seq::SliceRandom;
use rand::Rng;

/// A static feature placed on a grid cell when the world is built.
///
/// A cell holds at most one of `Road`, `Destination` or `Obstacle`,
/// and independently may hold a `Light` on top of its `Road`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    /// A one-way lane; the only direction of ordinary forward travel into the cell.
    Road(Direction),
    /// A traffic light, always on top of a road.
    Light(TrafficLightId),
    /// A trip terminus.
    Destination,
    /// Never walkable.
    Obstacle,
}

impl Feature {
    /// Whether this feature excludes the other "base" features from its cell.
    pub(crate) fn is_base(&self) -> bool {
        !matches!(self, Feature::Light(_))
    }
}

/// The set of destination cells in the world, from which vehicles draw their trips.
#[derive(Clone, Debug, Default)]
pub struct DestinationRegistry {
    coords: Vec<Coord>,
}

impl DestinationRegistry {
    pub(crate) fn insert(&mut self, coord: Coord) {
        if !self.coords.contains(&coord) {
            self.coords.push(coord);
        }
    }

    /// Whether the given cell is a destination.
    pub fn contains(&self, coord: Coord) -> bool {
        self.coords.contains(&coord)
    }

    /// Picks a destination uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord> {
        self.coords.choose(rng).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.coords.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

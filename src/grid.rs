//! The spatial grid, its static features and its vehicle occupancy.

pub use coord::{Coord, Direction, Neighborhood, Offset};

use crate::error::GridError;
use crate::feature::Feature;
use crate::light::TrafficLight;
use crate::{TrafficLightId, VehicleId};
use slotmap::SlotMap;
use smallvec::SmallVec;

mod coord;

/// The maximum number of occupants (features and vehicles) a cell can hold.
pub const CELL_CAPACITY: usize = 100;

/// A single grid cell.
#[derive(Clone, Debug)]
pub struct Cell {
    /// The cell's coordinates.
    coord: Coord,
    /// The static features on the cell.
    features: SmallVec<[Feature; 2]>,
    /// The vehicles currently on the cell.
    vehicles: SmallVec<[VehicleId; 1]>,
}

/// A rectangular, non-toroidal grid of cells.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    /// The cells in row-major order, starting from `y = 0`.
    cells: Vec<Cell>,
    /// The traffic lights placed on the grid.
    lights: SlotMap<TrafficLightId, TrafficLight>,
}

impl Cell {
    fn new(coord: Coord) -> Self {
        Self {
            coord,
            features: SmallVec::new(),
            vehicles: SmallVec::new(),
        }
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// The static features on the cell.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The direction of the road on this cell, if there is one.
    pub fn road(&self) -> Option<Direction> {
        self.features.iter().find_map(|f| match f {
            Feature::Road(dir) => Some(*dir),
            _ => None,
        })
    }

    /// The traffic light on this cell, if there is one.
    pub fn light(&self) -> Option<TrafficLightId> {
        self.features.iter().find_map(|f| match f {
            Feature::Light(id) => Some(*id),
            _ => None,
        })
    }

    pub fn has_road(&self) -> bool {
        self.road().is_some()
    }

    pub fn has_light(&self) -> bool {
        self.light().is_some()
    }

    pub fn has_destination(&self) -> bool {
        self.features.contains(&Feature::Destination)
    }

    pub fn has_obstacle(&self) -> bool {
        self.features.contains(&Feature::Obstacle)
    }

    pub fn has_vehicle(&self) -> bool {
        !self.vehicles.is_empty()
    }

    /// The vehicle on this cell, if there is one.
    pub fn vehicle(&self) -> Option<VehicleId> {
        self.vehicles.first().copied()
    }

    pub fn vehicles(&self) -> &[VehicleId] {
        &self.vehicles
    }

    fn occupants(&self) -> usize {
        self.features.len() + self.vehicles.len()
    }
}

impl Grid {
    /// Creates an empty grid.
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let cells = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| Cell::new(Coord::new(x, y))))
            .collect();
        Self {
            width,
            height,
            cells,
            lights: SlotMap::with_key(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the coordinate lies on the grid.
    pub fn contains(&self, coord: Coord) -> bool {
        self.index(coord).is_some()
    }

    /// The linear index of a cell, which is stable for the lifetime of the grid.
    pub(crate) fn index(&self, coord: Coord) -> Option<usize> {
        let x = u32::try_from(coord.x).ok().filter(|x| *x < self.width)?;
        let y = u32::try_from(coord.y).ok().filter(|y| *y < self.height)?;
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Gets the cell at the given coordinates, or `None` if they are off the grid.
    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.index(coord).map(|idx| &self.cells[idx])
    }

    fn cell_mut(&mut self, coord: Coord) -> Result<&mut Cell, GridError> {
        match self.index(coord) {
            Some(idx) => Ok(&mut self.cells[idx]),
            None => Err(GridError::OutOfBounds { coord }),
        }
    }

    /// Returns an iterator over every cell of the grid.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// The neighbours of a cell which lie on the grid.
    pub fn neighbors(&self, coord: Coord, mode: Neighborhood) -> SmallVec<[Coord; 8]> {
        coord
            .around(mode)
            .filter(|n| self.contains(*n))
            .collect()
    }

    /// The road direction at the given cell, if any.
    pub fn road(&self, coord: Coord) -> Option<Direction> {
        self.cell(coord).and_then(Cell::road)
    }

    /// The vehicle at the given cell, if any.
    pub fn vehicle_at(&self, coord: Coord) -> Option<VehicleId> {
        self.cell(coord).and_then(Cell::vehicle)
    }

    pub fn has_vehicle(&self, coord: Coord) -> bool {
        self.cell(coord).map_or(false, Cell::has_vehicle)
    }

    /// Whether the cell holds a traffic light which is currently red.
    pub fn is_red(&self, coord: Coord) -> bool {
        self.cell(coord)
            .and_then(Cell::light)
            .map_or(false, |id| self.lights[id].is_red())
    }

    /// Gets a reference to the traffic light with the given ID.
    pub fn light(&self, id: TrafficLightId) -> &TrafficLight {
        &self.lights[id]
    }

    /// Returns an iterator over all the traffic lights.
    pub fn lights(&self) -> impl Iterator<Item = (TrafficLightId, &TrafficLight)> {
        self.lights.iter()
    }

    /// Places a static feature on a cell.
    pub(crate) fn add_feature(&mut self, coord: Coord, feature: Feature) -> Result<(), GridError> {
        let cell = self.cell_mut(coord)?;
        if cell.occupants() >= CELL_CAPACITY {
            return Err(GridError::CellFull { coord });
        }
        cell.features.push(feature);
        Ok(())
    }

    /// Places a traffic light on a cell.
    pub(crate) fn add_light(
        &mut self,
        coord: Coord,
        green: bool,
        period: u32,
    ) -> Result<TrafficLightId, GridError> {
        self.cell_mut(coord)?;
        let id = self.lights.insert(TrafficLight::new(coord, green, period));
        if let Err(err) = self.add_feature(coord, Feature::Light(id)) {
            self.lights.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Brings every traffic light up to date with the given tick.
    pub(crate) fn update_lights(&mut self, tick: u64) {
        for (_, light) in &mut self.lights {
            light.update(tick);
        }
    }

    /// Adds a vehicle to a cell.
    pub(crate) fn insert_vehicle(&mut self, coord: Coord, id: VehicleId) -> Result<(), GridError> {
        let cell = self.cell_mut(coord)?;
        if cell.occupants() >= CELL_CAPACITY {
            return Err(GridError::CellFull { coord });
        }
        cell.vehicles.push(id);
        Ok(())
    }

    /// Removes a vehicle from a cell. Returns `true` iff it was there.
    pub(crate) fn remove_vehicle(&mut self, coord: Coord, id: VehicleId) -> bool {
        match self.cell_mut(coord) {
            Ok(cell) => {
                let before = cell.vehicles.len();
                cell.vehicles.retain(|v| *v != id);
                cell.vehicles.len() != before
            }
            Err(_) => false,
        }
    }

    /// Moves a vehicle between two cells. Leaves the grid untouched on failure.
    pub(crate) fn move_vehicle(
        &mut self,
        id: VehicleId,
        from: Coord,
        to: Coord,
    ) -> Result<(), GridError> {
        self.insert_vehicle(to, id)?;
        self.remove_vehicle(from, id);
        Ok(())
    }
}

//! Read-only views of the world for rendering clients.

use crate::{Coord, Direction, Simulation, TrafficLightId, VehicleId};
use serde::Serialize;

/// The identity of a static feature: the linear index of its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellId(pub u32);

/// One entry of a snapshot query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot<I, E = ()> {
    pub id: I,
    pub coord: Coord,
    /// Category-specific data, such as a road's direction.
    pub extra: E,
}

impl Simulation {
    /// The position of every vehicle.
    pub fn vehicle_positions(&self) -> Vec<Snapshot<VehicleId>> {
        self.iter_vehicles()
            .map(|v| Snapshot {
                id: v.id(),
                coord: v.cell(),
                extra: (),
            })
            .collect()
    }

    /// The position of every obstacle.
    pub fn obstacles(&self) -> Vec<Snapshot<CellId>> {
        self.static_cells(|cell| cell.has_obstacle().then_some(()))
    }

    /// The position of every destination.
    pub fn destinations(&self) -> Vec<Snapshot<CellId>> {
        self.static_cells(|cell| cell.has_destination().then_some(()))
    }

    /// The position and direction of every road cell.
    pub fn roads(&self) -> Vec<Snapshot<CellId, Direction>> {
        self.static_cells(|cell| cell.road())
    }

    /// The position and state of every traffic light; `true` is green.
    pub fn traffic_lights(&self) -> Vec<Snapshot<TrafficLightId, bool>> {
        self.grid()
            .lights()
            .map(|(id, light)| Snapshot {
                id,
                coord: light.coord(),
                extra: light.is_green(),
            })
            .collect()
    }

    fn static_cells<E>(&self, f: impl Fn(&crate::Cell) -> Option<E>) -> Vec<Snapshot<CellId, E>> {
        self.grid()
            .cells()
            .enumerate()
            .filter_map(|(idx, cell)| {
                f(cell).map(|extra| Snapshot {
                    id: CellId(idx as u32),
                    coord: cell.coord(),
                    extra,
                })
            })
            .collect()
    }
}

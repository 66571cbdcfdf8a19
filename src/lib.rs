pub use cgmath;
pub use config::SimConfig;
pub use error::{GridError, InitError, MapError, SpawnError};
pub use feature::{DestinationRegistry, Feature};
pub use grid::{Cell, Coord, Direction, Grid, Neighborhood, Offset, CELL_CAPACITY};
pub use light::TrafficLight;
pub use map::{MapLayout, Placement, Symbol, SymbolTable};
pub use simulation::{Simulation, Stats};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use snapshot::{CellId, Snapshot};
pub use vehicle::{Crash, Driver, Route, Vehicle, VehicleAttributes, VehicleState};

mod config;
mod debug;
pub mod error;
mod feature;
pub mod grid;
mod light;
pub mod map;
mod simulation;
mod snapshot;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
    /// Unique ID of a [TrafficLight].
    pub struct TrafficLightId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;

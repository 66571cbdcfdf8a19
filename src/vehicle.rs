pub use self::route::Route;

use crate::{Coord, VehicleId};

pub(crate) mod driving;
mod lane_change;
pub(crate) mod pathfinding;
mod route;

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    pub(crate) id: VehicleId,
    /// The cell the vehicle is on.
    cell: Coord,
    /// The cell the vehicle is travelling to.
    destination: Coord,
    /// How the vehicle is driven.
    driver: Driver,
    /// The planned route, starting at the cell it was computed from.
    route: Option<Route>,
    /// The index of the vehicle's current cell within `route`.
    cursor: usize,
    /// The number of consecutive ticks the vehicle has been unable to advance.
    stuck: u32,
    /// The crash the vehicle is recovering from, if any.
    crash: Option<Crash>,
    /// The cell the spawn policy placed the vehicle on, until it first moves.
    spawn_cell: Option<Coord>,
}

/// The movement policy of a vehicle, chosen when it is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Driver {
    /// Follows its route and the rules of the road.
    #[default]
    Sober,
    /// Occasionally swerves, runs red lights and rear-ends other vehicles.
    Impaired,
}

/// The attributes of a vehicle placed explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct VehicleAttributes {
    /// The trip destination. When `None`, one is drawn at random from the world's destinations.
    pub destination: Option<Coord>,
    /// The movement policy.
    pub driver: Driver,
}

/// A collision the vehicle is frozen by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crash {
    /// The cell the vehicle was on when it crashed.
    pub origin: Coord,
    /// The tick on which the crash happened.
    pub since: u64,
}

/// The phase of a vehicle's per-tick state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VehicleState {
    Crashed,
    NoRoute,
    Following,
    Arrived,
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(id: VehicleId, cell: Coord, destination: Coord, driver: Driver) -> Self {
        Self {
            id,
            cell,
            destination,
            driver,
            route: None,
            cursor: 0,
            stuck: 0,
            crash: None,
            spawn_cell: None,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The cell the vehicle is on.
    pub fn cell(&self) -> Coord {
        self.cell
    }

    pub fn destination(&self) -> Coord {
        self.destination
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn is_impaired(&self) -> bool {
        self.driver == Driver::Impaired
    }

    /// The vehicle's current route, if it has one.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// The index of the vehicle's current cell within its route.
    pub fn route_cursor(&self) -> usize {
        self.cursor
    }

    /// The number of consecutive ticks the vehicle has been blocked.
    pub fn stuck_count(&self) -> u32 {
        self.stuck
    }

    pub fn crash(&self) -> Option<Crash> {
        self.crash
    }

    pub fn is_crashed(&self) -> bool {
        self.crash.is_some()
    }

    /// The number of ticks since the vehicle crashed, or `None` if it has not.
    pub fn crash_timer(&self, now: u64) -> Option<u64> {
        self.crash.map(|crash| now.saturating_sub(crash.since))
    }

    pub fn state(&self) -> VehicleState {
        if self.crash.is_some() {
            VehicleState::Crashed
        } else if self.cell == self.destination {
            VehicleState::Arrived
        } else if self.route.is_some() {
            VehicleState::Following
        } else {
            VehicleState::NoRoute
        }
    }

    /// The spawn cell the vehicle is still waiting on, if any.
    pub(crate) fn spawn_cell(&self) -> Option<Coord> {
        self.spawn_cell
    }

    /// Marks the current cell as the vehicle's spawn cell.
    pub(crate) fn mark_spawned(&mut self) {
        self.spawn_cell = Some(self.cell);
    }

    /// The next cell on the route, if there is one.
    pub(crate) fn next_step(&self) -> Option<Coord> {
        self.route
            .as_ref()
            .and_then(|route| route.cells().get(self.cursor + 1))
            .copied()
    }

    /// Whether the cursor is on the final cell of the route.
    pub(crate) fn at_route_end(&self) -> bool {
        self.route
            .as_ref()
            .map_or(false, |route| self.cursor + 1 >= route.len())
    }

    /// Sets a route computed from the vehicle's current cell.
    pub(crate) fn set_route(&mut self, route: Route) {
        debug_assert_eq!(route.first(), Some(self.cell));
        self.route = Some(route);
        self.cursor = 0;
    }

    /// Discards the route, forcing it to be recomputed.
    pub(crate) fn clear_route(&mut self) {
        self.route = None;
        self.cursor = 0;
    }

    /// Moves one step along the route.
    pub(crate) fn advance(&mut self, to: Coord) {
        self.cell = to;
        self.cursor += 1;
        self.stuck = 0;
        self.spawn_cell = None;
    }

    /// Moves off the route to an adjacent cell; the route must be recomputed afterwards.
    pub(crate) fn relocate(&mut self, to: Coord) {
        self.cell = to;
        self.clear_route();
        self.stuck = 0;
        self.spawn_cell = None;
    }

    /// Records a tick on which the vehicle could not advance.
    pub(crate) fn block(&mut self) {
        self.stuck += 1;
    }

    pub(crate) fn reset_stuck(&mut self) {
        self.stuck = 0;
    }

    /// Freezes the vehicle at its current cell.
    pub(crate) fn begin_crash(&mut self, now: u64) {
        self.crash = Some(Crash {
            origin: self.cell,
            since: now,
        });
    }

    /// Ends the crash and puts the vehicle back on the given cell with no route.
    pub(crate) fn end_crash(&mut self, cell: Coord) {
        self.crash = None;
        self.relocate(cell);
    }
}

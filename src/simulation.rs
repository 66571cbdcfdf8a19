use crate::config::SimConfig;
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::error::{InitError, SpawnError};
use crate::feature::{DestinationRegistry, Feature};
use crate::map::{MapLayout, Placement};
use crate::vehicle::driving::{act, chance, Outcome, TickContext};
use crate::vehicle::pathfinding::{congestion, RoutePlanner};
use crate::vehicle::{Driver, Route, Vehicle, VehicleAttributes};
use crate::{Coord, Grid, VehicleId, VehicleSet};
use itertools::Itertools;
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;

/// A traffic simulation.
pub struct Simulation {
    /// The cells, their static features and their occupancy.
    grid: Grid,
    /// The cells vehicles may be sent to.
    destinations: DestinationRegistry,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The tunable parameters.
    config: SimConfig,
    /// The entry points of the spawn policy.
    spawn_points: Vec<Coord>,
    /// The sole source of randomness.
    rng: StdRng,
    /// The number of ticks simulated so far.
    tick: u64,
    /// Ticks between spawn rounds; zero disables spawning.
    spawn_interval: u32,
    /// Whether spawn rounds may create impaired drivers.
    impaired_mode: bool,
    /// Running totals.
    stats: Stats,
    /// Debugging information from the previously simulated tick.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

/// Running totals of a simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Vehicles created, explicitly or by the spawn policy.
    pub spawned: u64,
    /// Vehicles which reached their destination.
    pub arrived: u64,
    /// Collisions between two vehicles.
    pub crashes: u64,
}

impl Simulation {
    /// Creates a simulation from a map with the default configuration.
    ///
    /// # Parameters
    /// * `car_count` - The number of vehicles placed at the spawn points up front.
    /// * `seed` - The seed of the simulation's random number generator.
    /// * `spawn_interval` - The number of ticks between spawn rounds, or zero for none.
    pub fn initialize(
        map: &MapLayout,
        car_count: usize,
        seed: u64,
        spawn_interval: u32,
    ) -> Result<Self, InitError> {
        Self::with_config(map, SimConfig::default(), car_count, seed, spawn_interval)
    }

    /// Creates a simulation from a map with the given configuration.
    pub fn with_config(
        map: &MapLayout,
        config: SimConfig,
        car_count: usize,
        seed: u64,
        spawn_interval: u32,
    ) -> Result<Self, InitError> {
        if map.width() == 0 || map.height() == 0 {
            return Err(InitError::EmptyGrid);
        }
        let (grid, destinations) = build_grid(map)?;
        if destinations.is_empty() {
            return Err(InitError::NoDestinations);
        }

        let spawn_points = config.spawn_points_for(grid.width(), grid.height());
        let mut sim = Self {
            grid,
            destinations,
            vehicles: SlotMap::with_key(),
            config,
            spawn_points,
            rng: StdRng::seed_from_u64(seed),
            tick: 0,
            spawn_interval,
            impaired_mode: false,
            stats: Stats::default(),
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        };
        sim.populate(car_count);

        info!(
            "simulation initialised: {}x{} grid, {} destinations, {} lights, {} vehicles",
            sim.grid.width(),
            sim.grid.height(),
            sim.destinations.len(),
            sim.grid.lights().count(),
            sim.vehicles.len(),
        );
        Ok(sim)
    }

    /// Advances the simulation by one tick.
    ///
    /// Every vehicle acts once, in an order shuffled afresh each tick. The traffic
    /// lights are then brought up to date and, on spawn ticks, new vehicles are created.
    pub fn advance_tick(&mut self) {
        let mut order = self.vehicles.keys().collect::<Vec<_>>();
        order.shuffle(&mut self.rng);

        for vehicle_id in order {
            let outcome = {
                let mut ctx = TickContext {
                    grid: &mut self.grid,
                    vehicles: &mut self.vehicles,
                    destinations: &self.destinations,
                    config: &self.config,
                    spawn_points: &self.spawn_points,
                    rng: &mut self.rng,
                    tick: self.tick,
                };
                act(&mut ctx, vehicle_id)
            };
            match outcome {
                Outcome::Arrived => {
                    if let Some(vehicle) = self.vehicles.remove(vehicle_id) {
                        debug!("vehicle {:?} arrived at {}", vehicle_id, vehicle.cell());
                        crate::debug::debug_event("arrive", vehicle_id, vehicle.cell());
                    }
                    self.stats.arrived += 1;
                }
                Outcome::Collided { .. } => self.stats.crashes += 1,
                _ => {}
            }
        }

        self.tick += 1;
        self.grid.update_lights(self.tick);

        if self.spawn_interval > 0 && self.tick % u64::from(self.spawn_interval) == 0 {
            self.spawn_round();
        }

        if self.config.stats_interval > 0 && self.tick % self.config.stats_interval == 0 {
            info!(
                "tick {}: {} active, {} spawned, {} arrived, {} crashes",
                self.tick,
                self.vehicles.len(),
                self.stats.spawned,
                self.stats.arrived,
                self.stats.crashes,
            );
        }

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Gets the number of ticks simulated so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Sets the number of ticks between spawn rounds; zero disables spawning.
    pub fn set_spawn_interval(&mut self, interval: u32) {
        self.spawn_interval = interval;
    }

    pub fn spawn_interval(&self) -> u32 {
        self.spawn_interval
    }

    /// Enables or disables the creation of impaired drivers by the spawn policy.
    pub fn set_impaired_mode(&mut self, enabled: bool) {
        self.impaired_mode = enabled;
    }

    pub fn impaired_mode(&self) -> bool {
        self.impaired_mode
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Gets a mutable reference to the configuration, which takes effect from the next tick.
    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }

    /// The destinations vehicles are sent to.
    pub fn destination_registry(&self) -> &DestinationRegistry {
        &self.destinations
    }

    /// The entry points of the spawn policy.
    pub fn spawn_points(&self) -> &[Coord] {
        &self.spawn_points
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Gets a reference to the vehicle with the given ID, if it is still in the simulation.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(vehicle_id)
    }

    /// Gets the debugging information for the previously simulated tick as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Adds a vehicle to the simulation at the given cell.
    pub fn add_vehicle(
        &mut self,
        coord: Coord,
        attributes: &VehicleAttributes,
    ) -> Result<VehicleId, SpawnError> {
        let cell = self
            .grid
            .cell(coord)
            .ok_or(SpawnError::OutOfBounds { coord })?;
        if cell.has_obstacle() || cell.has_vehicle() {
            return Err(SpawnError::Blocked { coord });
        }
        let destination = match attributes.destination {
            Some(destination) => destination,
            None => self
                .destinations
                .choose(&mut self.rng)
                .ok_or(SpawnError::NoDestinations)?,
        };

        let driver = attributes.driver;
        let vehicle_id = self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, coord, destination, driver));
        if self.grid.insert_vehicle(coord, vehicle_id).is_err() {
            self.vehicles.remove(vehicle_id);
            return Err(SpawnError::Blocked { coord });
        }
        self.stats.spawned += 1;
        debug!(
            "vehicle {:?} ({:?}) spawned at {} bound for {}",
            vehicle_id, driver, coord, destination
        );
        Ok(vehicle_id)
    }

    /// Plans a route between two cells as a vehicle bound for `to` would, without
    /// changing any vehicle.
    pub fn plan_route(&mut self, from: Coord, to: Coord, avoid_vehicles: bool) -> Option<Route> {
        let planner = RoutePlanner {
            grid: &self.grid,
            config: &self.config,
            spawn_points: &self.spawn_points,
            spawn_cell: None,
            goal: to,
            avoid_vehicles,
        };
        planner.find_route(from, &mut self.rng)
    }

    /// Places the initial population, cycling through the spawn points
    /// until `count` vehicles are placed or no spawn cell is free.
    fn populate(&mut self, count: usize) {
        let mut placed = 0;
        while placed < count {
            let before = placed;
            for point in self.spawn_points.clone() {
                if placed == count {
                    break;
                }
                if self.spawn_at(point, Driver::Sober).is_some() {
                    placed += 1;
                }
            }
            if placed == before {
                debug!("placed {} of {} initial vehicles", placed, count);
                break;
            }
        }
    }

    /// Tries to create a vehicle at each spawn point. When impaired mode is on,
    /// at most one of them may be impaired.
    fn spawn_round(&mut self) {
        let points = self.spawn_points.clone();
        let impaired_at = if self.impaired_mode
            && !points.is_empty()
            && chance(&mut self.rng, self.config.impaired_probability)
        {
            Some(self.rng.gen_range(0..points.len()))
        } else {
            None
        };

        for (idx, point) in points.into_iter().enumerate() {
            let driver = if impaired_at == Some(idx) {
                Driver::Impaired
            } else {
                Driver::Sober
            };
            if self.spawn_at(point, driver).is_none() {
                trace!("spawn point {} is blocked", point);
            }
        }
    }

    /// Creates a vehicle on the best free cell around a spawn point.
    fn spawn_at(&mut self, point: Coord, driver: Driver) -> Option<VehicleId> {
        let coord = self.spawn_cell(point)?;
        let attributes = VehicleAttributes {
            destination: None,
            driver,
        };
        let vehicle_id = self.add_vehicle(coord, &attributes).ok()?;
        self.vehicles[vehicle_id].mark_spawned();
        Some(vehicle_id)
    }

    /// The free road cells within the search radius of a spawn point,
    /// least congested lane first, then nearest.
    fn spawn_cell(&self, point: Coord) -> Option<Coord> {
        let radius = self.config.spawn_search_radius as i32;
        (-radius..=radius)
            .cartesian_product(-radius..=radius)
            .map(|(dx, dy)| Coord::new(point.x + dx, point.y + dy))
            .filter(|coord| self.is_free_spawn_cell(*coord))
            .map(|coord| {
                let lane = self.grid.road(coord).map_or(0, |dir| {
                    congestion(&self.grid, coord, dir, self.config.congestion_lookahead)
                });
                let distance = (coord.x - point.x).abs().max((coord.y - point.y).abs());
                (lane, distance, coord)
            })
            .min()
            .map(|(_, _, coord)| coord)
    }

    fn is_free_spawn_cell(&self, coord: Coord) -> bool {
        self.grid.cell(coord).map_or(false, |cell| {
            cell.has_road() && !cell.has_obstacle() && !cell.has_destination() && !cell.has_vehicle()
        })
    }
}

/// Builds the grid and destination registry from a map layout.
fn build_grid(map: &MapLayout) -> Result<(Grid, DestinationRegistry), InitError> {
    let mut grid = Grid::new(map.width(), map.height());
    let mut destinations = DestinationRegistry::default();
    let mut lights = vec![];

    for (coord, placement) in map.placements() {
        let coord = *coord;
        let cell = grid.cell(coord).ok_or(InitError::OutOfBounds { coord })?;
        let feature = match *placement {
            Placement::Road(dir) => Feature::Road(dir),
            Placement::Destination => Feature::Destination,
            Placement::Obstacle => Feature::Obstacle,
            Placement::Light { green, period } => {
                lights.push((coord, green, period));
                continue;
            }
        };
        if cell.features().iter().any(Feature::is_base) {
            return Err(InitError::ConflictingFeatures { coord });
        }
        grid.add_feature(coord, feature)
            .map_err(|_| InitError::ConflictingFeatures { coord })?;
        if feature == Feature::Destination {
            destinations.insert(coord);
        }
    }

    for (coord, green, period) in lights {
        if period == 0 {
            return Err(InitError::InvalidLightPeriod { coord });
        }
        let cell = grid.cell(coord).ok_or(InitError::OutOfBounds { coord })?;
        if !cell.has_road() {
            return Err(InitError::LightWithoutRoad { coord });
        }
        if cell.has_light() {
            return Err(InitError::ConflictingFeatures { coord });
        }
        grid.add_light(coord, green, period)
            .map_err(|_| InitError::ConflictingFeatures { coord })?;
    }

    Ok((grid, destinations))
}

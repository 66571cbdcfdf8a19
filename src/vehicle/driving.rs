//! The per-tick behaviour shared by every vehicle, parameterised by its [`Driver`].

use super::lane_change::find_lane_change;
use super::pathfinding::RoutePlanner;
use super::{Driver, Route};
use crate::config::SimConfig;
use crate::debug::debug_event;
use crate::feature::DestinationRegistry;
use crate::{Coord, Direction, Grid, Neighborhood, VehicleId, VehicleSet};
use log::{debug, trace, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;

/// The parts of the world a vehicle may read or change during its turn.
pub(crate) struct TickContext<'a, R> {
    pub grid: &'a mut Grid,
    pub vehicles: &'a mut VehicleSet,
    pub destinations: &'a DestinationRegistry,
    pub config: &'a SimConfig,
    pub spawn_points: &'a [Coord],
    pub rng: &'a mut R,
    /// The tick being simulated.
    pub tick: u64,
}

/// What a vehicle did with its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Still frozen after a crash.
    Frozen,
    /// Recovered from a crash and returned to where it crashed.
    Recovered,
    /// Reached its destination and left the grid.
    Arrived,
    /// Has no route to its destination this tick.
    NoRoute,
    /// Found its route inconsistent and dropped it.
    Discarded,
    /// Waited behind a vehicle, a red light or a short gap.
    Waited,
    /// Moved one step along its route.
    Moved,
    /// Moved sideways into another lane.
    ChangedLane,
    /// Left its route for a random adjacent cell.
    Swerved,
    /// Crashed into another vehicle.
    Collided { other: VehicleId },
}

/// Runs one vehicle's turn. Occupancy changes are applied to the grid immediately,
/// so vehicles acting later in the same tick see them.
pub(crate) fn act<R: Rng>(ctx: &mut TickContext<R>, id: VehicleId) -> Outcome {
    let (cell, destination, driver, crash) = match ctx.vehicles.get(id) {
        Some(v) => (v.cell(), v.destination(), v.driver(), v.crash()),
        None => return Outcome::Frozen,
    };
    let impaired = driver == Driver::Impaired;

    if let Some(crash) = crash {
        if ctx.tick.saturating_sub(crash.since) < u64::from(ctx.config.crash_duration) {
            return Outcome::Frozen;
        }
        let back = if cell != crash.origin
            && !ctx.grid.has_vehicle(crash.origin)
            && ctx.grid.move_vehicle(id, cell, crash.origin).is_ok()
        {
            crash.origin
        } else {
            cell
        };
        ctx.vehicles[id].end_crash(back);
        debug!("vehicle {:?} recovered from crash at {}", id, back);
        return Outcome::Recovered;
    }

    if cell == destination {
        ctx.grid.remove_vehicle(cell, id);
        return Outcome::Arrived;
    }

    if impaired && chance(ctx.rng, ctx.config.erratic_move_probability) {
        if let Some(outcome) = swerve(ctx, id, cell, destination) {
            return outcome;
        }
    }

    if ctx.vehicles[id].route().is_none() {
        match plan(ctx, id, false) {
            Some(route) => ctx.vehicles[id].set_route(route),
            None => {
                trace!("vehicle {:?} has no route from {} to {}", id, cell, destination);
                return Outcome::NoRoute;
            }
        }
    }

    let vehicle = &ctx.vehicles[id];
    if vehicle.at_route_end() && vehicle.route().and_then(Route::last) != Some(destination) {
        ctx.vehicles[id].clear_route();
        return Outcome::Discarded;
    }

    if vehicle.stuck_count() > ctx.config.stuck_threshold {
        if let Some(outcome) = recover(ctx, id, cell, destination) {
            return outcome;
        }
    }

    let next = match ctx.vehicles[id].next_step() {
        Some(next) => next,
        None => {
            ctx.vehicles[id].clear_route();
            return Outcome::Discarded;
        }
    };
    let step = next - cell;
    if !cell.is_adjacent(next) {
        warn!(
            "vehicle {:?} route jumps from {} to {}; replanning",
            id, cell, next
        );
        ctx.vehicles[id].clear_route();
        return Outcome::Discarded;
    }

    if !planner(ctx, id, false).is_walkable(cell, next) {
        trace!("vehicle {:?} route through {} is no longer valid", id, next);
        ctx.vehicles[id].clear_route();
        return Outcome::Discarded;
    }

    if ctx.grid.is_red(next) && !(impaired && chance(ctx.rng, ctx.config.ignore_light_probability))
    {
        ctx.vehicles[id].block();
        return Outcome::Waited;
    }

    if let Some(other) = ctx.grid.vehicle_at(next) {
        let same_lane = match Direction::from_offset(step) {
            Some(dir) => ctx.grid.road(cell) == Some(dir) && ctx.grid.road(next) == Some(dir),
            None => false,
        };
        if impaired && same_lane && chance(ctx.rng, ctx.config.collision_probability) {
            return collide(ctx, id, other);
        }
        ctx.vehicles[id].block();
        return Outcome::Waited;
    }

    if ctx.grid.has_vehicle(next + step) && chance(ctx.rng, ctx.config.gap_wait_probability) {
        ctx.vehicles[id].block();
        return Outcome::Waited;
    }

    match ctx.grid.move_vehicle(id, cell, next) {
        Ok(()) => {
            ctx.vehicles[id].advance(next);
            Outcome::Moved
        }
        Err(err) => {
            warn!("vehicle {:?} could not move to {}: {}", id, next, err);
            ctx.vehicles[id].clear_route();
            Outcome::Discarded
        }
    }
}

/// Escalating recovery for a vehicle which has been blocked for too long:
/// first a lane change, then a route avoiding other vehicles, then any route.
/// Returns an outcome if the vehicle's turn is over.
fn recover<R: Rng>(
    ctx: &mut TickContext<R>,
    id: VehicleId,
    cell: Coord,
    destination: Coord,
) -> Option<Outcome> {
    let travel = ctx.grid.road(cell).or_else(|| {
        ctx.vehicles[id]
            .next_step()
            .and_then(|next| Direction::from_offset(next - cell))
    });
    if let Some(travel) = travel {
        let target = find_lane_change(ctx.grid, ctx.config, cell, travel, destination, ctx.rng);
        if let Some(target) = target {
            if ctx.grid.move_vehicle(id, cell, target).is_ok() {
                ctx.vehicles[id].relocate(target);
                debug!("vehicle {:?} changed lane from {} to {}", id, cell, target);
                debug_event("lane_change", id, target);
                return Some(Outcome::ChangedLane);
            }
        }
    }

    let route = plan(ctx, id, true).or_else(|| plan(ctx, id, false));
    match route {
        Some(route) => {
            debug!("vehicle {:?} replanned after {} blocked ticks", id, ctx.vehicles[id].stuck_count());
            let vehicle = &mut ctx.vehicles[id];
            vehicle.set_route(route);
            vehicle.reset_stuck();
            None
        }
        None => Some(Outcome::NoRoute),
    }
}

/// An impaired driver abandons its route for a random adjacent road cell, ignoring lanes
/// and lights. Returns `None` if there is nowhere to swerve to.
fn swerve<R: Rng>(
    ctx: &mut TickContext<R>,
    id: VehicleId,
    cell: Coord,
    destination: Coord,
) -> Option<Outcome> {
    let options = ctx
        .grid
        .neighbors(cell, Neighborhood::Moore)
        .into_iter()
        .filter(|n| {
            ctx.grid.cell(*n).map_or(false, |c| {
                !c.has_obstacle()
                    && (*n == destination || (c.has_road() && !ctx.destinations.contains(*n)))
            })
        })
        .collect::<SmallVec<[Coord; 8]>>();
    let target = *options.choose(ctx.rng)?;

    if let Some(other) = ctx.grid.vehicle_at(target) {
        if chance(ctx.rng, ctx.config.contested_collision_probability) {
            return Some(collide(ctx, id, other));
        }
        ctx.vehicles[id].block();
        return Some(Outcome::Waited);
    }

    ctx.grid.move_vehicle(id, cell, target).ok()?;
    ctx.vehicles[id].relocate(target);
    debug!("vehicle {:?} swerved from {} to {}", id, cell, target);
    debug_event("swerve", id, target);
    Some(Outcome::Swerved)
}

/// Freezes both vehicles where they stand. A wreck which is already frozen keeps
/// its original crash, and the striker just waits behind it.
fn collide<R>(ctx: &mut TickContext<R>, id: VehicleId, other: VehicleId) -> Outcome {
    if ctx.vehicles.get(other).map_or(true, |v| v.is_crashed()) {
        ctx.vehicles[id].block();
        return Outcome::Waited;
    }
    if let Some([a, b]) = ctx.vehicles.get_disjoint_mut([id, other]) {
        a.begin_crash(ctx.tick);
        b.begin_crash(ctx.tick);
        debug!(
            "vehicle {:?} at {} crashed into {:?} at {}",
            id,
            a.cell(),
            other,
            b.cell()
        );
        debug_event("crash", id, b.cell());
    }
    Outcome::Collided { other }
}

fn planner<'a, R>(
    ctx: &'a TickContext<R>,
    id: VehicleId,
    avoid_vehicles: bool,
) -> RoutePlanner<'a> {
    let vehicle = &ctx.vehicles[id];
    RoutePlanner {
        grid: ctx.grid,
        config: ctx.config,
        spawn_points: ctx.spawn_points,
        spawn_cell: vehicle.spawn_cell(),
        goal: vehicle.destination(),
        avoid_vehicles,
    }
}

/// Plans a route for a vehicle from its current cell.
fn plan<R: Rng>(ctx: &mut TickContext<R>, id: VehicleId, avoid_vehicles: bool) -> Option<Route> {
    let vehicle = &ctx.vehicles[id];
    let planner = RoutePlanner {
        grid: ctx.grid,
        config: ctx.config,
        spawn_points: ctx.spawn_points,
        spawn_cell: vehicle.spawn_cell(),
        goal: vehicle.destination(),
        avoid_vehicles,
    };
    planner.find_route(vehicle.cell(), ctx.rng)
}

/// Rolls a probability, treating values outside `[0, 1]` as certainties.
pub(crate) fn chance<R: Rng>(rng: &mut R, p: f64) -> bool {
    if p <= 0.0 {
        false
    } else if p >= 1.0 {
        true
    } else {
        rng.gen_bool(p)
    }
}

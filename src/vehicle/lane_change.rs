use super::pathfinding::congestion;
use crate::config::SimConfig;
use crate::{Coord, Direction, Grid};
use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand::Rng;

/// Looks for an adjacent lane running in the direction of travel that a vehicle on `from`
/// could safely move across to. The target cell must be free, and so must a window of
/// cells ahead of and behind it on the target lane.
///
/// Candidates are ranked by the congestion of their lane, ties broken at random.
pub(crate) fn find_lane_change<R: Rng>(
    grid: &Grid,
    config: &SimConfig,
    from: Coord,
    travel: Direction,
    destination: Coord,
    rng: &mut R,
) -> Option<Coord> {
    let mut candidates = travel
        .perpendicular()
        .into_iter()
        .map(|side| from.step(side))
        .filter(|target| is_safe_target(grid, config, *target, travel, destination))
        .map(|target| {
            let load = congestion(grid, target, travel, config.congestion_lookahead);
            (load, target)
        })
        .collect::<ArrayVec<_, 2>>();
    candidates.shuffle(rng);
    candidates.sort_by_key(|(load, _)| *load);
    candidates.first().map(|(_, target)| *target)
}

fn is_safe_target(
    grid: &Grid,
    config: &SimConfig,
    target: Coord,
    travel: Direction,
    destination: Coord,
) -> bool {
    let cell = match grid.cell(target) {
        Some(cell) => cell,
        None => return false,
    };
    if cell.has_obstacle() || cell.has_vehicle() || grid.is_red(target) {
        return false;
    }
    if cell.has_destination() && target != destination {
        return false;
    }
    if cell.road() != Some(travel) {
        return false;
    }

    let ahead = (1..=config.lane_change_look_ahead).map(|k| travel.offset() * k as i32);
    let behind = (1..=config.lane_change_look_behind).map(|k| travel.offset() * -(k as i32));
    ahead
        .chain(behind)
        .all(|offset| !grid.has_vehicle(target + offset))
}

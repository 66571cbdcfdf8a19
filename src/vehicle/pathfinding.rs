use super::Route;
use crate::config::{SimConfig, COST_SCALE};
use crate::{Coord, Direction, Grid};
use pathfinding::directed::astar::astar;
use rand::Rng;
use smallvec::SmallVec;

/// The path finding model of a vehicle, bound to the state of the world at one instant.
/// This can be conceptualised as the vehicle's GPS navigation unit.
pub(crate) struct RoutePlanner<'a> {
    pub grid: &'a Grid,
    pub config: &'a SimConfig,
    /// The spawn points, from which vehicles may depart in any direction.
    pub spawn_points: &'a [Coord],
    /// The cell the spawn policy placed the planning vehicle on, if it has not moved since.
    pub spawn_cell: Option<Coord>,
    /// The planning vehicle's destination.
    pub goal: Coord,
    /// Whether cells holding vehicles are impassable.
    pub avoid_vehicles: bool,
}

impl<'a> RoutePlanner<'a> {
    /// Finds a route from `start` to the goal, or `None` if the goal is unreachable.
    ///
    /// A random jitter of up to `route_jitter` is added to each node's f-score,
    /// which spreads vehicles with the same trip across equally good lanes.
    pub fn find_route<R: Rng>(&self, start: Coord, rng: &mut R) -> Option<Route> {
        if !self.grid.contains(start) || !self.grid.contains(self.goal) {
            return None;
        }

        let goal = self.goal;
        let max_jitter = self.config.max_jitter();
        let (cells, cost) = astar(
            &start,
            |node| self.successors(*node, start),
            |node| {
                let jitter = if max_jitter > 0 {
                    rng.gen_range(0..=max_jitter)
                } else {
                    0
                };
                node.manhattan(goal) * COST_SCALE + jitter
            },
            |node| *node == goal,
        )?;
        Some(Route::new(cells, cost))
    }

    fn successors(&self, node: Coord, start: Coord) -> SmallVec<[(Coord, u32); 8]> {
        self.grid
            .neighbors(node, self.config.neighborhood)
            .into_iter()
            .filter(|next| self.is_walkable(node, *next))
            .map(|next| (next, self.step_cost(node, next, start)))
            .collect()
    }

    /// Determines whether a vehicle may step from `from` onto the adjacent cell `to`.
    pub fn is_walkable(&self, from: Coord, to: Coord) -> bool {
        let cell = match self.grid.cell(to) {
            Some(cell) => cell,
            None => return false,
        };
        if cell.has_obstacle() {
            return false;
        }
        if to == self.goal {
            return true;
        }
        if self.avoid_vehicles && cell.has_vehicle() {
            return false;
        }
        // Somebody else's destination
        if cell.has_destination() {
            return false;
        }
        let road = match cell.road() {
            Some(road) => road,
            None => return false,
        };
        if self.departs_freely(from) {
            return true;
        }

        let step = to - from;
        match Direction::from_offset(step) {
            // Forward or a turn, but never against the lane
            Some(dir) => dir != road.opposite(),
            // A diagonal: the lateral part is a lane change, the other part must not reverse
            None => {
                let (horizontal, vertical) = Direction::components(step);
                let along = if road.is_horizontal() {
                    horizontal
                } else {
                    vertical
                };
                along != Some(road.opposite())
            }
        }
    }

    fn is_spawn(&self, coord: Coord) -> bool {
        self.spawn_points.contains(&coord) || self.spawn_cell == Some(coord)
    }

    /// Whether vehicles leaving `from` may depart in any direction.
    fn departs_freely(&self, from: Coord) -> bool {
        self.is_spawn(from)
            || self
                .grid
                .cell(from)
                .map_or(true, |cell| cell.has_destination() || !cell.has_road())
    }

    /// The cost of the step from `from` to `to`, for a route which began at `start`.
    pub fn step_cost(&self, from: Coord, to: Coord, start: Coord) -> u32 {
        let mut cost = COST_SCALE;
        if !self.departs_freely(from) && is_lane_change(self.grid, from, to) {
            cost += self.config.lane_change_cost();
        }
        if from == start && self.is_spawn(from) {
            if let Some(lane) = self.grid.road(to) {
                let count = congestion(self.grid, to, lane, self.config.congestion_lookahead);
                cost += self.config.congestion_cost(count);
            }
        }
        cost
    }
}

/// Whether a step leaves the lane of its source cell: any diagonal step,
/// or an orthogonal step across the source cell's road direction.
pub(crate) fn is_lane_change(grid: &Grid, from: Coord, to: Coord) -> bool {
    match Direction::from_offset(to - from) {
        Some(dir) => grid
            .road(from)
            .map_or(false, |road| road.is_horizontal() != dir.is_horizontal()),
        None => true,
    }
}

/// Counts the vehicles and red lights on the lane starting at `from` and running in `dir`,
/// looking at most `lookahead` cells ahead and stopping where the road ends.
pub(crate) fn congestion(grid: &Grid, from: Coord, dir: Direction, lookahead: u32) -> u32 {
    let mut count = 0;
    let mut coord = from;
    for _ in 0..lookahead {
        let cell = match grid.cell(coord) {
            Some(cell) if cell.has_road() => cell,
            _ => break,
        };
        if cell.has_vehicle() {
            count += 1;
        }
        if grid.is_red(coord) {
            count += 1;
        }
        coord = coord.step(dir);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::{Neighborhood, VehicleId};
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use slotmap::KeyData;

    fn config() -> SimConfig {
        SimConfig {
            route_jitter: 0.0,
            ..Default::default()
        }
    }

    fn lane(grid: &mut Grid, y: i32, xs: std::ops::Range<i32>, dir: Direction) {
        for x in xs {
            grid.add_feature(Coord::new(x, y), Feature::Road(dir)).unwrap();
        }
    }

    fn planner<'a>(grid: &'a Grid, config: &'a SimConfig, goal: Coord) -> RoutePlanner<'a> {
        RoutePlanner {
            grid,
            config,
            spawn_points: &[],
            spawn_cell: None,
            goal,
            avoid_vehicles: false,
        }
    }

    #[test]
    fn follows_a_straight_lane() {
        let mut grid = Grid::new(5, 5);
        lane(&mut grid, 2, 0..4, Direction::Right);
        grid.add_feature(Coord::new(4, 2), Feature::Destination).unwrap();
        let config = config();
        let route = planner(&grid, &config, Coord::new(4, 2))
            .find_route(Coord::new(0, 2), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(
            route.cells(),
            [(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)].map(Coord::from)
        );
        assert_approx_eq!(route.cost(), 4.0);
    }

    #[test]
    fn never_drives_against_the_lane() {
        let mut grid = Grid::new(5, 1);
        lane(&mut grid, 0, 0..4, Direction::Left);
        grid.add_feature(Coord::new(4, 0), Feature::Destination).unwrap();
        let config = config();
        let route = planner(&grid, &config, Coord::new(4, 0))
            .find_route(Coord::new(1, 0), &mut StdRng::seed_from_u64(1));
        assert!(route.is_none());
    }

    #[test]
    fn changes_lane_around_an_obstacle() {
        let mut grid = Grid::new(6, 4);
        lane(&mut grid, 1, 0..2, Direction::Right);
        grid.add_feature(Coord::new(2, 1), Feature::Obstacle).unwrap();
        lane(&mut grid, 1, 3..5, Direction::Right);
        lane(&mut grid, 2, 0..6, Direction::Right);
        grid.add_feature(Coord::new(5, 1), Feature::Destination).unwrap();
        let config = config();
        let route = planner(&grid, &config, Coord::new(5, 1))
            .find_route(Coord::new(0, 1), &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert!(!route.contains(Coord::new(2, 1)));
        assert_eq!(route.first(), Some(Coord::new(0, 1)));
        assert_eq!(route.last(), Some(Coord::new(5, 1)));
        assert!(route.cost() > (route.len() - 1) as f64);
    }

    #[test]
    fn foreign_destinations_are_not_walkable() {
        let mut grid = Grid::new(3, 1);
        lane(&mut grid, 0, 0..1, Direction::Right);
        grid.add_feature(Coord::new(1, 0), Feature::Destination).unwrap();
        grid.add_feature(Coord::new(2, 0), Feature::Destination).unwrap();
        let config = config();
        let own = planner(&grid, &config, Coord::new(1, 0));
        assert!(own.is_walkable(Coord::new(0, 0), Coord::new(1, 0)));
        let other = planner(&grid, &config, Coord::new(2, 0));
        assert!(!other.is_walkable(Coord::new(0, 0), Coord::new(1, 0)));
        assert!(other
            .find_route(Coord::new(0, 0), &mut StdRng::seed_from_u64(3))
            .is_none());
    }

    #[test]
    fn diagonal_steps_may_not_reverse() {
        let mut grid = Grid::new(3, 3);
        lane(&mut grid, 1, 0..3, Direction::Right);
        lane(&mut grid, 2, 0..3, Direction::Right);
        grid.add_feature(Coord::new(0, 0), Feature::Destination).unwrap();
        let config = config();
        let p = planner(&grid, &config, Coord::new(0, 0));
        assert!(p.is_walkable(Coord::new(1, 1), Coord::new(2, 2)));
        assert!(!p.is_walkable(Coord::new(1, 1), Coord::new(0, 2)));
        assert!(!p.is_walkable(Coord::new(1, 1), Coord::new(0, 1)));
        assert!(p.is_walkable(Coord::new(1, 1), Coord::new(1, 2)));
    }

    #[test]
    fn congestion_counts_vehicles_and_red_lights() {
        let mut grid = Grid::new(10, 1);
        lane(&mut grid, 0, 0..10, Direction::Right);
        grid.add_light(Coord::new(3, 0), false, 5).unwrap();
        let id = VehicleId::from(KeyData::from_ffi(1 << 32 | 1));
        grid.insert_vehicle(Coord::new(5, 0), id).unwrap();
        assert_eq!(congestion(&grid, Coord::new(0, 0), Direction::Right, 8), 2);
        assert_eq!(congestion(&grid, Coord::new(0, 0), Direction::Right, 4), 1);
        assert_eq!(congestion(&grid, Coord::new(6, 0), Direction::Right, 8), 0);
    }

    #[test]
    fn orthogonal_planner_never_steps_diagonally() {
        let mut grid = Grid::new(6, 4);
        lane(&mut grid, 1, 0..2, Direction::Right);
        grid.add_feature(Coord::new(2, 1), Feature::Obstacle).unwrap();
        lane(&mut grid, 1, 3..5, Direction::Right);
        lane(&mut grid, 2, 0..6, Direction::Right);
        grid.add_feature(Coord::new(5, 1), Feature::Destination).unwrap();
        let config = SimConfig {
            neighborhood: Neighborhood::Orthogonal,
            ..config()
        };
        let route = planner(&grid, &config, Coord::new(5, 1))
            .find_route(Coord::new(0, 1), &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert!(!route.contains(Coord::new(2, 1)));
        assert_eq!(route.last(), Some(Coord::new(5, 1)));
        for pair in route.cells().windows(2) {
            assert!(Direction::from_offset(pair[1] - pair[0]).is_some());
        }
    }

    #[test]
    fn spawn_cell_departs_freely() {
        let mut grid = Grid::new(4, 1);
        lane(&mut grid, 0, 0..3, Direction::Left);
        grid.add_feature(Coord::new(3, 0), Feature::Destination).unwrap();
        let config = config();
        let mut p = planner(&grid, &config, Coord::new(3, 0));
        assert!(p
            .find_route(Coord::new(1, 0), &mut StdRng::seed_from_u64(2))
            .is_none());

        p.spawn_cell = Some(Coord::new(1, 0));
        let route = p
            .find_route(Coord::new(1, 0), &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(route.cells(), [(1, 0), (2, 0), (3, 0)].map(Coord::from));
    }

    #[test]
    fn first_step_from_spawn_cell_pays_for_congestion() {
        let mut grid = Grid::new(6, 1);
        lane(&mut grid, 0, 0..6, Direction::Right);
        let id = VehicleId::from(KeyData::from_ffi(1 << 32 | 1));
        grid.insert_vehicle(Coord::new(3, 0), id).unwrap();
        let config = config();
        let mut p = planner(&grid, &config, Coord::new(5, 0));
        let (from, to) = (Coord::new(0, 0), Coord::new(1, 0));
        assert_eq!(p.step_cost(from, to, from), COST_SCALE);

        p.spawn_cell = Some(from);
        assert_eq!(p.step_cost(from, to, from), 2 * COST_SCALE);
        assert_eq!(p.step_cost(to, Coord::new(2, 0), from), COST_SCALE);
    }
}

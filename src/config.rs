use crate::{Coord, Neighborhood};
use serde::{Deserialize, Serialize};

/// Internal cost units per unit step. Costs are kept as integers so that
/// route searches are exact and deterministic.
pub(crate) const COST_SCALE: u32 = 100;

/// Tunable parameters of a simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Which neighbours the route planner may step to; diagonal steps are lane changes.
    pub neighborhood: Neighborhood,
    /// Extra cost of a lane change, in steps.
    pub lane_change_penalty: f64,
    /// Extra cost per vehicle or red light seen ahead of a spawn lane, in steps.
    pub congestion_weight: f64,
    /// How many cells ahead the congestion estimate looks.
    pub congestion_lookahead: u32,
    /// Upper bound of the random jitter added to each node's f-score, in steps.
    pub route_jitter: f64,
    /// Consecutive blocked ticks tolerated before a vehicle tries to recover.
    pub stuck_threshold: u32,
    /// Cells ahead on the target lane which must be free for a lane change.
    pub lane_change_look_ahead: u32,
    /// Cells behind on the target lane which must be free for a lane change.
    pub lane_change_look_behind: u32,
    /// Probability of holding back when the cell beyond the next one is occupied.
    pub gap_wait_probability: f64,
    /// Ticks a crashed vehicle stays frozen.
    pub crash_duration: u32,
    /// Probability that an impaired driver rear-ends a vehicle in its lane.
    pub collision_probability: f64,
    /// Probability of a crash when an impaired driver swerves into an occupied cell.
    pub contested_collision_probability: f64,
    /// Per-tick probability that an impaired driver abandons its route and swerves.
    pub erratic_move_probability: f64,
    /// Probability that an impaired driver runs a red light.
    pub ignore_light_probability: f64,
    /// Probability that a spawn round creates one impaired driver, when impaired mode is on.
    pub impaired_probability: f64,
    /// Entry points of the spawn policy. Defaults to the four corners of the grid.
    pub spawn_points: Option<Vec<Coord>>,
    /// Chebyshev radius around an entry point searched for a free spawn cell.
    pub spawn_search_radius: u32,
    /// Ticks between summary statistics log lines; zero disables them.
    pub stats_interval: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            neighborhood: Neighborhood::Moore,
            lane_change_penalty: 5.0,
            congestion_weight: 1.0,
            congestion_lookahead: 8,
            route_jitter: 0.1,
            stuck_threshold: 3,
            lane_change_look_ahead: 1,
            lane_change_look_behind: 2,
            gap_wait_probability: 0.3,
            crash_duration: 10,
            collision_probability: 0.4,
            contested_collision_probability: 0.7,
            erratic_move_probability: 0.05,
            ignore_light_probability: 0.3,
            impaired_probability: 0.2,
            spawn_points: None,
            spawn_search_radius: 1,
            stats_interval: 20,
        }
    }
}

impl SimConfig {
    /// Loads a configuration from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The entry points of the spawn policy on a grid of the given size.
    pub fn spawn_points_for(&self, width: u32, height: u32) -> Vec<Coord> {
        match &self.spawn_points {
            Some(points) => points.clone(),
            None => {
                let (w, h) = (width as i32 - 1, height as i32 - 1);
                vec![
                    Coord::new(0, 0),
                    Coord::new(w, 0),
                    Coord::new(w, h),
                    Coord::new(0, h),
                ]
            }
        }
    }

    pub(crate) fn lane_change_cost(&self) -> u32 {
        to_cost(self.lane_change_penalty)
    }

    pub(crate) fn congestion_cost(&self, count: u32) -> u32 {
        to_cost(self.congestion_weight * f64::from(count))
    }

    pub(crate) fn max_jitter(&self) -> u32 {
        to_cost(self.route_jitter)
    }
}

/// Converts a cost in steps to internal cost units.
fn to_cost(steps: f64) -> u32 {
    (steps.max(0.0) * f64::from(COST_SCALE)).round() as u32
}

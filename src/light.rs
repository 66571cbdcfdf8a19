use crate::Coord;

/// A fixed-time traffic light.
///
/// Each light runs independently of every other light. Its phase is anchored
/// to tick 0 of the simulation and it flips every `period` ticks.
#[derive(Clone, Debug)]
pub struct TrafficLight {
    /// The cell the light controls.
    coord: Coord,
    /// The state at tick 0, `true` being green.
    initial: bool,
    /// The current state, `true` being green.
    green: bool,
    /// The number of ticks between state changes.
    period: u32,
}

impl TrafficLight {
    /// Creates a new traffic light. `period` must be non-zero.
    pub(crate) fn new(coord: Coord, green: bool, period: u32) -> Self {
        debug_assert!(period > 0);
        Self {
            coord,
            initial: green,
            green,
            period,
        }
    }

    /// The cell the light controls.
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// Whether the light is green.
    pub fn is_green(&self) -> bool {
        self.green
    }

    /// Whether the light is red.
    pub fn is_red(&self) -> bool {
        !self.green
    }

    /// The number of ticks between state changes.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// The state of the light at the given tick.
    pub fn state_at(&self, tick: u64) -> bool {
        let phase = tick / u64::from(self.period);
        self.initial ^ (phase % 2 == 1)
    }

    /// Brings the light up to date with the given tick.
    pub(crate) fn update(&mut self, tick: u64) {
        self.green = self.state_at(tick);
    }
}

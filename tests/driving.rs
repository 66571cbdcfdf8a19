//! Scenario tests of single vehicle decisions: swerving, red lights, gaps and recovery.

use std::collections::HashSet;

use grid_traffic::{
    Coord, Direction, Driver, MapLayout, SimConfig, Simulation, VehicleAttributes, VehicleId,
};

/// A configuration in which nothing happens by chance unless a test asks for it.
fn certain() -> SimConfig {
    SimConfig {
        route_jitter: 0.0,
        gap_wait_probability: 0.0,
        collision_probability: 0.0,
        contested_collision_probability: 0.0,
        erratic_move_probability: 0.0,
        ignore_light_probability: 0.0,
        ..Default::default()
    }
}

fn place(sim: &mut Simulation, at: (i32, i32), to: (i32, i32), driver: Driver) -> VehicleId {
    sim.add_vehicle(
        at.into(),
        &VehicleAttributes {
            destination: Some(to.into()),
            driver,
        },
    )
    .unwrap()
}

/// Test that an erratic driver leaves its route for an adjacent road cell.
#[test]
fn impaired_driver_swerves_off_route() {
    let map = MapLayout::new(5, 3)
        .road_line((0, 0), 5, Direction::Right)
        .road_line((0, 1), 4, Direction::Right)
        .road_line((0, 2), 5, Direction::Right)
        .destination((4, 1));
    let config = SimConfig {
        erratic_move_probability: 1.0,
        ..certain()
    };
    let mut sim = Simulation::with_config(&map, config, 0, 21, 0).unwrap();
    let veh = place(&mut sim, (1, 1), (4, 1), Driver::Impaired);

    sim.advance_tick();
    let vehicle = sim.get_vehicle(veh).unwrap();
    assert!(vehicle.cell().is_adjacent(Coord::new(1, 1)));
    assert!(vehicle.route().is_none());
    assert_eq!(vehicle.stuck_count(), 0);
    assert!(sim.grid().cell(vehicle.cell()).unwrap().has_road());
    assert!(!sim.grid().has_vehicle(Coord::new(1, 1)));
}

/// The swerving driver at (1, 1) can only reach (2, 1), where a sober vehicle waits at a red light.
fn contested_cell(contested_collision_probability: f64) -> (Simulation, VehicleId, VehicleId) {
    let map = MapLayout::new(5, 3)
        .road_line((1, 1), 3, Direction::Right)
        .light((3, 1), false, 100)
        .destination((4, 1));
    let config = SimConfig {
        erratic_move_probability: 1.0,
        contested_collision_probability,
        ..certain()
    };
    let mut sim = Simulation::with_config(&map, config, 0, 5, 0).unwrap();
    let swerver = place(&mut sim, (1, 1), (4, 1), Driver::Impaired);
    let waiting = place(&mut sim, (2, 1), (4, 1), Driver::Sober);
    (sim, swerver, waiting)
}

#[test]
fn swerving_into_an_occupied_cell_crashes() {
    let (mut sim, swerver, waiting) = contested_cell(1.0);
    sim.advance_tick();
    assert_eq!(sim.stats().crashes, 1);
    assert!(sim.get_vehicle(swerver).unwrap().is_crashed());
    assert!(sim.get_vehicle(waiting).unwrap().is_crashed());
    assert_eq!(sim.get_vehicle(swerver).unwrap().cell(), Coord::new(1, 1));
}

#[test]
fn swerving_into_an_occupied_cell_may_just_wait() {
    let (mut sim, swerver, waiting) = contested_cell(0.0);
    sim.advance_tick();
    assert_eq!(sim.stats().crashes, 0);
    let vehicle = sim.get_vehicle(swerver).unwrap();
    assert_eq!(vehicle.cell(), Coord::new(1, 1));
    assert_eq!(vehicle.stuck_count(), 1);
    assert!(!sim.get_vehicle(waiting).unwrap().is_crashed());
}

/// A lane with a red light at (2, 1).
fn red_light_lane(config: SimConfig) -> Simulation {
    let map = MapLayout::new(5, 3)
        .road_line((0, 1), 4, Direction::Right)
        .light((2, 1), false, 100)
        .destination((4, 1));
    Simulation::with_config(&map, config, 0, 17, 0).unwrap()
}

#[test]
fn impaired_driver_runs_red_light() {
    let config = SimConfig {
        ignore_light_probability: 1.0,
        ..certain()
    };
    let mut sim = red_light_lane(config);
    let veh = place(&mut sim, (1, 1), (4, 1), Driver::Impaired);
    sim.advance_tick();
    let vehicle = sim.get_vehicle(veh).unwrap();
    assert_eq!(vehicle.cell(), Coord::new(2, 1));
    assert_eq!(vehicle.stuck_count(), 0);
}

#[test]
fn sober_driver_stops_at_red_light() {
    let config = SimConfig {
        ignore_light_probability: 1.0,
        ..certain()
    };
    let mut sim = red_light_lane(config);
    let veh = place(&mut sim, (1, 1), (4, 1), Driver::Sober);
    for stuck in 1..=3 {
        sim.advance_tick();
        let vehicle = sim.get_vehicle(veh).unwrap();
        assert_eq!(vehicle.cell(), Coord::new(1, 1));
        assert_eq!(vehicle.stuck_count(), stuck);
    }
}

/// A vehicle at (0, 1) with a free cell ahead and a vehicle held by a red light beyond it.
fn gap_ahead(gap_wait_probability: f64) -> (Simulation, VehicleId) {
    let map = MapLayout::new(5, 3)
        .road_line((0, 1), 4, Direction::Right)
        .light((3, 1), false, 100)
        .destination((4, 1));
    let config = SimConfig {
        gap_wait_probability,
        ..certain()
    };
    let mut sim = Simulation::with_config(&map, config, 0, 3, 0).unwrap();
    let veh = place(&mut sim, (0, 1), (4, 1), Driver::Sober);
    place(&mut sim, (2, 1), (4, 1), Driver::Sober);
    (sim, veh)
}

#[test]
fn keeps_a_gap_to_the_vehicle_ahead() {
    let (mut sim, veh) = gap_ahead(1.0);
    sim.advance_tick();
    let vehicle = sim.get_vehicle(veh).unwrap();
    assert_eq!(vehicle.cell(), Coord::new(0, 1));
    assert_eq!(vehicle.stuck_count(), 1);

    let (mut sim, veh) = gap_ahead(0.0);
    sim.advance_tick();
    assert_eq!(sim.get_vehicle(veh).unwrap().cell(), Coord::new(1, 1));
}

/// Test that a vehicle held at a red light moves into the free parallel lane once it
/// has waited longer than the stuck threshold.
#[test]
fn blocked_vehicle_changes_lane() {
    let map = MapLayout::new(8, 2)
        .road_line((0, 0), 7, Direction::Right)
        .road_line((0, 1), 7, Direction::Right)
        .light((6, 0), false, 100)
        .destination((7, 0));
    let mut sim = Simulation::with_config(&map, certain(), 0, 9, 0).unwrap();
    let veh = place(&mut sim, (5, 0), (7, 0), Driver::Sober);

    for stuck in 1..=4 {
        sim.advance_tick();
        let vehicle = sim.get_vehicle(veh).unwrap();
        assert_eq!(vehicle.cell(), Coord::new(5, 0));
        assert_eq!(vehicle.stuck_count(), stuck);
    }

    sim.advance_tick();
    let vehicle = sim.get_vehicle(veh).unwrap();
    assert_eq!(vehicle.cell(), Coord::new(5, 1));
    assert_eq!(vehicle.stuck_count(), 0);
    assert!(vehicle.route().is_none());
}

/// Test that a vehicle which cannot change lane replans around the vehicle blocking it.
#[test]
fn blocked_vehicle_replans_around_traffic() {
    // Red lights on the parallel lane make every lane change unsafe.
    let map = MapLayout::new(8, 2)
        .road_line((0, 0), 7, Direction::Right)
        .road_line((0, 1), 7, Direction::Right)
        .light((4, 0), false, 100)
        .light((2, 1), false, 100)
        .light((3, 1), false, 100)
        .destination((7, 0));
    let mut sim = Simulation::with_config(&map, certain(), 0, 9, 0).unwrap();
    let veh = place(&mut sim, (2, 0), (7, 0), Driver::Sober);
    place(&mut sim, (3, 0), (7, 0), Driver::Sober);

    for _ in 0..4 {
        sim.advance_tick();
    }
    let vehicle = sim.get_vehicle(veh).unwrap();
    assert_eq!(vehicle.stuck_count(), 4);
    assert!(vehicle.route().unwrap().contains(Coord::new(3, 0)));

    sim.advance_tick();
    let vehicle = sim.get_vehicle(veh).unwrap();
    let route = vehicle.route().unwrap();
    assert_eq!(vehicle.cell(), Coord::new(2, 0));
    assert!(!route.contains(Coord::new(3, 0)));
    assert_eq!(route.cells()[1].y, 1);
    // The new route starts at a red light, so the turn ends in a fresh wait.
    assert_eq!(vehicle.stuck_count(), 1);
}

/// Test that a vehicle with no way around the vehicle ahead keeps a route through it.
#[test]
fn blocked_vehicle_replans_through_traffic() {
    let map = MapLayout::new(6, 1)
        .road_line((0, 0), 5, Direction::Right)
        .light((3, 0), false, 100)
        .destination((5, 0));
    let mut sim = Simulation::with_config(&map, certain(), 0, 9, 0).unwrap();
    let veh = place(&mut sim, (1, 0), (5, 0), Driver::Sober);
    place(&mut sim, (2, 0), (5, 0), Driver::Sober);

    for _ in 0..4 {
        sim.advance_tick();
    }
    assert_eq!(sim.get_vehicle(veh).unwrap().stuck_count(), 4);

    sim.advance_tick();
    let vehicle = sim.get_vehicle(veh).unwrap();
    assert_eq!(vehicle.cell(), Coord::new(1, 0));
    assert_eq!(vehicle.stuck_count(), 1);
    assert!(vehicle.route().unwrap().contains(Coord::new(2, 0)));
}

const DEMO_MAP: &str = include_str!("../maps/demo.txt");

fn impaired_spawned_per_round(impaired_mode: bool) -> Vec<usize> {
    let map = MapLayout::parse(DEMO_MAP).unwrap();
    let config = SimConfig {
        impaired_probability: 1.0,
        ..Default::default()
    };
    let mut sim = Simulation::with_config(&map, config, 0, 31, 1).unwrap();
    sim.set_impaired_mode(impaired_mode);
    let mut seen = HashSet::new();
    (0..20)
        .map(|_| {
            sim.advance_tick();
            sim.iter_vehicles()
                .filter(|v| seen.insert(v.id()))
                .filter(|v| v.is_impaired())
                .count()
        })
        .collect()
}

#[test]
fn spawn_rounds_create_at_most_one_impaired_driver() {
    let rounds = impaired_spawned_per_round(true);
    assert_eq!(rounds[0], 1);
    assert!(rounds.iter().all(|n| *n <= 1));
    assert!(impaired_spawned_per_round(false).iter().all(|n| *n == 0));
}

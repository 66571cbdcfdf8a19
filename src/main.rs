use std::time::Instant;

use grid_traffic::{MapLayout, Simulation};

const DEMO_MAP: &str = include_str!("../maps/demo.txt");

fn main() {
    let map = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).unwrap_or_else(|err| {
            eprintln!("could not read {}: {}", path, err);
            std::process::exit(1);
        }),
        None => DEMO_MAP.to_string(),
    };
    let map = MapLayout::parse(&map).unwrap_or_else(|err| {
        eprintln!("invalid map: {}", err);
        std::process::exit(1);
    });
    let mut sim = Simulation::initialize(&map, 8, 42, 5).unwrap_or_else(|err| {
        eprintln!("could not start simulation: {}", err);
        std::process::exit(1);
    });
    sim.set_impaired_mode(true);

    println!("Simulating...");
    const NUM_FRAMES: u32 = 1000;
    loop {
        let start = Instant::now();
        for _ in 0..NUM_FRAMES {
            sim.advance_tick();
        }
        let frame = start.elapsed() / NUM_FRAMES;
        let stats = sim.stats();
        println!(
            "Avg. tick: {:?} (tick {}, {} vehs, {} arrived, {} crashes)",
            frame,
            sim.tick(),
            sim.iter_vehicles().count(),
            stats.arrived,
            stats.crashes,
        )
    }
}

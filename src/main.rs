use log::info;
use simple_logger::SimpleLogger;

use ta_rust::{AvalancheConfig, Coverage, TelephoneAvalanche};

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    info!("starting");

    let config = AvalancheConfig {
        nodes: 100,
        edges_per_node: 3,
        max_iteration: 30,
        calls_per_round: 5,
        start_nodes: vec![0],
        ..Default::default()
    };

    let avalanche = match TelephoneAvalanche::new(config) {
        Ok(avalanche) => avalanche,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(seed) = avalanche.seed_used() {
        let hex: String = seed.iter().map(|b| format!("{:02x}", b)).collect();
        info!("seed 0x{}", hex);
    }

    match avalanche.outcome() {
        Coverage::Full { calling_rounds } => {
            println!("All nodes were reached within {} round(s) of calling.", calling_rounds)
        }
        Coverage::Partial {
            reached,
            stalled_at,
        } => println!(
            "Reached {} of {} nodes; growth stopped after round {}.",
            reached,
            avalanche.graph().node_count(),
            stalled_at
        ),
        Coverage::Inconclusive { reached, rounds } => println!(
            "Not all nodes were reached within {} iterations ({} so far).",
            rounds, reached
        ),
    }

    let unreached: Vec<usize> = (0..avalanche.graph().node_count())
        .filter(|&node| !avalanche.state().is_reached(node))
        .collect();
    if !unreached.is_empty() {
        println!("Unreached nodes: {:?}", unreached);
    }

    println!("{:>5} {:>8} {:>6} {:>8}", "round", "reached", "max", "mean");
    let reached = avalanche.reached_over_time();
    let max = avalanche.max_over_time();
    let mean = avalanche.mean_over_time();
    for round in 0..reached.len() {
        println!(
            "{:>5} {:>8} {:>6} {:>8.3}",
            round, reached[round], max[round], mean[round]
        );
    }

    info!("done");
}

// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/small_office.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/small_office.yaml --seed 0x1234...

mod avalanche;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use avalanche::{ScenarioFile, ScenarioRunner};
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/small_office.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/small_office.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed: Option<[u8; 32]> = if args.len() >= 4 && args[2] == "--seed" {
        match parse_seed_hex(&args[3]) {
            Ok(seed) => Some(seed),
            Err(e) => {
                eprintln!("Invalid hex seed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let scenarios = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        find_scenarios(path)
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    };

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", path.display());
        std::process::exit(1);
    }

    // verbose if any scenario asks for it; the logger can only be set once
    let loaded: Vec<(PathBuf, ScenarioFile)> = scenarios
        .into_iter()
        .map(|p| match ScenarioFile::load(&p) {
            Ok(scenario) => (p, scenario),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        })
        .collect();

    let level = if loaded.iter().any(|(_, s)| s.verbose) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialise logging: {}", e);
    }

    println!("Found {} scenario(s) to run\n", loaded.len());

    for (i, (scenario_path, scenario)) in loaded.into_iter().enumerate() {
        println!("\n{}: {}\n", i + 1, scenario_path.display());
        run_scenario(&scenario_path, scenario, seed);
    }
}

fn find_scenarios(dir: &Path) -> Vec<PathBuf> {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            ) {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();
    scenarios
}

fn run_scenario(path: &Path, scenario: ScenarioFile, seed: Option<[u8; 32]>) {
    let name = scenario.display_name(path);

    println!("╔════════════════════════════════════════════════════════╗");
    println!("║  {}{}║", name, " ".repeat(54_usize.saturating_sub(name.len())));
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let config = &scenario.config;
    println!("Configuration:");
    println!("  Nodes: {}", config.nodes);
    println!("  Edges per node: {}", config.edges_per_node);
    println!("  Calls per round: {}", config.calls_per_round);
    println!("  Max iteration: {}", config.max_iteration);
    println!("  Start nodes: {:?}", config.start_nodes);
    println!("  Trials: {}", scenario.trials);
    println!("\nStarting simulation...\n");

    let runner = ScenarioRunner::new(name, scenario, seed);
    let result = runner.run();

    result.print_summary();

    println!("✓ Scenario complete!\n");
}

fn parse_seed_hex(hex: &str) -> Result<[u8; 32], std::num::ParseIntError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = String::from_utf8_lossy(chunk);
        seed[i] = u8::from_str_radix(&byte_str, 16)?;
    }

    Ok(seed)
}

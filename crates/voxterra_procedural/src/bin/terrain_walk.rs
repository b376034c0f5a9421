//! # Terrain Walk
//!
//! Headless host loop: walks an observer along +x, one block per tick, and
//! streams terrain around it. Nothing is rendered.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --features walk --bin terrain_walk -- --steps 100
//! terrain_walk --config world.toml --steps 2000
//! RUST_LOG=voxterra_procedural=debug terrain_walk --seed 6001
//! ```

use std::process::ExitCode;
use std::time::Instant;

use tracing_subscriber::EnvFilter;
use voxterra_procedural::{TerrainConfig, TerrainResult, TerrainWorld, WorldPos};

/// Observer spawn height, in world units.
const SPAWN_Z: f64 = 50.0;

struct Options {
    config_path: Option<String>,
    seed: Option<u64>,
    steps: u32,
}

fn print_help() {
    println!("Usage: terrain_walk [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>   TOML session config (default: built-in world)");
    println!("  -s, --seed <SEED>     Override the seed (default: config seed, or random)");
    println!("  -n, --steps <STEPS>   Ticks to walk, one block each (default: 500)");
    println!("  -h, --help            Print this help");
}

/// Parses a `--seed` value. A bad value is reported and dropped, so the
/// walk falls back to the config seed.
fn parse_seed(value: &str) -> Option<u64> {
    match value.parse() {
        Ok(seed) => Some(seed),
        Err(e) => {
            tracing::warn!(seed = value, error = %e, "ignoring unparsable seed");
            None
        }
    }
}

/// Parses command line arguments, program name first. `None` means help
/// was printed.
fn parse_args(args: &[String]) -> Option<Options> {
    let mut options = Options {
        config_path: None,
        seed: None,
        steps: 500,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    options.seed = parse_seed(&args[i + 1]);
                    i += 1;
                }
            }
            "--steps" | "-n" => {
                if i + 1 < args.len() {
                    options.steps = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return None;
            }
            other => {
                tracing::warn!(argument = other, "ignoring unknown argument");
            }
        }
        i += 1;
    }
    Some(options)
}

fn load_config(options: &Options) -> TerrainResult<TerrainConfig> {
    let mut config = match &options.config_path {
        Some(path) => TerrainConfig::load(path)?,
        None => TerrainConfig::with_random_seed(),
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn walk(config: TerrainConfig, steps: u32) -> TerrainResult<()> {
    let block_scale = config.block_scale;
    let mut world = TerrainWorld::new(config)?;

    let start = Instant::now();
    let mut x = 0.0;
    for _ in 0..steps {
        let report = world.tick(WorldPos::new(x, 0.0, SPAWN_Z))?;
        if !report.is_noop() {
            let bx = world.space().world_to_block(WorldPos::new(x, 0.0, 0.0)).x;
            tracing::debug!(
                observer = %report.observer_chunk,
                surface = ?world.surface_height(bx, 0),
                "entered chunk"
            );
        }
        x += block_scale;
    }

    let stats = world.stats();
    tracing::info!(
        ticks = stats.passes,
        crossings = stats.chunk_crossings,
        generated = stats.generated_total,
        evicted = stats.evicted_total,
        loaded = world.loaded_chunk_count(),
        elapsed_ms = start.elapsed().as_millis(),
        "walk finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         VOXTERRA TERRAIN WALK                                    ║");
    println!("║         HEADLESS STREAMING HOST                                  ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args) else {
        return ExitCode::SUCCESS;
    };

    let result = load_config(&options).and_then(|config| walk(config, options.steps));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "terrain walk failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("terrain_walk")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args_reads_every_option() {
        let options =
            parse_args(&args(&["--config", "w.toml", "-s", "6001", "--steps", "20"])).unwrap();

        assert_eq!(options.config_path.as_deref(), Some("w.toml"));
        assert_eq!(options.seed, Some(6001));
        assert_eq!(options.steps, 20);
    }

    #[test]
    fn test_unparsable_seed_is_dropped() {
        assert_eq!(parse_seed("forty-two"), None);
        assert_eq!(parse_seed("-5"), None);
        assert_eq!(parse_seed("7000"), Some(7000));

        let options = parse_args(&args(&["--seed", "abc", "-n", "3"])).unwrap();
        assert_eq!(options.seed, None);
        assert_eq!(options.steps, 3, "Later options still parse");
    }

    #[test]
    fn test_help_stops_parsing() {
        assert!(parse_args(&args(&["--help"])).is_none());
    }
}

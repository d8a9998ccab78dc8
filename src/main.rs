//! # Dungeon Grammar Command Line
//!
//! Generates one or more dungeons and prints them as text.

use clap::Parser;
use dungeon_grammar::{
    AsciiRenderer, DungeonConfig, DungeonError, DungeonGenerator, DungeonRenderer, DungeonResult,
    Generator,
};
use log::{error, info, LevelFilter};
use std::path::PathBuf;

/// Command line arguments for the dungeon generator.
#[derive(Parser, Debug)]
#[command(name = "dungeon-grammar")]
#[command(about = "Key-gated dungeon generator with grammar-filled rooms")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of dungeons to generate, from consecutive seeds
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u64,

    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rooms grown before the boss and end rooms
    #[arg(long)]
    max_rooms: Option<usize>,

    /// Rooms per gate level before the next locked door
    #[arg(long)]
    max_rooms_per_level: Option<usize>,

    /// Width of the start area
    #[arg(long)]
    start_width: Option<usize>,

    /// Height of the start area
    #[arg(long)]
    start_height: Option<usize>,

    /// Probability of extra doors between same-level neighbours
    #[arg(long)]
    edge_probability: Option<f64>,

    /// Print the per-room table
    #[arg(long)]
    rooms: bool,

    /// Print every room's content grid
    #[arg(long)]
    content: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> DungeonResult<()> {
    let args = Args::parse();

    // Initialize logging
    initialize_logging(&args.log_level)?;

    info!("Starting dungeon-grammar v{}", dungeon_grammar::VERSION);

    let config = build_config(&args)?;
    let generator = DungeonGenerator::new();
    let renderer = AsciiRenderer {
        show_rooms: args.rooms,
        show_content: args.content,
    };

    for offset in 0..args.count {
        let config = DungeonConfig {
            seed: config.seed.wrapping_add(offset),
            ..config.clone()
        };

        let graph = match generator.generate_seeded(&config) {
            Ok(graph) => graph,
            Err(e) if e.is_configuration_error() && args.count > 1 => {
                error!("seed {}: {}", config.seed, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        generator.validate(&graph, &config)?;

        println!("seed {}", config.seed);
        println!("{}", renderer.render(&graph));
    }

    Ok(())
}

/// Starts from the config file (or defaults) and applies command line overrides.
fn build_config(args: &Args) -> DungeonResult<DungeonConfig> {
    let mut config = match &args.config {
        Some(path) => DungeonConfig::from_json_file(path)?,
        None => DungeonConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_rooms) = args.max_rooms {
        config.max_rooms = max_rooms;
    }
    if let Some(per_level) = args.max_rooms_per_level {
        config.max_rooms_per_gate_level = per_level;
    }
    if let Some(width) = args.start_width {
        config.start_area_width = width;
    }
    if let Some(height) = args.start_height {
        config.start_area_height = height;
    }
    if let Some(probability) = args.edge_probability {
        config.extra_edge_probability = probability;
    }

    config.validate()?;
    Ok(config)
}

/// Parses `--log-level`, rejecting names neither logger understands.
fn parse_log_level(log_level: &str) -> DungeonResult<LevelFilter> {
    log_level
        .parse()
        .map_err(|_| DungeonError::InvalidConfig(format!("unknown log level '{}'", log_level)))
}

/// Installs tracing-subscriber with `dev-tools`, env_logger otherwise.
fn initialize_logging(log_level: &str) -> DungeonResult<()> {
    let level = parse_log_level(log_level)?;

    #[cfg(feature = "dev-tools")]
    {
        use tracing_subscriber::filter::LevelFilter as TraceFilter;

        let filter = match level {
            LevelFilter::Off => TraceFilter::OFF,
            LevelFilter::Error => TraceFilter::ERROR,
            LevelFilter::Warn => TraceFilter::WARN,
            LevelFilter::Info => TraceFilter::INFO,
            LevelFilter::Debug => TraceFilter::DEBUG,
            LevelFilter::Trace => TraceFilter::TRACE,
        };
        tracing_subscriber::fmt()
            .with_max_level(filter)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .init();
    }

    Ok(())
}

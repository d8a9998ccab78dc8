//! # Dungeon Grammar
//!
//! Procedural generation of key-gated dungeons with grammar-driven room content.
//!
//! ## Architecture Overview
//!
//! A dungeon is produced by a single, seeded pipeline:
//!
//! - **Graph building**: rooms grow from a start room on an integer grid, each
//!   batch of rooms sitting behind a locked door of a higher gate level
//! - **Boss and end placement**: a leaf becomes the boss room, locked behind the
//!   final gate, and the end room hangs off it
//! - **Graphify**: extra open doors between neighbouring rooms of the same gate
//!   level turn the room tree into a graph
//! - **Intensity**: a normalized difficulty value per room, propagated level by
//!   level over the (possibly cyclic) graph
//! - **Keys**: one key per gate level, in its most intense room
//! - **Content**: every room's cell grid is rewritten by prioritized K×K
//!   pattern rules
//!
//! The same seed and configuration always reproduce the same dungeon.
//!
//! ```
//! use dungeon_grammar::{DungeonConfig, DungeonGenerator, RoomKind};
//!
//! let config = DungeonConfig::for_testing(7);
//! if let Ok(dungeon) = DungeonGenerator::new().generate_seeded(&config) {
//!     assert_eq!(dungeon.boss().map(|boss| boss.kind()), Some(RoomKind::Boss));
//! }
//! ```

pub mod content;
pub mod dungeon;
pub mod generation;
pub mod rendering;

pub use content::*;
pub use dungeon::*;
pub use generation::*;
pub use rendering::*;

/// Core error type for dungeon generation.
#[derive(thiserror::Error, Debug)]
pub enum DungeonError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Input parameters were rejected before generation started
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Parameters turned out to be impossible to satisfy during generation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pipeline stage ran out of order or corrupted the graph
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl DungeonError {
    /// Returns true for failures caused by the supplied parameters rather than
    /// by a bug in the pipeline.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DungeonError::InvalidConfig(_) | DungeonError::Configuration(_)
        )
    }
}

/// Result type used throughout the crate.
pub type DungeonResult<T> = Result<T, DungeonError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default generation parameters.
pub mod config {
    /// Total number of rooms grown before boss and end placement
    pub const DEFAULT_MAX_ROOMS: usize = 16;

    /// Rooms allowed on one gate level before the next lock
    pub const DEFAULT_MAX_ROOMS_PER_GATE_LEVEL: usize = 4;

    /// Probability of an extra open door between same-level neighbours
    pub const DEFAULT_EXTRA_EDGE_PROBABILITY: f64 = 0.3;

    /// Width of every room's content grid
    pub const DEFAULT_CONTENT_WIDTH: usize = 5;

    /// Height of every room's content grid
    pub const DEFAULT_CONTENT_HEIGHT: usize = 5;

    /// Factor applied to the previous level's maximum intensity to seed the next level
    pub const LEVEL_INTENSITY_CARRY: f32 = 0.75;
}

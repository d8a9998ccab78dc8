//! # Generation Module
//!
//! The seeded dungeon pipeline and its configuration.
//!
//! [`DungeonGraphBuilder`] grows the room graph, [`IntensityPropagator`] rates
//! every room, [`KeyPlacer`] hands out keys and the [`ContentFiller`] stamps
//! pattern rules into each room. [`DungeonGenerator`] runs them in that order
//! on one random stream.

pub mod builder;
pub mod intensity;
pub mod keys;
pub mod presets;

pub use builder::*;
pub use intensity::*;
pub use keys::*;

use crate::config::{
    DEFAULT_CONTENT_HEIGHT, DEFAULT_CONTENT_WIDTH, DEFAULT_EXTRA_EDGE_PROBABILITY,
    DEFAULT_MAX_ROOMS, DEFAULT_MAX_ROOMS_PER_GATE_LEVEL,
};
use crate::{
    ContentFiller, DungeonError, DungeonGraph, DungeonResult, FillerConfig, PatternRule, Position,
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for dungeon generation.
///
/// Controls the size and shape of the room graph and how room content is
/// filled. Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Rooms grown before the boss and end rooms are placed
    pub max_rooms: usize,
    /// Rooms allowed on one gate level before the next locked door
    pub max_rooms_per_gate_level: usize,
    /// Width of the area the start room is placed in
    pub start_area_width: usize,
    /// Height of the area the start room is placed in
    pub start_area_height: usize,
    /// Probability of an extra open door between same-level neighbours (0.0 to 1.0)
    pub extra_edge_probability: f64,
    /// Width of every room's content grid
    pub content_width: usize,
    /// Height of every room's content grid
    pub content_height: usize,
    /// Pattern rules applied to every room, in declaration order
    pub patterns: Vec<PatternRule>,
    /// Pattern engine tuning
    pub filler: FillerConfig,
}

impl DungeonConfig {
    /// Creates the default configuration with the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_grammar::DungeonConfig;
    ///
    /// let config = DungeonConfig::new(12345);
    /// assert_eq!(config.seed, 12345);
    /// assert_eq!(config.max_rooms, 16);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_rooms: DEFAULT_MAX_ROOMS,
            max_rooms_per_gate_level: DEFAULT_MAX_ROOMS_PER_GATE_LEVEL,
            start_area_width: 1,
            start_area_height: 1,
            extra_edge_probability: DEFAULT_EXTRA_EDGE_PROBABILITY,
            content_width: DEFAULT_CONTENT_WIDTH,
            content_height: DEFAULT_CONTENT_HEIGHT,
            patterns: presets::default_patterns(),
            filler: FillerConfig::default(),
        }
    }

    /// Creates a configuration for testing with a smaller dungeon.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            max_rooms: 8,
            max_rooms_per_gate_level: 3,
            extra_edge_probability: 0.2,
            content_width: 4,
            content_height: 4,
            ..Self::new(seed)
        }
    }

    /// Rejects parameters no generation run could satisfy.
    pub fn validate(&self) -> DungeonResult<()> {
        if self.max_rooms < 2 {
            return Err(DungeonError::InvalidConfig(format!(
                "max_rooms must be at least 2, got {}",
                self.max_rooms
            )));
        }
        if self.max_rooms_per_gate_level < 2 {
            return Err(DungeonError::InvalidConfig(format!(
                "max_rooms_per_gate_level must be at least 2, got {}",
                self.max_rooms_per_gate_level
            )));
        }
        if self.start_area_width == 0 || self.start_area_height == 0 {
            return Err(DungeonError::InvalidConfig(
                "start area must be at least 1x1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extra_edge_probability) {
            return Err(DungeonError::InvalidConfig(format!(
                "extra_edge_probability must be within [0, 1], got {}",
                self.extra_edge_probability
            )));
        }
        if self.content_width == 0 || self.content_height == 0 {
            return Err(DungeonError::InvalidConfig(
                "content grid must be at least 1x1".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DungeonResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: DungeonConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
///
/// Every pipeline stage that produces a value from a configuration and a
/// random stream implements this, so stages can be run and checked alone.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &DungeonConfig, rng: &mut StdRng) -> DungeonResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &DungeonConfig) -> DungeonResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Runs the whole pipeline: graph, intensity, keys and room content.
#[derive(Debug, Clone, Default)]
pub struct DungeonGenerator {
    builder: DungeonGraphBuilder,
    propagator: IntensityPropagator,
    key_placer: KeyPlacer,
}

impl DungeonGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a dungeon from `config.seed`.
    #[cfg_attr(feature = "dev-tools", tracing::instrument(skip_all, fields(seed = config.seed)))]
    pub fn generate_seeded(&self, config: &DungeonConfig) -> DungeonResult<DungeonGraph> {
        let mut rng = utils::create_rng(config);
        self.generate(config, &mut rng)
    }

    fn fill_rooms(
        &self,
        graph: &mut DungeonGraph,
        config: &DungeonConfig,
        rng: &mut StdRng,
    ) -> DungeonResult<()> {
        let filler = ContentFiller::new(config.filler.clone());
        let positions: Vec<Position> = graph.rooms().iter().map(|room| room.position()).collect();

        for position in positions {
            let room = graph.room_ref(position)?;
            let intensity = room.intensity().ok_or_else(|| {
                DungeonError::InvariantViolation(format!(
                    "room {} filled before intensity propagation",
                    position
                ))
            })?;
            let content = filler.fill(
                config.content_width,
                config.content_height,
                room.door_flags(),
                room.kind_flags(),
                intensity,
                &config.patterns,
                rng,
            );
            graph.set_content(position, content)?;
        }
        Ok(())
    }
}

impl Generator<DungeonGraph> for DungeonGenerator {
    fn generate(&self, config: &DungeonConfig, rng: &mut StdRng) -> DungeonResult<DungeonGraph> {
        let mut graph = self.builder.build(config, rng)?;
        let profile = self.propagator.propagate(&mut graph)?;
        self.key_placer.place_keys(&mut graph)?;
        self.fill_rooms(&mut graph, config, rng)?;

        log::info!(
            "generated dungeon with seed {}: {} rooms, {} gate levels, boss intensity {:.2}",
            config.seed,
            graph.len(),
            graph.final_gate_level() + 1,
            profile.boss_intensity
        );
        Ok(graph)
    }

    fn validate(&self, graph: &DungeonGraph, config: &DungeonConfig) -> DungeonResult<()> {
        self.builder.validate(graph, config)?;
        utils::validate_keys(graph)?;
        utils::validate_solvable(graph)?;

        for room in graph.rooms() {
            let content = room.content().ok_or_else(|| {
                DungeonError::InvariantViolation(format!("room {} has no content", room.position()))
            })?;
            if content.width() != config.content_width || content.height() != config.content_height
            {
                return Err(DungeonError::InvariantViolation(format!(
                    "room {} has a {}x{} grid",
                    room.position(),
                    content.width(),
                    content.height()
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::{Gate, RoomKind};
    use pathfinding::directed::bfs::bfs_reach;
    use rand::SeedableRng;
    use std::collections::{BTreeSet, HashSet};

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &DungeonConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Checks goal rooms, door pairing and the gate-level partition.
    pub fn validate_structure(graph: &DungeonGraph) -> DungeonResult<()> {
        for kind in [RoomKind::Start, RoomKind::Boss, RoomKind::End] {
            let count = graph.rooms().iter().filter(|room| room.kind() == kind).count();
            if count != 1 {
                return Err(DungeonError::InvariantViolation(format!(
                    "expected one {:?} room, found {}",
                    kind, count
                )));
            }
        }

        if let (Some(boss), Some(end)) = (graph.boss(), graph.end()) {
            if boss.children() != [end.position()] {
                return Err(DungeonError::InvariantViolation(
                    "boss room must lead only to the end room".to_string(),
                ));
            }
        }

        for room in graph.rooms() {
            for edge in room.edges() {
                let paired = graph
                    .room(edge.target())
                    .and_then(|target| target.edge_to_position(room.position()))
                    .map(|back| back.gate());
                if !edge.source().is_adjacent(edge.target()) || paired != Some(edge.gate()) {
                    return Err(DungeonError::InvariantViolation(format!(
                        "door {} -> {} has no matching door back",
                        edge.source(),
                        edge.target()
                    )));
                }
            }
        }

        let mut filed = 0;
        for level in graph.gate_levels() {
            for room in graph.rooms_at_level(level) {
                if room.gate_level() != level {
                    return Err(DungeonError::InvariantViolation(format!(
                        "room {} filed under gate level {} but is on {}",
                        room.position(),
                        level,
                        room.gate_level()
                    )));
                }
                filed += 1;
            }
        }
        if filed != graph.len() {
            return Err(DungeonError::InvariantViolation(format!(
                "{} of {} rooms filed by gate level",
                filed,
                graph.len()
            )));
        }
        Ok(())
    }

    /// Checks that every gate level below the final one holds exactly one key.
    pub fn validate_keys(graph: &DungeonGraph) -> DungeonResult<()> {
        let final_level = graph.final_gate_level();
        for level in graph.gate_levels() {
            let keys = graph.rooms_at_level(level).filter(|room| room.has_key()).count();
            let expected = usize::from(level < final_level);
            if keys != expected {
                return Err(DungeonError::InvariantViolation(format!(
                    "gate level {} holds {} keys, expected {}",
                    level, keys, expected
                )));
            }
        }
        Ok(())
    }

    /// Checks that every room can be reached from the start room.
    ///
    /// Exploration starts with only open doors usable. Each key found unlocks
    /// the doors of the next gate level, and exploration repeats until no new
    /// key turns up.
    pub fn validate_solvable(graph: &DungeonGraph) -> DungeonResult<()> {
        let start = graph
            .start()
            .ok_or_else(|| DungeonError::InvariantViolation("no start room".to_string()))?
            .position();

        let mut unlocked: BTreeSet<u32> = BTreeSet::new();
        loop {
            let reached: HashSet<Position> = bfs_reach(start, |&position| {
                graph
                    .room(position)
                    .map(|room| {
                        room.edges()
                            .iter()
                            .filter(|edge| match edge.gate() {
                                Gate::Open => true,
                                Gate::Locked(level) => unlocked.contains(&level),
                            })
                            .map(|edge| edge.target())
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            })
            .collect();

            let newly_unlocked: Vec<u32> = reached
                .iter()
                .filter_map(|&position| graph.room(position))
                .filter(|room| room.has_key())
                .map(|room| room.gate_level() + 1)
                .filter(|level| !unlocked.contains(level))
                .collect();

            if newly_unlocked.is_empty() {
                if reached.len() == graph.len() {
                    return Ok(());
                }
                let stranded = graph
                    .rooms()
                    .iter()
                    .map(|room| room.position())
                    .find(|position| !reached.contains(position));
                return Err(DungeonError::InvariantViolation(format!(
                    "room {} cannot be reached from the start room",
                    stranded.map_or_else(|| "?".to_string(), |p| p.to_string())
                )));
            }
            unlocked.extend(newly_unlocked);
        }
    }
}

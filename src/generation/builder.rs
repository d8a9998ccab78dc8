//! # Graph Builder
//!
//! Grows the room graph from a single start room.
//!
//! This builder creates dungeons by:
//! 1. Placing the start room somewhere in the start area, on gate level 0
//! 2. Growing child rooms from random parents of the current gate level,
//!    advancing the gate level (and locking the new door) whenever the level
//!    is full or has no free side left
//! 3. Turning a leaf into the boss room behind the final gate, with the end
//!    room attached to it
//! 4. Adding extra open doors between neighbouring rooms of the same level

use crate::{
    DungeonConfig, DungeonError, DungeonGraph, DungeonResult, Gate, Generator, Position, RoomKind,
    RoomNode,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Builds the room graph (no intensity, keys or content yet).
#[derive(Debug, Clone, Default)]
pub struct DungeonGraphBuilder;

impl DungeonGraphBuilder {
    /// Creates a new graph builder.
    pub fn new() -> Self {
        Self
    }

    /// Runs every graph-building step with the given random stream.
    #[cfg_attr(feature = "dev-tools", tracing::instrument(skip_all, fields(max_rooms = config.max_rooms)))]
    pub fn build<R: Rng>(&self, config: &DungeonConfig, rng: &mut R) -> DungeonResult<DungeonGraph> {
        config.validate()?;

        let mut graph = DungeonGraph::new();
        let start = self.place_start_room(&mut graph, config, rng)?;
        log::debug!("start room placed at {}", start);

        let last_level = self.grow_rooms(&mut graph, config, rng)?;
        log::debug!(
            "grew {} rooms over {} gate levels",
            graph.len(),
            last_level + 1
        );

        let boss = self.place_boss_and_end(&mut graph, last_level + 1, rng)?;
        log::debug!("boss room at {} on gate level {}", boss, last_level + 1);

        let added = self.graphify(&mut graph, config.extra_edge_probability, rng)?;
        log::debug!("graphify added {} doors", added);

        Ok(graph)
    }

    fn place_start_room<R: Rng>(
        &self,
        graph: &mut DungeonGraph,
        config: &DungeonConfig,
        rng: &mut R,
    ) -> DungeonResult<Position> {
        let x = rng.gen_range(0..config.start_area_width) as i32;
        let y = rng.gen_range(0..config.start_area_height) as i32;
        let position = Position::new(x, y);

        graph.add_room(RoomNode::new(position, 0, RoomKind::Start))?;
        Ok(position)
    }

    /// Adds rooms until `max_rooms` is reached. Returns the last gate level used.
    fn grow_rooms<R: Rng>(
        &self,
        graph: &mut DungeonGraph,
        config: &DungeonConfig,
        rng: &mut R,
    ) -> DungeonResult<u32> {
        let mut level = 0;

        while graph.len() < config.max_rooms {
            let mut lock_door = false;

            let mut parent = random_room_with_free_side(graph, graph.level_positions(level), rng);
            if parent.is_none() {
                // Current level is boxed in: branch off anywhere behind a new lock
                let everywhere: Vec<Position> =
                    graph.rooms().iter().map(RoomNode::position).collect();
                parent = random_room_with_free_side(graph, &everywhere, rng);
                level += 1;
                graph.open_level(level);
                lock_door = true;
            }

            let parent = parent.ok_or_else(|| {
                DungeonError::Configuration(format!(
                    "no room with a free side left after {} rooms",
                    graph.len()
                ))
            })?;

            if !lock_door && graph.level_positions(level).len() >= config.max_rooms_per_gate_level {
                level += 1;
                graph.open_level(level);
                lock_door = true;
            }

            let child = *graph.free_adjacent(parent).choose(rng).ok_or_else(|| {
                DungeonError::InvariantViolation(format!("room {} has no free side", parent))
            })?;
            let gate = if lock_door {
                Gate::Locked(level)
            } else {
                Gate::Open
            };

            graph.add_room(RoomNode::new(child, level, RoomKind::Normal))?;
            graph.attach_child(parent, child, gate)?;
            log::trace!("room {} grown from {} ({:?})", child, parent, gate);
        }

        Ok(level)
    }

    /// Promotes a random leaf to boss on `final_level` and attaches the end room.
    fn place_boss_and_end<R: Rng>(
        &self,
        graph: &mut DungeonGraph,
        final_level: u32,
        rng: &mut R,
    ) -> DungeonResult<Position> {
        graph.open_level(final_level);

        // A leaf that is alone on its level would leave that level empty
        let mut leaves: Vec<Position> = graph
            .rooms()
            .iter()
            .filter(|room| {
                room.is_leaf()
                    && room.kind() == RoomKind::Normal
                    && graph.level_positions(room.gate_level()).len() > 1
            })
            .map(RoomNode::position)
            .collect();
        leaves.shuffle(rng);

        let boss = leaves
            .into_iter()
            .find(|&leaf| graph.has_free_adjacent(leaf))
            .ok_or_else(|| {
                DungeonError::Configuration("no leaf room available for the boss".to_string())
            })?;
        let parent = graph.room_ref(boss)?.parent().ok_or_else(|| {
            DungeonError::InvariantViolation(format!("boss candidate {} has no parent", boss))
        })?;

        // Gate level moves before the door is re-gated
        graph.set_kind(boss, RoomKind::Boss)?;
        graph.set_gate_level(boss, final_level)?;
        graph.regate(boss, parent, Gate::Locked(final_level))?;

        let end = *graph.free_adjacent(boss).choose(rng).ok_or_else(|| {
            DungeonError::InvariantViolation(format!("boss room {} has no free side", boss))
        })?;
        graph.add_room(RoomNode::new(end, final_level, RoomKind::End))?;
        graph.attach_child(boss, end, Gate::Open)?;

        Ok(boss)
    }

    /// Adds open doors between unlinked neighbours on the same gate level,
    /// each with probability `probability`. Boss and end rooms are left
    /// alone. Returns the number of door pairs added.
    fn graphify<R: Rng>(
        &self,
        graph: &mut DungeonGraph,
        probability: f64,
        rng: &mut R,
    ) -> DungeonResult<usize> {
        let mut added = 0;
        let positions: Vec<Position> = graph.rooms().iter().map(RoomNode::position).collect();

        for position in positions {
            let room = graph.room_ref(position)?;
            if room.kind().is_boss_or_end() {
                continue;
            }

            let candidates: Vec<Position> = graph
                .adjacent_rooms(position)
                .into_iter()
                .filter(|adjacent| {
                    !adjacent.kind().is_boss_or_end()
                        && adjacent.gate_level() == room.gate_level()
                        && !room.is_linked_to(adjacent.position())
                })
                .map(RoomNode::position)
                .collect();

            for adjacent in candidates {
                if rng.gen_bool(probability) {
                    graph.cross_link(position, adjacent)?;
                    added += 1;
                }
            }
        }

        Ok(added)
    }
}

/// Shuffles a copy of `candidates` and returns the first room with an
/// unoccupied side.
fn random_room_with_free_side<R: Rng>(
    graph: &DungeonGraph,
    candidates: &[Position],
    rng: &mut R,
) -> Option<Position> {
    let mut shuffled = candidates.to_vec();
    shuffled.shuffle(rng);
    shuffled
        .into_iter()
        .find(|&position| graph.has_free_adjacent(position))
}

impl Generator<DungeonGraph> for DungeonGraphBuilder {
    fn generate(&self, config: &DungeonConfig, rng: &mut StdRng) -> DungeonResult<DungeonGraph> {
        self.build(config, rng)
    }

    fn validate(&self, graph: &DungeonGraph, config: &DungeonConfig) -> DungeonResult<()> {
        // Boss and end come on top of the grown rooms
        if graph.len() != config.max_rooms + 1 {
            return Err(DungeonError::InvariantViolation(format!(
                "expected {} rooms, found {}",
                config.max_rooms + 1,
                graph.len()
            )));
        }
        crate::generation::utils::validate_structure(graph)
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGraphBuilder"
    }
}

//! # Intensity Propagation
//!
//! Assigns every room a difficulty value in `[0, 1]`.
//!
//! Gate levels are processed in increasing order. Each level is seeded with
//! 0.75 times the previous level's maximum and walked from its entry room
//! over same-level children. Graphify can close cycles, so the walk keeps a
//! best-known value per room and only revisits a room when its value can be
//! tightened downwards. The boss ends one above the overall maximum, the end
//! room drops to zero, and everything is divided by the boss value.

use crate::config::LEVEL_INTENSITY_CARRY;
use crate::{DungeonError, DungeonGraph, DungeonResult, Position, RoomKind};
use std::collections::HashMap;

/// Raw (pre-normalization) values recorded while propagating.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntensityProfile {
    /// Seed used for each gate level below the final one
    pub level_seeds: Vec<f32>,
    /// Highest raw intensity reached on each of those levels
    pub level_maxima: Vec<f32>,
    /// Raw boss intensity, the normalization divisor
    pub boss_intensity: f32,
}

/// Computes room intensities in place.
#[derive(Debug, Clone, Default)]
pub struct IntensityPropagator;

impl IntensityPropagator {
    pub fn new() -> Self {
        Self
    }

    /// Propagates and normalizes intensity over the whole graph.
    #[cfg_attr(feature = "dev-tools", tracing::instrument(skip_all))]
    pub fn propagate(&self, graph: &mut DungeonGraph) -> DungeonResult<IntensityProfile> {
        let final_level = graph.boss().map(|boss| boss.gate_level()).ok_or_else(|| {
            DungeonError::Configuration("no boss room to propagate intensity towards".to_string())
        })?;

        let mut profile = IntensityProfile::default();
        let mut raw: HashMap<Position, f32> = HashMap::new();
        let mut previous_max = 0.0_f32;

        for level in 0..final_level {
            let seed = if level == 0 {
                0.0
            } else {
                previous_max * LEVEL_INTENSITY_CARRY
            };
            let level_values = propagate_level(graph, level, seed)?;
            let level_max = level_values
                .values()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max);

            log::trace!(
                "gate level {}: seed {:.2}, max {:.2}, {} rooms",
                level,
                seed,
                level_max,
                level_values.len()
            );
            profile.level_seeds.push(seed);
            profile.level_maxima.push(level_max);
            previous_max = level_max;
            raw.extend(level_values);
        }

        let overall_max = profile
            .level_maxima
            .iter()
            .copied()
            .fold(0.0_f32, f32::max);
        let (boss, end) = boss_and_end(graph)?;
        let boss_intensity = overall_max + 1.0;
        raw.insert(boss, boss_intensity);
        raw.insert(end, 0.0);
        profile.boss_intensity = boss_intensity;

        if raw.len() != graph.len() {
            return Err(DungeonError::InvariantViolation(format!(
                "intensity reached {} of {} rooms",
                raw.len(),
                graph.len()
            )));
        }

        // Normalize in creation order
        let positions: Vec<Position> = graph.rooms().iter().map(|room| room.position()).collect();
        for position in positions {
            let value = raw[&position] / boss_intensity;
            graph.set_intensity(position, value)?;
        }

        log::debug!(
            "intensity propagated over {} levels, boss raw intensity {:.2}",
            final_level,
            boss_intensity
        );
        Ok(profile)
    }
}

/// Walks one gate level from its entry room and returns the settled raw
/// value of every room on it.
fn propagate_level(
    graph: &DungeonGraph,
    level: u32,
    seed: f32,
) -> DungeonResult<HashMap<Position, f32>> {
    let entries: Vec<Position> = graph
        .rooms_at_level(level)
        .filter(|room| match room.parent() {
            None => true,
            Some(parent) => graph
                .room(parent)
                .map_or(true, |parent| parent.gate_level() != level),
        })
        .map(|room| room.position())
        .collect();
    let entry = match entries.as_slice() {
        [entry] => *entry,
        _ => {
            return Err(DungeonError::Configuration(format!(
                "gate level {} has {} entry rooms instead of one",
                level,
                entries.len()
            )))
        }
    };

    let mut best: HashMap<Position, f32> = HashMap::new();
    // (room, value handed down by the room that reached it)
    let mut stack = vec![(entry, seed)];

    while let Some((position, incoming)) = stack.pop() {
        if let Some(&known) = best.get(&position) {
            if known <= incoming + 1.0 {
                continue;
            }
        }

        let room = graph.room_ref(position)?;
        let same_level_children = move || {
            room.children()
                .iter()
                .copied()
                .filter(move |&child| child != position)
                .filter(move |&child| {
                    graph
                        .room(child)
                        .map_or(false, |child| child.gate_level() == level)
                })
        };

        let settled_min = same_level_children()
            .filter_map(|child| best.get(&child).copied())
            .fold(f32::INFINITY, f32::min);
        let value = seed.max(incoming.min(settled_min)) + 1.0;
        best.insert(position, value);

        // Pushed in reverse so children are walked in their stored order
        let next: Vec<Position> = same_level_children()
            .filter(|child| best.get(child).map_or(true, |&known| known > value + 1.0))
            .collect();
        stack.extend(next.into_iter().rev().map(|child| (child, value)));
    }

    let expected = graph.level_positions(level).len();
    if best.len() != expected {
        return Err(DungeonError::InvariantViolation(format!(
            "gate level {}: walked {} of {} rooms",
            level,
            best.len(),
            expected
        )));
    }
    Ok(best)
}

fn boss_and_end(graph: &DungeonGraph) -> DungeonResult<(Position, Position)> {
    let boss = graph
        .boss()
        .ok_or_else(|| DungeonError::Configuration("no boss room".to_string()))?;
    match boss.children() {
        [end] if graph.room(*end).map(|room| room.kind()) == Some(RoomKind::End) => {
            Ok((boss.position(), *end))
        }
        children => Err(DungeonError::Configuration(format!(
            "boss room must lead only to the end room, it has {} children",
            children.len()
        ))),
    }
}

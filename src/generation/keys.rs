//! Key placement: one key per gate level below the boss level, in the
//! hardest room of that level. The key found on level `n` opens the doors
//! locked with `Gate::Locked(n + 1)`.

use crate::{DungeonError, DungeonGraph, DungeonResult, Position, RoomNode};

#[derive(Debug, Clone, Default)]
pub struct KeyPlacer;

impl KeyPlacer {
    pub fn new() -> Self {
        Self
    }

    /// Marks one key room per gate level. Intensities must already be set.
    #[cfg_attr(feature = "dev-tools", tracing::instrument(skip_all))]
    pub fn place_keys(&self, graph: &mut DungeonGraph) -> DungeonResult<()> {
        let final_level = graph.final_gate_level();

        for level in 0..final_level {
            let key_room = choose_key_room(graph, level)?;
            graph.set_has_key(key_room, true)?;
            log::trace!("key for gate level {} placed at {}", level + 1, key_room);
        }

        log::debug!("placed {} keys", final_level);
        Ok(())
    }
}

/// The most intense room of `level`. Among ties, a room whose children all
/// stay on the level wins, so the key never sits right before a locked door.
fn choose_key_room(graph: &DungeonGraph, level: u32) -> DungeonResult<Position> {
    let mut hardest: Vec<&RoomNode> = Vec::new();
    let mut max = f32::NEG_INFINITY;

    for room in graph.rooms_at_level(level) {
        let intensity = room.intensity().ok_or_else(|| {
            DungeonError::InvariantViolation(format!(
                "room {} has no intensity before key placement",
                room.position()
            ))
        })?;
        if intensity > max {
            max = intensity;
            hardest.clear();
            hardest.push(room);
        } else if intensity == max {
            hardest.push(room);
        }
    }

    let stays_on_level = |room: &&RoomNode| {
        room.children().iter().all(|&child| {
            graph
                .room(child)
                .map_or(false, |child| child.gate_level() == level)
        })
    };

    hardest
        .iter()
        .copied()
        .find(stays_on_level)
        .or_else(|| hardest.first().copied())
        .map(|room| room.position())
        .ok_or_else(|| {
            DungeonError::Configuration(format!("gate level {} has no room for its key", level))
        })
}

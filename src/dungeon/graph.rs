//! # Dungeon Graph
//!
//! Owner of every [`RoomNode`], with a coordinate index and a partition of the
//! rooms by gate level.
//!
//! Rooms are kept in creation order. The gate-level partition keeps insertion
//! order too, so "the first room of a level" is deterministic. Every gate
//! level change goes through `DungeonGraph::set_gate_level`, which moves the
//! room between partition buckets.

use crate::{
    Direction, DungeonError, DungeonResult, Edge, Gate, Position, RoomContent, RoomKind, RoomNode,
};
use std::collections::{BTreeMap, HashMap};

/// The generated dungeon: rooms, doors and gate-level partition.
///
/// Only the generation pipeline mutates a graph. Outside the crate a finished
/// dungeon is read-only:
///
/// ```compile_fail
/// use dungeon_grammar::{DungeonGraph, Position, RoomKind, RoomNode};
///
/// let mut graph = DungeonGraph::new();
/// graph.add_room(RoomNode::new(Position::origin(), 0, RoomKind::Start));
/// ```
///
/// ```compile_fail
/// use dungeon_grammar::{DungeonConfig, DungeonGenerator, Gate, Position};
///
/// let mut graph = DungeonGenerator::new().generate_seeded(&DungeonConfig::new(1)).unwrap();
/// let start = graph.start().unwrap().position();
/// graph.link(start, Position::new(start.x + 1, start.y), Gate::Open);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DungeonGraph {
    rooms: Vec<RoomNode>,
    index: HashMap<Position, usize>,
    levels: BTreeMap<u32, Vec<Position>>,
}

impl DungeonGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// All rooms in creation order.
    pub fn rooms(&self) -> &[RoomNode] {
        &self.rooms
    }

    /// The room at `position`, if any.
    pub fn room(&self, position: Position) -> Option<&RoomNode> {
        self.index.get(&position).map(|&i| &self.rooms[i])
    }

    pub fn contains(&self, position: Position) -> bool {
        self.index.contains_key(&position)
    }

    /// The room next to `room` in `direction`, whether or not a door exists.
    pub fn neighbor(&self, room: &RoomNode, direction: Direction) -> Option<&RoomNode> {
        self.room(room.position().step(direction))
    }

    /// The door leaving `room` in `direction`, if there is one.
    pub fn edge_to<'a>(&self, room: &'a RoomNode, direction: Direction) -> Option<&'a Edge> {
        room.edge_to_position(room.position().step(direction))
    }

    /// The start room.
    pub fn start(&self) -> Option<&RoomNode> {
        self.first_of_kind(RoomKind::Start)
    }

    /// The boss room, once placed.
    pub fn boss(&self) -> Option<&RoomNode> {
        self.first_of_kind(RoomKind::Boss)
    }

    /// The end room, once placed.
    pub fn end(&self) -> Option<&RoomNode> {
        self.first_of_kind(RoomKind::End)
    }

    fn first_of_kind(&self, kind: RoomKind) -> Option<&RoomNode> {
        self.rooms.iter().find(|room| room.kind() == kind)
    }

    /// Gate levels in increasing order.
    pub fn gate_levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels.keys().copied()
    }

    /// The highest gate level present (the boss level once placed).
    pub fn final_gate_level(&self) -> u32 {
        self.levels.keys().next_back().copied().unwrap_or(0)
    }

    /// Coordinates of the rooms at `level`, in the order they joined it.
    pub fn level_positions(&self, level: u32) -> &[Position] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rooms at `level`, in the order they joined it.
    pub fn rooms_at_level(&self, level: u32) -> impl Iterator<Item = &RoomNode> + '_ {
        self.level_positions(level)
            .iter()
            .filter_map(move |&position| self.room(position))
    }

    /// The room through which `level` is entered: the first room of the level
    /// without a parent, or whose parent sits on another level.
    pub fn level_entry(&self, level: u32) -> Option<&RoomNode> {
        self.rooms_at_level(level).find(|room| match room.parent() {
            None => true,
            Some(parent) => self
                .room(parent)
                .map_or(true, |parent| parent.gate_level() != level),
        })
    }

    /// Unoccupied coordinates next to `position`, in North, East, South, West order.
    pub fn free_adjacent(&self, position: Position) -> Vec<Position> {
        position
            .cardinal_adjacent_positions()
            .into_iter()
            .filter(|candidate| !self.contains(*candidate))
            .collect()
    }

    pub fn has_free_adjacent(&self, position: Position) -> bool {
        position
            .cardinal_adjacent_positions()
            .iter()
            .any(|candidate| !self.contains(*candidate))
    }

    /// Existing rooms next to `position`, in North, East, South, West order.
    pub fn adjacent_rooms(&self, position: Position) -> Vec<&RoomNode> {
        position
            .cardinal_adjacent_positions()
            .into_iter()
            .filter_map(|candidate| self.room(candidate))
            .collect()
    }

    /// Adds a room and files it under its gate level.
    pub(crate) fn add_room(&mut self, room: RoomNode) -> DungeonResult<()> {
        let position = room.position();
        if self.contains(position) {
            return Err(DungeonError::InvariantViolation(format!(
                "a room already exists at {}",
                position
            )));
        }

        self.levels
            .entry(room.gate_level())
            .or_default()
            .push(position);
        self.index.insert(position, self.rooms.len());
        self.rooms.push(room);
        Ok(())
    }

    /// Makes sure a (possibly empty) bucket exists for `level`.
    pub(crate) fn open_level(&mut self, level: u32) {
        self.levels.entry(level).or_default();
    }

    /// Moves a room to another gate level, keeping the partition consistent.
    pub(crate) fn set_gate_level(&mut self, position: Position, level: u32) -> DungeonResult<()> {
        let old_level = self.room_ref(position)?.gate_level();
        if old_level == level {
            return Ok(());
        }

        if let Some(bucket) = self.levels.get_mut(&old_level) {
            bucket.retain(|&p| p != position);
        }
        self.levels.entry(level).or_default().push(position);
        self.room_mut(position)?.set_gate_level(level);
        debug_assert_eq!(
            self.levels.values().map(Vec::len).sum::<usize>(),
            self.rooms.len()
        );
        Ok(())
    }

    /// Creates (or re-gates) the door pair between two adjacent rooms.
    pub(crate) fn link(&mut self, a: Position, b: Position, gate: Gate) -> DungeonResult<()> {
        if !a.is_adjacent(b) {
            return Err(DungeonError::InvariantViolation(format!(
                "cannot link non-adjacent rooms {} and {}",
                a, b
            )));
        }
        self.room_ref(b)?;
        self.room_mut(a)?.link(b, gate);
        self.room_mut(b)?.link(a, gate);
        Ok(())
    }

    /// Changes the gate of the existing door pair between two rooms.
    pub(crate) fn regate(&mut self, a: Position, b: Position, gate: Gate) -> DungeonResult<()> {
        let forward = self.room_mut(a)?.regate(b, gate);
        let backward = self.room_mut(b)?.regate(a, gate);
        if !(forward && backward) {
            return Err(DungeonError::InvariantViolation(format!(
                "no door between {} and {} to re-gate",
                a, b
            )));
        }
        Ok(())
    }

    /// Links `child` under `parent` as its primary parent.
    pub(crate) fn attach_child(
        &mut self,
        parent: Position,
        child: Position,
        gate: Gate,
    ) -> DungeonResult<()> {
        self.link(parent, child, gate)?;
        self.room_mut(child)?.set_parent(parent);
        self.room_mut(parent)?.add_child(child);
        Ok(())
    }

    /// Adds an open door between two rooms that only updates the children
    /// lists, leaving primary parents untouched.
    pub(crate) fn cross_link(&mut self, a: Position, b: Position) -> DungeonResult<()> {
        self.link(a, b, Gate::Open)?;
        self.room_mut(a)?.add_child(b);
        self.room_mut(b)?.add_child(a);
        Ok(())
    }

    pub(crate) fn set_kind(&mut self, position: Position, kind: RoomKind) -> DungeonResult<()> {
        self.room_mut(position)?.set_kind(kind);
        Ok(())
    }

    pub(crate) fn set_intensity(&mut self, position: Position, intensity: f32) -> DungeonResult<()> {
        self.room_mut(position)?.set_intensity(intensity);
        Ok(())
    }

    pub(crate) fn set_has_key(&mut self, position: Position, has_key: bool) -> DungeonResult<()> {
        self.room_mut(position)?.set_has_key(has_key);
        Ok(())
    }

    pub(crate) fn set_content(&mut self, position: Position, content: RoomContent) -> DungeonResult<()> {
        self.room_mut(position)?.set_content(content);
        Ok(())
    }

    /// Like [`DungeonGraph::room`], but a missing room is a pipeline bug.
    pub(crate) fn room_ref(&self, position: Position) -> DungeonResult<&RoomNode> {
        self.room(position).ok_or_else(|| missing_room(position))
    }

    fn room_mut(&mut self, position: Position) -> DungeonResult<&mut RoomNode> {
        match self.index.get(&position) {
            Some(&i) => Ok(&mut self.rooms[i]),
            None => Err(missing_room(position)),
        }
    }
}

fn missing_room(position: Position) -> DungeonError {
    DungeonError::InvariantViolation(format!("no room at {}", position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_room_graph() -> DungeonGraph {
        let mut graph = DungeonGraph::new();
        graph
            .add_room(RoomNode::new(Position::new(0, 0), 0, RoomKind::Start))
            .unwrap();
        graph
            .add_room(RoomNode::new(Position::new(0, 1), 0, RoomKind::Normal))
            .unwrap();
        graph
            .attach_child(Position::new(0, 0), Position::new(0, 1), Gate::Open)
            .unwrap();
        graph
    }

    #[test]
    fn test_add_room_rejects_duplicates() {
        let mut graph = two_room_graph();
        let result = graph.add_room(RoomNode::new(Position::new(0, 1), 3, RoomKind::Normal));
        assert!(matches!(result, Err(DungeonError::InvariantViolation(_))));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_attach_child_links_both_ways() {
        let graph = two_room_graph();
        let start = graph.room(Position::new(0, 0)).unwrap();
        let child = graph.room(Position::new(0, 1)).unwrap();

        assert_eq!(start.children(), &[Position::new(0, 1)]);
        assert_eq!(child.parent(), Some(Position::new(0, 0)));
        assert_eq!(
            graph.edge_to(start, Direction::North).map(Edge::gate),
            Some(Gate::Open)
        );
        assert_eq!(
            graph.edge_to(child, Direction::South).map(Edge::gate),
            Some(Gate::Open)
        );
        assert!(graph.edge_to(start, Direction::East).is_none());
    }

    #[test]
    fn test_edge_borrows_from_room_not_graph() {
        let room = two_room_graph().room(Position::origin()).cloned().unwrap();
        let edge = DungeonGraph::new().edge_to(&room, Direction::North);
        assert_eq!(edge.map(Edge::target), Some(Position::new(0, 1)));
    }

    #[test]
    fn test_neighbor_is_pure_coordinate_lookup() {
        let mut graph = two_room_graph();
        graph
            .add_room(RoomNode::new(Position::new(1, 0), 0, RoomKind::Normal))
            .unwrap();
        let start = graph.room(Position::origin()).unwrap();

        // Present but not linked
        assert_eq!(
            graph.neighbor(start, Direction::East).map(RoomNode::position),
            Some(Position::new(1, 0))
        );
        assert!(graph.edge_to(start, Direction::East).is_none());
        assert!(graph.neighbor(start, Direction::West).is_none());
    }

    #[test]
    fn test_set_gate_level_moves_bucket() {
        let mut graph = two_room_graph();
        graph.set_gate_level(Position::new(0, 1), 2).unwrap();

        assert_eq!(graph.level_positions(0), &[Position::new(0, 0)]);
        assert_eq!(graph.level_positions(2), &[Position::new(0, 1)]);
        assert_eq!(graph.room(Position::new(0, 1)).unwrap().gate_level(), 2);
        assert_eq!(graph.final_gate_level(), 2);
    }

    #[test]
    fn test_regate_existing_edge_only() {
        let mut graph = two_room_graph();
        graph
            .regate(Position::new(0, 0), Position::new(0, 1), Gate::Locked(1))
            .unwrap();
        let start = graph.room(Position::origin()).unwrap();
        assert_eq!(start.edges().len(), 1);
        assert_eq!(start.edges()[0].gate(), Gate::Locked(1));

        graph
            .add_room(RoomNode::new(Position::new(1, 0), 0, RoomKind::Normal))
            .unwrap();
        let result = graph.regate(Position::new(0, 0), Position::new(1, 0), Gate::Open);
        assert!(matches!(result, Err(DungeonError::InvariantViolation(_))));
    }

    #[test]
    fn test_link_rejects_distant_rooms() {
        let mut graph = two_room_graph();
        graph
            .add_room(RoomNode::new(Position::new(2, 2), 0, RoomKind::Normal))
            .unwrap();
        assert!(graph
            .link(Position::new(0, 0), Position::new(2, 2), Gate::Open)
            .is_err());
    }

    #[test]
    fn test_free_adjacent_and_level_entry() {
        let graph = two_room_graph();
        assert_eq!(
            graph.free_adjacent(Position::origin()),
            vec![Position::new(1, 0), Position::new(0, -1), Position::new(-1, 0)]
        );
        assert_eq!(
            graph.level_entry(0).map(RoomNode::position),
            Some(Position::origin())
        );
        assert!(graph.level_entry(5).is_none());
    }

    #[test]
    fn test_cross_link_keeps_primary_parent() {
        let mut graph = two_room_graph();
        graph
            .add_room(RoomNode::new(Position::new(1, 0), 0, RoomKind::Normal))
            .unwrap();
        graph
            .attach_child(Position::new(0, 0), Position::new(1, 0), Gate::Open)
            .unwrap();
        graph
            .add_room(RoomNode::new(Position::new(1, 1), 0, RoomKind::Normal))
            .unwrap();
        graph
            .attach_child(Position::new(0, 1), Position::new(1, 1), Gate::Open)
            .unwrap();

        graph
            .cross_link(Position::new(1, 0), Position::new(1, 1))
            .unwrap();

        let east = graph.room(Position::new(1, 0)).unwrap();
        let corner = graph.room(Position::new(1, 1)).unwrap();
        assert_eq!(corner.parent(), Some(Position::new(0, 1)));
        assert!(east.children().contains(&Position::new(1, 1)));
        assert!(corner.children().contains(&Position::new(1, 0)));
    }
}

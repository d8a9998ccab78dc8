//! # Rooms and Doors
//!
//! A [`RoomNode`] is one vertex of the dungeon graph. It is identified by its
//! coordinate and owns its outgoing [`Edge`]s. Parent and child relations are
//! stored as coordinates and resolved through the owning
//! [`DungeonGraph`](crate::DungeonGraph).

use crate::{Direction, DirectionFlags, Position, RoomContent, RoomKind, RoomKindFlags};
use serde::{Deserialize, Serialize};

/// Requirement for walking through a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    /// Always traversable
    Open,
    /// Traversable once the key unlocking this gate level has been collected
    Locked(u32),
}

impl Gate {
    /// The gate level required, if any.
    pub fn required_level(self) -> Option<u32> {
        match self {
            Gate::Open => None,
            Gate::Locked(level) => Some(level),
        }
    }

    /// Encodes the gate as `-1` for open doors or the required level.
    ///
    /// ```
    /// use dungeon_grammar::Gate;
    ///
    /// assert_eq!(Gate::Open.as_raw(), -1);
    /// assert_eq!(Gate::Locked(3).as_raw(), 3);
    /// ```
    pub fn as_raw(self) -> i64 {
        match self {
            Gate::Open => -1,
            Gate::Locked(level) => i64::from(level),
        }
    }

    pub fn is_locked(self) -> bool {
        matches!(self, Gate::Locked(_))
    }
}

/// A directed door between two adjacent rooms.
///
/// Doors are always created in pairs, one per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    source: Position,
    target: Position,
    gate: Gate,
}

impl Edge {
    pub(crate) fn new(source: Position, target: Position, gate: Gate) -> Self {
        Self {
            source,
            target,
            gate,
        }
    }

    pub fn source(&self) -> Position {
        self.source
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn gate(&self) -> Gate {
        self.gate
    }

    /// Direction of the door as seen from its source room.
    pub fn direction(&self) -> Option<Direction> {
        self.source.direction_to(self.target)
    }
}

/// One room of the dungeon graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomNode {
    position: Position,
    gate_level: u32,
    kind: RoomKind,
    intensity: Option<f32>,
    has_key: bool,
    edges: Vec<Edge>,
    parent: Option<Position>,
    children: Vec<Position>,
    content: Option<RoomContent>,
}

impl RoomNode {
    /// Creates a room with no doors, no key and no intensity yet.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_grammar::{Position, RoomKind, RoomNode};
    ///
    /// let room = RoomNode::new(Position::new(1, 2), 0, RoomKind::Start);
    /// assert_eq!(room.position(), Position::new(1, 2));
    /// assert!(room.edges().is_empty());
    /// assert_eq!(room.intensity(), None);
    /// ```
    pub fn new(position: Position, gate_level: u32, kind: RoomKind) -> Self {
        Self {
            position,
            gate_level,
            kind,
            intensity: None,
            has_key: false,
            edges: Vec::new(),
            parent: None,
            children: Vec::new(),
            content: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn gate_level(&self) -> u32 {
        self.gate_level
    }

    pub fn kind(&self) -> RoomKind {
        self.kind
    }

    /// Normalized difficulty, available once intensity has been propagated.
    pub fn intensity(&self) -> Option<f32> {
        self.intensity
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The room that created this one during graph growth.
    pub fn parent(&self) -> Option<Position> {
        self.parent
    }

    /// Rooms this room leads to, including the extra links added by graphify.
    pub fn children(&self) -> &[Position] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The filled content grid, available once content has been generated.
    pub fn content(&self) -> Option<&RoomContent> {
        self.content.as_ref()
    }

    /// The door leading to `target`, if the rooms are linked.
    pub fn edge_to_position(&self, target: Position) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.target == target)
    }

    pub fn is_linked_to(&self, target: Position) -> bool {
        self.edge_to_position(target).is_some()
    }

    /// Sides of the room that have a door.
    pub fn door_flags(&self) -> DirectionFlags {
        self.edges
            .iter()
            .filter_map(Edge::direction)
            .fold(DirectionFlags::empty(), |flags, direction| {
                flags | direction.flag()
            })
    }

    /// Flags pattern rules are matched against: the kind, plus `KEY` for key rooms.
    pub fn kind_flags(&self) -> RoomKindFlags {
        if self.has_key {
            self.kind.flag() | RoomKindFlags::KEY
        } else {
            self.kind.flag()
        }
    }

    /// Adds a door to `target`, or re-gates the existing one in place.
    pub(crate) fn link(&mut self, target: Position, gate: Gate) {
        match self.edges.iter_mut().find(|edge| edge.target == target) {
            Some(edge) => edge.gate = gate,
            None => self.edges.push(Edge::new(self.position, target, gate)),
        }
    }

    /// Changes the gate of an existing door. Returns false if there is no such door.
    pub(crate) fn regate(&mut self, target: Position, gate: Gate) -> bool {
        match self.edges.iter_mut().find(|edge| edge.target == target) {
            Some(edge) => {
                edge.gate = gate;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_gate_level(&mut self, gate_level: u32) {
        self.gate_level = gate_level;
    }

    pub(crate) fn set_kind(&mut self, kind: RoomKind) {
        self.kind = kind;
    }

    pub(crate) fn set_intensity(&mut self, intensity: f32) {
        self.intensity = Some(intensity);
    }

    pub(crate) fn set_has_key(&mut self, has_key: bool) {
        self.has_key = has_key;
    }

    pub(crate) fn set_parent(&mut self, parent: Position) {
        self.parent = Some(parent);
    }

    pub(crate) fn add_child(&mut self, child: Position) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn set_content(&mut self, content: RoomContent) {
        self.content = Some(content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_regates_in_place() {
        let mut room = RoomNode::new(Position::new(0, 0), 0, RoomKind::Normal);
        room.link(Position::new(1, 0), Gate::Open);
        room.link(Position::new(1, 0), Gate::Locked(2));

        assert_eq!(room.edges().len(), 1);
        assert_eq!(room.edges()[0].gate(), Gate::Locked(2));
        assert_eq!(room.edges()[0].direction(), Some(Direction::East));
    }

    #[test]
    fn test_regate_missing_edge() {
        let mut room = RoomNode::new(Position::new(0, 0), 0, RoomKind::Normal);
        assert!(!room.regate(Position::new(0, 1), Gate::Open));
        assert!(room.edges().is_empty());
    }

    #[test]
    fn test_door_flags() {
        let mut room = RoomNode::new(Position::new(3, 3), 1, RoomKind::Normal);
        room.link(Position::new(3, 4), Gate::Open);
        room.link(Position::new(2, 3), Gate::Locked(1));

        assert_eq!(room.door_flags(), DirectionFlags::NORTH | DirectionFlags::WEST);
    }

    #[test]
    fn test_kind_flags_include_key() {
        let mut room = RoomNode::new(Position::origin(), 0, RoomKind::Start);
        assert_eq!(room.kind_flags(), RoomKindFlags::START);

        room.set_has_key(true);
        assert_eq!(room.kind_flags(), RoomKindFlags::START | RoomKindFlags::KEY);
    }

    #[test]
    fn test_children_are_not_duplicated() {
        let mut room = RoomNode::new(Position::origin(), 0, RoomKind::Start);
        room.add_child(Position::new(0, 1));
        room.add_child(Position::new(0, 1));
        assert_eq!(room.children().len(), 1);
        assert!(!room.is_leaf());
    }

    #[test]
    fn test_gate_encoding() {
        assert_eq!(Gate::Open.required_level(), None);
        assert_eq!(Gate::Locked(0).required_level(), Some(0));
        assert!(Gate::Locked(0).is_locked());
        assert!(!Gate::Open.is_locked());
    }
}

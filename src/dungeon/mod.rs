//! # Dungeon Module
//!
//! The room graph: coordinates, directions, room kinds and the graph that owns
//! every room.
//!
//! Rooms live on an unbounded integer grid. Two rooms may share a door only
//! when their coordinates differ by exactly one unit along a single axis, so a
//! room has at most four doors. North is `+y`.

pub mod graph;
pub mod room;

pub use graph::*;
pub use room::*;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A 2D integer coordinate, used both for rooms in the dungeon and for cells
/// inside a room's content grid.
///
/// # Examples
///
/// ```
/// use dungeon_grammar::{Direction, Position};
///
/// let pos = Position::new(2, 3);
/// assert_eq!(pos.step(Direction::North), Position::new(2, 4));
/// assert!(pos.is_adjacent(Position::new(1, 3)));
/// assert!(!pos.is_adjacent(Position::new(3, 4)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Returns the neighbouring position one step in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// Returns the 4 cardinal neighbours in North, East, South, West order.
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        Direction::ALL.map(|direction| self.step(direction))
    }

    /// True when the two positions differ by one unit along a single axis.
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Direction leading from `self` to an adjacent `other`.
    pub fn direction_to(self, other: Position) -> Option<Direction> {
        Direction::from_delta(other - self)
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal directions between rooms (and between content cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in the order rooms and cells are scanned.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_grammar::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(0, 1));
    /// assert_eq!(Direction::West.to_delta(), Position::new(-1, 0));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::South => Position::new(0, -1),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// Converts a position delta to a direction.
    ///
    /// Returns None if the delta is not a single cardinal step.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        match (delta.x, delta.y) {
            (0, 1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, -1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// The single-bit flag for this direction.
    pub fn flag(self) -> DirectionFlags {
        match self {
            Direction::North => DirectionFlags::NORTH,
            Direction::East => DirectionFlags::EAST,
            Direction::South => DirectionFlags::SOUTH,
            Direction::West => DirectionFlags::WEST,
        }
    }
}

bitflags! {
    /// Set of directions, used for the doors of a room.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DirectionFlags: u8 {
        const NORTH = 0x01;
        const EAST = 0x02;
        const SOUTH = 0x04;
        const WEST = 0x08;
    }
}

/// The role a room plays in the dungeon.
///
/// Holding a key is a flag on the room, not a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    /// The room the player enters the dungeon in
    Start,
    /// Any ordinary room
    Normal,
    /// The only room behind the final gate that leads to the end
    Boss,
    /// The exit, reachable only through the boss room
    End,
}

impl RoomKind {
    /// The pattern-targeting flag for this kind.
    pub fn flag(self) -> RoomKindFlags {
        match self {
            RoomKind::Start => RoomKindFlags::START,
            RoomKind::Normal => RoomKindFlags::NORMAL,
            RoomKind::Boss => RoomKindFlags::BOSS,
            RoomKind::End => RoomKindFlags::END,
        }
    }

    /// True for the two rooms that sit behind the final gate.
    pub fn is_boss_or_end(self) -> bool {
        matches!(self, RoomKind::Boss | RoomKind::End)
    }
}

bitflags! {
    /// Room kinds (plus the key-holder flag) a pattern rule may be applied to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RoomKindFlags: u8 {
        const START = 0x01;
        const NORMAL = 0x02;
        const BOSS = 0x04;
        const END = 0x08;
        const KEY = 0x10;
    }
}

impl Default for RoomKindFlags {
    fn default() -> Self {
        RoomKindFlags::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_step_and_adjacency() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.step(Direction::North), Position::new(5, 6));
        assert_eq!(pos.step(Direction::East), Position::new(6, 5));
        assert_eq!(pos.step(Direction::South), Position::new(5, 4));
        assert_eq!(pos.step(Direction::West), Position::new(4, 5));

        assert!(pos.is_adjacent(Position::new(5, 4)));
        assert!(!pos.is_adjacent(Position::new(6, 6))); // No diagonal
        assert!(!pos.is_adjacent(pos));
    }

    #[test]
    fn test_cardinal_order() {
        let adjacent = Position::origin().cardinal_adjacent_positions();
        assert_eq!(
            adjacent,
            [
                Position::new(0, 1),
                Position::new(1, 0),
                Position::new(0, -1),
                Position::new(-1, 0),
            ]
        );
    }

    #[test]
    fn test_direction_round_trip_and_opposite() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_delta(direction.to_delta()), Some(direction));
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(
                direction.to_delta() + direction.opposite().to_delta(),
                Position::origin()
            );
        }
        assert_eq!(Direction::from_delta(Position::new(1, 1)), None);
    }

    #[test]
    fn test_direction_to() {
        let a = Position::new(0, 0);
        assert_eq!(a.direction_to(Position::new(0, 1)), Some(Direction::North));
        assert_eq!(a.direction_to(Position::new(-1, 0)), Some(Direction::West));
        assert_eq!(a.direction_to(Position::new(2, 0)), None);
    }

    #[test]
    fn test_kind_flags() {
        assert_eq!(RoomKind::Boss.flag(), RoomKindFlags::BOSS);
        assert!(RoomKind::End.is_boss_or_end());
        assert!(!RoomKind::Start.is_boss_or_end());
        assert!(RoomKindFlags::default().contains(RoomKindFlags::KEY));
    }
}

//! # ASCII Renderer
//!
//! Plain-text dump of a dungeon: a map of rooms and doors with north at the
//! top, a per-room table and each room's content grid.
//!
//! Map legend:
//!
//! | Glyph | Meaning |
//! |---|---|
//! | `S` `B` `E` | start, boss and end rooms |
//! | `K` | room holding a key |
//! | `0`-`9` | any other room, by gate level (last digit) |
//! | `-` `\|` | open door |
//! | `=` `H` | locked door |

use crate::rendering::DungeonRenderer;
use crate::{DungeonGraph, Gate, Position, RoomContent, RoomKind, RoomNode};

/// Text renderer for generated dungeons.
#[derive(Debug, Clone)]
pub struct AsciiRenderer {
    /// Include the per-room table
    pub show_rooms: bool,
    /// Include every room's content grid
    pub show_content: bool,
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self {
            show_rooms: true,
            show_content: false,
        }
    }
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map only, without table or content grids.
    pub fn map_only() -> Self {
        Self {
            show_rooms: false,
            show_content: false,
        }
    }

    pub fn with_content(mut self, show_content: bool) -> Self {
        self.show_content = show_content;
        self
    }

    /// Renders the room map.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_grammar::{AsciiRenderer, DungeonConfig, DungeonGenerator};
    ///
    /// let graph = DungeonGenerator::new().generate_seeded(&DungeonConfig::new(3)).unwrap();
    /// let map = AsciiRenderer::map_only().render_map(&graph);
    ///
    /// assert_eq!(map.matches('S').count(), 1);
    /// assert_eq!(map.matches('B').count(), 1);
    /// assert!(map.contains('H') || map.contains('='));
    /// ```
    pub fn render_map(&self, graph: &DungeonGraph) -> String {
        let Some((min, max)) = bounds(graph) else {
            return String::new();
        };
        let columns = (2 * (max.x - min.x) + 1) as usize;
        let rows = (2 * (max.y - min.y) + 1) as usize;
        let mut canvas = vec![vec![' '; columns]; rows];

        // North is drawn at the top
        let cell = |position: Position| {
            (
                (2 * (max.y - position.y)) as usize,
                (2 * (position.x - min.x)) as usize,
            )
        };

        for room in graph.rooms() {
            let (row, column) = cell(room.position());
            canvas[row][column] = room_glyph(room);

            for edge in room.edges() {
                // Each door pair is drawn once, from its west or south room
                let target = edge.target();
                if target == room.position() + Position::new(1, 0) {
                    canvas[row][column + 1] = door_glyph(edge.gate(), true);
                } else if target == room.position() + Position::new(0, 1) {
                    canvas[row - 1][column] = door_glyph(edge.gate(), false);
                }
            }
        }

        let mut out = String::new();
        for line in canvas {
            let line: String = line.into_iter().collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    /// One line per room in creation order.
    pub fn render_rooms(&self, graph: &DungeonGraph) -> String {
        let mut lines = vec![format!(
            "{:<10} {:<7} {:>5} {:>9} {:>4}",
            "position", "kind", "level", "intensity", "key"
        )];
        for room in graph.rooms() {
            let intensity = room
                .intensity()
                .map_or_else(|| "-".to_string(), |value| format!("{:.3}", value));
            lines.push(format!(
                "{:<10} {:<7} {:>5} {:>9} {:>4}",
                room.position().to_string(),
                format!("{:?}", room.kind()),
                room.gate_level(),
                intensity,
                if room.has_key() { "yes" } else { "" }
            ));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// A content grid, top row first.
    pub fn render_content(&self, content: &RoomContent) -> String {
        let mut rows: Vec<String> = content
            .rows()
            .map(|row| row.iter().map(|cell| cell.symbol().glyph()).collect())
            .collect();
        rows.reverse();
        let mut out = rows.join("\n");
        out.push('\n');
        out
    }
}

impl DungeonRenderer for AsciiRenderer {
    fn render(&self, graph: &DungeonGraph) -> String {
        let mut sections = vec![self.render_map(graph)];
        if self.show_rooms {
            sections.push(self.render_rooms(graph));
        }
        if self.show_content {
            for room in graph.rooms() {
                if let Some(content) = room.content() {
                    sections.push(format!(
                        "{} {:?}\n{}",
                        room.position(),
                        room.kind(),
                        self.render_content(content)
                    ));
                }
            }
        }
        sections.join("\n")
    }

    fn renderer_type(&self) -> &'static str {
        "AsciiRenderer"
    }
}

fn room_glyph(room: &RoomNode) -> char {
    match room.kind() {
        RoomKind::Start => 'S',
        RoomKind::Boss => 'B',
        RoomKind::End => 'E',
        RoomKind::Normal if room.has_key() => 'K',
        RoomKind::Normal => char::from_digit(room.gate_level() % 10, 10).unwrap_or('?'),
    }
}

/// Lowest and highest room coordinates.
fn bounds(graph: &DungeonGraph) -> Option<(Position, Position)> {
    let mut positions = graph.rooms().iter().map(|room| room.position());
    let first = positions.next()?;
    Some(positions.fold((first, first), |(min, max), p| {
        (
            Position::new(min.x.min(p.x), min.y.min(p.y)),
            Position::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

fn door_glyph(gate: Gate, horizontal: bool) -> char {
    match (gate, horizontal) {
        (Gate::Open, true) => '-',
        (Gate::Open, false) => '|',
        (Gate::Locked(_), true) => '=',
        (Gate::Locked(_), false) => 'H',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentSymbol, DungeonConfig, DungeonGenerator};

    fn small_graph() -> DungeonGraph {
        // S - 0
        //     H
        //     B - E   (boss south of the normal room)
        let mut graph = DungeonGraph::new();
        let p = Position::new;
        graph.add_room(RoomNode::new(p(0, 1), 0, RoomKind::Start)).unwrap();
        graph.add_room(RoomNode::new(p(1, 1), 0, RoomKind::Normal)).unwrap();
        graph.add_room(RoomNode::new(p(1, 0), 1, RoomKind::Boss)).unwrap();
        graph.add_room(RoomNode::new(p(2, 0), 1, RoomKind::End)).unwrap();
        graph.link(p(0, 1), p(1, 1), Gate::Open).unwrap();
        graph.link(p(1, 1), p(1, 0), Gate::Locked(1)).unwrap();
        graph.link(p(1, 0), p(2, 0), Gate::Open).unwrap();
        graph
    }

    #[test]
    fn test_map_layout() {
        let map = AsciiRenderer::map_only().render_map(&small_graph());
        assert_eq!(map, "S-0\n  H\n  B-E\n");
    }

    #[test]
    fn test_empty_graph_renders_nothing() {
        assert_eq!(AsciiRenderer::new().render_map(&DungeonGraph::new()), "");
    }

    #[test]
    fn test_room_table_lists_every_room() {
        let graph = small_graph();
        let table = AsciiRenderer::new().render_rooms(&graph);
        assert_eq!(table.lines().count(), graph.len() + 1);
        assert!(table.contains("Boss"));
    }

    #[test]
    fn test_content_is_drawn_top_row_first() {
        let mut content = RoomContent::new(2, 2);
        content.set_symbol(Position::new(0, 1), ContentSymbol::Enemy);
        content.finalize();
        assert_eq!(AsciiRenderer::new().render_content(&content), "E.\n..\n");
    }

    #[test]
    fn test_generated_dungeon_map_has_goal_rooms() {
        for seed in 0..10 {
            let config = DungeonConfig::new(seed);
            let graph = DungeonGenerator::new().generate_seeded(&config).unwrap();
            let renderer = AsciiRenderer::new().with_content(true);
            let text = renderer.render(&graph);
            let map = renderer.render_map(&graph);

            assert_eq!(map.matches('S').count(), 1);
            assert_eq!(map.matches('B').count(), 1);
            assert_eq!(map.matches('E').count(), 1);
            let key_rooms = graph
                .rooms()
                .iter()
                .filter(|room| room.has_key() && room.kind() == RoomKind::Normal)
                .count();
            assert_eq!(map.matches('K').count(), key_rooms);
            assert!(text.starts_with(&map));
        }
    }
}

//! # Content Module
//!
//! The per-room cell grid and the grammar-pattern engine that fills it.
//!
//! Every room owns a W×H grid of [`ContentCell`]s linked to their 4 grid
//! neighbours. Cells start [`ContentSymbol::Undefined`], the cells in front of
//! doors are cleared, pattern rules rewrite the rest and whatever is still
//! undefined at the end becomes empty floor.

pub mod filler;
pub mod pattern;

pub use filler::*;
pub use pattern::*;

use crate::{Direction, DirectionFlags, Position};
use serde::{Deserialize, Serialize};

/// What occupies a cell of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentSymbol {
    /// Not decided yet
    Undefined,
    /// Walkable floor
    Empty,
    /// Wall or obstacle
    Block,
    /// An enemy spawn
    Enemy,
    /// A bonus pickup
    Bonus,
}

impl ContentSymbol {
    /// Single-character form used by pattern rows and the text renderer.
    pub fn glyph(self) -> char {
        match self {
            ContentSymbol::Undefined => '_',
            ContentSymbol::Empty => '.',
            ContentSymbol::Block => '#',
            ContentSymbol::Enemy => 'E',
            ContentSymbol::Bonus => 'B',
        }
    }
}

/// One cell of a room's content grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCell {
    position: Position,
    symbol: ContentSymbol,
    links: [Option<usize>; 4],
}

impl ContentCell {
    fn new(position: Position) -> Self {
        Self {
            position,
            symbol: ContentSymbol::Undefined,
            links: [None; 4],
        }
    }

    /// Local coordinate inside the room grid.
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn symbol(&self) -> ContentSymbol {
        self.symbol
    }

    /// Index (into [`RoomContent::cells`]) of the neighbouring cell in `direction`.
    pub fn link(&self, direction: Direction) -> Option<usize> {
        self.links[direction_slot(direction)]
    }

    /// Indices of all neighbouring cells.
    pub fn links(&self) -> impl Iterator<Item = usize> + '_ {
        self.links.iter().flatten().copied()
    }
}

fn direction_slot(direction: Direction) -> usize {
    match direction {
        Direction::North => 0,
        Direction::East => 1,
        Direction::South => 2,
        Direction::West => 3,
    }
}

/// The content grid of one room, stored row by row from `y = 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomContent {
    width: usize,
    height: usize,
    cells: Vec<ContentCell>,
}

impl RoomContent {
    /// Builds a grid of undefined cells with 4-neighbour links.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_grammar::{ContentSymbol, RoomContent};
    ///
    /// let grid = RoomContent::new(3, 2);
    /// assert_eq!(grid.cells().len(), 6);
    /// assert_eq!(grid.count(ContentSymbol::Undefined), 6);
    /// ```
    pub fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(ContentCell::new(Position::new(x as i32, y as i32)));
            }
        }

        let mut grid = Self {
            width,
            height,
            cells,
        };
        grid.link_cells();
        grid
    }

    fn link_cells(&mut self) {
        for i in 0..self.cells.len() {
            let position = self.cells[i].position;
            for direction in Direction::ALL {
                let neighbour = position.step(direction);
                self.cells[i].links[direction_slot(direction)] = self.index_of(neighbour);
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[ContentCell] {
        &self.cells
    }

    /// Index of the cell at `position`, if inside the grid.
    pub fn index_of(&self, position: Position) -> Option<usize> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        let (x, y) = (position.x as usize, position.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn cell(&self, position: Position) -> Option<&ContentCell> {
        self.index_of(position).map(|i| &self.cells[i])
    }

    pub fn symbol(&self, position: Position) -> Option<ContentSymbol> {
        self.cell(position).map(ContentCell::symbol)
    }

    /// Overwrites a cell. Returns false if `position` is outside the grid.
    pub fn set_symbol(&mut self, position: Position, symbol: ContentSymbol) -> bool {
        match self.index_of(position) {
            Some(i) => {
                self.cells[i].symbol = symbol;
                true
            }
            None => false,
        }
    }

    /// Number of cells holding `symbol`.
    pub fn count(&self, symbol: ContentSymbol) -> usize {
        self.cells.iter().filter(|cell| cell.symbol == symbol).count()
    }

    /// Rows of symbols, from `y = 0` upwards.
    pub fn rows(&self) -> impl Iterator<Item = &[ContentCell]> + '_ {
        self.cells.chunks(self.width.max(1))
    }

    /// Grid cell in front of the door on `direction`.
    pub fn door_cell(&self, direction: Direction) -> Position {
        let (w, h) = (self.width as i32, self.height as i32);
        match direction {
            Direction::North => Position::new(w / 2, h - 1),
            Direction::South => Position::new(w / 2, 0),
            Direction::East => Position::new(w - 1, h / 2),
            Direction::West => Position::new(0, h / 2),
        }
    }

    /// Clears the cells in front of every door in `doors`.
    pub fn clear_doors(&mut self, doors: DirectionFlags) {
        for direction in Direction::ALL {
            if doors.contains(direction.flag()) {
                let cell = self.door_cell(direction);
                self.set_symbol(cell, ContentSymbol::Empty);
            }
        }
    }

    /// Turns every cell still undefined into empty floor.
    pub fn finalize(&mut self) {
        for cell in &mut self.cells {
            if cell.symbol == ContentSymbol::Undefined {
                cell.symbol = ContentSymbol::Empty;
            }
        }
    }
}

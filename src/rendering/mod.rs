//! # Rendering Module
//!
//! Text output of a finished dungeon for debugging and the command line.
//!
//! Renderers only read the graph; nothing here feeds back into generation.

pub mod ascii;

pub use ascii::*;

use crate::DungeonGraph;

/// Turns a generated dungeon into something a person can look at.
pub trait DungeonRenderer {
    /// Renders the whole dungeon.
    fn render(&self, graph: &DungeonGraph) -> String;

    /// Gets the renderer name for logging and debugging.
    fn renderer_type(&self) -> &'static str;
}

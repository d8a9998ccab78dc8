//! # Pattern Rules
//!
//! Declarative K×K rewrite rules: a "before" grid that must match a window of
//! a room's content grid, and an "after" grid written over it.
//!
//! Grids are stored row by row, index `x + y * K`. Rotation and matching are
//! pure: rotating always builds a new grid.

use crate::{ContentSymbol, DungeonError, DungeonResult, Position, RoomContent, RoomKindFlags};
use serde::{Deserialize, Serialize};

/// One entry of a pattern grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternSymbol {
    /// Matches any symbol; in an "after" grid, leaves the cell unchanged
    Any,
    Undefined,
    Empty,
    Block,
    Enemy,
    Bonus,
}

impl PatternSymbol {
    /// The concrete symbol, or None for the wildcard.
    pub fn content(self) -> Option<ContentSymbol> {
        match self {
            PatternSymbol::Any => None,
            PatternSymbol::Undefined => Some(ContentSymbol::Undefined),
            PatternSymbol::Empty => Some(ContentSymbol::Empty),
            PatternSymbol::Block => Some(ContentSymbol::Block),
            PatternSymbol::Enemy => Some(ContentSymbol::Enemy),
            PatternSymbol::Bonus => Some(ContentSymbol::Bonus),
        }
    }

    /// True when this entry accepts `symbol`.
    pub fn matches(self, symbol: ContentSymbol) -> bool {
        self.content().map_or(true, |wanted| wanted == symbol)
    }

    /// Parses the row glyph form: `*` any, `_` undefined, `.` empty, `#` block,
    /// `E` enemy, `B` bonus.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '*' => Some(PatternSymbol::Any),
            '_' => Some(PatternSymbol::Undefined),
            '.' => Some(PatternSymbol::Empty),
            '#' => Some(PatternSymbol::Block),
            'E' => Some(PatternSymbol::Enemy),
            'B' => Some(PatternSymbol::Bonus),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            PatternSymbol::Any => '*',
            other => other.content().map_or('*', ContentSymbol::glyph),
        }
    }
}

/// Rotates a K×K grid by `turns` quarter turns clockwise.
///
/// # Examples
///
/// ```
/// use dungeon_grammar::rotate_grid;
///
/// let grid = vec![1, 2, 3, 4];
/// assert_eq!(rotate_grid(&grid, 2, 1), vec![3, 1, 4, 2]);
/// assert_eq!(rotate_grid(&grid, 2, 4), grid);
/// ```
pub fn rotate_grid<T: Copy>(grid: &[T], width: usize, turns: usize) -> Vec<T> {
    let mut current = grid.to_vec();
    if width == 0 {
        return current;
    }

    for _ in 0..turns % 4 {
        let mut rotated = current.clone();
        for (i, &value) in current.iter().enumerate() {
            let (x, y) = (i % width, i / width);
            let (new_x, new_y) = (width - (y + 1), x);
            rotated[new_x + width * new_y] = value;
        }
        current = rotated;
    }
    current
}

/// A K×K before/after rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PatternRuleRows", into = "PatternRuleRows")]
pub struct PatternRule {
    width: usize,
    priority: u32,
    apply_at_any_cost: bool,
    targets: RoomKindFlags,
    before: Vec<PatternSymbol>,
    after: Vec<PatternSymbol>,
}

impl PatternRule {
    /// Creates a rule at priority 0, targeting every room kind.
    pub fn new(
        width: usize,
        before: Vec<PatternSymbol>,
        after: Vec<PatternSymbol>,
    ) -> DungeonResult<Self> {
        if width == 0 {
            return Err(DungeonError::InvalidConfig(
                "pattern width must be at least 1".to_string(),
            ));
        }
        let expected = width * width;
        if before.len() != expected || after.len() != expected {
            return Err(DungeonError::InvalidConfig(format!(
                "pattern of width {} needs {} cells, got {} before and {} after",
                width,
                expected,
                before.len(),
                after.len()
            )));
        }

        Ok(Self {
            width,
            priority: 0,
            apply_at_any_cost: false,
            targets: RoomKindFlags::all(),
            before,
            after,
        })
    }

    /// Builds a rule from glyph rows, listed from `y = 0` upwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_grammar::{PatternRule, PatternSymbol};
    ///
    /// let rule = PatternRule::from_rows(&["_.", "**"], &["#*", "**"]).unwrap();
    /// assert_eq!(rule.width(), 2);
    /// assert_eq!(rule.before()[0], PatternSymbol::Undefined);
    /// assert_eq!(rule.after()[0], PatternSymbol::Block);
    /// ```
    pub fn from_rows<S: AsRef<str>>(before: &[S], after: &[S]) -> DungeonResult<Self> {
        let width = before.len();
        Self::new(width, parse_rows(before, width)?, parse_rows(after, width)?)
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_targets(mut self, targets: RoomKindFlags) -> Self {
        self.targets = targets;
        self
    }

    /// Try every rotation, not just one random one, when looking for a fit.
    pub fn at_any_cost(mut self) -> Self {
        self.apply_at_any_cost = true;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Tier of the rule; lower tiers are applied first.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn apply_at_any_cost(&self) -> bool {
        self.apply_at_any_cost
    }

    pub fn targets(&self) -> RoomKindFlags {
        self.targets
    }

    pub fn before(&self) -> &[PatternSymbol] {
        &self.before
    }

    pub fn after(&self) -> &[PatternSymbol] {
        &self.after
    }

    /// True when the rule may be used in a room with these kind flags.
    pub fn applies_to(&self, room_flags: RoomKindFlags) -> bool {
        self.targets.intersects(room_flags)
    }

    /// The same rule turned `turns` quarter turns clockwise. Both grids are
    /// rotated together.
    pub fn rotated(&self, turns: usize) -> PatternRule {
        PatternRule {
            before: rotate_grid(&self.before, self.width, turns),
            after: rotate_grid(&self.after, self.width, turns),
            ..self.clone()
        }
    }

    /// True when the window with its lowest corner at `origin` lies inside the
    /// grid and every non-wildcard "before" entry equals the cell under it.
    pub fn fits_at(&self, content: &RoomContent, origin: Position) -> bool {
        if origin.x < 0 || origin.y < 0 {
            return false;
        }
        let (x0, y0) = (origin.x as usize, origin.y as usize);
        if x0 + self.width > content.width() || y0 + self.width > content.height() {
            return false;
        }

        self.before.iter().enumerate().all(|(i, expected)| {
            let cell = window_cell(origin, i, self.width);
            content
                .symbol(cell)
                .map_or(false, |symbol| expected.matches(symbol))
        })
    }

    /// Rewrites the window at `origin` if the rule fits there. Wildcards in
    /// the "after" grid keep the current symbol.
    pub fn apply_at(&self, content: &mut RoomContent, origin: Position) -> bool {
        if !self.fits_at(content, origin) {
            return false;
        }

        for (i, replacement) in self.after.iter().enumerate() {
            if let Some(symbol) = replacement.content() {
                content.set_symbol(window_cell(origin, i, self.width), symbol);
            }
        }
        true
    }
}

fn window_cell(origin: Position, index: usize, width: usize) -> Position {
    Position::new(
        origin.x + (index % width) as i32,
        origin.y + (index / width) as i32,
    )
}

fn parse_rows<S: AsRef<str>>(rows: &[S], width: usize) -> DungeonResult<Vec<PatternSymbol>> {
    if rows.len() != width {
        return Err(DungeonError::InvalidConfig(format!(
            "pattern needs {} rows, got {}",
            width,
            rows.len()
        )));
    }

    let mut symbols = Vec::with_capacity(width * width);
    for row in rows {
        let row = row.as_ref();
        if row.chars().count() != width {
            return Err(DungeonError::InvalidConfig(format!(
                "pattern row {:?} should be {} glyphs wide",
                row, width
            )));
        }
        for glyph in row.chars() {
            let symbol = PatternSymbol::from_glyph(glyph).ok_or_else(|| {
                DungeonError::InvalidConfig(format!("unknown pattern glyph {:?}", glyph))
            })?;
            symbols.push(symbol);
        }
    }
    Ok(symbols)
}

fn format_rows(symbols: &[PatternSymbol], width: usize) -> Vec<String> {
    symbols
        .chunks(width.max(1))
        .map(|row| row.iter().map(|symbol| symbol.glyph()).collect())
        .collect()
}

/// Serialized form of a [`PatternRule`], with grids written as glyph rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatternRuleRows {
    #[serde(default)]
    priority: u32,
    #[serde(default)]
    apply_at_any_cost: bool,
    #[serde(default)]
    targets: RoomKindFlags,
    before: Vec<String>,
    after: Vec<String>,
}

impl TryFrom<PatternRuleRows> for PatternRule {
    type Error = DungeonError;

    fn try_from(rows: PatternRuleRows) -> DungeonResult<Self> {
        let mut rule = PatternRule::from_rows(&rows.before, &rows.after)?
            .with_priority(rows.priority)
            .with_targets(rows.targets);
        rule.apply_at_any_cost = rows.apply_at_any_cost;
        Ok(rule)
    }
}

impl From<PatternRule> for PatternRuleRows {
    fn from(rule: PatternRule) -> Self {
        Self {
            priority: rule.priority,
            apply_at_any_cost: rule.apply_at_any_cost,
            targets: rule.targets,
            before: format_rows(&rule.before, rule.width),
            after: format_rows(&rule.after, rule.width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wall_rule() -> PatternRule {
        // An undefined cell beside an empty one becomes a wall
        PatternRule::from_rows(&["_.", "**"], &["#*", "**"]).unwrap()
    }

    #[test]
    fn test_rejects_wrong_sizes() {
        let result = PatternRule::new(2, vec![PatternSymbol::Any; 4], vec![PatternSymbol::Any; 3]);
        assert!(matches!(result, Err(DungeonError::InvalidConfig(_))));
        assert!(PatternRule::new(0, Vec::new(), Vec::new()).is_err());
        assert!(PatternRule::from_rows(&["_.", "*"], &["#*", "**"]).is_err());
        assert!(PatternRule::from_rows(&["_x", "**"], &["#*", "**"]).is_err());
    }

    #[test]
    fn test_rotation_quarter_turn() {
        // 0 1 2        6 3 0
        // 3 4 5   ->   7 4 1
        // 6 7 8        8 5 2
        let grid: Vec<u8> = (0..9).collect();
        assert_eq!(rotate_grid(&grid, 3, 1), vec![6, 3, 0, 7, 4, 1, 8, 5, 2]);
        assert_eq!(rotate_grid(&grid, 3, 2), vec![8, 7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(rotate_grid(&grid, 3, 0), grid);
    }

    #[test]
    fn test_rotated_rule_turns_both_grids() {
        let rule = wall_rule();
        let turned = rule.rotated(1);
        assert_eq!(turned.before(), rotate_grid(rule.before(), 2, 1).as_slice());
        assert_eq!(turned.after(), rotate_grid(rule.after(), 2, 1).as_slice());
        assert_eq!(turned.priority(), rule.priority());
    }

    #[test]
    fn test_fit_and_apply() {
        let mut grid = RoomContent::new(3, 3);
        let rule = wall_rule();

        // Needs an empty cell to the east of an undefined one
        assert!(!rule.fits_at(&grid, Position::new(0, 0)));

        grid.set_symbol(Position::new(1, 0), ContentSymbol::Empty);
        assert!(rule.fits_at(&grid, Position::new(0, 0)));
        assert!(rule.apply_at(&mut grid, Position::new(0, 0)));

        assert_eq!(grid.symbol(Position::new(0, 0)), Some(ContentSymbol::Block));
        assert_eq!(grid.symbol(Position::new(1, 0)), Some(ContentSymbol::Empty));
        // Wildcards left the upper row alone
        assert_eq!(grid.symbol(Position::new(0, 1)), Some(ContentSymbol::Undefined));
    }

    #[test]
    fn test_window_must_fit_inside_grid() {
        let grid = RoomContent::new(3, 3);
        let anything = PatternRule::from_rows(&["**", "**"], &["**", "**"]).unwrap();
        assert!(anything.fits_at(&grid, Position::new(1, 1)));
        assert!(!anything.fits_at(&grid, Position::new(2, 1)));
        assert!(!anything.fits_at(&grid, Position::new(1, 2)));
        assert!(!anything.fits_at(&grid, Position::new(-1, 0)));

        let too_wide = RoomContent::new(1, 1);
        assert!(!anything.fits_at(&too_wide, Position::origin()));
    }

    #[test]
    fn test_targets() {
        let rule = wall_rule().with_targets(RoomKindFlags::BOSS | RoomKindFlags::KEY);
        assert!(rule.applies_to(RoomKindFlags::BOSS));
        assert!(rule.applies_to(RoomKindFlags::NORMAL | RoomKindFlags::KEY));
        assert!(!rule.applies_to(RoomKindFlags::NORMAL));
    }

    #[test]
    fn test_json_rows_round_trip() {
        let json = r#"{
            "priority": 2,
            "apply_at_any_cost": true,
            "targets": "NORMAL | KEY",
            "before": ["_.", "**"],
            "after": ["E*", "**"]
        }"#;
        let rule: PatternRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.priority(), 2);
        assert!(rule.apply_at_any_cost());
        assert_eq!(rule.targets(), RoomKindFlags::NORMAL | RoomKindFlags::KEY);
        assert_eq!(rule.after()[0], PatternSymbol::Enemy);

        let written = serde_json::to_string(&rule).unwrap();
        let reread: PatternRule = serde_json::from_str(&written).unwrap();
        assert_eq!(reread, rule);
    }

    #[test]
    fn test_json_rejects_ragged_rows() {
        let json = r#"{ "before": ["_.", "*"], "after": ["E*", "**"] }"#;
        assert!(serde_json::from_str::<PatternRule>(json).is_err());
    }

    proptest! {
        #[test]
        fn four_rotations_are_identity(width in 1usize..7, seed in any::<u64>()) {
            let grid: Vec<u64> = (0..width * width)
                .map(|i| seed.wrapping_mul(i as u64 + 1))
                .collect();
            prop_assert_eq!(rotate_grid(&grid, width, 4), grid.clone());
            prop_assert_eq!(
                rotate_grid(&rotate_grid(&grid, width, 1), width, 3),
                grid
            );
        }
    }
}

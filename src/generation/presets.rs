//! Built-in pattern rules used when a config does not supply its own.
//!
//! Rows are listed from `y = 0` upwards, glyphs as in
//! [`PatternSymbol::from_glyph`](crate::PatternSymbol::from_glyph).
//!
//! - Tier 0 carries the floor in from the door cells so doorways stay open.
//! - Tier 1 places structure: pillars and wall runs, and the boss arena.
//! - Tier 2 decorates with enemies and bonuses; it is the capped tier.

use crate::{PatternRule, RoomKindFlags};

struct Preset {
    before: &'static [&'static str],
    after: &'static [&'static str],
    priority: u32,
    targets: RoomKindFlags,
    at_any_cost: bool,
}

const FIGHTING_ROOMS: RoomKindFlags = RoomKindFlags::NORMAL.union(RoomKindFlags::KEY);
const QUIET_ROOMS: RoomKindFlags = RoomKindFlags::START
    .union(RoomKindFlags::NORMAL)
    .union(RoomKindFlags::KEY);

const PRESETS: &[Preset] = &[
    // Corridor: floor spreads one cell away from existing floor
    Preset {
        before: &["._", "**"],
        after: &["..", "**"],
        priority: 0,
        targets: RoomKindFlags::all(),
        at_any_cost: true,
    },
    // Pillar in the middle of an undecided block
    Preset {
        before: &["___", "___", "___"],
        after: &["___", "_#_", "___"],
        priority: 1,
        targets: QUIET_ROOMS,
        at_any_cost: false,
    },
    // Short wall run
    Preset {
        before: &["__", "__"],
        after: &["##", "__"],
        priority: 1,
        targets: QUIET_ROOMS,
        at_any_cost: false,
    },
    // Boss arena: the boss in a cleared ring
    Preset {
        before: &["___", "___", "___"],
        after: &["...", ".E.", "..."],
        priority: 1,
        targets: RoomKindFlags::BOSS,
        at_any_cost: true,
    },
    // Lone enemy
    Preset {
        before: &["_"],
        after: &["E"],
        priority: 2,
        targets: FIGHTING_ROOMS,
        at_any_cost: false,
    },
    // Enemy guarding a wall
    Preset {
        before: &["#_", "**"],
        after: &["#E", "**"],
        priority: 2,
        targets: FIGHTING_ROOMS,
        at_any_cost: false,
    },
    // Bonus tucked behind a wall
    Preset {
        before: &["_#", "**"],
        after: &["B#", "**"],
        priority: 2,
        targets: QUIET_ROOMS,
        at_any_cost: false,
    },
    // Reward in key rooms
    Preset {
        before: &["_"],
        after: &["B"],
        priority: 2,
        targets: RoomKindFlags::KEY,
        at_any_cost: true,
    },
];

/// The built-in rule set.
///
/// # Examples
///
/// ```
/// use dungeon_grammar::generation::presets::default_patterns;
///
/// let rules = default_patterns();
/// assert!(rules.iter().any(|rule| rule.priority() == 0));
/// ```
pub fn default_patterns() -> Vec<PatternRule> {
    PRESETS
        .iter()
        .filter_map(|preset| {
            let rule = PatternRule::from_rows(preset.before, preset.after).ok()?;
            let rule = rule
                .with_priority(preset.priority)
                .with_targets(preset.targets);
            Some(if preset.at_any_cost {
                rule.at_any_cost()
            } else {
                rule
            })
        })
        .collect()
}

//! # Content Filler
//!
//! Applies an ordered set of [`PatternRule`]s to one room's content grid.
//!
//! Rules are grouped by priority tier and tiers run in ascending order. Every
//! tier but the last tries its whole candidate list; the last tier stops once
//! an intensity-dependent number of rules has landed, so decorative rules do
//! not flood the room.

use crate::{DirectionFlags, PatternRule, Position, RoomContent, RoomKindFlags};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tuning for the pattern engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    /// Extra random draws per rule added to each tier's candidate list
    pub extra_draws_per_pattern: usize,
    /// Successful applications allowed in the final tier of a zero-intensity room
    pub final_tier_budget: usize,
    /// Additional final-tier applications at intensity 1.0
    pub intensity_budget: usize,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            extra_draws_per_pattern: 2,
            final_tier_budget: 3,
            intensity_budget: 3,
        }
    }
}

impl FillerConfig {
    /// Ceiling on final-tier applications for a room of the given intensity.
    pub fn final_tier_cap(&self, intensity: f32) -> usize {
        let bonus = (intensity.clamp(0.0, 1.0) * self.intensity_budget as f32).round() as usize;
        self.final_tier_budget + bonus
    }
}

/// The grammar-pattern engine.
#[derive(Debug, Clone, Default)]
pub struct ContentFiller {
    pub config: FillerConfig,
}

impl ContentFiller {
    pub fn new(config: FillerConfig) -> Self {
        Self { config }
    }

    /// Builds and fills a `width` × `height` content grid.
    ///
    /// The result never contains an undefined cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_grammar::{ContentFiller, ContentSymbol, DirectionFlags, RoomKindFlags};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let grid = ContentFiller::default().fill(
    ///     4, 4, DirectionFlags::NORTH, RoomKindFlags::NORMAL, 0.5, &[], &mut rng,
    /// );
    /// assert_eq!(grid.count(ContentSymbol::Undefined), 0);
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn fill<R: Rng>(
        &self,
        width: usize,
        height: usize,
        doors: DirectionFlags,
        room_flags: RoomKindFlags,
        intensity: f32,
        patterns: &[PatternRule],
        rng: &mut R,
    ) -> RoomContent {
        let mut content = RoomContent::new(width, height);
        content.clear_doors(doors);

        let tiers = group_by_tier(patterns, room_flags);
        let last_tier = tiers.keys().next_back().copied();

        for (&tier, rules) in &tiers {
            let cap = if Some(tier) == last_tier {
                Some(self.config.final_tier_cap(intensity))
            } else {
                None
            };
            let applied = self.apply_tier(&mut content, rules, cap, rng);
            log::trace!(
                "tier {}: applied {} of {} rules",
                tier,
                applied,
                rules.len()
            );
        }

        content.finalize();
        content
    }

    /// Runs one tier's shuffled candidate list. Returns the number of
    /// successful applications.
    fn apply_tier<R: Rng>(
        &self,
        content: &mut RoomContent,
        rules: &[&PatternRule],
        cap: Option<usize>,
        rng: &mut R,
    ) -> usize {
        // Every rule is drawn at least once, the extra draws bias repeats
        let mut candidates: Vec<usize> = (0..rules.len()).collect();
        for _ in 0..rules.len() * self.config.extra_draws_per_pattern {
            candidates.push(rng.gen_range(0..rules.len()));
        }
        candidates.shuffle(rng);

        let mut applied = 0;
        for index in candidates {
            if cap.map_or(false, |cap| applied >= cap) {
                break;
            }
            if try_apply(content, rules[index], rng) {
                applied += 1;
            }
        }
        applied
    }
}

/// Applicable rules grouped by ascending priority, declaration order kept
/// within a tier.
fn group_by_tier(
    patterns: &[PatternRule],
    room_flags: RoomKindFlags,
) -> BTreeMap<u32, Vec<&PatternRule>> {
    let mut tiers: BTreeMap<u32, Vec<&PatternRule>> = BTreeMap::new();
    for rule in patterns.iter().filter(|rule| rule.applies_to(room_flags)) {
        tiers.entry(rule.priority()).or_default().push(rule);
    }
    tiers
}

/// Tries `rule` at every grid position in random order. A rule applied at any
/// cost tries all four rotations per position, any other rule one random
/// rotation.
fn try_apply<R: Rng>(content: &mut RoomContent, rule: &PatternRule, rng: &mut R) -> bool {
    let mut origins: Vec<Position> = (0..content.height())
        .flat_map(|y| (0..content.width()).map(move |x| Position::new(x as i32, y as i32)))
        .collect();
    origins.shuffle(rng);

    let turns: Vec<usize> = if rule.apply_at_any_cost() {
        let mut all = vec![0, 1, 2, 3];
        all.shuffle(rng);
        all
    } else {
        vec![rng.gen_range(0..4)]
    };
    let rotations: Vec<PatternRule> = turns.iter().map(|&n| rule.rotated(n)).collect();

    for origin in origins {
        for rotated in &rotations {
            if rotated.apply_at(content, origin) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentSymbol;
    use rand::{rngs::StdRng, SeedableRng};

    fn fill_with(patterns: &[PatternRule], flags: RoomKindFlags, seed: u64) -> RoomContent {
        let mut rng = StdRng::seed_from_u64(seed);
        ContentFiller::default().fill(5, 5, DirectionFlags::all(), flags, 0.5, patterns, &mut rng)
    }

    #[test]
    fn test_empty_pattern_set_gives_empty_room() {
        let grid = fill_with(&[], RoomKindFlags::NORMAL, 3);
        assert_eq!(grid.count(ContentSymbol::Empty), 25);
    }

    #[test]
    fn test_unconditional_rule_fills_room() {
        // 1x1 rule turning any undefined cell into a wall
        let rule = PatternRule::from_rows(&["_"], &["#"]).unwrap().at_any_cost();
        let mut rng = StdRng::seed_from_u64(9);
        let filler = ContentFiller::new(FillerConfig {
            extra_draws_per_pattern: 30,
            final_tier_budget: 100,
            intensity_budget: 0,
        });
        let grid = filler.fill(5, 5, DirectionFlags::all(), RoomKindFlags::NORMAL, 0.0, &[rule], &mut rng);

        // Door cells were cleared first, everything else had a draw to spare
        assert_eq!(grid.count(ContentSymbol::Empty), 4);
        assert_eq!(grid.count(ContentSymbol::Block), 21);
    }

    #[test]
    fn test_rules_for_other_kinds_are_skipped() {
        let rule = PatternRule::from_rows(&["_"], &["E"])
            .unwrap()
            .with_targets(RoomKindFlags::BOSS);
        let grid = fill_with(&[rule], RoomKindFlags::NORMAL | RoomKindFlags::KEY, 4);
        assert_eq!(grid.count(ContentSymbol::Enemy), 0);
    }

    #[test]
    fn test_final_tier_is_capped() {
        let structure = PatternRule::from_rows(&["_"], &["B"]).unwrap();
        let decoration = PatternRule::from_rows(&["_"], &["E"])
            .unwrap()
            .with_priority(1);
        let filler = ContentFiller::new(FillerConfig {
            extra_draws_per_pattern: 40,
            final_tier_budget: 2,
            intensity_budget: 4,
        });

        // Structure tier has one rule drawn 41 times, enough for every cell
        let mut rng = StdRng::seed_from_u64(11);
        let grid = filler.fill(
            8,
            8,
            DirectionFlags::empty(),
            RoomKindFlags::NORMAL,
            1.0,
            &[structure.clone(), decoration.clone()],
            &mut rng,
        );
        assert_eq!(grid.count(ContentSymbol::Bonus), 41);
        assert_eq!(grid.count(ContentSymbol::Enemy), 6);

        // With only the decoration tier, the cap follows intensity
        let mut rng = StdRng::seed_from_u64(11);
        let grid = filler.fill(
            8,
            8,
            DirectionFlags::empty(),
            RoomKindFlags::NORMAL,
            0.0,
            &[decoration],
            &mut rng,
        );
        assert_eq!(grid.count(ContentSymbol::Enemy), 2);
    }

    #[test]
    fn test_lower_tier_runs_first() {
        // Tier 0 clears a cell, tier 1 only matches cleared cells
        let clear = PatternRule::from_rows(&["_"], &["."]).unwrap().at_any_cost();
        let bonus_on_floor = PatternRule::from_rows(&["."], &["B"])
            .unwrap()
            .with_priority(1);
        let mut rng = StdRng::seed_from_u64(5);
        let grid = ContentFiller::default().fill(
            3,
            3,
            DirectionFlags::empty(),
            RoomKindFlags::START,
            0.0,
            &[bonus_on_floor, clear],
            &mut rng,
        );
        assert!(grid.count(ContentSymbol::Bonus) >= 1);
    }

    #[test]
    fn test_same_seed_same_grid() {
        let rules = crate::generation::presets::default_patterns();
        let a = fill_with(&rules, RoomKindFlags::NORMAL, 77);
        let b = fill_with(&rules, RoomKindFlags::NORMAL, 77);
        assert_eq!(a, b);
    }

    #[test]
    fn test_final_tier_cap_rounding() {
        let config = FillerConfig::default();
        assert_eq!(config.final_tier_cap(0.0), 3);
        assert_eq!(config.final_tier_cap(1.0), 6);
        assert_eq!(config.final_tier_cap(2.0), 6);
    }
}

//! Scoring module - line-clear points, level progression and gravity speed
//!
//! Progression has two regimes:
//! - Levels 1-4: one lock must clear at least `level + 1` lines to advance.
//! - Levels 5+: every 20 cumulative lines advances one level.
//!
//! A level-up adds `new_level * 100` on top of the clear points.

use crate::types::{
    BASE_DROP_MS, DROP_INTERVAL_MIN_MS, DROP_MS_PER_LEVEL, LEVEL_UP_BONUS, LINES_PER_TIER,
    MAX_LEVEL, POINTS_PER_LINE, TIER_REGIME_LEVEL,
};

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// Points for the cleared lines at the pre-clear level
    pub line_clear_score: u32,
    /// Level reached by this clear, if it advanced
    pub new_level: Option<u32>,
    /// Bonus for `new_level` (0 without a level-up)
    pub level_bonus: u32,
    pub total: u32,
}

/// Points for clearing `lines` lines at `level`
///
/// Equal to `floor(lines * 10 * (1 + level * 0.1))`, computed in integers.
pub fn calculate_line_score(lines: u32, level: u32) -> u32 {
    lines.saturating_mul(POINTS_PER_LINE + level)
}

/// Level after a lock clears `lines` lines, if it changes
///
/// `total_before` is the cumulative line count before this lock.
pub fn next_level(level: u32, lines: u32, total_before: u32) -> Option<u32> {
    if lines == 0 || level >= MAX_LEVEL {
        return None;
    }

    let steps = if level < TIER_REGIME_LEVEL {
        u32::from(lines >= level + 1)
    } else {
        // one step per tier crossed; a single lock can cross several
        let total_after = total_before.saturating_add(lines);
        total_after / LINES_PER_TIER - total_before / LINES_PER_TIER
    };

    (steps > 0).then(|| level.saturating_add(steps).min(MAX_LEVEL))
}

/// Bonus granted on reaching `level`
pub fn level_up_bonus(level: u32) -> u32 {
    level.saturating_mul(LEVEL_UP_BONUS)
}

/// Calculate the complete result of one lock's clear
pub fn calculate_score(lines: u32, level: u32, total_before: u32) -> ScoreResult {
    let line_clear_score = calculate_line_score(lines, level);
    let new_level = next_level(level, lines, total_before);
    let level_bonus = new_level.map_or(0, level_up_bonus);

    ScoreResult {
        line_clear_score,
        new_level,
        level_bonus,
        total: line_clear_score.saturating_add(level_bonus),
    }
}

/// Gravity interval for a level: `max(100, 1000 - level * 5)` ms
pub fn get_drop_interval_ms(level: u32) -> u32 {
    BASE_DROP_MS
        .saturating_sub(level.saturating_mul(DROP_MS_PER_LEVEL))
        .max(DROP_INTERVAL_MIN_MS)
}

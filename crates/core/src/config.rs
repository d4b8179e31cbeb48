//! Session configuration
//!
//! Plain data with defaults; loading from files or the environment is the adapter's job.

use crate::grid::Grid;
use crate::types::{GameOverReason, Position, GRID_SIZE, LINE_CLEAR_DELAY_MS, SPAWN_POSITION};

const N: usize = GRID_SIZE as usize;

/// Per-layer occupancy ceilings checked after every lock
///
/// `None` leaves a layer unlimited; `Some(0)` forbids any cell in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerLimits {
    limits: [Option<u16>; N],
}

impl LayerLimits {
    /// Layer 1 holds at most 8 cells, layer 2 at most 5, layers 3+ nothing
    pub fn standard() -> Self {
        let mut limits = [Some(0); N];
        limits[0] = None;
        limits[1] = Some(8);
        limits[2] = Some(5);
        Self { limits }
    }

    /// No layer limits; only a blocked spawn ends the game
    pub fn disabled() -> Self {
        Self { limits: [None; N] }
    }

    pub fn from_limits(limits: [Option<u16>; N]) -> Self {
        Self { limits }
    }

    pub fn limit(&self, layer: usize) -> Option<u16> {
        self.limits.get(layer).copied().flatten()
    }

    pub fn limits(&self) -> &[Option<u16>; N] {
        &self.limits
    }

    /// First layer, bottom up, whose occupancy exceeds its limit
    pub fn check(&self, grid: &Grid) -> Option<GameOverReason> {
        self.limits.iter().enumerate().find_map(|(layer, limit)| {
            let limit = (*limit)?;
            let count = grid.layer_count(layer);
            (count > limit).then_some(GameOverReason::LayerOverflow {
                layer: layer as u8,
                count,
                limit,
            })
        })
    }
}

impl Default for LayerLimits {
    fn default() -> Self {
        Self::standard()
    }
}

/// Everything a session needs besides its random stream state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Seed for block selection
    pub seed: u32,
    /// Origin of every newly spawned block
    pub spawn: Position,
    pub layer_limits: LayerLimits,
    /// Highlight time before a detected clear commits; 0 commits at lock
    pub clear_delay_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            spawn: SPAWN_POSITION,
            layer_limits: LayerLimits::standard(),
            clear_delay_ms: LINE_CLEAR_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_limits() {
        let limits = LayerLimits::standard();
        assert_eq!(limits.limit(0), None);
        assert_eq!(limits.limit(1), Some(8));
        assert_eq!(limits.limit(2), Some(5));
        assert_eq!(limits.limit(3), Some(0));
        assert_eq!(limits.limit(9), Some(0));
        assert_eq!(limits.limit(10), None);
    }

    #[test]
    fn test_check_reports_lowest_overflow() {
        let mut grid = Grid::new();
        for x in 0..9 {
            grid.set(x, 1, 0, 1);
            grid.set(x, 2, 0, 1);
        }
        assert_eq!(
            LayerLimits::standard().check(&grid),
            Some(GameOverReason::LayerOverflow {
                layer: 1,
                count: 9,
                limit: 8
            })
        );
    }

    #[test]
    fn test_any_cell_above_layer_two_overflows() {
        let mut grid = Grid::new();
        grid.set(0, 3, 0, 1);
        assert!(matches!(
            LayerLimits::standard().check(&grid),
            Some(GameOverReason::LayerOverflow { layer: 3, .. })
        ));
        assert_eq!(LayerLimits::disabled().check(&grid), None);
    }

    #[test]
    fn test_floor_layer_unlimited() {
        let mut grid = Grid::new();
        for x in 0..10 {
            for z in 0..9 {
                grid.set(x, 0, z, 1);
            }
        }
        assert_eq!(LayerLimits::standard().check(&grid), None);
    }
}

//! Line-clear engine - multi-axis detection and simultaneous clearing
//!
//! Detection scans one unchanged grid for all four line classes before anything is
//! zeroed, so a cell shared by several complete lines counts toward each of them.
//! Clearing then zeroes every recorded line and settles the columns once.

use arrayvec::ArrayVec;
use log::debug;

use crate::grid::Grid;
use crate::types::{ClearedLine, GRID_SIZE};

const N: usize = GRID_SIZE as usize;

/// Upper bound on lines found in one scan: rows, z-lines and y-columns (N² each) plus layers
pub const MAX_CLEARED_LINES: usize = 3 * N * N + N;

/// Lines found by one scan, in detection order
pub type ClearSet = ArrayVec<ClearedLine, MAX_CLEARED_LINES>;

/// Find every complete line in the grid
///
/// Order: rows, z-lines, vertical columns, layers.
pub fn detect_lines(grid: &Grid) -> ClearSet {
    let mut lines = ClearSet::new();

    for y in 0..N {
        for z in 0..N {
            if grid.is_row_full(y, z) {
                lines.push(ClearedLine::Row {
                    y: y as u8,
                    z: z as u8,
                });
            }
        }
    }

    for y in 0..N {
        for x in 0..N {
            if grid.is_column_z_full(y, x) {
                lines.push(ClearedLine::ColumnZ {
                    y: y as u8,
                    x: x as u8,
                });
            }
        }
    }

    for x in 0..N {
        for z in 0..N {
            if grid.is_column_y_full(x, z) {
                lines.push(ClearedLine::ColumnY {
                    x: x as u8,
                    z: z as u8,
                });
            }
        }
    }

    for y in 0..N {
        if grid.is_layer_full(y) {
            lines.push(ClearedLine::Layer { y: y as u8 });
        }
    }

    lines
}

/// Zero all given lines, then settle every column
pub fn apply_clear(grid: &mut Grid, lines: &[ClearedLine]) {
    if lines.is_empty() {
        return;
    }
    for &line in lines {
        grid.clear_line(line);
    }
    grid.settle_gravity();
    debug!("cleared {} lines", lines.len());
}

/// Detect and clear in one step; returns what was cleared
pub fn clear_complete_lines(grid: &mut Grid) -> ClearSet {
    let lines = detect_lines(grid);
    apply_clear(grid, &lines);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(grid: &mut Grid, y: i8, z: i8) {
        for x in 0..10 {
            grid.set(x, y, z, 1);
        }
    }

    #[test]
    fn test_empty_grid_has_no_lines() {
        assert!(detect_lines(&Grid::new()).is_empty());
    }

    #[test]
    fn test_detects_each_class() {
        let mut grid = Grid::new();
        fill_row(&mut grid, 0, 5);
        for z in 0..10 {
            grid.set(2, 3, z, 2);
        }
        for y in 0..10 {
            grid.set(7, y, 8, 3);
        }

        let lines = detect_lines(&grid);
        assert!(lines.contains(&ClearedLine::Row { y: 0, z: 5 }));
        assert!(lines.contains(&ClearedLine::ColumnZ { y: 3, x: 2 }));
        assert!(lines.contains(&ClearedLine::ColumnY { x: 7, z: 8 }));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_full_layer_counts_rows_and_z_lines() {
        let mut grid = Grid::new();
        for z in 0..10 {
            fill_row(&mut grid, 0, z);
        }
        let lines = detect_lines(&grid);
        assert_eq!(lines.len(), 10 + 10 + 1);
        assert!(lines.contains(&ClearedLine::Layer { y: 0 }));
    }

    #[test]
    fn test_overlapping_lines_clear_once() {
        let mut grid = Grid::new();
        fill_row(&mut grid, 0, 0);
        for z in 0..10 {
            grid.set(0, 0, z, 1);
        }
        let lines = clear_complete_lines(&mut grid);
        assert_eq!(lines.len(), 2);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_clear_settles_cells_above() {
        let mut grid = Grid::new();
        fill_row(&mut grid, 0, 0);
        grid.set(3, 1, 0, 4);

        clear_complete_lines(&mut grid);

        assert_eq!(grid.get(3, 0, 0), Some(4));
        assert_eq!(grid.get(3, 1, 0), Some(0));
        assert_eq!(grid.occupied_count(), 1);
    }
}

//! Grid module - the 3D occupancy store
//!
//! The grid is a 10x10x10 cube where each cell holds 0 (empty) or a palette index.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y, z), each 0..9. y is vertical and gravity pulls toward y = 0.
//! Only locked blocks live here; the falling block is kept by the session.

use log::warn;

use crate::catalog::Shape;
use crate::types::{BlockColor, ClearedLine, Position, GRID_CELLS, GRID_SIZE};
use crate::validator::cell_position;

const N: usize = GRID_SIZE as usize;

/// Cell values exported for rendering, indexed `[y][z][x]`
pub type GridCells = [[[u8; N]; N]; N];

/// The voxel grid using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Flat array of cells, layer-major order ((y * N + z) * N + x)
    cells: [u8; GRID_CELLS],
}

impl Grid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            cells: [0; GRID_CELLS],
        }
    }

    /// Calculate flat index from (x, y, z) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8, z: i8) -> Option<usize> {
        let n = GRID_SIZE as i8;
        if x < 0 || x >= n || y < 0 || y >= n || z < 0 || z >= n {
            return None;
        }
        Some(((y as usize) * N + (z as usize)) * N + (x as usize))
    }

    /// Edge length of the grid
    pub fn size(&self) -> u8 {
        GRID_SIZE
    }

    /// Get cell at (x, y, z)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8, z: i8) -> Option<u8> {
        Self::index(x, y, z).map(|idx| self.cells[idx])
    }

    /// Get cell at a position
    pub fn get_at(&self, pos: Position) -> Option<u8> {
        self.get(pos.x, pos.y, pos.z)
    }

    /// Set cell at (x, y, z)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, z: i8, value: u8) -> bool {
        match Self::index(x, y, z) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Check if position is within bounds and empty
    pub fn is_empty(&self, x: i8, y: i8, z: i8) -> bool {
        matches!(self.get(x, y, z), Some(0))
    }

    /// Check if position is within bounds and filled
    pub fn is_occupied(&self, x: i8, y: i8, z: i8) -> bool {
        matches!(self.get(x, y, z), Some(v) if v != 0)
    }

    /// Write a shape's set cells at `origin` with the given color
    ///
    /// Cell (r, c) lands on (origin.x + c, origin.y, origin.z + r). Targets outside the
    /// grid are skipped with a warning. Returns the number of cells written.
    pub fn place(&mut self, shape: &Shape, origin: Position, color: BlockColor) -> usize {
        let mut written = 0;
        for (r, c) in shape.cells() {
            match cell_position(origin, r, c) {
                Some(p) if self.set(p.x, p.y, p.z, color.index()) => written += 1,
                Some(p) => warn!(
                    "skipping out-of-bounds cell ({}, {}, {}) while placing block",
                    p.x, p.y, p.z
                ),
                None => warn!(
                    "skipping cell ({}, {}) of block at {:?}: coordinate overflows",
                    r, c, origin
                ),
            }
        }
        written
    }

    /// Compact every (x, z) column toward y = 0
    ///
    /// Occupied cells keep their relative order and color; gaps end up at the top.
    /// Uses the same read/write two-pointer pass per column. Returns true if any cell moved.
    pub fn settle_gravity(&mut self) -> bool {
        let mut moved = false;
        for z in 0..N {
            for x in 0..N {
                let mut write_y = 0usize;
                for read_y in 0..N {
                    let src = (read_y * N + z) * N + x;
                    let value = self.cells[src];
                    if value == 0 {
                        continue;
                    }
                    if write_y != read_y {
                        self.cells[(write_y * N + z) * N + x] = value;
                        self.cells[src] = 0;
                        moved = true;
                    }
                    write_y += 1;
                }
            }
        }
        moved
    }

    /// Check if the row at fixed (y, z) is filled along x
    pub fn is_row_full(&self, y: usize, z: usize) -> bool {
        if y >= N || z >= N {
            return false;
        }
        let start = (y * N + z) * N;
        self.cells[start..start + N].iter().all(|&cell| cell != 0)
    }

    /// Check if the line at fixed (y, x) is filled along z
    pub fn is_column_z_full(&self, y: usize, x: usize) -> bool {
        if y >= N || x >= N {
            return false;
        }
        (0..N).all(|z| self.cells[(y * N + z) * N + x] != 0)
    }

    /// Check if the vertical column at fixed (x, z) is filled along y
    pub fn is_column_y_full(&self, x: usize, z: usize) -> bool {
        if x >= N || z >= N {
            return false;
        }
        (0..N).all(|y| self.cells[(y * N + z) * N + x] != 0)
    }

    /// Check if the whole horizontal layer y is filled
    pub fn is_layer_full(&self, y: usize) -> bool {
        if y >= N {
            return false;
        }
        let start = y * N * N;
        self.cells[start..start + N * N].iter().all(|&cell| cell != 0)
    }

    /// Zero every cell of a line; zeroing an already-empty cell is harmless
    pub fn clear_line(&mut self, line: ClearedLine) {
        match line {
            ClearedLine::Row { y, z } => {
                let start = (y as usize * N + z as usize) * N;
                self.cells[start..start + N].fill(0);
            }
            ClearedLine::ColumnZ { y, x } => {
                for z in 0..N {
                    self.cells[(y as usize * N + z) * N + x as usize] = 0;
                }
            }
            ClearedLine::ColumnY { x, z } => {
                for y in 0..N {
                    self.cells[(y * N + z as usize) * N + x as usize] = 0;
                }
            }
            ClearedLine::Layer { y } => {
                let start = y as usize * N * N;
                self.cells[start..start + N * N].fill(0);
            }
        }
    }

    /// Number of occupied cells in layer y (0 when out of range)
    pub fn layer_count(&self, y: usize) -> u16 {
        if y >= N {
            return 0;
        }
        let start = y * N * N;
        self.cells[start..start + N * N]
            .iter()
            .filter(|&&cell| cell != 0)
            .count() as u16
    }

    /// Occupied cell count of every layer, bottom first
    pub fn layer_counts(&self) -> [u16; N] {
        let mut out = [0u16; N];
        for (y, count) in out.iter_mut().enumerate() {
            *count = self.layer_count(y);
        }
        out
    }

    /// Total number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell != 0).count()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Export cells as `[y][z][x]`
    pub fn write_u8_grid(&self, out: &mut GridCells) {
        for (y, layer) in out.iter_mut().enumerate() {
            for (z, row) in layer.iter_mut().enumerate() {
                let start = (y * N + z) * N;
                row.copy_from_slice(&self.cells[start..start + N]);
            }
        }
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

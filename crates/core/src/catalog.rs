//! Catalog module - block shapes, colors and matrix rotation
//!
//! Shapes are small binary matrices. Rows map to the grid's z axis and columns to
//! its x axis; a block occupies a single y layer while it falls.

use crate::types::{BlockColor, PatternKind, MAX_SHAPE_DIM};

/// Binary shape matrix of at most 4x4 cells
///
/// Cells outside `rows x cols` are always zero, so two shapes compare equal exactly
/// when their visible matrices do.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: u8,
    cols: u8,
    cells: [[u8; MAX_SHAPE_DIM]; MAX_SHAPE_DIM],
}

impl Shape {
    /// Build a shape from a literal matrix; any non-zero entry is a set cell
    pub const fn new<const R: usize, const C: usize>(matrix: [[u8; C]; R]) -> Self {
        assert!(R > 0 && C > 0 && R <= MAX_SHAPE_DIM && C <= MAX_SHAPE_DIM);
        let mut cells = [[0u8; MAX_SHAPE_DIM]; MAX_SHAPE_DIM];
        let mut r = 0;
        while r < R {
            let mut c = 0;
            while c < C {
                cells[r][c] = if matrix[r][c] != 0 { 1 } else { 0 };
                c += 1;
            }
            r += 1;
        }
        Self {
            rows: R as u8,
            cols: C as u8,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    /// Whether cell (row, col) is set; false outside the matrix
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols() && self.cells[row][col] != 0
    }

    /// Iterate over set cells as (row, col)
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows())
            .flat_map(move |r| (0..self.cols()).map(move |c| (r, c)))
            .filter(move |&(r, c)| self.cells[r][c] != 0)
    }

    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    /// Visible matrix as nested vectors
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        (0..self.rows())
            .map(|r| self.cells[r][..self.cols()].to_vec())
            .collect()
    }

    /// 90° clockwise turn: `[r][c]` moves to `[c][rows - 1 - r]`
    pub fn rotate_cw(&self) -> Self {
        let rows = self.rows();
        let mut cells = [[0u8; MAX_SHAPE_DIM]; MAX_SHAPE_DIM];
        for (r, c) in self.cells() {
            cells[c][rows - 1 - r] = 1;
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }

    /// 90° counter-clockwise turn (three clockwise turns)
    pub fn rotate_ccw(&self) -> Self {
        self.rotate_cw().rotate_cw().rotate_cw()
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.to_matrix()).finish()
    }
}

/// Rotate a shape 90° clockwise, returning a new matrix
pub fn rotate(shape: &Shape) -> Shape {
    shape.rotate_cw()
}

/// Immutable catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPattern {
    pub kind: PatternKind,
    pub shape: Shape,
    pub color: BlockColor,
}

const I_SHAPE: Shape = Shape::new([[1, 1, 1, 1]]);
const L_SHAPE: Shape = Shape::new([[0, 0, 1], [1, 1, 1]]);
const J_SHAPE: Shape = Shape::new([[1, 0, 0], [1, 1, 1]]);
const O_SHAPE: Shape = Shape::new([[1, 1], [1, 1]]);
const S_SHAPE: Shape = Shape::new([[0, 1, 1], [1, 1, 0]]);
const Z_SHAPE: Shape = Shape::new([[1, 1, 0], [0, 1, 1]]);
const T_SHAPE: Shape = Shape::new([[0, 1, 0], [1, 1, 1]]);
const SMALL_L_SHAPE: Shape = Shape::new([[1, 0], [1, 1]]);
const SMALL_J_SHAPE: Shape = Shape::new([[0, 1], [1, 1]]);
const SINGLE_SHAPE: Shape = Shape::new([[1]]);

/// Get the spawn shape for a pattern kind
pub fn get_shape(kind: PatternKind) -> Shape {
    match kind {
        PatternKind::I => I_SHAPE,
        PatternKind::L => L_SHAPE,
        PatternKind::J => J_SHAPE,
        PatternKind::O => O_SHAPE,
        PatternKind::S => S_SHAPE,
        PatternKind::Z => Z_SHAPE,
        PatternKind::T => T_SHAPE,
        PatternKind::SmallL => SMALL_L_SHAPE,
        PatternKind::SmallJ => SMALL_J_SHAPE,
        PatternKind::Single => SINGLE_SHAPE,
    }
}

/// Palette color of a pattern kind
pub fn get_color(kind: PatternKind) -> BlockColor {
    match kind {
        PatternKind::I | PatternKind::Z => BlockColor::Red,
        PatternKind::L | PatternKind::T => BlockColor::Green,
        PatternKind::J | PatternKind::SmallL => BlockColor::Blue,
        PatternKind::O | PatternKind::SmallJ => BlockColor::Yellow,
        PatternKind::S | PatternKind::Single => BlockColor::Purple,
    }
}

/// Catalog entry for a kind
pub fn pattern(kind: PatternKind) -> BlockPattern {
    BlockPattern {
        kind,
        shape: get_shape(kind),
        color: get_color(kind),
    }
}

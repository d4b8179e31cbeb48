//! Position validator - the single collision predicate
//!
//! Every move, rotation, drop and spawn check goes through [`is_valid`].

use crate::catalog::Shape;
use crate::grid::Grid;
use crate::types::Position;

/// Grid coordinate of shape cell (row, col) for a block at `origin`
///
/// Returns None if the coordinate does not fit in `i8`.
pub fn cell_position(origin: Position, row: usize, col: usize) -> Option<Position> {
    let x = origin.x.checked_add(i8::try_from(col).ok()?)?;
    let z = origin.z.checked_add(i8::try_from(row).ok()?)?;
    Some(Position::new(x, origin.y, z))
}

/// Check whether `shape` fits at `origin`
///
/// False if any set cell lands outside the grid on any axis or on an occupied cell.
/// Pure; safe to call on hypothetical shapes and positions.
pub fn is_valid(shape: &Shape, origin: Position, grid: &Grid) -> bool {
    shape.cells().all(|(r, c)| {
        cell_position(origin, r, c).is_some_and(|p| grid.is_empty(p.x, p.y, p.z))
    })
}

//! Movement engine - validated translation, rotation and drops of the falling block
//!
//! Rotation uses a fixed horizontal kick list instead of per-piece tables: the
//! rotated shape is tried in place, then shifted one cell along x, along z, and
//! diagonally. The first fitting offset wins.

use crate::catalog::{BlockPattern, Shape};
use crate::grid::Grid;
use crate::types::{Axis, BlockColor, Direction, PatternKind, Position};
use crate::validator::is_valid;

/// Kick offsets (dx, dz) tried after the in-place rotation fails, in order
pub const KICK_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Active falling block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveBlock {
    pub kind: PatternKind,
    pub color: BlockColor,
    pub shape: Shape,
    pub position: Position,
}

impl ActiveBlock {
    /// Create a block from a catalog pattern at the given origin
    pub fn spawn(pattern: BlockPattern, position: Position) -> Self {
        Self {
            kind: pattern.kind,
            color: pattern.color,
            shape: pattern.shape,
            position,
        }
    }

    /// Check if all cells are at valid positions in the grid
    pub fn is_valid(&self, grid: &Grid) -> bool {
        is_valid(&self.shape, self.position, grid)
    }

    /// Check if the block rests on the floor or on locked cells
    pub fn is_grounded(&self, grid: &Grid) -> bool {
        !is_valid(&self.shape, self.position.offset(0, -1, 0), grid)
    }

    /// Move one step; commits only if the target fits
    pub fn try_move(&mut self, direction: Direction, grid: &Grid) -> bool {
        let (dx, dy, dz) = direction.delta();
        let candidate = self.position.offset(dx, dy, dz);
        if is_valid(&self.shape, candidate, grid) {
            self.position = candidate;
            return true;
        }
        false
    }

    /// Rotate with kicks; shape and position update together
    ///
    /// Returns the applied kick offset (dx, dz), `(0, 0)` for an in-place turn,
    /// or None if no offset fits (nothing changes).
    pub fn try_rotate(&mut self, axis: Axis, grid: &Grid) -> Option<(i8, i8)> {
        let (shape, position, kick) = try_rotate(&self.shape, self.position, axis, grid)?;
        self.shape = shape;
        self.position = position;
        Some(kick)
    }

    /// Layers the block can still descend before colliding
    pub fn drop_distance(&self, grid: &Grid) -> u8 {
        drop_distance(&self.shape, self.position, grid)
    }

    /// Descend to the lowest valid layer in one step; returns layers dropped
    pub fn hard_drop(&mut self, grid: &Grid) -> u8 {
        let distance = self.drop_distance(grid);
        self.position = self.position.offset(0, -(distance as i8), 0);
        distance
    }
}

/// Rotated shape for an axis
pub fn rotated_shape(shape: &Shape, axis: Axis) -> Shape {
    match axis {
        Axis::X => shape.rotate_cw(),
        Axis::Z => shape.rotate_ccw(),
    }
}

/// Try to rotate a shape at `origin` with horizontal kicks
/// Returns Some(new_shape, new_position, kick_offset) if successful, None if all kicks fail
pub fn try_rotate(
    shape: &Shape,
    origin: Position,
    axis: Axis,
    grid: &Grid,
) -> Option<(Shape, Position, (i8, i8))> {
    let new_shape = rotated_shape(shape, axis);

    if is_valid(&new_shape, origin, grid) {
        return Some((new_shape, origin, (0, 0)));
    }

    KICK_OFFSETS.iter().find_map(|&(dx, dz)| {
        let kicked = origin.offset(dx, 0, dz);
        is_valid(&new_shape, kicked, grid).then_some((new_shape, kicked, (dx, dz)))
    })
}

/// Find how far a shape at `origin` can fall
///
/// Same result as stepping down one layer at a time until the next step fails.
pub fn drop_distance(shape: &Shape, origin: Position, grid: &Grid) -> u8 {
    let mut distance: u8 = 0;
    loop {
        let next = origin.offset(0, -(distance as i8) - 1, 0);
        if next.y < 0 || !is_valid(shape, next, grid) {
            break;
        }
        distance += 1;
    }
    distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::pattern;
    use crate::types::SPAWN_POSITION;

    fn block(kind: PatternKind) -> ActiveBlock {
        ActiveBlock::spawn(pattern(kind), SPAWN_POSITION)
    }

    #[test]
    fn test_try_move_each_direction() {
        let grid = Grid::new();
        let mut b = block(PatternKind::O);

        assert!(b.try_move(Direction::Left, &grid));
        assert_eq!(b.position, Position::new(2, 9, 3));
        assert!(b.try_move(Direction::Right, &grid));
        assert!(b.try_move(Direction::Forward, &grid));
        assert_eq!(b.position, Position::new(3, 9, 2));
        assert!(b.try_move(Direction::Backward, &grid));
        assert!(b.try_move(Direction::Down, &grid));
        assert_eq!(b.position, Position::new(3, 8, 3));
    }

    #[test]
    fn test_try_move_blocked_leaves_position() {
        let grid = Grid::new();
        let mut b = ActiveBlock::spawn(pattern(PatternKind::Single), Position::new(0, 0, 0));
        assert!(!b.try_move(Direction::Left, &grid));
        assert!(!b.try_move(Direction::Forward, &grid));
        assert!(!b.try_move(Direction::Down, &grid));
        assert_eq!(b.position, Position::new(0, 0, 0));
    }

    #[test]
    fn test_rotate_in_place() {
        let grid = Grid::new();
        let mut b = block(PatternKind::T);
        assert_eq!(b.try_rotate(Axis::X, &grid), Some((0, 0)));
        assert_eq!(b.shape, pattern(PatternKind::T).shape.rotate_cw());
        assert_eq!(b.position, SPAWN_POSITION);
    }

    #[test]
    fn test_rotate_kicks_off_wall() {
        let grid = Grid::new();
        // Vertical bar against the +x wall: turning it flat needs x <= 6
        let mut b = ActiveBlock::spawn(pattern(PatternKind::I), Position::new(9, 5, 0));
        b.shape = b.shape.rotate_cw();
        assert!(b.is_valid(&grid));

        // Only one cell of kick is available, and the flat bar would need three
        assert_eq!(b.try_rotate(Axis::X, &grid), None);
        assert_eq!(b.position, Position::new(9, 5, 0));

        // An L near the wall rotates with a single -x kick
        let mut l = ActiveBlock::spawn(pattern(PatternKind::L), Position::new(8, 5, 0));
        l.shape = l.shape.rotate_cw();
        assert!(l.is_valid(&grid));
        assert_eq!(l.try_rotate(Axis::X, &grid), Some((-1, 0)));
        assert_eq!(l.position, Position::new(7, 5, 0));
    }

    #[test]
    fn test_hard_drop_matches_single_steps() {
        let mut grid = Grid::new();
        grid.set(4, 2, 4, 1);

        let mut stepped = block(PatternKind::O);
        let mut dropped = stepped;

        while stepped.try_move(Direction::Down, &grid) {}
        let distance = dropped.hard_drop(&grid);

        assert_eq!(stepped.position, dropped.position);
        assert_eq!(dropped.position.y, 3);
        assert_eq!(distance, 6);
    }

    #[test]
    fn test_grounded() {
        let grid = Grid::new();
        let mut b = block(PatternKind::S);
        assert!(!b.is_grounded(&grid));
        b.hard_drop(&grid);
        assert!(b.is_grounded(&grid));
        assert_eq!(b.position.y, 0);
    }
}

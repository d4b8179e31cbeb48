//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (engine logic, presentation layers, the JSON adapter).
//!
//! # Grid Dimensions
//!
//! The playfield is a cube of voxels:
//!
//! - **Size**: 10 cells on every axis (x, y and z indexed 0-9)
//! - **Vertical axis**: y, gravity pulls toward y = 0
//! - **Spawn position**: (3, 9, 3), the top layer
//!
//! # Game Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `BASE_DROP_MS` | 1000 | Gravity interval before level scaling |
//! | `DROP_MS_PER_LEVEL` | 5 | Interval reduction per level |
//! | `DROP_INTERVAL_MIN_MS` | 100 | Gravity floor |
//! | `LINE_CLEAR_DELAY_MS` | 300 | Highlight time before a clear commits |
//!
//! # Examples
//!
//! ```
//! use block_busters_types::*;
//!
//! // Parse a pattern kind (case-insensitive)
//! let parsed = PatternKind::from_str("small_l").unwrap();
//! assert_eq!(parsed, PatternKind::SmallL);
//!
//! // Parse game action
//! let action = GameAction::from_str("moveLeft").unwrap();
//! assert_eq!(action, GameAction::MoveLeft);
//!
//! // Grid dimensions
//! assert_eq!(GRID_SIZE, 10);
//! assert_eq!(GRID_CELLS, 1000);
//! ```

/// Grid edge length in cells (same on every axis)
pub const GRID_SIZE: u8 = 10;

/// Total number of cells in the grid
pub const GRID_CELLS: usize = (GRID_SIZE as usize) * (GRID_SIZE as usize) * (GRID_SIZE as usize);

/// Largest row/column count of any block shape
pub const MAX_SHAPE_DIM: usize = 4;

/// Number of colors in the palette (color indices 1..=5)
pub const PALETTE_SIZE: u8 = 5;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Gravity interval before level scaling (1000ms = 1 second per layer)
pub const BASE_DROP_MS: u32 = 1000;

/// Gravity interval reduction per level
pub const DROP_MS_PER_LEVEL: u32 = 5;

/// Gravity interval floor
pub const DROP_INTERVAL_MIN_MS: u32 = 100;

/// Highlight time between detecting cleared lines and committing the clear
pub const LINE_CLEAR_DELAY_MS: u32 = 300;

/// Level a fresh session starts at
pub const START_LEVEL: u32 = 1;

/// Highest reachable level
pub const MAX_LEVEL: u32 = 99;

/// First level that uses cumulative-tier progression instead of per-lock thresholds
pub const TIER_REGIME_LEVEL: u32 = 5;

/// Cumulative lines per progression tier (levels 5+)
pub const LINES_PER_TIER: u32 = 20;

/// Base points per cleared line before the level multiplier
pub const POINTS_PER_LINE: u32 = 10;

/// Level-up bonus per level reached
pub const LEVEL_UP_BONUS: u32 = 100;

/// Spawn position of every new block origin
pub const SPAWN_POSITION: Position = Position::new(3, GRID_SIZE as i8 - 1, 3);


/// Grid coordinate of a block's shape-matrix origin
///
/// The shape's rows map to the z axis and its columns to the x axis; y is the
/// vertical axis the block falls along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl Position {
    pub const fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }

    /// Translate by the given deltas, saturating at the `i8` range
    pub const fn offset(self, dx: i8, dy: i8, dz: i8) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Whether the coordinate lies inside the grid on every axis
    pub fn in_bounds(self) -> bool {
        let n = GRID_SIZE as i8;
        (0..n).contains(&self.x) && (0..n).contains(&self.y) && (0..n).contains(&self.z)
    }
}

/// Palette colors stored in grid cells
///
/// Cells hold the color index (1-5); 0 means empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockColor {
    Red = 1,
    Green = 2,
    Blue = 3,
    Yellow = 4,
    Purple = 5,
}

impl BlockColor {
    /// Cell value written to the grid
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Map a cell value back to its color
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(BlockColor::Red),
            2 => Some(BlockColor::Green),
            3 => Some(BlockColor::Blue),
            4 => Some(BlockColor::Yellow),
            5 => Some(BlockColor::Purple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockColor::Red => "red",
            BlockColor::Green => "green",
            BlockColor::Blue => "blue",
            BlockColor::Yellow => "yellow",
            BlockColor::Purple => "purple",
        }
    }
}

/// The ten block patterns in the catalog
///
/// - **I**: 1x4 bar
/// - **L** / **J**: 2x3 hooks (mirror images)
/// - **O**: 2x2 square
/// - **S** / **Z**: 2x3 skews (mirror images)
/// - **T**: 2x3 tee
/// - **SmallL** / **SmallJ**: 2x2 corners of three cells (mirror images)
/// - **Single**: one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    I,
    L,
    J,
    O,
    S,
    Z,
    T,
    SmallL,
    SmallJ,
    Single,
}

impl PatternKind {
    /// Every kind, in catalog order
    pub const ALL: [PatternKind; 10] = [
        PatternKind::I,
        PatternKind::L,
        PatternKind::J,
        PatternKind::O,
        PatternKind::S,
        PatternKind::Z,
        PatternKind::T,
        PatternKind::SmallL,
        PatternKind::SmallJ,
        PatternKind::Single,
    ];

    /// Parse pattern kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use block_busters_types::PatternKind;
    ///
    /// assert_eq!(PatternKind::from_str("i"), Some(PatternKind::I));
    /// assert_eq!(PatternKind::from_str("Small_J"), Some(PatternKind::SmallJ));
    /// assert_eq!(PatternKind::from_str("single"), Some(PatternKind::Single));
    /// assert_eq!(PatternKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PatternKind::I),
            "l" => Some(PatternKind::L),
            "j" => Some(PatternKind::J),
            "o" => Some(PatternKind::O),
            "s" => Some(PatternKind::S),
            "z" => Some(PatternKind::Z),
            "t" => Some(PatternKind::T),
            "small_l" => Some(PatternKind::SmallL),
            "small_j" => Some(PatternKind::SmallJ),
            "single" => Some(PatternKind::Single),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::I => "i",
            PatternKind::L => "l",
            PatternKind::J => "j",
            PatternKind::O => "o",
            PatternKind::S => "s",
            PatternKind::Z => "z",
            PatternKind::T => "t",
            PatternKind::SmallL => "small_l",
            PatternKind::SmallJ => "small_j",
            PatternKind::Single => "single",
        }
    }
}

/// Horizontal and downward movement intents
///
/// - **Left** / **Right**: -x / +x
/// - **Forward** / **Backward**: -z / +z
/// - **Down**: -y (toward the floor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Forward,
    Backward,
    Down,
}

impl Direction {
    /// (dx, dy, dz) for a single step
    pub const fn delta(self) -> (i8, i8, i8) {
        match self {
            Direction::Left => (-1, 0, 0),
            Direction::Right => (1, 0, 0),
            Direction::Forward => (0, 0, -1),
            Direction::Backward => (0, 0, 1),
            Direction::Down => (0, -1, 0),
        }
    }
}

/// Rotation axis of a rotate intent
///
/// Blocks are flat slabs in the XZ plane, so both axes turn the shape matrix by
/// 90°: X turns it clockwise, Z counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Z,
}

/// Game actions that can be applied to a session
///
/// These actions are used by keyboard/touch glue and by the JSON adapter alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    /// Leave the paused state and begin processing intents
    Start,
    /// Suspend gravity and input
    Pause,
    /// Resume after a pause
    Resume,
    /// Fresh grid, score, level and blocks; ends paused
    Reset,
    MoveLeft,
    MoveRight,
    MoveForward,
    MoveBackward,
    /// One layer down; locks the block when it cannot descend
    MoveDown,
    RotateX,
    RotateZ,
    /// Drop to the lowest valid layer and lock
    HardDrop,
}

impl GameAction {
    /// Parse action from string (for the JSON adapter)
    ///
    /// # Examples
    ///
    /// ```
    /// use block_busters_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("rotateZ"), Some(GameAction::RotateZ));
    /// assert_eq!(GameAction::from_str("hardDrop"), Some(GameAction::HardDrop));
    /// assert_eq!(GameAction::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "start" => Some(GameAction::Start),
            "pause" => Some(GameAction::Pause),
            "resume" => Some(GameAction::Resume),
            "reset" => Some(GameAction::Reset),
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "moveforward" => Some(GameAction::MoveForward),
            "movebackward" => Some(GameAction::MoveBackward),
            "movedown" => Some(GameAction::MoveDown),
            "rotatex" => Some(GameAction::RotateX),
            "rotatez" => Some(GameAction::RotateZ),
            "harddrop" => Some(GameAction::HardDrop),
            _ => None,
        }
    }

    /// Convert to camelCase string for the JSON adapter
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Start => "start",
            GameAction::Pause => "pause",
            GameAction::Resume => "resume",
            GameAction::Reset => "reset",
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::MoveForward => "moveForward",
            GameAction::MoveBackward => "moveBackward",
            GameAction::MoveDown => "moveDown",
            GameAction::RotateX => "rotateX",
            GameAction::RotateZ => "rotateZ",
            GameAction::HardDrop => "hardDrop",
        }
    }

    /// Movement direction carried by this action, if any
    pub fn direction(&self) -> Option<Direction> {
        match self {
            GameAction::MoveLeft => Some(Direction::Left),
            GameAction::MoveRight => Some(Direction::Right),
            GameAction::MoveForward => Some(Direction::Forward),
            GameAction::MoveBackward => Some(Direction::Backward),
            GameAction::MoveDown => Some(Direction::Down),
            _ => None,
        }
    }
}

/// A complete line found by the line-clear scan
///
/// Each variant names the coordinates held fixed; the free axis (or axes, for a
/// layer) spans the whole grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClearedLine {
    /// All x at fixed (y, z)
    Row { y: u8, z: u8 },
    /// All z at fixed (y, x)
    ColumnZ { y: u8, x: u8 },
    /// All y at fixed (x, z)
    ColumnY { x: u8, z: u8 },
    /// All x and z at fixed y
    Layer { y: u8 },
}

impl ClearedLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearedLine::Row { .. } => "row",
            ClearedLine::ColumnZ { .. } => "column_z",
            ClearedLine::ColumnY { .. } => "column_y",
            ClearedLine::Layer { .. } => "layer",
        }
    }
}

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Paused,
    Running,
    GameOver,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Paused => "paused",
            SessionPhase::Running => "running",
            SessionPhase::GameOver => "game_over",
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// The next block collides at the spawn position
    SpawnBlocked,
    /// A layer holds more cells than its configured limit
    LayerOverflow { layer: u8, count: u16, limit: u16 },
}

impl GameOverReason {
    /// Stable identifier for the adapter protocol
    pub fn code(&self) -> &'static str {
        match self {
            GameOverReason::SpawnBlocked => "spawn_blocked",
            GameOverReason::LayerOverflow { .. } => "layer_overflow",
        }
    }
}

/// Notifications emitted by a session, consumed by presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Lines were detected at lock and are waiting for the clear to commit
    LinesHighlighted { count: u32 },
    /// A clear was scored
    LinesCleared { count: u32, points: u32 },
    /// The level increased
    LevelUp { level: u32, bonus: u32 },
    /// A rotate intent found no valid kick
    RotationBlocked,
    /// The session reached its terminal state
    GameOver {
        reason: GameOverReason,
        score: u32,
        level: u32,
    },
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::LinesHighlighted { .. } => "lines_highlighted",
            SessionEvent::LinesCleared { .. } => "lines_cleared",
            SessionEvent::LevelUp { .. } => "level_up",
            SessionEvent::RotationBlocked => "rotation_blocked",
            SessionEvent::GameOver { .. } => "game_over",
        }
    }
}

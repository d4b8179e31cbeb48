//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules, state management, and simulation logic.
//! It has no dependencies on rendering, input devices or I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical block sequences
//! - **Testable**: Every rule is reachable through plain function calls
//! - **Portable**: Can run under any host loop (frame ticks, async timers, tests)
//! - **Fast**: Fixed-size arrays on the tick and lock paths
//!
//! # Module Structure
//!
//! - [`catalog`]: The ten block patterns, their colors and matrix rotation
//! - [`validator`]: The single collision predicate
//! - [`grid`]: 10x10x10 voxel store with placement and gravity settling
//! - [`movement`]: Moves, kicked rotations and drops of the falling block
//! - [`clear`]: Row, z-line, vertical column and layer detection and clearing
//! - [`scoring`]: Points, level progression and gravity speed
//! - [`session`]: The controller tying it all together
//! - [`rng`]: Seeded uniform block selection
//!
//! # Game Rules
//!
//! - Blocks are flat slabs falling along y; they move along x and z and rotate in place.
//! - Rotation tries the turned shape in place, then eight one-cell horizontal kicks.
//! - After each lock, complete rows, z-lines, vertical columns and layers clear together,
//!   then every column settles.
//! - Levels 1-4 advance on a single big clear, levels 5+ every 20 lines.
//! - The game ends when the next block cannot spawn or a layer exceeds its occupancy limit.
//!
//! # Example
//!
//! ```
//! use block_busters_core::{Session, SessionConfig};
//! use block_busters_types::GameAction;
//!
//! // Create and start a session
//! let mut session = Session::new(SessionConfig::default());
//! session.start();
//!
//! // Apply game actions
//! session.apply_action(GameAction::MoveLeft);
//! session.apply_action(GameAction::RotateX);
//! session.apply_action(GameAction::HardDrop);
//!
//! assert_eq!(session.blocks_locked(), 1);
//! ```
//!
//! # Timing
//!
//! Hosts either call [`Session::tick`](session::Session::tick) every frame with the
//! elapsed time, or drive [`Session::step_gravity`](session::Session::step_gravity) and
//! [`Session::commit_clear`](session::Session::commit_clear) from their own timers.

pub mod action;
pub mod catalog;
pub mod clear;
pub mod config;
pub mod grid;
pub mod movement;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod validator;

pub use block_busters_types as types;

// Re-export commonly used types for convenience
pub use action::ActionError;
pub use catalog::{get_shape, pattern, rotate, BlockPattern, Shape};
pub use clear::{apply_clear, clear_complete_lines, detect_lines, ClearSet};
pub use config::{LayerLimits, SessionConfig};
pub use grid::Grid;
pub use movement::ActiveBlock;
pub use rng::{PatternSource, SimpleRng};
pub use scoring::{calculate_score, get_drop_interval_ms, ScoreResult};
pub use session::Session;
pub use snapshot::{ActiveSnapshot, GameSnapshot, NextSnapshot};
pub use validator::is_valid;

/// Draw one pattern uniformly at random from a source
pub fn random_pattern(source: &mut PatternSource) -> BlockPattern {
    source.draw()
}

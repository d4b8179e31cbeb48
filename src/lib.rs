//! Block Busters (workspace facade crate).
//!
//! Re-exports the game crates under one name so the binary, integration tests and
//! benchmarks can use `block_busters::{core,adapter,types}`.

pub use block_busters_adapter as adapter;
pub use block_busters_core as core;
pub use block_busters_types as types;

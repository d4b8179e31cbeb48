//! Adapter module - drive a session through a line-delimited JSON protocol
//!
//! This crate lets an external controller (a script, an agent, a UI process) play a
//! session without linking against the core crate. Every message is one JSON object
//! per line.
//!
//! # Message Types
//!
//! ## Client → Game
//!
//! - **command**: Apply one game action (`start`, `moveLeft`, `rotateX`, `hardDrop`, ...)
//! - **observe**: Request a full snapshot
//!
//! ## Game → Client
//!
//! - **ack**: Command outcome, `ok` or `rejected` with a reason code
//! - **error**: The line could not be understood
//! - **observation**: Full game state snapshot (grid, blocks, score, layer counts, ...)
//! - **event**: Lines highlighted or cleared, level up, rotation blocked, game over
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Game: {"type":"command","seq":1,"action":"start"}
//! Game -> Client: {"type":"ack","seq":1,"ts":1234567890,"status":"ok"}
//! Client -> Game: {"type":"command","seq":2,"action":"hardDrop"}
//! Game -> Client: {"type":"ack","seq":2,"ts":1234567891,"status":"ok"}
//! Client -> Game: {"type":"observe","seq":3}
//! Game -> Client: {"type":"observation","seq":3,"ts":1234567892,"phase":"running",...}
//! ```
//!
//! # Implementation
//!
//! - [`runtime`] owns the session on a single tokio task; commands, the gravity
//!   interval and the deferred clear commit are serialized there
//! - [`protocol`] holds the message structures and conversions
//! - [`config`] loads [`RuntimeConfig`](config::RuntimeConfig) from JSON and the environment
//!
//! # Environment Variables
//!
//! - `BLOCK_BUSTERS_SEED`: Block selection seed
//! - `BLOCK_BUSTERS_CLEAR_DELAY_MS`: Highlight time before a clear commits
//! - `BLOCK_BUSTERS_LOG`: Log level filter (`off`, `error`, `warn`, `info`, `debug`, `trace`)
//! - `BLOCK_BUSTERS_STREAM`: Set to "1" or "true" to push an observation after every change

pub mod config;
pub mod protocol;
pub mod runtime;

pub use block_busters_core as core;
pub use block_busters_types as types;

pub use config::{ConfigError, RuntimeConfig};
pub use protocol::{encode_output, parse_message, route_line, ParsedMessage, ProtocolError, Routed};
pub use runtime::{spawn_session, RuntimeInput, RuntimeOptions, RuntimeOutput, SessionHandle};

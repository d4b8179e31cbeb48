//! Protocol module - JSON message types for the adapter
//!
//! Inbound messages carry `type` and `seq`. Outbound messages additionally carry `ts`
//! (milliseconds since the Unix epoch).

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::grid::GridCells;
use crate::core::{ActionError, ActiveSnapshot, GameSnapshot, NextSnapshot, Shape};
use crate::runtime::{RuntimeInput, RuntimeOutput};
use crate::types::{GameAction, GameOverReason, PatternKind, SessionEvent, SessionPhase, GRID_SIZE};

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "command")]
    Command,
}

impl Default for CommandType {
    fn default() -> Self {
        Self::Command
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObserveType {
    #[serde(rename = "observe")]
    Observe,
}

impl Default for ObserveType {
    fn default() -> Self {
        Self::Observe
    }
}

/// Apply one game action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub action: ActionName,
}

/// Request a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserveMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ObserveType,
    pub seq: u64,
}

/// Wire names of [`GameAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionName {
    Start,
    Pause,
    Resume,
    Reset,
    MoveLeft,
    MoveRight,
    MoveForward,
    MoveBackward,
    MoveDown,
    RotateX,
    RotateZ,
    HardDrop,
}

impl From<ActionName> for GameAction {
    fn from(value: ActionName) -> Self {
        match value {
            ActionName::Start => GameAction::Start,
            ActionName::Pause => GameAction::Pause,
            ActionName::Resume => GameAction::Resume,
            ActionName::Reset => GameAction::Reset,
            ActionName::MoveLeft => GameAction::MoveLeft,
            ActionName::MoveRight => GameAction::MoveRight,
            ActionName::MoveForward => GameAction::MoveForward,
            ActionName::MoveBackward => GameAction::MoveBackward,
            ActionName::MoveDown => GameAction::MoveDown,
            ActionName::RotateX => GameAction::RotateX,
            ActionName::RotateZ => GameAction::RotateZ,
            ActionName::HardDrop => GameAction::HardDrop,
        }
    }
}

impl From<GameAction> for ActionName {
    fn from(value: GameAction) -> Self {
        match value {
            GameAction::Start => ActionName::Start,
            GameAction::Pause => ActionName::Pause,
            GameAction::Resume => ActionName::Resume,
            GameAction::Reset => ActionName::Reset,
            GameAction::MoveLeft => ActionName::MoveLeft,
            GameAction::MoveRight => ActionName::MoveRight,
            GameAction::MoveForward => ActionName::MoveForward,
            GameAction::MoveBackward => ActionName::MoveBackward,
            GameAction::MoveDown => ActionName::MoveDown,
            GameAction::RotateX => ActionName::RotateX,
            GameAction::RotateZ => ActionName::RotateZ,
            GameAction::HardDrop => ActionName::HardDrop,
        }
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidCommand,
    UnknownType,
    NotPlayable,
    Blocked,
    NoActive,
    Unchanged,
    Backpressure,
}

impl From<ActionError> for ErrorCode {
    fn from(value: ActionError) -> Self {
        match value {
            ActionError::NotRunning | ActionError::GameOver | ActionError::ClearPending => {
                ErrorCode::NotPlayable
            }
            ActionError::Blocked => ErrorCode::Blocked,
            ActionError::NoActive => ErrorCode::NoActive,
            ActionError::Unchanged => ErrorCode::Unchanged,
        }
    }
}

/// Command outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub message: Option<String>,
}

/// A line that could not be handled at all
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorMessage {
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseLower {
    Paused,
    Running,
    GameOver,
}

impl From<SessionPhase> for PhaseLower {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Paused => PhaseLower::Paused,
            SessionPhase::Running => PhaseLower::Running,
            SessionPhase::GameOver => PhaseLower::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKindLower {
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

impl From<PatternKind> for PatternKindLower {
    fn from(value: PatternKind) -> Self {
        match value {
            PatternKind::I => PatternKindLower::I,
            PatternKind::L => PatternKindLower::L,
            PatternKind::J => PatternKindLower::J,
            PatternKind::O => PatternKindLower::O,
            PatternKind::S => PatternKindLower::S,
            PatternKind::Z => PatternKindLower::Z,
            PatternKind::T => PatternKindLower::T,
            PatternKind::SmallL => PatternKindLower::SmallL,
            PatternKind::SmallJ => PatternKindLower::SmallJ,
            PatternKind::Single => PatternKindLower::Single,
        }
    }
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum GameOverInfo {
    SpawnBlocked,
    LayerOverflow { layer: u8, count: u16, limit: u16 },
}

impl From<GameOverReason> for GameOverInfo {
    fn from(value: GameOverReason) -> Self {
        match value {
            GameOverReason::SpawnBlocked => GameOverInfo::SpawnBlocked,
            GameOverReason::LayerOverflow {
                layer,
                count,
                limit,
            } => GameOverInfo::LayerOverflow {
                layer,
                count,
                limit,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: u8,
    /// Color indices indexed `[y][z][x]`; 0 is empty
    pub cells: GridCells,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBlockSnapshot {
    pub kind: PatternKindLower,
    pub color: u8,
    /// Shape matrix, rows along z and columns along x
    pub shape: Vec<Vec<u8>>,
    /// Matrix origin as `[x, y, z]`
    pub position: [i8; 3],
}

impl From<ActiveSnapshot> for ActiveBlockSnapshot {
    fn from(value: ActiveSnapshot) -> Self {
        Self {
            kind: value.kind.into(),
            color: value.color.index(),
            shape: value.shape.to_matrix(),
            position: [value.position.x, value.position.y, value.position.z],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextBlockSnapshot {
    pub kind: PatternKindLower,
    pub color: u8,
    pub shape: Vec<Vec<u8>>,
}

impl From<NextSnapshot> for NextBlockSnapshot {
    fn from(value: NextSnapshot) -> Self {
        Self {
            kind: value.kind.into(),
            color: value.color.index(),
            shape: value.shape.to_matrix(),
        }
    }
}

/// Deterministic state hash serialized as 16 lowercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

/// Full game state observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub phase: PhaseLower,
    pub playable: bool,
    pub paused: bool,
    pub game_over: bool,
    pub controls_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub game_over_reason: Option<GameOverInfo>,
    pub episode_id: u32,
    pub blocks_locked: u32,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub drop_interval_ms: u32,
    pub grid: GridSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub active: Option<ActiveBlockSnapshot>,
    pub next: NextBlockSnapshot,
    /// Layers the active block can still fall
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub drop_distance: Option<u8>,
    pub layer_counts: [u16; GRID_SIZE as usize],
    /// Lines highlighted and waiting to clear
    pub pending_lines: u32,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "event")]
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    LinesHighlighted {
        count: u32,
    },
    LinesCleared {
        count: u32,
        points: u32,
    },
    LevelUp {
        level: u32,
        bonus: u32,
    },
    RotationBlocked,
    GameOver {
        reason: GameOverInfo,
        score: u32,
        level: u32,
    },
}

impl From<SessionEvent> for EventPayload {
    fn from(value: SessionEvent) -> Self {
        match value {
            SessionEvent::LinesHighlighted { count } => EventPayload::LinesHighlighted { count },
            SessionEvent::LinesCleared { count, points } => {
                EventPayload::LinesCleared { count, points }
            }
            SessionEvent::LevelUp { level, bonus } => EventPayload::LevelUp { level, bonus },
            SessionEvent::RotationBlocked => EventPayload::RotationBlocked,
            SessionEvent::GameOver {
                reason,
                score,
                level,
            } => EventPayload::GameOver {
                reason: reason.into(),
                score,
                level,
            },
        }
    }
}

/// Session notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: EventType,
    pub ts: u64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

// ============== Message Parsing ==============

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("invalid {msg_type} message: {source}")]
    InvalidMessage {
        msg_type: &'static str,
        seq: Option<u64>,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::InvalidJson(_) => ErrorCode::InvalidJson,
            ProtocolError::InvalidMessage { .. } => ErrorCode::InvalidCommand,
        }
    }

    /// Sequence number of the offending line, when one could be recovered
    pub fn seq(&self) -> Option<u64> {
        match self {
            ProtocolError::InvalidJson(_) => None,
            ProtocolError::InvalidMessage { seq, .. } => *seq,
        }
    }
}

/// Parse one inbound line
///
/// A well-formed object with an unrecognized `type` is not an error; it comes back as
/// [`ParsedMessage::Unknown`] so the caller can answer it.
pub fn parse_message(json: &str) -> Result<ParsedMessage, ProtocolError> {
    #[derive(Debug, Deserialize)]
    struct Header {
        #[serde(rename = "type")]
        msg_type: Option<String>,
        seq: Option<u64>,
    }

    let header: Header = serde_json::from_str(json).map_err(ProtocolError::InvalidJson)?;
    let seq = header.seq;
    let invalid = |msg_type: &'static str| {
        move |source: serde_json::Error| ProtocolError::InvalidMessage {
            msg_type,
            seq,
            source,
        }
    };

    match header.msg_type.as_deref() {
        Some("command") => serde_json::from_str(json)
            .map(ParsedMessage::Command)
            .map_err(invalid("command")),
        Some("observe") => serde_json::from_str(json)
            .map(ParsedMessage::Observe)
            .map_err(invalid("observe")),
        other => Ok(ParsedMessage::Unknown(UnknownMessage {
            seq: seq.unwrap_or(0),
            msg_type: other.unwrap_or("").to_string(),
        })),
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Command(CommandMessage),
    Observe(ObserveMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
    pub msg_type: String,
}

/// Recover `"seq": N` from a line that is not valid JSON
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// What to do with one inbound line
#[derive(Debug, Clone)]
pub enum Routed {
    /// Forward to the session task
    Input(RuntimeInput),
    /// Answer directly without touching the session
    Reply(ErrorMessage),
    /// Blank line
    Ignore,
}

/// Parse a line and decide where it goes
pub fn route_line(line: &str) -> Routed {
    let line = line.trim();
    if line.is_empty() {
        return Routed::Ignore;
    }
    match parse_message(line) {
        Ok(ParsedMessage::Command(cmd)) => Routed::Input(RuntimeInput::Action {
            seq: cmd.seq,
            action: cmd.action.into(),
        }),
        Ok(ParsedMessage::Observe(obs)) => Routed::Input(RuntimeInput::Observe { seq: obs.seq }),
        Ok(ParsedMessage::Unknown(m)) => Routed::Reply(create_error(
            m.seq,
            ErrorCode::UnknownType,
            &format!("unknown message type {:?}", m.msg_type),
        )),
        Err(err) => {
            let seq = err
                .seq()
                .or_else(|| extract_seq_best_effort(line))
                .unwrap_or(0);
            Routed::Reply(create_error(seq, err.code(), &err.to_string()))
        }
    }
}

/// Serialize one runtime output as a JSON line (without the newline)
pub fn encode_output(output: &RuntimeOutput) -> Result<String, serde_json::Error> {
    match output {
        RuntimeOutput::Ack { seq, result: Ok(()) } => serde_json::to_string(&create_ack(*seq)),
        RuntimeOutput::Ack {
            seq,
            result: Err(err),
        } => serde_json::to_string(&create_rejection(*seq, *err)),
        RuntimeOutput::Observation { seq, snapshot } => {
            serde_json::to_string(&create_observation(seq.unwrap_or(0), snapshot))
        }
        RuntimeOutput::Event(event) => serde_json::to_string(&create_event(*event)),
    }
}

// ============== Utility Functions ==============

/// Create an ok acknowledgment
pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        code: None,
        message: None,
    }
}

/// Create an acknowledgment for a command the session refused
pub fn create_rejection(seq: u64, error: ActionError) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Rejected,
        code: Some(error.into()),
        message: Some(error.message().to_string()),
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

pub fn create_event(event: SessionEvent) -> EventMessage {
    EventMessage {
        msg_type: EventType::Event,
        ts: current_timestamp_ms(),
        payload: event.into(),
    }
}

/// Build an observation from a snapshot
pub fn create_observation(seq: u64, snapshot: &GameSnapshot) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        phase: snapshot.phase.into(),
        playable: snapshot.playable(),
        paused: snapshot.paused,
        game_over: snapshot.game_over,
        controls_enabled: snapshot.controls_enabled,
        game_over_reason: snapshot.game_over_reason.map(Into::into),
        episode_id: snapshot.episode_id,
        blocks_locked: snapshot.blocks_locked,
        score: snapshot.score,
        level: snapshot.level,
        lines: snapshot.lines,
        drop_interval_ms: snapshot.drop_interval_ms,
        grid: GridSnapshot {
            size: GRID_SIZE,
            cells: snapshot.grid,
        },
        active: snapshot.active.map(Into::into),
        next: snapshot.next.into(),
        drop_distance: snapshot.drop_distance,
        layer_counts: snapshot.layer_counts,
        pending_lines: snapshot.pending_lines,
        state_hash: state_hash(snapshot),
    }
}

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn write_shape(hasher: &mut Fnv1aHasher, shape: &Shape) {
    hasher.write_u8(shape.rows() as u8);
    hasher.write_u8(shape.cols() as u8);
    for (r, c) in shape.cells() {
        hasher.write_u8(r as u8);
        hasher.write_u8(c as u8);
    }
}

/// Hash of everything a controller can act on: grid, blocks, phase and counters
pub fn state_hash(snapshot: &GameSnapshot) -> StateHash {
    let mut hasher = Fnv1aHasher::new();
    for layer in &snapshot.grid {
        for row in layer {
            hasher.write(row);
        }
    }
    match snapshot.active {
        Some(active) => {
            hasher.write_u8(1);
            hasher.write_u8(active.color.index());
            write_shape(&mut hasher, &active.shape);
            hasher.write_i8(active.position.x);
            hasher.write_i8(active.position.y);
            hasher.write_i8(active.position.z);
        }
        None => hasher.write_u8(0),
    }
    hasher.write_u8(snapshot.next.color.index());
    write_shape(&mut hasher, &snapshot.next.shape);
    hasher.write_u8(snapshot.phase as u8);
    hasher.write_u8(snapshot.controls_enabled as u8);
    hasher.write_u32(snapshot.pending_lines);
    hasher.write_u32(snapshot.episode_id);
    hasher.write_u32(snapshot.score);
    hasher.write_u32(snapshot.level);
    hasher.write_u32(snapshot.lines);
    StateHash(hasher.finish())
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

use crate::catalog::{pattern, BlockPattern, Shape};
use crate::grid::GridCells;
use crate::movement::ActiveBlock;
use crate::types::{
    BlockColor, GameOverReason, PatternKind, Position, SessionPhase, GRID_SIZE, START_LEVEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PatternKind,
    pub color: BlockColor,
    pub shape: Shape,
    pub position: Position,
}

impl From<ActiveBlock> for ActiveSnapshot {
    fn from(value: ActiveBlock) -> Self {
        Self {
            kind: value.kind,
            color: value.color,
            shape: value.shape,
            position: value.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NextSnapshot {
    pub kind: PatternKind,
    pub color: BlockColor,
    pub shape: Shape,
}

impl From<BlockPattern> for NextSnapshot {
    fn from(value: BlockPattern) -> Self {
        Self {
            kind: value.kind,
            color: value.color,
            shape: value.shape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    /// Cells indexed `[y][z][x]`
    pub grid: GridCells,
    pub active: Option<ActiveSnapshot>,
    pub next: NextSnapshot,
    /// Layers until the falling block collides
    pub drop_distance: Option<u8>,
    pub layer_counts: [u16; GRID_SIZE as usize],
    pub pending_lines: u32,
    pub phase: SessionPhase,
    pub paused: bool,
    pub game_over: bool,
    pub controls_enabled: bool,
    pub game_over_reason: Option<GameOverReason>,
    pub episode_id: u32,
    pub blocks_locked: u32,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub drop_interval_ms: u32,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.grid = [[[0u8; GRID_SIZE as usize]; GRID_SIZE as usize]; GRID_SIZE as usize];
        self.active = None;
        self.next = NextSnapshot::from(pattern(PatternKind::Single));
        self.drop_distance = None;
        self.layer_counts = [0; GRID_SIZE as usize];
        self.pending_lines = 0;
        self.phase = SessionPhase::Paused;
        self.paused = true;
        self.game_over = false;
        self.controls_enabled = false;
        self.game_over_reason = None;
        self.episode_id = 0;
        self.blocks_locked = 0;
        self.score = 0;
        self.level = START_LEVEL;
        self.lines = 0;
        self.drop_interval_ms = 0;
    }

    pub fn playable(&self) -> bool {
        !self.game_over && !self.paused && self.controls_enabled
    }

    /// Grid cell at (x, y, z); 0 when out of range
    pub fn cell(&self, x: usize, y: usize, z: usize) -> u8 {
        self.grid
            .get(y)
            .and_then(|layer| layer.get(z))
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        let mut s = Self {
            grid: [[[0u8; GRID_SIZE as usize]; GRID_SIZE as usize]; GRID_SIZE as usize],
            active: None,
            next: NextSnapshot::from(pattern(PatternKind::Single)),
            drop_distance: None,
            layer_counts: [0; GRID_SIZE as usize],
            pending_lines: 0,
            phase: SessionPhase::Paused,
            paused: true,
            game_over: false,
            controls_enabled: false,
            game_over_reason: None,
            episode_id: 0,
            blocks_locked: 0,
            score: 0,
            level: START_LEVEL,
            lines: 0,
            drop_interval_ms: 0,
        };
        s.clear();
        s
    }
}

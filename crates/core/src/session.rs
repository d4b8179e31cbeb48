//! Session module - the game controller
//!
//! This module ties together all core components: grid, catalog, movement, line clears
//! and scoring. It owns every piece of mutable game state and exposes it only through
//! commands and snapshots.
//!
//! Lock cycle: write the block into the grid, detect complete lines, score them, then
//! either spawn the next block right away (no lines) or hold a pending clear until
//! [`Session::commit_clear`] zeroes the lines, settles the grid and spawns.

use log::{debug, info, warn};

use crate::action::ActionError;
use crate::catalog::BlockPattern;
use crate::clear::{apply_clear, detect_lines, ClearSet};
use crate::config::SessionConfig;
use crate::grid::Grid;
use crate::movement::ActiveBlock;
use crate::rng::PatternSource;
use crate::scoring::{calculate_score, get_drop_interval_ms};
use crate::snapshot::{ActiveSnapshot, GameSnapshot, NextSnapshot};
use crate::types::*;

/// Lines detected at lock, waiting to be zeroed
#[derive(Debug, Clone)]
struct PendingClear {
    lines: ClearSet,
    points: u32,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    grid: Grid,
    source: PatternSource,
    active: Option<ActiveBlock>,
    next: BlockPattern,
    phase: SessionPhase,
    controls_enabled: bool,
    pending_clear: Option<PendingClear>,
    game_over_reason: Option<GameOverReason>,
    /// Monotonic episode id (increments on reset).
    episode_id: u32,
    /// Blocks locked in the current episode.
    blocks_locked: u32,
    score: u32,
    level: u32,
    lines: u32,
    drop_timer_ms: u32,
    clear_timer_ms: u32,
    events: Vec<SessionEvent>,
}

impl Session {
    /// Create a paused session with an empty grid and two random blocks
    pub fn new(config: SessionConfig) -> Self {
        let mut source = PatternSource::new(config.seed);
        let current = source.draw();
        let next = source.draw();
        Self::assemble(config, source, Grid::new(), current, next)
    }

    /// Create a paused session from a prepared grid and block queue
    ///
    /// Used for puzzle setups and tests; later blocks are still drawn from the seed.
    pub fn from_parts(
        config: SessionConfig,
        grid: Grid,
        current: BlockPattern,
        next: BlockPattern,
    ) -> Self {
        let source = PatternSource::new(config.seed);
        Self::assemble(config, source, grid, current, next)
    }

    fn assemble(
        config: SessionConfig,
        source: PatternSource,
        grid: Grid,
        current: BlockPattern,
        next: BlockPattern,
    ) -> Self {
        let active = ActiveBlock::spawn(current, config.spawn);
        if !active.is_valid(&grid) {
            warn!("spawn position {:?} is not valid for the first block", config.spawn);
        }

        Self {
            config,
            grid,
            source,
            active: Some(active),
            next,
            phase: SessionPhase::Paused,
            controls_enabled: false,
            pending_clear: None,
            game_over_reason: None,
            episode_id: 0,
            blocks_locked: 0,
            score: 0,
            level: START_LEVEL,
            lines: 0,
            drop_timer_ms: 0,
            clear_timer_ms: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<ActiveBlock> {
        self.active
    }

    pub fn next(&self) -> BlockPattern {
        self.next
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn paused(&self) -> bool {
        self.phase == SessionPhase::Paused
    }

    pub fn game_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    /// Lines awaiting [`Session::commit_clear`]
    pub fn pending_clear(&self) -> Option<&[ClearedLine]> {
        self.pending_clear.as_ref().map(|p| p.lines.as_slice())
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn blocks_locked(&self) -> u32 {
        self.blocks_locked
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    /// Current gravity interval
    pub fn drop_interval_ms(&self) -> u32 {
        get_drop_interval_ms(self.level)
    }

    /// Layers the falling block can descend before colliding
    pub fn drop_distance(&self) -> Option<u8> {
        self.active.map(|block| block.drop_distance(&self.grid))
    }

    /// Take all events emitted since the last call
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.grid.write_u8_grid(&mut out.grid);

        out.active = self.active.map(ActiveSnapshot::from);
        out.next = NextSnapshot::from(self.next);
        out.drop_distance = self.drop_distance();
        out.layer_counts = self.grid.layer_counts();
        out.pending_lines = self.pending_clear.as_ref().map_or(0, |p| p.lines.len() as u32);
        out.phase = self.phase;
        out.paused = self.paused();
        out.game_over = self.game_over();
        out.controls_enabled = self.controls_enabled;
        out.game_over_reason = self.game_over_reason;
        out.episode_id = self.episode_id;
        out.blocks_locked = self.blocks_locked;
        out.score = self.score;
        out.level = self.level;
        out.lines = self.lines;
        out.drop_interval_ms = self.drop_interval_ms();
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Paused → Running; refused once the game is over
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Paused {
            return false;
        }
        self.phase = SessionPhase::Running;
        self.controls_enabled = self.pending_clear.is_none();
        self.drop_timer_ms = 0;
        info!("session {} running", self.episode_id);
        true
    }

    /// Running → Paused
    pub fn pause(&mut self) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        self.phase = SessionPhase::Paused;
        self.controls_enabled = false;
        self.drop_timer_ms = 0;
        info!("session {} paused", self.episode_id);
        true
    }

    /// Paused → Running
    pub fn resume(&mut self) -> bool {
        self.start()
    }

    /// Back to a fresh, paused game: empty grid, zero score, level 1, two new blocks
    pub fn reset(&mut self) {
        let current = self.source.draw();
        let next = self.source.draw();

        self.grid.clear();
        self.active = Some(ActiveBlock::spawn(current, self.config.spawn));
        self.next = next;
        self.phase = SessionPhase::Paused;
        self.controls_enabled = false;
        self.pending_clear = None;
        self.game_over_reason = None;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.blocks_locked = 0;
        self.score = 0;
        self.level = START_LEVEL;
        self.lines = 0;
        self.drop_timer_ms = 0;
        self.clear_timer_ms = 0;
        self.events.clear();
        info!("session reset (episode {})", self.episode_id);
    }

    fn check_playable(&self) -> Result<(), ActionError> {
        match self.phase {
            SessionPhase::GameOver => Err(ActionError::GameOver),
            SessionPhase::Paused => Err(ActionError::NotRunning),
            SessionPhase::Running if self.pending_clear.is_some() => Err(ActionError::ClearPending),
            SessionPhase::Running if !self.controls_enabled => Err(ActionError::NotRunning),
            SessionPhase::Running => Ok(()),
        }
    }

    /// Move the falling block one step
    ///
    /// A blocked `Down` locks the block. Returns whether the block moved.
    pub fn move_block(&mut self, direction: Direction) -> bool {
        if self.check_playable().is_err() {
            return false;
        }
        let Some(mut block) = self.active else {
            warn!("move requested without an active block");
            return false;
        };

        if block.try_move(direction, &self.grid) {
            self.active = Some(block);
            return true;
        }

        if direction == Direction::Down {
            self.lock_active();
        }
        false
    }

    /// Rotate the falling block with kicks
    ///
    /// Returns the applied kick (dx, dz), or None if rejected. A collision that no kick
    /// resolves emits [`SessionEvent::RotationBlocked`].
    pub fn rotate(&mut self, axis: Axis) -> Option<(i8, i8)> {
        self.check_playable().ok()?;
        let Some(mut block) = self.active else {
            warn!("rotate requested without an active block");
            return None;
        };

        match block.try_rotate(axis, &self.grid) {
            Some(kick) => {
                self.active = Some(block);
                Some(kick)
            }
            None => {
                debug!("rotation about {:?} blocked at {:?}", axis, block.position);
                self.events.push(SessionEvent::RotationBlocked);
                None
            }
        }
    }

    /// Drop the falling block to its lowest valid layer and lock it
    ///
    /// Returns the number of layers dropped.
    pub fn hard_drop(&mut self) -> Option<u8> {
        self.check_playable().ok()?;
        let Some(mut block) = self.active else {
            warn!("hard drop requested without an active block");
            return None;
        };

        let distance = block.hard_drop(&self.grid);
        self.active = Some(block);
        self.lock_active();
        Some(distance)
    }

    /// One gravity step: descend, or lock when the block cannot
    pub fn step_gravity(&mut self) -> bool {
        if self.phase != SessionPhase::Running || self.pending_clear.is_some() {
            return false;
        }
        let Some(mut block) = self.active else {
            warn!("gravity step without an active block");
            return false;
        };

        if block.try_move(Direction::Down, &self.grid) {
            self.active = Some(block);
        } else {
            self.lock_active();
        }
        true
    }

    /// Advance timers by `elapsed_ms`
    ///
    /// Commits a pending clear once its delay expires; otherwise applies gravity every
    /// [`Session::drop_interval_ms`]. Returns true if the state changed.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }

        if self.pending_clear.is_some() {
            self.clear_timer_ms = self.clear_timer_ms.saturating_sub(elapsed_ms);
            if self.clear_timer_ms == 0 {
                return self.commit_clear();
            }
            return false;
        }

        self.drop_timer_ms = self.drop_timer_ms.saturating_add(elapsed_ms);
        if self.drop_timer_ms >= self.drop_interval_ms() {
            self.drop_timer_ms = 0;
            return self.step_gravity();
        }

        false
    }

    /// Lock the falling block into the grid and handle line clears
    fn lock_active(&mut self) {
        let Some(block) = self.active.take() else {
            warn!("lock requested without an active block");
            return;
        };

        self.grid.place(&block.shape, block.position, block.color);
        self.blocks_locked = self.blocks_locked.wrapping_add(1);
        self.drop_timer_ms = 0;

        let lines = detect_lines(&self.grid);
        if lines.is_empty() {
            self.finish_lock();
            return;
        }

        let count = lines.len() as u32;
        let result = calculate_score(count, self.level, self.lines);
        self.lines = self.lines.saturating_add(count);
        self.score = self.score.saturating_add(result.total);
        self.events.push(SessionEvent::LinesHighlighted { count });

        if let Some(level) = result.new_level {
            self.level = level;
            info!("level up: {} (+{})", level, result.level_bonus);
            self.events.push(SessionEvent::LevelUp {
                level,
                bonus: result.level_bonus,
            });
        }

        debug!("{} lines detected, {} points", count, result.line_clear_score);
        self.pending_clear = Some(PendingClear {
            lines,
            points: result.line_clear_score,
        });
        self.controls_enabled = false;
        self.clear_timer_ms = self.config.clear_delay_ms;

        if self.config.clear_delay_ms == 0 {
            self.commit_clear();
        }
    }

    /// Zero the pending lines, settle the grid and spawn the next block
    ///
    /// Produces the same grid whether called at lock time or after the highlight delay.
    /// Returns false if nothing was pending.
    pub fn commit_clear(&mut self) -> bool {
        let Some(pending) = self.pending_clear.take() else {
            return false;
        };

        apply_clear(&mut self.grid, &pending.lines);
        self.clear_timer_ms = 0;
        self.events.push(SessionEvent::LinesCleared {
            count: pending.lines.len() as u32,
            points: pending.points,
        });
        self.finish_lock();
        true
    }

    /// Promote the next block, then run both game-over checks
    fn finish_lock(&mut self) {
        let pattern = std::mem::replace(&mut self.next, self.source.draw());
        let block = ActiveBlock::spawn(pattern, self.config.spawn);
        self.active = Some(block);
        self.drop_timer_ms = 0;

        if let Some(reason) = self.config.layer_limits.check(&self.grid) {
            self.end_game(reason);
            return;
        }

        if !block.is_valid(&self.grid) {
            self.end_game(GameOverReason::SpawnBlocked);
            return;
        }

        self.controls_enabled = self.phase == SessionPhase::Running;
    }

    fn end_game(&mut self, reason: GameOverReason) {
        self.phase = SessionPhase::GameOver;
        self.controls_enabled = false;
        self.game_over_reason = Some(reason);
        info!(
            "game over ({}): score {}, level {}",
            reason.code(),
            self.score,
            self.level
        );
        self.events.push(SessionEvent::GameOver {
            reason,
            score: self.score,
            level: self.level,
        });
    }

    /// Apply a game action, reporting why it was refused
    pub fn try_action(&mut self, action: GameAction) -> Result<(), ActionError> {
        match action {
            GameAction::Reset => {
                self.reset();
                Ok(())
            }
            GameAction::Start | GameAction::Resume => {
                if self.game_over() {
                    return Err(ActionError::GameOver);
                }
                self.start().then_some(()).ok_or(ActionError::Unchanged)
            }
            GameAction::Pause => {
                if self.game_over() {
                    return Err(ActionError::GameOver);
                }
                self.pause().then_some(()).ok_or(ActionError::Unchanged)
            }
            GameAction::MoveDown => {
                self.check_playable()?;
                // A blocked descent locks the block, which is still an applied action.
                self.move_block(Direction::Down);
                Ok(())
            }
            GameAction::MoveLeft
            | GameAction::MoveRight
            | GameAction::MoveForward
            | GameAction::MoveBackward => {
                self.check_playable()?;
                let direction = action.direction().ok_or(ActionError::Blocked)?;
                if self.move_block(direction) {
                    Ok(())
                } else {
                    Err(ActionError::Blocked)
                }
            }
            GameAction::RotateX | GameAction::RotateZ => {
                self.check_playable()?;
                let axis = if action == GameAction::RotateX {
                    Axis::X
                } else {
                    Axis::Z
                };
                self.rotate(axis).map(|_| ()).ok_or(ActionError::Blocked)
            }
            GameAction::HardDrop => {
                self.check_playable()?;
                self.hard_drop().map(|_| ()).ok_or(ActionError::NoActive)
            }
        }
    }

    /// Apply a game action
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        self.try_action(action).is_ok()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

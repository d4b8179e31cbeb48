//! Session runtime
//!
//! One tokio task owns the [`Session`]. Commands, the gravity interval and the deferred
//! clear commit are all handled inside a single `select!` loop, so every operation sees
//! a consistent grid and block position.
//!
//! Timers are rebuilt whenever the phase, level, pending clear, locked-block count or
//! episode changes: pausing stops gravity, a level up shortens the interval, and a new
//! block always gets a full interval before its first gravity step.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep};

use crate::core::{ActionError, GameSnapshot, Session};
use crate::types::{GameAction, SessionEvent, SessionPhase};

/// Input delivered to the session task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeInput {
    Action { seq: u64, action: GameAction },
    Observe { seq: u64 },
    Shutdown,
}

/// Output produced by the session task
#[derive(Debug, Clone)]
pub enum RuntimeOutput {
    Ack {
        seq: u64,
        result: Result<(), ActionError>,
    },
    /// `seq` is `None` for streamed observations
    Observation {
        seq: Option<u64>,
        snapshot: Box<GameSnapshot>,
    },
    Event(SessionEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Send an observation after every change, not only on request
    pub stream_observations: bool,
    /// Capacity of the input channel
    pub max_pending_commands: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            stream_observations: false,
            max_pending_commands: 16,
        }
    }
}

/// Channels to a spawned session task
pub struct SessionHandle {
    pub input: mpsc::Sender<RuntimeInput>,
    pub output: mpsc::UnboundedReceiver<RuntimeOutput>,
    pub task: JoinHandle<Session>,
}

impl SessionHandle {
    /// Stop the task and take the session back
    pub async fn shutdown(self) -> Option<Session> {
        let _ = self.input.send(RuntimeInput::Shutdown).await;
        self.task.await.ok()
    }
}

/// Spawn the session task on the current tokio runtime
pub fn spawn_session(session: Session, options: RuntimeOptions) -> SessionHandle {
    let (input_tx, input_rx) = mpsc::channel(options.max_pending_commands.max(1));
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_session(session, input_rx, output_tx, options));
    SessionHandle {
        input: input_tx,
        output: output_rx,
        task,
    }
}

/// State the timers depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerKey {
    phase: SessionPhase,
    level: u32,
    pending: bool,
    blocks_locked: u32,
    episode_id: u32,
}

impl TimerKey {
    fn capture(session: &Session) -> Self {
        Self {
            phase: session.phase(),
            level: session.level(),
            pending: session.pending_clear().is_some(),
            blocks_locked: session.blocks_locked(),
            episode_id: session.episode_id(),
        }
    }

    fn gravity_active(&self) -> bool {
        self.phase == SessionPhase::Running && !self.pending
    }
}

fn gravity_interval(session: &Session) -> Interval {
    let period = Duration::from_millis(session.drop_interval_ms() as u64);
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn clear_deadline(session: &Session) -> Option<Pin<Box<Sleep>>> {
    if session.phase() != SessionPhase::Running || session.pending_clear().is_none() {
        return None;
    }
    let delay = Duration::from_millis(session.config().clear_delay_ms as u64);
    Some(Box::pin(sleep(delay)))
}

async fn wait_deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => pending::<()>().await,
    }
}

/// Drive a session until the input channel closes or `Shutdown` arrives
pub async fn run_session(
    mut session: Session,
    mut input_rx: mpsc::Receiver<RuntimeInput>,
    output_tx: mpsc::UnboundedSender<RuntimeOutput>,
    options: RuntimeOptions,
) -> Session {
    let mut key = TimerKey::capture(&session);
    let mut gravity = gravity_interval(&session);
    let mut deadline = clear_deadline(&session);

    loop {
        let changed = tokio::select! {
            input = input_rx.recv() => match input {
                None | Some(RuntimeInput::Shutdown) => break,
                Some(RuntimeInput::Action { seq, action }) => {
                    let result = session.try_action(action);
                    if let Err(err) = result {
                        debug!("seq {} {} rejected: {}", seq, action.as_str(), err.code());
                    }
                    let _ = output_tx.send(RuntimeOutput::Ack { seq, result });
                    result.is_ok()
                }
                Some(RuntimeInput::Observe { seq }) => {
                    let _ = output_tx.send(RuntimeOutput::Observation {
                        seq: Some(seq),
                        snapshot: Box::new(session.snapshot()),
                    });
                    false
                }
            },
            _ = gravity.tick(), if key.gravity_active() => session.step_gravity(),
            _ = wait_deadline(&mut deadline) => {
                deadline = None;
                session.commit_clear()
            }
        };

        for event in session.take_events() {
            let _ = output_tx.send(RuntimeOutput::Event(event));
        }
        if changed && options.stream_observations {
            let _ = output_tx.send(RuntimeOutput::Observation {
                seq: None,
                snapshot: Box::new(session.snapshot()),
            });
        }

        let now = TimerKey::capture(&session);
        if now != key {
            gravity = gravity_interval(&session);
            deadline = clear_deadline(&session);
            key = now;
        }
    }

    info!(
        "session task stopped (episode {}, score {})",
        session.episode_id(),
        session.score()
    );
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{pattern, Grid, LayerLimits, SessionConfig};
    use crate::types::PatternKind;

    async fn send(handle: &SessionHandle, seq: u64, action: GameAction) {
        handle
            .input
            .send(RuntimeInput::Action { seq, action })
            .await
            .unwrap();
    }

    async fn next_ack(handle: &mut SessionHandle) -> (u64, Result<(), ActionError>) {
        loop {
            match handle.output.recv().await.unwrap() {
                RuntimeOutput::Ack { seq, result } => return (seq, result),
                _ => continue,
            }
        }
    }

    async fn observe(handle: &mut SessionHandle, seq: u64) -> GameSnapshot {
        handle
            .input
            .send(RuntimeInput::Observe { seq })
            .await
            .unwrap();
        loop {
            match handle.output.recv().await.unwrap() {
                RuntimeOutput::Observation {
                    seq: Some(got),
                    snapshot,
                } if got == seq => return *snapshot,
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_actions_are_acknowledged_in_order() {
        let mut handle = spawn_session(
            Session::new(SessionConfig::default()),
            RuntimeOptions::default(),
        );

        send(&handle, 1, GameAction::MoveLeft).await;
        assert_eq!(next_ack(&mut handle).await, (1, Err(ActionError::NotRunning)));

        send(&handle, 2, GameAction::Start).await;
        assert_eq!(next_ack(&mut handle).await, (2, Ok(())));

        send(&handle, 3, GameAction::HardDrop).await;
        assert_eq!(next_ack(&mut handle).await, (3, Ok(())));

        let snapshot = observe(&mut handle, 4).await;
        assert_eq!(snapshot.blocks_locked, 1);

        let session = handle.shutdown().await.unwrap();
        assert_eq!(session.blocks_locked(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gravity_moves_block_down() {
        let mut handle = spawn_session(
            Session::new(SessionConfig::default()),
            RuntimeOptions::default(),
        );
        send(&handle, 1, GameAction::Start).await;
        next_ack(&mut handle).await;

        let before = observe(&mut handle, 2).await;
        let y0 = before.active.unwrap().position.y;
        let interval = before.drop_interval_ms as u64;

        tokio::time::sleep(Duration::from_millis(interval * 3 + interval / 2)).await;
        let after = observe(&mut handle, 3).await;
        assert_eq!(after.active.unwrap().position.y, y0 - 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_session_does_not_fall() {
        let mut handle = spawn_session(
            Session::new(SessionConfig::default()),
            RuntimeOptions::default(),
        );
        let before = observe(&mut handle, 1).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let after = observe(&mut handle, 2).await;
        assert_eq!(before.active, after.active);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_commits_after_delay() {
        let mut grid = Grid::new();
        for x in 0..10 {
            if x != 3 {
                grid.set(x, 0, 3, 1);
            }
        }
        let config = SessionConfig {
            layer_limits: LayerLimits::disabled(),
            clear_delay_ms: 300,
            ..SessionConfig::default()
        };
        let session = Session::from_parts(
            config,
            grid,
            pattern(PatternKind::Single),
            pattern(PatternKind::O),
        );
        let mut handle = spawn_session(session, RuntimeOptions::default());

        send(&handle, 1, GameAction::Start).await;
        next_ack(&mut handle).await;
        send(&handle, 2, GameAction::HardDrop).await;
        assert_eq!(next_ack(&mut handle).await, (2, Ok(())));

        let held = observe(&mut handle, 3).await;
        assert_eq!(held.pending_lines, 1);
        assert!(!held.controls_enabled);

        send(&handle, 4, GameAction::MoveLeft).await;
        assert_eq!(
            next_ack(&mut handle).await,
            (4, Err(ActionError::ClearPending))
        );

        tokio::time::sleep(Duration::from_millis(350)).await;
        let cleared = observe(&mut handle, 5).await;
        assert_eq!(cleared.pending_lines, 0);
        assert_eq!(cleared.lines, 1);
        assert_eq!(cleared.layer_counts[0], 0);
        assert!(cleared.controls_enabled);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_events_are_forwarded() {
        let mut grid = Grid::new();
        for x in 0..10 {
            if x != 3 {
                grid.set(x, 0, 3, 1);
            }
        }
        let config = SessionConfig {
            layer_limits: LayerLimits::disabled(),
            clear_delay_ms: 0,
            ..SessionConfig::default()
        };
        let session = Session::from_parts(
            config,
            grid,
            pattern(PatternKind::Single),
            pattern(PatternKind::O),
        );
        let mut handle = spawn_session(session, RuntimeOptions::default());
        send(&handle, 1, GameAction::Start).await;
        send(&handle, 2, GameAction::HardDrop).await;

        let mut events = Vec::new();
        while events.len() < 2 {
            if let RuntimeOutput::Event(event) = handle.output.recv().await.unwrap() {
                events.push(event);
            }
        }
        assert_eq!(events[0], SessionEvent::LinesHighlighted { count: 1 });
        assert_eq!(
            events[1],
            SessionEvent::LinesCleared {
                count: 1,
                points: 11
            }
        );

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_streamed_observations() {
        let options = RuntimeOptions {
            stream_observations: true,
            ..RuntimeOptions::default()
        };
        let mut handle = spawn_session(Session::new(SessionConfig::default()), options);
        send(&handle, 1, GameAction::Start).await;

        let mut saw_ack = false;
        loop {
            match handle.output.recv().await.unwrap() {
                RuntimeOutput::Ack { seq: 1, .. } => saw_ack = true,
                RuntimeOutput::Observation { seq: None, snapshot } => {
                    assert!(saw_ack);
                    assert_eq!(snapshot.phase, SessionPhase::Running);
                    break;
                }
                _ => {}
            }
        }

        handle.shutdown().await;
    }
}

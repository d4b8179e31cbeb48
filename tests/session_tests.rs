//! Session tests - spawn, fall, lock, clear and game-over through the public API

use block_busters::core::{pattern, ActionError, Grid, LayerLimits, Session, SessionConfig};
use block_busters::types::{
    Axis, Direction, GameAction, GameOverReason, PatternKind, SessionEvent, SessionPhase,
    SPAWN_POSITION,
};

fn session_with(grid: Grid, current: PatternKind, next: PatternKind) -> Session {
    Session::from_parts(
        SessionConfig::default(),
        grid,
        pattern(current),
        pattern(next),
    )
}

// ============== Lifecycle Tests ==============

#[test]
fn test_reset_spawn_fall_lock_cycle() {
    let mut session = Session::new(SessionConfig::default());
    session.reset();
    assert_eq!(session.phase(), SessionPhase::Paused);
    assert!(session.start());

    let first = session.active().unwrap();
    assert_eq!(first.position, SPAWN_POSITION);
    let upcoming = session.next();

    // Flat blocks fall from the top layer to the floor in nine steps
    for step in 0..9 {
        assert!(session.move_block(Direction::Down), "step {}", step);
    }
    assert_eq!(session.active().unwrap().position.y, 0);
    assert_eq!(session.blocks_locked(), 0);

    // The tenth step is blocked and locks the block
    assert!(!session.move_block(Direction::Down));
    assert_eq!(session.blocks_locked(), 1);
    assert_eq!(
        session.grid().layer_count(0) as usize,
        first.shape.cell_count()
    );

    let current = session.active().unwrap();
    assert_eq!(current.kind, upcoming.kind);
    assert_eq!(current.position, SPAWN_POSITION);
    assert_eq!(session.phase(), SessionPhase::Running);
}

#[test]
fn test_commands_ignored_while_paused() {
    let mut session = session_with(Grid::new(), PatternKind::T, PatternKind::O);
    assert!(!session.move_block(Direction::Left));
    assert_eq!(session.rotate(Axis::X), None);
    assert_eq!(session.hard_drop(), None);
    assert!(!session.tick(5_000));
    assert_eq!(
        session.try_action(GameAction::MoveLeft),
        Err(ActionError::NotRunning)
    );
    assert_eq!(session.active().unwrap().position, SPAWN_POSITION);
}

#[test]
fn test_pause_and_resume_gravity() {
    let mut session = session_with(Grid::new(), PatternKind::T, PatternKind::O);
    session.start();
    let interval = session.drop_interval_ms();

    assert!(session.tick(interval));
    assert_eq!(session.active().unwrap().position.y, 8);

    assert!(session.pause());
    assert!(!session.tick(interval * 4));
    assert_eq!(session.active().unwrap().position.y, 8);

    assert!(session.resume());
    assert!(!session.tick(interval - 1));
    assert!(session.tick(1));
    assert_eq!(session.active().unwrap().position.y, 7);
}

#[test]
fn test_reset_continues_episode() {
    let mut session = Session::new(SessionConfig::default());
    session.start();
    session.hard_drop();
    assert_eq!(session.blocks_locked(), 1);

    session.reset();
    assert_eq!(session.episode_id(), 1);
    assert_eq!(session.blocks_locked(), 0);
    assert_eq!(session.score(), 0);
    assert_eq!(session.level(), 1);
    assert_eq!(session.grid().occupied_count(), 0);
    assert!(session.paused());
}

#[test]
fn test_same_seed_same_blocks() {
    let mut a = Session::new(SessionConfig {
        seed: 99,
        ..SessionConfig::default()
    });
    let mut b = Session::new(SessionConfig {
        seed: 99,
        ..SessionConfig::default()
    });
    for _ in 0..5 {
        assert_eq!(a.active().map(|x| x.kind), b.active().map(|x| x.kind));
        assert_eq!(a.next().kind, b.next().kind);
        a.reset();
        b.reset();
    }
}

// ============== Movement Tests ==============

#[test]
fn test_walls_block_horizontal_moves() {
    let mut session = session_with(Grid::new(), PatternKind::O, PatternKind::O);
    session.start();

    let mut moves = 0;
    while session.move_block(Direction::Left) {
        moves += 1;
    }
    assert_eq!(moves, 3);
    assert_eq!(session.active().unwrap().position.x, 0);
    assert_eq!(
        session.try_action(GameAction::MoveLeft),
        Err(ActionError::Blocked)
    );
    // A blocked sideways move never locks
    assert_eq!(session.blocks_locked(), 0);
}

#[test]
fn test_rotation_blocked_emits_event() {
    // Fill the spawn layer except the cells of the bar itself
    let mut grid = Grid::new();
    for x in 0..10 {
        for z in 0..10 {
            let bar = z == 3 && (3..7).contains(&x);
            if !bar {
                grid.set(x, 9, z, 1);
            }
        }
    }
    let mut session = session_with(grid, PatternKind::I, PatternKind::O);
    session.start();
    session.take_events();

    assert_eq!(session.rotate(Axis::X), None);
    assert_eq!(session.take_events(), vec![SessionEvent::RotationBlocked]);
    assert_eq!(
        session.try_action(GameAction::RotateZ),
        Err(ActionError::Blocked)
    );
    let active = session.active().unwrap();
    assert_eq!(active.position, SPAWN_POSITION);
    assert_eq!((active.shape.rows(), active.shape.cols()), (1, 4));
}

#[test]
fn test_rotation_kicks_off_wall() {
    let mut session = session_with(Grid::new(), PatternKind::I, PatternKind::O);
    session.start();
    // At z = 7 the upright bar would reach z = 10; one step forward fits it
    for _ in 0..4 {
        assert!(session.move_block(Direction::Backward));
    }
    assert_eq!(session.active().unwrap().position.z, 7);

    assert_eq!(session.rotate(Axis::X), Some((0, -1)));
    let active = session.active().unwrap();
    assert_eq!((active.shape.rows(), active.shape.cols()), (4, 1));
    assert_eq!(active.position.z, 6);
    assert!(active.is_valid(session.grid()));
}

// ============== Clear and Level Tests ==============

fn two_gapped_rows() -> Grid {
    let mut grid = Grid::new();
    for z in 0..2 {
        for x in 0..10 {
            if x != 3 && x != 4 {
                grid.set(x, 0, z, 2);
            }
        }
    }
    grid
}

#[test]
fn test_double_clear_levels_up() {
    let mut session = session_with(two_gapped_rows(), PatternKind::O, PatternKind::Single);
    session.start();
    for _ in 0..3 {
        assert!(session.move_block(Direction::Forward));
    }
    assert_eq!(session.hard_drop(), Some(9));

    // Scored and promoted at lock; the grid waits for the commit
    assert_eq!(session.lines(), 2);
    assert_eq!(session.level(), 2);
    assert_eq!(session.score(), 22 + 200);
    assert_eq!(session.pending_clear().map(|l| l.len()), Some(2));
    assert!(!session.controls_enabled());
    assert_eq!(
        session.take_events(),
        vec![
            SessionEvent::LinesHighlighted { count: 2 },
            SessionEvent::LevelUp {
                level: 2,
                bonus: 200
            },
        ]
    );
    assert_eq!(
        session.try_action(GameAction::MoveLeft),
        Err(ActionError::ClearPending)
    );

    assert!(session.commit_clear());
    assert_eq!(
        session.take_events(),
        vec![SessionEvent::LinesCleared {
            count: 2,
            points: 22
        }]
    );
    assert_eq!(session.grid().occupied_count(), 0);
    assert_eq!(session.active().unwrap().kind, PatternKind::Single);
    assert!(session.controls_enabled());
    assert_eq!(session.drop_interval_ms(), 990);
    assert!(!session.commit_clear());
}

#[test]
fn test_single_clear_does_not_level_up() {
    let mut grid = Grid::new();
    for x in 0..10 {
        if x != 3 {
            grid.set(x, 0, 3, 1);
        }
    }
    let mut session = session_with(grid, PatternKind::Single, PatternKind::O);
    session.start();
    session.hard_drop();
    session.commit_clear();

    assert_eq!(session.lines(), 1);
    assert_eq!(session.level(), 1);
    assert_eq!(session.score(), 11);
}

#[test]
fn test_clear_commits_on_tick_after_delay() {
    let mut grid = Grid::new();
    for x in 0..10 {
        if x != 3 {
            grid.set(x, 0, 3, 1);
        }
    }
    let mut session = session_with(grid, PatternKind::Single, PatternKind::O);
    session.start();
    session.hard_drop();

    assert!(!session.tick(100));
    assert!(session.pending_clear().is_some());
    assert!(session.tick(200));
    assert!(session.pending_clear().is_none());
    assert_eq!(session.grid().occupied_count(), 0);
}

#[test]
fn test_zero_delay_commits_at_lock() {
    let mut grid = Grid::new();
    for x in 0..10 {
        if x != 3 {
            grid.set(x, 0, 3, 1);
        }
    }
    let config = SessionConfig {
        clear_delay_ms: 0,
        ..SessionConfig::default()
    };
    let mut session =
        Session::from_parts(config, grid, pattern(PatternKind::Single), pattern(PatternKind::O));
    session.start();
    session.hard_drop();

    assert!(session.pending_clear().is_none());
    assert!(session.controls_enabled());
    assert_eq!(
        session.take_events(),
        vec![
            SessionEvent::LinesHighlighted { count: 1 },
            SessionEvent::LinesCleared {
                count: 1,
                points: 11
            },
        ]
    );
}

/// Row z = 3 and z-line x = 3 on the floor, both missing only (3, 0, 3), with loose
/// cells stacked above the cleared lines
fn crossing_lines_grid() -> Grid {
    let mut grid = Grid::new();
    for i in 0..10 {
        if i != 3 {
            grid.set(i, 0, 3, 1);
            grid.set(3, 0, i, 2);
        }
    }
    grid.set(5, 1, 3, 3);
    grid.set(5, 2, 3, 4);
    grid.set(3, 1, 7, 5);
    grid
}

fn lock_crossing_lines(clear_delay_ms: u32) -> Session {
    let config = SessionConfig {
        clear_delay_ms,
        ..SessionConfig::default()
    };
    let mut session = Session::from_parts(
        config,
        crossing_lines_grid(),
        pattern(PatternKind::Single),
        pattern(PatternKind::O),
    );
    session.start();
    assert_eq!(session.hard_drop(), Some(9));
    session
}

#[test]
fn test_deferred_clear_matches_immediate_clear() {
    let immediate = lock_crossing_lines(0);
    assert!(immediate.pending_clear().is_none());

    let mut ticked = lock_crossing_lines(300);
    assert_eq!(ticked.pending_clear().map(<[_]>::len), Some(2));
    assert!(!ticked.tick(299));
    assert!(ticked.tick(1));

    let mut committed = lock_crossing_lines(300);
    assert!(committed.commit_clear());

    for deferred in [&ticked, &committed] {
        assert!(deferred.pending_clear().is_none());
        assert_eq!(deferred.grid(), immediate.grid());
        assert_eq!(deferred.score(), immediate.score());
        assert_eq!(deferred.level(), immediate.level());
        assert_eq!(deferred.lines(), immediate.lines());
        assert_eq!(deferred.active(), immediate.active());
        assert_eq!(deferred.next(), immediate.next());
    }

    // Both lines scored at level 1, then the level-up bonus
    assert_eq!(immediate.lines(), 2);
    assert_eq!(immediate.level(), 2);
    assert_eq!(immediate.score(), 222);
    // The stacked cells settled onto the floor
    assert_eq!(immediate.grid().get(5, 0, 3), Some(3));
    assert_eq!(immediate.grid().get(5, 1, 3), Some(4));
    assert_eq!(immediate.grid().get(3, 0, 7), Some(5));
    assert_eq!(immediate.grid().occupied_count(), 3);
}

// ============== Game Over Tests ==============

#[test]
fn test_layer_two_overflow_ends_game() {
    let mut grid = Grid::new();
    for x in 0..9 {
        grid.set(x, 2, 9, 3);
    }
    let mut session = session_with(grid, PatternKind::Single, PatternKind::O);
    session.start();
    assert_eq!(session.hard_drop(), Some(9));

    let reason = GameOverReason::LayerOverflow {
        layer: 2,
        count: 9,
        limit: 5,
    };
    assert!(session.game_over());
    assert_eq!(session.game_over_reason(), Some(reason));
    assert_eq!(
        session.take_events().last(),
        Some(&SessionEvent::GameOver {
            reason,
            score: 0,
            level: 1
        })
    );

    assert_eq!(
        session.try_action(GameAction::MoveLeft),
        Err(ActionError::GameOver)
    );
    assert_eq!(
        session.try_action(GameAction::Start),
        Err(ActionError::GameOver)
    );
    assert!(!session.tick(10_000));

    assert_eq!(session.try_action(GameAction::Reset), Ok(()));
    assert!(session.paused());
    assert_eq!(session.game_over_reason(), None);
}

#[test]
fn test_spawn_blocked_ends_game() {
    let mut grid = Grid::new();
    grid.set(4, 9, 3, 1);
    let config = SessionConfig {
        layer_limits: LayerLimits::disabled(),
        ..SessionConfig::default()
    };
    let mut session =
        Session::from_parts(config, grid, pattern(PatternKind::Single), pattern(PatternKind::O));
    session.start();
    assert_eq!(session.hard_drop(), Some(9));

    assert!(session.game_over());
    assert_eq!(session.game_over_reason(), Some(GameOverReason::SpawnBlocked));
    assert!(!session.controls_enabled());
}

// ============== Snapshot Tests ==============

#[test]
fn test_snapshot_reflects_session() {
    let mut session = session_with(Grid::new(), PatternKind::T, PatternKind::O);
    session.start();
    let snap = session.snapshot();

    assert!(snap.playable());
    assert_eq!(snap.phase, SessionPhase::Running);
    assert_eq!(snap.drop_distance, Some(9));
    assert_eq!(snap.next.kind, PatternKind::O);
    assert_eq!(snap.active.unwrap().position, SPAWN_POSITION);
    assert_eq!(snap.layer_counts, [0; 10]);

    session.hard_drop();
    let snap = session.snapshot();
    assert_eq!(snap.layer_counts[0], 4);
    assert_eq!(snap.cell(4, 0, 3), 2);
    assert_eq!(snap.blocks_locked, 1);
}

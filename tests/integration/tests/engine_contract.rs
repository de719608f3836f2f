//! Engine call contract tests
//!
//! A mockall engine verifies what the player asks of the engine across a
//! session, and that the engine is released exactly once.

use anyhow::Result;
use lockstep_player::bridge::{LoggingDisplay, PlayerPlugin, ResultBridge, SessionOutcome};
use lockstep_player::engine::{EngineEvent, EngineState, SizeConstraint, StreamKind, VideoSize};
use lockstep_player::player::{ManualScheduler, PlayerEvent, PlayerHost, TimerKind, UserCommand};
use lockstep_player::utils::Config;
use lockstep_player::{LaunchRequest, PlayerError};
use lockstep_player_integration_tests::{single_engine_factory, MockEngine};
use mockall::predicate::eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Mock engine that plays along with a basic session
fn playing_engine(position_ms: u64) -> MockEngine {
    let mut engine = MockEngine::new();
    engine
        .expect_set_track_size_constraints()
        .with(eq(SizeConstraint::AtMost(VideoSize { width: 848, height: 480 })))
        .times(1)
        .return_const(());
    engine
        .expect_prepare()
        .withf(|source| source.kind == StreamKind::Hls && source.http.connect_timeout == Duration::from_secs(15))
        .times(1)
        .returning(|_| Ok(()));
    engine.expect_play().times(1).return_const(());
    engine.expect_is_playing().return_const(true);
    engine.expect_current_position().return_const(position_ms);
    engine.expect_duration().return_const(Some(600_000u64));
    engine.expect_buffered_percentage().return_const(20u8);
    engine.expect_current_tracks().returning(Vec::new);
    engine
}

#[test]
fn test_engine_released_once_on_repeated_close() -> Result<()> {
    let mut engine = playing_engine(42_000);
    engine.expect_release().times(1).return_const(());

    let (tx, rx) = mpsc::unbounded_channel();
    let (scheduler, timers) = ManualScheduler::new();
    let (bridge, mut pending) = ResultBridge::channel();
    let (mut host, handle) = PlayerHost::with_scheduler(
        Config::default(),
        LaunchRequest::new("https://cdn.example/live/master.m3u8"),
        bridge.clone(),
        Arc::new(single_engine_factory(engine)),
        Box::new(LoggingDisplay::new()),
        Box::new(scheduler),
        tx,
        rx,
    );

    host.start()?;
    handle.send(UserCommand::Close)?;
    handle.send(UserCommand::Close)?;
    handle.send(UserCommand::SystemBack)?;
    host.pump();
    drop(host);

    assert_eq!(bridge.resolve_attempts(), 1);
    assert!(!timers.is_armed(TimerKind::Progress));
    assert_eq!(
        pending.try_outcome().map(|o| o.to_json()),
        Some(json!({ "position": 42_000, "duration": 600_000, "completed": false }))
    );
    Ok(())
}

#[test]
fn test_start_position_seeks_before_play() -> Result<()> {
    let mut engine = MockEngine::new();
    let mut seq = mockall::Sequence::new();

    engine
        .expect_set_track_size_constraints()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    engine
        .expect_prepare()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    engine
        .expect_seek_to()
        .with(eq(90_000u64))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    engine.expect_play().times(1).in_sequence(&mut seq).return_const(());
    engine.expect_is_playing().return_const(true);
    engine.expect_current_position().return_const(90_000u64);
    engine.expect_duration().return_const(Some(600_000u64));
    engine.expect_release().times(1).return_const(());

    let (tx, rx) = mpsc::unbounded_channel();
    let (scheduler, _timers) = ManualScheduler::new();
    let (bridge, mut pending) = ResultBridge::channel();
    let (mut host, _handle) = PlayerHost::with_scheduler(
        Config::default(),
        LaunchRequest::new("https://cdn.example/movie.mp4").with_start_position(90_000),
        bridge,
        Arc::new(single_engine_factory(engine)),
        Box::new(LoggingDisplay::new()),
        Box::new(scheduler),
        tx,
        rx,
    );

    host.start()?;
    drop(host);
    assert_eq!(pending.try_outcome().map(|o| o.position_ms()), Some(90_000));
    Ok(())
}

#[test]
fn test_rejected_launch_creates_nothing() {
    let engine = MockEngine::new();
    let factory = Arc::new(single_engine_factory(engine));
    let (context, mut handles) =
        lockstep_player::bridge::TokioLaunchContext::new(Config::default(), factory);
    let plugin = PlayerPlugin::new(Arc::new(context));

    let err = plugin.play_json(json!({ "title": "No source" })).unwrap_err();
    assert!(matches!(err, PlayerError::InvalidArgument(_)));
    assert!(handles.try_recv().is_err());
}

#[test]
fn test_engine_error_ends_session() -> Result<()> {
    let mut engine = playing_engine(12_000);
    engine.expect_release().times(1).return_const(());

    let (tx, rx) = mpsc::unbounded_channel();
    let (scheduler, _timers) = ManualScheduler::new();
    let (bridge, mut pending) = ResultBridge::channel();
    let (mut host, handle) = PlayerHost::with_scheduler(
        Config::default(),
        LaunchRequest::new("https://cdn.example/live/master.m3u8"),
        bridge,
        Arc::new(single_engine_factory(engine)),
        Box::new(LoggingDisplay::new()),
        Box::new(scheduler),
        tx.clone(),
        rx,
    );

    host.start()?;
    tx.send(PlayerEvent::Engine(EngineEvent::StateChanged(EngineState::Ready)))?;
    tx.send(PlayerEvent::Engine(EngineEvent::Error("Source error".to_string())))?;
    tx.send(PlayerEvent::Engine(EngineEvent::StateChanged(EngineState::Ended)))?;
    host.pump();

    assert!(host.controller().is_terminated());
    assert!(handle.ui().terminated);
    assert!(matches!(
        pending.try_outcome(),
        Some(SessionOutcome::Finished(result)) if !result.completed && result.position_ms == 12_000
    ));
    Ok(())
}

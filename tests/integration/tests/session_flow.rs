//! End-to-end session tests on the simulated engine
//!
//! These tests run on a paused tokio clock, so every timer and the media
//! clock advance deterministically.

use anyhow::Result;
use lockstep_player::bridge::{SessionOutcome, SessionResult};
use lockstep_player::controls::Panel;
use lockstep_player::engine::SimulatedMedia;
use lockstep_player::player::{HostEvent, PlaybackState, UserCommand};
use lockstep_player::utils::Config;
use lockstep_player_integration_tests::{media, settle, simulated_plugin};
use serde_json::json;
use serial_test::serial;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_plays_to_completion() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(30_000));
    let pending = plugin.play_json(json!({
        "url": "https://cdn.example/ep1.m3u8",
        "title": "Pilot",
        "subtitle": "Season 1"
    }))?;
    let handle = handles.recv().await.expect("session handle");

    settle().await;
    let ui = handle.ui();
    assert_eq!(ui.title, "Pilot");
    assert_eq!(ui.subtitle.as_deref(), Some("Season 1"));
    assert_eq!(ui.playback, PlaybackState::Playing);
    assert_eq!(ui.renditions.len(), 4);

    let outcome = pending.outcome().await?;
    assert_eq!(
        outcome,
        SessionOutcome::Finished(SessionResult {
            position_ms: 30_000,
            duration_ms: 30_000,
            completed: true,
        })
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_start_position_and_seek_forward() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(120_000));
    let pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4", "startPosition": 90_000 }))?;
    let handle = handles.recv().await.expect("session handle");

    sleep(Duration::from_millis(5_000)).await;
    handle.send(UserCommand::SeekForward)?;
    sleep(Duration::from_millis(1_000)).await;
    handle.send(UserCommand::Close)?;

    let outcome = pending.outcome().await?;
    let position = outcome.position_ms();
    assert!((105_000..=107_000).contains(&position), "position {}", position);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_controls_auto_hide_only_while_playing() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(120_000));
    let _pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4" }))?;
    let handle = handles.recv().await.expect("session handle");

    settle().await;
    assert!(handle.ui().visibility.overlay_visible);

    sleep(Duration::from_millis(4_100)).await;
    assert!(!handle.ui().visibility.overlay_visible);

    handle.send(UserCommand::SurfaceTap)?;
    handle.send(UserCommand::TogglePlayPause)?;
    settle().await;
    assert_eq!(handle.ui().playback, PlaybackState::Paused);

    sleep(Duration::from_millis(10_000)).await;
    assert!(handle.ui().visibility.overlay_visible);

    handle.send(UserCommand::TogglePlayPause)?;
    sleep(Duration::from_millis(4_100)).await;
    assert_eq!(handle.ui().playback, PlaybackState::Playing);
    assert!(!handle.ui().visibility.overlay_visible);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_open_panel_keeps_controls_visible() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(120_000));
    let _pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4" }))?;
    let handle = handles.recv().await.expect("session handle");

    handle.send(UserCommand::OpenQuality)?;
    sleep(Duration::from_millis(10_000)).await;
    let ui = handle.ui();
    assert!(ui.visibility.overlay_visible);
    assert_eq!(ui.visibility.open_panel, Panel::Quality);

    handle.send(UserCommand::SelectQuality("720p".to_string()))?;
    settle().await;
    assert_eq!(handle.ui().visibility.open_panel, Panel::None);
    assert!(handle.ui().renditions.iter().any(|e| e.selected && e.label == "720p"));

    sleep(Duration::from_millis(4_100)).await;
    assert!(!handle.ui().visibility.overlay_visible);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lock_blocks_seeking_but_not_back() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(120_000));
    let pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4" }))?;
    let handle = handles.recv().await.expect("session handle");

    handle.send(UserCommand::ToggleLock)?;
    handle.send(UserCommand::SurfaceDoubleTap { x: 1800.0, surface_width: 1920.0 })?;
    handle.send(UserCommand::SeekForward)?;
    handle.send(UserCommand::ShowRelatedContent)?;
    settle().await;

    let ui = handle.ui();
    assert!(ui.locked);
    assert!(!ui.controls.seek_buttons);
    assert!(ui.controls.lock);
    assert!(handle.progress().position_ms < 1_000);

    sleep(Duration::from_millis(2_000)).await;
    handle.send(UserCommand::SystemBack)?;

    let outcome = pending.outcome().await?;
    assert!(matches!(outcome, SessionOutcome::Finished(SessionResult { completed: false, .. })));
    assert!(outcome.position_ms() < 3_000);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_show_episodes_signal() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(120_000));
    let pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4" }))?;
    let handle = handles.recv().await.expect("session handle");

    sleep(Duration::from_millis(8_000)).await;
    handle.send(UserCommand::ShowRelatedContent)?;
    handle.send(UserCommand::Close)?;

    let outcome = pending.outcome().await?;
    assert_eq!(outcome.to_json()["action"], "SHOW_EPISODES");
    assert_eq!(outcome.to_json()["position"], 8_000);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_engine_failure_reports_incomplete() -> Result<()> {
    let failing = SimulatedMedia {
        duration_ms: 60_000,
        fail_at_ms: Some(3_000),
        ..Default::default()
    };
    let (plugin, _handles) = simulated_plugin(Config::default(), failing);
    let pending = plugin.play_json(json!({ "url": "https://cdn.example/broken.mpd" }))?;

    let outcome = pending.outcome().await?;
    assert_eq!(
        outcome.to_json(),
        json!({ "position": 3_000, "duration": 60_000, "completed": false })
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_host_destroyed_terminates() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(120_000));
    let pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4" }))?;
    let handle = handles.recv().await.expect("session handle");

    sleep(Duration::from_millis(1_500)).await;
    handle.host_event(HostEvent::Backgrounded)?;
    settle().await;
    assert_eq!(handle.ui().playback, PlaybackState::Paused);

    handle.host_event(HostEvent::Destroyed)?;
    let outcome = pending.outcome().await?;
    assert_eq!(outcome.position_ms(), 1_500);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_progress_cadence() -> Result<()> {
    let (plugin, mut handles) = simulated_plugin(Config::default(), media(120_000));
    let _pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4" }))?;
    let handle = handles.recv().await.expect("session handle");

    sleep(Duration::from_millis(2_500)).await;
    let progress = handle.progress();
    assert!((1_000..=2_500).contains(&progress.position_ms));
    assert_eq!(progress.duration_ms, Some(120_000));
    assert_eq!(progress.duration_label, "2:00");
    Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_auto_hide_delay_from_environment() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[controls]\nauto_hide_ms = 3000\nseek_step_ms = 15000\n")?;

    std::env::set_var("LOCKSTEP_AUTO_HIDE_MS", "1000");
    let config = Config::load_from(&path);
    std::env::remove_var("LOCKSTEP_AUTO_HIDE_MS");
    let config = config?;
    assert_eq!(config.controls.auto_hide_ms, 1_000);
    assert_eq!(config.controls.seek_step_ms, 15_000);

    let (plugin, mut handles) = simulated_plugin(config, media(120_000));
    let _pending = plugin.play_json(json!({ "url": "https://cdn.example/movie.mp4" }))?;
    let handle = handles.recv().await.expect("session handle");

    sleep(Duration::from_millis(1_100)).await;
    assert!(!handle.ui().visibility.overlay_visible);
    Ok(())
}

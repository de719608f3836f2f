//! Integration test utilities for Lockstep Player
//!
//! This module provides common helpers for the integration tests:
//! - A plugin wired to the simulated engine on tokio timers
//! - A mockall engine for verifying engine calls
//! - Helpers for injecting a pre-built engine into a session

use lockstep_player::bridge::{PlayerPlugin, TokioLaunchContext};
use lockstep_player::engine::{
    Engine, EngineListener, SimulatedEngineFactory, SimulatedMedia, SizeConstraint,
    SourceDescriptor, TrackGroup,
};
use lockstep_player::player::PlayerHandle;
use lockstep_player::utils::Config;
use lockstep_player::PlayerError;
use mockall::mock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mock! {
    pub Engine {}

    impl Engine for Engine {
        fn prepare(&mut self, source: &SourceDescriptor) -> lockstep_player::Result<()>;
        fn play(&mut self);
        fn pause(&mut self);
        fn seek_to(&mut self, position_ms: u64);
        fn set_playback_speed(&mut self, speed: f32);
        fn current_position(&self) -> u64;
        fn duration(&self) -> Option<u64>;
        fn buffered_percentage(&self) -> u8;
        fn is_playing(&self) -> bool;
        fn set_track_size_constraints(&mut self, constraint: SizeConstraint);
        fn current_tracks(&self) -> Vec<TrackGroup>;
        fn release(&mut self);
    }
}

/// Plugin backed by the simulated engine, plus the stream of session handles
pub fn simulated_plugin(
    config: Config,
    media: SimulatedMedia,
) -> (PlayerPlugin, mpsc::UnboundedReceiver<PlayerHandle>) {
    let factory = Arc::new(SimulatedEngineFactory::new(media));
    let (context, handles) = TokioLaunchContext::new(config, factory);
    (PlayerPlugin::new(Arc::new(context)), handles)
}

/// Simulated media of the given length with the default renditions
pub fn media(duration_ms: u64) -> SimulatedMedia {
    SimulatedMedia {
        duration_ms,
        ..Default::default()
    }
}

/// Factory handing out one pre-built engine; later calls fail
pub fn single_engine_factory<E>(
    engine: E,
) -> impl Fn(EngineListener) -> lockstep_player::Result<Box<dyn Engine>> + Send + Sync
where
    E: Engine + 'static,
{
    let slot = Mutex::new(Some(engine));
    move |_listener| {
        slot.lock()
            .take()
            .map(|engine| Box::new(engine) as Box<dyn Engine>)
            .ok_or_else(|| PlayerError::Internal("Engine already created".to_string()))
    }
}

/// Let the player task catch up with queued events
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

//! Launch entry point
//!
//! [`PlayerPlugin`] validates launch calls and hands accepted requests to
//! a [`LaunchContext`], which hosts the player and later resolves the
//! pending call through the [`ResultBridge`].

use crate::bridge::{
    ImmersiveDisplay, LaunchParams, LaunchRequest, LoggingDisplay, PendingCall, ResultBridge,
};
use crate::engine::EngineFactory;
use crate::player::{PlayerHandle, PlayerHost};
use crate::utils::config::Config;
use crate::utils::error::{PlayerError, Result};
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Something able to host a player session
pub trait LaunchContext: Send + Sync {
    /// Start a player for `request`; the session resolves `bridge` when it ends
    fn start_player(&self, request: LaunchRequest, bridge: ResultBridge) -> Result<()>;
}

/// Caller-facing launch API
#[derive(Clone, Default)]
pub struct PlayerPlugin {
    context: Option<Arc<dyn LaunchContext>>,
}

impl PlayerPlugin {
    pub fn new(context: Arc<dyn LaunchContext>) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// Plugin with no hosting context attached
    pub fn detached() -> Self {
        Self { context: None }
    }

    /// Validate and launch. Rejections happen before any session exists.
    pub fn play(&self, params: LaunchParams) -> Result<PendingCall> {
        let request = LaunchRequest::try_from(params)?;

        let context = self
            .context
            .as_ref()
            .ok_or_else(|| PlayerError::ContextUnavailable("Activity not available".to_string()))?;

        info!("Launching player for {}", request.source_url);
        let (bridge, pending) = ResultBridge::channel();
        context.start_player(request, bridge)?;
        Ok(pending)
    }

    /// Launch from raw JSON call parameters
    pub fn play_json(&self, params: Value) -> Result<PendingCall> {
        let params: LaunchParams = serde_json::from_value(params)
            .map_err(|e| PlayerError::InvalidArgument(format!("Malformed launch parameters: {}", e)))?;
        self.play(params)
    }
}

type DisplayFactory = dyn Fn() -> Box<dyn ImmersiveDisplay> + Send + Sync;

/// Hosts each session on its own tokio task
pub struct TokioLaunchContext {
    config: Config,
    factory: Arc<dyn EngineFactory>,
    display: Arc<DisplayFactory>,
    handles: mpsc::UnboundedSender<PlayerHandle>,
}

impl TokioLaunchContext {
    /// Returns the context and a stream of handles, one per launched session
    pub fn new(
        config: Config,
        factory: Arc<dyn EngineFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<PlayerHandle>) {
        let (handles, rx) = mpsc::unbounded_channel();
        (
            Self {
                config,
                factory,
                display: Arc::new(|| Box::new(LoggingDisplay::new()) as Box<dyn ImmersiveDisplay>),
                handles,
            },
            rx,
        )
    }

    /// Use a different immersive display for new sessions
    pub fn with_display<F>(mut self, display: F) -> Self
    where
        F: Fn() -> Box<dyn ImmersiveDisplay> + Send + Sync + 'static,
    {
        self.display = Arc::new(display);
        self
    }
}

impl LaunchContext for TokioLaunchContext {
    fn start_player(&self, request: LaunchRequest, bridge: ResultBridge) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            PlayerError::ContextUnavailable(format!("No runtime to host the player: {}", e))
        })?;

        let (host, handle) = PlayerHost::launch(
            self.config.clone(),
            request,
            bridge,
            Arc::clone(&self.factory),
            (self.display)(),
        );

        if self.handles.send(handle).is_err() {
            warn!("Nobody is listening for player handles");
        }
        runtime.spawn(host.run());
        Ok(())
    }
}

/// Read launch call parameters from a JSON file
pub fn read_launch_params(path: &std::path::Path) -> Result<LaunchParams> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| PlayerError::InvalidArgument(format!("Malformed launch parameters: {}", e)))
}

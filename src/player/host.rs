//! Player host
//!
//! Drives a [`PlayerController`] from its event queue on a single task and
//! hands out a [`PlayerHandle`] for feeding input and watching state.

use crate::bridge::{ImmersiveDisplay, LaunchRequest, ResultBridge};
use crate::engine::{EngineFactory, EngineListener};
use crate::player::controller::PlayerController;
use crate::player::scheduler::{Scheduler, TokioScheduler};
use crate::player::{HostEvent, PlayerEvent, ProgressSnapshot, UiState, UserCommand};
use crate::utils::config::Config;
use crate::utils::error::{PlayerError, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Owns the controller and its event queue for one session
pub struct PlayerHost {
    controller: PlayerController,
    events: mpsc::UnboundedReceiver<PlayerEvent>,
    display: Box<dyn ImmersiveDisplay>,
    factory: Arc<dyn EngineFactory>,
}

/// Input side and state subscriptions of a running player
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<PlayerEvent>,
    ui: watch::Receiver<UiState>,
    progress: watch::Receiver<ProgressSnapshot>,
}

impl PlayerHost {
    /// Build a host backed by tokio timers
    pub fn launch(
        config: Config,
        request: LaunchRequest,
        bridge: ResultBridge,
        factory: Arc<dyn EngineFactory>,
        display: Box<dyn ImmersiveDisplay>,
    ) -> (PlayerHost, PlayerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(tx.clone());
        Self::with_scheduler(config, request, bridge, factory, display, Box::new(scheduler), tx, rx)
    }

    /// Build a host with an explicit scheduler and queue
    #[allow(clippy::too_many_arguments)]
    pub fn with_scheduler(
        config: Config,
        request: LaunchRequest,
        bridge: ResultBridge,
        factory: Arc<dyn EngineFactory>,
        display: Box<dyn ImmersiveDisplay>,
        scheduler: Box<dyn Scheduler>,
        tx: mpsc::UnboundedSender<PlayerEvent>,
        rx: mpsc::UnboundedReceiver<PlayerEvent>,
    ) -> (PlayerHost, PlayerHandle) {
        let listener = EngineListener::new(tx.clone());
        let controller = PlayerController::new(config, request, bridge, listener, scheduler);

        let handle = PlayerHandle {
            tx,
            ui: controller.subscribe_ui(),
            progress: controller.subscribe_progress(),
        };

        (
            PlayerHost {
                controller,
                events: rx,
                display,
                factory,
            },
            handle,
        )
    }

    /// Run the session to completion
    pub async fn run(mut self) {
        if let Err(e) = self.display.enter_immersive() {
            warn!("Failed to enter immersive mode: {}", e);
        }

        if self.controller.start(self.factory.as_ref()).is_ok() {
            info!("Player session running");
            while !self.controller.is_terminated() {
                let event = match self.events.recv().await {
                    Some(event) => event,
                    None => {
                        debug!("Event queue closed, tearing down");
                        PlayerEvent::Host(HostEvent::Destroyed)
                    }
                };
                self.controller.handle(event);
            }
        }

        if let Err(e) = self.display.exit_immersive() {
            warn!("Failed to leave immersive mode: {}", e);
        }
        info!("Player session finished");
    }

    /// Start the session without a runtime loop; events are fed via [`pump`](Self::pump)
    pub fn start(&mut self) -> Result<()> {
        self.controller.start(self.factory.as_ref())
    }

    /// Handle every event already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while !self.controller.is_terminated() {
            match self.events.try_recv() {
                Ok(event) => {
                    self.controller.handle(event);
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        handled
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }
}

impl PlayerHandle {
    /// Queue a user command
    pub fn send(&self, command: UserCommand) -> Result<()> {
        self.post(PlayerEvent::User(command))
    }

    /// Queue a host lifecycle notification
    pub fn host_event(&self, event: HostEvent) -> Result<()> {
        self.post(PlayerEvent::Host(event))
    }

    fn post(&self, event: PlayerEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| PlayerError::Internal("Player session is gone".to_string()))
    }

    /// Latest UI snapshot
    pub fn ui(&self) -> UiState {
        self.ui.borrow().clone()
    }

    /// Latest progress reading
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.borrow().clone()
    }

    /// Watch UI snapshots
    pub fn ui_updates(&self) -> watch::Receiver<UiState> {
        self.ui.clone()
    }
}

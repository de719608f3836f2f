//! Player controller implementation
//!
//! The PlayerController is the single dispatcher of a player session. It
//! owns the playback session, the control components and the timers, and
//! handles one [`PlayerEvent`] at a time. After every event it publishes a
//! fresh [`UiState`] snapshot.

use crate::bridge::{LaunchRequest, ResultBridge};
use crate::catalog::{RebuildOutcome, RenditionCatalog, SpeedCatalog};
use crate::controls::{
    GestureCommand, GestureRouter, LockController, Panel, TapGesture, TimerDirective,
    VisibilityController,
};
use crate::engine::{EngineEvent, EngineFactory, EngineListener};
use crate::player::scheduler::{Scheduler, TimerHandle};
use crate::player::session::{PlaybackSession, SessionSignal, TerminationReason};
use crate::player::{
    HostEvent, PlayGlyph, PlayerEvent, ProgressSnapshot, ResizeMode, TimerEvent, TimerKind,
    UiState, UserCommand,
};
use crate::utils::config::Config;
use crate::utils::error::Result;
use log::{debug, error, info, warn};
use tokio::sync::watch;

/// Main player controller
pub struct PlayerController {
    config: Config,
    request: LaunchRequest,

    // Core components
    session: PlaybackSession,
    visibility: VisibilityController,
    lock: LockController,
    renditions: RenditionCatalog,
    speeds: SpeedCatalog,
    gestures: GestureRouter,

    // Timers
    scheduler: Box<dyn Scheduler>,
    auto_hide: Option<TimerHandle>,
    progress: Option<TimerHandle>,

    bridge: ResultBridge,
    listener: EngineListener,

    // Presentation state
    loading: bool,
    glyph: PlayGlyph,
    resize_mode: ResizeMode,
    terminated: bool,

    // Published snapshots
    ui_tx: watch::Sender<UiState>,
    progress_tx: watch::Sender<ProgressSnapshot>,
}

impl PlayerController {
    /// Create a controller for `request`. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: Config,
        request: LaunchRequest,
        bridge: ResultBridge,
        listener: EngineListener,
        scheduler: Box<dyn Scheduler>,
    ) -> Self {
        let gestures = GestureRouter::new(config.controls.seek_step_ms);
        let ui_tx = watch::Sender::new(UiState::initial(&request));
        let mut controller = Self {
            config,
            request,
            session: PlaybackSession::new(),
            visibility: VisibilityController::new(),
            lock: LockController::new(),
            renditions: RenditionCatalog::new(),
            speeds: SpeedCatalog::new(),
            gestures,
            scheduler,
            auto_hide: None,
            progress: None,
            bridge,
            listener,
            loading: false,
            glyph: PlayGlyph::Play,
            resize_mode: ResizeMode::Fit,
            terminated: false,
            ui_tx,
            progress_tx: watch::Sender::new(ProgressSnapshot::default()),
        };
        controller.publish();
        controller
    }

    /// Create the engine and begin playback.
    ///
    /// On failure the session is terminated right away, so the caller
    /// still receives a result, and the error is returned for logging.
    pub fn start(&mut self, factory: &dyn EngineFactory) -> Result<()> {
        let started =
            self.session
                .start(&self.request, factory, self.listener.clone(), &self.config);

        if let Err(e) = started {
            error!("Failed to start playback: {}", e);
            self.terminate(TerminationReason::Failed(e.to_string()));
            self.publish();
            return Err(e);
        }

        self.loading = true;
        self.progress = Some(
            self.scheduler
                .schedule_repeating(TimerKind::Progress, self.config.session.progress_interval()),
        );
        let directive = self.visibility.interaction();
        self.apply(directive);
        self.publish();
        Ok(())
    }

    /// Handle one event from the queue
    pub fn handle(&mut self, event: PlayerEvent) {
        if self.terminated {
            debug!("Event after termination ignored: {:?}", event);
            return;
        }

        match event {
            PlayerEvent::Engine(event) => self.on_engine_event(event),
            PlayerEvent::Timer(event) => self.on_timer(event),
            PlayerEvent::User(command) => self.on_command(command),
            PlayerEvent::Host(event) => self.on_host_event(event),
        }

        self.publish();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Current UI snapshot
    pub fn ui_state(&self) -> UiState {
        UiState {
            title: self.request.title.clone(),
            subtitle: Some(self.request.subtitle.clone()).filter(|s| !s.is_empty()),
            playback: self.session.state(),
            loading: self.loading,
            glyph: self.glyph,
            visibility: self.visibility.state(),
            locked: self.lock.is_locked(),
            controls: self.lock.projection(),
            renditions: self.renditions.entries(),
            speeds: self.speeds.entries(),
            resize_mode: self.resize_mode,
            terminated: self.terminated,
        }
    }

    pub fn subscribe_ui(&self) -> watch::Receiver<UiState> {
        self.ui_tx.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    /// Whether an auto-hide timer is currently pending
    pub fn auto_hide_armed(&self) -> bool {
        self.auto_hide.is_some()
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        match self.session.on_engine_event(event) {
            SessionSignal::None => {}
            SessionSignal::Buffering => self.loading = true,
            SessionSignal::Ready { playing } => {
                self.loading = false;
                self.sync_glyph(playing);
                self.refresh_renditions();
                if playing {
                    self.rearm_auto_hide();
                }
            }
            SessionSignal::PlayingChanged(playing) => {
                self.sync_glyph(playing);
                if playing {
                    self.rearm_auto_hide();
                }
            }
            SessionSignal::Finished(reason) => self.terminate(reason),
        }
    }

    fn on_timer(&mut self, event: TimerEvent) {
        match event.kind {
            TimerKind::AutoHide => {
                if !self.auto_hide.as_ref().is_some_and(|h| h.matches(&event)) {
                    debug!("Stale auto-hide firing {} ignored", event.id);
                    return;
                }
                debug!("Auto-hide timer fired");
                self.auto_hide = None;
                self.visibility
                    .timer_fired(self.session.state(), self.lock.is_locked());
            }
            TimerKind::Progress => {
                if !self.progress.as_ref().is_some_and(|h| h.matches(&event)) {
                    return;
                }
                if let Some(snapshot) = self.session.progress() {
                    debug!("Progress: {} / {}", snapshot.position_label, snapshot.duration_label);
                    self.progress_tx.send_replace(snapshot);
                }
            }
        }
    }

    fn on_command(&mut self, command: UserCommand) {
        if !self.lock.permits(&command) {
            debug!("Ignoring {:?} while locked", command);
            return;
        }

        let step = self.config.controls.seek_step_ms as i64;
        match command {
            UserCommand::TogglePlayPause => {
                if let Some(glyph) = self.session.toggle_play_pause() {
                    self.glyph = glyph;
                }
                self.interaction();
            }
            UserCommand::SeekBackward => {
                self.session.seek_relative(-step);
                self.interaction();
            }
            UserCommand::SeekForward => {
                self.session.seek_relative(step);
                self.interaction();
            }
            UserCommand::ScrubStart => {
                let directive = self.visibility.scrub_started();
                self.apply(directive);
            }
            UserCommand::ScrubTo(fraction) => {
                self.session.seek_absolute(fraction);
            }
            UserCommand::ScrubEnd => {
                let directive = self.visibility.scrub_finished();
                self.apply(directive);
            }
            UserCommand::SurfaceTap => self.on_tap(TapGesture::SingleConfirmed),
            UserCommand::SurfaceDoubleTap { x, surface_width } => {
                self.on_tap(TapGesture::Double { x, surface_width })
            }
            UserCommand::ToggleSettings => {
                let directive = self.visibility.toggle_panel(Panel::Settings);
                self.apply(directive);
            }
            UserCommand::OpenQuality => {
                let directive = self.visibility.show_panel(Panel::Quality);
                self.apply(directive);
            }
            UserCommand::OpenSpeed => {
                let directive = self.visibility.show_panel(Panel::Speed);
                self.apply(directive);
            }
            UserCommand::ClosePanel => {
                let directive = self.visibility.close_panel();
                self.apply(directive);
            }
            UserCommand::SelectQuality(label) => match self.renditions.select(&label).cloned() {
                Some(rendition) => {
                    self.session.set_rendition(&rendition);
                    let directive = self.visibility.close_panel();
                    self.apply(directive);
                }
                None => warn!("Unknown rendition: {}", label),
            },
            UserCommand::SelectSpeed(speed) => match self.speeds.select(speed) {
                Some(speed) => {
                    self.session.set_speed(speed);
                    let directive = self.visibility.close_panel();
                    self.apply(directive);
                }
                None => warn!("Unsupported playback speed: {}", speed),
            },
            UserCommand::ToggleLock => {
                self.lock.toggle();
                let directive = self.visibility.close_panel();
                self.apply(directive);
                self.interaction();
            }
            UserCommand::ToggleResizeMode => {
                self.resize_mode = self.resize_mode.toggled();
                info!("Resize mode: {:?}", self.resize_mode);
                self.interaction();
            }
            UserCommand::Close => self.terminate(TerminationReason::Closed),
            UserCommand::SystemBack => {
                if self.visibility.open_panel() != Panel::None {
                    let directive = self.visibility.close_panel();
                    self.apply(directive);
                } else {
                    self.terminate(TerminationReason::Closed);
                }
            }
            UserCommand::ShowRelatedContent => self.terminate(TerminationReason::RelatedContent),
        }
    }

    fn on_tap(&mut self, gesture: TapGesture) {
        match self.gestures.route(gesture, self.lock.is_locked()) {
            GestureCommand::ToggleVisibility => {
                let directive = self.visibility.toggle();
                self.apply(directive);
            }
            GestureCommand::SeekRelative(delta) => {
                self.session.seek_relative(delta);
            }
            GestureCommand::Consumed => debug!("Double tap consumed while locked"),
        }
    }

    fn on_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Backgrounded => {
                info!("Host backgrounded, pausing playback");
                self.session.pause();
                self.glyph = PlayGlyph::Play;
            }
            HostEvent::Destroyed => self.terminate(TerminationReason::Closed),
        }
    }

    fn interaction(&mut self) {
        let directive = self.visibility.interaction();
        self.apply(directive);
    }

    fn apply(&mut self, directive: TimerDirective) {
        match directive {
            TimerDirective::Arm => {
                self.cancel_auto_hide();
                self.auto_hide = Some(
                    self.scheduler
                        .schedule_once(TimerKind::AutoHide, self.config.controls.auto_hide_delay()),
                );
            }
            TimerDirective::Disarm => self.cancel_auto_hide(),
            TimerDirective::Keep => {}
        }
    }

    /// Arm auto-hide on entering Playing if nothing is pending
    fn rearm_auto_hide(&mut self) {
        if self.auto_hide.is_none() && self.visibility.wants_auto_hide() {
            self.apply(TimerDirective::Arm);
        }
    }

    fn cancel_auto_hide(&mut self) {
        if let Some(handle) = self.auto_hide.take() {
            handle.cancel();
        }
    }

    fn sync_glyph(&mut self, playing: bool) {
        self.glyph = if playing { PlayGlyph::Pause } else { PlayGlyph::Play };
    }

    fn refresh_renditions(&mut self) {
        let tracks = self.session.tracks();
        if self.renditions.rebuild(&tracks) == RebuildOutcome::FellBack {
            let auto = self.renditions.selected().clone();
            self.session.set_rendition(&auto);
        }
    }

    /// Single exit point of the session
    fn terminate(&mut self, reason: TerminationReason) {
        self.cancel_auto_hide();
        if let Some(handle) = self.progress.take() {
            handle.cancel();
        }

        if let Some(outcome) = self.session.terminate(reason) {
            self.bridge.resolve(outcome);
        }

        self.terminated = true;
        self.loading = false;
    }

    fn publish(&self) {
        let state = self.ui_state();
        debug_assert!(state.visibility.is_consistent());
        self.ui_tx.send_replace(state);
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        if !self.terminated {
            self.terminate(TerminationReason::Closed);
        }
    }
}

//! Cancellable scheduled tasks
//!
//! Timers post a [`TimerEvent`] onto the player queue instead of running
//! code of their own. Each arming gets a fresh id, so the dispatcher can
//! drop a firing that was already queued when its timer was cancelled.

use crate::player::{PlayerEvent, TimerEvent, TimerKind};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Handle to an armed timer. Cancels the timer when dropped.
pub struct TimerHandle {
    id: u64,
    kind: TimerKind,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(id: u64, kind: TimerKind, cancel: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            id,
            kind,
            cancel: Some(cancel),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether `event` was produced by this arming
    pub fn matches(&self, event: &TimerEvent) -> bool {
        self.kind == event.kind && self.id == event.id
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Source of cancellable timers
pub trait Scheduler: Send {
    /// Fire once after `delay`
    fn schedule_once(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle;

    /// Fire every `period`, first firing one period from now
    fn schedule_repeating(&mut self, kind: TimerKind, period: Duration) -> TimerHandle;
}

/// Timers backed by tokio tasks
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<PlayerEvent>,
    next_id: u64,
}

impl TokioScheduler {
    pub fn new(tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self { tx, next_id: 0 }
    }

    fn next_event(&mut self, kind: TimerKind) -> TimerEvent {
        self.next_id += 1;
        TimerEvent { kind, id: self.next_id }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        let event = self.next_event(kind);
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(PlayerEvent::Timer(event));
        });

        let abort = task.abort_handle();
        TimerHandle::new(event.id, kind, Box::new(move || abort.abort()))
    }

    fn schedule_repeating(&mut self, kind: TimerKind, period: Duration) -> TimerHandle {
        let event = self.next_event(kind);
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(PlayerEvent::Timer(event)).is_err() {
                    break;
                }
            }
        });

        let abort = task.abort_handle();
        TimerHandle::new(event.id, kind, Box::new(move || abort.abort()))
    }
}

/// Record of one arming made through a [`ManualScheduler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualTimer {
    pub event: TimerEvent,
    pub delay: Duration,
    pub repeating: bool,
    pub cancelled: bool,
}

/// Shared view of the armings made through a [`ManualScheduler`]
#[derive(Debug, Clone, Default)]
pub struct ManualTimers {
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

impl ManualTimers {
    /// Live arming of `kind`, if any
    pub fn armed(&self, kind: TimerKind) -> Option<ManualTimer> {
        self.timers
            .lock()
            .iter()
            .rev()
            .find(|t| t.event.kind == kind && !t.cancelled)
            .cloned()
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed(kind).is_some()
    }

    /// Event the live arming of `kind` would post
    pub fn fire(&self, kind: TimerKind) -> Option<PlayerEvent> {
        self.armed(kind).map(|t| PlayerEvent::Timer(t.event))
    }

    /// Number of armings of `kind` ever made
    pub fn arm_count(&self, kind: TimerKind) -> usize {
        self.timers.lock().iter().filter(|t| t.event.kind == kind).count()
    }

    fn record(&self, timer: ManualTimer) {
        self.timers.lock().push(timer);
    }

    fn cancel(&self, id: u64) {
        if let Some(timer) = self.timers.lock().iter_mut().find(|t| t.event.id == id) {
            timer.cancelled = true;
        }
    }
}

/// Scheduler that only records armings; firings are injected by the caller
#[derive(Debug, Default)]
pub struct ManualScheduler {
    timers: ManualTimers,
    next_id: u64,
}

impl ManualScheduler {
    pub fn new() -> (Self, ManualTimers) {
        let timers = ManualTimers::default();
        (
            Self {
                timers: timers.clone(),
                next_id: 0,
            },
            timers,
        )
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration, repeating: bool) -> TimerHandle {
        self.next_id += 1;
        let event = TimerEvent { kind, id: self.next_id };
        debug!("Manual timer armed: {:?} after {:?}", event, delay);

        self.timers.record(ManualTimer {
            event,
            delay,
            repeating,
            cancelled: false,
        });

        let timers = self.timers.clone();
        TimerHandle::new(event.id, kind, Box::new(move || timers.cancel(event.id)))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        self.arm(kind, delay, false)
    }

    fn schedule_repeating(&mut self, kind: TimerKind, period: Duration) -> TimerHandle {
        self.arm(kind, period, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_arm_and_cancel() {
        let (mut scheduler, timers) = ManualScheduler::new();

        let first = scheduler.schedule_once(TimerKind::AutoHide, Duration::from_secs(4));
        assert!(timers.is_armed(TimerKind::AutoHide));
        assert!(!timers.is_armed(TimerKind::Progress));

        first.cancel();
        assert!(!timers.is_armed(TimerKind::AutoHide));

        let second = scheduler.schedule_once(TimerKind::AutoHide, Duration::from_secs(4));
        let fired = timers.fire(TimerKind::AutoHide).unwrap();
        assert_eq!(
            fired,
            PlayerEvent::Timer(TimerEvent {
                kind: TimerKind::AutoHide,
                id: second.id()
            })
        );

        drop(second);
        assert!(!timers.is_armed(TimerKind::AutoHide));
        assert_eq!(timers.arm_count(TimerKind::AutoHide), 2);
    }

    #[test]
    fn test_handle_matches_only_its_arming() {
        let (mut scheduler, _timers) = ManualScheduler::new();
        let handle = scheduler.schedule_repeating(TimerKind::Progress, Duration::from_secs(1));

        assert!(handle.matches(&TimerEvent { kind: TimerKind::Progress, id: handle.id() }));
        assert!(!handle.matches(&TimerEvent { kind: TimerKind::Progress, id: handle.id() + 1 }));
        assert!(!handle.matches(&TimerEvent { kind: TimerKind::AutoHide, id: handle.id() }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_once_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let handle = scheduler.schedule_once(TimerKind::AutoHide, Duration::from_millis(4000));
        let start = tokio::time::Instant::now();

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PlayerEvent::Timer(ref t) if handle.matches(t)));
        assert_eq!(start.elapsed(), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_cancel_prevents_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let handle = scheduler.schedule_once(TimerKind::AutoHide, Duration::from_millis(4000));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_repeating_cadence() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);
        let _handle = scheduler.schedule_repeating(TimerKind::Progress, Duration::from_millis(1000));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut ticks = 0;
        while rx.try_recv().is_ok() {
            ticks += 1;
        }
        assert_eq!(ticks, 3);
    }
}

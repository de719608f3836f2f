//! Result bridge
//!
//! The request/response contract with whoever launched the player. A
//! launch call is validated into a [`LaunchRequest`]; the session later
//! resolves the pending call with exactly one [`SessionOutcome`].

mod immersive;
mod plugin;

pub use immersive::{ImmersiveDisplay, LoggingDisplay};
pub use plugin::{read_launch_params, LaunchContext, PlayerPlugin, TokioLaunchContext};

use crate::utils::error::{PlayerError, Result};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Action tag of the related-content signal
pub const SHOW_EPISODES_ACTION: &str = "SHOW_EPISODES";

/// Raw launch call parameters as sent by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchParams {
    pub url: Option<String>,
    pub title: String,
    pub subtitle: String,

    /// Start position in milliseconds
    pub start_position: i64,
}

/// Validated launch request. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub source_url: String,
    pub title: String,
    pub subtitle: String,
    pub start_position_ms: u64,
}

impl LaunchRequest {
    pub fn new<S: Into<String>>(source_url: S) -> Self {
        Self {
            source_url: source_url.into(),
            title: String::new(),
            subtitle: String::new(),
            start_position_ms: 0,
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle<S: Into<String>>(mut self, subtitle: S) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_start_position(mut self, position_ms: u64) -> Self {
        self.start_position_ms = position_ms;
        self
    }
}

impl TryFrom<LaunchParams> for LaunchRequest {
    type Error = PlayerError;

    fn try_from(params: LaunchParams) -> Result<Self> {
        let url = params
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PlayerError::InvalidArgument("Video URL is required".to_string()))?;

        if params.start_position < 0 {
            debug!("Negative start position {} clamped to 0", params.start_position);
        }

        Ok(Self {
            source_url: url,
            title: params.title,
            subtitle: params.subtitle,
            start_position_ms: params.start_position.max(0) as u64,
        })
    }
}

/// Final playback report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub completed: bool,
}

/// Early exit asking the caller to show related content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedContentSignal {
    pub position_ms: u64,
}

/// What a session delivers to its caller, exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished(SessionResult),
    RelatedContent(RelatedContentSignal),
}

impl SessionOutcome {
    pub fn position_ms(&self) -> u64 {
        match self {
            SessionOutcome::Finished(result) => result.position_ms,
            SessionOutcome::RelatedContent(signal) => signal.position_ms,
        }
    }

    /// Wire form handed back to the caller
    pub fn to_json(&self) -> Value {
        match self {
            SessionOutcome::Finished(result) => json!({
                "position": result.position_ms,
                "duration": result.duration_ms,
                "completed": result.completed,
            }),
            SessionOutcome::RelatedContent(signal) => json!({
                "action": SHOW_EPISODES_ACTION,
                "position": signal.position_ms,
            }),
        }
    }
}

/// Resolving side of a pending launch call.
///
/// Clones share the same call; only the first `resolve` delivers.
#[derive(Debug, Clone)]
pub struct ResultBridge {
    sender: Arc<Mutex<Option<oneshot::Sender<SessionOutcome>>>>,
    attempts: Arc<AtomicUsize>,
}

impl ResultBridge {
    pub fn channel() -> (ResultBridge, PendingCall) {
        let (tx, rx) = oneshot::channel();
        (
            ResultBridge {
                sender: Arc::new(Mutex::new(Some(tx))),
                attempts: Arc::new(AtomicUsize::new(0)),
            },
            PendingCall { rx },
        )
    }

    /// Deliver `outcome`. Returns false when the call was already resolved.
    pub fn resolve(&self, outcome: SessionOutcome) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let Some(tx) = self.sender.lock().take() else {
            debug!("Result already delivered, dropping {:?}", outcome);
            return false;
        };

        if tx.send(outcome).is_err() {
            warn!("Caller went away before the result was delivered");
        }
        true
    }

    /// Number of `resolve` calls made so far
    pub fn resolve_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.lock().is_none()
    }
}

/// Caller side of a launch call
#[derive(Debug)]
pub struct PendingCall {
    rx: oneshot::Receiver<SessionOutcome>,
}

impl PendingCall {
    /// Wait for the session outcome
    pub async fn outcome(self) -> Result<SessionOutcome> {
        self.rx
            .await
            .map_err(|_| PlayerError::Internal("Session ended without a result".to_string()))
    }

    /// Outcome if it has already been delivered
    pub fn try_outcome(&mut self) -> Option<SessionOutcome> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: Option<&str>) -> LaunchParams {
        LaunchParams {
            url: url.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_requires_url() {
        for url in [None, Some(""), Some("   ")] {
            let err = LaunchRequest::try_from(params(url)).unwrap_err();
            assert!(matches!(err, PlayerError::InvalidArgument(ref m) if m == "Video URL is required"));
        }
    }

    #[test]
    fn test_params_from_json_defaults() {
        let params: LaunchParams =
            serde_json::from_value(json!({ "url": "https://cdn.example/v.m3u8", "startPosition": 90000 }))
                .unwrap();
        let request = LaunchRequest::try_from(params).unwrap();
        assert_eq!(request.source_url, "https://cdn.example/v.m3u8");
        assert_eq!(request.title, "");
        assert_eq!(request.subtitle, "");
        assert_eq!(request.start_position_ms, 90_000);
    }

    #[test]
    fn test_negative_start_position_clamped() {
        let mut p = params(Some("https://cdn.example/v.mp4"));
        p.start_position = -500;
        assert_eq!(LaunchRequest::try_from(p).unwrap().start_position_ms, 0);
    }

    #[test]
    fn test_outcome_json() {
        let finished = SessionOutcome::Finished(SessionResult {
            position_ms: 42_000,
            duration_ms: 120_000,
            completed: false,
        });
        assert_eq!(
            finished.to_json(),
            json!({ "position": 42_000, "duration": 120_000, "completed": false })
        );

        let related = SessionOutcome::RelatedContent(RelatedContentSignal { position_ms: 7_000 });
        assert_eq!(related.to_json(), json!({ "action": "SHOW_EPISODES", "position": 7_000 }));
    }

    #[test]
    fn test_resolve_delivers_once() {
        let (bridge, mut pending) = ResultBridge::channel();
        let first = SessionOutcome::RelatedContent(RelatedContentSignal { position_ms: 1 });
        let second = SessionOutcome::RelatedContent(RelatedContentSignal { position_ms: 2 });

        assert!(bridge.resolve(first));
        assert!(!bridge.clone().resolve(second));
        assert_eq!(bridge.resolve_attempts(), 2);
        assert!(bridge.is_resolved());
        assert_eq!(pending.try_outcome(), Some(first));
    }

    #[tokio::test]
    async fn test_dropped_bridge_is_internal_error() {
        let (bridge, pending) = ResultBridge::channel();
        drop(bridge);
        assert!(matches!(pending.outcome().await, Err(PlayerError::Internal(_))));
    }
}

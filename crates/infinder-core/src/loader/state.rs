//! Loader phases and the snapshot published to subscribers

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::failure::ProducerFailure;

/// Discrete state of a loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Constructed, no attempt started yet
    Idle,
    /// An attempt is in flight
    Loading,
    /// The resource was produced; terminal
    Loaded,
    /// The last attempt failed
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Loading => write!(f, "loading"),
            Phase::Loaded => write!(f, "loaded"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// Point-in-time view of a loader
///
/// `resource` is only set in [`Phase::Loaded`] and `last_error` only in
/// [`Phase::Failed`]; the transition methods below keep it that way.
pub struct LoadSnapshot<T> {
    pub(crate) phase: Phase,
    pub(crate) resource: Option<Arc<T>>,
    pub(crate) last_error: Option<ProducerFailure>,
    pub(crate) attempt_count: u32,
    pub(crate) max_attempts: u32,
    pub(crate) retry_pending: bool,
    pub(crate) disposed: bool,
}

impl<T> LoadSnapshot<T> {
    pub(crate) fn new(max_attempts: u32) -> Self {
        Self {
            phase: Phase::Idle,
            resource: None,
            last_error: None,
            attempt_count: 0,
            max_attempts,
            retry_pending: false,
            disposed: false,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The produced value, once loaded
    pub fn resource(&self) -> Option<&Arc<T>> {
        self.resource.as_ref()
    }

    /// The failure of the last attempt, while failed
    pub fn last_error(&self) -> Option<&ProducerFailure> {
        self.last_error.as_ref()
    }

    /// Retries issued so far
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Retry budget fixed at construction
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether `retry()` can still be honored
    pub fn has_more_retries(&self) -> bool {
        self.attempt_count < self.max_attempts
    }

    /// Whether a retry is waiting out its delay
    pub fn is_retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Whether the loader has been torn down
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Nothing in flight and nothing scheduled
    pub fn is_settled(&self) -> bool {
        self.disposed || (self.phase != Phase::Loading && !self.retry_pending)
    }

    /// Idle or Failed -> Loading
    pub(crate) fn begin_attempt(&mut self) {
        self.phase = Phase::Loading;
        self.last_error = None;
        self.retry_pending = false;
    }

    pub(crate) fn complete_loaded(&mut self, value: Arc<T>) {
        self.phase = Phase::Loaded;
        self.resource = Some(value);
        self.last_error = None;
    }

    pub(crate) fn complete_failed(&mut self, failure: ProducerFailure) {
        self.phase = Phase::Failed;
        self.resource = None;
        self.last_error = Some(failure);
    }
}

impl<T> Clone for LoadSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase,
            resource: self.resource.clone(),
            last_error: self.last_error.clone(),
            attempt_count: self.attempt_count,
            max_attempts: self.max_attempts,
            retry_pending: self.retry_pending,
            disposed: self.disposed,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LoadSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadSnapshot")
            .field("phase", &self.phase)
            .field("resource", &self.resource)
            .field("last_error", &self.last_error.as_ref().map(|e| e.message()))
            .field("attempt_count", &self.attempt_count)
            .field("max_attempts", &self.max_attempts)
            .field("retry_pending", &self.retry_pending)
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Serializes the observable state without the resource itself
impl<T> Serialize for LoadSnapshot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LoadSnapshot", 6)?;
        state.serialize_field("phase", &self.phase)?;
        state.serialize_field("last-error", &self.last_error.as_ref().map(|e| e.message()))?;
        state.serialize_field("attempt-count", &self.attempt_count)?;
        state.serialize_field("max-attempts", &self.max_attempts)?;
        state.serialize_field("has-more-retries", &self.has_more_retries())?;
        state.serialize_field("retry-pending", &self.retry_pending)?;
        state.end()
    }
}

/// Result of a `retry()` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Retry accepted; the attempt starts after `delay`
    Scheduled {
        /// Retry number, 1-indexed
        attempt: u32,
        /// Wait before the attempt starts
        delay: Duration,
    },
    /// A retry is already waiting out its delay
    AlreadyPending,
    /// The retry budget is spent
    Exhausted,
    /// The loader is not in [`Phase::Failed`]
    NotFailed(Phase),
    /// The loader has been torn down
    Disposed,
    /// Called outside a Tokio runtime; nothing was changed
    NoRuntime,
}

impl RetryOutcome {
    /// Whether a new attempt was scheduled
    pub fn is_scheduled(&self) -> bool {
        matches!(self, RetryOutcome::Scheduled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snapshot_is_idle() {
        let snapshot = LoadSnapshot::<String>::new(3);
        assert_eq!(snapshot.phase(), Phase::Idle);
        assert!(snapshot.resource().is_none());
        assert!(snapshot.last_error().is_none());
        assert!(snapshot.has_more_retries());
        assert!(snapshot.is_settled());
    }

    #[test]
    fn test_zero_budget_has_no_retries() {
        let snapshot = LoadSnapshot::<()>::new(0);
        assert!(!snapshot.has_more_retries());
    }

    #[test]
    fn test_begin_attempt_clears_error() {
        let mut snapshot = LoadSnapshot::<u8>::new(1);
        snapshot.complete_failed(ProducerFailure::msg("boom"));
        assert_eq!(snapshot.last_error().map(|e| e.message()), Some("boom"));

        snapshot.begin_attempt();
        assert_eq!(snapshot.phase(), Phase::Loading);
        assert!(snapshot.last_error().is_none());
        assert!(!snapshot.is_settled());
    }

    #[test]
    fn test_pending_retry_is_not_settled() {
        let mut snapshot = LoadSnapshot::<u8>::new(1);
        snapshot.complete_failed(ProducerFailure::msg("boom"));
        snapshot.retry_pending = true;
        assert!(!snapshot.is_settled());

        snapshot.disposed = true;
        assert!(snapshot.is_settled());
    }

    #[test]
    fn test_serialize_skips_resource() {
        let mut snapshot = LoadSnapshot::new(2);
        snapshot.begin_attempt();
        snapshot.complete_loaded(Arc::new("secret payload".to_string()));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "loaded");
        assert_eq!(json["has-more-retries"], true);
        assert!(!json.to_string().contains("secret payload"));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Failed.to_string(), "failed");
        assert_eq!(Phase::Loading.to_string(), "loading");
    }
}

//! Load observation and logging
//!
//! This module provides the `LoadObserver` trait for monitoring load attempts
//! and a `TracingObserver` implementation that logs using the `tracing` crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::failure::ProducerFailure;
use super::state::Phase;

/// Observer trait for load attempt events
///
/// Hooks run on the task that drove the transition, after the new state has
/// been published.
///
/// # Example
///
/// ```rust
/// use infinder_core::loader::{LoadObserver, ProducerFailure};
/// use std::time::Duration;
///
/// struct PanelBadge;
///
/// impl LoadObserver for PanelBadge {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {}
///
///     fn on_loaded(&self, attempt: u32, elapsed: Duration) {}
///
///     fn on_failed(&self, attempt: u32, failure: &ProducerFailure, has_more_retries: bool) {}
///
///     fn on_exhausted(&self, attempts: u32, final_failure: &ProducerFailure) {}
/// }
/// ```
pub trait LoadObserver: Send + Sync {
    /// Called when an attempt is about to invoke the producer
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed, the initial load is 1)
    /// * `max_attempts` - Total attempts the budget allows
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called when the producer succeeded
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that succeeded (1-indexed)
    /// * `elapsed` - Time spent in the producer for this attempt
    fn on_loaded(&self, attempt: u32, elapsed: Duration);

    /// Called when the producer failed
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that failed (1-indexed)
    /// * `failure` - The normalized failure
    /// * `has_more_retries` - Whether `retry()` will still be honored
    fn on_failed(&self, attempt: u32, failure: &ProducerFailure, has_more_retries: bool);

    /// Called after a failure that spent the last of the retry budget
    fn on_exhausted(&self, attempts: u32, final_failure: &ProducerFailure);

    /// Called when a retry has been accepted and its timer armed
    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        let _ = (attempt, delay);
    }

    /// Called once when the loader is torn down
    fn on_disposed(&self, phase: Phase) {
        let _ = phase;
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl LoadObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_loaded(&self, _attempt: u32, _elapsed: Duration) {}

    fn on_failed(&self, _attempt: u32, _failure: &ProducerFailure, _has_more_retries: bool) {}

    fn on_exhausted(&self, _attempts: u32, _final_failure: &ProducerFailure) {}
}

/// An observer that logs load events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_loaded`: INFO (after a retry) or DEBUG (first attempt)
/// - `on_failed`: WARN
/// - `on_exhausted`: ERROR
/// - `on_retry_scheduled`: INFO
/// - `on_disposed`: DEBUG
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the resource being loaded (for log context)
    resource: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }

    /// Get the resource name
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("resource")
    }
}

impl LoadObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            resource = %self.resource,
            attempt = attempt,
            max_attempts = max_attempts,
            "loading"
        );
    }

    fn on_loaded(&self, attempt: u32, elapsed: Duration) {
        if attempt > 1 {
            tracing::info!(
                resource = %self.resource,
                attempt = attempt,
                duration_ms = elapsed.as_millis() as u64,
                "loaded after retry"
            );
        } else {
            tracing::debug!(
                resource = %self.resource,
                duration_ms = elapsed.as_millis() as u64,
                "loaded on first attempt"
            );
        }
    }

    fn on_failed(&self, attempt: u32, failure: &ProducerFailure, has_more_retries: bool) {
        tracing::warn!(
            resource = %self.resource,
            attempt = attempt,
            error = %failure,
            has_more_retries = has_more_retries,
            "load failed"
        );
    }

    fn on_exhausted(&self, attempts: u32, final_failure: &ProducerFailure) {
        tracing::error!(
            resource = %self.resource,
            attempts = attempts,
            error = %final_failure,
            "no retries left"
        );
    }

    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        tracing::info!(
            resource = %self.resource,
            retry = attempt,
            delay_ms = delay.as_millis() as u64,
            "retry scheduled"
        );
    }

    fn on_disposed(&self, phase: Phase) {
        tracing::debug!(resource = %self.resource, phase = %phase, "loader disposed");
    }
}

/// An observer that counts load events
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    /// Attempt start events
    pub attempt_starts: AtomicU32,
    /// Success events
    pub loads: AtomicU32,
    /// Failed attempt events
    pub failures: AtomicU32,
    /// Exhaustion events
    pub exhaustions: AtomicU32,
    /// Scheduled retries
    pub retries_scheduled: AtomicU32,
    /// Disposal events
    pub disposals: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of successful loads
    pub fn loads(&self) -> u32 {
        self.loads.load(Ordering::SeqCst)
    }

    /// Get the number of failures
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Get the number of exhaustions
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Get the number of scheduled retries
    pub fn retries_scheduled(&self) -> u32 {
        self.retries_scheduled.load(Ordering::SeqCst)
    }

    /// Get the number of disposals
    pub fn disposals(&self) -> u32 {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl LoadObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_loaded(&self, _attempt: u32, _elapsed: Duration) {
        self.loads.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failed(&self, _attempt: u32, _failure: &ProducerFailure, _has_more_retries: bool) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _final_failure: &ProducerFailure) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_retry_scheduled(&self, _attempt: u32, _delay: Duration) {
        self.retries_scheduled.fetch_add(1, Ordering::SeqCst);
    }

    fn on_disposed(&self, _phase: Phase) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Implement LoadObserver for Arc<T> where T: LoadObserver
impl<T: LoadObserver + ?Sized> LoadObserver for std::sync::Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_loaded(&self, attempt: u32, elapsed: Duration) {
        (**self).on_loaded(attempt, elapsed)
    }

    fn on_failed(&self, attempt: u32, failure: &ProducerFailure, has_more_retries: bool) {
        (**self).on_failed(attempt, failure, has_more_retries)
    }

    fn on_exhausted(&self, attempts: u32, final_failure: &ProducerFailure) {
        (**self).on_exhausted(attempts, final_failure)
    }

    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        (**self).on_retry_scheduled(attempt, delay)
    }

    fn on_disposed(&self, phase: Phase) {
        (**self).on_disposed(phase)
    }
}

/// Implement LoadObserver for Box<T> where T: LoadObserver
impl<T: LoadObserver + ?Sized> LoadObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_loaded(&self, attempt: u32, elapsed: Duration) {
        (**self).on_loaded(attempt, elapsed)
    }

    fn on_failed(&self, attempt: u32, failure: &ProducerFailure, has_more_retries: bool) {
        (**self).on_failed(attempt, failure, has_more_retries)
    }

    fn on_exhausted(&self, attempts: u32, final_failure: &ProducerFailure) {
        (**self).on_exhausted(attempts, final_failure)
    }

    fn on_retry_scheduled(&self, attempt: u32, delay: Duration) {
        (**self).on_retry_scheduled(attempt, delay)
    }

    fn on_disposed(&self, phase: Phase) {
        (**self).on_disposed(phase)
    }
}

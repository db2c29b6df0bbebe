//! The bounded-retry loader
//!
//! A [`RetryLoader`] owns one deferred resource. It runs the producer on a
//! spawned Tokio task, publishes every transition on a `watch` channel and
//! only retries when asked to. State lives in the channel itself, so every
//! check-and-transition happens under the channel's lock and two attempts can
//! never overlap.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant};

use crate::types::LoadPolicy;

use super::failure::ProducerFailure;
use super::observer::{LoadObserver, NoOpObserver};
use super::producer::Producer;
use super::state::{LoadSnapshot, Phase, RetryOutcome};

type Callback<A> = Box<dyn Fn(&A) + Send + Sync>;

/// Stand-in deadline for delays too large to add to `Instant::now()`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Builder for configuring a [`RetryLoader`]
///
/// # Example
///
/// ```rust,no_run
/// use infinder_core::loader::{RetryLoader, TracingObserver};
/// use std::time::Duration;
///
/// # async fn example() {
/// let loader = RetryLoader::builder(|| async { Ok::<_, std::io::Error>("dashboard") })
///     .with_max_retries(2)
///     .with_retry_delay(Duration::from_millis(500))
///     .with_observer(TracingObserver::new("dashboard"))
///     .on_load(|view| println!("ready: {view}"))
///     .spawn();
///
/// let snapshot = loader.settled().await;
/// # }
/// ```
pub struct RetryLoaderBuilder<T> {
    producer: Box<dyn Producer<T>>,
    max_retries: u32,
    retry_delay: Duration,
    observer: Box<dyn LoadObserver>,
    on_load: Option<Callback<T>>,
    on_error: Option<Callback<ProducerFailure>>,
}

impl<T: Send + Sync + 'static> RetryLoaderBuilder<T> {
    /// Create a builder with the default policy (3 retries, 1s delay)
    pub fn new(producer: impl Producer<T>) -> Self {
        let policy = LoadPolicy::default();
        Self {
            producer: Box::new(producer),
            max_retries: policy.max_retries,
            retry_delay: policy.retry_delay(),
            observer: Box::new(NoOpObserver),
            on_load: None,
            on_error: None,
        }
    }

    /// Take retry budget and delay from a policy
    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.max_retries = policy.max_retries;
        self.retry_delay = policy.retry_delay();
        self
    }

    /// Set the retry budget; 0 allows a single attempt
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the fixed delay between `retry()` and the attempt it schedules
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Set the observer
    pub fn with_observer(mut self, observer: impl LoadObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Callback invoked once with the produced value
    pub fn on_load(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_load = Some(Box::new(callback));
        self
    }

    /// Callback invoked once per failed attempt
    pub fn on_error(mut self, callback: impl Fn(&ProducerFailure) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Build an idle loader; nothing runs until [`RetryLoader::load`]
    pub fn build(self) -> RetryLoader<T> {
        let (state, _) = watch::channel(LoadSnapshot::new(self.max_retries));
        RetryLoader {
            shared: Arc::new(Shared {
                producer: self.producer,
                retry_delay: self.retry_delay,
                observer: self.observer,
                on_load: self.on_load,
                on_error: self.on_error,
                state,
                tasks: Mutex::new(TaskHandles::default()),
            }),
        }
    }

    /// Build the loader and start the first attempt immediately
    ///
    /// Outside a Tokio runtime the loader is returned still [`Phase::Idle`].
    pub fn spawn(self) -> RetryLoader<T> {
        let loader = self.build();
        loader.load();
        loader
    }
}

/// Loads one resource with a caller-driven, bounded retry
///
/// Dropping the loader tears it down: a pending retry timer and an in-flight
/// attempt are aborted, and a result that still arrives is discarded.
pub struct RetryLoader<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + Sync + 'static> RetryLoader<T> {
    /// Start configuring a loader around `producer`
    pub fn builder(producer: impl Producer<T>) -> RetryLoaderBuilder<T> {
        RetryLoaderBuilder::new(producer)
    }

    /// Start the first attempt
    ///
    /// Only acts from [`Phase::Idle`]. Returns `false` when the call was
    /// dropped: an attempt is already in flight, the resource is loaded, the
    /// loader failed (use [`retry`](Self::retry)), was disposed, or there is
    /// no Tokio runtime to run the attempt on.
    pub fn load(&self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("load ignored: no Tokio runtime");
            return false;
        };

        let started = self.shared.state.send_if_modified(|s| {
            if s.disposed || s.phase != Phase::Idle {
                return false;
            }
            s.begin_attempt();
            true
        });

        if started {
            Shared::spawn_attempt(&self.shared, &runtime, 1);
        } else {
            tracing::trace!(phase = %self.phase(), "load ignored");
        }
        started
    }

    /// Ask for another attempt after the configured delay
    ///
    /// Honored only in [`Phase::Failed`] with budget left and no retry already
    /// waiting. The attempt counter is bumped immediately; the producer runs
    /// once the delay has elapsed. Without a Tokio runtime nothing changes and
    /// [`RetryOutcome::NoRuntime`] is returned.
    pub fn retry(&self) -> RetryOutcome {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("retry ignored: no Tokio runtime");
            return RetryOutcome::NoRuntime;
        };

        let delay = self.shared.retry_delay;
        let mut outcome = RetryOutcome::Disposed;

        self.shared.state.send_if_modified(|s| {
            outcome = if s.disposed {
                RetryOutcome::Disposed
            } else if s.phase != Phase::Failed {
                RetryOutcome::NotFailed(s.phase)
            } else if s.retry_pending {
                RetryOutcome::AlreadyPending
            } else if !s.has_more_retries() {
                RetryOutcome::Exhausted
            } else {
                s.attempt_count += 1;
                s.retry_pending = true;
                RetryOutcome::Scheduled {
                    attempt: s.attempt_count,
                    delay,
                }
            };
            outcome.is_scheduled()
        });

        match outcome {
            RetryOutcome::Scheduled { attempt, delay } => {
                self.shared.observer.on_retry_scheduled(attempt, delay);
                Shared::schedule_retry(&self.shared, &runtime, delay);
            }
            other => tracing::debug!(outcome = ?other, "retry ignored"),
        }
        outcome
    }
}

impl<T> RetryLoader<T> {
    /// Tear the loader down
    ///
    /// Idempotent. After this returns no field of the published state changes
    /// again and no callback fires for work that was in flight.
    pub fn dispose(&self) {
        let mut phase = None;
        self.shared.state.send_if_modified(|s| {
            if s.disposed {
                return false;
            }
            s.disposed = true;
            phase = Some(s.phase);
            true
        });

        let Some(phase) = phase else {
            return;
        };

        let mut tasks = self.shared.tasks();
        if let Some(retry) = tasks.retry.take() {
            retry.abort();
        }
        if let Some(attempt) = tasks.attempt.take() {
            attempt.abort();
        }
        drop(tasks);

        self.shared.observer.on_disposed(phase);
    }

    /// Current state
    pub fn snapshot(&self) -> LoadSnapshot<T> {
        self.shared.state.borrow().clone()
    }

    /// Receive every published transition
    pub fn subscribe(&self) -> watch::Receiver<LoadSnapshot<T>> {
        self.shared.state.subscribe()
    }

    /// Wait until nothing is in flight or scheduled
    pub async fn settled(&self) -> LoadSnapshot<T> {
        let mut rx = self.shared.state.subscribe();
        let snapshot = match rx.wait_for(LoadSnapshot::is_settled).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.shared.state.borrow().phase
    }

    /// The produced value, once loaded
    pub fn resource(&self) -> Option<Arc<T>> {
        self.shared.state.borrow().resource.clone()
    }

    /// The failure of the last attempt, while failed
    pub fn last_error(&self) -> Option<ProducerFailure> {
        self.shared.state.borrow().last_error.clone()
    }

    /// Retries issued so far
    pub fn attempt_count(&self) -> u32 {
        self.shared.state.borrow().attempt_count
    }

    /// Whether `retry()` can still be honored
    pub fn has_more_retries(&self) -> bool {
        self.shared.state.borrow().has_more_retries()
    }
}

impl<T> Drop for RetryLoader<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Default)]
struct TaskHandles {
    attempt: Option<AbortHandle>,
    retry: Option<AbortHandle>,
}

struct Shared<T> {
    producer: Box<dyn Producer<T>>,
    retry_delay: Duration,
    observer: Box<dyn LoadObserver>,
    on_load: Option<Callback<T>>,
    on_error: Option<Callback<ProducerFailure>>,
    state: watch::Sender<LoadSnapshot<T>>,
    tasks: Mutex<TaskHandles>,
}

impl<T> Shared<T> {
    fn tasks(&self) -> MutexGuard<'_, TaskHandles> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Run an attempt the caller already moved to `Loading`
    fn spawn_attempt(shared: &Arc<Self>, runtime: &Handle, attempt: u32) {
        let task = Arc::clone(shared);
        let handle = runtime.spawn(async move { task.run_attempt(attempt).await });
        shared.tasks().attempt = Some(handle.abort_handle());
    }

    /// Arm the retry timer; the attempt runs on the timer's task
    fn schedule_retry(shared: &Arc<Self>, runtime: &Handle, delay: Duration) {
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE);
        let task = Arc::clone(shared);
        let handle = runtime.spawn(async move {
            time::sleep_until(deadline).await;

            let mut attempt = 0;
            let started = task.state.send_if_modified(|s| {
                if s.disposed || !s.retry_pending {
                    return false;
                }
                s.begin_attempt();
                attempt = s.attempt_count + 1;
                true
            });

            if started {
                task.run_attempt(attempt).await;
            }
        });
        shared.tasks().retry = Some(handle.abort_handle());
    }

    async fn run_attempt(&self, attempt: u32) {
        let max_attempts = self.state.borrow().max_attempts.saturating_add(1);
        self.observer.on_attempt_start(attempt, max_attempts);

        let started = Instant::now();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.producer.produce())) {
            Ok(fut) => AssertUnwindSafe(fut)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(ProducerFailure::from_panic(payload))),
            Err(payload) => Err(ProducerFailure::from_panic(payload)),
        };

        match outcome {
            Ok(value) => self.finish_loaded(attempt, value, started.elapsed()),
            Err(failure) => self.finish_failed(attempt, failure),
        }
    }

    fn finish_loaded(&self, attempt: u32, value: T, elapsed: Duration) {
        let value = Arc::new(value);
        let committed = self.state.send_if_modified(|s| {
            if s.disposed || s.phase != Phase::Loading {
                return false;
            }
            s.complete_loaded(Arc::clone(&value));
            true
        });

        if !committed {
            tracing::trace!(attempt, "discarding result of a torn-down loader");
            return;
        }

        self.observer.on_loaded(attempt, elapsed);
        if let Some(on_load) = &self.on_load {
            notify("on_load", || on_load(&value));
        }
    }

    fn finish_failed(&self, attempt: u32, failure: ProducerFailure) {
        let mut has_more_retries = false;
        let committed = self.state.send_if_modified(|s| {
            if s.disposed || s.phase != Phase::Loading {
                return false;
            }
            s.complete_failed(failure.clone());
            has_more_retries = s.has_more_retries();
            true
        });

        if !committed {
            tracing::trace!(attempt, "discarding failure of a torn-down loader");
            return;
        }

        self.observer.on_failed(attempt, &failure, has_more_retries);
        if !has_more_retries {
            self.observer.on_exhausted(attempt, &failure);
        }
        if let Some(on_error) = &self.on_error {
            notify("on_error", || on_error(&failure));
        }
    }
}

/// Run a user callback; a panic is logged and swallowed
fn notify(hook: &'static str, callback: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
        tracing::error!(hook, "loader callback panicked");
    }
}

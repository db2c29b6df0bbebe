//! Bounded-retry loader for deferred resources
//!
//! A loader wraps a producer (any async operation yielding a resource) and
//! tracks it through `Idle → Loading → Loaded | Failed`. Failures are recorded
//! as state, never returned to the caller. Retries are always requested by the
//! caller, capped by a fixed budget and delayed by a fixed interval.
//!
//! # Features
//!
//! - Explicit state machine published on a `tokio::sync::watch` channel
//! - Single-flight: overlapping `load()` calls are dropped
//! - Cancellable retry timer; teardown discards late results
//! - `on_load` / `on_error` callbacks plus the `LoadObserver` trait
//! - Built-in `TracingObserver` for logging
//!
//! # Example
//!
//! ```rust,no_run
//! use infinder_core::loader::{Phase, RetryLoader};
//!
//! async fn example() {
//!     let loader = RetryLoader::builder(|| async {
//!         tokio::fs::read_to_string("campaigns.json").await
//!     })
//!     .with_max_retries(2)
//!     .spawn();
//!
//!     let mut snapshot = loader.settled().await;
//!     while snapshot.phase() == Phase::Failed && snapshot.has_more_retries() {
//!         loader.retry();
//!         snapshot = loader.settled().await;
//!     }
//! }
//! ```

mod failure;
mod observer;
mod producer;
mod retry_loader;
mod state;

pub use failure::ProducerFailure;
pub use observer::{LoadObserver, NoOpObserver, StatsObserver, TracingObserver};
pub use producer::Producer;
pub use retry_loader::{RetryLoader, RetryLoaderBuilder};
pub use state::{LoadSnapshot, Phase, RetryOutcome};

//! The producer seam: anything that can asynchronously yield a resource

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::failure::ProducerFailure;

/// A zero-argument asynchronous operation that yields a resource
///
/// Implemented for every `Fn() -> impl Future<Output = Result<T, E>>` where
/// `E` converts into `anyhow::Error`, so plain async closures work:
///
/// ```rust
/// use infinder_core::loader::Producer;
///
/// fn assert_producer<P: Producer<String>>(_: P) {}
///
/// assert_producer(|| async { Ok::<_, std::io::Error>("profile".to_string()) });
/// ```
pub trait Producer<T>: Send + Sync + 'static {
    /// Start one attempt
    fn produce(&self) -> BoxFuture<'static, Result<T, ProducerFailure>>;
}

impl<T, F, Fut, E> Producer<T> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<anyhow::Error>,
    T: Send + 'static,
{
    fn produce(&self) -> BoxFuture<'static, Result<T, ProducerFailure>> {
        (self)().map(|result| result.map_err(ProducerFailure::new)).boxed()
    }
}

//! The single failure kind a loader records
//!
//! Whatever a producer fails with is normalized into a [`ProducerFailure`]:
//! a human-readable message plus the original cause.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// A producer failure, normalized to a message and an opaque cause
///
/// Cheap to clone so it can be published to every subscriber.
#[derive(Clone)]
pub struct ProducerFailure {
    message: String,
    cause: Arc<anyhow::Error>,
}

impl ProducerFailure {
    /// Wrap an arbitrary error
    ///
    /// A `ProducerFailure` that went through `anyhow` is unwrapped rather than
    /// nested.
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        let err = err.into();
        match err.downcast::<ProducerFailure>() {
            Ok(failure) => failure,
            Err(err) => Self {
                message: err.to_string(),
                cause: Arc::new(err),
            },
        }
    }

    /// Build a failure from a plain message
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::new(anyhow::Error::msg(message))
    }

    /// Build a failure from a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::msg(format!("producer panicked: {}", detail))
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The original cause, with its full context chain
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

impl fmt::Display for ProducerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for ProducerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerFailure")
            .field("message", &self.message)
            .field("cause", &format_args!("{:#}", self.cause))
            .finish()
    }
}

impl Error for ProducerFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.source()
    }
}

impl PartialEq for ProducerFailure {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::io;

    #[test]
    fn test_message_from_io_error() {
        let failure = ProducerFailure::new(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert_eq!(failure.message(), "no such file");
        assert!(failure.cause().downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn test_context_keeps_source_chain() {
        let err = Err::<(), _>(io::Error::other("socket closed"))
            .context("fetching campaign list")
            .unwrap_err();

        let failure = ProducerFailure::new(err);
        assert_eq!(failure.message(), "fetching campaign list");
        assert_eq!(
            failure.source().map(|s| s.to_string()),
            Some("socket closed".to_string())
        );
    }

    #[test]
    fn test_no_double_wrapping() {
        let inner = ProducerFailure::msg("boom");
        let outer = ProducerFailure::new(anyhow::Error::new(inner.clone()));
        assert_eq!(outer, inner);
        assert_eq!(outer.to_string(), "boom");
    }

    #[test]
    fn test_from_panic_payloads() {
        let failure = ProducerFailure::from_panic(Box::new("bad state"));
        assert_eq!(failure.message(), "producer panicked: bad state");

        let failure = ProducerFailure::from_panic(Box::new(String::from("owned")));
        assert_eq!(failure.message(), "producer panicked: owned");

        let failure = ProducerFailure::from_panic(Box::new(42u8));
        assert_eq!(failure.message(), "producer panicked: unknown panic payload");
    }
}

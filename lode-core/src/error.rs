//! Error types for the reactive core.
//!
//! Nothing in this crate recovers from a failure locally. An error raised by a
//! selector's generator (or by a subscriber callback) travels back up the
//! notification chain to whoever started the update, usually the caller of
//! [`Atom::set_state`](crate::reactive::Atom::set_state).

use std::sync::Arc;

/// Boxed error produced by user code (generators, foreign callbacks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A selector's generator failed during construction or recomputation.
    ///
    /// The selector keeps its last successfully computed value and its
    /// previous subscriptions.
    #[error("selector `{key}` failed to compute: {source}")]
    Generator {
        key: Arc<str>,
        #[source]
        source: BoxError,
    },

    /// A subscriber callback reported a failure while being notified.
    #[error("subscriber of `{key}` failed: {source}")]
    Subscriber {
        key: Arc<str>,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Key of the node the error was raised for.
    pub fn key(&self) -> &str {
        match self {
            Error::Generator { key, .. } | Error::Subscriber { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_error_reports_key_and_source() {
        let err = Error::Generator {
            key: Arc::from("total"),
            source: "division by zero".into(),
        };

        assert_eq!(err.key(), "total");
        assert_eq!(
            err.to_string(),
            "selector `total` failed to compute: division by zero"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}

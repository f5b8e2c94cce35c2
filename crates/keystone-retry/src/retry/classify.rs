//! Error classification for the default retry predicate
//!
//! Errors are classified once, where the HTTP client's error is first caught,
//! into a closed set of failure kinds. The default classifier then decides
//! retryability from the kind alone.

use super::http::HttpError;
use super::predicates::RetryPredicate;
use std::error::Error as StdError;
use std::io;

/// What a failed attempt tells us about the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No response was received (connect failure, reset, timeout before headers)
    Transport,

    /// The server responded with this HTTP status
    HttpStatus(u16),

    /// The error carries no response information at all
    Unknown,
}

impl FailureKind {
    /// The HTTP status, if the server responded
    pub fn status(&self) -> Option<u16> {
        match self {
            FailureKind::HttpStatus(code) => Some(*code),
            FailureKind::Transport | FailureKind::Unknown => None,
        }
    }

    /// Whether the default policy retries this kind of failure
    ///
    /// Failures without a status, 5xx, 408 (request timeout) and 429 (rate
    /// limited) are retried. Every other status is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            FailureKind::Transport | FailureKind::Unknown => true,
            FailureKind::HttpStatus(code) => *code >= 500 || *code == 408 || *code == 429,
        }
    }
}

/// Errors that can describe themselves as a `FailureKind`
pub trait Classify {
    /// Classify this error
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for FailureKind {
    fn failure_kind(&self) -> FailureKind {
        *self
    }
}

impl Classify for io::Error {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Transport
    }
}

impl Classify for reqwest::Error {
    fn failure_kind(&self) -> FailureKind {
        match self.status() {
            Some(status) => FailureKind::HttpStatus(status.as_u16()),
            None => FailureKind::Transport,
        }
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}

impl Classify for String {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Unknown
    }
}

impl Classify for dyn StdError + 'static {
    fn failure_kind(&self) -> FailureKind {
        classify_chain(self)
    }
}

impl Classify for dyn StdError + Send + Sync + 'static {
    fn failure_kind(&self) -> FailureKind {
        classify_chain(self)
    }
}

/// Classify a type-erased error by the first known error in its source chain
fn classify_chain(error: &(dyn StdError + 'static)) -> FailureKind {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(http) = err.downcast_ref::<HttpError>() {
            return http.failure_kind();
        }
        if let Some(client_err) = err.downcast_ref::<reqwest::Error>() {
            return client_err.failure_kind();
        }
        if err.is::<io::Error>() {
            return FailureKind::Transport;
        }
        current = err.source();
    }
    FailureKind::Unknown
}

/// The predicate used when a caller supplies none
///
/// Retries transport failures, unclassified errors, 5xx, 408 and 429.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl<E: Classify + ?Sized> RetryPredicate<E> for DefaultClassifier {
    fn should_retry(&self, error: &E, _attempt: u32) -> bool {
        error.failure_kind().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retryable(kind: FailureKind) -> bool {
        DefaultClassifier.should_retry(&kind, 1)
    }

    #[test]
    fn test_no_response_is_retryable() {
        assert!(retryable(FailureKind::Transport));
        assert!(retryable(FailureKind::Unknown));
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(retryable(FailureKind::HttpStatus(500)));
        assert!(retryable(FailureKind::HttpStatus(503)));
        assert!(retryable(FailureKind::HttpStatus(504)));
    }

    #[test]
    fn test_timeout_and_rate_limit_are_retryable() {
        assert!(retryable(FailureKind::HttpStatus(408)));
        assert!(retryable(FailureKind::HttpStatus(429)));
    }

    #[test]
    fn test_other_client_errors_are_not_retryable() {
        assert!(!retryable(FailureKind::HttpStatus(400)));
        assert!(!retryable(FailureKind::HttpStatus(401)));
        assert!(!retryable(FailureKind::HttpStatus(403)));
        assert!(!retryable(FailureKind::HttpStatus(404)));
        assert!(!retryable(FailureKind::HttpStatus(422)));
    }

    #[test]
    fn test_io_errors_are_transport() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(err.failure_kind(), FailureKind::Transport);
        assert!(DefaultClassifier.should_retry(&err, 1));
    }

    #[test]
    fn test_boxed_dyn_errors_downcast() {
        let io_err: Box<dyn StdError + Send + Sync> =
            Box::new(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert_eq!(io_err.failure_kind(), FailureKind::Transport);

        let not_found: Box<dyn StdError> = Box::new(HttpError::Status {
            url: "https://api.keystone.test/listings/missing".to_string(),
            status: 404,
        });
        assert_eq!(not_found.failure_kind(), FailureKind::HttpStatus(404));
        assert!(!DefaultClassifier.should_retry(&not_found, 1));
    }

    #[test]
    fn test_unrecognized_errors_are_unknown() {
        let boom: Box<dyn StdError + Send + Sync> = "boom".into();
        assert_eq!(boom.failure_kind(), FailureKind::Unknown);
        assert!(DefaultClassifier.should_retry(&boom, 1));

        let message = "listing service unavailable".to_string();
        assert_eq!(message.failure_kind(), FailureKind::Unknown);
        assert!(DefaultClassifier.should_retry(&message, 1));
    }

    #[derive(Debug)]
    struct SyncFailed(io::Error);

    impl std::fmt::Display for SyncFailed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "favorites sync failed")
        }
    }

    impl StdError for SyncFailed {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_source_chain_is_searched() {
        let err: Box<dyn StdError + Send + Sync> = Box::new(SyncFailed(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        )));
        assert_eq!(err.failure_kind(), FailureKind::Transport);
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(FailureKind::HttpStatus(429).status(), Some(429));
        assert_eq!(FailureKind::Transport.status(), None);
    }
}

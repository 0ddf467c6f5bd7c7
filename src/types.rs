// Lapse - Per-request Statsd timing instrumentation for Rust
//
// Copyright 2024-2026 The Lapse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use thiserror::Error;

/// Broad category of an error, for callers that dispatch on failure class
/// rather than the exact variant.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// Malformed tag name or value, rejected at write time.
    InvalidTag,
    /// Operation on a session that has already been finalized.
    InvalidState,
    /// The metric target could not be resolved to an address.
    Resolution,
    /// A local datagram socket could not be created.
    Socket,
    /// The datagram could not be transmitted.
    Send,
    /// The registry cap on registered metrics was exceeded.
    RegistryFull,
    /// A registry operation named a metric that was never registered.
    UnknownMetric,
}

/// Any error that occurs recording or emitting a request metric.
///
/// None of these are fatal to the request being instrumented: tag errors are
/// reported synchronously at the call site and transport errors only surface
/// from the finalize path, where the quiet variants log and swallow them.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("invalid tag: {0}")]
    InvalidTag(&'static str),

    #[error("session has already been finalized")]
    AlreadyFinalized,

    #[error("unable to resolve metric target: {0}")]
    Resolution(String),

    #[error("unable to create datagram socket")]
    Socket(#[source] io::Error),

    #[error("unable to send datagram")]
    Send(#[source] io::Error),

    #[error("metric limit of {0} exceeded")]
    RegistryFull(usize),

    #[error("no metric registered under name {0:?}")]
    UnknownMetric(String),
}

impl MetricError {
    /// Return the kind of error this is, regardless of underlying cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricError::InvalidTag(_) => ErrorKind::InvalidTag,
            MetricError::AlreadyFinalized => ErrorKind::InvalidState,
            MetricError::Resolution(_) => ErrorKind::Resolution,
            MetricError::Socket(_) => ErrorKind::Socket,
            MetricError::Send(_) => ErrorKind::Send,
            MetricError::RegistryFull(_) => ErrorKind::RegistryFull,
            MetricError::UnknownMetric(_) => ErrorKind::UnknownMetric,
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;

#[cfg(test)]
mod tests {
    use super::{ErrorKind, MetricError};
    use std::error::Error;
    use std::io;

    #[test]
    fn test_error_kind_accessor() {
        let err = MetricError::InvalidTag("tag name cannot be empty");
        assert_eq!(ErrorKind::InvalidTag, err.kind());

        let err = MetricError::Resolution("metrics.example.com:8125: lookup failed".to_owned());
        assert_eq!(ErrorKind::Resolution, err.kind());

        let err = MetricError::Send(io::Error::new(io::ErrorKind::Other, "network unreachable"));
        assert_eq!(ErrorKind::Send, err.kind());
    }

    #[test]
    fn test_io_cause_is_preserved() {
        let err = MetricError::Socket(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let cause = err.source().expect("expected an underlying cause");
        assert!(cause.to_string().contains("denied"));
    }
}

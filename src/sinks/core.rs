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

/// Trait for backends that a finalized request metric is written to.
///
/// The metric string is the canonical Statsd timing line without a trailing
/// newline, for example:
///
/// ``` text
/// request.timing:42|ms|#route:/home,status:200
/// ```
///
/// The default backend is [`UdpTransport`](crate::UdpTransport); custom
/// implementations are mainly useful for testing or for disabling emission.
pub trait MetricSink {
    /// Send the Statsd metric using this sink and return the number of
    /// bytes written or an I/O error.
    fn emit(&self, metric: &str) -> io::Result<usize>;
}

/// Implementation of a `MetricSink` that discards all metrics.
///
/// Useful for disabling metric emission or unit tests.
#[derive(Debug, Clone)]
pub struct NopMetricSink;

impl MetricSink for NopMetricSink {
    fn emit(&self, _metric: &str) -> io::Result<usize> {
        Ok(0)
    }
}

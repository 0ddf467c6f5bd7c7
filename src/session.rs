// Lapse - Per-request Statsd timing instrumentation for Rust
//
// Copyright 2024-2026 The Lapse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::encoder::encode_timing;
use crate::sinks::{MetricSink, UdpTransport};
use crate::tags::TagSet;
use crate::types::{MetricError, MetricResult};
use crate::DEFAULT_PORT;

/// Accumulates timing and tag metadata for a single request and emits one
/// Statsd timing metric over UDP when the request ends.
///
/// A timer is created at request start with [`RequestTimer::begin`], which
/// fixes the start timestamp once. While the request runs the metric name,
/// target, and tags may be set freely. A single finalize call at request end
/// encodes and transmits exactly one packet; the timer is one-shot and later
/// finalize calls do nothing.
///
/// A timer belongs to exactly one request and one owner. The mutators take
/// `&mut self`, so the single-owner model is enforced by the type system and
/// no internal locking is needed.
///
/// # Example
///
/// ```no_run
/// use lapse::RequestTimer;
///
/// let mut timer = RequestTimer::begin();
/// timer.set_metric_name("request.timing").unwrap();
/// timer.set_host("metrics.example.com").unwrap();
/// timer.set_tag("route", "/home").unwrap();
/// timer.set_tag("status", "200").unwrap();
///
/// // ... handle the request ...
///
/// // At request end: one datagram, errors logged and swallowed.
/// timer.finalize();
/// ```
///
/// Without a metric name the timer stays inert: finalizing it performs no
/// network activity and reports no error.
#[derive(Debug)]
pub struct RequestTimer {
    started: Instant,
    started_at: SystemTime,
    metric_name: Option<String>,
    host: String,
    port: u16,
    tags: TagSet,
    finalized: bool,
}

impl RequestTimer {
    /// Start a new timer, capturing the request start timestamp.
    ///
    /// The timestamp is fixed here and never re-captured. Elapsed time is
    /// measured on the monotonic clock; the wall-clock start time is kept
    /// separately for [`started_at`](RequestTimer::started_at) read-back.
    pub fn begin() -> RequestTimer {
        RequestTimer {
            started: Instant::now(),
            started_at: SystemTime::now(),
            metric_name: None,
            host: String::new(),
            port: DEFAULT_PORT,
            tags: TagSet::new(),
            finalized: false,
        }
    }

    fn guard_active(&self) -> MetricResult<()> {
        if self.finalized {
            Err(MetricError::AlreadyFinalized)
        } else {
            Ok(())
        }
    }

    /// Set the metric name to emit at finalization.
    ///
    /// Until a name is set the timer never encodes or sends anything.
    pub fn set_metric_name(&mut self, name: &str) -> MetricResult<()> {
        self.guard_active()?;
        self.metric_name = Some(name.to_owned());
        Ok(())
    }

    /// Set the Statsd host to send to.
    pub fn set_host(&mut self, host: &str) -> MetricResult<()> {
        self.guard_active()?;
        self.host = host.to_owned();
        Ok(())
    }

    /// Set the Statsd port to send to. Defaults to [`DEFAULT_PORT`].
    pub fn set_port(&mut self, port: u16) -> MetricResult<()> {
        self.guard_active()?;
        self.port = port;
        Ok(())
    }

    /// Set a request tag, delegating validation to [`TagSet::set`]: names
    /// must be non-empty and neither names nor values may contain colons.
    pub fn set_tag(&mut self, name: &str, value: &str) -> MetricResult<()> {
        self.guard_active()?;
        self.tags.set(name, value)
    }

    pub fn metric_name(&self) -> Option<&str> {
        self.metric_name.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Time elapsed since [`begin`](RequestTimer::begin).
    ///
    /// Measured on the monotonic clock, so repeated reads never decrease.
    /// Reading it does not mutate the timer and may be done in any state.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock time at which the timer was started.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Start time as fractional seconds since the Unix epoch.
    pub fn started_at_secs(&self) -> f64 {
        self.started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// The Statsd line this timer would emit right now, or `None` when no
    /// metric name has been set. Pure read-back, no I/O.
    pub fn payload(&self) -> Option<String> {
        encode_timing(self.metric_name.as_deref(), self.duration_ms(), &self.tags)
    }

    // Truncated, not rounded.
    fn duration_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    // Transition to finalized and hand out the encoded line, exactly once.
    // Returns None when already finalized or when no metric name is set.
    fn take_payload(&mut self) -> Option<String> {
        if self.finalized {
            return None;
        }
        self.finalized = true;
        self.payload()
    }

    /// Finalize the timer, sending at most one datagram to the configured
    /// host and port.
    ///
    /// The first call consumes the timer regardless of the transport
    /// outcome; later calls are no-ops that return `Ok(None)` and perform no
    /// network I/O. When no metric name was ever set nothing is sent and
    /// the call succeeds trivially. On success the transmitted line is
    /// returned. The transport is closed whether or not the send succeeds.
    pub fn try_finalize(&mut self) -> MetricResult<Option<String>> {
        let line = match self.take_payload() {
            Some(line) => line,
            None => return Ok(None),
        };

        // Transport handles are never reused: resolve, send once, drop.
        let transport = UdpTransport::open(&self.host, self.port)?;
        transport.send(&line)?;
        Ok(Some(line))
    }

    /// Finalize against a caller-supplied sink instead of opening a UDP
    /// transport. State semantics are identical to
    /// [`try_finalize`](RequestTimer::try_finalize).
    pub fn try_finalize_to<S: MetricSink>(&mut self, sink: &S) -> MetricResult<Option<String>> {
        let line = match self.take_payload() {
            Some(line) => line,
            None => return Ok(None),
        };

        sink.emit(&line).map_err(MetricError::Send)?;
        Ok(Some(line))
    }

    /// Quiet variant of [`try_finalize`](RequestTimer::try_finalize):
    /// failures are logged at WARN and swallowed.
    ///
    /// Metric delivery is best effort and must never affect the outcome of
    /// the request being instrumented, so no error crosses this boundary.
    pub fn finalize(&mut self) {
        if let Err(err) = self.try_finalize() {
            warn!(
                error = %err,
                metric = ?self.metric_name,
                "failed to emit request timing metric"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RequestTimer;
    use crate::sinks::{NopMetricSink, SpyMetricSink};
    use crate::types::ErrorKind;
    use std::time::Duration;

    #[test]
    fn test_finalize_to_sends_encoded_line() {
        let (rx, sink) = SpyMetricSink::new();

        let mut timer = RequestTimer::begin();
        timer.set_metric_name("request.timing").unwrap();
        timer.set_tag("route", "/home").unwrap();
        timer.set_tag("status", "200").unwrap();

        let line = timer.try_finalize_to(&sink).unwrap().unwrap();
        let sent = String::from_utf8(rx.recv().unwrap()).unwrap();

        assert_eq!(line, sent);
        assert!(sent.starts_with("request.timing:"));
        assert!(sent.ends_with("|ms|#route:/home,status:200"));
    }

    #[test]
    fn test_second_finalize_is_a_noop() {
        let (rx, sink) = SpyMetricSink::new();

        let mut timer = RequestTimer::begin();
        timer.set_metric_name("request.timing").unwrap();

        assert!(timer.try_finalize_to(&sink).unwrap().is_some());
        assert!(timer.try_finalize_to(&sink).unwrap().is_none());

        assert!(rx.recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_finalize_without_name_sends_nothing() {
        let (rx, sink) = SpyMetricSink::new();

        let mut timer = RequestTimer::begin();
        timer.set_tag("route", "/home").unwrap();

        assert!(timer.try_finalize_to(&sink).unwrap().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mutation_after_finalize_is_rejected() {
        let mut timer = RequestTimer::begin();
        timer.try_finalize_to(&NopMetricSink).unwrap();

        assert_eq!(
            ErrorKind::InvalidState,
            timer.set_metric_name("request.timing").unwrap_err().kind()
        );
        assert_eq!(ErrorKind::InvalidState, timer.set_host("127.0.0.1").unwrap_err().kind());
        assert_eq!(ErrorKind::InvalidState, timer.set_port(8125).unwrap_err().kind());
        assert_eq!(
            ErrorKind::InvalidState,
            timer.set_tag("route", "/home").unwrap_err().kind()
        );
    }

    #[test]
    fn test_invalid_tag_leaves_store_unchanged() {
        let mut timer = RequestTimer::begin();
        let err = timer.set_tag("bad:name", "x").unwrap_err();

        assert_eq!(ErrorKind::InvalidTag, err.kind());
        assert_eq!(0, timer.tags().len());
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let timer = RequestTimer::begin();
        let first = timer.elapsed();
        let second = timer.elapsed();

        assert!(second >= first);
    }

    #[test]
    fn test_started_at_secs_is_positive() {
        let timer = RequestTimer::begin();
        assert!(timer.started_at_secs() > 0.0);
    }

    #[test]
    fn test_payload_reflects_current_state() {
        let mut timer = RequestTimer::begin();
        assert!(timer.payload().is_none());

        timer.set_metric_name("request.timing").unwrap();
        let line = timer.payload().unwrap();
        assert!(line.starts_with("request.timing:"));
        assert!(line.ends_with("|ms"));
    }

    #[test]
    fn test_default_port() {
        let timer = RequestTimer::begin();
        assert_eq!(crate::DEFAULT_PORT, timer.port());
        assert_eq!("", timer.host());
    }

    #[test]
    fn test_try_finalize_empty_host_is_resolution_error() {
        let mut timer = RequestTimer::begin();
        timer.set_metric_name("request.timing").unwrap();

        let err = timer.try_finalize().unwrap_err();
        assert_eq!(ErrorKind::Resolution, err.kind());

        // the timer is consumed even though the transport failed
        assert!(timer.try_finalize().unwrap().is_none());
    }

    #[test]
    fn test_duration_ms_is_truncated() {
        let mut timer = RequestTimer::begin();
        timer.set_metric_name("request.timing").unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let line = timer.payload().unwrap();
        let ms: u64 = line
            .strip_prefix("request.timing:")
            .and_then(|rest| rest.strip_suffix("|ms"))
            .unwrap()
            .parse()
            .unwrap();

        assert!(ms >= 5);
        assert!(u128::from(ms) <= timer.elapsed().as_millis());
    }
}

// Lapse - Per-request Statsd timing instrumentation for Rust
//
// Copyright 2024-2026 The Lapse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::session::RequestTimer;
use crate::types::{MetricError, MetricResult};

/// Default cap on independently registered metrics per request.
pub const DEFAULT_METRICS_MAX: usize = 16;

/// Registry of independently named and targeted request timers.
///
/// For hosts that record several metrics per request, each with its own
/// Statsd target and tag set. Every registered timer is its own
/// [`RequestTimer`] and is finalized on its own at request end: one datagram
/// per metric, each delivery best effort and independent of the others.
///
/// # Example
///
/// ```no_run
/// use lapse::{TimerRegistry, DEFAULT_PORT};
///
/// let mut registry = TimerRegistry::new();
/// registry.add("app.request", "metrics.example.com", DEFAULT_PORT).unwrap();
/// registry.add("app.upstream", "metrics-b.example.com", DEFAULT_PORT).unwrap();
/// registry.set_tag("app.request", "route", "/home").unwrap();
///
/// // ... handle the request ...
///
/// registry.finalize_all();
/// ```
#[derive(Debug)]
pub struct TimerRegistry {
    timers: Vec<(String, RequestTimer)>,
    max: usize,
}

impl TimerRegistry {
    /// Create a registry capped at [`DEFAULT_METRICS_MAX`] metrics.
    pub fn new() -> TimerRegistry {
        Self::with_capacity(DEFAULT_METRICS_MAX)
    }

    /// Create a registry with a custom cap on registered metrics.
    pub fn with_capacity(max: usize) -> TimerRegistry {
        TimerRegistry { timers: Vec::new(), max }
    }

    /// Register a metric under `name`, targeting `host:port`. The new
    /// timer's start timestamp is captured here.
    ///
    /// Registering a name that already exists replaces the earlier entry in
    /// place: its tags are discarded and its position is kept. Exceeding the
    /// registry cap is a hard `RegistryFull` error; metrics are never
    /// silently dropped.
    pub fn add(&mut self, name: &str, host: &str, port: u16) -> MetricResult<()> {
        let mut timer = RequestTimer::begin();
        timer.set_metric_name(name)?;
        timer.set_host(host)?;
        timer.set_port(port)?;

        match self.timers.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = timer,
            None => {
                if self.timers.len() >= self.max {
                    return Err(MetricError::RegistryFull(self.max));
                }
                self.timers.push((name.to_owned(), timer));
            }
        }
        Ok(())
    }

    /// Set a tag on the metric registered under `metric`.
    ///
    /// Fails with `UnknownMetric` when the name was never registered;
    /// otherwise the tag store contract applies.
    pub fn set_tag(&mut self, metric: &str, tag: &str, value: &str) -> MetricResult<()> {
        match self.timers.iter_mut().find(|(n, _)| n == metric) {
            Some((_, timer)) => timer.set_tag(tag, value),
            None => Err(MetricError::UnknownMetric(metric.to_owned())),
        }
    }

    /// The timer registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&RequestTimer> {
        self.timers.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Currently encoded lines for all registered metrics, in registration
    /// order. Read-back for debugging; no I/O is performed.
    pub fn payloads(&self) -> Vec<String> {
        self.timers.iter().filter_map(|(_, timer)| timer.payload()).collect()
    }

    /// Finalize every registered timer: one best-effort datagram per
    /// metric. Failures are logged per metric and never propagate.
    pub fn finalize_all(&mut self) {
        for (_, timer) in &mut self.timers {
            timer.finalize();
        }
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

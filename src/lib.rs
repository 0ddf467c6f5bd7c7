// Lapse - Per-request Statsd timing instrumentation for Rust
//
// Copyright 2024-2026 The Lapse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-request Statsd timing instrumentation.
//!
//! Lapse measures the lifetime of a single request and emits it as one
//! Statsd timing metric over UDP when the request ends. It is built around
//! an explicit per-request context object instead of ambient process
//! globals: create a [`RequestTimer`] when a request starts, hand it to
//! whatever code paths need to record tags, and finalize it once when the
//! request ends.
//!
//! Delivery is fire-and-forget by design. Statsd over UDP has no
//! acknowledgement and no retry, and a dropped metric is simply lost; in
//! exchange, emitting a metric can never make the surrounding request fail.
//!
//! ## Usage
//!
//! ```no_run
//! use lapse::{RequestTimer, DEFAULT_PORT};
//!
//! // Request start: the timestamp is captured exactly once, here.
//! let mut timer = RequestTimer::begin();
//! timer.set_metric_name("request.timing").unwrap();
//! timer.set_host("metrics.example.com").unwrap();
//! timer.set_port(DEFAULT_PORT).unwrap();
//!
//! // While handling the request, record whatever dimensions matter.
//! timer.set_tag("route", "/home").unwrap();
//! timer.set_tag("status", "200").unwrap();
//!
//! // Request end: encodes `request.timing:<ms>|ms|#route:/home,status:200`
//! // and sends it as a single datagram. Transport errors are logged at
//! // WARN and swallowed.
//! timer.finalize();
//! ```
//!
//! ## Wire format
//!
//! The emitted payload is a Statsd timing line with Datadog style tags,
//! ASCII, no trailing newline, one datagram per request:
//!
//! ``` text
//! <metric_name>:<integer_duration_ms>|ms[|#<tag>:<value>[,<tag>:<value>...]]
//! ```
//!
//! The duration is truncated, never rounded, to whole milliseconds. Tags
//! appear in the order their names were first set; overwriting a tag value
//! keeps its position. Tag names and values are validated when they are set
//! (no empty names, no colons), so a malformed line can never reach the
//! wire.
//!
//! ## Testing without a network
//!
//! The transport sits behind the [`MetricSink`] trait. Tests can finalize a
//! timer into a [`SpyMetricSink`] and inspect what would have been sent:
//!
//! ```
//! use lapse::{RequestTimer, SpyMetricSink};
//!
//! let (rx, sink) = SpyMetricSink::new();
//!
//! let mut timer = RequestTimer::begin();
//! timer.set_metric_name("request.timing").unwrap();
//! timer.set_tag("route", "/home").unwrap();
//! timer.try_finalize_to(&sink).unwrap();
//!
//! let sent = String::from_utf8(rx.recv().unwrap()).unwrap();
//! assert!(sent.ends_with("|ms|#route:/home"));
//! ```
//!
//! ## Multiple metrics per request
//!
//! Hosts that emit several independently targeted metrics per request can
//! use a [`TimerRegistry`], a capped mapping from metric name to its own
//! [`RequestTimer`], each finalized independently at request end.

#![forbid(unsafe_code)]

/// Default Statsd port per the protocol convention.
pub const DEFAULT_PORT: u16 = 8125;

pub use self::registry::{TimerRegistry, DEFAULT_METRICS_MAX};
pub use self::session::RequestTimer;
pub use self::sinks::{MetricSink, NopMetricSink, SpyMetricSink, UdpTransport};
pub use self::tags::TagSet;
pub use self::types::{ErrorKind, MetricError, MetricResult};

mod encoder;
mod registry;
mod session;
mod sinks;
mod tags;
mod types;

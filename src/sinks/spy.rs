// Lapse - Per-request Statsd timing instrumentation for Rust
//
// Copyright 2024-2026 The Lapse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::sinks::core::MetricSink;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::io;

/// `MetricSink` implementation that writes all metrics to the `Sender` half
/// of a channel while callers are given ownership of the `Receiver` half.
///
/// This is not a general purpose sink, rather it's a sink meant for
/// verifying metrics written during the course of tests without a network.
/// By default the channel used is unbounded; the channel size can be limited
/// using the `with_capacity` method.
#[derive(Debug)]
pub struct SpyMetricSink {
    sender: Sender<Vec<u8>>,
}

impl SpyMetricSink {
    pub fn new() -> (Receiver<Vec<u8>>, Self) {
        Self::with_queue_capacity(None)
    }

    pub fn with_capacity(queue: usize) -> (Receiver<Vec<u8>>, Self) {
        Self::with_queue_capacity(Some(queue))
    }

    fn with_queue_capacity(queue: Option<usize>) -> (Receiver<Vec<u8>>, Self) {
        let (tx, rx) = match queue {
            Some(sz) => bounded(sz),
            None => unbounded(),
        };
        let sink = SpyMetricSink { sender: tx };
        (rx, sink)
    }
}

impl MetricSink for SpyMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        match self.sender.try_send(metric.as_bytes().to_vec()) {
            Err(TrySendError::Disconnected(_)) => {
                Err(io::Error::new(io::ErrorKind::Other, "channel disconnected"))
            }
            Err(TrySendError::Full(_)) => Err(io::Error::new(io::ErrorKind::Other, "channel full")),
            Ok(_) => Ok(metric.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricSink, SpyMetricSink};

    #[test]
    fn test_spy_metric_sink() {
        let (rx, sink) = SpyMetricSink::new();
        sink.emit("request.timing:1|ms").unwrap();

        let sent = rx.recv().unwrap();
        assert_eq!("request.timing:1|ms".as_bytes(), sent.as_slice());
    }

    #[test]
    fn test_spy_metric_sink_full_channel() {
        let (_rx, sink) = SpyMetricSink::with_capacity(1);
        sink.emit("request.timing:1|ms").unwrap();

        assert!(sink.emit("request.timing:2|ms").is_err());
    }
}

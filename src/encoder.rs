// Lapse - Per-request Statsd timing instrumentation for Rust
//
// Copyright 2024-2026 The Lapse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::tags::TagSet;
use std::fmt::Write;

/// Formatter for a single Statsd timing line.
///
/// Pure string assembly with no I/O: given a metric name, a truncated
/// millisecond duration, and a tag set, it sizes one output buffer and
/// appends each segment exactly once. The produced line carries no trailing
/// newline.
#[derive(Debug)]
pub(crate) struct TimingFormatter<'a> {
    key: &'a str,
    duration_ms: u64,
    tags: &'a TagSet,
}

impl<'a> TimingFormatter<'a> {
    const TAG_PREFIX: &'static str = "|#";

    pub(crate) fn new(key: &'a str, duration_ms: u64, tags: &'a TagSet) -> Self {
        TimingFormatter { key, duration_ms, tags }
    }

    fn size_hint(&self) -> usize {
        let base = self.key.len() + 1 /* : */ + 20 /* value */ + 1 /* | */ + 2 /* type */;
        if self.tags.is_empty() {
            return base;
        }

        // prefix, keys and values, commas
        let kv_size: usize = self.tags.iter().map(|(k, v)| k.len() + 1 + v.len()).sum();
        base + Self::TAG_PREFIX.len() + kv_size + self.tags.len() - 1
    }

    fn write_base_metric(&self, out: &mut String) {
        let _ = write!(out, "{}:{}|ms", self.key, self.duration_ms);
    }

    fn write_tags(&self, out: &mut String) {
        if !self.tags.is_empty() {
            out.push_str(Self::TAG_PREFIX);
            for (i, (key, value)) in self.tags.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(key);
                out.push(':');
                out.push_str(value);
            }
        }
    }

    pub(crate) fn format(&self) -> String {
        let mut line = String::with_capacity(self.size_hint());
        self.write_base_metric(&mut line);
        self.write_tags(&mut line);
        line
    }
}

/// Encode a timing metric as its wire-format line.
///
/// Returns `None` when no metric name is set: without a name no packet is
/// ever built or sent.
pub(crate) fn encode_timing(key: Option<&str>, duration_ms: u64, tags: &TagSet) -> Option<String> {
    key.map(|key| TimingFormatter::new(key, duration_ms, tags).format())
}

// Lapse - Per-request Statsd timing instrumentation for Rust
//
// Copyright 2024-2026 The Lapse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{MetricError, MetricResult};

/// Ordered set of key-value tags attached to a request metric.
///
/// Tag names are unique and keep the order in which they were first set:
/// setting an existing name again overwrites its value in place without
/// moving it relative to other tags.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: Vec<(String, String)>,
}

impl TagSet {
    pub fn new() -> TagSet {
        TagSet { tags: Vec::new() }
    }

    /// Insert a new tag or overwrite the value of an existing one.
    ///
    /// Tag names must be non-empty and neither names nor values may contain
    /// a colon, the Statsd field delimiter. Invalid tags are rejected here,
    /// at write time, so a malformed packet can never be produced; nothing
    /// is inserted on failure.
    pub fn set(&mut self, name: &str, value: &str) -> MetricResult<()> {
        if name.is_empty() {
            return Err(MetricError::InvalidTag("tag name cannot be empty"));
        }
        if name.contains(':') {
            return Err(MetricError::InvalidTag("tag name cannot contain colons"));
        }
        if value.contains(':') {
            return Err(MetricError::InvalidTag("tag value cannot contain colons"));
        }

        match self.tags.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.tags.push((name.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    /// Current value of the named tag, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Tags as `(name, value)` pairs in first-set order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of distinct tag names currently held.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

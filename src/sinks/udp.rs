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
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::sinks::core::MetricSink;
use crate::types::{MetricError, MetricResult};

/// Resolve a host and port to the first IPv4 address the platform resolver
/// yields.
///
/// IPv6-only hosts are rejected: the Statsd target is addressed with the
/// first IPv4 result, a documented limitation of this transport.
fn resolve_v4(host: &str, port: u16) -> MetricResult<SocketAddr> {
    if host.is_empty() {
        return Err(MetricError::Resolution("host is not set".to_owned()));
    }
    if port == 0 {
        return Err(MetricError::Resolution("port is not set".to_owned()));
    }

    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| MetricError::Resolution(format!("{}:{}: {}", host, port, e)))?;

    match addrs.find(|addr| addr.is_ipv4()) {
        Some(addr) => Ok(addr),
        None => Err(MetricError::Resolution(format!(
            "{}:{}: no IPv4 addresses yielded",
            host, port
        ))),
    }
}

/// Transport that sends a single request metric over UDP.
///
/// A transport is scoped to one finalize call: it is opened, used for
/// exactly one datagram, and closed. Sends are best effort; there is no
/// acknowledgement, no retry, and no partial-send handling.
///
/// # Example
///
/// ```no_run
/// use lapse::{UdpTransport, DEFAULT_PORT};
///
/// let transport = UdpTransport::open("metrics.example.com", DEFAULT_PORT).unwrap();
/// transport.send("request.timing:42|ms").unwrap();
/// transport.close();
/// ```
#[derive(Debug)]
pub struct UdpTransport {
    addr: SocketAddr,
    socket: UdpSocket,
}

impl UdpTransport {
    /// Resolve the target and bind a local datagram socket.
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * The host is empty, the port is zero, the hostname cannot be
    ///   resolved, or resolution yields no IPv4 address (`Resolution`).
    /// * The local datagram socket cannot be created (`Socket`).
    pub fn open(host: &str, port: u16) -> MetricResult<UdpTransport> {
        let addr = resolve_v4(host, port)?;
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(MetricError::Socket)?;
        Ok(UdpTransport { addr, socket })
    }

    /// Send one datagram carrying the given payload, returning the number
    /// of bytes written or a `Send` error if the underlying call fails.
    pub fn send(&self, payload: &str) -> MetricResult<usize> {
        self.emit(payload).map_err(MetricError::Send)
    }

    /// Release the underlying socket. Dropping the transport does the same;
    /// this method only exists to make the teardown point explicit.
    pub fn close(self) {}
}

impl MetricSink for UdpTransport {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        self.socket.send_to(metric.as_bytes(), self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_v4, UdpTransport};
    use crate::types::ErrorKind;

    #[test]
    fn test_resolve_v4_empty_host() {
        let err = resolve_v4("", 8125).unwrap_err();
        assert_eq!(ErrorKind::Resolution, err.kind());
    }

    #[test]
    fn test_resolve_v4_zero_port() {
        let err = resolve_v4("127.0.0.1", 0).unwrap_err();
        assert_eq!(ErrorKind::Resolution, err.kind());
    }

    #[test]
    fn test_resolve_v4_unresolvable_host() {
        // RFC 2606 reserves .invalid, resolvers are required to fail it
        let err = resolve_v4("statsd.invalid", 8125).unwrap_err();
        assert_eq!(ErrorKind::Resolution, err.kind());
    }

    #[test]
    fn test_resolve_v4_valid_address() {
        let addr = resolve_v4("127.0.0.1", 8125).unwrap();
        assert!(addr.is_ipv4());
        assert_eq!(8125, addr.port());
    }

    #[test]
    fn test_udp_transport_send() {
        let transport = UdpTransport::open("127.0.0.1", 8125).unwrap();
        assert_eq!(20, transport.send("request.timing:42|ms").unwrap());
        transport.close();
    }
}

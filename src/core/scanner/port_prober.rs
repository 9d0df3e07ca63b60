// src/core/scanner/port_prober.rs

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::core::models::LiveHost;

/// A single open/closed check of one port on one host.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Returns `Some(port)` if the port accepted a connection within
    /// `timeout`, `None` otherwise.
    async fn probe(&self, host: &LiveHost, port: u16, timeout: Duration) -> Option<u16>;
}

/// TCP connect probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProber;

impl TcpProber {
    /// Tries one connection attempt. The stream, if any, is dropped before
    /// returning, which closes the socket on every path.
    async fn connect(addr: SocketAddr) -> bool {
        match TcpStream::connect(addr).await {
            Ok(_stream) => true,
            Err(e) => {
                trace!(%addr, error = %e, "Connection failed.");
                false
            }
        }
    }

    /// Walks the recorded addresses in order; for hosts without any, the
    /// system resolves the name as part of the connect.
    async fn connect_any(host: &LiveHost, port: u16) -> bool {
        if host.addresses.is_empty() {
            return TcpStream::connect((host.name.as_str(), port)).await.is_ok();
        }
        for ip in &host.addresses {
            if Self::connect(SocketAddr::new(*ip, port)).await {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl Probe for TcpProber {
    /// `limit` bounds the whole probe, however many addresses the host has.
    async fn probe(&self, host: &LiveHost, port: u16, limit: Duration) -> Option<u16> {
        match timeout(limit, Self::connect_any(host, port)).await {
            Ok(open) => open.then_some(port),
            Err(_elapsed) => {
                trace!(host = %host.name, port, "Connection timed out.");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Instant;
    use tokio::net::{TcpListener, TcpSocket};

    fn loopback() -> LiveHost {
        LiveHost::new("localhost.test", vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
    }

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = TcpProber.probe(&loopback(), port, Duration::from_secs(1)).await;
        assert_eq!(result, Some(port));
    }

    #[tokio::test]
    async fn closed_port_is_absent() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = TcpProber.probe(&loopback(), port, Duration::from_secs(1)).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn second_address_is_tried_after_first_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // 127.0.0.2 is loopback on Linux but nothing listens there on this port.
        let host = LiveHost::new(
            "multi.test",
            vec![IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)), IpAddr::V4(Ipv4Addr::LOCALHOST)],
        );

        let result = TcpProber.probe(&host, port, Duration::from_secs(1)).await;
        assert_eq!(result, Some(port));
    }

    #[tokio::test]
    async fn host_without_addresses_connects_by_name() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = LiveHost::new("127.0.0.1", Vec::new());

        let result = TcpProber.probe(&host, port, Duration::from_secs(1)).await;
        assert_eq!(result, Some(port));
    }

    #[tokio::test]
    async fn each_probe_closes_its_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert_eq!(TcpProber.probe(&loopback(), port, Duration::from_secs(1)).await, Some(port));

        let (mut accepted, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1];
        // The prober already dropped its end, so the server side sees EOF.
        let read = tokio::io::AsyncReadExt::read(&mut accepted, &mut buf).await.unwrap();
        assert_eq!(read, 0);
    }

    #[tokio::test]
    async fn timeout_covers_every_address_of_a_host() {
        // A listener that never accepts and has a one-slot backlog: once the
        // queue is full, further SYNs are dropped and connects hang.
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();
        let mut held = Vec::new();
        for _ in 0..16 {
            if let Ok(Ok(stream)) = timeout(Duration::from_millis(50), TcpStream::connect(addr)).await {
                held.push(stream);
            }
        }

        let host = LiveHost::new("stalled.test", vec![IpAddr::V4(Ipv4Addr::LOCALHOST); 3]);
        let limit = Duration::from_millis(300);
        let started = Instant::now();
        TcpProber.probe(&host, addr.port(), limit).await;

        assert!(started.elapsed() < limit + Duration::from_millis(150));
        drop(held);
    }
}

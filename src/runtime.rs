//! Async runtime plumbing.
//!
//! The client runs on tokio, which reqwest requires. Everything else in the
//! crate reaches the runtime through this module: timers, task spawning, the
//! synchronization primitives guarding bridge state, and the UDP socket used
//! for SSDP discovery.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;

pub use tokio::sync::{Mutex, mpsc, oneshot};
pub use tokio::task::{JoinHandle, spawn};
pub use tokio::time::{Instant, sleep, timeout};

/// A boxed future type for object-safe async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The datagram operations discovery needs.
pub trait AsyncUdpSocket: Send + Sync + Sized {
    fn bind(addr: &str) -> impl Future<Output = io::Result<Self>> + Send;

    fn send_to(&self, buf: &[u8], addr: &str) -> impl Future<Output = io::Result<usize>> + Send;

    /// Receive one datagram and its source address.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Hop limit of outgoing multicast packets.
    fn set_multicast_ttl(&self, ttl: u32) -> io::Result<()>;
}

/// UDP socket on tokio's reactor.
#[derive(Debug)]
pub struct UdpSocket(tokio::net::UdpSocket);

impl AsyncUdpSocket for UdpSocket {
    async fn bind(addr: &str) -> io::Result<Self> {
        tokio::net::UdpSocket::bind(addr).await.map(UdpSocket)
    }

    async fn send_to(&self, buf: &[u8], addr: &str) -> io::Result<usize> {
        self.0.send_to(buf, addr).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.0.recv_from(buf).await
    }

    fn set_multicast_ttl(&self, ttl: u32) -> io::Result<()> {
        self.0.set_multicast_ttl_v4(ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_loopback() {
        let a = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b_addr = b.0.local_addr().unwrap().to_string();

        a.send_to(b"M-SEARCH", &b_addr).await.unwrap();
        let mut buf = [0u8; 16];
        let (size, from) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..size], b"M-SEARCH");
        assert_eq!(from, a.0.local_addr().unwrap());
    }
}

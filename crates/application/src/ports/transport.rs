use super::TimerToken;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub fn of(addr: &SocketAddr) -> Self {
        if addr.is_ipv4() {
            Family::V4
        } else {
            Family::V6
        }
    }
}

/// One pooled datagram socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId {
    pub family: Family,
    pub index: usize,
}

/// Byte-level I/O behind the socket pool.
///
/// Opening a socket also registers it for readability: datagrams that
/// arrive on it are fed to `Dispatcher::on_datagram` by the host loop.
pub trait DatagramTransport {
    fn open(&mut self, socket: SocketId, buffer_size: Option<usize>) -> io::Result<()>;

    fn close(&mut self, socket: SocketId);

    fn set_buffer_size(&mut self, socket: SocketId, size: usize) -> io::Result<()>;

    fn send_to(&mut self, socket: SocketId, server: SocketAddr, payload: &[u8]) -> io::Result<()>;

    /// Starts a TCP exchange whose outcome comes back through
    /// `Dispatcher::on_stream` with the same token.
    fn send_stream(
        &mut self,
        token: TimerToken,
        server: SocketAddr,
        payload: &[u8],
        timeout: Duration,
    ) -> io::Result<()>;
}

//! UDP sockets behind the resolver's socket pool (RFC 1035 §4.2.1)
//!
//! Every pooled socket is bound to an ephemeral port and gets a reader task
//! that forwards datagrams to the driver. Sends never wait: a full send
//! buffer is reported as an error and the retry timer covers the loss.
//!
//! Sockets and TCP exchanges are tied to the current tokio runtime; opening
//! one outside a runtime fails with an error instead of panicking.

use super::{tcp, Inbound};
use ferrous_resolver_application::ports::{DatagramTransport, Family, SocketId, TimerToken};
use rustc_hash::FxHashMap;
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

struct OpenSocket {
    socket: Arc<UdpSocket>,
    reader: JoinHandle<()>,
}

pub struct UdpTransport {
    sockets: FxHashMap<SocketId, OpenSocket>,
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl UdpTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Inbound>) {
        let (inbound, receiver) = mpsc::unbounded_channel();
        let transport = Self {
            sockets: FxHashMap::default(),
            inbound,
        };
        (transport, receiver)
    }

    /// Local address of an open socket.
    pub fn local_addr(&self, socket: SocketId) -> io::Result<SocketAddr> {
        self.get(socket)?.socket.local_addr()
    }

    fn get(&self, socket: SocketId) -> io::Result<&OpenSocket> {
        self.sockets.get(&socket).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("socket {:?} is not open", socket),
            )
        })
    }
}

impl DatagramTransport for UdpTransport {
    fn open(&mut self, id: SocketId, buffer_size: Option<usize>) -> io::Result<()> {
        let runtime = current_runtime()?;
        let socket = Arc::new(create_socket(id.family, buffer_size)?);
        let local = socket.local_addr()?;
        let reader = runtime.spawn(read_loop(id, socket.clone(), self.inbound.clone()));

        if let Some(previous) = self.sockets.insert(id, OpenSocket { socket, reader }) {
            previous.reader.abort();
        }
        debug!(socket = id.index, local = %local, "Created UDP socket");
        Ok(())
    }

    fn close(&mut self, id: SocketId) {
        if let Some(open) = self.sockets.remove(&id) {
            open.reader.abort();
            debug!(socket = id.index, family = ?id.family, "Closed UDP socket");
        }
    }

    fn set_buffer_size(&mut self, id: SocketId, size: usize) -> io::Result<()> {
        let open = self.get(id)?;
        let socket = SockRef::from(&*open.socket);
        socket.set_recv_buffer_size(size)?;
        socket.set_send_buffer_size(size)
    }

    fn send_to(&mut self, id: SocketId, server: SocketAddr, payload: &[u8]) -> io::Result<()> {
        // Straight to the kernel: a freshly registered socket has no write
        // readiness recorded yet and `try_send_to` would report WouldBlock.
        let open = self.get(id)?;
        let bytes_sent = SockRef::from(&*open.socket).send_to(payload, &server.into())?;
        debug!(server = %server, bytes_sent = bytes_sent, "UDP query sent");
        Ok(())
    }

    fn send_stream(
        &mut self,
        token: TimerToken,
        server: SocketAddr,
        payload: &[u8],
        timeout: Duration,
    ) -> io::Result<()> {
        let runtime = current_runtime()?;
        let inbound = self.inbound.clone();
        let payload = payload.to_vec();
        runtime.spawn(async move {
            let result = tcp::exchange(server, &payload, timeout).await;
            let _ = inbound.send(Inbound::Stream { token, result });
        });
        Ok(())
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        for (_, open) in self.sockets.drain() {
            open.reader.abort();
        }
    }
}

fn current_runtime() -> io::Result<Handle> {
    Handle::try_current().map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Creates a non-blocking UDP socket on an ephemeral port.
pub fn create_socket(family: Family, buffer_size: Option<usize>) -> io::Result<UdpSocket> {
    let (domain, bind_addr) = match family {
        Family::V4 => (
            Domain::IPV4,
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        ),
        Family::V6 => (
            Domain::IPV6,
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        ),
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if family == Family::V6 {
        socket.set_only_v6(true)?;
    }
    if let Some(size) = buffer_size {
        socket.set_recv_buffer_size(size)?;
        socket.set_send_buffer_size(size)?;
    }

    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

async fn read_loop(
    id: SocketId,
    socket: Arc<UdpSocket>,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];

    loop {
        match socket.recv_from(&mut recv_buf).await {
            Ok((bytes_received, from)) => {
                let datagram = Inbound::Datagram {
                    socket: id,
                    from,
                    payload: recv_buf[..bytes_received].to_vec(),
                };
                if inbound.send(datagram).is_err() {
                    break;
                }
            }
            // ICMP errors for an earlier send surface here on some platforms.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
                ) =>
            {
                debug!(socket = id.index, error = %e, "Ignoring ICMP error on UDP socket");
            }
            Err(e) => {
                warn!(socket = id.index, error = %e, "UDP receive failed, reader stopped");
                break;
            }
        }
    }
}

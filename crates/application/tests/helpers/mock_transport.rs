use super::SentQuery;
use ferrous_resolver_application::ports::{DatagramTransport, SocketId, TimerToken};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SentDatagram {
    pub socket: SocketId,
    pub server: SocketAddr,
    pub payload: Vec<u8>,
}

impl SentDatagram {
    pub fn query(&self) -> SentQuery {
        SentQuery::parse(&self.payload)
    }
}

#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub token: TimerToken,
    pub server: SocketAddr,
    pub payload: Vec<u8>,
    pub timeout: Duration,
}

/// Records every call; sends always succeed unless told otherwise.
#[derive(Default)]
pub struct MockTransport {
    pub opened: Vec<SocketId>,
    pub closed: Vec<SocketId>,
    pub sent: Vec<SentDatagram>,
    pub streams: Vec<StreamRequest>,
    pub buffer_sizes: Vec<(SocketId, usize)>,
    pub open_buffer_sizes: Vec<Option<usize>>,
    pub fail_open: bool,
    pub fail_stream: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn servers(&self) -> Vec<SocketAddr> {
        self.sent.iter().map(|s| s.server).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.sent.iter().map(|s| s.query().name).collect()
    }
}

impl DatagramTransport for MockTransport {
    fn open(&mut self, socket: SocketId, buffer_size: Option<usize>) -> io::Result<()> {
        if self.fail_open {
            return Err(io::Error::new(io::ErrorKind::AddrInUse, "no ports left"));
        }
        self.opened.push(socket);
        self.open_buffer_sizes.push(buffer_size);
        Ok(())
    }

    fn close(&mut self, socket: SocketId) {
        self.closed.push(socket);
    }

    fn set_buffer_size(&mut self, socket: SocketId, size: usize) -> io::Result<()> {
        self.buffer_sizes.push((socket, size));
        Ok(())
    }

    fn send_to(&mut self, socket: SocketId, server: SocketAddr, payload: &[u8]) -> io::Result<()> {
        self.sent.push(SentDatagram {
            socket,
            server,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn send_stream(
        &mut self,
        token: TimerToken,
        server: SocketAddr,
        payload: &[u8],
        timeout: Duration,
    ) -> io::Result<()> {
        if self.fail_stream {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }
        self.streams.push(StreamRequest {
            token,
            server,
            payload: payload.to_vec(),
            timeout,
        });
        Ok(())
    }
}

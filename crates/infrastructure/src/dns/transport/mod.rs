pub mod tcp;
pub mod udp;

use ferrous_resolver_application::ports::{SocketId, TimerToken};
use std::io;
use std::net::SocketAddr;

pub use udp::UdpTransport;

/// I/O completions handed from the socket tasks back to the driver.
#[derive(Debug)]
pub enum Inbound {
    Datagram {
        socket: SocketId,
        from: SocketAddr,
        payload: Vec<u8>,
    },
    Stream {
        token: TimerToken,
        result: io::Result<Vec<u8>>,
    },
}

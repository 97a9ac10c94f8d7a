mod event_loop;
mod handler;
mod transport;
mod wire_codec;

pub use event_loop::{EventLoop, TimerToken};
pub use handler::{Callbacks, Handler};
pub use transport::{DatagramTransport, Family, SocketId};
pub use wire_codec::{ParsedResponse, ResponseClass, WireCodec};

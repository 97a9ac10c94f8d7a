pub mod event_loop;
pub mod resolver;
pub mod transport;
pub mod wire;

pub use event_loop::TokioLoop;
pub use resolver::{LookupError, Resolver, TokioDispatcher};
pub use transport::{Inbound, UdpTransport};
pub use wire::HickoryCodec;

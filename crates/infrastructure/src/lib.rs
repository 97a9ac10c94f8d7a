//! Ferrous Resolver Infrastructure Layer
pub mod dns;
pub mod system;

pub use dns::{HickoryCodec, LookupError, Resolver, TokioLoop, UdpTransport};
pub use system::ResolvConf;

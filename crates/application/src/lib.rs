pub mod ports;
pub mod resolver;

pub use ports::{Callbacks, Handler};
pub use resolver::{Dispatcher, OperationHandle, OperationState, Settings};

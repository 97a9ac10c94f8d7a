mod dispatcher;
mod nameservers;
mod operation;
mod search;
mod settings;
mod socket_pool;
mod suffix;

pub use dispatcher::Dispatcher;
pub use nameservers::NameserverSet;
pub use operation::{Expiry, OperationHandle, OperationId, OperationState, RetryScheduler};
pub use settings::{Settings, MAX_CAPACITY, MAX_DURATION, MIN_DURATION};
pub use socket_pool::{Acquired, SocketPool, REFRESH_AFTER};
pub use suffix::SuffixPolicy;

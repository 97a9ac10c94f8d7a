use crate::resolver::OperationId;
use std::time::{Duration, Instant};

/// Identifies one armed timer (or one stream exchange) of one operation.
///
/// The generation changes on every attempt, so an event carrying an older
/// token is recognised as stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub operation: OperationId,
    pub generation: u32,
}

/// Timer and scheduling primitives the engine needs from its host loop.
///
/// Expired timers are reported back through `Dispatcher::on_timer`, a
/// scheduled tick through `Dispatcher::on_tick`.
pub trait EventLoop {
    fn now(&self) -> Instant;

    fn start_timer(&mut self, after: Duration, token: TimerToken);

    /// Must tolerate tokens that already fired or were never started.
    fn cancel_timer(&mut self, token: TimerToken);

    /// Requests one `on_tick` call on the next loop iteration. Repeated
    /// requests before the tick runs collapse into one.
    fn schedule_tick(&mut self);
}

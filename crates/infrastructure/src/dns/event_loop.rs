use ferrous_resolver_application::ports::{EventLoop, TimerToken};
use rustc_hash::FxHashMap;
use std::future::poll_fn;
use std::task::Poll;
use std::time::{Duration, Instant};
use tokio_util::time::delay_queue::{DelayQueue, Key};

/// Timer wheel and next-tick flag on top of the tokio clock.
///
/// The clock is tokio's, so paused-time tests drive the resolver too.
#[derive(Default)]
pub struct TokioLoop {
    timers: DelayQueue<TimerToken>,
    keys: FxHashMap<TimerToken, Key>,
    tick: bool,
}

impl TokioLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed(&self) -> usize {
        self.keys.len()
    }

    /// Clears and returns the pending tick request.
    pub fn take_tick(&mut self) -> bool {
        std::mem::take(&mut self.tick)
    }

    /// Waits for the next timer to expire. Never resolves while no timer is
    /// armed, so callers select it against other event sources.
    pub async fn next_timer(&mut self) -> TimerToken {
        poll_fn(|cx| match self.timers.poll_expired(cx) {
            Poll::Ready(Some(expired)) => {
                let token = expired.into_inner();
                self.keys.remove(&token);
                Poll::Ready(token)
            }
            Poll::Ready(None) | Poll::Pending => Poll::Pending,
        })
        .await
    }
}

impl EventLoop for TokioLoop {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn start_timer(&mut self, after: Duration, token: TimerToken) {
        let key = self.timers.insert(token, after);
        if let Some(previous) = self.keys.insert(token, key) {
            self.timers.remove(&previous);
        }
    }

    fn cancel_timer(&mut self, token: TimerToken) {
        if let Some(key) = self.keys.remove(&token) {
            self.timers.remove(&key);
        }
    }

    fn schedule_tick(&mut self) {
        self.tick = true;
    }
}

use ferrous_resolver_application::ports::{EventLoop, TimerToken};
use std::time::{Duration, Instant};

/// Manual clock with a timer list. Nothing fires unless the test says so.
pub struct MockLoop {
    now: Instant,
    timers: Vec<(Instant, TimerToken)>,
    tick: bool,
    pub tick_requests: usize,
    pub cancelled: usize,
}

impl MockLoop {
    pub fn new() -> Self {
        Self {
            now: Instant::now(),
            timers: Vec::new(),
            tick: false,
            tick_requests: 0,
            cancelled: 0,
        }
    }

    pub fn set_now(&mut self, now: Instant) {
        self.now = now;
    }

    pub fn armed(&self) -> usize {
        self.timers.len()
    }

    /// Delay of the only armed timer, relative to the current clock.
    pub fn armed_delay(&self) -> Option<Duration> {
        self.timers
            .iter()
            .map(|(at, _)| at.saturating_duration_since(self.now))
            .min()
    }

    pub fn take_tick(&mut self) -> bool {
        std::mem::take(&mut self.tick)
    }

    /// Removes the earliest timer due at or before `limit`, moving the clock
    /// to its deadline.
    pub fn fire_next(&mut self, limit: Instant) -> Option<TimerToken> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, (at, _))| *at <= limit)
            .min_by_key(|(_, (at, _))| *at)
            .map(|(index, _)| index)?;
        let (at, token) = self.timers.remove(index);
        self.now = self.now.max(at);
        Some(token)
    }
}

impl EventLoop for MockLoop {
    fn now(&self) -> Instant {
        self.now
    }

    fn start_timer(&mut self, after: Duration, token: TimerToken) {
        self.timers.push((self.now + after, token));
    }

    fn cancel_timer(&mut self, token: TimerToken) {
        let before = self.timers.len();
        self.timers.retain(|(_, armed)| *armed != token);
        self.cancelled += before - self.timers.len();
    }

    fn schedule_tick(&mut self) {
        self.tick = true;
        self.tick_requests += 1;
    }
}

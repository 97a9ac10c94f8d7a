use ferrous_resolver_domain::{Bits, ResolverConfig};
use std::time::Duration;

/// Smallest accepted timeout and resend interval.
pub const MIN_DURATION: Duration = Duration::from_millis(100);

/// Transaction ids are 16 bits wide, so no more operations can be in flight.
pub const MAX_CAPACITY: usize = u16::MAX as usize;

/// Upper bound keeping deadlines representable by any timer wheel.
pub const MAX_DURATION: Duration = Duration::from_secs(86_400);

/// Engine-wide query policy.
///
/// Every setter clamps to the engine's minimum, so a `Settings` value is
/// always usable as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    timeout: Duration,
    interval: Duration,
    attempts: usize,
    rotate: bool,
    ndots: u8,
    capacity: usize,
    maxcalls: usize,
    sockets: usize,
    buffer_size: Option<usize>,
    bits: Bits,
    search: Vec<String>,
}

impl Settings {
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut settings = Self::default();
        settings.set_timeout(config.timeout);
        settings.set_interval(config.interval);
        settings.set_attempts(config.attempts);
        settings.set_rotate(config.rotate);
        settings.set_ndots(config.ndots);
        settings.set_capacity(config.capacity);
        settings.set_maxcalls(config.maxcalls);
        settings.set_sockets(config.sockets);
        settings.set_buffer_size(config.buffer_size);
        settings.set_bits(config.bits);
        settings.set_search(config.search.clone());
        settings
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn rotate(&self) -> bool {
        self.rotate
    }

    pub fn ndots(&self) -> u8 {
        self.ndots
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn maxcalls(&self) -> usize {
        self.maxcalls
    }

    pub fn sockets(&self) -> usize {
        self.sockets
    }

    pub fn buffer_size(&self) -> Option<usize> {
        self.buffer_size
    }

    pub fn bits(&self) -> Bits {
        self.bits
    }

    pub fn search(&self) -> &[String] {
        &self.search
    }

    /// Overall ceiling for one operation, in seconds.
    pub fn set_timeout(&mut self, seconds: f64) {
        self.timeout = clamp_seconds(seconds);
    }

    /// Delay before a datagram is sent again, in seconds.
    pub fn set_interval(&mut self, seconds: f64) {
        self.interval = clamp_seconds(seconds);
    }

    pub fn set_attempts(&mut self, attempts: usize) {
        self.attempts = attempts.max(1);
    }

    pub fn set_rotate(&mut self, rotate: bool) {
        self.rotate = rotate;
    }

    pub fn set_ndots(&mut self, ndots: u8) {
        self.ndots = ndots;
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.clamp(1, MAX_CAPACITY);
    }

    pub fn set_maxcalls(&mut self, maxcalls: usize) {
        self.maxcalls = maxcalls.max(1);
    }

    /// The socket count only grows.
    pub fn set_sockets(&mut self, count: usize) {
        self.sockets = self.sockets.max(count).max(1);
    }

    pub fn set_buffer_size(&mut self, size: Option<usize>) {
        self.buffer_size = size.filter(|s| *s > 0);
    }

    pub fn set_bits(&mut self, bits: Bits) {
        self.bits = bits;
    }

    /// Empty entries and surrounding dots are dropped.
    pub fn set_search(&mut self, search: Vec<String>) {
        self.search = search
            .into_iter()
            .map(|s| s.trim().trim_matches('.').to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::from_secs(2),
            attempts: 5,
            rotate: false,
            ndots: 1,
            capacity: 1000,
            maxcalls: 64,
            sockets: 1,
            buffer_size: None,
            bits: Bits::default(),
            search: vec![],
        }
    }
}

fn clamp_seconds(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return MIN_DURATION;
    }
    Duration::try_from_secs_f64(seconds)
        .unwrap_or(MAX_DURATION)
        .clamp(MIN_DURATION, MAX_DURATION)
}

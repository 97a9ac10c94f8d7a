use smallvec::SmallVec;
use std::net::{IpAddr, SocketAddr};

use ferrous_resolver_domain::config::DEFAULT_DNS_PORT;

/// Ordered upstream servers plus the rotation cursor for new queries.
#[derive(Debug, Clone, Default)]
pub struct NameserverSet {
    servers: SmallVec<[SocketAddr; 4]>,
    cursor: usize,
}

impl NameserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, server: SocketAddr) {
        self.servers.push(server);
    }

    pub fn add_ip(&mut self, ip: IpAddr) {
        self.add(SocketAddr::new(ip, DEFAULT_DNS_PORT));
    }

    pub fn clear(&mut self) {
        self.servers.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SocketAddr> {
        self.servers.iter()
    }

    pub fn ipv4(&self) -> impl Iterator<Item = &SocketAddr> {
        self.servers.iter().filter(|s| s.is_ipv4())
    }

    pub fn ipv6(&self) -> impl Iterator<Item = &SocketAddr> {
        self.servers.iter().filter(|s| s.is_ipv6())
    }

    /// Position a newly dispatched query starts at. With `rotate` the
    /// cursor advances once per call; retries never call this.
    pub fn start_index(&mut self, rotate: bool) -> usize {
        if !rotate || self.servers.is_empty() {
            return 0;
        }
        let index = self.cursor % self.servers.len();
        self.cursor = (index + 1) % self.servers.len();
        index
    }

    /// Server for attempt `attempt` (0-based) of a query that started at
    /// `start`. Consecutive attempts hit consecutive servers.
    pub fn server_for(&self, start: usize, attempt: usize) -> Option<SocketAddr> {
        if self.servers.is_empty() {
            return None;
        }
        Some(self.servers[(start + attempt) % self.servers.len()])
    }
}

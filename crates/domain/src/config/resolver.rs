use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use super::errors::ConfigError;
use crate::Bits;

pub const DEFAULT_DNS_PORT: u16 = 53;

/// Resolver policy as written in the config file.
///
/// Times are in seconds. Values are stored as written; clamping to the
/// engine's minimums happens when the engine settings are built.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub nameservers: Vec<String>,

    #[serde(default)]
    pub search: Vec<String>,

    #[serde(default = "default_timeout")]
    pub timeout: f64,

    #[serde(default = "default_interval")]
    pub interval: f64,

    #[serde(default = "default_attempts")]
    pub attempts: usize,

    #[serde(default)]
    pub rotate: bool,

    #[serde(default = "default_ndots")]
    pub ndots: u8,

    #[serde(default = "default_capacity")]
    pub capacity: usize,

    #[serde(default = "default_maxcalls")]
    pub maxcalls: usize,

    #[serde(default = "default_sockets")]
    pub sockets: usize,

    #[serde(default)]
    pub buffer_size: Option<usize>,

    #[serde(default)]
    pub bits: Bits,

    /// Merge `/etc/resolv.conf` underneath this section.
    #[serde(default = "default_true")]
    pub use_system: bool,
}

impl ResolverConfig {
    /// Parses every `nameservers` entry.
    pub fn nameserver_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.nameservers
            .iter()
            .map(|s| parse_nameserver(s))
            .collect()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: vec![],
            search: vec![],
            timeout: default_timeout(),
            interval: default_interval(),
            attempts: default_attempts(),
            rotate: false,
            ndots: default_ndots(),
            capacity: default_capacity(),
            maxcalls: default_maxcalls(),
            sockets: default_sockets(),
            buffer_size: None,
            bits: Bits::default(),
            use_system: true,
        }
    }
}

/// Accepts `192.0.2.1`, `192.0.2.1:5353`, `2001:db8::1` and `[2001:db8::1]:5353`.
pub fn parse_nameserver(value: &str) -> Result<SocketAddr, ConfigError> {
    let value = value.trim();

    if let Ok(ip) = value.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_DNS_PORT));
    }

    value
        .parse::<SocketAddr>()
        .map_err(|_| ConfigError::Validation(format!("Invalid nameserver address: {}", value)))
}

fn default_timeout() -> f64 {
    10.0
}

fn default_interval() -> f64 {
    2.0
}

fn default_attempts() -> usize {
    5
}

fn default_ndots() -> u8 {
    1
}

fn default_capacity() -> usize {
    1000
}

fn default_maxcalls() -> usize {
    64
}

fn default_sockets() -> usize {
    1
}

fn default_true() -> bool {
    true
}

use ferrous_resolver_domain::config::DEFAULT_DNS_PORT;
use ferrous_resolver_domain::{ConfigError, ResolverConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use tracing::{debug, warn};

pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

const MAX_NDOTS: u8 = 15;
const MAX_ATTEMPTS: usize = 5;
const MAX_TIMEOUT_SECS: u64 = 30;

/// The parts of resolv.conf(5) the resolver understands.
///
/// `timeout` is the per-try wait, so it maps onto the resend interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvConf {
    pub nameservers: Vec<SocketAddr>,
    pub search: Vec<String>,
    pub ndots: Option<u8>,
    pub timeout: Option<u64>,
    pub attempts: Option<usize>,
    pub rotate: bool,
}

impl ResolvConf {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        let conf = Self::parse(&content);
        debug!(
            path = %path.display(),
            nameservers = conf.nameservers.len(),
            search = conf.search.len(),
            "Loaded system resolver configuration"
        );
        Ok(conf)
    }

    /// Unknown keywords and malformed values are skipped, like the C
    /// library does.
    pub fn parse(content: &str) -> Self {
        let mut conf = Self::default();

        for line in content.lines() {
            let line = match line.find(['#', ';']) {
                Some(pos) => &line[..pos],
                None => line,
            };
            let mut fields = line.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };

            match keyword {
                "nameserver" => {
                    let Some(value) = fields.next() else { continue };
                    // Scoped link-local addresses cannot be expressed as SocketAddr.
                    if value.contains('%') {
                        debug!(nameserver = value, "Skipping scoped nameserver");
                        continue;
                    }
                    match value.parse::<IpAddr>() {
                        Ok(ip) => conf
                            .nameservers
                            .push(SocketAddr::new(ip, DEFAULT_DNS_PORT)),
                        Err(_) => warn!(nameserver = value, "Invalid nameserver in resolv.conf"),
                    }
                }
                // `domain` and `search` override each other; the last one wins.
                "domain" => {
                    conf.search = fields.next().map(suffix).into_iter().collect();
                }
                "search" => {
                    conf.search = fields.map(suffix).collect();
                }
                "options" => {
                    for option in fields {
                        conf.apply_option(option);
                    }
                }
                _ => {}
            }
        }

        conf.search.retain(|s| !s.is_empty());
        conf
    }

    fn apply_option(&mut self, option: &str) {
        let (name, value) = match option.split_once(':') {
            Some((name, value)) => (name, Some(value)),
            None => (option, None),
        };

        match (name, value) {
            ("ndots", Some(v)) => {
                if let Ok(n) = v.parse::<u32>() {
                    self.ndots = Some(n.min(u32::from(MAX_NDOTS)) as u8);
                }
            }
            ("timeout", Some(v)) => {
                if let Ok(n) = v.parse::<u64>() {
                    self.timeout = Some(n.clamp(1, MAX_TIMEOUT_SECS));
                }
            }
            ("attempts", Some(v)) => {
                if let Ok(n) = v.parse::<usize>() {
                    self.attempts = Some(n.clamp(1, MAX_ATTEMPTS));
                }
            }
            ("rotate", None) => self.rotate = true,
            _ => {}
        }
    }

    /// Fills in what the explicit configuration left unset.
    ///
    /// Lists count as unset when empty, scalars when they still hold their
    /// default value.
    pub fn merge_into(&self, config: &mut ResolverConfig) {
        let defaults = ResolverConfig::default();

        if config.nameservers.is_empty() {
            config.nameservers = self.nameservers.iter().map(|s| s.to_string()).collect();
        }
        if config.search.is_empty() {
            config.search = self.search.clone();
        }
        if let Some(ndots) = self.ndots {
            if config.ndots == defaults.ndots {
                config.ndots = ndots;
            }
        }
        if let Some(timeout) = self.timeout {
            if config.interval == defaults.interval {
                config.interval = timeout as f64;
            }
        }
        if let Some(attempts) = self.attempts {
            if config.attempts == defaults.attempts {
                config.attempts = attempts;
            }
        }
        if self.rotate {
            config.rotate = true;
        }
    }
}

fn suffix(value: &str) -> String {
    value.trim_end_matches('.').to_string()
}

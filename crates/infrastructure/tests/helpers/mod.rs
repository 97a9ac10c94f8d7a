#![allow(dead_code)]
pub mod dns_server_mock;

pub use dns_server_mock::{build_response, Behavior, MockDnsServer};

use ferrous_resolver_application::Settings;
use ferrous_resolver_infrastructure::Resolver;
use std::net::SocketAddr;

/// Resolver with short timers pointed at the given servers only.
pub fn resolver(servers: &[SocketAddr], timeout: f64, interval: f64) -> Resolver {
    let mut settings = Settings::default();
    settings.set_timeout(timeout);
    settings.set_interval(interval);

    let mut resolver = Resolver::new(settings);
    for server in servers {
        resolver.dispatcher_mut().add_nameserver(*server);
    }
    resolver
}

#![allow(dead_code)]

mod mock_codec;
mod mock_event_loop;
mod mock_transport;
mod recorder;

pub use mock_codec::{MockCodec, Reply, SentQuery};
pub use mock_event_loop::MockLoop;
pub use mock_transport::{MockTransport, SentDatagram, StreamRequest};
pub use recorder::Recorder;

use ferrous_resolver_application::ports::{EventLoop, SocketId};
use ferrous_resolver_application::{Dispatcher, Settings};
use std::net::SocketAddr;
use std::time::Duration;

pub type TestDispatcher = Dispatcher<MockLoop, MockCodec, MockTransport>;

pub const NS1: &str = "192.0.2.1:53";
pub const NS2: &str = "192.0.2.2:53";
pub const NS3: &str = "192.0.2.3:53";

pub fn addr(value: &str) -> SocketAddr {
    value.parse().unwrap()
}

pub fn settings(timeout: f64, interval: f64, attempts: usize) -> Settings {
    let mut settings = Settings::default();
    settings.set_timeout(timeout);
    settings.set_interval(interval);
    settings.set_attempts(attempts);
    settings
}

pub fn dispatcher_with(settings: Settings, servers: &[&str]) -> TestDispatcher {
    let mut dispatcher = Dispatcher::new(
        MockLoop::new(),
        MockCodec,
        MockTransport::new(),
        settings,
    );
    for server in servers {
        dispatcher.add_nameserver(addr(server));
    }
    dispatcher
}

pub fn dispatcher(servers: &[&str]) -> TestDispatcher {
    dispatcher_with(settings(10.0, 1.0, 3), servers)
}

/// Runs one scheduled tick, if any. Returns whether a tick ran.
pub fn tick(dispatcher: &mut TestDispatcher) -> bool {
    if dispatcher.event_loop_mut().take_tick() {
        dispatcher.on_tick();
        true
    } else {
        false
    }
}

pub fn run_ticks(dispatcher: &mut TestDispatcher) {
    while tick(dispatcher) {}
}

/// Moves the clock forward, firing every timer that falls due on the way
/// in deadline order and running ticks in between.
pub fn advance(dispatcher: &mut TestDispatcher, by: Duration) {
    let target = dispatcher.event_loop().now() + by;
    loop {
        run_ticks(dispatcher);
        let Some(token) = dispatcher.event_loop_mut().fire_next(target) else {
            break;
        };
        dispatcher.on_timer(token);
    }
    dispatcher.event_loop_mut().set_now(target);
    run_ticks(dispatcher);
}

/// Delivers a reply on the socket the query went out on.
pub fn respond(dispatcher: &mut TestDispatcher, sent: &SentDatagram, reply: Reply) {
    let payload = reply.encode();
    dispatcher.on_datagram(sent.socket, sent.server, &payload);
}

pub fn last_sent(dispatcher: &TestDispatcher) -> SentDatagram {
    dispatcher.transport().sent.last().cloned().unwrap()
}

pub fn socket_of(dispatcher: &TestDispatcher) -> SocketId {
    last_sent(dispatcher).socket
}

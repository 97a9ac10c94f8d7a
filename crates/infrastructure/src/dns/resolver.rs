//! Tokio host loop for the dispatcher.
//!
//! The dispatcher is single-threaded and never awaits; [`Resolver::turn`]
//! waits for exactly one event (an expired timer, an inbound datagram, a
//! finished TCP exchange or a pending tick) and feeds it in.

use super::event_loop::TokioLoop;
use super::transport::{Inbound, UdpTransport};
use super::wire::HickoryCodec;
use crate::system::{ResolvConf, RESOLV_CONF_PATH};
use ferrous_resolver_application::ports::TimerToken;
use ferrous_resolver_application::{Callbacks, Dispatcher, Handler, OperationHandle, Settings};
use ferrous_resolver_domain::{
    ConfigError, DomainError, RecordType, ResolveError, ResolverConfig, Response,
};
use std::cell::RefCell;
use std::net::IpAddr;
use std::rc::Rc;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub type TokioDispatcher = Dispatcher<TokioLoop, HickoryCodec, UdpTransport>;

/// Why [`Resolver::resolve`] produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error(transparent)]
    Failed(#[from] ResolveError),
}

enum Event {
    Timer(TimerToken),
    Inbound(Inbound),
}

pub struct Resolver {
    dispatcher: TokioDispatcher,
    inbound: mpsc::UnboundedReceiver<Inbound>,
}

impl Resolver {
    /// A resolver with no nameservers; add some through
    /// [`Resolver::dispatcher_mut`] before querying.
    pub fn new(settings: Settings) -> Self {
        let (transport, inbound) = UdpTransport::new();
        let dispatcher = Dispatcher::new(TokioLoop::new(), HickoryCodec, transport, settings);
        Self {
            dispatcher,
            inbound,
        }
    }

    /// Builds a resolver from the `[resolver]` section, with the system
    /// resolv.conf merged underneath when `use_system` is set.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        let mut config = config.clone();
        if config.use_system {
            match ResolvConf::load(RESOLV_CONF_PATH) {
                Ok(system) => system.merge_into(&mut config),
                Err(e) => debug!(error = %e, "System resolver configuration not used"),
            }
        }

        let nameservers = config.nameserver_addrs()?;
        let mut resolver = Self::new(Settings::from_config(&config));
        for server in nameservers {
            resolver.dispatcher.add_nameserver(server);
        }

        info!(
            nameservers = resolver.dispatcher.nameservers().len(),
            search = config.search.len(),
            "Resolver initialized"
        );
        Ok(resolver)
    }

    pub fn dispatcher(&self) -> &TokioDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut TokioDispatcher {
        &mut self.dispatcher
    }

    /// Starts a lookup. Must run inside a tokio runtime: the first send opens
    /// a pooled socket whose reader task and timers live on it.
    pub fn query<H>(
        &mut self,
        domain: &str,
        record_type: RecordType,
        handler: H,
    ) -> Result<OperationHandle, DomainError>
    where
        H: Handler + 'static,
    {
        self.dispatcher.query(domain, record_type, handler)
    }

    /// PTR lookup for `ip`. Same runtime requirement as [`Resolver::query`].
    pub fn reverse<H>(&mut self, ip: IpAddr, handler: H) -> Result<OperationHandle, DomainError>
    where
        H: Handler + 'static,
    {
        self.dispatcher.reverse(ip, handler)
    }

    pub fn cancel(&mut self, handle: OperationHandle) {
        self.dispatcher.cancel(handle)
    }

    /// Processes one event. Returns `false` once there is nothing left to
    /// wait for.
    pub async fn turn(&mut self) -> bool {
        if self.dispatcher.event_loop_mut().take_tick() {
            self.dispatcher.on_tick();
            // Lets other tasks run between delivery batches.
            tokio::task::yield_now().await;
            return true;
        }
        if self.dispatcher.is_idle() {
            return false;
        }

        let event = tokio::select! {
            token = self.dispatcher.event_loop_mut().next_timer() => Event::Timer(token),
            inbound = self.inbound.recv() => match inbound {
                Some(inbound) => Event::Inbound(inbound),
                None => return false,
            },
        };

        match event {
            Event::Timer(token) => self.dispatcher.on_timer(token),
            Event::Inbound(Inbound::Datagram {
                socket,
                from,
                payload,
            }) => self.dispatcher.on_datagram(socket, from, &payload),
            Event::Inbound(Inbound::Stream { token, result }) => {
                self.dispatcher.on_stream(token, result)
            }
        }
        true
    }

    /// Drives the dispatcher until every submitted lookup has been delivered
    /// or cancelled.
    pub async fn run_until_idle(&mut self) {
        while self.turn().await {}
    }

    /// Single lookup, awaited to completion.
    ///
    /// Other lookups already in flight make progress while this one waits.
    pub async fn resolve(
        &mut self,
        domain: &str,
        record_type: RecordType,
    ) -> Result<Response, LookupError> {
        let outcome: Rc<RefCell<Option<Result<Response, ResolveError>>>> = Rc::default();
        let on_success = outcome.clone();
        let on_failure = outcome.clone();

        self.dispatcher.query(
            domain,
            record_type,
            Callbacks::new(
                move |response| *on_success.borrow_mut() = Some(Ok(response)),
                move |error| *on_failure.borrow_mut() = Some(Err(error)),
            ),
        )?;

        while outcome.borrow().is_none() {
            if !self.turn().await {
                break;
            }
        }

        let result = outcome.borrow_mut().take();
        match result {
            Some(result) => Ok(result?),
            None => Err(LookupError::Failed(ResolveError::Timeout)),
        }
    }
}

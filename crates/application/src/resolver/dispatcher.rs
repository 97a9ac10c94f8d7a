use std::collections::hash_map::Entry;
use std::collections::VecDeque;
use std::io;
use std::net::{IpAddr, SocketAddr};

use ferrous_resolver_domain::{
    domain_name, Bits, DomainError, Query, RecordType, ResolveError, Response,
};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use super::nameservers::NameserverSet;
use super::operation::{
    Expiry, Operation, OperationHandle, OperationId, OperationState, RetryScheduler,
};
use super::search::{Completion, Next};
use super::settings::Settings;
use super::socket_pool::SocketPool;
use super::suffix::SuffixPolicy;
use crate::ports::{
    DatagramTransport, EventLoop, Family, Handler, ParsedResponse, ResponseClass, SocketId,
    TimerToken, WireCodec,
};

/// Owns every in-flight lookup of one resolver context.
///
/// The dispatcher never blocks and never performs I/O of its own: the host
/// loop feeds it timer expiries, datagrams, stream results and ticks, and it
/// answers by arming timers and asking the transport to send. Handlers only
/// run from [`Dispatcher::on_tick`], at most `maxcalls` of them per tick.
pub struct Dispatcher<L, C, T> {
    event_loop: L,
    codec: C,
    transport: T,
    settings: Settings,
    nameservers: NameserverSet,
    ipv4: SocketPool,
    ipv6: SocketPool,
    operations: SlotMap<OperationId, Operation>,
    /// Operations waiting for a capacity slot, oldest first.
    queue: VecDeque<OperationId>,
    /// Operations in `Sent` or `Streaming`.
    active: usize,
    transactions: FxHashMap<u16, OperationId>,
    /// Terminal operations whose handler has not run yet.
    ready: VecDeque<OperationId>,
    tick_scheduled: bool,
}

impl<L, C, T> Dispatcher<L, C, T>
where
    L: EventLoop,
    C: WireCodec,
    T: DatagramTransport,
{
    pub fn new(event_loop: L, codec: C, transport: T, settings: Settings) -> Self {
        let sockets = settings.sockets();
        Self {
            event_loop,
            codec,
            transport,
            settings,
            nameservers: NameserverSet::new(),
            ipv4: SocketPool::new(Family::V4, sockets),
            ipv6: SocketPool::new(Family::V6, sockets),
            operations: SlotMap::with_key(),
            queue: VecDeque::new(),
            active: 0,
            transactions: FxHashMap::default(),
            ready: VecDeque::new(),
            tick_scheduled: false,
        }
    }

    pub fn event_loop(&self) -> &L {
        &self.event_loop
    }

    pub fn event_loop_mut(&mut self) -> &mut L {
        &mut self.event_loop
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn nameservers(&self) -> &NameserverSet {
        &self.nameservers
    }

    pub fn pool(&self, family: Family) -> &SocketPool {
        match family {
            Family::V4 => &self.ipv4,
            Family::V6 => &self.ipv6,
        }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Starts a lookup with the context's default header bits.
    ///
    /// Errors are returned before anything is queued; the handler is then
    /// dropped without being called.
    pub fn query<H>(
        &mut self,
        domain: &str,
        record_type: RecordType,
        handler: H,
    ) -> Result<OperationHandle, DomainError>
    where
        H: Handler + 'static,
    {
        let bits = self.settings.bits();
        self.query_with_bits(domain, record_type, bits, handler)
    }

    pub fn query_with_bits<H>(
        &mut self,
        domain: &str,
        record_type: RecordType,
        bits: Bits,
        handler: H,
    ) -> Result<OperationHandle, DomainError>
    where
        H: Handler + 'static,
    {
        if !record_type.is_queryable() {
            return Err(DomainError::UnsupportedRecordType(
                record_type.as_str().to_string(),
            ));
        }
        domain_name::validate(domain)?;
        self.submit(Query::new(domain, record_type, bits), Box::new(handler))
    }

    /// PTR lookup of an address under in-addr.arpa or ip6.arpa.
    pub fn reverse<H>(&mut self, ip: IpAddr, handler: H) -> Result<OperationHandle, DomainError>
    where
        H: Handler + 'static,
    {
        let bits = self.settings.bits();
        self.reverse_with_bits(ip, bits, handler)
    }

    pub fn reverse_with_bits<H>(
        &mut self,
        ip: IpAddr,
        bits: Bits,
        handler: H,
    ) -> Result<OperationHandle, DomainError>
    where
        H: Handler + 'static,
    {
        let name = domain_name::reverse_name(ip);
        self.submit(Query::new(name, RecordType::PTR, bits), Box::new(handler))
    }

    fn submit(
        &mut self,
        query: Query,
        handler: Box<dyn Handler>,
    ) -> Result<OperationHandle, DomainError> {
        if self.nameservers.is_empty() {
            return Err(DomainError::NoNameservers);
        }

        let policy = SuffixPolicy::new(self.settings.ndots(), self.settings.search());
        let completion = Completion::Direct(handler);
        let (query, completion) = if policy.searchable(&query.name, completion.is_search()) {
            let (completion, first) = completion.into_search(&query.name, policy.suffixes());
            debug!(domain = %query.name, first = %first, "Search list applies");
            (query.renamed(first), completion)
        } else {
            (query, completion)
        };

        let id = self.operations.insert(Operation::new(query, completion));
        if self.active < self.settings.capacity() && self.queue.is_empty() {
            self.admit(id);
        } else {
            self.queue.push_back(id);
            debug!(
                queued = self.queue.len(),
                active = self.active,
                "Capacity reached, query queued"
            );
        }
        Ok(OperationHandle(id))
    }

    fn admit_waiting(&mut self) {
        while self.active < self.settings.capacity() {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            if self.operations.contains_key(id) {
                self.admit(id);
            }
        }
    }

    fn admit(&mut self, id: OperationId) {
        let now = self.event_loop.now();
        let start = self.nameservers.start_index(self.settings.rotate());
        let transaction = self.allocate_transaction(id);
        let Some(op) = self.operations.get_mut(id) else {
            self.transactions.remove(&transaction);
            return;
        };

        op.state = OperationState::Sent;
        op.start_server = start;
        op.transaction = Some(transaction);
        op.scheduler = Some(RetryScheduler::new(&self.settings, now));
        self.active += 1;

        match self.codec.encode(transaction, &op.query) {
            Ok(payload) => op.payload = payload,
            Err(e) => {
                // Names the syntax check accepts but the wire format cannot
                // carry do not exist as far as this lookup is concerned.
                warn!(domain = %op.query.name, error = %e, "Failed to encode query");
                self.finish(id, Err(ResolveError::NxDomain));
                return;
            }
        }

        trace!(
            domain = %op.query.name,
            record_type = %op.query.record_type,
            id = transaction,
            "Query admitted"
        );
        self.send_attempt(id);
    }

    fn allocate_transaction(&mut self, id: OperationId) -> u16 {
        loop {
            let candidate = fastrand::u16(..);
            if let Entry::Vacant(slot) = self.transactions.entry(candidate) {
                slot.insert(id);
                return candidate;
            }
        }
    }

    fn send_attempt(&mut self, id: OperationId) {
        let now = self.event_loop.now();
        let Some(op) = self.operations.get_mut(id) else {
            return;
        };
        let attempt = match &op.scheduler {
            Some(scheduler) => scheduler.sent(),
            None => return,
        };

        let Some(server) = self.nameservers.server_for(op.start_server, attempt) else {
            warn!(domain = %op.query.name, "No nameserver left for retry");
            self.finish(id, Err(ResolveError::Timeout));
            return;
        };

        let family = Family::of(&server);
        let socket = match op.socket_for(family) {
            Some(socket) => Some(socket),
            None => {
                let pool = match family {
                    Family::V4 => &mut self.ipv4,
                    Family::V6 => &mut self.ipv6,
                };
                let acquired = pool.acquire();
                let opened = if acquired.needs_open {
                    self.transport
                        .open(acquired.socket, self.settings.buffer_size())
                } else {
                    Ok(())
                };
                match opened {
                    Ok(()) => {
                        if acquired.needs_open {
                            debug!(socket = acquired.socket.index, ?family, "Socket opened");
                        }
                        op.sockets.push(acquired.socket);
                        Some(acquired.socket)
                    }
                    Err(e) => {
                        // Counts as a lost attempt; the next one acquires again.
                        warn!(?family, error = %e, "Failed to open socket");
                        pool.mark_closed(acquired.socket);
                        pool.release(acquired.socket);
                        None
                    }
                }
            }
        };

        if let Some(socket) = socket {
            if let Err(e) = self.transport.send_to(socket, server, &op.payload) {
                // The retry timer still runs, so the next attempt covers it.
                warn!(server = %server, error = %e, "Failed to send query");
            }
        }
        if !op.contacted.contains(&server) {
            op.contacted.push(server);
        }

        let delay = match op.scheduler.as_mut() {
            Some(scheduler) => {
                scheduler.record_send();
                scheduler.next_delay(now)
            }
            None => return,
        };
        let token = op.next_token(id);
        self.event_loop.start_timer(delay, token);

        debug!(
            domain = %op.query.name,
            server = %server,
            attempt = attempt + 1,
            "Query sent"
        );
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn on_timer(&mut self, token: TimerToken) {
        let now = self.event_loop.now();
        let Some(op) = self.operations.get(token.operation) else {
            trace!("Timer for finished operation ignored");
            return;
        };
        if op.generation != token.generation {
            return;
        }

        match op.state {
            OperationState::Sent => {
                let expiry = op
                    .scheduler
                    .as_ref()
                    .map_or(Expiry::GiveUp, |scheduler| scheduler.on_expiry(now));
                match expiry {
                    Expiry::Resend => {
                        debug!(domain = %op.query.name, "No answer, resending");
                        self.send_attempt(token.operation);
                    }
                    Expiry::GiveUp => {
                        debug!(domain = %op.query.name, "Query timed out");
                        self.finish(token.operation, Err(ResolveError::Timeout));
                    }
                }
            }
            OperationState::Streaming => {
                debug!(domain = %op.query.name, "TCP retry ran out of time");
                self.settle_truncated(token.operation);
            }
            OperationState::Queued | OperationState::Completed => {}
        }
    }

    /// Feeds a datagram read from one of the pooled sockets.
    ///
    /// Anything that does not answer a live query is dropped silently. A
    /// reply must come from a server the query was sent to, arrive on a
    /// socket it went out on and repeat the question that was asked.
    pub fn on_datagram(&mut self, socket: SocketId, from: SocketAddr, payload: &[u8]) {
        let parsed = match self.codec.decode(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                trace!(server = %from, error = %e, "Dropping undecodable datagram");
                return;
            }
        };
        let Some(&id) = self.transactions.get(&parsed.id) else {
            trace!(server = %from, id = parsed.id, "Dropping response with unknown id");
            return;
        };
        let Some(op) = self.operations.get(id) else {
            return;
        };
        if op.state != OperationState::Sent {
            return;
        }
        if !op.contacted.contains(&from) {
            debug!(server = %from, socket = socket.index, "Dropping response from unexpected source");
            return;
        }
        if !op.sockets.contains(&socket) {
            debug!(server = %from, socket = socket.index, "Dropping response on a socket the query never used");
            return;
        }
        if !question_matches(&parsed, &op.query) {
            debug!(server = %from, domain = %op.query.name, "Dropping response with mismatched question");
            return;
        }

        if parsed.truncated {
            self.start_stream(id, from, classify(parsed));
        } else {
            self.finish(id, classify(parsed));
        }
    }

    fn start_stream(
        &mut self,
        id: OperationId,
        server: SocketAddr,
        truncated: Result<Response, ResolveError>,
    ) {
        let now = self.event_loop.now();
        let Some(op) = self.operations.get_mut(id) else {
            return;
        };
        let remaining = op
            .scheduler
            .as_ref()
            .map_or_else(Default::default, |scheduler| scheduler.remaining(now));

        self.event_loop.cancel_timer(op.token(id));
        let token = op.next_token(id);
        op.state = OperationState::Streaming;
        op.truncated = Some(truncated);

        debug!(domain = %op.query.name, server = %server, "Truncated response, retrying over TCP");
        if let Err(e) = self
            .transport
            .send_stream(token, server, &op.payload, remaining)
        {
            warn!(server = %server, error = %e, "Failed to start TCP retry");
            self.settle_truncated(id);
            return;
        }
        self.event_loop.start_timer(remaining, token);
    }

    /// Feeds the outcome of a TCP exchange started for `token`.
    pub fn on_stream(&mut self, token: TimerToken, result: io::Result<Vec<u8>>) {
        let Some(op) = self.operations.get(token.operation) else {
            return;
        };
        if op.state != OperationState::Streaming || op.generation != token.generation {
            return;
        }

        let outcome = match result {
            Ok(bytes) => match self.codec.decode(&bytes) {
                Ok(parsed)
                    if Some(parsed.id) == op.transaction
                        && question_matches(&parsed, &op.query) =>
                {
                    Some(classify(parsed))
                }
                Ok(_) => {
                    debug!(domain = %op.query.name, "TCP response does not match query");
                    None
                }
                Err(e) => {
                    debug!(domain = %op.query.name, error = %e, "Undecodable TCP response");
                    None
                }
            },
            Err(e) => {
                debug!(domain = %op.query.name, error = %e, "TCP retry failed");
                None
            }
        };

        match outcome {
            Some(outcome) => self.finish(token.operation, outcome),
            None => self.settle_truncated(token.operation),
        }
    }

    /// Falls back to the truncated UDP answer.
    fn settle_truncated(&mut self, id: OperationId) {
        let outcome = self
            .operations
            .get_mut(id)
            .and_then(|op| op.truncated.take())
            .unwrap_or(Err(ResolveError::Timeout));
        self.finish(id, outcome);
    }

    // ========================================================================
    // Completion and delivery
    // ========================================================================

    fn finish(&mut self, id: OperationId, outcome: Result<Response, ResolveError>) {
        self.retire(id);
        let Some(op) = self.operations.get_mut(id) else {
            return;
        };

        let next = match (&outcome, &mut op.completion) {
            (Err(error), Completion::Search(search)) => search.on_failure(*error),
            _ => Next::Deliver,
        };
        if let Next::Retry(name) = next {
            debug!(failed = %op.query.name, next = %name, "Trying next search candidate");
            let query = op.query.renamed(name);
            op.restart(query);
            self.queue.push_back(id);
            self.admit_waiting();
            return;
        }

        match &outcome {
            Ok(response) => debug!(
                domain = %op.query.name,
                answers = response.answers.len(),
                "Query resolved"
            ),
            Err(error) => debug!(domain = %op.query.name, error = %error, "Query failed"),
        }
        op.state = OperationState::Completed;
        op.outcome = Some(outcome);
        self.ready.push_back(id);
        self.request_tick();
        self.admit_waiting();
    }

    /// Releases the capacity slot, transaction id, timer and sockets held by
    /// an operation. The operation itself stays in the arena.
    fn retire(&mut self, id: OperationId) {
        let Some(op) = self.operations.get_mut(id) else {
            return;
        };
        if op.is_in_flight() {
            self.active = self.active.saturating_sub(1);
        }

        self.event_loop.cancel_timer(op.token(id));
        op.next_token(id);
        if let Some(transaction) = op.transaction.take() {
            self.transactions.remove(&transaction);
        }

        for socket in op.sockets.drain(..) {
            let pool = match socket.family {
                Family::V4 => &mut self.ipv4,
                Family::V6 => &mut self.ipv6,
            };
            if !pool.release(socket) {
                continue;
            }
            self.transport.close(socket);
            match self.transport.open(socket, self.settings.buffer_size()) {
                Ok(()) => debug!(socket = socket.index, family = ?socket.family, "Socket refreshed"),
                Err(e) => {
                    warn!(family = ?socket.family, error = %e, "Failed to reopen socket");
                    pool.mark_closed(socket);
                }
            }
        }
    }

    fn request_tick(&mut self) {
        if !self.tick_scheduled {
            self.tick_scheduled = true;
            self.event_loop.schedule_tick();
        }
    }

    /// Runs up to `maxcalls` pending handlers in completion order.
    pub fn on_tick(&mut self) {
        self.tick_scheduled = false;

        let mut calls = 0;
        while calls < self.settings.maxcalls() {
            let Some(id) = self.ready.pop_front() else {
                break;
            };
            // Cancelled after completion.
            let Some(op) = self.operations.remove(id) else {
                continue;
            };
            let Operation {
                completion,
                outcome,
                ..
            } = op;
            if let Some(outcome) = outcome {
                completion.deliver(OperationHandle(id), outcome);
                calls += 1;
            }
        }

        if !self.ready.is_empty() {
            trace!(pending = self.ready.len(), "Delivery limit reached");
            self.request_tick();
        }
    }

    /// Stops a lookup; its handler will never run. Stale handles are ignored.
    pub fn cancel(&mut self, handle: OperationHandle) {
        let id = handle.0;
        let Some(state) = self.operations.get(id).map(|op| op.state) else {
            return;
        };

        match state {
            OperationState::Queued => self.queue.retain(|queued| *queued != id),
            OperationState::Sent | OperationState::Streaming => self.retire(id),
            OperationState::Completed => {}
        }
        self.operations.remove(id);
        debug!(?state, "Query cancelled");
        self.admit_waiting();
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn state(&self, handle: OperationHandle) -> Option<OperationState> {
        self.operations.get(handle.0).map(|op| op.state)
    }

    /// Operations currently holding a capacity slot.
    pub fn active(&self) -> usize {
        self.active
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_deliveries(&self) -> usize {
        self.ready.len()
    }

    pub fn is_idle(&self) -> bool {
        self.operations.is_empty()
    }

    // ========================================================================
    // Context settings
    // ========================================================================

    pub fn set_timeout(&mut self, seconds: f64) {
        self.settings.set_timeout(seconds);
    }

    pub fn set_interval(&mut self, seconds: f64) {
        self.settings.set_interval(seconds);
    }

    pub fn set_attempts(&mut self, attempts: usize) {
        self.settings.set_attempts(attempts);
    }

    pub fn set_rotate(&mut self, rotate: bool) {
        self.settings.set_rotate(rotate);
    }

    pub fn set_ndots(&mut self, ndots: u8) {
        self.settings.set_ndots(ndots);
    }

    /// Raising the capacity admits queued operations immediately.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.settings.set_capacity(capacity);
        self.admit_waiting();
    }

    pub fn set_maxcalls(&mut self, maxcalls: usize) {
        self.settings.set_maxcalls(maxcalls);
    }

    pub fn set_sockets(&mut self, count: usize) {
        self.settings.set_sockets(count);
        let sockets = self.settings.sockets();
        self.ipv4.grow(sockets);
        self.ipv6.grow(sockets);
    }

    /// Applies to sockets already open as well as future ones.
    pub fn set_buffer_size(&mut self, size: usize) {
        self.settings.set_buffer_size(Some(size));
        for socket in self.ipv4.open_sockets().chain(self.ipv6.open_sockets()) {
            if let Err(e) = self.transport.set_buffer_size(socket, size) {
                warn!(socket = socket.index, family = ?socket.family, error = %e, "Failed to resize socket buffers");
            }
        }
    }

    pub fn set_bits(&mut self, bits: Bits) {
        self.settings.set_bits(bits);
    }

    pub fn set_search(&mut self, search: Vec<String>) {
        self.settings.set_search(search);
    }

    pub fn add_nameserver(&mut self, server: SocketAddr) {
        self.nameservers.add(server);
    }

    pub fn add_nameserver_ip(&mut self, ip: IpAddr) {
        self.nameservers.add_ip(ip);
    }

    /// Operations already in flight stop retrying once they run out of
    /// servers and fail with a timeout.
    pub fn clear_nameservers(&mut self) {
        self.nameservers.clear();
    }
}

fn question_matches(parsed: &ParsedResponse, query: &Query) -> bool {
    parsed
        .question
        .as_ref()
        .is_some_and(|question| question.matches(&query.name, query.record_type))
}

fn classify(parsed: ParsedResponse) -> Result<Response, ResolveError> {
    match parsed.class {
        ResponseClass::Success => Ok(parsed.response),
        ResponseClass::NxDomain => Err(ResolveError::NxDomain),
        ResponseClass::NoData => Err(ResolveError::NoData),
        ResponseClass::ServerFailure => Err(ResolveError::ServerFailure),
    }
}

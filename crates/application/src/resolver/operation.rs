use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ferrous_resolver_domain::{Query, ResolveError, Response};
use slotmap::new_key_type;
use smallvec::SmallVec;

use super::search::Completion;
use super::settings::Settings;
use crate::ports::{Family, SocketId, TimerToken};

new_key_type! {
    /// Generation-checked arena key of an operation.
    pub struct OperationId;
}

/// Caller-side reference to a lookup. Holding it keeps nothing alive; a
/// handle to a finished or cancelled lookup is simply stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub(crate) OperationId);

impl OperationHandle {
    pub fn id(&self) -> OperationId {
        self.0
    }
}

/// Lifecycle of an operation still owned by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Waiting for a capacity slot.
    Queued,
    /// Datagram sent, waiting for an answer or the retry timer.
    Sent,
    /// Truncated answer received, TCP exchange in progress.
    Streaming,
    /// Terminal; result waits in the delivery queue.
    Completed,
}

/// Decision taken when an attempt's timer expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Resend,
    GiveUp,
}

/// Resend and deadline bookkeeping for one operation.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    interval: Duration,
    attempts: usize,
    deadline: Instant,
    sent: usize,
}

impl RetryScheduler {
    pub fn new(settings: &Settings, now: Instant) -> Self {
        Self {
            interval: settings.interval(),
            attempts: settings.attempts(),
            deadline: now + settings.timeout(),
            sent: 0,
        }
    }

    /// Datagrams sent so far.
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn record_send(&mut self) {
        self.sent += 1;
    }

    /// Timer length for the attempt just sent: the resend interval, cut
    /// short by the overall deadline.
    pub fn next_delay(&self, now: Instant) -> Duration {
        self.interval.min(self.remaining(now))
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    pub fn on_expiry(&self, now: Instant) -> Expiry {
        if now >= self.deadline || self.sent >= self.attempts {
            Expiry::GiveUp
        } else {
            Expiry::Resend
        }
    }
}

/// One lookup and its retry state, owned by the dispatcher's arena.
pub(crate) struct Operation {
    pub(crate) query: Query,
    pub(crate) completion: Completion,
    pub(crate) state: OperationState,
    pub(crate) scheduler: Option<RetryScheduler>,
    pub(crate) start_server: usize,
    pub(crate) transaction: Option<u16>,
    pub(crate) payload: Vec<u8>,
    pub(crate) generation: u32,
    pub(crate) sockets: SmallVec<[SocketId; 2]>,
    pub(crate) contacted: SmallVec<[SocketAddr; 4]>,
    /// Outcome of the truncated UDP answer, used if TCP does not deliver.
    pub(crate) truncated: Option<Result<Response, ResolveError>>,
    pub(crate) outcome: Option<Result<Response, ResolveError>>,
}

impl Operation {
    pub(crate) fn new(query: Query, completion: Completion) -> Self {
        Self {
            query,
            completion,
            state: OperationState::Queued,
            scheduler: None,
            start_server: 0,
            transaction: None,
            payload: vec![],
            generation: 0,
            sockets: SmallVec::new(),
            contacted: SmallVec::new(),
            truncated: None,
            outcome: None,
        }
    }

    pub(crate) fn token(&self, operation: OperationId) -> TimerToken {
        TimerToken {
            operation,
            generation: self.generation,
        }
    }

    /// Invalidates every outstanding token and returns the fresh one.
    pub(crate) fn next_token(&mut self, operation: OperationId) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        self.token(operation)
    }

    pub(crate) fn socket_for(&self, family: Family) -> Option<SocketId> {
        self.sockets.iter().copied().find(|s| s.family == family)
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        matches!(self.state, OperationState::Sent | OperationState::Streaming)
    }

    /// Prepares the arena slot for the next search candidate.
    pub(crate) fn restart(&mut self, query: Query) {
        self.query = query;
        self.state = OperationState::Queued;
        self.scheduler = None;
        self.transaction = None;
        self.payload.clear();
        self.contacted.clear();
        self.truncated = None;
    }
}

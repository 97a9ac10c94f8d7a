use crate::ports::{Family, SocketId};

/// Operations a socket serves before it is reopened on a fresh source port.
pub const REFRESH_AFTER: usize = 256;

#[derive(Debug, Clone, Default)]
struct Slot {
    open: bool,
    outstanding: usize,
    served: usize,
    stale: bool,
}

/// Result of picking a socket for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub socket: SocketId,
    /// The transport has not opened this socket yet.
    pub needs_open: bool,
}

/// Socket selection for one address family.
///
/// Tracks how many operations use each socket so load spreads evenly, and
/// flags sockets that have served long enough to deserve a new port.
#[derive(Debug, Clone)]
pub struct SocketPool {
    family: Family,
    slots: Vec<Slot>,
}

impl SocketPool {
    pub fn new(family: Family, count: usize) -> Self {
        Self {
            family,
            slots: vec![Slot::default(); count.max(1)],
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Adds slots up to `count`. Never shrinks.
    pub fn grow(&mut self, count: usize) {
        if count > self.slots.len() {
            self.slots.resize(count, Slot::default());
        }
    }

    pub fn acquire(&mut self) -> Acquired {
        let pick = |stale_ok: bool| {
            self.slots
                .iter()
                .enumerate()
                .filter(|(_, s)| stale_ok || !s.stale)
                .min_by_key(|(_, s)| s.outstanding)
                .map(|(i, _)| i)
        };
        let index = pick(false).or_else(|| pick(true)).unwrap_or(0);

        let slot = &mut self.slots[index];
        slot.outstanding += 1;
        slot.served += 1;
        if slot.served >= REFRESH_AFTER {
            slot.stale = true;
        }
        let needs_open = !slot.open;
        slot.open = true;

        Acquired {
            socket: self.id(index),
            needs_open,
        }
    }

    /// Returns true when the socket is now idle and due for a reopen; the
    /// slot is reset as if freshly opened.
    pub fn release(&mut self, socket: SocketId) -> bool {
        let Some(slot) = self.slots.get_mut(socket.index) else {
            return false;
        };
        slot.outstanding = slot.outstanding.saturating_sub(1);

        if slot.stale && slot.outstanding == 0 && slot.open {
            slot.stale = false;
            slot.served = 0;
            return true;
        }
        false
    }

    /// Records that the transport failed to open the socket.
    pub fn mark_closed(&mut self, socket: SocketId) {
        if let Some(slot) = self.slots.get_mut(socket.index) {
            slot.open = false;
        }
    }

    pub fn outstanding(&self, socket: SocketId) -> usize {
        self.slots
            .get(socket.index)
            .map(|s| s.outstanding)
            .unwrap_or(0)
    }

    pub fn open_sockets(&self) -> impl Iterator<Item = SocketId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.open)
            .map(|(i, _)| self.id(i))
    }

    fn id(&self, index: usize) -> SocketId {
        SocketId {
            family: self.family,
            index,
        }
    }
}

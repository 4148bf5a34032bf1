/// Per-key, last-scheduled-wins debouncing
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

/// Identifies one scheduled run; only the newest ticket per key may fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Single-slot schedule per key. Scheduling again for a key supersedes the
/// pending ticket, and a superseded ticket never fires.
#[derive(Debug)]
pub struct Debouncer<K> {
    next_ticket: Cell<u64>,
    pending: RefCell<HashMap<K, Ticket>>,
}

impl<K: Hash + Eq> Debouncer<K> {
    pub fn new() -> Self {
        Debouncer {
            next_ticket: Cell::new(0),
            pending: RefCell::new(HashMap::new()),
        }
    }

    pub fn schedule(&self, key: K) -> Ticket {
        let ticket = Ticket(self.next_ticket.get() + 1);
        self.next_ticket.set(ticket.0);
        self.pending.borrow_mut().insert(key, ticket);
        ticket
    }

    /// Claim the slot when its timer elapses. True only for the newest ticket.
    pub fn fire(&self, key: &K, ticket: Ticket) -> bool {
        let mut pending = self.pending.borrow_mut();
        if pending.get(key) == Some(&ticket) {
            pending.remove(key);
            true
        } else {
            false
        }
    }
}

impl<K: Hash + Eq> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}

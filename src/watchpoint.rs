// watchpoint.rs
//
// Fixed pool of memory watchpoints.
//
// All slots live in one arena and are threaded onto either the free list or
// the active list through their `next` index. Allocation takes the head of
// the free list and prepends it to the active list; release unlinks a slot
// from the active list and pushes it back onto the head of the free list, so
// the most recently released id is handed out first.

use crate::error::{ExecError, WatchError};
use crate::memory::GuestMemory;
use crate::riscv::Word;
use tracing::debug;

/// Number of watchpoint slots.
pub const NR_WP: usize = 32;

/// Bytes compared on every check: the single byte at the watched address.
pub const WATCH_WIDTH: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchpoint {
    pub id: usize,
    pub addr: Word,
    pub value: Word,
    pub expr: String,
    next: Option<usize>,
}

/// A watched byte that changed since the last check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub id: usize,
    pub addr: Word,
    pub old: Word,
    pub new: Word,
}

pub struct WatchpointPool {
    slots: Vec<Watchpoint>,
    head: Option<usize>,
    free: Option<usize>,
}

impl WatchpointPool {
    pub fn new() -> Self {
        let slots = (0..NR_WP)
            .map(|id| Watchpoint {
                id,
                addr: 0,
                value: 0,
                expr: String::new(),
                next: if id + 1 < NR_WP { Some(id + 1) } else { None },
            })
            .collect();
        Self { slots, head: None, free: Some(0) }
    }

    /// Take a slot off the free list and make it active.
    pub fn allocate(&mut self) -> Result<usize, WatchError> {
        let id = self.free.ok_or(WatchError::PoolExhausted)?;
        self.free = self.slots[id].next;
        self.slots[id].next = self.head;
        self.head = Some(id);
        debug!(id, "watchpoint allocated");
        Ok(id)
    }

    /// Record what an active watchpoint watches and the value it starts from.
    pub fn arm(&mut self, id: usize, addr: Word, value: Word, expr: &str) -> Result<(), WatchError> {
        if !self.is_active(id) {
            return Err(WatchError::NotFound(id));
        }
        let wp = &mut self.slots[id];
        wp.addr = addr;
        wp.value = value;
        wp.expr = expr.to_string();
        Ok(())
    }

    /// Return an active watchpoint to the head of the free list.
    pub fn release(&mut self, id: usize) -> Result<(), WatchError> {
        let mut prev: Option<usize> = None;
        let mut cur = self.head;
        while let Some(i) = cur {
            if i == id {
                let next = self.slots[i].next;
                match prev {
                    Some(p) => self.slots[p].next = next,
                    None => self.head = next,
                }
                self.slots[i].next = self.free;
                self.slots[i].expr.clear();
                self.free = Some(i);
                debug!(id, "watchpoint released");
                return Ok(());
            }
            prev = cur;
            cur = self.slots[i].next;
        }
        Err(WatchError::NotFound(id))
    }

    /// Compare every active watchpoint against memory, most recently
    /// allocated first. The first one whose byte changed takes the new value
    /// and is reported; the rest are left for later checks.
    pub fn check(&mut self, memory: &dyn GuestMemory) -> Result<Option<Trigger>, ExecError> {
        let mut cur = self.head;
        while let Some(i) = cur {
            let wp = &mut self.slots[i];
            let new = memory.read(wp.addr, WATCH_WIDTH)?;
            if new != wp.value {
                let trigger = Trigger { id: wp.id, addr: wp.addr, old: wp.value, new };
                wp.value = new;
                debug!(id = wp.id, old = trigger.old, new, "watchpoint triggered");
                return Ok(Some(trigger));
            }
            cur = wp.next;
        }
        Ok(None)
    }

    pub fn is_active(&self, id: usize) -> bool {
        self.list().any(|wp| wp.id == id)
    }

    /// Active watchpoints, most recently allocated first.
    pub fn list(&self) -> impl Iterator<Item = &Watchpoint> {
        Chain { slots: &self.slots, cur: self.head }
    }

    /// Free slot ids in the order they will be handed out.
    pub fn free_ids(&self) -> Vec<usize> {
        Chain { slots: &self.slots, cur: self.free }.map(|wp| wp.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl Default for WatchpointPool {
    fn default() -> Self {
        Self::new()
    }
}

struct Chain<'a> {
    slots: &'a [Watchpoint],
    cur: Option<usize>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Watchpoint;

    fn next(&mut self) -> Option<Self::Item> {
        let wp = &self.slots[self.cur?];
        self.cur = wp.next;
        Some(wp)
    }
}

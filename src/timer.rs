//! Polled one-shot timers.
//!
//! [`DeadlineTimer`] keeps a set of pending deadlines and hands out expired
//! ones when the main loop asks.  It never spawns threads, so timeouts are
//! always processed on the thread that owns the controller, between two
//! commands.

use crate::traits::{Timer, TimerId};
use log::debug;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A [`Timer`] backed by [`Instant`] deadlines.
#[derive(Debug, Default)]
pub struct DeadlineTimer {
    next_id: u64,
    pending: BTreeMap<TimerId, Instant>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timeouts that have been scheduled and not yet cancelled or
    /// expired.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Schedule a timeout at an explicit deadline.
    pub fn schedule_at(&mut self, deadline: Instant) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert(id, deadline);
        id
    }
}

impl Timer for DeadlineTimer {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = self.schedule_at(Instant::now() + delay);
        debug!("timer {:?} armed for {}ms", id, delay.as_millis());
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if self.pending.remove(&id).is_some() {
            debug!("timer {:?} cancelled", id);
        }
    }

    fn take_expired(&mut self, now: Instant) -> Vec<TimerId> {
        let expired: Vec<TimerId> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.pending.remove(id);
        }
        expired
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }
}

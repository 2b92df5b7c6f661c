#![forbid(unsafe_code)]

//! Deferred work for rate limiters.
//!
//! Limiters never block. Waiting is modelled as a task handed to a
//! [`TimerHost`], which runs it later on the same logical event queue.
//!
//! [`TimerQueue`] is the in-process host. It is single-threaded
//! (`Rc`/`RefCell` inside) and can be bound to a real clock, where the
//! embedder pumps it with [`TimerQueue::run_due`], or to a [`LabClock`],
//! where tests drive it with [`TimerQueue::advance`].
//!
//! # Invariants
//!
//! 1. Tasks fire in deadline order; ties fire in scheduling order.
//! 2. A cleared timer never fires, including when it is cleared by another
//!    task running in the same `advance` call.
//! 3. While advancing a lab clock, the clock reads exactly the task's
//!    deadline when the task runs.
//! 4. No borrow of the queue is held while a task runs, so tasks may
//!    schedule and clear timers freely.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::trace;
use web_time::{Duration, Instant};

use crate::clock::{Clock, LabClock};

/// Work scheduled on a timer host.
pub type TimerTask = Box<dyn FnOnce()>;

/// Identifier of one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Capability to run a task after a delay.
pub trait TimerHost {
    /// Schedule `task` to run once after `delay`.
    fn set_timeout(&self, delay: Duration, task: TimerTask) -> TimerId;

    /// Cancel a scheduled task. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

#[derive(Default)]
struct QueueInner {
    next_id: u64,
    /// Keyed by (deadline, id) so iteration order is firing order.
    entries: BTreeMap<(Instant, u64), TimerTask>,
    deadlines: HashMap<u64, Instant>,
}

/// Single-threaded timer queue bound to a [`Clock`].
pub struct TimerQueue {
    clock: Clock,
    inner: RefCell<QueueInner>,
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TimerQueue")
            .field("clock", &self.clock)
            .field("pending", &inner.entries.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

impl TimerQueue {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            inner: RefCell::new(QueueInner::default()),
        }
    }

    /// Queue reading wall-clock time.
    #[must_use]
    pub fn real() -> Self {
        Self::new(Clock::Real)
    }

    /// Queue driven by a lab clock.
    #[must_use]
    pub fn lab(clock: &LabClock) -> Self {
        Self::new(Clock::Lab(clock.clone()))
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Number of scheduled, not yet fired timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Deadline of the earliest scheduled timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.borrow().entries.keys().next().map(|(due, _)| *due)
    }

    /// Fire every task whose deadline has passed. Returns the number fired.
    ///
    /// Tasks scheduled while running are fired in the same call only if
    /// they are already due at the instant the call started.
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();
        self.fire_until(now)
    }

    /// Advance a lab clock by `delta`, firing tasks as their deadlines are
    /// reached. On a real clock this is equivalent to [`run_due`](Self::run_due).
    pub fn advance(&self, delta: Duration) -> usize {
        if !self.clock.is_lab() {
            return self.run_due();
        }
        let start = self.clock.now();
        let Some(target) = start.checked_add(delta) else {
            return self.fire_until(start);
        };
        let fired = self.fire_until(target);
        let now = self.clock.now();
        if target > now {
            self.clock.advance(target - now);
        }
        fired
    }

    fn fire_until(&self, limit: Instant) -> usize {
        let mut fired = 0;
        while let Some((due, task)) = self.pop_due(limit) {
            let now = self.clock.now();
            if due > now {
                self.clock.advance(due - now);
            }
            task();
            fired += 1;
        }
        fired
    }

    fn pop_due(&self, limit: Instant) -> Option<(Instant, TimerTask)> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.entries.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let task = inner.entries.remove(&key)?;
        inner.deadlines.remove(&key.1);
        trace!(timer_id = key.1, "timer fired");
        Some((key.0, task))
    }
}

impl TimerHost for TimerQueue {
    fn set_timeout(&self, delay: Duration, task: TimerTask) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        // A deadline past the representable horizon never fires.
        if let Some(due) = self.clock.now().checked_add(delay) {
            inner.entries.insert((due, id), task);
            inner.deadlines.insert(id, due);
        }
        TimerId(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(due) = inner.deadlines.remove(&id.0) {
            inner.entries.remove(&(due, id.0));
        }
    }
}

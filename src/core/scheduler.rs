//! Repaint-aligned update scheduling.
//!
//! Any number of scroll / resize notifications between two frames collapse
//! into a single recomputation pass.  Notifications that arrive while a
//! pass is running are dropped rather than queued: the next real scroll or
//! resize will request a fresh one.
//!
//! Everything is single-threaded; the shared flags live in `Rc<Cell<_>>`
//! so a [`FrameHandle`] can be moved into a scroll listener closure.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Shared {
    pending: Cell<bool>,
    in_progress: Cell<bool>,
    cancelled: Cell<bool>,
    requested: Cell<u64>,
    coalesced: Cell<u64>,
    dropped: Cell<u64>,
}

/// Cloneable request handle.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    shared: Rc<Shared>,
}

impl FrameHandle {
    /// Ask for one recomputation on the next frame.  Idempotent.
    pub fn schedule_update(&self) {
        let s = &self.shared;
        if s.cancelled.get() {
            return;
        }
        if s.in_progress.get() {
            s.dropped.set(s.dropped.get() + 1);
            return;
        }
        s.requested.set(s.requested.get() + 1);
        if s.pending.replace(true) {
            s.coalesced.set(s.coalesced.get() + 1);
        }
    }
}

/// Frame counters, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub requested: u64,
    pub coalesced: u64,
    pub dropped: u64,
    pub executed: u64,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    shared: Rc<Shared>,
    executed: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    pub fn schedule_update(&self) {
        self.handle().schedule_update();
    }

    pub fn is_pending(&self) -> bool {
        self.shared.pending.get()
    }

    /// Run the pending pass, if any.  Call once per repaint.
    ///
    /// Returns `None` when nothing was scheduled (or after cancellation).
    pub fn run_frame<R>(&mut self, pass: impl FnOnce() -> R) -> Option<R> {
        let s = &self.shared;
        if s.cancelled.get() || !s.pending.replace(false) {
            return None;
        }
        s.in_progress.set(true);
        let out = pass();
        s.in_progress.set(false);
        self.executed += 1;
        Some(out)
    }

    /// Drop pending work; later requests become no-ops.
    pub fn cancel(&mut self) {
        self.shared.pending.set(false);
        self.shared.cancelled.set(true);
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            requested: self.shared.requested.get(),
            coalesced: self.shared.coalesced.get(),
            dropped: self.shared.dropped.get(),
            executed: self.executed,
        }
    }
}

#![forbid(unsafe_code)]

//! Deferred tasks with cancellable handles.
//!
//! Components never cancel their own timers; cancellation exists so a page
//! can be torn down cleanly. [`ManualScheduler`] is host-driven: nothing runs
//! until the host advances time explicitly, which keeps tests deterministic.

use core::time::Duration;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::host::HostError;

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a host-assigned handle.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A task run once when its timer fires.
pub type TimerTask = Box<dyn FnOnce()>;

/// One-shot timer service.
pub trait Scheduler {
    /// Run `task` once, `delay` from now.
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerId, HostError>;

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

/// The pending timers owned by one component.
///
/// Timers scheduled through the set remove themselves when they fire, so
/// [`TimerSet::cancel_all`] only touches timers that are still outstanding.
#[derive(Debug, Clone, Default)]
pub struct TimerSet {
    pending: Rc<RefCell<Vec<TimerId>>>,
}

impl TimerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` on `scheduler` and track it until it fires.
    pub fn schedule(
        &self,
        scheduler: &dyn Scheduler,
        delay: Duration,
        task: impl FnOnce() + 'static,
    ) -> Result<TimerId, HostError> {
        let slot: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
        let pending = Rc::clone(&self.pending);
        let own_id = Rc::clone(&slot);
        let id = scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(id) = own_id.get() {
                    pending.borrow_mut().retain(|p| *p != id);
                }
                task();
            }),
        )?;
        slot.set(Some(id));
        self.pending.borrow_mut().push(id);
        Ok(id)
    }

    /// Number of timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Cancel every outstanding timer. Returns how many were cancelled.
    pub fn cancel_all(&self, scheduler: &dyn Scheduler) -> usize {
        let ids = std::mem::take(&mut *self.pending.borrow_mut());
        ids.into_iter().filter(|id| scheduler.cancel(*id)).count()
    }
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    /// Keyed by (deadline, id): deadline order, then scheduling order.
    queue: BTreeMap<(Duration, u64), TimerTask>,
    deadlines: BTreeMap<u64, Duration>,
}

/// Deterministic scheduler controlled by the host.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
    fail_schedules: Cell<bool>,
}

impl ManualScheduler {
    /// Create a scheduler starting at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current monotonic time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of tasks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Make every `schedule` call fail, as a host without timers would.
    pub fn fail_schedules(&self, fail: bool) {
        self.fail_schedules.set(fail);
    }

    /// Advance time by `dt`, running every task that falls due.
    ///
    /// Tasks scheduled by a running task fire in the same call if their
    /// deadline is inside the window. Returns the number of tasks run.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = self.state.borrow().now.saturating_add(dt);
        let mut ran = 0;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let due = state
                    .queue
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        state.now = key.0;
                        state.deadlines.remove(&key.1);
                        state.queue.remove(&key)
                    }
                    None => None,
                }
            };
            // The borrow is released before the task runs so it can
            // schedule or cancel.
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        self.state.borrow_mut().now = target;
        ran
    }

    /// Advance to the last pending deadline, running everything on the way.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let wait = {
                let state = self.state.borrow();
                state
                    .queue
                    .first_key_value()
                    .map(|((deadline, _), _)| deadline.saturating_sub(state.now))
            };
            match wait {
                Some(dt) => ran += self.advance(dt),
                None => return ran,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerId, HostError> {
        if self.fail_schedules.get() {
            return Err(HostError::Unavailable("setTimeout"));
        }
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.now.saturating_add(delay);
        state.queue.insert((deadline, id), task);
        state.deadlines.insert(id, deadline);
        Ok(TimerId(id))
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.deadlines.remove(&id.0) {
            Some(deadline) => state.queue.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

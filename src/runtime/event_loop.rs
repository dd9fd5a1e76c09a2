use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

use super::unit::{Unit, UnitId, UnitKind};
use crate::hook;

/// Returned by [`EventLoop::try_current`] when no event loop is running on
/// the calling thread.
#[derive(Clone, Copy, Debug, Error)]
#[error("no event loop is running on the current thread")]
pub struct NotRunningError;

type Callback = Box<dyn FnOnce()>;

struct Task {
    unit: Rc<Unit>,
    callback: Callback,
}

struct TimerEntry {
    deadline: Duration,
    seq: u64,
    task: Task,
}

// Min-heap order: earliest deadline first, scheduling order on ties.
impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct LoopInner {
    next_unit_id: Cell<u64>,
    next_timer_seq: Cell<u64>,
    now: Cell<Duration>,
    running: Cell<bool>,
    current: RefCell<Option<Rc<Unit>>>,
    ready: RefCell<VecDeque<Task>>,
    timers: RefCell<BinaryHeap<TimerEntry>>,
    microtasks: RefCell<VecDeque<Task>>,
}

// Thread-local stack of running loops; the innermost one is current.
thread_local! {
    static LOOP_STACK: RefCell<Vec<Rc<LoopInner>>> = RefCell::new(Vec::new());
}

/// A single-threaded, cooperative event loop.
///
/// Every scheduled callback becomes one execution unit; units created while
/// a callback runs are causally triggered by it. Callbacks never run in
/// parallel: macrotasks run in scheduling order, timers fire in deadline
/// order on a logical clock that jumps forward when the loop is otherwise
/// idle, and microtasks drain after each callback before the next macrotask.
///
/// # Examples
///
/// ```
/// use ambient::EventLoop;
///
/// let rt = EventLoop::new();
/// rt.spawn(|| println!("running inside the loop"));
/// rt.run();
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

impl EventLoop {
    /// Create a fresh, isolated event loop.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(LoopInner {
                next_unit_id: Cell::new(0),
                next_timer_seq: Cell::new(0),
                now: Cell::new(Duration::ZERO),
                running: Cell::new(false),
                current: RefCell::new(None),
                ready: RefCell::new(VecDeque::new()),
                timers: RefCell::new(BinaryHeap::new()),
                microtasks: RefCell::new(VecDeque::new()),
            }),
        }
    }

    /// The innermost event loop currently running on this thread.
    pub fn try_current() -> Result<EventLoop, NotRunningError> {
        LOOP_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|inner| EventLoop {
                    inner: Rc::clone(inner),
                })
                .ok_or(NotRunningError)
        })
    }

    /// Elapsed time on this loop's logical clock.
    pub fn now(&self) -> Duration {
        self.inner.now.get()
    }

    /// Identity of the unit executing on this loop right now.
    pub fn current_unit(&self) -> Option<UnitId> {
        self.inner.current.borrow().as_ref().map(|unit| unit.id())
    }

    /// Schedule `callback` as a new macrotask.
    pub fn spawn<F>(&self, callback: F) -> UnitId
    where
        F: FnOnce() + 'static,
    {
        let unit = self.create_unit(UnitKind::Task);
        let id = unit.id();
        self.inner.ready.borrow_mut().push_back(Task {
            unit,
            callback: Box::new(callback),
        });
        id
    }

    /// Schedule `callback` to fire once `delay` has elapsed on the loop
    /// clock. Timers with equal deadlines fire in scheduling order.
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> UnitId
    where
        F: FnOnce() + 'static,
    {
        let unit = self.create_unit(UnitKind::Timer);
        let id = unit.id();
        let seq = self.inner.next_timer_seq.get();
        self.inner.next_timer_seq.set(seq + 1);
        self.inner.timers.borrow_mut().push(TimerEntry {
            deadline: self.inner.now.get() + delay,
            seq,
            task: Task {
                unit,
                callback: Box::new(callback),
            },
        });
        id
    }

    /// Queue `callback` to run after the currently executing callback
    /// returns and before the next macrotask.
    pub fn queue_microtask<F>(&self, callback: F) -> UnitId
    where
        F: FnOnce() + 'static,
    {
        let unit = self.create_unit(UnitKind::Microtask);
        let id = unit.id();
        self.inner.microtasks.borrow_mut().push_back(Task {
            unit,
            callback: Box::new(callback),
        });
        id
    }

    /// Drain all scheduled work to completion, then return.
    ///
    /// The loop is the thread's current loop for the duration, so callbacks
    /// can schedule follow-up work through the free functions in this
    /// module.
    ///
    /// # Panics
    ///
    /// Panics if this loop is already running, and re-raises any panic that
    /// escapes a scheduled callback.
    pub fn run(&self) {
        assert!(
            !self.inner.running.get(),
            "event loop is already running"
        );
        self.inner.running.set(true);
        LOOP_STACK.with(|stack| stack.borrow_mut().push(Rc::clone(&self.inner)));

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.turn_until_idle()));

        LOOP_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
        self.inner.running.set(false);

        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }

    fn turn_until_idle(&self) {
        loop {
            self.drain_microtasks();

            let task = self.inner.ready.borrow_mut().pop_front();
            if let Some(task) = task {
                self.run_one(task);
                continue;
            }

            // Idle: jump the clock to the next timer deadline.
            let due = self.inner.timers.borrow_mut().pop();
            match due {
                Some(entry) => {
                    let now = self.inner.now.get().max(entry.deadline);
                    self.inner.now.set(now);
                    self.run_one(entry.task);
                }
                None => break,
            }
        }
    }

    fn drain_microtasks(&self) {
        loop {
            let task = self.inner.microtasks.borrow_mut().pop_front();
            match task {
                Some(task) => self.run_one(task),
                None => break,
            }
        }
    }

    fn run_one(&self, task: Task) {
        let Task { unit, callback } = task;
        trace!(unit = %unit.id(), kind = %unit.kind(), "unit running");

        let previous = self.inner.current.borrow_mut().replace(unit);
        let result = panic::catch_unwind(AssertUnwindSafe(callback));
        *self.inner.current.borrow_mut() = previous;

        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }

    fn create_unit(&self, kind: UnitKind) -> Rc<Unit> {
        let id = self.inner.next_unit_id.get();
        self.inner.next_unit_id.set(id + 1);
        let unit = Rc::new(Unit::new(UnitId(id), kind));

        // The trigger is whatever is executing at this exact instant.
        let trigger = self.inner.current.borrow().clone();
        trace!(
            unit = %unit.id(),
            kind = %kind,
            trigger = ?trigger.as_ref().map(|t| t.id()),
            "unit created"
        );
        hook::dispatch_created(&unit, trigger.as_ref());
        unit
    }

    /// The record of the unit executing on this loop right now.
    pub(crate) fn current_record(&self) -> Option<Rc<Unit>> {
        self.inner.current.borrow().clone()
    }

    /// Create a unit with no causal parent, bypassing the trigger query.
    pub(crate) fn create_detached_unit(&self, kind: UnitKind) -> Rc<Unit> {
        let id = self.inner.next_unit_id.get();
        self.inner.next_unit_id.set(id + 1);
        let unit = Rc::new(Unit::new(UnitId(id), kind));
        trace!(unit = %unit.id(), kind = %kind, "detached unit created");
        hook::dispatch_created(&unit, None);
        unit
    }

    /// Run `f` synchronously with `unit` installed as the executing unit,
    /// restoring the previous execution state afterwards even on panic.
    pub(crate) fn enter_unit<R>(&self, unit: &Rc<Unit>, f: impl FnOnce() -> R) -> R {
        LOOP_STACK.with(|stack| stack.borrow_mut().push(Rc::clone(&self.inner)));
        let previous = self.inner.current.borrow_mut().replace(Rc::clone(unit));

        let result = panic::catch_unwind(AssertUnwindSafe(f));

        *self.inner.current.borrow_mut() = previous;
        LOOP_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

fn current_loop(operation: &str) -> EventLoop {
    match EventLoop::try_current() {
        Ok(event_loop) => event_loop,
        Err(_) => panic!("`{operation}` requires a running event loop on this thread"),
    }
}

/// Schedule `callback` as a macrotask on the loop running on this thread.
///
/// # Panics
///
/// Panics if no event loop is running on this thread.
pub fn spawn<F>(callback: F) -> UnitId
where
    F: FnOnce() + 'static,
{
    current_loop("spawn").spawn(callback)
}

/// Schedule `callback` as a timer on the loop running on this thread.
///
/// # Panics
///
/// Panics if no event loop is running on this thread.
pub fn set_timeout<F>(delay: Duration, callback: F) -> UnitId
where
    F: FnOnce() + 'static,
{
    current_loop("set_timeout").set_timeout(delay, callback)
}

/// Queue `callback` as a microtask on the loop running on this thread.
///
/// # Panics
///
/// Panics if no event loop is running on this thread.
pub fn queue_microtask<F>(callback: F) -> UnitId
where
    F: FnOnce() + 'static,
{
    current_loop("queue_microtask").queue_microtask(callback)
}

/// Identity of the unit executing on this thread, if any.
pub fn current_unit() -> Option<UnitId> {
    EventLoop::try_current()
        .ok()
        .and_then(|event_loop| event_loop.current_unit())
}

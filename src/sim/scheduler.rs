//! Event scheduler
//!
//! Deferred, optionally repeating timers polled once per tick. Fired timers
//! come back as plain values for the caller to dispatch, so ordering stays
//! deterministic: earliest fire time first, ties by registration order.

/// Opaque timer identifier. Never reused within one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// How many times a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    /// Fire this many times in total
    Times(u32),
    Forever,
}

/// Shortest accepted delay; keeps repeating timers from spinning within a tick
const MIN_DELAY: f64 = 1e-3;

#[derive(Debug, Clone)]
struct Timer<E> {
    handle: TimerHandle,
    delay: f64,
    /// Time the current period started (registration or last fire)
    period_start: f64,
    /// Fires left, `None` for forever
    remaining: Option<u32>,
    event: E,
}

impl<E> Timer<E> {
    #[inline]
    fn next_fire(&self) -> f64 {
        self.period_start + self.delay
    }
}

/// Timer wheel keyed by registration order
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now: f64,
    next_handle: u64,
    timers: Vec<Timer<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_handle: 1,
            timers: Vec::new(),
        }
    }

    /// Current scheduler time (seconds)
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Register a timer firing `delay` seconds from now
    pub fn schedule(&mut self, delay: f32, repeat: Repeat, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let remaining = match repeat {
            Repeat::Once => Some(1),
            Repeat::Times(n) => Some(n.max(1)),
            Repeat::Forever => None,
        };
        self.timers.push(Timer {
            handle,
            delay: (delay as f64).max(MIN_DELAY),
            period_start: self.now,
            remaining,
            event,
        });
        handle
    }

    /// Cancel a timer. Cancelling twice, or after it finished, is a no-op.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    /// Change a timer's delay in place. The current period keeps its start,
    /// so progress already made toward the next fire is not lost.
    pub fn set_delay(&mut self, handle: TimerHandle, delay: f32) -> bool {
        match self.timers.iter_mut().find(|t| t.handle == handle) {
            Some(timer) => {
                timer.delay = (delay as f64).max(MIN_DELAY);
                true
            }
            None => false,
        }
    }

    /// Current delay of a pending timer
    pub fn delay(&self, handle: TimerHandle) -> Option<f32> {
        self.timers
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.delay as f32)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pop the earliest timer due at or before `until`.
    ///
    /// Scheduler time moves to the fire instant, so timers registered while
    /// handling the event are measured from when it fired. Call
    /// [`Scheduler::settle`] once nothing more is due.
    pub fn pop_due(&mut self, until: f64) -> Option<(TimerHandle, E)>
    where
        E: Clone,
    {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.next_fire() <= until)
            .min_by(|(_, a), (_, b)| {
                a.next_fire()
                    .total_cmp(&b.next_fire())
                    .then(a.handle.cmp(&b.handle))
            })
            .map(|(i, _)| i)?;

        let timer = &mut self.timers[idx];
        let at = timer.next_fire();
        let fired = (timer.handle, timer.event.clone());
        self.now = self.now.max(at);

        match timer.remaining {
            Some(1) => {
                self.timers.remove(idx);
            }
            Some(n) => {
                timer.remaining = Some(n - 1);
                timer.period_start = at;
            }
            None => timer.period_start = at,
        }
        Some(fired)
    }

    /// Move scheduler time forward to `until` after draining due timers
    pub fn settle(&mut self, until: f64) {
        self.now = self.now.max(until);
    }

    /// Advance by `dt` and return every timer that fired, in order
    pub fn advance(&mut self, dt: f32) -> Vec<(TimerHandle, E)>
    where
        E: Clone,
    {
        let until = self.now + dt as f64;
        let mut fired = Vec::new();
        while let Some(f) = self.pop_due(until) {
            fired.push(f);
        }
        self.settle(until);
        fired
    }
}

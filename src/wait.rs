//! Spin waiting. Nothing on the hot path parks in the kernel: waiters poll an
//! atomic with a pause hint and back off to `yield_now` if the wait drags on.
//! A blocking primitive can replace [`Spin`] as long as no progress is lost.

use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_utils::Backoff;

/// Counts the polls it made, for diagnostics.
pub struct Spin {
    backoff: Backoff,
    spins: u64,
}

impl Default for Spin {
    fn default() -> Self {
        Self::new()
    }
}

impl Spin {
    pub fn new() -> Self {
        Self {
            backoff: Backoff::new(),
            spins: 0,
        }
    }

    /// One unsuccessful poll.
    #[inline]
    pub fn pause(&mut self) {
        self.spins += 1;
        self.backoff.snooze();
    }

    /// Call after progress so the next wait starts with short pauses again.
    #[inline]
    pub fn progressed(&mut self) {
        self.backoff.reset();
    }

    /// Polls until `ready` yields a value.
    #[inline]
    pub fn until<T>(&mut self, mut ready: impl FnMut() -> Option<T>) -> T {
        loop {
            if let Some(v) = ready() {
                self.progressed();
                return v;
            }
            self.pause();
        }
    }

    pub fn spins(&self) -> u64 {
        self.spins
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Closed,
    /// Workers run the solver.
    Solve,
    /// Workers exit without solving.
    Abandon,
}

const CLOSED: u8 = 0;
const SOLVE: u8 = 1;
const ABANDON: u8 = 2;

/// One-shot start signal. Leaves `Closed` at most once and never returns.
pub struct Gate(AtomicU8);

impl Default for Gate {
    fn default() -> Self {
        Self(AtomicU8::new(CLOSED))
    }
}

impl Gate {
    fn decode(v: u8) -> GateState {
        match v {
            CLOSED => GateState::Closed,
            SOLVE => GateState::Solve,
            _ => GateState::Abandon,
        }
    }

    fn set(&self, to: u8) -> bool {
        self.0
            .compare_exchange(CLOSED, to, Ordering::Release, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases waiters into the solver. False if the gate already left `Closed`.
    pub fn open(&self) -> bool {
        self.set(SOLVE)
    }

    pub fn abandon(&self) -> bool {
        self.set(ABANDON)
    }

    pub fn state(&self) -> GateState {
        Self::decode(self.0.load(Ordering::Acquire))
    }

    /// Spins until the gate leaves `Closed`.
    pub fn wait(&self) -> GateState {
        let mut spin = Spin::new();
        spin.until(|| match self.state() {
            GateState::Closed => None,
            s => Some(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn spin_until_counts_polls() {
        let mut spin = Spin::new();
        let mut left = 3;
        let v = spin.until(|| {
            if left == 0 {
                Some(42)
            } else {
                left -= 1;
                None
            }
        });
        assert_eq!(v, 42);
        assert_eq!(spin.spins(), 3);
    }

    #[test]
    fn gate_opens_once() {
        let gate = Gate::default();
        assert_eq!(gate.state(), GateState::Closed);
        assert!(gate.open());
        assert!(!gate.abandon());
        assert!(!gate.open());
        assert_eq!(gate.wait(), GateState::Solve);
    }

    #[test]
    fn waiters_see_the_open() {
        let gate = Arc::new(Gate::default());
        let seen = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let seen = Arc::clone(&seen);
                std::thread::spawn(move || {
                    if gate.wait() == GateState::Solve {
                        seen.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        gate.open();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(seen.load(Ordering::Relaxed), 4);
    }
}

//! Shared integer counter under two access disciplines.
//!
//! [`Mode::Exclusive`] runs the whole read-modify-write inside a mutex and
//! never loses an update. [`Mode::Unsynchronized`] performs the read and the
//! write as separate steps, so concurrent increments can overwrite each other.
//! It is still memory safe: each step is an atomic load or store, only the
//! combination is unprotected.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread;

/// Access discipline of a [`SharedCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Unsynchronized,
    Exclusive,
}

#[derive(Debug)]
enum Cell {
    Unsynchronized(AtomicI64),
    Exclusive(Mutex<i64>),
}

/// Counter shared by reference among the units of one trial.
#[derive(Debug)]
pub struct SharedCounter {
    cell: Cell,
}

impl SharedCounter {
    /// Create a counter at zero with the given access discipline.
    pub fn new(mode: Mode) -> Self {
        let cell = match mode {
            Mode::Unsynchronized => Cell::Unsynchronized(AtomicI64::new(0)),
            Mode::Exclusive => Cell::Exclusive(Mutex::new(0)),
        };
        Self { cell }
    }

    pub fn unsynchronized() -> Self {
        Self::new(Mode::Unsynchronized)
    }

    pub fn exclusive() -> Self {
        Self::new(Mode::Exclusive)
    }

    pub fn mode(&self) -> Mode {
        match self.cell {
            Cell::Unsynchronized(_) => Mode::Unsynchronized,
            Cell::Exclusive(_) => Mode::Exclusive,
        }
    }

    /// Add one to the stored value under this counter's discipline.
    pub fn increment(&self) {
        match &self.cell {
            Cell::Unsynchronized(value) => {
                let current = value.load(Ordering::Relaxed);
                // another unit may store between our load and our store
                thread::yield_now();
                value.store(current.wrapping_add(1), Ordering::Relaxed);
            }
            Cell::Exclusive(value) => {
                let mut guard = value.lock();
                *guard = guard.wrapping_add(1);
            }
        }
    }

    /// Current value. Only meaningful once every incrementing unit has been joined.
    pub fn get(&self) -> i64 {
        match &self.cell {
            Cell::Unsynchronized(value) => value.load(Ordering::Acquire),
            Cell::Exclusive(value) => *value.lock(),
        }
    }

    /// Set the value back to zero between trials.
    pub fn reset(&mut self) {
        match &mut self.cell {
            Cell::Unsynchronized(value) => *value.get_mut() = 0,
            Cell::Exclusive(value) => *value.get_mut() = 0,
        }
    }
}

impl Default for SharedCounter {
    fn default() -> Self {
        Self::exclusive()
    }
}

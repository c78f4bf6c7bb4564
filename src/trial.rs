//! Repeatable counter trials.
//!
//! A trial starts `units` threads behind a barrier, has each one call
//! [`SharedCounter::increment`] `increments` times, joins them and compares the
//! final value against `units * increments`. Falling short is a lost update:
//! the expected outcome for [`Mode::Unsynchronized`], a bug for
//! [`Mode::Exclusive`].

use crate::counter::{Mode, SharedCounter};
use std::sync::Barrier;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterTrial {
    mode: Mode,
    units: usize,
    increments: usize,
}

impl CounterTrial {
    /// Two units of 1000 increments each.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            units: 2,
            increments: 1000,
        }
    }

    pub fn units(mut self, units: usize) -> Self {
        self.units = units;
        self
    }

    pub fn increments(mut self, increments: usize) -> Self {
        self.increments = increments;
        self
    }

    pub fn expected(&self) -> i64 {
        (self.units * self.increments) as i64
    }

    pub fn run(&self) -> TrialOutcome {
        let counter = SharedCounter::new(self.mode);
        let barrier = Barrier::new(self.units);

        thread::scope(|s| {
            for _ in 0..self.units {
                s.spawn(|| {
                    barrier.wait();
                    for _ in 0..self.increments {
                        counter.increment();
                    }
                });
            }
        });

        let outcome = TrialOutcome {
            mode: self.mode,
            expected: self.expected(),
            observed: counter.get(),
        };
        tracing::debug!(
            mode = ?outcome.mode,
            expected = outcome.expected,
            observed = outcome.observed,
            "counter trial finished"
        );
        outcome
    }

    pub fn run_many(&self, trials: usize) -> TrialSummary {
        let mut summary = TrialSummary {
            mode: self.mode,
            expected: self.expected(),
            trials: 0,
            exact: 0,
            min_observed: i64::MAX,
            max_observed: i64::MIN,
        };

        for _ in 0..trials {
            summary.record(&self.run());
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    pub mode: Mode,
    pub expected: i64,
    pub observed: i64,
}

impl TrialOutcome {
    pub fn lost_updates(&self) -> i64 {
        (self.expected - self.observed).max(0)
    }

    pub fn race_detected(&self) -> bool {
        self.observed < self.expected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSummary {
    pub mode: Mode,
    pub expected: i64,
    pub trials: usize,
    /// Trials whose final value matched `expected`
    pub exact: usize,
    pub min_observed: i64,
    pub max_observed: i64,
}

impl TrialSummary {
    fn record(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        if outcome.observed == outcome.expected {
            self.exact += 1;
        }
        self.min_observed = self.min_observed.min(outcome.observed);
        self.max_observed = self.max_observed.max(outcome.observed);
    }

    /// At least one trial lost an update
    pub fn race_reproduced(&self) -> bool {
        self.exact < self.trials
    }

    /// Some trial ended above the expected total, which no discipline allows
    pub fn overshoot(&self) -> bool {
        self.trials > 0 && self.max_observed > self.expected
    }
}

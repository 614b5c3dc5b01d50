//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_index(&self, upper: usize) -> usize {
        use rand::Rng;
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Manually advanced clock for testing.
#[cfg(test)]
pub struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(std::sync::Mutex::new(start))
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl ClockPort for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Scripted random for testing; repeats the last value once exhausted.
#[cfg(test)]
pub struct SequenceRandom(std::sync::Mutex<(Vec<usize>, usize)>);

#[cfg(test)]
impl SequenceRandom {
    pub fn new(values: Vec<usize>) -> Self {
        Self(std::sync::Mutex::new((values, 0)))
    }
}

#[cfg(test)]
impl RandomPort for SequenceRandom {
    fn gen_index(&self, upper: usize) -> usize {
        let mut guard = self.0.lock().unwrap();
        let (values, cursor) = &mut *guard;
        let value = values
            .get(*cursor)
            .or_else(|| values.last())
            .copied()
            .unwrap_or(0);
        *cursor += 1;
        value % upper.max(1)
    }
}

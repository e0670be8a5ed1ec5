//! Clinic wall clock.
//!
//! Every scheduling rule compares against "now" in the clinic's civil
//! time. The engine takes the clock as a trait object so tests can pin
//! or advance it.

use std::sync::Mutex;

use chrono::{Duration, FixedOffset, NaiveDateTime, Utc};

pub trait Clock: Send + Sync {
    /// Current civil time in the clinic zone.
    fn now(&self) -> NaiveDateTime;
}

/// Production clock: system UTC shifted into the clinic offset.
#[derive(Debug, Clone, Copy)]
pub struct ClinicClock {
    offset: FixedOffset,
}

impl ClinicClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for ClinicClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock(Mutex<NaiveDateTime>);

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(Mutex::new(at))
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

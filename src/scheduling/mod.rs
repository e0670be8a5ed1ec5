//! Appointment scheduling core.
//!
//! Slot generation and overlap checks are pure helpers; the
//! [`SchedulingEngine`] owns every state transition and runs each write
//! inside one `BEGIN IMMEDIATE` transaction.

pub mod engine;
pub mod error;
pub mod overlap;
pub mod projection;
pub mod queries;
pub mod slots;
pub mod sweep;

pub use engine::*;
pub use error::*;
pub use projection::*;
pub use queries::SchedulePage;
pub use slots::{AvailabilityRequest, TimeBlock};

use chrono::Duration;

/// Cancellations at least this many minutes ahead reopen the slot.
pub const REGENERATION_NOTICE_MINUTES: i64 = 24 * 60;

/// Booked, undiagnosed appointments close this long after their end.
pub const SCHEDULED_GRACE_MINUTES: i64 = 60;

/// A diagnosis may be linked until this long after the end.
pub const COMPLETION_GRACE_MINUTES: i64 = 65;

pub fn regeneration_notice() -> Duration {
    Duration::minutes(REGENERATION_NOTICE_MINUTES)
}

pub fn scheduled_grace() -> Duration {
    Duration::minutes(SCHEDULED_GRACE_MINUTES)
}

pub fn completion_grace() -> Duration {
    Duration::minutes(COMPLETION_GRACE_MINUTES)
}

/// Upper bound on slot-generation loop iterations per request.
pub const MAX_GENERATION_STEPS: usize = 10_000;

/// Default and maximum page sizes for schedule listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, Reason};

/// One doctor time block. Times are civil clinic time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub reason: Reason,
    pub status: AppointmentStatus,
    pub approved: bool,
    pub pet_id: Option<Uuid>,
    pub diagnosis_id: Option<Uuid>,
}

impl Appointment {
    /// A fresh, unbooked block.
    pub fn available(
        doctor_id: Uuid,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        reason: Reason,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            start_time,
            end_time,
            reason,
            status: AppointmentStatus::Available,
            approved: false,
            pet_id: None,
            diagnosis_id: None,
        }
    }

    /// Half-open interval intersection: touching endpoints do not overlap.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_time < end && start < self.end_time
    }

    pub fn is_booked(&self) -> bool {
        self.pet_id.is_some()
    }
}

//! Doctor-level conflict detection.
//!
//! The checker snapshots a doctor's blocks inside the caller's transaction,
//! so every admission decision sees the rows the transaction will commit
//! against. Blocks admitted through [`OverlapChecker::admit`] are folded
//! into the snapshot, which lets a batch reject conflicts with itself.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy)]
struct Interval {
    id: Uuid,
    start: NaiveDateTime,
    end: NaiveDateTime,
    canceled: bool,
}

pub struct OverlapChecker {
    existing: Vec<Interval>,
    exclude: Option<Uuid>,
    ignore_canceled: bool,
}

impl OverlapChecker {
    /// Load every block of `doctor_id` intersecting `[from, to)`, any status.
    pub fn load(
        conn: &Connection,
        doctor_id: &Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Self, DatabaseError> {
        let existing = db::list_doctor_window(conn, doctor_id, &from, &to)?
            .into_iter()
            .map(|a| Interval {
                id: a.id,
                start: a.start_time,
                end: a.end_time,
                canceled: a.status == AppointmentStatus::Canceled,
            })
            .collect();
        Ok(Self {
            existing,
            exclude: None,
            ignore_canceled: false,
        })
    }

    /// Ignore one stored block, typically the one being replaced.
    pub fn excluding(mut self, id: Uuid) -> Self {
        self.exclude = Some(id);
        self
    }

    /// Let canceled intervals be offered again.
    pub fn reopening_canceled(mut self) -> Self {
        self.ignore_canceled = true;
        self
    }

    fn counts(&self, interval: &Interval) -> bool {
        if self.ignore_canceled && interval.canceled {
            return false;
        }
        self.exclude != Some(interval.id)
    }

    /// First recorded block intersecting `[start, end)`, if any.
    pub fn first_conflict(&self, start: NaiveDateTime, end: NaiveDateTime) -> Option<Uuid> {
        self.existing
            .iter()
            .filter(|i| self.counts(i))
            .find(|i| start < i.end && end > i.start)
            .map(|i| i.id)
    }

    pub fn conflicts_with(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.first_conflict(start, end).is_some()
    }

    /// Admit a block if it fits; returns whether it was admitted.
    pub fn admit(&mut self, appt: &Appointment) -> bool {
        if self.conflicts_with(appt.start_time, appt.end_time) {
            return false;
        }
        self.existing.push(Interval {
            id: appt.id,
            start: appt.start_time,
            end: appt.end_time,
            canceled: false,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::db::{insert_appointment, insert_doctor, open_memory_database, set_status};
    use crate::models::{Doctor, Reason};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn setup_db() -> (Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            surname: "Paz".into(),
            speciality: None,
        };
        insert_doctor(&conn, &doctor).unwrap();
        (conn, doctor.id)
    }

    fn stored(conn: &Connection, doctor_id: Uuid, h: u32, m: u32) -> Appointment {
        let appt = Appointment::available(doctor_id, at(h, m), at(h, m) + Duration::minutes(15), Reason::Control);
        insert_appointment(conn, &appt).unwrap();
        appt
    }

    #[test]
    fn touching_blocks_do_not_conflict() {
        let (conn, doctor_id) = setup_db();
        stored(&conn, doctor_id, 9, 0);
        let checker = OverlapChecker::load(&conn, &doctor_id, at(0, 0), at(23, 0)).unwrap();

        assert!(!checker.conflicts_with(at(9, 15), at(9, 30)));
        assert!(!checker.conflicts_with(at(8, 45), at(9, 0)));
        assert!(checker.conflicts_with(at(9, 10), at(9, 25)));
    }

    #[test]
    fn other_doctors_are_ignored() {
        let (conn, doctor_id) = setup_db();
        stored(&conn, doctor_id, 9, 0);
        let checker = OverlapChecker::load(&conn, &Uuid::new_v4(), at(0, 0), at(23, 0)).unwrap();
        assert!(!checker.conflicts_with(at(9, 0), at(9, 15)));
    }

    #[test]
    fn excluded_block_is_skipped() {
        let (conn, doctor_id) = setup_db();
        let appt = stored(&conn, doctor_id, 9, 0);
        let checker = OverlapChecker::load(&conn, &doctor_id, at(0, 0), at(23, 0))
            .unwrap()
            .excluding(appt.id);
        assert!(!checker.conflicts_with(at(9, 0), at(9, 15)));
    }

    #[test]
    fn canceled_blocks_count_unless_reopened() {
        let (conn, doctor_id) = setup_db();
        let appt = stored(&conn, doctor_id, 9, 0);
        set_status(&conn, &appt.id, AppointmentStatus::Canceled).unwrap();

        let strict = OverlapChecker::load(&conn, &doctor_id, at(0, 0), at(23, 0)).unwrap();
        assert!(strict.conflicts_with(at(9, 0), at(9, 15)));

        let reopening = OverlapChecker::load(&conn, &doctor_id, at(0, 0), at(23, 0))
            .unwrap()
            .reopening_canceled();
        assert!(!reopening.conflicts_with(at(9, 0), at(9, 15)));
    }

    #[test]
    fn admitted_blocks_join_the_snapshot() {
        let (conn, doctor_id) = setup_db();
        let mut checker = OverlapChecker::load(&conn, &doctor_id, at(0, 0), at(23, 0)).unwrap();
        let first = Appointment::available(doctor_id, at(10, 0), at(10, 15), Reason::Control);
        let clash = Appointment::available(doctor_id, at(10, 5), at(10, 20), Reason::Control);

        assert!(checker.admit(&first));
        assert!(!checker.admit(&clash));
        assert_eq!(checker.first_conflict(at(10, 5), at(10, 20)), Some(first.id));
    }
}

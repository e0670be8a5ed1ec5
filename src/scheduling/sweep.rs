//! Expiration sweeps.
//!
//! Both sweeps are status corrections driven by reads rather than timers.
//! They select by time and status, so running one twice changes nothing
//! the second time.

use chrono::NaiveDateTime;
use rusqlite::Connection;

use super::scheduled_grace;
use crate::db::{self, DatabaseError};
use crate::directory::Directory;
use crate::models::AppointmentStatus;

/// Cancel unbooked blocks whose start has passed. Returns rows changed.
pub fn sweep_expired_available(conn: &Connection, now: NaiveDateTime) -> Result<usize, DatabaseError> {
    let expired = db::list_expired_available(conn, &now)?;
    for appt in &expired {
        db::set_status(conn, &appt.id, AppointmentStatus::Canceled)?;
    }
    if !expired.is_empty() {
        tracing::info!(count = expired.len(), "Canceled expired available appointments");
    }
    Ok(expired.len())
}

/// Close booked appointments one hour past their end with no diagnosis.
pub fn sweep_expired_scheduled(
    conn: &Connection,
    directory: &dyn Directory,
    now: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let overdue = db::list_overdue_scheduled(conn, &(now - scheduled_grace()))?;
    let mut closed = 0;
    for appt in &overdue {
        if directory.has_diagnosis(&appt.id)? {
            continue;
        }
        db::set_status(conn, &appt.id, AppointmentStatus::Successfully)?;
        closed += 1;
    }
    if closed > 0 {
        tracing::info!(count = closed, "Closed overdue scheduled appointments");
    }
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    use super::*;
    use crate::db::{
        assign_pet, get_appointment, insert_appointment, insert_client, insert_diagnosis,
        insert_doctor, insert_pet, open_memory_database, SqliteDirectory,
    };
    use crate::models::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    struct Fixture {
        conn: Connection,
        doctor_id: Uuid,
        pet_id: Uuid,
    }

    fn setup_db() -> Fixture {
        let conn = open_memory_database().unwrap();
        let doctor_id = Uuid::new_v4();
        insert_doctor(
            &conn,
            &Doctor {
                id: doctor_id,
                name: "Ana".into(),
                surname: "Paz".into(),
                speciality: None,
            },
        )
        .unwrap();
        let client_id = Uuid::new_v4();
        insert_client(
            &conn,
            &Client {
                id: client_id,
                name: "Luis".into(),
                surname: "Gomez".into(),
            },
        )
        .unwrap();
        let pet_id = Uuid::new_v4();
        insert_pet(
            &conn,
            &Pet {
                id: pet_id,
                client_id,
                name: "Tobi".into(),
                pet_type: None,
            },
        )
        .unwrap();
        Fixture {
            conn,
            doctor_id,
            pet_id,
        }
    }

    fn stored(fx: &Fixture, start: NaiveDateTime) -> Appointment {
        let appt = Appointment::available(fx.doctor_id, start, start + Duration::minutes(15), Reason::Control);
        insert_appointment(&fx.conn, &appt).unwrap();
        appt
    }

    fn status_of(fx: &Fixture, appt: &Appointment) -> AppointmentStatus {
        get_appointment(&fx.conn, &appt.id).unwrap().unwrap().status
    }

    #[test]
    fn expired_available_blocks_are_canceled_once() {
        let fx = setup_db();
        let past = stored(&fx, at(1, 9, 0));
        let future = stored(&fx, at(1, 11, 0));
        let now = at(1, 10, 0);

        assert_eq!(sweep_expired_available(&fx.conn, now).unwrap(), 1);
        assert_eq!(status_of(&fx, &past), AppointmentStatus::Canceled);
        assert_eq!(status_of(&fx, &future), AppointmentStatus::Available);

        assert_eq!(sweep_expired_available(&fx.conn, now).unwrap(), 0);
        assert_eq!(status_of(&fx, &past), AppointmentStatus::Canceled);
    }

    #[test]
    fn scheduled_closes_only_after_grace() {
        let fx = setup_db();
        let appt = stored(&fx, at(1, 9, 0));
        assert!(assign_pet(&fx.conn, &appt.id, &fx.pet_id).unwrap());
        let dir = SqliteDirectory::new(&fx.conn);

        // Ends 09:15; exactly one hour later is not yet past.
        assert_eq!(sweep_expired_scheduled(&fx.conn, &dir, at(1, 10, 15)).unwrap(), 0);
        assert_eq!(status_of(&fx, &appt), AppointmentStatus::ToBegin);

        assert_eq!(sweep_expired_scheduled(&fx.conn, &dir, at(1, 10, 16)).unwrap(), 1);
        assert_eq!(status_of(&fx, &appt), AppointmentStatus::Successfully);

        assert_eq!(sweep_expired_scheduled(&fx.conn, &dir, at(1, 10, 16)).unwrap(), 0);
    }

    #[test]
    fn diagnosed_appointments_are_left_alone() {
        let fx = setup_db();
        let appt = stored(&fx, at(1, 9, 0));
        assert!(assign_pet(&fx.conn, &appt.id, &fx.pet_id).unwrap());
        insert_diagnosis(
            &fx.conn,
            &DiagnosisSummary {
                id: Uuid::new_v4(),
                appointment_id: appt.id,
                diagnose: "Healthy".into(),
                treatment: None,
            },
        )
        .unwrap();
        let dir = SqliteDirectory::new(&fx.conn);

        assert_eq!(sweep_expired_scheduled(&fx.conn, &dir, at(2, 0, 0)).unwrap(), 0);
        assert_eq!(status_of(&fx, &appt), AppointmentStatus::ToBegin);
    }
}

use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

/// Civil-time storage format. Lexical order matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const APPOINTMENT_COLUMNS: &str =
    "id, doctor_id, start_time, end_time, reason, status, approved, pet_id, diagnosis_id";

pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(column: &str, value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        DatabaseError::CorruptValue {
            column: column.into(),
            value: value.into(),
        }
    })
}

fn parse_uuid(column: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::CorruptValue {
        column: column.into(),
        value: value.into(),
    })
}

type AppointmentRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    bool,
    Option<String>,
    Option<String>,
);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn row_to_appointment(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let (id, doctor_id, start, end, reason, status, approved, pet_id, diagnosis_id) = row;
    Ok(Appointment {
        id: parse_uuid("id", &id)?,
        doctor_id: parse_uuid("doctor_id", &doctor_id)?,
        start_time: parse_timestamp("start_time", &start)?,
        end_time: parse_timestamp("end_time", &end)?,
        reason: Reason::from_str(&reason)?,
        status: AppointmentStatus::from_str(&status)?,
        approved,
        pet_id: pet_id.map(|p| parse_uuid("pet_id", &p)).transpose()?,
        diagnosis_id: diagnosis_id
            .map(|d| parse_uuid("diagnosis_id", &d))
            .transpose()?,
    })
}

fn query_appointments<P: rusqlite::Params>(
    conn: &Connection,
    where_clause: &str,
    params: P,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments {where_clause}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, read_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(row_to_appointment(row?)?);
    }
    Ok(appointments)
}

// ─── Writes ────────────────────────────────────────────────

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, doctor_id, start_time, end_time, reason, status, approved, pet_id, diagnosis_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.id.to_string(),
            appt.doctor_id.to_string(),
            format_timestamp(&appt.start_time),
            format_timestamp(&appt.end_time),
            appt.reason.as_str(),
            appt.status.as_str(),
            appt.approved,
            appt.pet_id.map(|id| id.to_string()),
            appt.diagnosis_id.map(|id| id.to_string()),
        ],
    )
    .map_err(DatabaseError::from_write)?;
    Ok(())
}

/// Administrative status write. Skips state-machine checks; callers own them.
pub fn set_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    ensure_changed(changed, id)
}

/// Administrative approval write. Leaves status untouched.
pub fn set_approved(conn: &Connection, id: &Uuid, approved: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET approved = ?1 WHERE id = ?2",
        params![approved, id.to_string()],
    )?;
    ensure_changed(changed, id)
}

/// Book an open block. Returns false when another writer got there first.
pub fn assign_pet(conn: &Connection, id: &Uuid, pet_id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET pet_id = ?1, status = 'TO_BEGIN'
         WHERE id = ?2 AND pet_id IS NULL AND status = 'AVAILABLE'",
        params![pet_id.to_string(), id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Record the diagnosis link and close the appointment.
pub fn link_diagnosis(
    conn: &Connection,
    id: &Uuid,
    diagnosis_id: &Uuid,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET diagnosis_id = ?1, status = 'SUCCESSFULLY' WHERE id = ?2",
        params![diagnosis_id.to_string(), id.to_string()],
    )?;
    ensure_changed(changed, id)
}

fn ensure_changed(changed: usize, id: &Uuid) -> Result<(), DatabaseError> {
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// ─── Reads ─────────────────────────────────────────────────

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(row_to_appointment).transpose()
}

pub fn list_all(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(conn, "ORDER BY start_time ASC, doctor_id ASC", [])
}

/// Every block of a doctor intersecting `[start, end)`, any status.
pub fn list_doctor_window(
    conn: &Connection,
    doctor_id: &Uuid,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        "WHERE doctor_id = ?1 AND start_time < ?3 AND end_time > ?2 ORDER BY start_time ASC",
        params![
            doctor_id.to_string(),
            format_timestamp(start),
            format_timestamp(end),
        ],
    )
}

/// Open blocks starting after `after`, optionally for one reason.
pub fn list_available(
    conn: &Connection,
    reason: Option<Reason>,
    after: &NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    match reason {
        Some(reason) => query_appointments(
            conn,
            "WHERE status = 'AVAILABLE' AND pet_id IS NULL AND reason = ?1 AND start_time > ?2
             ORDER BY start_time ASC",
            params![reason.as_str(), format_timestamp(after)],
        ),
        None => query_appointments(
            conn,
            "WHERE status = 'AVAILABLE' AND pet_id IS NULL AND start_time > ?1
             ORDER BY start_time ASC",
            params![format_timestamp(after)],
        ),
    }
}

/// Open blocks for a reason starting in `[from, to)` and after `after`.
pub fn list_available_between(
    conn: &Connection,
    reason: Reason,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
    after: &NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        "WHERE status = 'AVAILABLE' AND pet_id IS NULL AND reason = ?1
           AND start_time >= ?2 AND start_time < ?3 AND start_time > ?4
         ORDER BY start_time ASC",
        params![
            reason.as_str(),
            format_timestamp(from),
            format_timestamp(to),
            format_timestamp(after),
        ],
    )
}

/// A doctor's blocks that have not ended yet, ascending, one page.
pub fn list_doctor_upcoming(
    conn: &Connection,
    doctor_id: &Uuid,
    now: &NaiveDateTime,
    limit: u32,
    offset: u32,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        "WHERE doctor_id = ?1 AND end_time > ?2 ORDER BY start_time ASC LIMIT ?3 OFFSET ?4",
        params![doctor_id.to_string(), format_timestamp(now), limit, offset],
    )
}

pub fn count_doctor_upcoming(
    conn: &Connection,
    doctor_id: &Uuid,
    now: &NaiveDateTime,
) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE doctor_id = ?1 AND end_time > ?2",
        params![doctor_id.to_string(), format_timestamp(now)],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// A doctor's booked blocks that started before `now`, newest first.
pub fn list_doctor_past_booked(
    conn: &Connection,
    doctor_id: &Uuid,
    now: &NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        "WHERE doctor_id = ?1 AND pet_id IS NOT NULL AND start_time < ?2 ORDER BY start_time DESC",
        params![doctor_id.to_string(), format_timestamp(now)],
    )
}

pub fn list_by_pet(conn: &Connection, pet_id: &Uuid) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        "WHERE pet_id = ?1 ORDER BY start_time DESC",
        params![pet_id.to_string()],
    )
}

/// Appointments booked by any of the given pets, newest first.
pub fn list_by_pets(conn: &Connection, pet_ids: &[Uuid]) -> Result<Vec<Appointment>, DatabaseError> {
    if pet_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; pet_ids.len()].join(", ");
    let where_clause = format!("WHERE pet_id IN ({placeholders}) ORDER BY start_time DESC");
    let ids: Vec<String> = pet_ids.iter().map(|id| id.to_string()).collect();
    query_appointments(conn, &where_clause, params_from_iter(ids.iter()))
}

/// The pet's earliest booked block that has not started yet.
pub fn find_pet_scheduled(
    conn: &Connection,
    pet_id: &Uuid,
    now: &NaiveDateTime,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut found = query_appointments(
        conn,
        "WHERE pet_id = ?1 AND status = 'TO_BEGIN' AND start_time > ?2
         ORDER BY start_time ASC LIMIT 1",
        params![pet_id.to_string(), format_timestamp(now)],
    )?;
    Ok(found.pop())
}

/// Unbooked blocks whose start has passed.
pub fn list_expired_available(
    conn: &Connection,
    now: &NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        "WHERE status = 'AVAILABLE' AND pet_id IS NULL AND start_time < ?1",
        params![format_timestamp(now)],
    )
}

/// Booked, undiagnosed blocks that ended at or before `cutoff`.
pub fn list_overdue_scheduled(
    conn: &Connection,
    cutoff: &NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        "WHERE status = 'TO_BEGIN' AND pet_id IS NOT NULL AND diagnosis_id IS NULL AND end_time < ?1",
        params![format_timestamp(cutoff)],
    )
}

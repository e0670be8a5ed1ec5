//! Scheduling engine: the appointment state machine.
//!
//! ```text
//! AVAILABLE ──book──▶ TO_BEGIN ──complete / sweep──▶ SUCCESSFULLY
//!     │                  │
//!     └──cancel / sweep──┴──cancel──▶ CANCELED
//! ```
//!
//! Every mutation runs in a `BEGIN IMMEDIATE` transaction. SQLite admits
//! one such writer at a time, so the read-check-write sequence of a
//! booking or creation cannot interleave with another writer.

use chrono::{NaiveDateTime, SubsecRound};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::overlap::OverlapChecker;
use super::slots::{self, AvailabilityRequest};
use super::{completion_grace, regeneration_notice, sweep, SchedulingError};
use crate::clock::Clock;
use crate::db::{self, DatabaseError};
use crate::directory::Directory;
use crate::models::{Appointment, AppointmentStatus, Reason};

/// One block, or a range to tile, for a doctor.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRequest {
    #[serde(alias = "doctorId")]
    pub doctor_id: Uuid,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub reason: Reason,
}

impl BlockRequest {
    /// Drop sub-second parts; rows keep whole seconds.
    fn at_storage_precision(&self) -> Self {
        Self {
            start: self.start.trunc_subsecs(0),
            end: self.end.trunc_subsecs(0),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub created: Vec<Appointment>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub canceled: Appointment,
    pub replacement: Option<Appointment>,
}

pub struct SchedulingEngine<'a> {
    pub(super) conn: &'a Connection,
    pub(super) clock: &'a dyn Clock,
    pub(super) directory: &'a dyn Directory,
}

impl<'a> SchedulingEngine<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock, directory: &'a dyn Directory) -> Self {
        Self {
            conn,
            clock,
            directory,
        }
    }

    /// Clinic time at whole-second precision, the resolution rows are stored at.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now().trunc_subsecs(0)
    }

    /// Run `f` inside an immediate transaction; any error rolls back.
    fn write<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, SchedulingError>,
    ) -> Result<T, SchedulingError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(DatabaseError::from)?;
        let out = f(&*tx)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(out)
    }

    fn load(conn: &Connection, id: &Uuid) -> Result<Appointment, SchedulingError> {
        db::get_appointment(conn, id)?.ok_or_else(|| SchedulingError::not_found("Appointment", id))
    }

    fn require_doctor(&self, doctor_id: &Uuid) -> Result<(), SchedulingError> {
        if !self.directory.doctor_exists(doctor_id)? {
            return Err(SchedulingError::not_found("Doctor", doctor_id));
        }
        Ok(())
    }

    // ─── Creation ──────────────────────────────────────────

    /// Create one AVAILABLE block strictly in the future.
    pub fn create_single(&self, req: &BlockRequest) -> Result<Appointment, SchedulingError> {
        let req = &req.at_storage_precision();
        if req.start >= req.end {
            return Err(SchedulingError::InvalidRange("start must be before end".into()));
        }
        if req.start <= self.now() {
            return Err(SchedulingError::InPast);
        }
        self.require_doctor(&req.doctor_id)?;

        let appt = Appointment::available(req.doctor_id, req.start, req.end, req.reason);
        self.write(|conn| {
            let checker = OverlapChecker::load(conn, &appt.doctor_id, appt.start_time, appt.end_time)?;
            if let Some(existing) = checker.first_conflict(appt.start_time, appt.end_time) {
                tracing::warn!(doctor = %appt.doctor_id, %existing, "Rejected overlapping block");
                return Err(SchedulingError::DuplicateSlot);
            }
            db::insert_appointment(conn, &appt)?;
            Ok(())
        })?;

        tracing::info!(id = %appt.id, doctor = %appt.doctor_id, start = %appt.start_time, "Created appointment block");
        Ok(appt)
    }

    /// Tile a range into blocks, skipping tiles that collide with stored ones.
    pub fn create_bulk(&self, req: &BlockRequest) -> Result<BulkOutcome, SchedulingError> {
        let req = &req.at_storage_precision();
        let blocks = slots::tile(req.start, req.end, req.reason)?;
        self.require_doctor(&req.doctor_id)?;

        let outcome = self.write(|conn| {
            let mut checker = OverlapChecker::load(conn, &req.doctor_id, req.start, req.end)?;
            let mut created = Vec::with_capacity(blocks.len());
            let mut skipped = 0;
            for block in &blocks {
                let appt = Appointment::available(req.doctor_id, block.start, block.end, req.reason);
                if checker.admit(&appt) {
                    db::insert_appointment(conn, &appt)?;
                    created.push(appt);
                } else {
                    skipped += 1;
                }
            }
            Ok(BulkOutcome { created, skipped })
        })?;

        tracing::info!(
            doctor = %req.doctor_id,
            created = outcome.created.len(),
            skipped = outcome.skipped,
            "Created appointment range"
        );
        Ok(outcome)
    }

    /// Generate daily-bounded blocks and persist all of them or none.
    pub fn upload_availability(
        &self,
        doctor_id: &Uuid,
        req: &AvailabilityRequest,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.require_doctor(doctor_id)?;
        let req = &AvailabilityRequest {
            start: req.start.trunc_subsecs(0),
            end: req.end.trunc_subsecs(0),
            ..req.clone()
        };
        let blocks = slots::generate(req, self.now())?;
        let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
            tracing::info!(doctor = %doctor_id, "Availability range produced no blocks");
            return Ok(Vec::new());
        };
        let (window_start, window_end) = (first.start, last.end);

        let created = self.write(|conn| {
            let checker = OverlapChecker::load(conn, doctor_id, window_start, window_end)?;
            let conflicts = blocks
                .iter()
                .filter(|b| checker.conflicts_with(b.start, b.end))
                .count();
            if conflicts > 0 {
                return Err(SchedulingError::DuplicateRange(conflicts));
            }

            let mut created = Vec::with_capacity(blocks.len());
            for block in &blocks {
                let appt = Appointment::available(*doctor_id, block.start, block.end, req.reason);
                db::insert_appointment(conn, &appt)?;
                created.push(appt);
            }
            Ok(created)
        })?;

        tracing::info!(doctor = %doctor_id, count = created.len(), "Uploaded availability");
        Ok(created)
    }

    // ─── Transitions ───────────────────────────────────────

    /// Book an AVAILABLE block for a pet.
    pub fn book(&self, id: &Uuid, pet_id: &Uuid) -> Result<Appointment, SchedulingError> {
        let now = self.now();
        let booked = self.write(|conn| {
            let appt = Self::load(conn, id)?;
            if appt.pet_id.is_some() {
                return Err(SchedulingError::AlreadyBooked);
            }
            if appt.status != AppointmentStatus::Available || appt.start_time <= now {
                return Err(SchedulingError::NotAvailable);
            }
            if self.directory.get_pet(pet_id)?.is_none() {
                return Err(SchedulingError::not_found("Pet", pet_id));
            }
            if db::find_pet_scheduled(conn, pet_id, &now)?.is_some() {
                return Err(SchedulingError::PetAlreadyScheduled);
            }
            if !db::assign_pet(conn, id, pet_id)? {
                return Err(SchedulingError::AlreadyBooked);
            }
            Self::load(conn, id)
        })?;

        tracing::info!(id = %booked.id, pet = %pet_id, "Booked appointment");
        Ok(booked)
    }

    /// Cancel an open or booked appointment, reopening the slot when the
    /// cancellation comes at least 24 hours ahead.
    pub fn cancel(&self, id: &Uuid) -> Result<CancelOutcome, SchedulingError> {
        let now = self.now();
        let outcome = self.write(|conn| {
            let appt = Self::load(conn, id)?;
            if appt.status.is_terminal() {
                return Err(SchedulingError::NotCancelable(appt.status.as_str()));
            }
            // Pet reference stays for history.
            db::set_status(conn, id, AppointmentStatus::Canceled)?;

            let mut replacement = None;
            if appt.start_time - now >= regeneration_notice() {
                let mut fresh =
                    Appointment::available(appt.doctor_id, appt.start_time, appt.end_time, appt.reason);
                fresh.approved = appt.approved;
                let mut checker =
                    OverlapChecker::load(conn, &appt.doctor_id, appt.start_time, appt.end_time)?
                        .excluding(appt.id)
                        .reopening_canceled();
                if checker.admit(&fresh) {
                    db::insert_appointment(conn, &fresh)?;
                    replacement = Some(fresh);
                }
            }

            Ok(CancelOutcome {
                canceled: Self::load(conn, id)?,
                replacement,
            })
        })?;

        tracing::info!(
            id = %id,
            replacement = ?outcome.replacement.as_ref().map(|r| r.id),
            "Canceled appointment"
        );
        Ok(outcome)
    }

    pub fn approve(&self, id: &Uuid) -> Result<Appointment, SchedulingError> {
        self.set_approval(id, true)
    }

    pub fn disapprove(&self, id: &Uuid) -> Result<Appointment, SchedulingError> {
        self.set_approval(id, false)
    }

    /// Administrative write: flips the flag on any appointment, past or
    /// terminal, without re-running transition checks.
    fn set_approval(&self, id: &Uuid, approved: bool) -> Result<Appointment, SchedulingError> {
        let appt = self.write(|conn| {
            Self::load(conn, id)?;
            db::set_approved(conn, id, approved)?;
            Self::load(conn, id)
        })?;
        tracing::info!(id = %id, approved, "Updated appointment approval");
        Ok(appt)
    }

    /// Link a recorded diagnosis and close the appointment.
    pub fn complete(&self, id: &Uuid, diagnosis_id: &Uuid) -> Result<Appointment, SchedulingError> {
        let now = self.now();
        let done = self.write(|conn| {
            let appt = Self::load(conn, id)?;
            if appt.pet_id.is_none() {
                return Err(SchedulingError::MissingPet);
            }
            if appt.diagnosis_id.is_some() || appt.status == AppointmentStatus::Canceled {
                return Err(SchedulingError::AlreadyCompleted);
            }
            if now < appt.start_time || now > appt.end_time + completion_grace() {
                return Err(SchedulingError::CompletionWindow);
            }
            let recorded = self.directory.diagnosis_summary(id)?;
            if recorded.map(|d| d.id) != Some(*diagnosis_id) {
                return Err(SchedulingError::not_found("Diagnosis", diagnosis_id));
            }
            db::link_diagnosis(conn, id, diagnosis_id)?;
            Self::load(conn, id)
        })?;

        tracing::info!(id = %id, diagnosis = %diagnosis_id, "Completed appointment");
        Ok(done)
    }

    // ─── Sweeps ────────────────────────────────────────────

    pub fn sweep_expired_available(&self) -> Result<usize, SchedulingError> {
        let now = self.now();
        self.write(|conn| Ok(sweep::sweep_expired_available(conn, now)?))
    }

    pub fn sweep_expired_scheduled(&self) -> Result<usize, SchedulingError> {
        let now = self.now();
        self.write(|conn| Ok(sweep::sweep_expired_scheduled(conn, self.directory, now)?))
    }

    /// Read-path sweep: failures are logged and never reach the caller.
    pub(super) fn sweep_available_quietly(&self) {
        if let Err(e) = self.sweep_expired_available() {
            tracing::warn!(error = %e, "Expired-available sweep failed");
        }
    }

    pub(super) fn sweep_scheduled_quietly(&self) {
        if let Err(e) = self.sweep_expired_scheduled() {
            tracing::warn!(error = %e, "Expired-scheduled sweep failed");
        }
    }
}

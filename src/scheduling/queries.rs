//! Read operations. Availability reads run both sweeps first; schedule
//! and history reads run the scheduled sweep. Sweep failures never fail
//! the read.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::projection::{project, project_all, AppointmentView, Detail};
use super::{SchedulingEngine, SchedulingError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::db;
use crate::models::{Appointment, AppointmentStatus, Reason};

#[derive(Debug, Clone, Serialize)]
pub struct SchedulePage {
    pub items: Vec<AppointmentView>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl SchedulingEngine<'_> {
    fn require_client(&self, client_id: &Uuid) -> Result<(), SchedulingError> {
        if self.directory.get_client(client_id)?.is_none() {
            return Err(SchedulingError::not_found("Client", client_id));
        }
        Ok(())
    }

    fn require_pet(&self, pet_id: &Uuid) -> Result<(), SchedulingError> {
        if self.directory.get_pet(pet_id)?.is_none() {
            return Err(SchedulingError::not_found("Pet", pet_id));
        }
        Ok(())
    }

    fn sweep_for_availability(&self) {
        self.sweep_available_quietly();
        self.sweep_scheduled_quietly();
    }

    /// Project an appointment the engine just returned.
    pub fn view(&self, appt: &Appointment, detail: Detail) -> Result<AppointmentView, SchedulingError> {
        Ok(project(self.directory, appt, detail)?)
    }

    /// Full view of one appointment.
    pub fn get(&self, id: &Uuid) -> Result<AppointmentView, SchedulingError> {
        let appt = db::get_appointment(self.conn, id)?
            .ok_or_else(|| SchedulingError::not_found("Appointment", id))?;
        Ok(project(self.directory, &appt, Detail::HISTORY)?)
    }

    pub fn list_all(&self) -> Result<Vec<AppointmentView>, SchedulingError> {
        let all = db::list_all(self.conn)?;
        Ok(project_all(self.directory, &all, Detail::WITH_CLIENT)?)
    }

    // ─── Availability ──────────────────────────────────────

    pub fn available(&self) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.sweep_for_availability();
        let open = db::list_available(self.conn, None, &self.now())?;
        Ok(project_all(self.directory, &open, Detail::BASIC)?)
    }

    pub fn available_by_reason(&self, reason: Reason) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.sweep_for_availability();
        let open = db::list_available(self.conn, Some(reason), &self.now())?;
        Ok(project_all(self.directory, &open, Detail::BASIC)?)
    }

    pub fn available_by_reason_and_date(
        &self,
        reason: Reason,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.sweep_for_availability();
        let day_start = date.and_time(chrono::NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);
        let open = db::list_available_between(self.conn, reason, &day_start, &day_end, &self.now())?;
        Ok(project_all(self.directory, &open, Detail::BASIC)?)
    }

    /// Distinct calendar days with at least one open block, ascending.
    pub fn available_days(&self, reason: Reason) -> Result<Vec<NaiveDate>, SchedulingError> {
        self.sweep_for_availability();
        let open = db::list_available(self.conn, Some(reason), &self.now())?;
        let days: BTreeSet<NaiveDate> = open.iter().map(|a| a.start_time.date()).collect();
        Ok(days.into_iter().collect())
    }

    // ─── Doctor ────────────────────────────────────────────

    /// Blocks that have not ended yet, ascending, one page at a time.
    pub fn doctor_schedule(
        &self,
        doctor_id: &Uuid,
        page: Option<u32>,
        size: Option<u32>,
    ) -> Result<SchedulePage, SchedulingError> {
        self.sweep_scheduled_quietly();
        if !self.directory.doctor_exists(doctor_id)? {
            return Err(SchedulingError::not_found("Doctor", doctor_id));
        }
        let page = page.unwrap_or(0);
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let now = self.now();

        let rows = db::list_doctor_upcoming(self.conn, doctor_id, &now, size, page.saturating_mul(size))?;
        let total = db::count_doctor_upcoming(self.conn, doctor_id, &now)?;
        Ok(SchedulePage {
            items: project_all(self.directory, &rows, Detail::WITH_CLIENT)?,
            page,
            size,
            total,
        })
    }

    /// Booked appointments that already started, newest first.
    pub fn doctor_history(&self, doctor_id: &Uuid) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.sweep_scheduled_quietly();
        if !self.directory.doctor_exists(doctor_id)? {
            return Err(SchedulingError::not_found("Doctor", doctor_id));
        }
        let past = db::list_doctor_past_booked(self.conn, doctor_id, &self.now())?;
        Ok(project_all(self.directory, &past, Detail::HISTORY)?)
    }

    // ─── Client ────────────────────────────────────────────

    /// Completed appointments across the client's pets.
    pub fn client_appointments(&self, client_id: &Uuid) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.require_client(client_id)?;
        let pets = self.directory.client_pet_ids(client_id)?;
        let done: Vec<_> = db::list_by_pets(self.conn, &pets)?
            .into_iter()
            .filter(|a| a.status == AppointmentStatus::Successfully)
            .collect();
        Ok(project_all(self.directory, &done, Detail::BASIC)?)
    }

    /// Every booked appointment of the client's pets, newest first.
    pub fn client_history(&self, client_id: &Uuid) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.sweep_scheduled_quietly();
        self.require_client(client_id)?;
        let pets = self.directory.client_pet_ids(client_id)?;
        let booked = db::list_by_pets(self.conn, &pets)?;
        Ok(project_all(self.directory, &booked, Detail::HISTORY)?)
    }

    // ─── Pet ───────────────────────────────────────────────

    pub fn pet_appointments(&self, pet_id: &Uuid) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.require_pet(pet_id)?;
        let done: Vec<_> = db::list_by_pet(self.conn, pet_id)?
            .into_iter()
            .filter(|a| a.status == AppointmentStatus::Successfully)
            .collect();
        Ok(project_all(self.directory, &done, Detail::BASIC)?)
    }

    /// Completed and upcoming appointments of a pet.
    pub fn pet_all(&self, pet_id: &Uuid) -> Result<Vec<AppointmentView>, SchedulingError> {
        self.require_pet(pet_id)?;
        let active: Vec<_> = db::list_by_pet(self.conn, pet_id)?
            .into_iter()
            .filter(|a| {
                matches!(
                    a.status,
                    AppointmentStatus::Successfully | AppointmentStatus::ToBegin
                )
            })
            .collect();
        Ok(project_all(self.directory, &active, Detail::BASIC)?)
    }

    /// Id of the pet's next upcoming booked appointment.
    pub fn pet_scheduled_id(&self, pet_id: &Uuid) -> Result<Uuid, SchedulingError> {
        db::find_pet_scheduled(self.conn, pet_id, &self.now())?
            .map(|a| a.id)
            .ok_or_else(|| SchedulingError::not_found("Scheduled appointment for pet", pet_id))
    }
}

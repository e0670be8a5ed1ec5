//! Appointment → API view.
//!
//! One projection serves every listing; callers choose which optional
//! collaborator lookups to pay for.

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::directory::Directory;
use crate::models::{Appointment, AppointmentStatus, DiagnosisSummary, Reason};

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub reason: Reason,
    pub status: AppointmentStatus,
    pub approved: bool,
    pub doctor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_speciality: Option<String>,
    pub pet_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub has_diagnosis: bool,
    pub diagnosis_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<DiagnosisSummary>,
}

/// Optional sections of a view.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detail {
    pub client: bool,
    pub diagnosis: bool,
}

impl Detail {
    pub const BASIC: Detail = Detail {
        client: false,
        diagnosis: false,
    };
    pub const WITH_CLIENT: Detail = Detail {
        client: true,
        diagnosis: false,
    };
    pub const HISTORY: Detail = Detail {
        client: true,
        diagnosis: true,
    };
}

pub fn project(
    directory: &dyn Directory,
    appt: &Appointment,
    detail: Detail,
) -> Result<AppointmentView, DatabaseError> {
    let doctor = directory.get_doctor(&appt.doctor_id)?;
    let pet = match appt.pet_id {
        Some(pet_id) => directory.get_pet(&pet_id)?,
        None => None,
    };
    let client = match (&pet, detail.client) {
        (Some(pet), true) => directory.get_client(&pet.client_id)?,
        _ => None,
    };
    let diagnosis = if detail.diagnosis {
        directory.diagnosis_summary(&appt.id)?
    } else {
        None
    };
    let has_diagnosis = appt.diagnosis_id.is_some()
        || diagnosis.is_some()
        || (!detail.diagnosis && directory.has_diagnosis(&appt.id)?);

    Ok(AppointmentView {
        id: appt.id,
        start_time: appt.start_time,
        end_time: appt.end_time,
        reason: appt.reason,
        status: appt.status,
        approved: appt.approved,
        doctor_id: appt.doctor_id,
        doctor_name: doctor.as_ref().map(|d| d.full_name()),
        doctor_speciality: doctor.and_then(|d| d.speciality),
        pet_id: appt.pet_id,
        pet_name: pet.as_ref().map(|p| p.name.clone()),
        client_id: client.as_ref().map(|c| c.id),
        client_name: client.map(|c| c.full_name()),
        has_diagnosis,
        diagnosis_id: appt.diagnosis_id.or(diagnosis.as_ref().map(|d| d.id)),
        diagnosis,
    })
}

pub fn project_all(
    directory: &dyn Directory,
    appointments: &[Appointment],
    detail: Detail,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    appointments
        .iter()
        .map(|a| project(directory, a, detail))
        .collect()
}

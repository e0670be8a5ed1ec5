//! Collaborator lookups the scheduling core consumes.
//!
//! Doctors, pets, clients and diagnoses are owned elsewhere in the clinic
//! system. The engine only needs these narrow reads.

use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Client, DiagnosisSummary, Doctor, Pet};

pub trait Directory {
    fn get_doctor(&self, id: &Uuid) -> Result<Option<Doctor>, DatabaseError>;

    fn doctor_exists(&self, id: &Uuid) -> Result<bool, DatabaseError> {
        Ok(self.get_doctor(id)?.is_some())
    }

    fn get_pet(&self, id: &Uuid) -> Result<Option<Pet>, DatabaseError>;

    fn get_client(&self, id: &Uuid) -> Result<Option<Client>, DatabaseError>;

    /// Pets owned by a client.
    fn client_pet_ids(&self, client_id: &Uuid) -> Result<Vec<Uuid>, DatabaseError>;

    /// Whether a diagnosis has been recorded against the appointment.
    fn has_diagnosis(&self, appointment_id: &Uuid) -> Result<bool, DatabaseError> {
        Ok(self.diagnosis_summary(appointment_id)?.is_some())
    }

    fn diagnosis_summary(
        &self,
        appointment_id: &Uuid,
    ) -> Result<Option<DiagnosisSummary>, DatabaseError>;
}

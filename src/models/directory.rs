use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub speciality: Option<String>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub pet_type: Option<String>,
}

/// Diagnosis record written by the doctor after a consultation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisSummary {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub diagnose: String,
    pub treatment: Option<String>,
}

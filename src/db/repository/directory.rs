use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::directory::Directory;
use crate::models::*;

fn parse_uuid(column: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::CorruptValue {
        column: column.into(),
        value: value.into(),
    })
}

// ─── Seeding (collaborator tables) ─────────────────────────

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, name, surname, speciality) VALUES (?1, ?2, ?3, ?4)",
        params![
            doctor.id.to_string(),
            doctor.name,
            doctor.surname,
            doctor.speciality,
        ],
    )?;
    Ok(())
}

pub fn insert_client(conn: &Connection, client: &Client) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clients (id, name, surname) VALUES (?1, ?2, ?3)",
        params![client.id.to_string(), client.name, client.surname],
    )?;
    Ok(())
}

pub fn insert_pet(conn: &Connection, pet: &Pet) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO pets (id, client_id, name, pet_type) VALUES (?1, ?2, ?3, ?4)",
        params![
            pet.id.to_string(),
            pet.client_id.to_string(),
            pet.name,
            pet.pet_type,
        ],
    )?;
    Ok(())
}

pub fn insert_diagnosis(conn: &Connection, diagnosis: &DiagnosisSummary) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO diagnoses (id, appointment_id, diagnose, treatment) VALUES (?1, ?2, ?3, ?4)",
        params![
            diagnosis.id.to_string(),
            diagnosis.appointment_id.to_string(),
            diagnosis.diagnose,
            diagnosis.treatment,
        ],
    )
    .map_err(DatabaseError::from_write)?;
    Ok(())
}

// ─── Directory over SQLite ─────────────────────────────────

/// Collaborator lookups backed by the clinic tables of the same database.
pub struct SqliteDirectory<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteDirectory<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl Directory for SqliteDirectory<'_> {
    fn get_doctor(&self, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, surname, speciality FROM doctors WHERE id = ?1 AND active = 1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, surname, speciality)| -> Result<Doctor, DatabaseError> {
            Ok(Doctor {
                id: parse_uuid("doctors.id", &id)?,
                name,
                surname,
                speciality,
            })
        })
        .transpose()
    }

    fn get_pet(&self, id: &Uuid) -> Result<Option<Pet>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, client_id, name, pet_type FROM pets WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, client_id, name, pet_type)| -> Result<Pet, DatabaseError> {
            Ok(Pet {
                id: parse_uuid("pets.id", &id)?,
                client_id: parse_uuid("pets.client_id", &client_id)?,
                name,
                pet_type,
            })
        })
        .transpose()
    }

    fn get_client(&self, id: &Uuid) -> Result<Option<Client>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, surname FROM clients WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, surname)| -> Result<Client, DatabaseError> {
            Ok(Client {
                id: parse_uuid("clients.id", &id)?,
                name,
                surname,
            })
        })
        .transpose()
    }

    fn client_pet_ids(&self, client_id: &Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM pets WHERE client_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![client_id.to_string()], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(parse_uuid("pets.id", &row?)?);
        }
        Ok(ids)
    }

    fn has_diagnosis(&self, appointment_id: &Uuid) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM diagnoses WHERE appointment_id = ?1",
            params![appointment_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn diagnosis_summary(
        &self,
        appointment_id: &Uuid,
    ) -> Result<Option<DiagnosisSummary>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, diagnose, treatment FROM diagnoses WHERE appointment_id = ?1",
                params![appointment_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, diagnose, treatment)| -> Result<DiagnosisSummary, DatabaseError> {
            Ok(DiagnosisSummary {
                id: parse_uuid("diagnoses.id", &id)?,
                appointment_id: *appointment_id,
                diagnose,
                treatment,
            })
        })
        .transpose()
    }
}

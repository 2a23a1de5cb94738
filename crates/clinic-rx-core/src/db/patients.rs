//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, Table};
use crate::models::{NewPatient, Patient, RecordId};

const PATIENT_COLUMNS: &str = "id, cpf, sus_card, cid_code, name, birth_date, \
     mother_name, address, phone, neighborhood, notes";

impl Database {
    /// Insert a new patient, assigning the next ID.
    pub fn insert_patient(&self, patient: &NewPatient) -> DbResult<Patient> {
        patient
            .check_invariants()
            .map_err(|msg| DbError::Constraint(msg.to_string()))?;
        let id = Self::next_id(&self.conn, Table::Patients)?;
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, cpf, sus_card, cid_code, name, birth_date,
                mother_name, address, phone, neighborhood, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                id,
                patient.cpf,
                patient.sus_card,
                patient.cid_code,
                patient.name,
                patient.birth_date,
                patient.mother_name,
                patient.address,
                patient.phone,
                patient.neighborhood,
                patient.notes,
            ],
        )?;
        Ok(patient.clone().with_id(id))
    }

    /// Update an existing patient in place.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        patient
            .check_invariants()
            .map_err(|msg| DbError::Constraint(msg.to_string()))?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                cpf = ?2,
                sus_card = ?3,
                cid_code = ?4,
                name = ?5,
                birth_date = ?6,
                mother_name = ?7,
                address = ?8,
                phone = ?9,
                neighborhood = ?10,
                notes = ?11,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.cpf,
                patient.sus_card,
                patient.cid_code,
                patient.name,
                patient.birth_date,
                patient.mother_name,
                patient.address,
                patient.phone,
                patient.neighborhood,
                patient.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: RecordId) -> DbResult<Option<Patient>> {
        let sql = format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS);
        self.conn
            .query_row(&sql, [id], patient_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// List all patients in registration order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let sql = format!("SELECT {} FROM patients ORDER BY id", PATIENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient. Their prescriptions are left untouched.
    pub fn delete_patient(&self, id: RecordId) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        cpf: row.get(1)?,
        sus_card: row.get(2)?,
        cid_code: row.get(3)?,
        name: row.get(4)?,
        birth_date: row.get(5)?,
        mother_name: row.get(6)?,
        address: row.get(7)?,
        phone: row.get(8)?,
        neighborhood: row.get(9)?,
        notes: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut form = NewPatient::new("Maria Silva");
        form.cpf = "123.456.789-01".into();
        form.sus_card = "898001234567890".into();
        form.birth_date = "1980-05-02".into();

        let patient = db.insert_patient(&form).unwrap();
        assert_eq!(patient.id, 1);

        let retrieved = db.get_patient(patient.id).unwrap().unwrap();
        assert_eq!(retrieved, patient);
    }

    #[test]
    fn test_ids_follow_max() {
        let db = setup_db();

        let first = db.insert_patient(&NewPatient::new("Ana")).unwrap();
        let second = db.insert_patient(&NewPatient::new("Bruno")).unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        // Removing the highest ID frees it up again
        db.delete_patient(second.id).unwrap();
        let third = db.insert_patient(&NewPatient::new("Carla")).unwrap();
        assert_eq!(third.id, 2);

        // Gaps below the maximum are not reused
        db.delete_patient(first.id).unwrap();
        let fourth = db.insert_patient(&NewPatient::new("Diego")).unwrap();
        assert_eq!(fourth.id, 3);
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = db.insert_patient(&NewPatient::new("Maria")).unwrap();
        patient.phone = "(44) 99876-1234".into();
        patient.notes = "Alergia a dipirona".into();
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(patient.id).unwrap().unwrap();
        assert_eq!(retrieved.phone, "(44) 99876-1234");
        assert_eq!(retrieved.notes, "Alergia a dipirona");
    }

    #[test]
    fn test_blank_name_rejected() {
        let db = setup_db();
        let result = db.insert_patient(&NewPatient::new(""));
        assert!(matches!(result, Err(DbError::Constraint(_))));
        assert!(db.list_patients().unwrap().is_empty());
    }

    #[test]
    fn test_update_missing_patient() {
        let db = setup_db();
        let ghost = NewPatient::new("Ghost").with_id(99);
        assert!(!db.update_patient(&ghost).unwrap());
    }

    #[test]
    fn test_delete_patient() {
        let db = setup_db();
        let patient = db.insert_patient(&NewPatient::new("Maria")).unwrap();

        assert!(db.delete_patient(patient.id).unwrap());
        assert!(db.get_patient(patient.id).unwrap().is_none());
        assert!(!db.delete_patient(patient.id).unwrap());
    }
}

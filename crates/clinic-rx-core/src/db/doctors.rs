//! Doctor database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult, Table};
use crate::models::{Doctor, NewDoctor, RecordId};

impl Database {
    /// Insert a new doctor, assigning the next ID.
    pub fn insert_doctor(&self, doctor: &NewDoctor) -> DbResult<Doctor> {
        let id = Self::next_id(&self.conn, Table::Doctors)?;
        self.conn.execute(
            "INSERT INTO doctors (id, name, crm, specialty, phone) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, doctor.name, doctor.crm, doctor.specialty, doctor.phone],
        )?;
        Ok(doctor.clone().with_id(id))
    }

    /// Update an existing doctor.
    pub fn update_doctor(&self, doctor: &Doctor) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE doctors SET
                name = ?2,
                crm = ?3,
                specialty = ?4,
                phone = ?5,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![doctor.id, doctor.name, doctor.crm, doctor.specialty, doctor.phone],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: RecordId) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                "SELECT id, name, crm, specialty, phone FROM doctors WHERE id = ?",
                [id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all doctors.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, crm, specialty, phone FROM doctors ORDER BY id")?;
        let rows = stmt.query_map([], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a doctor.
    pub fn delete_doctor(&self, id: RecordId) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM doctors WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        crm: row.get(2)?,
        specialty: row.get(3)?,
        phone: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctor_crud() {
        let db = Database::open_in_memory().unwrap();

        let mut form = NewDoctor::new("Dr. João", "12345");
        form.specialty = "Clínico Geral".into();
        let mut doctor = db.insert_doctor(&form).unwrap();
        assert_eq!(doctor.id, 1);

        doctor.phone = "(44) 3275-1234".into();
        assert!(db.update_doctor(&doctor).unwrap());
        assert_eq!(db.get_doctor(1).unwrap().unwrap().phone, "(44) 3275-1234");

        assert!(db.delete_doctor(1).unwrap());
        assert!(db.get_doctor(1).unwrap().is_none());
        assert!(db.list_doctors().unwrap().is_empty());
    }
}

//! Prescription database operations.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult, Table};
use crate::models::{NewPrescription, Prescription, PrescriptionMedicine, RecordId};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Database {
    /// Insert a prescription, assigning the next ID.
    pub fn insert_prescription(&self, prescription: &NewPrescription) -> DbResult<Prescription> {
        insert_on(&self.conn, prescription)
    }

    /// Insert several prescriptions in one transaction.
    ///
    /// Either every record is written, with consecutive IDs, or none is.
    pub fn insert_prescriptions(
        &self,
        prescriptions: &[NewPrescription],
    ) -> DbResult<Vec<Prescription>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut created = Vec::with_capacity(prescriptions.len());
        for prescription in prescriptions {
            created.push(insert_on(&tx, prescription)?);
        }
        tx.commit()?;
        Ok(created)
    }

    /// Replace a stored prescription wholesale.
    pub fn update_prescription(&self, prescription: &Prescription) -> DbResult<bool> {
        check(&prescription.to_new())?;
        let medicines_json = serde_json::to_string(&prescription.medicines)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE prescriptions SET
                patient_id = ?2,
                doctor_id = ?3,
                issue_date = ?4,
                medicines = ?5,
                observations = ?6
            WHERE id = ?1
            "#,
            params![
                prescription.id,
                prescription.patient_id,
                prescription.doctor_id,
                prescription.date.format(DATE_FORMAT).to_string(),
                medicines_json,
                prescription.observations,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a prescription by ID.
    pub fn get_prescription(&self, id: RecordId) -> DbResult<Option<Prescription>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, doctor_id, issue_date, medicines, observations
                FROM prescriptions
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(PrescriptionRow {
                        id: row.get(0)?,
                        patient_id: row.get(1)?,
                        doctor_id: row.get(2)?,
                        issue_date: row.get(3)?,
                        medicines: row.get(4)?,
                        observations: row.get(5)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all prescriptions in creation order.
    pub fn list_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, doctor_id, issue_date, medicines, observations
            FROM prescriptions
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PrescriptionRow {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                doctor_id: row.get(2)?,
                issue_date: row.get(3)?,
                medicines: row.get(4)?,
                observations: row.get(5)?,
            })
        })?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }

    /// List the prescriptions issued to one patient.
    pub fn list_prescriptions_for_patient(
        &self,
        patient_id: RecordId,
    ) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, doctor_id, issue_date, medicines, observations
            FROM prescriptions
            WHERE patient_id = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([patient_id], |row| {
            Ok(PrescriptionRow {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                doctor_id: row.get(2)?,
                issue_date: row.get(3)?,
                medicines: row.get(4)?,
                observations: row.get(5)?,
            })
        })?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }

    /// Delete a prescription.
    pub fn delete_prescription(&self, id: RecordId) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescriptions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn check(prescription: &NewPrescription) -> DbResult<()> {
    prescription
        .check_invariants()
        .map_err(|msg| DbError::Constraint(msg.to_string()))
}

fn insert_on(conn: &Connection, prescription: &NewPrescription) -> DbResult<Prescription> {
    check(prescription)?;
    let id = Database::next_id(conn, Table::Prescriptions)?;
    let medicines_json = serde_json::to_string(&prescription.medicines)?;

    conn.execute(
        r#"
        INSERT INTO prescriptions (
            id, patient_id, doctor_id, issue_date, medicines, observations
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            id,
            prescription.patient_id,
            prescription.doctor_id,
            prescription.date.format(DATE_FORMAT).to_string(),
            medicines_json,
            prescription.observations,
        ],
    )?;
    Ok(prescription.clone().with_id(id))
}

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    id: RecordId,
    patient_id: RecordId,
    doctor_id: RecordId,
    issue_date: String,
    medicines: String,
    observations: String,
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let medicines: Vec<PrescriptionMedicine> = serde_json::from_str(&row.medicines)?;
        let date = NaiveDate::parse_from_str(&row.issue_date, DATE_FORMAT).map_err(|e| {
            DbError::Constraint(format!("Bad issue date {:?}: {}", row.issue_date, e))
        })?;

        Ok(Prescription {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            date,
            medicines,
            observations: row.observations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_prescription(patient_id: RecordId, day: u32) -> NewPrescription {
        NewPrescription {
            patient_id,
            doctor_id: 3,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            medicines: vec![PrescriptionMedicine::new(9, "1 comprimido a cada 8h")],
            observations: "Retorno em 15 dias".into(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let created = db.insert_prescription(&make_prescription(7, 10)).unwrap();
        assert_eq!(created.id, 1);

        let retrieved = db.get_prescription(created.id).unwrap().unwrap();
        assert_eq!(retrieved, created);
        assert_eq!(retrieved.medicines[0].posology, "1 comprimido a cada 8h");
    }

    #[test]
    fn test_insert_rejects_empty_medicines() {
        let db = setup_db();

        let mut prescription = make_prescription(7, 10);
        prescription.medicines.clear();
        let result = db.insert_prescription(&prescription);

        assert!(matches!(result, Err(DbError::Constraint(_))));
        assert!(db.list_prescriptions().unwrap().is_empty());
    }

    #[test]
    fn test_batch_insert_assigns_consecutive_ids() {
        let db = setup_db();
        db.insert_prescription(&make_prescription(1, 1)).unwrap();

        let created = db
            .insert_prescriptions(&[make_prescription(7, 10), make_prescription(7, 17)])
            .unwrap();
        let ids: Vec<_> = created.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_batch_insert_is_atomic() {
        let db = setup_db();

        let mut bad = make_prescription(7, 17);
        bad.medicines.clear();
        let result = db.insert_prescriptions(&[make_prescription(7, 10), bad]);

        assert!(result.is_err());
        assert!(db.list_prescriptions().unwrap().is_empty());
    }

    #[test]
    fn test_list_for_patient() {
        let db = setup_db();
        db.insert_prescription(&make_prescription(7, 10)).unwrap();
        db.insert_prescription(&make_prescription(8, 11)).unwrap();
        db.insert_prescription(&make_prescription(7, 12)).unwrap();

        let for_patient = db.list_prescriptions_for_patient(7).unwrap();
        assert_eq!(for_patient.len(), 2);
        assert!(for_patient.iter().all(|p| p.patient_id == 7));
    }

    #[test]
    fn test_update_replaces_record() {
        let db = setup_db();
        let mut prescription = db.insert_prescription(&make_prescription(7, 10)).unwrap();

        prescription.medicines = vec![
            PrescriptionMedicine::new(1, "1 gota"),
            PrescriptionMedicine::new(2, "2 gotas"),
        ];
        prescription.observations.clear();
        assert!(db.update_prescription(&prescription).unwrap());

        let retrieved = db.get_prescription(prescription.id).unwrap().unwrap();
        assert_eq!(retrieved.medicine_ids(), vec![1, 2]);
        assert_eq!(retrieved.observations, "");
    }

    #[test]
    fn test_delete() {
        let db = setup_db();
        let prescription = db.insert_prescription(&make_prescription(7, 10)).unwrap();

        assert!(db.delete_prescription(prescription.id).unwrap());
        assert!(db.get_prescription(prescription.id).unwrap().is_none());
    }
}

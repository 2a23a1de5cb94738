//! Medicine catalog database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult, Table};
use crate::models::{Medicine, NewMedicine, RecordId};

impl Database {
    /// Insert a new catalog entry, assigning the next ID.
    pub fn insert_medicine(&self, medicine: &NewMedicine) -> DbResult<Medicine> {
        let id = Self::next_id(&self.conn, Table::Medicines)?;
        self.conn.execute(
            r#"
            INSERT INTO medicines (id, name, description, dosage, presentation)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                id,
                medicine.name,
                medicine.description,
                medicine.dosage,
                medicine.presentation,
            ],
        )?;
        Ok(medicine.clone().with_id(id))
    }

    /// Update an existing catalog entry.
    pub fn update_medicine(&self, medicine: &Medicine) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medicines SET
                name = ?2,
                description = ?3,
                dosage = ?4,
                presentation = ?5,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                medicine.id,
                medicine.name,
                medicine.description,
                medicine.dosage,
                medicine.presentation,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a catalog entry by ID.
    pub fn get_medicine(&self, id: RecordId) -> DbResult<Option<Medicine>> {
        self.conn
            .query_row(
                "SELECT id, name, description, dosage, presentation FROM medicines WHERE id = ?",
                [id],
                medicine_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List the whole catalog in insertion order.
    pub fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, dosage, presentation FROM medicines ORDER BY id",
        )?;
        let rows = stmt.query_map([], medicine_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a catalog entry. Prescriptions referencing it keep the dangling ID.
    pub fn delete_medicine(&self, id: RecordId) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM medicines WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn medicine_from_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        dosage: row.get(3)?,
        presentation: row.get(4)?,
    })
}

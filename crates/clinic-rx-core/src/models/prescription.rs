//! Prescription models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecordId;

/// One medicine on a prescription, with instructions on how to take it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrescriptionMedicine {
    #[serde(rename = "medicamentoId")]
    pub medicine_id: RecordId,
    #[serde(rename = "posologia")]
    pub posology: String,
}

impl PrescriptionMedicine {
    pub fn new(medicine_id: RecordId, posology: impl Into<String>) -> Self {
        Self {
            medicine_id,
            posology: posology.into(),
        }
    }
}

/// A persisted prescription. Replaced wholesale on update, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prescription {
    pub id: RecordId,
    #[serde(rename = "pacienteId")]
    pub patient_id: RecordId,
    #[serde(rename = "medicoId")]
    pub doctor_id: RecordId,
    /// Issue date, `YYYY-MM-DD` on the wire
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "medicamentos")]
    pub medicines: Vec<PrescriptionMedicine>,
    #[serde(rename = "observacoes", default)]
    pub observations: String,
}

/// Prescription fields handed to the repository, which assigns the ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPrescription {
    #[serde(rename = "pacienteId")]
    pub patient_id: RecordId,
    #[serde(rename = "medicoId")]
    pub doctor_id: RecordId,
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "medicamentos")]
    pub medicines: Vec<PrescriptionMedicine>,
    #[serde(rename = "observacoes", default)]
    pub observations: String,
}

impl NewPrescription {
    /// Check the invariants every stored prescription must hold.
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        if self.patient_id <= 0 {
            return Err("prescription must reference a patient");
        }
        if self.medicines.is_empty() {
            return Err("prescription must contain at least one medicine");
        }
        Ok(())
    }

    pub fn with_id(self, id: RecordId) -> Prescription {
        Prescription {
            id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            date: self.date,
            medicines: self.medicines,
            observations: self.observations,
        }
    }
}

impl Prescription {
    /// Strip the ID, e.g. to re-issue the same content on another date.
    pub fn to_new(&self) -> NewPrescription {
        NewPrescription {
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            date: self.date,
            medicines: self.medicines.clone(),
            observations: self.observations.clone(),
        }
    }

    /// Medicine IDs in prescription order.
    pub fn medicine_ids(&self) -> Vec<RecordId> {
        self.medicines.iter().map(|m| m.medicine_id).collect()
    }
}

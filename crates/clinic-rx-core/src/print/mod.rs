//! Printable prescription document.
//!
//! A stored prescription is projected once into a [`PrescriptionDocument`]
//! together with the records it references. Both the on-screen preview and
//! the print layout render from that same projection.
//!
//! Prescriptions are never cascaded on delete, so any referenced patient,
//! doctor or medicine may be gone. Missing references project to blank
//! fields instead of failing.

mod render;

pub use render::{escape_html, render, RenderMode};

use serde::{Deserialize, Serialize};

use crate::format::{display_date, format_cpf, format_date_display, format_phone};
use crate::models::{Doctor, Medicine, Patient, Prescription, RecordId};
use crate::repository::{RepoResult, Repository};

/// Shown in place of a medicine that no longer exists in the catalog.
pub const MISSING_MEDICINE: &str = "Medicamento não encontrado";

/// Institution lines printed at the top of every prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionHeader {
    pub institution: String,
    pub department: String,
    pub region: String,
}

impl Default for InstitutionHeader {
    fn default() -> Self {
        Self {
            institution: "PREFEITURA MUNICIPAL DE PEROBAL".to_string(),
            department: "SECRETARIA MUNICIPAL DE SAÚDE".to_string(),
            region: "Estado do Paraná".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorBlock {
    pub name: String,
    pub crm: String,
    pub specialty: String,
    /// Only printed when the doctor has a contact number
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientBlock {
    pub name: String,
    pub cpf: String,
    pub sus_card: Option<String>,
    /// `DD/MM/YYYY`, or blank
    pub birth_date: String,
}

/// One numbered medicine line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    /// 1-based position on the prescription
    pub number: usize,
    pub medicine_id: RecordId,
    pub name: String,
    pub dosage: String,
    pub presentation: String,
    pub posology: String,
    /// False when the medicine ID no longer resolves
    pub resolved: bool,
}

impl DocumentLine {
    /// `Name - dosage (presentation)`, or the missing-medicine placeholder.
    pub fn title(&self) -> String {
        if !self.resolved {
            return MISSING_MEDICINE.to_string();
        }
        let mut title = self.name.clone();
        if !self.dosage.is_empty() {
            title.push_str(" - ");
            title.push_str(&self.dosage);
        }
        if !self.presentation.is_empty() {
            title.push_str(&format!(" ({})", self.presentation));
        }
        title
    }
}

/// Signature block: repeats the doctor's name and CRM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub crm: String,
}

/// Everything printed on a prescription, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionDocument {
    pub prescription_id: RecordId,
    pub header: InstitutionHeader,
    pub doctor: DoctorBlock,
    pub patient: PatientBlock,
    pub lines: Vec<DocumentLine>,
    pub observations: Option<String>,
    /// Issue date as `DD/MM/YYYY`
    pub issue_date: String,
    pub signature: Signature,
}

/// Records a prescription may reference.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub patients: Vec<Patient>,
    pub doctors: Vec<Doctor>,
    pub medicines: Vec<Medicine>,
}

impl Catalogs {
    /// Load only the records one prescription references.
    pub fn for_prescription<R: Repository + ?Sized>(
        repo: &R,
        prescription: &Prescription,
    ) -> RepoResult<Self> {
        let mut medicines = Vec::new();
        for id in prescription.medicine_ids() {
            if medicines.iter().any(|m: &Medicine| m.id == id) {
                continue;
            }
            if let Some(medicine) = repo.get_medicine(id)? {
                medicines.push(medicine);
            }
        }

        Ok(Self {
            patients: repo.get_patient(prescription.patient_id)?.into_iter().collect(),
            doctors: repo.get_doctor(prescription.doctor_id)?.into_iter().collect(),
            medicines,
        })
    }

    pub fn patient(&self, id: RecordId) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn doctor(&self, id: RecordId) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn medicine(&self, id: RecordId) -> Option<&Medicine> {
        self.medicines.iter().find(|m| m.id == id)
    }
}

impl PrescriptionDocument {
    /// Project a prescription and its references into printable blocks.
    pub fn project(
        prescription: &Prescription,
        catalogs: &Catalogs,
        header: &InstitutionHeader,
    ) -> Self {
        let doctor = catalogs.doctor(prescription.doctor_id);
        if doctor.is_none() {
            tracing::warn!(
                prescription_id = prescription.id,
                doctor_id = prescription.doctor_id,
                "prescription references a missing doctor"
            );
        }
        let patient = catalogs.patient(prescription.patient_id);
        if patient.is_none() {
            tracing::warn!(
                prescription_id = prescription.id,
                patient_id = prescription.patient_id,
                "prescription references a missing patient"
            );
        }

        let doctor_block = doctor.map(doctor_block).unwrap_or_default();
        let signature = Signature {
            name: doctor_block.name.clone(),
            crm: doctor_block.crm.clone(),
        };

        let lines = prescription
            .medicines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let medicine = catalogs.medicine(line.medicine_id);
                if medicine.is_none() {
                    tracing::debug!(
                        prescription_id = prescription.id,
                        medicine_id = line.medicine_id,
                        "medicine no longer in catalog"
                    );
                }
                DocumentLine {
                    number: index + 1,
                    medicine_id: line.medicine_id,
                    name: medicine.map(|m| m.name.clone()).unwrap_or_default(),
                    dosage: medicine.map(|m| m.dosage.clone()).unwrap_or_default(),
                    presentation: medicine.map(|m| m.presentation.clone()).unwrap_or_default(),
                    posology: line.posology.clone(),
                    resolved: medicine.is_some(),
                }
            })
            .collect();

        let observations = Some(prescription.observations.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string);

        Self {
            prescription_id: prescription.id,
            header: header.clone(),
            doctor: doctor_block,
            patient: patient.map(patient_block).unwrap_or_default(),
            lines,
            observations,
            issue_date: display_date(prescription.date),
            signature,
        }
    }

    /// Look up a stored prescription and project it.
    ///
    /// Returns `None` only when the prescription itself does not exist.
    pub fn load<R: Repository + ?Sized>(
        repo: &R,
        prescription_id: RecordId,
        header: &InstitutionHeader,
    ) -> RepoResult<Option<Self>> {
        let Some(prescription) = repo.get_prescription(prescription_id)? else {
            return Ok(None);
        };
        let catalogs = Catalogs::for_prescription(repo, &prescription)?;
        Ok(Some(Self::project(&prescription, &catalogs, header)))
    }

    /// Render in the given mode.
    pub fn render(&self, mode: RenderMode) -> String {
        render(self, mode)
    }
}

fn doctor_block(doctor: &Doctor) -> DoctorBlock {
    DoctorBlock {
        name: doctor.name.clone(),
        crm: doctor.crm.clone(),
        specialty: doctor.specialty.clone(),
        phone: Some(format_phone(&doctor.phone)).filter(|p| !p.is_empty()),
    }
}

fn patient_block(patient: &Patient) -> PatientBlock {
    PatientBlock {
        name: patient.name.clone(),
        cpf: format_cpf(&patient.cpf),
        sus_card: patient.has_sus_card().then(|| patient.sus_card.clone()),
        birth_date: format_date_display(&patient.birth_date),
    }
}

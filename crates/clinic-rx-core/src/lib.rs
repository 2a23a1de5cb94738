//! Clinic Rx Core Library
//!
//! Record keeping for a municipal health clinic (patients, doctors,
//! medicines, prescriptions) and the prescription-generation workflow.
//!
//! # Architecture
//!
//! ```text
//!   pick patient ──► PrescriptionDraft ◄── doctors + catalog snapshot
//!                          │
//!          lines, posology, issue dates, observations
//!                          │
//!                       submit
//!                          │
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//!       date 1          date 2   ...    date N      (one record each)
//!          └───────────────┼───────────────┘
//!                          ▼
//!                 Repository (SQLite | key-value)
//!                          │
//!                          ▼
//!        PrescriptionDocument ──► Screen / Print
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Doctor, Medicine, Prescription)
//! - [`format`]: CPF/phone/SUS card/CRM masks and date display
//! - [`search`]: In-memory filtering of catalogs and patient lookup
//! - [`repository`]: Storage contract the workflow is written against
//! - [`db`]: SQLite backend
//! - [`store`]: Key-value (local-storage style) backend
//! - [`draft`]: Prescription draft builder with date fan-out
//! - [`print`]: Printable prescription projection and renderers
//! - [`config`]: Startup configuration

pub mod config;
pub mod db;
pub mod draft;
pub mod format;
pub mod models;
pub mod print;
pub mod repository;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use config::{Backend, ClinicConfig, ConfigError};
pub use db::Database;
pub use draft::{Clock, DateConfig, DateResult, DraftError, PrescriptionDraft, SubmitReport};
pub use models::{
    Doctor, Medicine, NewDoctor, NewMedicine, NewPatient, NewPrescription, Patient, Prescription,
    PrescriptionMedicine, RecordId,
};
pub use print::{Catalogs, InstitutionHeader, PrescriptionDocument, RenderMode};
pub use repository::{seed_default_medicines, Repository, RepositoryError};
pub use store::KeyValueStore;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

type SharedRepository = Arc<Mutex<Box<dyn Repository + Send>>>;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<RepositoryError> for ClinicError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Constraint(msg) => ClinicError::InvalidInput(msg),
            other => ClinicError::StorageError(other.to_string()),
        }
    }
}

impl From<DraftError> for ClinicError {
    fn from(e: DraftError) -> Self {
        if e.is_validation() {
            ClinicError::ValidationError(e.to_string())
        } else {
            ClinicError::StorageError(e.to_string())
        }
    }
}

impl From<ConfigError> for ClinicError {
    fn from(e: ConfigError) -> Self {
        ClinicError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::StorageError(format!("Lock poisoned: {}", e))
    }
}

fn parse_date(value: &str) -> Result<chrono::NaiveDate, ClinicError> {
    format::parse_iso_date(value)
        .ok_or_else(|| ClinicError::InvalidInput(format!("not an ISO date: {}", value)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn core_from(repo: Box<dyn Repository + Send>, header: InstitutionHeader) -> Arc<ClinicCore> {
    Arc::new(ClinicCore {
        repo: Arc::new(Mutex::new(repo)),
        header,
    })
}

/// Open or create a SQLite database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path).map_err(RepositoryError::from)?;
    Ok(core_from(Box::new(db), InstitutionHeader::default()))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory().map_err(RepositoryError::from)?;
    Ok(core_from(Box::new(db), InstitutionHeader::default()))
}

/// Open or create a key-value JSON store at the given path.
#[uniffi::export]
pub fn open_key_value_store(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let store = KeyValueStore::open(&path).map_err(RepositoryError::from)?;
    Ok(core_from(Box::new(store), InstitutionHeader::default()))
}

/// Open whichever backend the raw configuration values select.
#[uniffi::export]
pub fn open_configured(
    backend: Option<String>,
    storage_path: Option<String>,
    institution: Option<String>,
    department: Option<String>,
    region: Option<String>,
) -> Result<Arc<ClinicCore>, ClinicError> {
    let config =
        ClinicConfig::from_env_values(backend, storage_path, institution, department, region)?;
    let repo = config.open_repository()?;
    Ok(core_from(repo, config.header().clone()))
}

/// Mask a CPF as `###.###.###-##`.
#[uniffi::export]
pub fn mask_cpf(value: String) -> String {
    format::format_cpf(&value)
}

/// Mask a phone number as `(##) #####-####`.
#[uniffi::export]
pub fn mask_phone(value: String) -> String {
    format::format_phone(&value)
}

/// Keep at most 15 SUS card digits.
#[uniffi::export]
pub fn mask_sus_card(value: String) -> String {
    format::format_sus_card(&value)
}

/// Keep only CRM digits.
#[uniffi::export]
pub fn mask_crm(value: String) -> String {
    format::format_crm(&value)
}

/// Render an ISO date as `DD/MM/YYYY`.
#[uniffi::export]
pub fn display_date(value: String) -> String {
    format::format_date_display(&value)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe repository wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    repo: SharedRepository,
    header: InstitutionHeader,
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient. The `id` field is ignored.
    pub fn add_patient(&self, patient: FfiPatient) -> Result<FfiPatient, ClinicError> {
        let mut repo = self.repo.lock()?;
        let created = repo.add_patient(&patient.into())?;
        Ok(created.into())
    }

    pub fn update_patient(&self, patient: FfiPatient) -> Result<bool, ClinicError> {
        let mut repo = self.repo.lock()?;
        let patient = Patient::from(patient);
        Ok(repo.update_patient(&patient)?)
    }

    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.get_patient(id)?.map(Into::into))
    }

    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.list_patients()?.into_iter().map(Into::into).collect())
    }

    /// Find patients by CPF (exact, digits only) or by name.
    pub fn search_patients(&self, term: String) -> Result<Vec<FfiPatient>, ClinicError> {
        let repo = self.repo.lock()?;
        let patients = repo.list_patients()?;
        Ok(search::search_patients(&patients, &term)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn delete_patient(&self, id: i64) -> Result<bool, ClinicError> {
        let mut repo = self.repo.lock()?;
        Ok(repo.delete_patient(id)?)
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    /// Register a doctor. The `id` field is ignored.
    pub fn add_doctor(&self, doctor: FfiDoctor) -> Result<FfiDoctor, ClinicError> {
        let mut repo = self.repo.lock()?;
        let created = repo.add_doctor(&doctor.into())?;
        Ok(created.into())
    }

    pub fn update_doctor(&self, doctor: FfiDoctor) -> Result<bool, ClinicError> {
        let mut repo = self.repo.lock()?;
        let doctor = Doctor::from(doctor);
        Ok(repo.update_doctor(&doctor)?)
    }

    pub fn get_doctor(&self, id: i64) -> Result<Option<FfiDoctor>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.get_doctor(id)?.map(Into::into))
    }

    pub fn list_doctors(&self) -> Result<Vec<FfiDoctor>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.list_doctors()?.into_iter().map(Into::into).collect())
    }

    pub fn search_doctors(&self, term: String) -> Result<Vec<FfiDoctor>, ClinicError> {
        let repo = self.repo.lock()?;
        let doctors = repo.list_doctors()?;
        Ok(search::filter_doctors(&doctors, &term)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn delete_doctor(&self, id: i64) -> Result<bool, ClinicError> {
        let mut repo = self.repo.lock()?;
        Ok(repo.delete_doctor(id)?)
    }

    // =========================================================================
    // Medicine Operations
    // =========================================================================

    /// Add a catalog entry. The `id` field is ignored.
    pub fn add_medicine(&self, medicine: FfiMedicine) -> Result<FfiMedicine, ClinicError> {
        let mut repo = self.repo.lock()?;
        let created = repo.add_medicine(&medicine.into())?;
        Ok(created.into())
    }

    pub fn update_medicine(&self, medicine: FfiMedicine) -> Result<bool, ClinicError> {
        let mut repo = self.repo.lock()?;
        let medicine = Medicine::from(medicine);
        Ok(repo.update_medicine(&medicine)?)
    }

    pub fn get_medicine(&self, id: i64) -> Result<Option<FfiMedicine>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.get_medicine(id)?.map(Into::into))
    }

    pub fn list_medicines(&self) -> Result<Vec<FfiMedicine>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.list_medicines()?.into_iter().map(Into::into).collect())
    }

    /// Case-insensitive name filter over the whole catalog.
    pub fn filter_medicines(&self, term: String) -> Result<Vec<FfiMedicine>, ClinicError> {
        let repo = self.repo.lock()?;
        let catalog = repo.list_medicines()?;
        Ok(search::filter_medicines(&catalog, &term)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn delete_medicine(&self, id: i64) -> Result<bool, ClinicError> {
        let mut repo = self.repo.lock()?;
        Ok(repo.delete_medicine(id)?)
    }

    /// Load the standard SUS list into an empty catalog.
    pub fn seed_default_medicines(&self) -> Result<u32, ClinicError> {
        let mut repo = self.repo.lock()?;
        let count = seed_default_medicines(repo.as_mut())?;
        Ok(count as u32)
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    pub fn list_prescriptions(&self) -> Result<Vec<FfiPrescription>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.list_prescriptions()?.into_iter().map(Into::into).collect())
    }

    pub fn prescriptions_for_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<FfiPrescription>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo
            .prescriptions_for_patient(patient_id)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn get_prescription(&self, id: i64) -> Result<Option<FfiPrescription>, ClinicError> {
        let repo = self.repo.lock()?;
        Ok(repo.get_prescription(id)?.map(Into::into))
    }

    pub fn delete_prescription(&self, id: i64) -> Result<bool, ClinicError> {
        let mut repo = self.repo.lock()?;
        Ok(repo.delete_prescription(id)?)
    }

    /// Render a stored prescription as plain text (`print == false`) or as
    /// a printable HTML page.
    pub fn render_prescription(&self, id: i64, print: bool) -> Result<String, ClinicError> {
        let repo = self.repo.lock()?;
        let doc = PrescriptionDocument::load(repo.as_ref(), id, &self.header)?
            .ok_or_else(|| ClinicError::NotFound(format!("prescription {}", id)))?;
        let mode = if print {
            RenderMode::Print
        } else {
            RenderMode::Screen
        };
        Ok(doc.render(mode))
    }

    // =========================================================================
    // Draft Operations
    // =========================================================================

    /// Start a prescription draft for a patient, dated today.
    pub fn start_draft(&self, patient_id: i64) -> Result<Arc<DraftSession>, ClinicError> {
        let repo = self.repo.lock()?;
        let draft = PrescriptionDraft::start(repo.as_ref(), patient_id)?;
        Ok(Arc::new(DraftSession {
            repo: Arc::clone(&self.repo),
            draft: Mutex::new(draft),
        }))
    }
}

// =========================================================================
// Draft Session Object
// =========================================================================

/// One prescription form bound to the repository it submits to.
#[derive(uniffi::Object)]
pub struct DraftSession {
    repo: SharedRepository,
    draft: Mutex<PrescriptionDraft>,
}

#[uniffi::export]
impl DraftSession {
    pub fn patient(&self) -> Result<Option<FfiPatient>, ClinicError> {
        let draft = self.draft.lock()?;
        Ok(draft.patient().cloned().map(Into::into))
    }

    pub fn doctors(&self) -> Result<Vec<FfiDoctor>, ClinicError> {
        let draft = self.draft.lock()?;
        Ok(draft.doctors().iter().cloned().map(Into::into).collect())
    }

    pub fn select_doctor(&self, doctor_id: i64) -> Result<(), ClinicError> {
        self.draft.lock()?.select_doctor(doctor_id);
        Ok(())
    }

    pub fn set_search_term(&self, term: String) -> Result<(), ClinicError> {
        self.draft.lock()?.set_search_term(term);
        Ok(())
    }

    pub fn filtered_medicines(&self) -> Result<Vec<FfiMedicine>, ClinicError> {
        let draft = self.draft.lock()?;
        Ok(draft
            .filtered_medicines()
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn add_line(&self, medicine_id: Option<i64>, posology: String) -> Result<(), ClinicError> {
        self.draft.lock()?.add_line(medicine_id, &posology)?;
        Ok(())
    }

    pub fn remove_line(&self, index: u32) -> Result<bool, ClinicError> {
        Ok(self.draft.lock()?.remove_line(index as usize))
    }

    pub fn lines(&self) -> Result<Vec<FfiPrescriptionMedicine>, ClinicError> {
        let draft = self.draft.lock()?;
        Ok(draft
            .medicine_lines()
            .iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Add an enabled issue date (`YYYY-MM-DD`).
    pub fn add_date(&self, date: String) -> Result<(), ClinicError> {
        let date = parse_date(&date)?;
        self.draft.lock()?.add_date(date);
        Ok(())
    }

    pub fn remove_date(&self, index: u32) -> Result<bool, ClinicError> {
        Ok(self.draft.lock()?.remove_date(index as usize))
    }

    pub fn toggle_date(&self, index: u32, enabled: bool) -> Result<bool, ClinicError> {
        Ok(self.draft.lock()?.toggle_date(index as usize, enabled))
    }

    pub fn edit_date(&self, index: u32, date: String) -> Result<bool, ClinicError> {
        let date = parse_date(&date)?;
        Ok(self.draft.lock()?.edit_date(index as usize, date))
    }

    pub fn date_configs(&self) -> Result<Vec<FfiDateConfig>, ClinicError> {
        let draft = self.draft.lock()?;
        Ok(draft.date_configs().iter().map(|&c| c.into()).collect())
    }

    pub fn set_observations(&self, observations: String) -> Result<(), ClinicError> {
        self.draft.lock()?.set_observations(observations);
        Ok(())
    }

    pub fn can_submit(&self) -> Result<bool, ClinicError> {
        Ok(self.draft.lock()?.can_submit())
    }

    /// Submit the draft.
    ///
    /// Validation failures are errors. Storage failures come back as a
    /// report with `all_created == false` and the draft left untouched.
    pub fn submit(&self) -> Result<FfiSubmitReport, ClinicError> {
        let mut draft = self.draft.lock()?;
        let mut repo = self.repo.lock()?;
        match draft.submit(repo.as_mut()) {
            Ok(report) => Ok(report.into()),
            Err(DraftError::Persistence { report, .. }) => Ok(report.into()),
            Err(e) => Err(e.into()),
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub sus_card: String,
    pub cid_code: String,
    pub birth_date: String,
    pub mother_name: String,
    pub address: String,
    pub phone: String,
    pub neighborhood: String,
    pub notes: String,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            name: p.name,
            cpf: p.cpf,
            sus_card: p.sus_card,
            cid_code: p.cid_code,
            birth_date: p.birth_date,
            mother_name: p.mother_name,
            address: p.address,
            phone: p.phone,
            neighborhood: p.neighborhood,
            notes: p.notes,
        }
    }
}

impl From<FfiPatient> for Patient {
    fn from(p: FfiPatient) -> Self {
        Patient {
            id: p.id,
            cpf: p.cpf,
            sus_card: p.sus_card,
            cid_code: p.cid_code,
            name: p.name,
            birth_date: p.birth_date,
            mother_name: p.mother_name,
            address: p.address,
            phone: p.phone,
            neighborhood: p.neighborhood,
            notes: p.notes,
        }
    }
}

impl From<FfiPatient> for NewPatient {
    fn from(p: FfiPatient) -> Self {
        NewPatient {
            cpf: p.cpf,
            sus_card: p.sus_card,
            cid_code: p.cid_code,
            name: p.name,
            birth_date: p.birth_date,
            mother_name: p.mother_name,
            address: p.address,
            phone: p.phone,
            neighborhood: p.neighborhood,
            notes: p.notes,
        }
    }
}

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: i64,
    pub name: String,
    pub crm: String,
    pub specialty: String,
    pub phone: String,
}

impl From<Doctor> for FfiDoctor {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            crm: d.crm,
            specialty: d.specialty,
            phone: d.phone,
        }
    }
}

impl From<FfiDoctor> for Doctor {
    fn from(d: FfiDoctor) -> Self {
        Doctor {
            id: d.id,
            name: d.name,
            crm: d.crm,
            specialty: d.specialty,
            phone: d.phone,
        }
    }
}

impl From<FfiDoctor> for NewDoctor {
    fn from(d: FfiDoctor) -> Self {
        NewDoctor {
            name: d.name,
            crm: d.crm,
            specialty: d.specialty,
            phone: d.phone,
        }
    }
}

/// FFI-safe catalog medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub dosage: String,
    pub presentation: String,
}

impl From<Medicine> for FfiMedicine {
    fn from(m: Medicine) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            dosage: m.dosage,
            presentation: m.presentation,
        }
    }
}

impl From<FfiMedicine> for Medicine {
    fn from(m: FfiMedicine) -> Self {
        Medicine {
            id: m.id,
            name: m.name,
            description: m.description,
            dosage: m.dosage,
            presentation: m.presentation,
        }
    }
}

impl From<FfiMedicine> for NewMedicine {
    fn from(m: FfiMedicine) -> Self {
        NewMedicine {
            name: m.name,
            description: m.description,
            dosage: m.dosage,
            presentation: m.presentation,
        }
    }
}

/// FFI-safe prescription line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionMedicine {
    pub medicine_id: i64,
    pub posology: String,
}

impl From<PrescriptionMedicine> for FfiPrescriptionMedicine {
    fn from(line: PrescriptionMedicine) -> Self {
        Self {
            medicine_id: line.medicine_id,
            posology: line.posology,
        }
    }
}

/// FFI-safe prescription. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: String,
    pub medicines: Vec<FfiPrescriptionMedicine>,
    pub observations: String,
}

impl From<Prescription> for FfiPrescription {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id,
            patient_id: p.patient_id,
            doctor_id: p.doctor_id,
            date: p.date.to_string(),
            medicines: p.medicines.into_iter().map(Into::into).collect(),
            observations: p.observations,
        }
    }
}

/// FFI-safe issue date entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDateConfig {
    pub enabled: bool,
    pub date: String,
}

impl From<DateConfig> for FfiDateConfig {
    fn from(c: DateConfig) -> Self {
        Self {
            enabled: c.enabled,
            date: c.date.to_string(),
        }
    }
}

/// FFI-safe outcome for one issue date.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDateResult {
    pub date: String,
    pub prescription_id: Option<i64>,
    pub error: Option<String>,
}

/// FFI-safe submit report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSubmitReport {
    pub results: Vec<FfiDateResult>,
    pub created_count: u32,
    pub all_created: bool,
}

impl From<SubmitReport> for FfiSubmitReport {
    fn from(report: SubmitReport) -> Self {
        let created_count = report.created_count() as u32;
        let all_created = report.all_created();
        let results = report
            .results
            .into_iter()
            .map(|r| {
                let (prescription_id, error) = match r.outcome {
                    Ok(p) => (Some(p.id), None),
                    Err(e) => (None, Some(e)),
                };
                FfiDateResult {
                    date: r.date.to_string(),
                    prescription_id,
                    error,
                }
            })
            .collect();

        Self {
            results,
            created_count,
            all_created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maria() -> FfiPatient {
        FfiPatient {
            id: 0,
            name: "Maria Silva".into(),
            cpf: mask_cpf("12345678901".into()),
            sus_card: String::new(),
            cid_code: String::new(),
            birth_date: "1980-05-02".into(),
            mother_name: String::new(),
            address: String::new(),
            phone: String::new(),
            neighborhood: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_ffi_draft_session() {
        let core = open_database_in_memory().unwrap();
        let patient = core.add_patient(maria()).unwrap();
        let doctor = core
            .add_doctor(FfiDoctor {
                id: 0,
                name: "Dr. João".into(),
                crm: "12345".into(),
                specialty: String::new(),
                phone: String::new(),
            })
            .unwrap();
        assert_eq!(core.seed_default_medicines().unwrap(), 36);

        let session = core.start_draft(patient.id).unwrap();
        session.set_search_term("amox".into()).unwrap();
        let amox = session.filtered_medicines().unwrap();
        assert_eq!(amox.len(), 1);

        assert!(matches!(
            session.submit(),
            Err(ClinicError::ValidationError(_))
        ));

        session.select_doctor(doctor.id).unwrap();
        session
            .add_line(Some(amox[0].id), "1 cápsula a cada 8h".into())
            .unwrap();
        session.edit_date(0, "2024-01-10".into()).unwrap();
        session.add_date("2024-01-17".into()).unwrap();

        let report = session.submit().unwrap();
        assert!(report.all_created);
        assert_eq!(report.created_count, 2);
        assert_eq!(report.results[1].date, "2024-01-17");

        let text = core.render_prescription(1, false).unwrap();
        assert!(text.contains("AMOXICILINA - 500MG (CÁPSULA)"));
        assert!(text.contains("10/01/2024"));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let core = open_database_in_memory().unwrap();
        let session = core.start_draft(1).unwrap();
        assert!(matches!(
            session.add_date("10/01/2024".into()),
            Err(ClinicError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_blank_patient_name_is_invalid_input() {
        let core = open_database_in_memory().unwrap();
        let mut blank = maria();
        blank.name = "  ".into();
        assert!(matches!(
            core.add_patient(blank),
            Err(ClinicError::InvalidInput(_))
        ));
        assert!(core.list_patients().unwrap().is_empty());
    }

    #[test]
    fn test_date_with_trailing_text_is_rejected() {
        let core = open_database_in_memory().unwrap();
        let session = core.start_draft(1).unwrap();
        assert!(matches!(
            session.add_date("2024-01-10junk".into()),
            Err(ClinicError::InvalidInput(_))
        ));
        assert!(session.add_date("2024-01-10T00:00:00Z".into()).is_ok());
    }

    #[test]
    fn test_render_missing_prescription() {
        let core = open_database_in_memory().unwrap();
        assert!(matches!(
            core.render_prescription(5, true),
            Err(ClinicError::NotFound(_))
        ));
    }
}

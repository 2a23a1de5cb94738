//! Repository contract consumed by the prescription workflow.
//!
//! The draft builder and print renderer only ever see this trait, so the
//! backend is chosen once at startup and injected.

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{
    default_medicines, Doctor, Medicine, NewDoctor, NewMedicine, NewPatient, NewPrescription,
    Patient, Prescription, RecordId,
};
use crate::store::{
    KeyValueStore, StoreError, DOCTORS_KEY, MEDICINES_KEY, PATIENTS_KEY, PRESCRIPTIONS_KEY,
};

/// Repository errors.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Batch aborted: {0}")]
    BatchAborted(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

impl From<DbError> for RepositoryError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Constraint(msg) => RepositoryError::Constraint(msg),
            other => RepositoryError::Database(other),
        }
    }
}

/// CRUD access to every entity type.
///
/// `add_*` assigns the ID (current maximum + 1). Updates and deletes of an
/// unknown ID are no-ops that return `false`.
pub trait Repository {
    fn list_patients(&self) -> RepoResult<Vec<Patient>>;
    fn get_patient(&self, id: RecordId) -> RepoResult<Option<Patient>>;
    fn add_patient(&mut self, patient: &NewPatient) -> RepoResult<Patient>;
    fn update_patient(&mut self, patient: &Patient) -> RepoResult<bool>;
    fn delete_patient(&mut self, id: RecordId) -> RepoResult<bool>;

    fn list_doctors(&self) -> RepoResult<Vec<Doctor>>;
    fn get_doctor(&self, id: RecordId) -> RepoResult<Option<Doctor>>;
    fn add_doctor(&mut self, doctor: &NewDoctor) -> RepoResult<Doctor>;
    fn update_doctor(&mut self, doctor: &Doctor) -> RepoResult<bool>;
    fn delete_doctor(&mut self, id: RecordId) -> RepoResult<bool>;

    fn list_medicines(&self) -> RepoResult<Vec<Medicine>>;
    fn get_medicine(&self, id: RecordId) -> RepoResult<Option<Medicine>>;
    fn add_medicine(&mut self, medicine: &NewMedicine) -> RepoResult<Medicine>;
    fn update_medicine(&mut self, medicine: &Medicine) -> RepoResult<bool>;
    fn delete_medicine(&mut self, id: RecordId) -> RepoResult<bool>;

    fn list_prescriptions(&self) -> RepoResult<Vec<Prescription>>;
    fn get_prescription(&self, id: RecordId) -> RepoResult<Option<Prescription>>;
    fn add_prescription(&mut self, prescription: &NewPrescription) -> RepoResult<Prescription>;
    fn update_prescription(&mut self, prescription: &Prescription) -> RepoResult<bool>;
    fn delete_prescription(&mut self, id: RecordId) -> RepoResult<bool>;

    /// Prescriptions issued to one patient.
    fn prescriptions_for_patient(&self, patient_id: RecordId) -> RepoResult<Vec<Prescription>> {
        Ok(self
            .list_prescriptions()?
            .into_iter()
            .filter(|p| p.patient_id == patient_id)
            .collect())
    }

    /// Add several prescriptions, reporting each outcome in input order.
    ///
    /// The default writes one at a time and keeps whatever succeeded.
    fn add_prescriptions(&mut self, batch: &[NewPrescription]) -> Vec<RepoResult<Prescription>> {
        batch.iter().map(|p| self.add_prescription(p)).collect()
    }
}

impl Repository for Database {
    fn list_patients(&self) -> RepoResult<Vec<Patient>> {
        Ok(Database::list_patients(self)?)
    }

    fn get_patient(&self, id: RecordId) -> RepoResult<Option<Patient>> {
        Ok(Database::get_patient(self, id)?)
    }

    fn add_patient(&mut self, patient: &NewPatient) -> RepoResult<Patient> {
        Ok(self.insert_patient(patient)?)
    }

    fn update_patient(&mut self, patient: &Patient) -> RepoResult<bool> {
        Ok(Database::update_patient(self, patient)?)
    }

    fn delete_patient(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(Database::delete_patient(self, id)?)
    }

    fn list_doctors(&self) -> RepoResult<Vec<Doctor>> {
        Ok(Database::list_doctors(self)?)
    }

    fn get_doctor(&self, id: RecordId) -> RepoResult<Option<Doctor>> {
        Ok(Database::get_doctor(self, id)?)
    }

    fn add_doctor(&mut self, doctor: &NewDoctor) -> RepoResult<Doctor> {
        Ok(self.insert_doctor(doctor)?)
    }

    fn update_doctor(&mut self, doctor: &Doctor) -> RepoResult<bool> {
        Ok(Database::update_doctor(self, doctor)?)
    }

    fn delete_doctor(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(Database::delete_doctor(self, id)?)
    }

    fn list_medicines(&self) -> RepoResult<Vec<Medicine>> {
        Ok(Database::list_medicines(self)?)
    }

    fn get_medicine(&self, id: RecordId) -> RepoResult<Option<Medicine>> {
        Ok(Database::get_medicine(self, id)?)
    }

    fn add_medicine(&mut self, medicine: &NewMedicine) -> RepoResult<Medicine> {
        Ok(self.insert_medicine(medicine)?)
    }

    fn update_medicine(&mut self, medicine: &Medicine) -> RepoResult<bool> {
        Ok(Database::update_medicine(self, medicine)?)
    }

    fn delete_medicine(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(Database::delete_medicine(self, id)?)
    }

    fn list_prescriptions(&self) -> RepoResult<Vec<Prescription>> {
        Ok(Database::list_prescriptions(self)?)
    }

    fn get_prescription(&self, id: RecordId) -> RepoResult<Option<Prescription>> {
        Ok(Database::get_prescription(self, id)?)
    }

    fn add_prescription(&mut self, prescription: &NewPrescription) -> RepoResult<Prescription> {
        Ok(self.insert_prescription(prescription)?)
    }

    fn update_prescription(&mut self, prescription: &Prescription) -> RepoResult<bool> {
        Ok(Database::update_prescription(self, prescription)?)
    }

    fn delete_prescription(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(Database::delete_prescription(self, id)?)
    }

    fn prescriptions_for_patient(&self, patient_id: RecordId) -> RepoResult<Vec<Prescription>> {
        Ok(self.list_prescriptions_for_patient(patient_id)?)
    }

    /// One transaction: either every date is written or none is.
    fn add_prescriptions(&mut self, batch: &[NewPrescription]) -> Vec<RepoResult<Prescription>> {
        match self.insert_prescriptions(batch) {
            Ok(created) => created.into_iter().map(Ok).collect(),
            Err(e) => {
                tracing::warn!(count = batch.len(), error = %e, "prescription batch rolled back");
                let reason = e.to_string();
                batch
                    .iter()
                    .map(|_| Err(RepositoryError::BatchAborted(reason.clone())))
                    .collect()
            }
        }
    }
}

impl Repository for KeyValueStore {
    fn list_patients(&self) -> RepoResult<Vec<Patient>> {
        Ok(self.load(PATIENTS_KEY)?)
    }

    fn get_patient(&self, id: RecordId) -> RepoResult<Option<Patient>> {
        Ok(self.find(PATIENTS_KEY, id)?)
    }

    fn add_patient(&mut self, patient: &NewPatient) -> RepoResult<Patient> {
        patient
            .check_invariants()
            .map_err(|msg| RepositoryError::Constraint(msg.to_string()))?;
        Ok(self.insert(PATIENTS_KEY, |id| patient.clone().with_id(id))?)
    }

    fn update_patient(&mut self, patient: &Patient) -> RepoResult<bool> {
        patient
            .check_invariants()
            .map_err(|msg| RepositoryError::Constraint(msg.to_string()))?;
        Ok(self.replace(PATIENTS_KEY, patient)?)
    }

    fn delete_patient(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(self.remove::<Patient>(PATIENTS_KEY, id)?)
    }

    fn list_doctors(&self) -> RepoResult<Vec<Doctor>> {
        Ok(self.load(DOCTORS_KEY)?)
    }

    fn get_doctor(&self, id: RecordId) -> RepoResult<Option<Doctor>> {
        Ok(self.find(DOCTORS_KEY, id)?)
    }

    fn add_doctor(&mut self, doctor: &NewDoctor) -> RepoResult<Doctor> {
        Ok(self.insert(DOCTORS_KEY, |id| doctor.clone().with_id(id))?)
    }

    fn update_doctor(&mut self, doctor: &Doctor) -> RepoResult<bool> {
        Ok(self.replace(DOCTORS_KEY, doctor)?)
    }

    fn delete_doctor(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(self.remove::<Doctor>(DOCTORS_KEY, id)?)
    }

    fn list_medicines(&self) -> RepoResult<Vec<Medicine>> {
        Ok(self.load(MEDICINES_KEY)?)
    }

    fn get_medicine(&self, id: RecordId) -> RepoResult<Option<Medicine>> {
        Ok(self.find(MEDICINES_KEY, id)?)
    }

    fn add_medicine(&mut self, medicine: &NewMedicine) -> RepoResult<Medicine> {
        Ok(self.insert(MEDICINES_KEY, |id| medicine.clone().with_id(id))?)
    }

    fn update_medicine(&mut self, medicine: &Medicine) -> RepoResult<bool> {
        Ok(self.replace(MEDICINES_KEY, medicine)?)
    }

    fn delete_medicine(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(self.remove::<Medicine>(MEDICINES_KEY, id)?)
    }

    fn list_prescriptions(&self) -> RepoResult<Vec<Prescription>> {
        Ok(self.load(PRESCRIPTIONS_KEY)?)
    }

    fn get_prescription(&self, id: RecordId) -> RepoResult<Option<Prescription>> {
        Ok(self.find(PRESCRIPTIONS_KEY, id)?)
    }

    fn add_prescription(&mut self, prescription: &NewPrescription) -> RepoResult<Prescription> {
        prescription
            .check_invariants()
            .map_err(|msg| RepositoryError::Constraint(msg.to_string()))?;
        Ok(self.insert(PRESCRIPTIONS_KEY, |id| prescription.clone().with_id(id))?)
    }

    fn update_prescription(&mut self, prescription: &Prescription) -> RepoResult<bool> {
        prescription
            .to_new()
            .check_invariants()
            .map_err(|msg| RepositoryError::Constraint(msg.to_string()))?;
        Ok(self.replace(PRESCRIPTIONS_KEY, prescription)?)
    }

    fn delete_prescription(&mut self, id: RecordId) -> RepoResult<bool> {
        Ok(self.remove::<Prescription>(PRESCRIPTIONS_KEY, id)?)
    }
}

/// Load the standard SUS medicine list into an empty catalog.
///
/// Returns how many entries were added; a non-empty catalog is left alone.
pub fn seed_default_medicines<R: Repository + ?Sized>(repo: &mut R) -> RepoResult<usize> {
    let existing = repo.list_medicines()?.len();
    if existing > 0 {
        tracing::info!(existing, "medicine catalog already populated, skipping seed");
        return Ok(0);
    }

    let defaults = default_medicines();
    for medicine in &defaults {
        repo.add_medicine(medicine)?;
    }
    tracing::info!(count = defaults.len(), "seeded default medicine catalog");
    Ok(defaults.len())
}

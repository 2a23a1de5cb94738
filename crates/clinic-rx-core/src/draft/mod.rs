//! Prescription draft builder.
//!
//! A draft collects medicine lines, the signing doctor and one or more issue
//! dates for a single pinned patient. Submitting it writes one prescription
//! per enabled date:
//!
//! ```text
//! start(patient) ── snapshot doctors + catalog
//!        │
//!        ├── select_doctor / add_line / remove_line / dates / observations
//!        │
//!     submit ── validate ── [date 1, date 2, ... date N] ── repository
//!        │                                                      │
//!        └──────────── reset on full success ◄── SubmitReport ◄─┘
//! ```

mod dates;
mod submit;

pub use dates::*;
pub use submit::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Doctor, Medicine, NewPrescription, Patient, PrescriptionMedicine, RecordId};
use crate::repository::{Repository, RepositoryError};
use crate::search::filter_medicines;

/// Draft validation and submission errors.
///
/// Validation errors never change the draft.
#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Select a medicine before adding it to the prescription")]
    NoMedicineSelected,

    #[error("Enter the posology for the selected medicine")]
    EmptyPosology,

    #[error("No patient selected for the prescription")]
    NoPatient,

    #[error("Add at least one medicine to the prescription")]
    NoMedicines,

    #[error("Select a doctor for the prescription")]
    NoDoctor,

    #[error("Select at least one date to issue the prescription")]
    NoDateSelected,

    #[error("Stored {created} of {total} prescriptions")]
    Persistence {
        created: usize,
        total: usize,
        report: SubmitReport,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl DraftError {
    /// True for input problems the user can fix in the form.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            DraftError::Persistence { .. } | DraftError::Repository(_)
        )
    }
}

pub type DraftResult<T> = Result<T, DraftError>;

/// Medicine picked in the search box but not yet added as a line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSelection {
    pub medicine_id: Option<RecordId>,
    pub posology: String,
}

/// Where a draft reads "today" from when it resets its dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// The local calendar date, read on each call
    Local,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Local => chrono::Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Working state of one prescription form.
#[derive(Debug, Clone)]
pub struct PrescriptionDraft {
    patient_id: RecordId,
    patient: Option<Patient>,
    doctor_id: Option<RecordId>,
    doctors: Vec<Doctor>,
    catalog: Vec<Medicine>,
    search_term: String,
    selection: LineSelection,
    medicine_lines: Vec<PrescriptionMedicine>,
    date_configs: Vec<DateConfig>,
    observations: String,
    clock: Clock,
}

impl PrescriptionDraft {
    /// Start a draft for a patient, dated today in local time.
    pub fn start<R: Repository + ?Sized>(repo: &R, patient_id: RecordId) -> DraftResult<Self> {
        Self::start_with_clock(repo, patient_id, Clock::Local)
    }

    /// Start a draft with an explicit "today", used for the default date.
    pub fn start_on<R: Repository + ?Sized>(
        repo: &R,
        patient_id: RecordId,
        today: NaiveDate,
    ) -> DraftResult<Self> {
        Self::start_with_clock(repo, patient_id, Clock::Fixed(today))
    }

    pub fn start_with_clock<R: Repository + ?Sized>(
        repo: &R,
        patient_id: RecordId,
        clock: Clock,
    ) -> DraftResult<Self> {
        let patient = if patient_id > 0 {
            repo.get_patient(patient_id)?
        } else {
            None
        };
        let doctors = repo.list_doctors()?;
        let catalog = repo.list_medicines()?;
        tracing::debug!(
            patient_id,
            doctors = doctors.len(),
            medicines = catalog.len(),
            "prescription draft started"
        );

        let mut draft = Self::with_snapshot(patient_id, patient, doctors, catalog, clock.today());
        draft.clock = clock;
        Ok(draft)
    }

    /// Build a draft from already loaded snapshots.
    pub fn with_snapshot(
        patient_id: RecordId,
        patient: Option<Patient>,
        doctors: Vec<Doctor>,
        catalog: Vec<Medicine>,
        today: NaiveDate,
    ) -> Self {
        Self {
            patient_id,
            patient,
            doctor_id: None,
            doctors,
            catalog,
            search_term: String::new(),
            selection: LineSelection::default(),
            medicine_lines: Vec::new(),
            date_configs: default_dates(today),
            observations: String::new(),
            clock: Clock::Fixed(today),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn patient_id(&self) -> RecordId {
        self.patient_id
    }

    /// The pinned patient's record, if it still exists.
    pub fn patient(&self) -> Option<&Patient> {
        self.patient.as_ref()
    }

    pub fn doctor_id(&self) -> Option<RecordId> {
        self.doctor_id
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn catalog(&self) -> &[Medicine] {
        &self.catalog
    }

    pub fn selection(&self) -> &LineSelection {
        &self.selection
    }

    pub fn medicine_lines(&self) -> &[PrescriptionMedicine] {
        &self.medicine_lines
    }

    pub fn date_configs(&self) -> &[DateConfig] {
        &self.date_configs
    }

    pub fn observations(&self) -> &str {
        &self.observations
    }

    /// Catalog entry for a medicine ID, from the snapshot.
    pub fn medicine(&self, id: RecordId) -> Option<&Medicine> {
        self.catalog.iter().find(|m| m.id == id)
    }

    // =========================================================================
    // Doctor, search and line editing
    // =========================================================================

    /// Choose the signing doctor. Zero or a negative ID clears the choice.
    pub fn select_doctor(&mut self, doctor_id: RecordId) {
        self.doctor_id = (doctor_id > 0).then_some(doctor_id);
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Catalog entries matching the current search term.
    pub fn filtered_medicines(&self) -> Vec<Medicine> {
        filter_medicines(&self.catalog, &self.search_term)
    }

    pub fn select_medicine(&mut self, medicine_id: Option<RecordId>) {
        self.selection.medicine_id = medicine_id;
    }

    pub fn set_posology(&mut self, posology: impl Into<String>) {
        self.selection.posology = posology.into();
    }

    /// Append a medicine line.
    ///
    /// Fails without touching the draft when no medicine is given or the
    /// posology is blank. On success the pending selection is cleared so the
    /// form is ready for the next entry.
    pub fn add_line(&mut self, medicine_id: Option<RecordId>, posology: &str) -> DraftResult<()> {
        let medicine_id = match medicine_id {
            Some(id) if id > 0 => id,
            _ => return Err(DraftError::NoMedicineSelected),
        };
        if posology.trim().is_empty() {
            return Err(DraftError::EmptyPosology);
        }

        self.medicine_lines
            .push(PrescriptionMedicine::new(medicine_id, posology));
        self.selection = LineSelection::default();
        Ok(())
    }

    /// Add the pending selection as a line.
    pub fn add_selected_line(&mut self) -> DraftResult<()> {
        let LineSelection {
            medicine_id,
            posology,
        } = self.selection.clone();
        self.add_line(medicine_id, &posology)
    }

    /// Remove the line at `index`. Out-of-range indexes change nothing.
    pub fn remove_line(&mut self, index: usize) -> bool {
        if index >= self.medicine_lines.len() {
            return false;
        }
        self.medicine_lines.remove(index);
        true
    }

    pub fn set_observations(&mut self, observations: impl Into<String>) {
        self.observations = observations.into();
    }

    // =========================================================================
    // Dates
    // =========================================================================

    /// Add another enabled issue date. There is no upper limit.
    pub fn add_date(&mut self, date: NaiveDate) {
        self.date_configs.push(DateConfig::enabled(date));
    }

    pub fn remove_date(&mut self, index: usize) -> bool {
        if index >= self.date_configs.len() {
            return false;
        }
        self.date_configs.remove(index);
        true
    }

    pub fn toggle_date(&mut self, index: usize, enabled: bool) -> bool {
        match self.date_configs.get_mut(index) {
            Some(config) => {
                config.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn edit_date(&mut self, index: usize, date: NaiveDate) -> bool {
        match self.date_configs.get_mut(index) {
            Some(config) => {
                config.date = date;
                true
            }
            None => false,
        }
    }

    pub fn enabled_dates(&self) -> Vec<NaiveDate> {
        enabled_dates(&self.date_configs)
    }

    /// Whether the submit button should be enabled.
    pub fn can_submit(&self) -> bool {
        self.patient_id > 0 && !self.medicine_lines.is_empty()
    }

    // =========================================================================
    // Submit
    // =========================================================================

    /// Validate the draft and build one record per enabled date.
    pub fn prepare(&self) -> DraftResult<Vec<NewPrescription>> {
        if self.medicine_lines.is_empty() {
            return Err(DraftError::NoMedicines);
        }
        if self.patient_id <= 0 {
            return Err(DraftError::NoPatient);
        }
        let doctor_id = self.doctor_id.ok_or(DraftError::NoDoctor)?;

        let dates = self.enabled_dates();
        if dates.is_empty() {
            return Err(DraftError::NoDateSelected);
        }

        Ok(dates
            .into_iter()
            .map(|date| NewPrescription {
                patient_id: self.patient_id,
                doctor_id,
                date,
                medicines: self.medicine_lines.clone(),
                observations: self.observations.clone(),
            })
            .collect())
    }

    /// Store one prescription per enabled date.
    ///
    /// Each date becomes an independent record with its own ID. If any date
    /// fails the draft is kept as-is and the error carries the per-date
    /// report; whether earlier dates stay stored depends on the backend's
    /// `add_prescriptions`. On full success the lines, dates, observations
    /// and doctor are reset while the patient stays pinned.
    pub fn submit<R: Repository + ?Sized>(&mut self, repo: &mut R) -> DraftResult<SubmitReport> {
        let batch = self.prepare()?;
        let total = batch.len();
        tracing::info!(
            patient_id = self.patient_id,
            doctor_id = ?self.doctor_id,
            count = total,
            "issuing prescriptions"
        );

        let outcomes = repo.add_prescriptions(&batch);
        let report = SubmitReport {
            results: batch
                .iter()
                .zip(outcomes)
                .map(|(new, outcome)| DateResult {
                    date: new.date,
                    outcome: outcome.map_err(|e| e.to_string()),
                })
                .collect(),
        };

        let created = report.created_count();
        if created != total || report.results.len() != total {
            for (date, reason) in report.failed() {
                tracing::warn!(%date, reason, "prescription not stored");
            }
            return Err(DraftError::Persistence {
                created,
                total,
                report,
            });
        }

        tracing::info!(ids = ?report.created_ids(), "prescriptions stored");
        self.reset_after_submit();
        Ok(report)
    }

    fn reset_after_submit(&mut self) {
        self.medicine_lines.clear();
        self.date_configs = default_dates(self.clock.today());
        self.observations.clear();
        self.doctor_id = None;
    }
}

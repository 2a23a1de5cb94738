//! Outcome of submitting a draft.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Prescription, RecordId};

/// What happened to one enabled date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateResult {
    pub date: NaiveDate,
    /// The stored record, or the reason it was not stored
    pub outcome: Result<Prescription, String>,
}

impl DateResult {
    pub fn is_created(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-date results of one submit, in the order the dates were enabled.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SubmitReport {
    pub results: Vec<DateResult>,
}

impl SubmitReport {
    /// Prescriptions that were actually stored.
    pub fn created(&self) -> Vec<&Prescription> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .collect()
    }

    pub fn created_ids(&self) -> Vec<RecordId> {
        self.created().iter().map(|p| p.id).collect()
    }

    /// Dates whose prescription was not stored, with the reason.
    pub fn failed(&self) -> Vec<(NaiveDate, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.date, e.as_str())))
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_created()).count()
    }

    pub fn all_created(&self) -> bool {
        self.results.iter().all(DateResult::is_created)
    }
}

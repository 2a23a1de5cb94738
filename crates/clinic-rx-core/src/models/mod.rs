//! Domain models for the clinic records system.
//!
//! Rust field names are English; the serde names are the persisted wire
//! contract shared with the browser front end (`pacienteId`, `posologia`, ...).

mod doctor;
mod medicine;
mod patient;
mod prescription;

pub use doctor::*;
pub use medicine::*;
pub use patient::*;
pub use prescription::*;

/// Repository-assigned integer identifier.
pub type RecordId = i64;

//! Key-value storage backend.
//!
//! Mirrors the browser local-storage layout the front end uses: one string
//! key per entity type, each holding a JSON array of records. The store can
//! live purely in memory or be flushed to a JSON file after every write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Doctor, Medicine, Patient, Prescription, RecordId};

pub const PATIENTS_KEY: &str = "sistema-perobal-pacientes";
pub const MEDICINES_KEY: &str = "sistema-perobal-medicamentos";
pub const DOCTORS_KEY: &str = "sistema-perobal-medicos";
pub const PRESCRIPTIONS_KEY: &str = "sistema-perobal-receitas";

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Records stored under a key, addressable by their integer ID.
pub trait Keyed {
    fn id(&self) -> RecordId;
}

impl Keyed for Patient {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Keyed for Doctor {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Keyed for Medicine {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Keyed for Prescription {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// String-keyed store of JSON documents.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl KeyValueStore {
    /// Create an empty store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, starting empty if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store a value under a key. The in-memory map only changes once the
    /// file (if any) has been written.
    pub fn set_item(&mut self, key: &str, value: String) -> StoreResult<()> {
        match &self.path {
            Some(path) => {
                let mut next = self.entries.clone();
                next.insert(key.to_string(), value);
                std::fs::write(path, serde_json::to_string_pretty(&next)?)?;
                self.entries = next;
            }
            None => {
                self.entries.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// Load every record under a key; a missing key is an empty collection.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Vec<T>> {
        match self.get_item(key) {
            Some(raw) => Ok(serde_json::from_str(raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite the collection under a key.
    pub fn save<T: Serialize>(&mut self, key: &str, records: &[T]) -> StoreResult<()> {
        let raw = serde_json::to_string(records)?;
        self.set_item(key, raw)
    }

    /// Find one record by ID.
    pub fn find<T: DeserializeOwned + Keyed>(
        &self,
        key: &str,
        id: RecordId,
    ) -> StoreResult<Option<T>> {
        Ok(self.load::<T>(key)?.into_iter().find(|r| r.id() == id))
    }

    /// Append a record built from the next free ID (current maximum + 1).
    pub fn insert<T, F>(&mut self, key: &str, build: F) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned + Keyed + Clone,
        F: FnOnce(RecordId) -> T,
    {
        let mut records = self.load::<T>(key)?;
        let next_id = records.iter().map(Keyed::id).max().unwrap_or(0) + 1;
        let record = build(next_id);
        records.push(record.clone());
        self.save(key, &records)?;
        Ok(record)
    }

    /// Replace the record with the same ID. Returns false if there is none.
    pub fn replace<T>(&mut self, key: &str, record: &T) -> StoreResult<bool>
    where
        T: Serialize + DeserializeOwned + Keyed + Clone,
    {
        let mut records = self.load::<T>(key)?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record.clone();
                self.save(key, &records)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the record with this ID. Returns false if there is none.
    pub fn remove<T>(&mut self, key: &str, id: RecordId) -> StoreResult<bool>
    where
        T: Serialize + DeserializeOwned + Keyed,
    {
        let records = self.load::<T>(key)?;
        let before = records.len();
        let kept: Vec<T> = records.into_iter().filter(|r| r.id() != id).collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.save(key, &kept)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDoctor, NewPatient};

    #[test]
    fn test_missing_key_is_empty() {
        let store = KeyValueStore::in_memory();
        let patients: Vec<Patient> = store.load(PATIENTS_KEY).unwrap();
        assert!(patients.is_empty());
    }

    #[test]
    fn test_insert_uses_max_plus_one() {
        let mut store = KeyValueStore::in_memory();

        let a: Patient = store
            .insert(PATIENTS_KEY, |id| NewPatient::new("Ana").with_id(id))
            .unwrap();
        let b: Patient = store
            .insert(PATIENTS_KEY, |id| NewPatient::new("Bruno").with_id(id))
            .unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        assert!(store.remove::<Patient>(PATIENTS_KEY, 1).unwrap());
        let c: Patient = store
            .insert(PATIENTS_KEY, |id| NewPatient::new("Carla").with_id(id))
            .unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_stored_as_wire_json() {
        let mut store = KeyValueStore::in_memory();
        let _: Doctor = store
            .insert(DOCTORS_KEY, |id| NewDoctor::new("Dr. João", "12345").with_id(id))
            .unwrap();

        let raw = store.get_item(DOCTORS_KEY).unwrap();
        let json: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(json[0]["nome"], "Dr. João");
        assert_eq!(json[0]["crm"], "12345");
    }

    #[test]
    fn test_replace_and_remove_missing() {
        let mut store = KeyValueStore::in_memory();
        let ghost = NewDoctor::new("Ghost", "0").with_id(5);

        assert!(!store.replace(DOCTORS_KEY, &ghost).unwrap());
        assert!(!store.remove::<Doctor>(DOCTORS_KEY, 5).unwrap());
    }

    #[test]
    fn test_file_backed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        {
            let mut store = KeyValueStore::open(&path).unwrap();
            let _: Patient = store
                .insert(PATIENTS_KEY, |id| NewPatient::new("Maria Silva").with_id(id))
                .unwrap();
        }

        let store = KeyValueStore::open(&path).unwrap();
        let patient: Option<Patient> = store.find(PATIENTS_KEY, 1).unwrap();
        assert_eq!(patient.unwrap().name, "Maria Silva");
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("data");
        std::fs::create_dir(&folder).unwrap();
        let path = folder.join("storage.json");
        let mut store = KeyValueStore::open(&path).unwrap();

        std::fs::remove_dir(&folder).unwrap();
        let failed = store.insert(PATIENTS_KEY, |id| NewPatient::new("Ana").with_id(id));
        assert!(failed.is_err());
        assert!(store.load::<Patient>(PATIENTS_KEY).unwrap().is_empty());

        std::fs::create_dir(&folder).unwrap();
        let b: Patient = store
            .insert(PATIENTS_KEY, |id| NewPatient::new("Bruno").with_id(id))
            .unwrap();
        assert_eq!(b.id, 1);

        let reopened = KeyValueStore::open(&path).unwrap();
        let names: Vec<String> = reopened
            .load::<Patient>(PATIENTS_KEY)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Bruno".to_string()]);
    }

    #[test]
    fn test_corrupt_value_is_an_error() {
        let mut store = KeyValueStore::in_memory();
        store.set_item(PATIENTS_KEY, "{not json".into()).unwrap();
        assert!(store.load::<Patient>(PATIENTS_KEY).is_err());
    }
}

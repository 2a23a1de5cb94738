//! Doctor models.

use serde::{Deserialize, Serialize};

use super::RecordId;

/// A doctor who can sign prescriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Doctor {
    pub id: RecordId,
    #[serde(rename = "nome")]
    pub name: String,
    /// CRM license number, digits only
    pub crm: String,
    #[serde(rename = "especialidade")]
    pub specialty: String,
    /// Contact phone, masked `(##) #####-####`
    #[serde(rename = "contato")]
    pub phone: String,
}

/// Doctor fields before an ID is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NewDoctor {
    #[serde(rename = "nome")]
    pub name: String,
    pub crm: String,
    #[serde(rename = "especialidade")]
    pub specialty: String,
    #[serde(rename = "contato")]
    pub phone: String,
}

impl NewDoctor {
    pub fn new(name: impl Into<String>, crm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crm: crm.into(),
            ..Default::default()
        }
    }

    pub fn with_id(self, id: RecordId) -> Doctor {
        Doctor {
            id,
            name: self.name,
            crm: self.crm,
            specialty: self.specialty,
            phone: self.phone,
        }
    }
}

//! Patient models.

use serde::{Deserialize, Serialize};

use super::RecordId;
use crate::format::digits_only;

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Patient {
    /// Repository-assigned ID, never changes after creation
    pub id: RecordId,
    /// CPF as typed, usually masked `###.###.###-##`
    pub cpf: String,
    /// SUS card number (up to 15 digits)
    #[serde(rename = "cartaoSus")]
    pub sus_card: String,
    /// Clinical classification (CID) code
    #[serde(rename = "codCid")]
    pub cid_code: String,
    #[serde(rename = "nome")]
    pub name: String,
    /// ISO date `YYYY-MM-DD`; may be blank on legacy records
    #[serde(rename = "dataNascimento")]
    pub birth_date: String,
    #[serde(rename = "nomeMae")]
    pub mother_name: String,
    #[serde(rename = "endereco")]
    pub address: String,
    /// Contact phone, masked `(##) #####-####`
    #[serde(rename = "contato")]
    pub phone: String,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "observacao")]
    pub notes: String,
}

/// Patient fields submitted by the registration form, before an ID exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NewPatient {
    pub cpf: String,
    #[serde(rename = "cartaoSus")]
    pub sus_card: String,
    #[serde(rename = "codCid")]
    pub cid_code: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "dataNascimento")]
    pub birth_date: String,
    #[serde(rename = "nomeMae")]
    pub mother_name: String,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "contato")]
    pub phone: String,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "observacao")]
    pub notes: String,
}

impl NewPatient {
    /// Create a new patient form with the required name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check the invariants every stored patient must hold.
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        check_name(&self.name)
    }

    /// Attach the identifier assigned by the repository.
    pub fn with_id(self, id: RecordId) -> Patient {
        Patient {
            id,
            cpf: self.cpf,
            sus_card: self.sus_card,
            cid_code: self.cid_code,
            name: self.name,
            birth_date: self.birth_date,
            mother_name: self.mother_name,
            address: self.address,
            phone: self.phone,
            neighborhood: self.neighborhood,
            notes: self.notes,
        }
    }
}

fn check_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("patient name is required");
    }
    Ok(())
}

impl Patient {
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        check_name(&self.name)
    }

    /// CPF reduced to its digits, used for lookups regardless of masking.
    pub fn cpf_digits(&self) -> String {
        digits_only(&self.cpf)
    }

    /// Whether a SUS card number was recorded.
    pub fn has_sus_card(&self) -> bool {
        !self.sus_card.trim().is_empty()
    }
}

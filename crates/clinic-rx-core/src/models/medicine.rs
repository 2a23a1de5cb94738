//! Medicine catalog models.

use serde::{Deserialize, Serialize};

use super::RecordId;

/// A catalog entry that prescriptions reference by ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Medicine {
    pub id: RecordId,
    #[serde(rename = "nome")]
    pub name: String,
    /// Optional long description
    #[serde(rename = "descricao")]
    pub description: String,
    /// Strength (e.g., "500mg", "500MG/ML")
    #[serde(rename = "dosagem")]
    pub dosage: String,
    /// Presentation form (e.g., "comprimido", "xarope", "injeção")
    #[serde(rename = "apresentacao")]
    pub presentation: String,
}

/// Medicine fields before an ID is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NewMedicine {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "dosagem")]
    pub dosage: String,
    #[serde(rename = "apresentacao")]
    pub presentation: String,
}

impl NewMedicine {
    pub fn new(
        name: impl Into<String>,
        dosage: impl Into<String>,
        presentation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            dosage: dosage.into(),
            presentation: presentation.into(),
        }
    }

    pub fn with_id(self, id: RecordId) -> Medicine {
        Medicine {
            id,
            name: self.name,
            description: self.description,
            dosage: self.dosage,
            presentation: self.presentation,
        }
    }
}

/// Standard SUS primary-care medicine list: (name, dosage, presentation).
pub const DEFAULT_MEDICINES: &[(&str, &str, &str)] = &[
    ("DIPIRONA", "500MG", "COMPRIMIDO"),
    ("PARACETAMOL", "500MG", "COMPRIMIDO"),
    ("IBUPROFENO", "400MG", "COMPRIMIDO"),
    ("DICLOFENACO", "50MG", "COMPRIMIDO"),
    ("AMOXICILINA", "500MG", "CÁPSULA"),
    ("AZITROMICINA", "500MG", "COMPRIMIDO"),
    ("CEFALEXINA", "500MG", "CÁPSULA"),
    ("CIPROFLOXACINO", "500MG", "COMPRIMIDO"),
    ("OMEPRAZOL", "20MG", "CÁPSULA"),
    ("RANITIDINA", "150MG", "COMPRIMIDO"),
    ("METFORMINA", "850MG", "COMPRIMIDO"),
    ("GLIBENCLAMIDA", "5MG", "COMPRIMIDO"),
    ("CAPTOPRIL", "25MG", "COMPRIMIDO"),
    ("ENALAPRIL", "10MG", "COMPRIMIDO"),
    ("LOSARTANA", "50MG", "COMPRIMIDO"),
    ("ANLODIPINO", "5MG", "COMPRIMIDO"),
    ("ATENOLOL", "50MG", "COMPRIMIDO"),
    ("PROPRANOLOL", "40MG", "COMPRIMIDO"),
    ("HIDROCLOROTIAZIDA", "25MG", "COMPRIMIDO"),
    ("FUROSEMIDA", "40MG", "COMPRIMIDO"),
    ("SINVASTATINA", "20MG", "COMPRIMIDO"),
    ("ÁCIDO ACETILSALICÍLICO", "100MG", "COMPRIMIDO"),
    ("PREDNISONA", "20MG", "COMPRIMIDO"),
    ("DEXAMETASONA", "4MG", "COMPRIMIDO"),
    ("LORATADINA", "10MG", "COMPRIMIDO"),
    ("PROMETAZINA", "25MG", "COMPRIMIDO"),
    ("SIMETICONA", "40MG", "COMPRIMIDO"),
    ("BISACODIL", "5MG", "COMPRIMIDO"),
    ("SULFATO FERROSO", "300MG", "COMPRIMIDO"),
    ("ÁCIDO FÓLICO", "5MG", "COMPRIMIDO"),
    ("COMPLEXO B", "-", "COMPRIMIDO"),
    ("SORO FISIOLÓGICO", "0,9%", "SOLUÇÃO"),
    ("DEXTROSE", "5%", "SOLUÇÃO"),
    ("ÁLCOOL GEL", "70%", "GEL"),
    ("POMADA NISTATINA", "100.000UI/G", "POMADA"),
    ("DIPIRONA", "500MG/ML", "SOLUÇÃO"),
];

/// Build the default catalog as unsaved records.
pub fn default_medicines() -> Vec<NewMedicine> {
    DEFAULT_MEDICINES
        .iter()
        .map(|(name, dosage, presentation)| NewMedicine::new(*name, *dosage, *presentation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = default_medicines();
        assert_eq!(catalog.len(), 36);
        assert_eq!(catalog[4].name, "AMOXICILINA");
        assert_eq!(catalog[4].presentation, "CÁPSULA");
    }

    #[test]
    fn test_wire_field_names() {
        let medicine = NewMedicine::new("Amoxicilina", "500mg", "comprimido").with_id(9);
        let json = serde_json::to_value(&medicine).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["nome"], "Amoxicilina");
        assert_eq!(json["dosagem"], "500mg");
        assert_eq!(json["apresentacao"], "comprimido");
    }
}

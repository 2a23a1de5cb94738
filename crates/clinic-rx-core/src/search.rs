//! In-memory search over loaded records.
//!
//! Catalogs are small enough to re-filter on every keystroke. Larger
//! catalogs would need debouncing or a server-side query, with the same
//! matching rules.

use crate::format::digits_only;
use crate::models::{Doctor, Medicine, Patient};

/// Case-insensitive substring match on the medicine name.
///
/// An empty term returns the whole catalog in its original order.
pub fn filter_medicines(catalog: &[Medicine], term: &str) -> Vec<Medicine> {
    let needle = term.to_lowercase();
    catalog
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Match doctors by name (case-insensitive) or by CRM substring.
pub fn filter_doctors(doctors: &[Doctor], term: &str) -> Vec<Doctor> {
    let needle = term.to_lowercase();
    doctors
        .iter()
        .filter(|d| d.name.to_lowercase().contains(&needle) || d.crm.contains(term))
        .cloned()
        .collect()
}

/// Find a patient whose CPF has the same digits, ignoring masks.
pub fn find_patient_by_cpf<'a>(patients: &'a [Patient], cpf: &str) -> Option<&'a Patient> {
    let wanted = digits_only(cpf);
    if wanted.is_empty() {
        return None;
    }
    patients.iter().find(|p| p.cpf_digits() == wanted)
}

/// Patients whose name contains the trimmed term. A blank term matches nobody.
pub fn find_patients_by_name(patients: &[Patient], name: &str) -> Vec<Patient> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    patients
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Search box on the prescriptions page: an exact CPF hit wins, otherwise
/// fall back to name search.
pub fn search_patients(patients: &[Patient], term: &str) -> Vec<Patient> {
    if term.trim().is_empty() {
        return Vec::new();
    }
    if let Some(patient) = find_patient_by_cpf(patients, term) {
        return vec![patient.clone()];
    }
    find_patients_by_name(patients, term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDoctor, NewMedicine, NewPatient};

    fn catalog() -> Vec<Medicine> {
        vec![
            NewMedicine::new("Amoxicilina", "500mg", "comprimido").with_id(1),
            NewMedicine::new("Paracetamol", "500mg", "comprimido").with_id(2),
            NewMedicine::new("AMOXICILINA", "250mg/5mL", "xarope").with_id(3),
        ]
    }

    fn patients() -> Vec<Patient> {
        let mut maria = NewPatient::new("Maria Silva");
        maria.cpf = "123.456.789-01".into();
        let mut mariana = NewPatient::new("Mariana Souza");
        mariana.cpf = "98765432100".into();
        vec![maria.with_id(1), mariana.with_id(2), NewPatient::new("João").with_id(3)]
    }

    #[test]
    fn test_filter_case_insensitive() {
        let results = filter_medicines(&catalog(), "amox");
        let ids: Vec<_> = results.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_filter_empty_term_returns_catalog_in_order() {
        assert_eq!(filter_medicines(&catalog(), ""), catalog());
    }

    #[test]
    fn test_filter_ignores_description() {
        let mut catalog = catalog();
        catalog[1].description = "analgésico, não é amoxicilina".into();
        let results = filter_medicines(&catalog, "amox");
        assert!(results.iter().all(|m| m.id != 2));
    }

    #[test]
    fn test_filter_doctors_by_name_or_crm() {
        let doctors = vec![
            NewDoctor::new("Dr. João", "12345").with_id(3),
            NewDoctor::new("Dra. Ana", "67890").with_id(4),
        ];
        assert_eq!(filter_doctors(&doctors, "joão").len(), 1);
        assert_eq!(filter_doctors(&doctors, "678")[0].id, 4);
        assert_eq!(filter_doctors(&doctors, "").len(), 2);
    }

    #[test]
    fn test_find_by_cpf_ignores_mask() {
        let patients = patients();
        assert_eq!(find_patient_by_cpf(&patients, "12345678901").unwrap().id, 1);
        assert_eq!(find_patient_by_cpf(&patients, "987.654.321-00").unwrap().id, 2);
        assert!(find_patient_by_cpf(&patients, "").is_none());
    }

    #[test]
    fn test_search_patients() {
        let patients = patients();
        assert_eq!(search_patients(&patients, "123.456.789-01").len(), 1);
        assert_eq!(search_patients(&patients, "  mari ").len(), 2);
        assert!(search_patients(&patients, "   ").is_empty());
    }
}

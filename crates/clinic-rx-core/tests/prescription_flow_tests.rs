//! End-to-end prescription workflow tests, run against both backends.

use chrono::NaiveDate;
use clinic_rx_core::print::{InstitutionHeader, PrescriptionDocument, RenderMode, MISSING_MEDICINE};
use clinic_rx_core::store::PRESCRIPTIONS_KEY;
use clinic_rx_core::{
    Database, DraftError, KeyValueStore, NewDoctor, NewMedicine, NewPatient, PrescriptionDraft,
    PrescriptionMedicine, RecordId, Repository,
};

const POSOLOGY: &str = "1 comprimido a cada 8h por 7 dias";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn backends() -> Vec<(&'static str, Box<dyn Repository>)> {
    vec![
        ("sqlite", Box::new(Database::open_in_memory().unwrap())),
        ("key-value", Box::new(KeyValueStore::in_memory())),
    ]
}

/// Add placeholder patients so the next one lands on `id`, then drop them.
fn add_patient_as(repo: &mut dyn Repository, id: RecordId, patient: NewPatient) {
    let fillers: Vec<_> = (1..id)
        .map(|_| repo.add_patient(&NewPatient::new("filler")).unwrap().id)
        .collect();
    assert_eq!(repo.add_patient(&patient).unwrap().id, id);
    for filler in fillers {
        repo.delete_patient(filler).unwrap();
    }
}

fn add_doctor_as(repo: &mut dyn Repository, id: RecordId, doctor: NewDoctor) {
    let fillers: Vec<_> = (1..id)
        .map(|_| repo.add_doctor(&NewDoctor::new("filler", "0")).unwrap().id)
        .collect();
    assert_eq!(repo.add_doctor(&doctor).unwrap().id, id);
    for filler in fillers {
        repo.delete_doctor(filler).unwrap();
    }
}

fn add_medicine_as(repo: &mut dyn Repository, id: RecordId, medicine: NewMedicine) {
    let fillers: Vec<_> = (1..id)
        .map(|_| {
            repo.add_medicine(&NewMedicine::new("filler", "", ""))
                .unwrap()
                .id
        })
        .collect();
    assert_eq!(repo.add_medicine(&medicine).unwrap().id, id);
    for filler in fillers {
        repo.delete_medicine(filler).unwrap();
    }
}

/// Maria Silva (7), Dr. João (3, CRM 12345), Amoxicilina 500mg (9), Paracetamol (10).
fn seed_scenario(repo: &mut dyn Repository) {
    let mut maria = NewPatient::new("Maria Silva");
    maria.cpf = "123.456.789-01".into();
    maria.sus_card = "898001234567890".into();
    maria.birth_date = "1985-03-22".into();
    add_patient_as(repo, 7, maria);

    let mut joao = NewDoctor::new("Dr. João", "12345");
    joao.specialty = "Clínico Geral".into();
    add_doctor_as(repo, 3, joao);

    add_medicine_as(repo, 9, NewMedicine::new("Amoxicilina", "500mg", "comprimido"));
    repo.add_medicine(&NewMedicine::new("Paracetamol", "750mg", "comprimido"))
        .unwrap();
}

fn scenario_draft(repo: &dyn Repository) -> PrescriptionDraft {
    let mut draft = PrescriptionDraft::start_on(repo, 7, date(2024, 1, 10)).unwrap();
    draft.select_doctor(3);

    draft.set_search_term("amox");
    let found = draft.filtered_medicines();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Amoxicilina");

    draft.add_line(Some(found[0].id), POSOLOGY).unwrap();
    draft.add_date(date(2024, 1, 17));
    draft
}

#[test]
fn test_two_dates_create_two_prescriptions() {
    for (name, mut repo) in backends() {
        seed_scenario(repo.as_mut());
        let mut draft = scenario_draft(repo.as_ref());

        let report = draft.submit(repo.as_mut()).unwrap();
        assert_eq!(report.created_ids(), vec![1, 2], "backend {}", name);

        let stored = repo.list_prescriptions().unwrap();
        assert_eq!(stored.len(), 2, "backend {}", name);
        for (p, day) in stored.iter().zip([10, 17]) {
            assert_eq!(p.patient_id, 7, "backend {}", name);
            assert_eq!(p.doctor_id, 3, "backend {}", name);
            assert_eq!(p.date, date(2024, 1, day), "backend {}", name);
            assert_eq!(
                p.medicines,
                vec![PrescriptionMedicine::new(9, POSOLOGY)],
                "backend {}",
                name
            );
        }

        // Draft is cleared for the next prescription, patient stays pinned
        assert!(draft.medicine_lines().is_empty(), "backend {}", name);
        assert_eq!(draft.patient_id(), 7, "backend {}", name);
    }
}

#[test]
fn test_wire_format_in_key_value_store() {
    let mut store = KeyValueStore::in_memory();
    seed_scenario(&mut store);
    let mut draft = scenario_draft(&store);
    draft.submit(&mut store).unwrap();

    let raw = store.get_item(PRESCRIPTIONS_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_str(raw).unwrap();

    assert_eq!(json[0]["id"], 1);
    assert_eq!(json[0]["pacienteId"], 7);
    assert_eq!(json[0]["medicoId"], 3);
    assert_eq!(json[0]["data"], "2024-01-10");
    assert_eq!(json[1]["data"], "2024-01-17");
    assert_eq!(json[0]["medicamentos"][0]["medicamentoId"], 9);
    assert_eq!(json[0]["medicamentos"][0]["posologia"], POSOLOGY);
}

#[test]
fn test_submit_without_lines_stores_nothing() {
    for (name, mut repo) in backends() {
        seed_scenario(repo.as_mut());
        let mut draft = PrescriptionDraft::start_on(repo.as_ref(), 7, date(2024, 1, 10)).unwrap();
        draft.select_doctor(3);

        let err = draft.submit(repo.as_mut()).unwrap_err();
        assert!(matches!(err, DraftError::NoMedicines), "backend {}", name);
        assert!(repo.list_prescriptions().unwrap().is_empty(), "backend {}", name);
    }
}

#[test]
fn test_print_after_medicine_deleted() {
    for (name, mut repo) in backends() {
        seed_scenario(repo.as_mut());
        let mut draft = scenario_draft(repo.as_ref());
        draft.set_observations("Retorno em 7 dias");
        draft.submit(repo.as_mut()).unwrap();

        assert!(repo.delete_medicine(9).unwrap(), "backend {}", name);

        let doc = PrescriptionDocument::load(repo.as_ref(), 1, &InstitutionHeader::default())
            .unwrap()
            .unwrap();
        assert!(!doc.lines[0].resolved, "backend {}", name);
        assert_eq!(doc.lines[0].name, "", "backend {}", name);
        assert_eq!(doc.patient.name, "Maria Silva", "backend {}", name);
        assert_eq!(doc.patient.sus_card.as_deref(), Some("898001234567890"));
        assert_eq!(doc.patient.birth_date, "22/03/1985", "backend {}", name);
        assert_eq!(doc.observations.as_deref(), Some("Retorno em 7 dias"));

        let screen = doc.render(RenderMode::Screen);
        let print = doc.render(RenderMode::Print);
        for out in [&screen, &print] {
            assert!(out.contains(MISSING_MEDICINE), "backend {}", name);
            assert!(out.contains(POSOLOGY), "backend {}", name);
            assert!(out.contains("10/01/2024"), "backend {}", name);
            assert!(out.contains("Dr. João"), "backend {}", name);
        }
    }
}

#[test]
fn test_print_after_patient_and_doctor_deleted() {
    for (name, mut repo) in backends() {
        seed_scenario(repo.as_mut());
        let mut draft = scenario_draft(repo.as_ref());
        draft.submit(repo.as_mut()).unwrap();

        repo.delete_patient(7).unwrap();
        repo.delete_doctor(3).unwrap();

        let doc = PrescriptionDocument::load(repo.as_ref(), 2, &InstitutionHeader::default())
            .unwrap()
            .unwrap();
        assert_eq!(doc.patient.name, "", "backend {}", name);
        assert_eq!(doc.doctor.name, "", "backend {}", name);
        assert_eq!(doc.lines[0].title(), "Amoxicilina - 500mg (comprimido)");
        assert_eq!(doc.issue_date, "17/01/2024", "backend {}", name);

        // Still renders both layouts
        assert!(doc.render(RenderMode::Screen).contains("PRESCRIÇÃO MÉDICA"));
        assert!(doc.render(RenderMode::Print).contains("PRESCRIÇÃO MÉDICA"));
    }
}

#[test]
fn test_missing_prescription_loads_none() {
    for (name, repo) in backends() {
        let doc = PrescriptionDocument::load(repo.as_ref(), 42, &InstitutionHeader::default())
            .unwrap();
        assert!(doc.is_none(), "backend {}", name);
    }
}

#[test]
fn test_sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    {
        let mut db = Database::open(&path).unwrap();
        seed_scenario(&mut db);
        let mut draft = scenario_draft(&db);
        draft.submit(&mut db).unwrap();
    }

    let db = Database::open(&path).unwrap();
    let stored = Repository::prescriptions_for_patient(&db, 7).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].date, date(2024, 1, 17));
}

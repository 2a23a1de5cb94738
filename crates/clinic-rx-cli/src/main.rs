use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use clinic_rx_core::{
    config::{BACKEND_ENV, DB_PATH_ENV, DEPARTMENT_ENV, INSTITUTION_ENV, REGION_ENV},
    format::{format_cpf, format_crm, format_phone, format_sus_card, parse_iso_date},
    search, seed_default_medicines, ClinicConfig, DraftError, NewDoctor, NewMedicine, NewPatient,
    PrescriptionDocument, PrescriptionDraft, RenderMode, Repository,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic-rx")]
#[command(about = "Municipal clinic records and prescription CLI")]
struct Cli {
    /// Storage backend: sqlite or key-value (overrides CLINIC_RX_BACKEND)
    #[arg(long, global = true)]
    backend: Option<String>,
    /// Storage file, or :memory: (overrides CLINIC_RX_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,
    /// Print records as JSON in the stored wire format
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the standard SUS medicine list into an empty catalog
    Seed,
    /// Manage patients
    #[command(subcommand)]
    Patient(PatientCommand),
    /// Manage doctors
    #[command(subcommand)]
    Doctor(DoctorCommand),
    /// Manage the medicine catalog
    #[command(subcommand)]
    Medicine(MedicineCommand),
    /// Issue a prescription, one record per date
    Prescribe {
        /// Patient ID
        patient_id: i64,
        /// Signing doctor ID
        #[arg(long)]
        doctor: i64,
        /// Medicine line as MEDICINE_ID:POSOLOGY (repeatable)
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
        /// Issue date YYYY-MM-DD (repeatable, defaults to today)
        #[arg(long = "date")]
        dates: Vec<String>,
        /// Free-text observations
        #[arg(long)]
        observations: Option<String>,
    },
    /// List or delete prescriptions
    #[command(subcommand)]
    Prescription(PrescriptionCommand),
    /// Show a prescription ready for printing
    Print {
        /// Prescription ID
        id: i64,
        /// Emit the printable HTML page instead of the text preview
        #[arg(long)]
        html: bool,
    },
}

#[derive(Subcommand)]
enum PatientCommand {
    /// Register a patient
    Add {
        name: String,
        #[arg(long, default_value = "")]
        cpf: String,
        #[arg(long, default_value = "")]
        sus_card: String,
        /// Birth date YYYY-MM-DD
        #[arg(long, default_value = "")]
        birth_date: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        mother_name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        neighborhood: String,
        /// Clinical classification (CID) code
        #[arg(long, default_value = "")]
        cid: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List all patients
    List,
    /// Find patients by CPF or name
    Search { term: String },
    /// Delete a patient (prescriptions are kept)
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum DoctorCommand {
    /// Register a doctor
    Add {
        name: String,
        crm: String,
        #[arg(long, default_value = "")]
        specialty: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// List all doctors
    List,
    /// Find doctors by name or CRM
    Search { term: String },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum MedicineCommand {
    /// Add a catalog entry
    Add {
        name: String,
        dosage: String,
        presentation: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List the catalog, optionally filtered by name
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum PrescriptionCommand {
    /// List prescriptions
    List {
        /// Only this patient's prescriptions
        #[arg(long)]
        patient: Option<i64>,
    },
    Delete { id: i64 },
}

/// Parse `MEDICINE_ID:POSOLOGY`.
fn parse_line(raw: &str) -> anyhow::Result<(i64, String)> {
    let (id, posology) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("medicine line must look like ID:POSOLOGY, got {:?}", raw))?;
    let id = id
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid medicine ID in {:?}", raw))?;
    Ok((id, posology.trim().to_string()))
}

fn print_records<T: Serialize>(
    json: bool,
    records: &[T],
    empty: &str,
    line: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else if records.is_empty() {
        println!("{}", empty);
    } else {
        for record in records {
            println!("{}", line(record));
        }
    }
    Ok(())
}

fn prescribe(
    repo: &mut dyn Repository,
    patient_id: i64,
    doctor: i64,
    lines: &[String],
    dates: &[String],
    observations: Option<String>,
) -> anyhow::Result<()> {
    let mut draft = PrescriptionDraft::start(&*repo, patient_id)?;
    if draft.patient().is_none() {
        tracing::warn!(patient_id, "issuing prescription for an unknown patient");
    }

    draft.select_doctor(doctor);
    for raw in lines {
        let (medicine_id, posology) = parse_line(raw)?;
        if draft.medicine(medicine_id).is_none() {
            tracing::warn!(medicine_id, "medicine is not in the catalog");
        }
        draft.add_line(Some(medicine_id), &posology)?;
    }

    for (index, raw) in dates.iter().enumerate() {
        let date = parse_iso_date(raw).ok_or_else(|| anyhow!("invalid date {:?}", raw))?;
        if index == 0 {
            draft.edit_date(0, date);
        } else {
            draft.add_date(date);
        }
    }
    if let Some(observations) = observations {
        draft.set_observations(observations);
    }

    match draft.submit(&mut *repo) {
        Ok(report) => {
            for p in report.created() {
                println!("Created prescription {} dated {}", p.id, p.date);
            }
            Ok(())
        }
        Err(DraftError::Persistence {
            created,
            total,
            report,
        }) => {
            for result in &report.results {
                match &result.outcome {
                    Ok(p) => println!("{}: stored as prescription {}", result.date, p.id),
                    Err(e) => eprintln!("{}: not stored: {}", result.date, e),
                }
            }
            bail!("stored {} of {} prescriptions", created, total)
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_rx_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClinicConfig::from_env_values(
        cli.backend.or_else(|| std::env::var(BACKEND_ENV).ok()),
        cli.db.or_else(|| std::env::var(DB_PATH_ENV).ok()),
        std::env::var(INSTITUTION_ENV).ok(),
        std::env::var(DEPARTMENT_ENV).ok(),
        std::env::var(REGION_ENV).ok(),
    )?;
    let mut repo = config.open_repository()?;
    tracing::debug!(backend = %config.backend(), "repository ready");

    match cli.command {
        Commands::Seed => {
            let count = seed_default_medicines(repo.as_mut())?;
            if count == 0 {
                println!("Medicine catalog already populated.");
            } else {
                println!("Added {} medicines.", count);
            }
        }
        Commands::Patient(cmd) => match cmd {
            PatientCommand::Add {
                name,
                cpf,
                sus_card,
                birth_date,
                phone,
                mother_name,
                address,
                neighborhood,
                cid,
                notes,
            } => {
                if !birth_date.is_empty() && parse_iso_date(&birth_date).is_none() {
                    bail!("birth date must be YYYY-MM-DD, got {:?}", birth_date);
                }
                let patient = repo.add_patient(&NewPatient {
                    cpf: format_cpf(&cpf),
                    sus_card: format_sus_card(&sus_card),
                    cid_code: cid,
                    name,
                    birth_date,
                    mother_name,
                    address,
                    phone: format_phone(&phone),
                    neighborhood,
                    notes,
                })?;
                println!("Created patient {}: {}", patient.id, patient.name);
            }
            PatientCommand::List => {
                let patients = repo.list_patients()?;
                print_records(cli.json, &patients, "No patients found.", |p| {
                    format!("ID: {}, Name: {}, CPF: {}", p.id, p.name, p.cpf)
                })?;
            }
            PatientCommand::Search { term } => {
                let patients = search::search_patients(&repo.list_patients()?, &term);
                print_records(cli.json, &patients, "No patients found.", |p| {
                    format!("ID: {}, Name: {}, CPF: {}", p.id, p.name, p.cpf)
                })?;
            }
            PatientCommand::Delete { id } => {
                if repo.delete_patient(id)? {
                    println!("Deleted patient {}", id);
                } else {
                    println!("No patient with ID {}", id);
                }
            }
        },
        Commands::Doctor(cmd) => match cmd {
            DoctorCommand::Add {
                name,
                crm,
                specialty,
                phone,
            } => {
                let mut doctor = NewDoctor::new(name, format_crm(&crm));
                doctor.specialty = specialty;
                doctor.phone = format_phone(&phone);
                let doctor = repo.add_doctor(&doctor)?;
                println!("Created doctor {}: {} (CRM {})", doctor.id, doctor.name, doctor.crm);
            }
            DoctorCommand::List => {
                let doctors = repo.list_doctors()?;
                print_records(cli.json, &doctors, "No doctors found.", |d| {
                    format!("ID: {}, Name: {}, CRM: {}, Specialty: {}", d.id, d.name, d.crm, d.specialty)
                })?;
            }
            DoctorCommand::Search { term } => {
                let doctors = search::filter_doctors(&repo.list_doctors()?, &term);
                print_records(cli.json, &doctors, "No doctors found.", |d| {
                    format!("ID: {}, Name: {}, CRM: {}", d.id, d.name, d.crm)
                })?;
            }
            DoctorCommand::Delete { id } => {
                if repo.delete_doctor(id)? {
                    println!("Deleted doctor {}", id);
                } else {
                    println!("No doctor with ID {}", id);
                }
            }
        },
        Commands::Medicine(cmd) => match cmd {
            MedicineCommand::Add {
                name,
                dosage,
                presentation,
                description,
            } => {
                let mut medicine = NewMedicine::new(name, dosage, presentation);
                medicine.description = description;
                let medicine = repo.add_medicine(&medicine)?;
                println!("Created medicine {}: {}", medicine.id, medicine.name);
            }
            MedicineCommand::List { filter } => {
                let catalog = repo.list_medicines()?;
                let medicines = search::filter_medicines(&catalog, filter.as_deref().unwrap_or(""));
                print_records(cli.json, &medicines, "No medicines found.", |m| {
                    format!("ID: {}, {} {} ({})", m.id, m.name, m.dosage, m.presentation)
                })?;
            }
            MedicineCommand::Delete { id } => {
                if repo.delete_medicine(id)? {
                    println!("Deleted medicine {}", id);
                } else {
                    println!("No medicine with ID {}", id);
                }
            }
        },
        Commands::Prescribe {
            patient_id,
            doctor,
            lines,
            dates,
            observations,
        } => {
            prescribe(repo.as_mut(), patient_id, doctor, &lines, &dates, observations)?;
        }
        Commands::Prescription(cmd) => match cmd {
            PrescriptionCommand::List { patient } => {
                let prescriptions = match patient {
                    Some(id) => repo.prescriptions_for_patient(id)?,
                    None => repo.list_prescriptions()?,
                };
                print_records(cli.json, &prescriptions, "No prescriptions found.", |p| {
                    format!(
                        "ID: {}, Date: {}, Patient: {}, Doctor: {}, Medicines: {}",
                        p.id,
                        p.date,
                        p.patient_id,
                        p.doctor_id,
                        p.medicines.len()
                    )
                })?;
            }
            PrescriptionCommand::Delete { id } => {
                if repo.delete_prescription(id)? {
                    println!("Deleted prescription {}", id);
                } else {
                    println!("No prescription with ID {}", id);
                }
            }
        },
        Commands::Print { id, html } => {
            let doc = PrescriptionDocument::load(repo.as_ref(), id, config.header())?
                .ok_or_else(|| anyhow!("no prescription with ID {}", id))?;
            let mode = if html {
                RenderMode::Print
            } else {
                RenderMode::Screen
            };
            print!("{}", doc.render(mode));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let (id, posology) = parse_line("9: 1 comprimido a cada 8h").unwrap();
        assert_eq!(id, 9);
        assert_eq!(posology, "1 comprimido a cada 8h");

        // Posology may itself contain colons
        let (_, posology) = parse_line("3:tomar às 08:00").unwrap();
        assert_eq!(posology, "tomar às 08:00");

        assert!(parse_line("amoxicilina").is_err());
        assert!(parse_line("x:8/8h").is_err());
    }

    #[test]
    fn test_cli_parses_repeated_dates() {
        let cli = Cli::try_parse_from([
            "clinic-rx",
            "prescribe",
            "7",
            "--doctor",
            "3",
            "--line",
            "9:1 comprimido a cada 8h por 7 dias",
            "--date",
            "2024-01-10",
            "--date",
            "2024-01-17",
        ])
        .unwrap();

        match cli.command {
            Commands::Prescribe { dates, lines, .. } => {
                assert_eq!(dates, vec!["2024-01-10", "2024-01-17"]);
                assert_eq!(lines.len(), 1);
            }
            _ => panic!("expected prescribe"),
        }
    }

    #[test]
    fn test_prescribe_fans_out() {
        let mut repo = clinic_rx_core::Database::open_in_memory().unwrap();
        Repository::add_patient(&mut repo, &NewPatient::new("Maria Silva")).unwrap();
        Repository::add_doctor(&mut repo, &NewDoctor::new("Dr. João", "12345")).unwrap();
        Repository::add_medicine(&mut repo, &NewMedicine::new("Amoxicilina", "500mg", "comprimido"))
            .unwrap();

        prescribe(
            &mut repo,
            1,
            1,
            &["1:8/8h".to_string()],
            &["2024-01-10".to_string(), "2024-01-17".to_string()],
            None,
        )
        .unwrap();

        let stored = Repository::list_prescriptions(&repo).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].date.to_string(), "2024-01-17");
    }
}

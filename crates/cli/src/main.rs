use clap::{Parser, Subcommand};
use medq_core::{
    constants::{DEFAULT_DOCTORS_FILE, DEFAULT_PATIENTS_FILE},
    token_label, BiometricOutcome, CoreConfig, DoctorDirectory, LogCodeDispatcher, NonEmptyText,
    OperationalFilter, Priority, QueueCore, SpecializationResolver, YamlDoctorDirectory,
    YamlPatientDirectory,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medq")]
#[command(about = "MedQ hospital queue system CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List doctors from the seed directory
    Doctors {
        /// Restrict to one specialization
        #[arg(long)]
        specialization: Option<String>,
        /// Doctor directory seed file
        #[arg(long, default_value = DEFAULT_DOCTORS_FILE)]
        doctors_file: PathBuf,
    },
    /// Rank specializations for a symptom description
    Resolve {
        /// Free-text symptom description
        symptoms: String,
    },
    /// Run an end-to-end queue demo against the seed directories
    Demo {
        /// Doctor directory seed file
        #[arg(long, default_value = DEFAULT_DOCTORS_FILE)]
        doctors_file: PathBuf,
        /// Patient directory seed file
        #[arg(long, default_value = DEFAULT_PATIENTS_FILE)]
        patients_file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Doctors {
            specialization,
            doctors_file,
        }) => {
            let directory = YamlDoctorDirectory::load(&doctors_file)?;
            let doctors = directory.list(specialization.as_deref());
            if doctors.is_empty() {
                println!("No doctors found.");
            } else {
                for doctor in doctors {
                    let capacity = doctor
                        .capacity
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unbounded".into());
                    println!(
                        "ID: {}, Name: {}, Specialization: {}, Capacity: {}",
                        doctor.id, doctor.name, doctor.specialization, capacity
                    );
                }
            }
        }
        Some(Commands::Resolve { symptoms }) => {
            let resolver = SpecializationResolver::with_builtin_index();
            let ranked = resolver.resolve(&symptoms)?;
            if ranked.is_empty() {
                println!("No matching specializations.");
            } else {
                for (rank, specialization) in ranked.iter().enumerate() {
                    println!(
                        "{}. {} ({})",
                        rank + 1,
                        specialization.name,
                        specialization.description
                    );
                }
            }
        }
        Some(Commands::Demo {
            doctors_file,
            patients_file,
        }) => run_demo(&doctors_file, &patients_file)?,
        None => {
            println!("Use --help to see available commands.");
        }
    }

    Ok(())
}

/// Walks one patient through the full flow: verification, resolution,
/// issuance, call, completion, printing the board between steps.
fn run_demo(
    doctors_file: &std::path::Path,
    patients_file: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let doctors = Arc::new(YamlDoctorDirectory::load(doctors_file)?);
    let patients = Arc::new(YamlPatientDirectory::load(patients_file)?);

    let first_profile = {
        let listing = doctors.list(None);
        listing
            .first()
            .cloned()
            .ok_or("doctor seed file is empty")?
    };

    let core = QueueCore::new(
        &CoreConfig::standard(),
        patients.clone(),
        doctors.clone(),
        Arc::new(LogCodeDispatcher),
    );

    // Verification needs a real credential; the demo reuses the seed data.
    let seeded_national_id = patients
        .profiles()
        .first()
        .map(|p| p.national_id.clone())
        .ok_or("patient seed file is empty")?;
    let patient = core
        .verification()
        .verify_document(&seeded_national_id, BiometricOutcome::Confirmed)?;
    println!(
        "Verified {} ({})",
        patient.full_name, patient.national_id_masked
    );

    let mut announcements = core.transitions().subscribe();

    let symptoms = NonEmptyText::new("general check-up")?;
    let token = core.issuance().issue(
        &patient,
        symptoms,
        &first_profile.specialization,
        first_profile.id,
        Priority::Normal,
    )?;
    println!(
        "Issued {} for {} with {}",
        token_label(token.token_number),
        token.patient_name,
        token.doctor_name
    );

    print_board(&core)?;

    core.transitions().call(token.id)?;
    if let Ok(event) = announcements.try_recv() {
        println!(
            "Announcement: now calling {} for {}",
            token_label(event.token_number),
            event.patient_name
        );
    }

    core.transitions().complete(token.id)?;
    println!("Completed {}", token_label(token.token_number));

    let completed = core.projection().operational_view(&OperationalFilter {
        status: Some(medq_core::TokenStatus::Completed),
        ..OperationalFilter::default()
    })?;
    println!("Completed today: {}", completed.len());

    print_board(&core)?;
    Ok(())
}

fn print_board(core: &QueueCore) -> Result<(), Box<dyn std::error::Error>> {
    let board = core.projection().public_view()?;
    if board.is_empty() {
        println!("Display board: empty");
    } else {
        println!("Display board:");
        for token in board {
            println!(
                "  {} {} ({}) [{}]",
                token_label(token.token_number),
                token.patient_name,
                token.specialization,
                token.status
            );
        }
    }
    Ok(())
}

mod output;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use medbot_client::{DictationClient, HttpBackend};
use medbot_core::config::timeout_from_env_value;
use medbot_core::constants::{
    DEFAULT_ANALYZE_URL, DEFAULT_API_URL, DEFAULT_SERVER_URL, DEFAULT_SESSION_FILE,
    DEFAULT_TRANSCRIBE_URL,
};
use medbot_core::dashboard::admin::{load_patients, AdminQuery};
use medbot_core::dashboard::doctor::{load_doctor_dashboard, DoctorQuery, DoctorStats};
use medbot_core::dashboard::patient::{load_patient_history, PatientHistoryQuery};
use medbot_core::dashboard::{DateRange, SortOrder};
use medbot_core::detail::{DiagnosisDetail, VitalField};
use medbot_core::download::download_test_result;
use medbot_core::forms::admission::{AdmissionDraft, AdmissionForm};
use medbot_core::forms::diagnosis::{DiagnosisDraft, DiagnosisForm};
use medbot_core::recorder::{FileAudioInput, Recorder};
use medbot_core::session::{login, logout, register};
use medbot_core::wire::{AnalysisResult, DiagnosisStatus, PatientStatus};
use medbot_core::{ClientConfig, NonEmptyText, Role, SessionStore};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medbot")]
#[command(about = "MedBot clinic client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// doctor, admin (staff) or patient
        #[arg(long, default_value = "doctor")]
        role: Role,
        /// Email for doctors and admins, aadhar number for patients
        identifier: String,
        password: String,
    },
    /// Create a patient account (log in afterwards with --role patient)
    Register {
        /// Aadhaar number
        aadhaar: String,
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Doctor dashboard: diagnoses with stats
    Diagnoses {
        /// Matches patient name, patient id or diagnosis id
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<DiagnosisStatus>,
        /// Exact diagnosis summary
        #[arg(long)]
        diagnosis: Option<String>,
        /// all, month, week or YYYY-MM-DD
        #[arg(long, default_value = "all")]
        range: DateRange,
        /// latest or oldest
        #[arg(long, default_value = "latest")]
        sort: SortOrder,
    },
    /// Admin dashboard: registered patients
    Patients {
        /// Matches patient name or aadhar number
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<PatientStatus>,
        /// Registration date: all, month, week or YYYY-MM-DD
        #[arg(long = "date", default_value = "all")]
        range: DateRange,
        #[arg(long, default_value = "latest")]
        sort: SortOrder,
    },
    /// Patient dashboard: own medical history
    History {
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long, default_value = "all")]
        range: DateRange,
        #[arg(long, default_value = "latest")]
        sort: SortOrder,
    },
    /// Show one diagnosis
    Show { id: String },
    /// Update the vitals of a diagnosis
    EditVitals {
        id: String,
        /// Blood pressure, e.g. 120/80
        #[arg(long)]
        bp: Option<String>,
        #[arg(long)]
        spo2: Option<String>,
        #[arg(long)]
        heart_rate: Option<String>,
        #[arg(long)]
        sugar: Option<String>,
    },
    /// Submit a new diagnosis for a patient
    AddDiagnosis {
        patient_id: String,
        /// JSON draft of the form
        #[arg(long)]
        draft: Option<PathBuf>,
        /// Recorded dictation merged into the draft before submitting
        #[arg(long)]
        dictation: Option<PathBuf>,
    },
    /// Transcribe and analyse a recording, printing the resulting draft
    Dictate { audio: PathBuf },
    /// Download an uploaded test result
    Download {
        file_name: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Admit a patient from a JSON draft
    Admit {
        #[arg(long)]
        draft: PathBuf,
    },
}

/// Resolve the client configuration from `MEDBOT_*` environment variables.
fn config_from_env() -> anyhow::Result<ClientConfig> {
    let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.into());

    let session_file = std::env::var("MEDBOT_SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_session_file());
    let timeout = timeout_from_env_value(std::env::var("MEDBOT_TIMEOUT_SECS").ok())?;

    Ok(ClientConfig::new(
        &var("MEDBOT_SERVER_URL", DEFAULT_SERVER_URL),
        &var("MEDBOT_API_URL", DEFAULT_API_URL),
        &var("MEDBOT_TRANSCRIBE_URL", DEFAULT_TRANSCRIBE_URL),
        &var("MEDBOT_ANALYZE_URL", DEFAULT_ANALYZE_URL),
        session_file,
        timeout,
    )?)
}

fn default_session_file() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => Path::new(&home).join(DEFAULT_SESSION_FILE),
        Err(_) => PathBuf::from(DEFAULT_SESSION_FILE),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Where drafts that failed to submit are kept: `drafts/` next to the session file.
fn drafts_dir(config: &ClientConfig) -> PathBuf {
    config
        .session_file()
        .parent()
        .map_or_else(|| PathBuf::from("drafts"), |dir| dir.join("drafts"))
}

/// Write a draft that failed to submit so it can be retried with `--draft`.
fn save_draft(
    dir: &Path,
    patient_id: &str,
    draft: &DiagnosisDraft,
    at: NaiveDateTime,
) -> anyhow::Result<PathBuf> {
    let patient: String = patient_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("diagnosis-{patient}-{}.json", at.format("%Y%m%dT%H%M%S")));
    std::fs::write(&path, serde_json::to_string_pretty(draft)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Keep a rejected form's data: in a draft file, or on stdout if that cannot be written.
fn keep_unsubmitted_draft(
    config: &ClientConfig,
    patient_id: &str,
    draft: &DiagnosisDraft,
    at: NaiveDateTime,
) -> anyhow::Result<()> {
    match save_draft(&drafts_dir(config), patient_id, draft, at) {
        Ok(path) => eprintln!(
            "Diagnosis not submitted. Draft saved; retry with: medbot add-diagnosis {patient_id} --draft {}",
            path.display()
        ),
        Err(err) => {
            tracing::warn!("could not save draft: {err:#}");
            println!("{}", serde_json::to_string_pretty(draft)?);
            eprintln!("Diagnosis not submitted. Draft printed above; save it and retry with --draft");
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Run a recording through transcription and analysis. Ctrl-C abandons processing.
async fn run_dictation(
    config: &ClientConfig,
    audio: &Path,
) -> anyhow::Result<Option<AnalysisResult>> {
    let dictation = DictationClient::new(config)?;
    let (mut recorder, cancel) = Recorder::new(FileAudioInput::new(audio));
    recorder.start()?;
    let captured = recorder.capture()?;
    tracing::debug!(bytes = captured, "captured dictation");

    let interrupt = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => cancel.cancel(),
            Err(_) => std::future::pending().await,
        }
    });
    let analysis = recorder.stop(&dictation).await;
    interrupt.abort();

    if let Some(text) = recorder.display_text() {
        eprintln!("{text}");
    }
    Ok(analysis)
}

async fn run(command: Commands, config: &ClientConfig) -> anyhow::Result<()> {
    let backend = HttpBackend::new(config)?;
    let store = SessionStore::new(config.session_file());

    match command {
        Commands::Login {
            role,
            identifier,
            password,
        } => {
            let session = login(&backend, &store, role, &identifier, &password).await?;
            println!("Logged in as {} ({})", session.display_name(), session.role());
        }
        Commands::Register { aadhaar, password } => {
            register(&backend, &aadhaar, &password).await?;
            println!("Registered. Log in with: medbot login --role patient {}", aadhaar.trim());
        }
        Commands::Logout => {
            if logout(&store)? {
                println!("Logged out");
            } else {
                println!("No active session");
            }
        }
        Commands::Whoami => match store.load()? {
            Some(session) => println!("{} ({})", session.display_name(), session.role()),
            None => println!("Not logged in"),
        },
        Commands::Diagnoses {
            search,
            status,
            diagnosis,
            range,
            sort,
        } => {
            let rows = load_doctor_dashboard(&backend, &store).await?;
            let query = DoctorQuery {
                search,
                diagnosis,
                status,
                range,
                sort,
            };
            output::print_doctor_dashboard(&DoctorStats::from_rows(&rows), &query.apply(&rows, today()));
        }
        Commands::Patients {
            search,
            status,
            range,
            sort,
        } => {
            let rows = load_patients(&backend, &store).await?;
            let query = AdminQuery {
                search,
                status,
                range,
                sort,
            };
            output::print_patients(&query.apply(&rows, today()));
        }
        Commands::History {
            doctor,
            department,
            range,
            sort,
        } => {
            let rows = load_patient_history(&backend, &store).await?;
            let query = PatientHistoryQuery {
                doctor,
                department,
                range,
                sort,
            };
            output::print_history(&query.apply(&rows, today()));
        }
        Commands::Show { id } => {
            let detail = DiagnosisDetail::load(&backend, &store, &id).await?;
            output::print_detail(detail.view());
        }
        Commands::EditVitals {
            id,
            bp,
            spo2,
            heart_rate,
            sugar,
        } => {
            let edits: Vec<(VitalField, String)> = [
                (VitalField::BloodPressure, bp),
                (VitalField::Spo2, spo2),
                (VitalField::HeartRate, heart_rate),
                (VitalField::BloodSugar, sugar),
            ]
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .collect();
            if edits.is_empty() {
                anyhow::bail!("nothing to update: pass at least one of --bp, --spo2, --heart-rate, --sugar");
            }

            let mut detail = DiagnosisDetail::load(&backend, &store, &id).await?;
            detail.begin_edit();
            for (field, value) in edits {
                detail.set_vital(field, value)?;
            }
            detail.save_edit(&backend, &store, Utc::now()).await?;
            output::print_vitals(detail.view());
        }
        Commands::AddDiagnosis {
            patient_id,
            draft,
            dictation,
        } => {
            let patient_id = NonEmptyText::new(&patient_id)?;
            let draft = match draft {
                Some(path) => read_json::<DiagnosisDraft>(&path)?,
                None => DiagnosisDraft::default(),
            };
            let mut form = DiagnosisForm::with_draft(patient_id, draft);
            if let Some(audio) = dictation {
                if let Some(analysis) = run_dictation(config, &audio).await? {
                    form.apply_analysis(&analysis);
                }
            }

            let now = Local::now().naive_local();
            let submitted = match form.continue_to_prescriptions().confirm(&backend, &store, now).await {
                Ok(submitted) => submitted,
                Err(rejected) => {
                    let (form, err) = rejected.into_parts();
                    keep_unsubmitted_draft(config, form.patient_id(), form.draft(), now)?;
                    return Err(err.into());
                }
            };
            let request = submitted.request();
            println!(
                "Diagnosis submitted for patient {} on {} at {}",
                request.patient_id, request.diagnosis_date, request.diagnosis_time
            );
        }
        Commands::Dictate { audio } => {
            let mut draft = DiagnosisDraft::default();
            if let Some(analysis) = run_dictation(config, &audio).await? {
                medbot_core::merge::merge_analysis(&mut draft, &analysis);
            }
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        Commands::Download { file_name, out } => {
            let file = download_test_result(&backend, &store, &file_name, &out).await?;
            output::print_download(&file);
        }
        Commands::Admit { draft } => {
            let draft: AdmissionDraft = read_json(&draft)?;
            let admitted = AdmissionForm::from_draft(draft)
                .next()
                .submit(&backend, &store, Local::now().naive_local())
                .await
                .map_err(|err| err.error)?;
            let request = admitted.request();
            println!(
                "Admitted {} to {} ward, room {}, bed {}",
                request.patient.name,
                request.allocation.ward,
                request.allocation.room_number,
                request.allocation.bed_number
            );
        }
    }

    Ok(())
}

/// Entry point for the `medbot` CLI.
///
/// # Environment Variables
/// - `MEDBOT_SERVER_URL`: login host (default: `http://localhost:8000`)
/// - `MEDBOT_API_URL`: REST API root (default: `http://localhost:8000/api`)
/// - `MEDBOT_TRANSCRIBE_URL` / `MEDBOT_ANALYZE_URL`: dictation services
/// - `MEDBOT_SESSION_FILE`: session file (default: `$HOME/.medbot/session.json`)
/// - `MEDBOT_TIMEOUT_SECS`: request timeout in seconds (default: 30)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("medbot=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'medbot --help' for commands");
        return Ok(());
    };

    let config = config_from_env()?;
    run(command, &config).await
}

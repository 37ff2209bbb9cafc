//! Plain-text rendering of dashboards and detail views.

use chrono::{NaiveDate, NaiveTime};
use medbot_core::constants::NOT_AVAILABLE;
use medbot_core::dashboard::admin::PatientRow;
use medbot_core::dashboard::doctor::{DiagnosisRow, DoctorStats};
use medbot_core::dashboard::patient::MedicalRecordRow;
use medbot_core::dashboard::DashboardView;
use medbot_core::detail::DiagnosisView;
use medbot_core::download::DownloadedFile;

fn text(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

fn date(value: Option<NaiveDate>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), |d| d.format("%Y-%m-%d").to_string())
}

fn time(value: Option<NaiveTime>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), |t| t.format("%I:%M %p").to_string())
}

/// Print the rows, or the empty-state message.
fn table<T>(view: &DashboardView<T>, header: &str, line: impl Fn(&T) -> String) {
    match view {
        DashboardView::Empty { message } => println!("{message}"),
        DashboardView::Table(rows) => {
            println!("{header}");
            for row in rows {
                println!("{}", line(row));
            }
        }
    }
}

pub fn print_doctor_dashboard(stats: &DoctorStats, view: &DashboardView<DiagnosisRow>) {
    println!(
        "Patients: {}  Ongoing: {}  Completed: {}",
        stats.patients, stats.ongoing, stats.completed
    );
    println!();
    table(
        view,
        &format!(
            "{:<8} {:<24} {:<28} {:<11} {:<8} {}",
            "ID", "PATIENT", "DIAGNOSIS", "DATE", "TIME", "STATUS"
        ),
        |row| {
            format!(
                "{:<8} {:<24} {:<28} {:<11} {:<8} {}",
                row.id,
                row.patient_name,
                text(row.diagnosis.as_deref()),
                date(row.date),
                time(row.time),
                row.status.map_or(NOT_AVAILABLE, |s| s.label())
            )
        },
    );
}

pub fn print_patients(view: &DashboardView<PatientRow>) {
    table(
        view,
        &format!(
            "{:<8} {:<24} {:<14} {:<8} {:<5} {:<11} {}",
            "ID", "NAME", "AADHAR", "GENDER", "AGE", "REGISTERED", "STATUS"
        ),
        |row| {
            format!(
                "{:<8} {:<24} {:<14} {:<8} {:<5} {:<11} {}",
                row.id,
                row.name,
                text(row.aadhar.as_deref()),
                text(row.gender.as_deref()),
                row.age.map_or_else(|| NOT_AVAILABLE.to_owned(), |a| a.to_string()),
                date(row.date),
                row.status.map_or(NOT_AVAILABLE, |s| s.label())
            )
        },
    );
}

pub fn print_history(view: &DashboardView<MedicalRecordRow>) {
    table(
        view,
        &format!(
            "{:<8} {:<11} {:<8} {:<20} {:<18} {}",
            "ID", "DATE", "TIME", "DOCTOR", "DEPARTMENT", "DIAGNOSIS"
        ),
        |row| {
            format!(
                "{:<8} {:<11} {:<8} {:<20} {:<18} {}",
                row.id,
                date(row.date),
                time(row.time),
                text(row.doctor.as_deref()),
                text(row.department.as_deref()),
                text(row.diagnosis.as_deref())
            )
        },
    );
}

pub fn print_vitals(view: &DiagnosisView) {
    println!("Blood pressure: {}", view.vitals.blood_pressure);
    println!("SpO2:           {}", view.vitals.spo2);
    println!("Heart rate:     {}", view.vitals.heart_rate);
    println!("Blood sugar:    {}", view.vitals.blood_sugar);
    println!("Last updated:   {}", view.last_updated);
}

pub fn print_detail(view: &DiagnosisView) {
    println!("Diagnosis #{} ({})", view.id, view.status);
    println!("Patient: {} (#{}), {} / {}", view.patient_name, view.patient_id, view.age, view.gender);
    println!("Doctor:  {}, {}", view.doctor_name, view.department);
    println!("Recorded: {}", view.recorded_on);
    println!();
    print_vitals(view);
    println!();
    println!("Summary: {}", view.summary);
    println!("Tests: {}", view.tests_summary);
    if !view.test_results.is_empty() {
        println!("Test results:");
        for file in &view.test_results {
            println!("  - {file}");
        }
    }
    println!("Analysis: {}", view.analysis);
    if !view.prescriptions.is_empty() {
        println!("Prescriptions:");
        for p in &view.prescriptions {
            println!("  - {} {} for {} ({})", p.drug, p.dosage, p.duration, p.method);
        }
    }
    println!("Notes: {}", view.notes);
    println!("Medical history: {}", view.medical_history);
    println!("Allergies: {}", view.allergies);
    println!("Family history: {}", view.family_history);
}

pub fn print_download(file: &DownloadedFile) {
    println!(
        "Saved {} ({} bytes, {})",
        file.path.display(),
        file.size_bytes,
        file.media_type
    );
    println!("sha256 {}", file.sha256);
}

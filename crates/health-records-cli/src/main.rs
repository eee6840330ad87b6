mod config;
mod shell;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use config::Config;
use health_records_core::export;
use health_records_core::{Database, Scope, Session, SessionOptions, WrapPolicy};
use shell::Shell;

/// Keep a personal record of medical visits, prescriptions and documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory for uploaded document copies (overrides config)
    #[arg(long)]
    documents: Option<PathBuf>,

    /// Wrap around at either end of the record list
    #[arg(long)]
    wrap: bool,

    /// Config file (defaults to ~/.health-records/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Interactive record browser (default)
    Shell,

    /// Write records to a CSV file
    Export {
        path: PathBuf,

        /// Only this patient's records
        #[arg(long)]
        patient: Option<i64>,
    },

    /// Read records from a CSV file
    Import {
        path: PathBuf,

        /// Patient to import under
        #[arg(long)]
        patient: Option<i64>,
    },

    /// List patients
    Patients,

    /// Show the saved patient details
    Profile,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let config = Config::load_or_init(&config_path)?;
    debug!(?config, path = ?config_path, "Loaded config");

    let session = open_session(&args, &config)?;

    match args.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let stdin = io::stdin();
            let mut shell = Shell::new(session, stdin.lock(), io::stdout());
            shell.run()
        }
        Commands::Export { path, patient } => export_records(&session, &path, patient),
        Commands::Import { path, patient } => import_records(session, &path, patient),
        Commands::Patients => list_patients(&session),
        Commands::Profile => show_profile(&session),
    }
}

/// Open the session, letting flags take precedence over config values.
fn open_session(args: &Args, config: &Config) -> Result<Session> {
    let db_path = match &args.db {
        Some(path) => path.clone(),
        None => config.get_database_path()?,
    };
    let documents_dir = match &args.documents {
        Some(dir) => dir.clone(),
        None => config.get_documents_dir()?,
    };
    let wrap = if args.wrap || config.wrap_navigation {
        WrapPolicy::Wrap
    } else {
        WrapPolicy::Clamp
    };

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!("Database: {:?}", db_path);
    info!("Documents: {:?}", documents_dir);

    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let options = SessionOptions {
        documents_dir,
        wrap,
    };
    Session::new(db, options).context("Failed to load records")
}

fn export_records(session: &Session, path: &Path, patient: Option<i64>) -> Result<()> {
    let scope = patient.map(Scope::Patient).unwrap_or(Scope::All);
    let count = export::export_csv_file(session.database(), scope, path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;
    println!("Exported {} records to {}", count, path.display());
    Ok(())
}

fn import_records(mut session: Session, path: &Path, patient: Option<i64>) -> Result<()> {
    if let Some(id) = patient {
        session.select_patient(id)?;
    }
    let report = session
        .import_csv(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    println!("Imported {} records", report.imported.len());
    let mut stderr = io::stderr();
    for row in &report.skipped {
        writeln!(stderr, "skipped line {}: {}", row.line, row.reason)?;
    }
    for missing in &report.missing_documents {
        writeln!(stderr, "document not found: {}", missing)?;
    }
    for failed in &report.failed_documents {
        writeln!(
            stderr,
            "document not attached (line {}): {}: {}",
            failed.line, failed.path, failed.error
        )?;
    }
    Ok(())
}

fn list_patients(session: &Session) -> Result<()> {
    let patients = session.patients()?;
    if patients.is_empty() {
        println!("No patients.");
    }
    for patient in patients {
        println!("{}  {}", patient.id, patient.name);
    }
    Ok(())
}

fn show_profile(session: &Session) -> Result<()> {
    match session.patient_details()? {
        Some(details) => print!("{}", details.render()),
        None => println!("No profile saved."),
    }
    Ok(())
}

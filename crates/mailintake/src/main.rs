//! CLI entry point for `mailintake`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use mailintake::config::{
    config_warnings, default_config_path, load_config, IntakeConfig, LogFormat,
};
use mailintake::db::{record_repo, Database, Record, RecordStatus, RecordStore};
use mailintake::email::ImapSession;
use mailintake::logging::init_logging;
use mailintake::pipeline::{MailboxSync, SyncLock};

#[derive(Parser)]
#[command(name = "mailintake", version, about = "Ingest job-application emails into reviewable records")]
struct Cli {
    /// Config file [default: ~/.mailintake/config.yaml]
    #[arg(short, long, global = true, env = "MAILINTAKE_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format (pretty, json); overrides the config file
    #[arg(long, global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new messages from the mailbox and store them as records
    Sync {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored records, newest first
    List {
        /// Only show records with this status
        #[arg(long)]
        status: Option<RecordStatus>,
        #[arg(long)]
        json: bool,
    },
    /// Change the review status of a record
    SetStatus {
        id: i64,
        /// new, pending, interview, offer, rejected or finished
        status: RecordStatus,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path().context("could not determine home directory")?,
    };
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let format = cli.log_format.unwrap_or(config.logging.format);
    init_logging(cli.verbose, format)?;
    for warning in config_warnings(&config) {
        log::warn!("{}", warning);
    }

    match cli.command {
        Commands::Sync { json } => sync(config, json).await,
        Commands::List { status, json } => list(&config, status, json),
        Commands::SetStatus { id, status } => set_status(&config, id, status),
    }
}

async fn sync(config: IntakeConfig, json: bool) -> Result<()> {
    let paths = config.storage.resolve();
    let _lock = SyncLock::acquire(&paths.root)?;

    let db = Database::open(&paths.database)?;
    let mailbox = ImapSession::new(config.clone());
    let mut sync = MailboxSync::from_config(&config, mailbox, db)?;

    let summary = sync.run().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

fn list(config: &IntakeConfig, status: Option<RecordStatus>, json: bool) -> Result<()> {
    let db = Database::open(&config.storage.resolve().database)?;
    let records = record_repo::query(&db, status)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records.");
        return Ok(());
    }

    for record in &records {
        print_record(record);
    }

    let counts = record_repo::count_by_status(&db)?
        .into_iter()
        .map(|(status, count)| format!("{}: {}", status, count))
        .collect::<Vec<_>>()
        .join(", ");
    println!("\n{} shown ({})", records.len(), counts);
    Ok(())
}

fn print_record(record: &Record) {
    println!(
        "{:>5}  {:<9}  {:<25}  {:<30}  {}  [{} files]",
        record.id,
        record.status.as_str(),
        record.send_time.as_deref().unwrap_or("-"),
        record.sender,
        record.subject.as_deref().unwrap_or("(no subject)"),
        record.attachment_paths().len(),
    );
}

fn set_status(config: &IntakeConfig, id: i64, status: RecordStatus) -> Result<()> {
    let db = Database::open(&config.storage.resolve().database)?;
    if !db.update_status(id, status)? {
        bail!("no record with id {}", id);
    }
    println!("Record {} is now {}", id, status);
    Ok(())
}

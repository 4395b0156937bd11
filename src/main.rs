use clap::Parser;
use loanflow::application::events::RequestEventService;
use loanflow::application::lifecycle::RequestLifecycleService;
use loanflow::config::LifecycleConfig;
use loanflow::domain::loan::LoanType;
use loanflow::domain::ports::{EventPublisherRef, LoanTypeStoreRef, RequestStoreRef};
use loanflow::domain::profile::UserProfile;
use loanflow::infrastructure::in_memory::{
    InMemoryIdentityDirectory, InMemoryLoanTypeStore, InMemoryRequestStore,
};
#[cfg(feature = "storage-rocksdb")]
use loanflow::infrastructure::rocksdb::RocksDBStore;
use loanflow::interfaces::csv::catalog_reader::{LoanTypeReader, ProfileReader};
use loanflow::interfaces::jsonl::command_reader::CommandReader;
use loanflow::interfaces::jsonl::event_writer::JsonLinesPublisher;
use loanflow::interfaces::jsonl::session::CommandSession;
use loanflow::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Commands file, one JSON command per line
    commands: PathBuf,

    /// Loan type catalog CSV
    #[arg(long)]
    loan_types: Option<PathBuf>,

    /// Identity profiles CSV
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct Stores {
    loan_types: LoanTypeStoreRef,
    requests: RequestStoreRef,
}

fn in_memory_stores(loan_types: Vec<LoanType>) -> Stores {
    let catalog = InMemoryLoanTypeStore::with_loan_types(loan_types);
    let requests = InMemoryRequestStore::new(catalog.clone());
    Stores {
        loan_types: Arc::new(catalog),
        requests: Arc::new(requests),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>, loan_types: Vec<LoanType>) -> Result<Stores> {
    let Some(db_path) = db_path else {
        return Ok(in_memory_stores(loan_types));
    };
    let store = RocksDBStore::open(&db_path).into_diagnostic()?;
    for loan_type in &loan_types {
        store.put_loan_type(loan_type).into_diagnostic()?;
    }
    info!(path = %db_path.display(), "using RocksDB storage");
    Ok(Stores {
        loan_types: Arc::new(store.clone()),
        requests: Arc::new(store),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>, loan_types: Vec<LoanType>) -> Result<Stores> {
    if db_path.is_some() {
        tracing::warn!(
            "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
        );
    }
    Ok(in_memory_stores(loan_types))
}

fn read_loan_types(path: Option<PathBuf>) -> Result<Vec<LoanType>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let file = File::open(path).into_diagnostic()?;
    LoanTypeReader::new(file)
        .loan_types()
        .collect::<loanflow::error::Result<_>>()
        .into_diagnostic()
}

fn read_profiles(path: Option<PathBuf>) -> Result<Vec<UserProfile>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let file = File::open(path).into_diagnostic()?;
    ProfileReader::new(file)
        .profiles()
        .collect::<loanflow::error::Result<_>>()
        .into_diagnostic()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level).into_diagnostic()?;

    let loan_types = read_loan_types(cli.loan_types)?;
    let profiles = read_profiles(cli.profiles)?;
    info!(
        loan_types = loan_types.len(),
        profiles = profiles.len(),
        "catalogs loaded"
    );

    let stores = open_stores(cli.db_path, loan_types)?;
    let identity = Arc::new(InMemoryIdentityDirectory::with_profiles(profiles));
    let publisher: EventPublisherRef = Arc::new(JsonLinesPublisher::new(io::stdout()));
    let config = LifecycleConfig::default();

    let lifecycle = Arc::new(RequestLifecycleService::with_config(
        stores.loan_types,
        stores.requests.clone(),
        identity,
        publisher.clone(),
        config.clone(),
    ));
    let events =
        RequestEventService::with_config(lifecycle.clone(), stores.requests, publisher, &config);
    let mut session = CommandSession::new(lifecycle, events);

    let file = File::open(cli.commands).into_diagnostic()?;
    let reader = CommandReader::new(BufReader::new(file));
    for (index, command) in reader.commands().enumerate() {
        let outcome = match command {
            Ok(command) => session.execute(command).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome).into_diagnostic()?),
            Err(err) => error!(command = index + 1, kind = ?err.kind(), error = %err, "command failed"),
        }
    }

    Ok(())
}

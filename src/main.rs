use clap::Parser;
use ledger_dispatch::application::dispatcher::Dispatcher;
use ledger_dispatch::config::{DEFAULT_CHAINCODE, DEFAULT_QUEUE_NAME, DispatchConfig, DispatchMode};
use ledger_dispatch::domain::method::MethodKind;
use ledger_dispatch::domain::ports::QueueTransportBox;
use ledger_dispatch::infrastructure::in_memory::{InMemoryLedger, InMemoryQueue};
use ledger_dispatch::infrastructure::log_notifier::LogNotifier;
use ledger_dispatch::interfaces::csv::request_reader::RequestReader;
use ledger_dispatch::interfaces::csv::result_writer::ResultWriter;
use ledger_dispatch::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input requests CSV file (caller,method,force,params)
    input: PathBuf,

    /// Execute writes directly against the ledger or push them onto the queue
    #[arg(long, value_enum, env = "DISPATCH_MODE", default_value_t = DispatchMode::Queued)]
    mode: DispatchMode,

    /// Name of the queue writes are published to
    #[arg(long, env = "QUEUE_NAME", default_value = DEFAULT_QUEUE_NAME)]
    queue_name: String,

    /// Chaincode the ledger client targets
    #[arg(long, env = "CHAINCODE_NAME", default_value = DEFAULT_CHAINCODE)]
    chaincode: String,

    /// Path to a durable queue (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
fn queue_transport(db_path: Option<PathBuf>) -> Result<QueueTransportBox> {
    use ledger_dispatch::infrastructure::rocksdb::RocksDBQueue;

    match db_path {
        Some(path) => Ok(Box::new(RocksDBQueue::open(path).into_diagnostic()?)),
        None => Ok(Box::new(InMemoryQueue::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn queue_transport(db_path: Option<PathBuf>) -> Result<QueueTransportBox> {
    if db_path.is_some() {
        tracing::warn!(
            "Durable queue requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory queue."
        );
    }
    Ok(Box::new(InMemoryQueue::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let config = DispatchConfig::new(cli.mode)
        .with_queue_name(cli.queue_name)
        .with_chaincode(cli.chaincode);
    info!(mode = ?config.mode(), queue = config.queue_name(), "Starting dispatcher");

    // The ledger client is external; locally it is an in-memory log.
    let dispatcher = Dispatcher::new(
        config,
        Box::new(InMemoryLedger::new()),
        queue_transport(cli.db_path)?,
        Box::new(LogNotifier::new()),
    );

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    let stdout = io::stdout();
    let mut writer = ResultWriter::new(stdout.lock());

    for request in reader.requests() {
        match request {
            Ok(request) => match request.method().kind() {
                MethodKind::Write => {
                    let result = dispatcher.dispatch(&request).await;
                    writer.write_dispatch(&request, &result).into_diagnostic()?;
                }
                MethodKind::Read => {
                    let result = dispatcher
                        .dispatch_query(request.method(), request.params())
                        .await;
                    writer.write_query(&request, &result).into_diagnostic()?;
                }
            },
            Err(e) => {
                eprintln!("Error reading request: {}", e);
            }
        }
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Failures reported by the external ledger client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("ledger rejected transaction: {0}")]
    Rejected(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by the queue transport when a message is not accepted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("queue rejected message: {0}")]
    Rejected(String),
    #[error("queue unreachable: {0}")]
    Unreachable(String),
    #[error("queue quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("queue storage failure: {0}")]
    Storage(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

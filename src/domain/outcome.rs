use super::method::{ChainMethod, MethodKind};
use super::schema::FieldError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Ledger transaction hash returned by a committed direct invoke.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque receipt from the queue transport. Says nothing about whether or
/// when the transaction reaches the ledger.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a dispatch did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureCause {
    /// Request body failed its schema. Client fault, never retried.
    Validation(Vec<FieldError>),
    /// Message envelope could not be encoded.
    Serialization(String),
    /// Queue rejected the message or could not be reached. Retrying is up
    /// to the caller.
    QueueTransport(String),
    /// Ledger invoke or query failed. Not retried: a repeated write could be
    /// applied twice.
    LedgerInvocation(String),
    /// Write method sent to the query path or vice versa.
    MethodKindMismatch {
        method: ChainMethod,
        expected: MethodKind,
    },
}

impl FailureCause {
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            FailureCause::Validation(_) | FailureCause::MethodKindMismatch { .. }
        )
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Validation(errors) => {
                let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "validation failed: {}", joined.join("; "))
            }
            FailureCause::Serialization(msg) => write!(f, "serialization failed: {}", msg),
            FailureCause::QueueTransport(msg) => write!(f, "queue transport failed: {}", msg),
            FailureCause::LedgerInvocation(msg) => write!(f, "ledger invocation failed: {}", msg),
            FailureCause::MethodKindMismatch { method, expected } => {
                write!(f, "{} is not a {:?} method", method, expected)
            }
        }
    }
}

/// Uniform outcome of a write dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    Direct { tx_hash: TxHash },
    Queued { submission_id: SubmissionId },
    Failed { cause: FailureCause },
}

impl DispatchResult {
    pub fn failed(cause: FailureCause) -> Self {
        DispatchResult::Failed { cause }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DispatchResult::Failed { .. })
    }

    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            DispatchResult::Failed { cause } => Some(cause),
            _ => None,
        }
    }
}

/// Outcome of a read dispatch.
pub type QueryResult = Result<Value, FailureCause>;

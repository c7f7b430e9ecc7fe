use super::method::ChainMethod;
use super::outcome::{SubmissionId, TxHash};
use super::queue::QueueMessage;
use super::request::CallerId;
use crate::error::{LedgerError, NotifyError, TransportError};
use async_trait::async_trait;
use serde_json::Value;

/// Client for the distributed ledger. Must tolerate concurrent calls.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn invoke(&self, method: &str, params: &[String]) -> Result<TxHash, LedgerError>;
    async fn query(&self, method: &str, params: &[String]) -> Result<Value, LedgerError>;
}

/// Durable, deduplicating, per-group FIFO queue.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Accepts the message, or reports why it was not accepted. A message
    /// whose dedup key was already accepted inside the transport's window is
    /// acknowledged without being enqueued again.
    async fn send(&self, message: QueueMessage) -> Result<SubmissionId, TransportError>;
}

/// Subscribers interested in direct-invoke outcomes.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify_success(
        &self,
        caller: &CallerId,
        method: ChainMethod,
        params: &[String],
    ) -> Result<(), NotifyError>;

    async fn notify_error(
        &self,
        caller: &CallerId,
        method: ChainMethod,
        params: &[String],
    ) -> Result<(), NotifyError>;
}

pub type LedgerClientBox = Box<dyn LedgerClient>;
pub type QueueTransportBox = Box<dyn QueueTransport>;
pub type EventNotifierBox = Box<dyn EventNotifier>;

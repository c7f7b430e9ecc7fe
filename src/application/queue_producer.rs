use crate::domain::method::ChainMethod;
use crate::domain::outcome::{DispatchResult, FailureCause};
use crate::domain::params::{DeduplicationKey, NormalizedParams};
use crate::domain::ports::QueueTransportBox;
use crate::domain::queue::QueueMessage;
use crate::domain::request::CallerId;
use tracing::{debug, error};
use uuid::Uuid;

/// Publishes write requests onto the durable queue.
///
/// `Queued` means the transport durably accepted the message, not that the
/// ledger applied it. Rejections come back as `Failed`; retrying them is the
/// caller's decision.
pub struct QueueProducer {
    transport: QueueTransportBox,
    queue_name: String,
}

impl QueueProducer {
    pub fn new(transport: QueueTransportBox, queue_name: impl Into<String>) -> Self {
        Self {
            transport,
            queue_name: queue_name.into(),
        }
    }

    /// Submits with a dedup key derived from the params alone, so identical
    /// payloads collapse at the transport even across callers.
    pub async fn submit(
        &self,
        method: ChainMethod,
        params: &NormalizedParams,
        caller: &CallerId,
    ) -> DispatchResult {
        let dedup_key = DeduplicationKey::from_params(params);
        self.send(method, params, caller, dedup_key).await
    }

    /// Submits with a one-off dedup key so the transport accepts the payload
    /// even if an identical one is still inside its deduplication window.
    pub async fn submit_forced(
        &self,
        method: ChainMethod,
        params: &NormalizedParams,
        caller: &CallerId,
    ) -> DispatchResult {
        let nonce = Uuid::new_v4().to_string();
        let dedup_key = DeduplicationKey::salted(params, &nonce);
        self.send(method, params, caller, dedup_key).await
    }

    async fn send(
        &self,
        method: ChainMethod,
        params: &NormalizedParams,
        caller: &CallerId,
        dedup_key: DeduplicationKey,
    ) -> DispatchResult {
        let message = match QueueMessage::new(method, params, dedup_key, caller.clone()) {
            Ok(message) => message,
            Err(e) => {
                error!(queue = %self.queue_name, %method, %caller, error = %e, "JSON Parse Error");
                return DispatchResult::failed(FailureCause::Serialization(e.to_string()));
            }
        };
        let dedup_key = message.dedup_key.clone();

        match self.transport.send(message).await {
            Ok(submission_id) => {
                debug!(
                    queue = %self.queue_name,
                    %method,
                    %caller,
                    %dedup_key,
                    %submission_id,
                    "Transaction pushed to queue"
                );
                DispatchResult::Queued { submission_id }
            }
            Err(e) => {
                error!(
                    queue = %self.queue_name,
                    %method,
                    %caller,
                    error = %e,
                    "Failed to push transaction to queue"
                );
                DispatchResult::failed(FailureCause::QueueTransport(e.to_string()))
            }
        }
    }
}

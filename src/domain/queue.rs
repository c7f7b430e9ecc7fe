use super::method::ChainMethod;
use super::params::{DeduplicationKey, NormalizedParams};
use super::request::CallerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope handed to the queue transport. Once sent it belongs to the
/// transport; the producer keeps no reference.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct QueueMessage {
    /// Carried as a message attribute so the consumer knows what to invoke.
    pub method: ChainMethod,
    /// JSON array of the normalized params.
    pub body: String,
    pub dedup_key: DeduplicationKey,
    /// FIFO scope: delivery is ordered within a group, not across groups.
    pub ordering_group: CallerId,
    pub delay_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl QueueMessage {
    pub fn new(
        method: ChainMethod,
        params: &NormalizedParams,
        dedup_key: DeduplicationKey,
        ordering_group: CallerId,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            method,
            body: serde_json::to_string(params)?,
            dedup_key,
            ordering_group,
            delay_seconds: 0,
            created_at: Utc::now(),
        })
    }

    /// Decodes the body back into params, as a consumer would.
    pub fn params(&self) -> serde_json::Result<NormalizedParams> {
        serde_json::from_str(&self.body)
    }
}

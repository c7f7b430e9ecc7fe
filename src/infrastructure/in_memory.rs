use crate::domain::method::ChainMethod;
use crate::domain::outcome::{SubmissionId, TxHash};
use crate::domain::params::DeduplicationKey;
use crate::domain::ports::{EventNotifier, LedgerClient, QueueTransport};
use crate::domain::queue::QueueMessage;
use crate::domain::request::CallerId;
use crate::error::{LedgerError, NotifyError, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// How long an accepted dedup key suppresses identical messages.
pub const DEDUP_WINDOW: Duration = Duration::minutes(5);

/// A committed invocation recorded by [`InMemoryLedger`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub tx_hash: TxHash,
    pub method: String,
    pub params: Vec<String>,
}

#[derive(Default)]
struct LedgerState {
    log: Vec<Invocation>,
    queries: usize,
    fail_with: Option<LedgerError>,
}

/// An append-only invocation log standing in for a real ledger.
///
/// Clones share the same log, so a test can keep a handle while the
/// dispatcher owns a boxed copy.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that answers every call with `error`.
    pub fn failing(error: LedgerError) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                fail_with: Some(error),
                ..Default::default()
            })),
        }
    }

    pub async fn invocations(&self) -> Vec<Invocation> {
        self.state.read().await.log.clone()
    }

    pub async fn query_count(&self) -> usize {
        self.state.read().await.queries
    }
}

fn tx_hash(seq: usize, method: &str, params: &[String]) -> TxHash {
    let mut hasher = Sha256::new();
    hasher.update((seq as u64).to_be_bytes());
    hasher.update(method.as_bytes());
    for param in params {
        hasher.update((param.len() as u64).to_be_bytes());
        hasher.update(param.as_bytes());
    }
    TxHash::new(hex::encode(hasher.finalize()))
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn invoke(&self, method: &str, params: &[String]) -> Result<TxHash, LedgerError> {
        let mut state = self.state.write().await;
        if let Some(error) = &state.fail_with {
            return Err(error.clone());
        }
        let hash = tx_hash(state.log.len(), method, params);
        state.log.push(Invocation {
            tx_hash: hash.clone(),
            method: method.to_string(),
            params: params.to_vec(),
        });
        Ok(hash)
    }

    /// Returns the committed invocations, narrowed to those whose first
    /// param equals `params[0]` when a key is given.
    async fn query(&self, _method: &str, params: &[String]) -> Result<Value, LedgerError> {
        let mut state = self.state.write().await;
        state.queries += 1;
        if let Some(error) = &state.fail_with {
            return Err(error.clone());
        }
        let matching: Vec<&Invocation> = state
            .log
            .iter()
            .filter(|inv| params.first().is_none_or(|key| inv.params.first() == Some(key)))
            .collect();
        serde_json::to_value(matching).map_err(|e| LedgerError::Rejected(e.to_string()))
    }
}

/// A message accepted by [`InMemoryQueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct Enqueued {
    pub submission_id: SubmissionId,
    pub message: QueueMessage,
}

struct QueueState {
    groups: HashMap<CallerId, VecDeque<Enqueued>>,
    accepted: HashMap<DeduplicationKey, (SubmissionId, DateTime<Utc>)>,
    window: Duration,
    sends: usize,
    reject_with: Option<TransportError>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
            accepted: HashMap::new(),
            window: DEDUP_WINDOW,
            sends: 0,
            reject_with: None,
        }
    }
}

impl QueueState {
    fn expire(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.accepted
            .retain(|_, (_, accepted_at)| now - *accepted_at < window);
    }
}

/// A FIFO queue with per-group ordering and a deduplication window.
///
/// Groups are independent: `receive` only ever pops from the named group.
#[derive(Default, Clone)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue whose deduplication window is `window` instead of
    /// [`DEDUP_WINDOW`].
    pub fn with_window(window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                window,
                ..Default::default()
            })),
        }
    }

    /// A queue that rejects every message with `error`.
    pub fn rejecting(error: TransportError) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                reject_with: Some(error),
                ..Default::default()
            })),
        }
    }

    /// Pops the oldest message of `group`.
    pub async fn receive(&self, group: &CallerId) -> Option<Enqueued> {
        self.state
            .lock()
            .await
            .groups
            .get_mut(group)
            .and_then(VecDeque::pop_front)
    }

    /// Total messages waiting across all groups.
    pub async fn len(&self) -> usize {
        self.state.lock().await.groups.values().map(VecDeque::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Dedup keys still inside the window.
    pub async fn tracked_keys(&self) -> usize {
        self.state.lock().await.accepted.len()
    }

    /// Number of `send` calls, accepted or not.
    pub async fn send_count(&self) -> usize {
        self.state.lock().await.sends
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueue {
    async fn send(&self, message: QueueMessage) -> Result<SubmissionId, TransportError> {
        let mut state = self.state.lock().await;
        state.sends += 1;
        if let Some(error) = &state.reject_with {
            return Err(error.clone());
        }

        let now = Utc::now();
        state.expire(now);
        if let Some((existing, _)) = state.accepted.get(&message.dedup_key) {
            return Ok(existing.clone());
        }

        let submission_id = SubmissionId::new(Uuid::new_v4().to_string());
        state
            .accepted
            .insert(message.dedup_key.clone(), (submission_id.clone(), now));
        state
            .groups
            .entry(message.ordering_group.clone())
            .or_default()
            .push_back(Enqueued {
                submission_id: submission_id.clone(),
                message,
            });
        Ok(submission_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub caller: CallerId,
    pub method: ChainMethod,
    pub params: Vec<String>,
}

#[derive(Default)]
struct NotifierState {
    sent: Vec<Notification>,
    fail: bool,
}

/// Records every notification it is asked to deliver.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    state: Arc<RwLock<NotifierState>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records each notification, then reports a delivery failure.
    pub fn failing() -> Self {
        Self {
            state: Arc::new(RwLock::new(NotifierState {
                sent: Vec::new(),
                fail: true,
            })),
        }
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.sent.clone()
    }

    async fn record(
        &self,
        kind: NotificationKind,
        caller: &CallerId,
        method: ChainMethod,
        params: &[String],
    ) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        state.sent.push(Notification {
            kind,
            caller: caller.clone(),
            method,
            params: params.to_vec(),
        });
        if state.fail {
            return Err(NotifyError("subscriber channel closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn notify_success(
        &self,
        caller: &CallerId,
        method: ChainMethod,
        params: &[String],
    ) -> Result<(), NotifyError> {
        self.record(NotificationKind::Success, caller, method, params)
            .await
    }

    async fn notify_error(
        &self,
        caller: &CallerId,
        method: ChainMethod,
        params: &[String],
    ) -> Result<(), NotifyError> {
        self.record(NotificationKind::Error, caller, method, params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::NormalizedParams;

    fn message(group: &str, params: &[&str]) -> QueueMessage {
        let params =
            NormalizedParams::from(params.iter().map(|p| p.to_string()).collect::<Vec<_>>());
        let key = DeduplicationKey::from_params(&params);
        QueueMessage::new(ChainMethod::CreateCar, &params, key, CallerId::new(group)).unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_ledger_invoke_and_query() {
        let ledger = InMemoryLedger::new();
        let h1 = ledger
            .invoke("createCar", &["car1".to_string(), "Toyota".to_string()])
            .await
            .unwrap();
        let h2 = ledger
            .invoke("createCar", &["car2".to_string(), "Honda".to_string()])
            .await
            .unwrap();
        assert_ne!(h1, h2);

        let all = ledger.query("queryAllCars", &[]).await.unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);

        let one = ledger.query("queryCar", &["car2".to_string()]).await.unwrap();
        assert_eq!(one[0]["params"][1], "Honda");
        assert_eq!(ledger.query_count().await, 2);
    }

    #[tokio::test]
    async fn test_failing_ledger() {
        let ledger = InMemoryLedger::failing(LedgerError::Unavailable("peer down".into()));
        assert!(ledger.invoke("createCar", &[]).await.is_err());
        assert!(ledger.invocations().await.is_empty());
    }

    #[tokio::test]
    async fn test_queue_fifo_within_group() {
        let queue = InMemoryQueue::new();
        let first = queue.send(message("alice", &["1"])).await.unwrap();
        queue.send(message("bob", &["2"])).await.unwrap();
        let second = queue.send(message("alice", &["3"])).await.unwrap();

        let alice = CallerId::new("alice");
        assert_eq!(queue.receive(&alice).await.unwrap().submission_id, first);
        assert_eq!(queue.receive(&alice).await.unwrap().submission_id, second);
        assert!(queue.receive(&alice).await.is_none());
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_queue_deduplicates_across_groups() {
        let queue = InMemoryQueue::new();
        let first = queue.send(message("alice", &["car1"])).await.unwrap();
        let again = queue.send(message("bob", &["car1"])).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(queue.len().await, 1);
        assert_eq!(queue.send_count().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_accepted_again_after_window() {
        let queue = InMemoryQueue::with_window(Duration::zero());
        let first = queue.send(message("alice", &["car1"])).await.unwrap();
        let again = queue.send(message("alice", &["car1"])).await.unwrap();

        assert_ne!(first, again);
        assert_eq!(queue.len().await, 2);
        assert_eq!(queue.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn test_rejecting_queue() {
        let queue = InMemoryQueue::rejecting(TransportError::QuotaExceeded("throttled".into()));
        assert!(queue.send(message("alice", &["1"])).await.is_err());
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::failing();
        let result = notifier
            .notify_error(&CallerId::new("alice"), ChainMethod::CreateCar, &[])
            .await;
        assert!(result.is_err());
        let sent = notifier.notifications().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::Error);
    }
}

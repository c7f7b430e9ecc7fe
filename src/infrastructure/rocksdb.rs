use crate::domain::outcome::SubmissionId;
use crate::domain::ports::QueueTransport;
use crate::domain::queue::QueueMessage;
use crate::domain::request::CallerId;
use crate::error::{Result, TransportError};
use crate::infrastructure::in_memory::{DEDUP_WINDOW, Enqueued};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for queued messages, keyed by `group \0 seq`.
pub const CF_MESSAGES: &str = "messages";
/// Column Family for accepted deduplication keys.
pub const CF_DEDUP: &str = "dedup";
/// Column Family indexing dedup keys by acceptance time, keyed by
/// `millis \0 dedup_key`, so expired keys can be swept in order.
pub const CF_DEDUP_EXPIRY: &str = "dedup_expiry";
/// Column Family for the next sequence number of each ordering group.
pub const CF_SEQUENCES: &str = "sequences";

#[derive(Serialize, Deserialize)]
struct StoredMessage {
    submission_id: SubmissionId,
    message: QueueMessage,
}

#[derive(Serialize, Deserialize)]
struct DedupEntry {
    submission_id: SubmissionId,
    accepted_at: DateTime<Utc>,
}

/// A durable queue transport backed by RocksDB.
///
/// Same semantics as the in-memory queue: FIFO within an ordering group and
/// a deduplication window keyed by the message's dedup key. Accepted
/// messages and dedup keys survive restarts. Keys that fall out of the
/// window are swept on the next `send`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBQueue {
    db: Arc<DB>,
    window: Duration,
    // Serializes sequence allocation and dedup check-then-insert.
    write_lock: Arc<Mutex<()>>,
}

fn storage_err(e: impl std::fmt::Display) -> TransportError {
    TransportError::Storage(e.to_string())
}

// Length-prefixed so no group's prefix is a prefix of another group's keys.
fn group_prefix(group: &CallerId) -> Vec<u8> {
    let name = group.as_str().as_bytes();
    let mut prefix = Vec::with_capacity(4 + name.len());
    prefix.extend_from_slice(&(name.len() as u32).to_be_bytes());
    prefix.extend_from_slice(name);
    prefix
}

fn expiry_key(accepted_at: DateTime<Utc>, dedup_key: &[u8]) -> Vec<u8> {
    let millis = accepted_at.timestamp_millis().max(0) as u64;
    let mut key = Vec::with_capacity(9 + dedup_key.len());
    key.extend_from_slice(&millis.to_be_bytes());
    key.push(0);
    key.extend_from_slice(dedup_key);
    key
}

impl RocksDBQueue {
    /// Opens or creates a RocksDB queue at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the queue will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_window(path, DEDUP_WINDOW)
    }

    /// Like [`RocksDBQueue::open`], with a deduplication window other than
    /// [`DEDUP_WINDOW`].
    pub fn open_with_window<P: AsRef<Path>>(path: P, window: Duration) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_MESSAGES, CF_DEDUP, CF_DEDUP_EXPIRY, CF_SEQUENCES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            window,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> std::result::Result<&ColumnFamily, TransportError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| TransportError::Storage(format!("{} column family not found", name)))
    }

    fn next_sequence(&self, group: &CallerId) -> std::result::Result<u64, TransportError> {
        let cf = self.cf(CF_SEQUENCES)?;
        let current = self
            .db
            .get_cf(&cf, group.as_str().as_bytes())
            .map_err(storage_err)?;
        Ok(match current {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(storage_err)?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        })
    }

    fn read_dedup(
        &self,
        dedup_key: &[u8],
    ) -> std::result::Result<Option<DedupEntry>, TransportError> {
        let cf = self.cf(CF_DEDUP)?;
        match self.db.get_cf(&cf, dedup_key).map_err(storage_err)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(storage_err)?)),
            None => Ok(None),
        }
    }

    /// Deletes dedup keys accepted longer than the window ago, oldest first.
    /// Must be called with `write_lock` held.
    fn sweep_expired(&self, now: DateTime<Utc>) -> std::result::Result<(), TransportError> {
        let expiry_cf = self.cf(CF_DEDUP_EXPIRY)?;
        let dedup_cf = self.cf(CF_DEDUP)?;
        let cutoff = (now - self.window).timestamp_millis();
        let mut batch = WriteBatch::default();

        for item in self.db.iterator_cf(&expiry_cf, IteratorMode::Start) {
            let (key, _) = item.map_err(storage_err)?;
            if key.len() < 9 {
                batch.delete_cf(&expiry_cf, &key);
                continue;
            }
            let raw: [u8; 8] = key[..8].try_into().map_err(storage_err)?;
            if (u64::from_be_bytes(raw) as i64) > cutoff {
                break;
            }

            let dedup_key = &key[9..];
            match self.read_dedup(dedup_key)? {
                Some(entry) if now - entry.accepted_at < self.window => break,
                Some(_) => batch.delete_cf(&dedup_cf, dedup_key),
                None => {}
            }
            batch.delete_cf(&expiry_cf, &key);
        }

        if !batch.is_empty() {
            self.db.write(batch).map_err(storage_err)?;
        }
        Ok(())
    }

    /// Number of dedup keys currently stored.
    pub fn tracked_keys(&self) -> std::result::Result<usize, TransportError> {
        let cf = self.cf(CF_DEDUP)?;
        let mut count = 0;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item.map_err(storage_err)?;
            count += 1;
        }
        Ok(count)
    }

    /// Pops the oldest message of `group`.
    pub async fn receive(
        &self,
        group: &CallerId,
    ) -> std::result::Result<Option<Enqueued>, TransportError> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_MESSAGES)?;
        let prefix = group_prefix(group);

        let mut iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));
        let Some(item) = iter.next() else {
            return Ok(None);
        };
        let (key, value) = item.map_err(storage_err)?;
        if !key.starts_with(&prefix) {
            return Ok(None);
        }

        let stored: StoredMessage = serde_json::from_slice(&value).map_err(storage_err)?;
        self.db.delete_cf(&cf, &key).map_err(storage_err)?;
        Ok(Some(Enqueued {
            submission_id: stored.submission_id,
            message: stored.message,
        }))
    }

    /// Number of messages waiting in `group`.
    pub async fn pending(&self, group: &CallerId) -> std::result::Result<usize, TransportError> {
        let cf = self.cf(CF_MESSAGES)?;
        let prefix = group_prefix(group);
        let mut count = 0;
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, _) = item.map_err(storage_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl QueueTransport for RocksDBQueue {
    async fn send(
        &self,
        message: QueueMessage,
    ) -> std::result::Result<SubmissionId, TransportError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        self.sweep_expired(now)?;

        let dedup_key = message.dedup_key.as_str().as_bytes().to_vec();
        let mut batch = WriteBatch::default();
        if let Some(entry) = self.read_dedup(&dedup_key)? {
            if now - entry.accepted_at < self.window {
                return Ok(entry.submission_id);
            }
            batch.delete_cf(
                &self.cf(CF_DEDUP_EXPIRY)?,
                expiry_key(entry.accepted_at, &dedup_key),
            );
        }

        let group = message.ordering_group.clone();
        let seq = self.next_sequence(&group)?;
        let submission_id = SubmissionId::new(Uuid::new_v4().to_string());

        let mut key = group_prefix(&group);
        key.extend_from_slice(&seq.to_be_bytes());

        let entry = serde_json::to_vec(&DedupEntry {
            submission_id: submission_id.clone(),
            accepted_at: now,
        })
        .map_err(storage_err)?;
        let stored = serde_json::to_vec(&StoredMessage {
            submission_id: submission_id.clone(),
            message,
        })
        .map_err(storage_err)?;

        batch.put_cf(&self.cf(CF_MESSAGES)?, key, stored);
        batch.put_cf(&self.cf(CF_DEDUP)?, &dedup_key, entry);
        batch.put_cf(&self.cf(CF_DEDUP_EXPIRY)?, expiry_key(now, &dedup_key), b"");
        batch.put_cf(
            &self.cf(CF_SEQUENCES)?,
            group.as_str().as_bytes(),
            (seq + 1).to_be_bytes(),
        );
        self.db.write(batch).map_err(storage_err)?;

        Ok(submission_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::method::ChainMethod;
    use crate::domain::params::{DeduplicationKey, NormalizedParams};
    use tempfile::tempdir;

    fn message(group: &str, params: &[&str]) -> QueueMessage {
        let params =
            NormalizedParams::from(params.iter().map(|p| p.to_string()).collect::<Vec<_>>());
        let key = DeduplicationKey::from_params(&params);
        QueueMessage::new(ChainMethod::CreateCar, &params, key, CallerId::new(group)).unwrap()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let queue = RocksDBQueue::open(dir.path()).expect("Failed to open RocksDB");

        assert!(queue.db.cf_handle(CF_MESSAGES).is_some());
        assert!(queue.db.cf_handle(CF_DEDUP).is_some());
        assert!(queue.db.cf_handle(CF_DEDUP_EXPIRY).is_some());
        assert!(queue.db.cf_handle(CF_SEQUENCES).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_fifo_per_group() {
        let dir = tempdir().unwrap();
        let queue = RocksDBQueue::open(dir.path()).unwrap();
        let alice = CallerId::new("alice");

        let first = queue.send(message("alice", &["1"])).await.unwrap();
        queue.send(message("alice2", &["2"])).await.unwrap();
        let second = queue.send(message("alice", &["3"])).await.unwrap();

        assert_eq!(queue.pending(&alice).await.unwrap(), 2);
        assert_eq!(queue.receive(&alice).await.unwrap().unwrap().submission_id, first);
        assert_eq!(queue.receive(&alice).await.unwrap().unwrap().submission_id, second);
        assert!(queue.receive(&alice).await.unwrap().is_none());
        assert_eq!(queue.pending(&CallerId::new("alice2")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_dedup_survives_reopen() {
        let dir = tempdir().unwrap();
        let first = {
            let queue = RocksDBQueue::open(dir.path()).unwrap();
            queue.send(message("alice", &["car1"])).await.unwrap()
        };

        let queue = RocksDBQueue::open(dir.path()).unwrap();
        let again = queue.send(message("bob", &["car1"])).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(queue.pending(&CallerId::new("alice")).await.unwrap(), 1);
        assert_eq!(queue.pending(&CallerId::new("bob")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rocksdb_duplicate_accepted_again_after_window() {
        let dir = tempdir().unwrap();
        let queue = RocksDBQueue::open_with_window(dir.path(), Duration::zero()).unwrap();
        let alice = CallerId::new("alice");

        let first = queue.send(message("alice", &["car1"])).await.unwrap();
        let again = queue.send(message("alice", &["car1"])).await.unwrap();

        assert_ne!(first, again);
        assert_eq!(queue.pending(&alice).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rocksdb_sweeps_expired_dedup_keys() {
        let dir = tempdir().unwrap();
        let queue = RocksDBQueue::open_with_window(dir.path(), Duration::zero()).unwrap();

        for key in ["car1", "car2", "car3"] {
            queue.send(message("alice", &[key])).await.unwrap();
        }

        // Only the key accepted by the last send is left.
        assert_eq!(queue.tracked_keys().unwrap(), 1);
        let expiry_cf = queue.cf(CF_DEDUP_EXPIRY).unwrap();
        assert_eq!(queue.db.iterator_cf(&expiry_cf, IteratorMode::Start).count(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_keeps_keys_inside_window() {
        let dir = tempdir().unwrap();
        let queue = RocksDBQueue::open(dir.path()).unwrap();

        for key in ["car1", "car2", "car3"] {
            queue.send(message("alice", &[key])).await.unwrap();
        }

        assert_eq!(queue.tracked_keys().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rocksdb_groups_sharing_a_prefix_are_isolated() {
        let dir = tempdir().unwrap();
        let queue = RocksDBQueue::open(dir.path()).unwrap();
        let a = CallerId::new("a");

        let own = queue.send(message("a", &["1"])).await.unwrap();
        queue.send(message("a\0b", &["2"])).await.unwrap();
        queue.send(message("ab", &["3"])).await.unwrap();

        assert_eq!(queue.pending(&a).await.unwrap(), 1);
        assert_eq!(queue.receive(&a).await.unwrap().unwrap().submission_id, own);
        assert!(queue.receive(&a).await.unwrap().is_none());
        assert_eq!(queue.pending(&CallerId::new("a\0b")).await.unwrap(), 1);
    }
}

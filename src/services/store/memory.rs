//! In-memory record store for development mode and tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{RecordStore, StoreError};
use crate::models::{RecordKey, UploadRecord};

#[derive(Default)]
struct State {
    /// Records by owner uid, ordered by key.
    records: HashMap<String, BTreeMap<RecordKey, UploadRecord>>,
    /// File names whose writes fail.
    failing: HashSet<String>,
}

/// Records kept in process memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    state: Mutex<State>,
    next_key: AtomicU64,
    appends: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write of a file with this name fail.
    pub fn fail_file(&self, file_name: &str) {
        self.lock().failing.insert(file_name.to_string());
    }

    /// Delay every write by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|p| p.into_inner()) = Some(latency);
    }

    /// Records stored for an owner, in key order.
    pub fn records(&self, owner_uid: &str) -> Vec<(RecordKey, UploadRecord)> {
        self.lock()
            .records
            .get(owner_uid)
            .map(|records| records.iter().map(|(k, r)| (k.clone(), r.clone())).collect())
            .unwrap_or_default()
    }

    /// Records stored across all owners.
    pub fn total_records(&self) -> usize {
        self.lock().records.values().map(BTreeMap::len).sum()
    }

    /// Number of append calls received, including failed ones.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn append(
        &self,
        owner_uid: &str,
        id_token: &SecretString,
        record: &UploadRecord,
    ) -> Result<RecordKey, StoreError> {
        self.appends.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        // Same ownership rule the hosted database enforces.
        if id_token.expose_secret().is_empty() || record.user_id != owner_uid {
            return Err(StoreError::PermissionDenied);
        }

        let mut state = self.lock();
        if state.failing.contains(&record.file_name) {
            return Err(StoreError::Network("connection reset".to_string()));
        }

        let seq = self.next_key.fetch_add(1, Ordering::SeqCst);
        let key = RecordKey(format!("-mem{:016x}", seq));
        state
            .records
            .entry(owner_uid.to_string())
            .or_default()
            .insert(key.clone(), record.clone());
        Ok(key)
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}

//! Return record store
//!
//! Owns every in-progress `ReturnProcess` and serializes mutations per
//! record: each record carries its own async gate, and a mutation that
//! finds the gate held fails fast with `RecordBusy` instead of racing.
//! Snapshot reads never wait on an in-flight mutation (the record data
//! sits behind a separate RwLock that is only held briefly).
//!
//! Records are never deleted; cancelled returns keep their captured data
//! for audit.

use crate::models::{Product, ReturnProcess, ReturnReason};
use revo_common::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockWriteGuard};
use uuid::Uuid;

/// Handle to one stored record: data plus its mutation gate
#[derive(Debug, Clone)]
pub struct RecordSlot {
    data: Arc<RwLock<ReturnProcess>>,
    gate: Arc<Mutex<()>>,
}

impl RecordSlot {
    fn new(record: ReturnProcess) -> Self {
        Self {
            data: Arc::new(RwLock::new(record)),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Acquire the mutation gate, failing fast if another mutation is in
    /// flight for this record.
    pub fn try_acquire(&self, id: Uuid) -> Result<OwnedMutexGuard<()>> {
        self.gate.clone().try_lock_owned().map_err(|_| {
            Error::RecordBusy(format!("Another operation is in flight for return {}", id))
        })
    }

    /// Acquire the mutation gate, waiting for the current holder.
    ///
    /// Used only by cancellation, which must succeed once the in-flight
    /// submission has been signalled to stop.
    pub async fn acquire(&self) -> OwnedMutexGuard<()> {
        self.gate.clone().lock_owned().await
    }

    /// Clone of the current record state.
    pub async fn snapshot(&self) -> ReturnProcess {
        self.data.read().await.clone()
    }

    /// Write access to the record data. Callers must hold the gate for
    /// anything beyond a single atomic update.
    pub async fn write(&self) -> RwLockWriteGuard<'_, ReturnProcess> {
        self.data.write().await
    }
}

/// In-process store of all return records
#[derive(Debug, Default)]
pub struct ReturnStore {
    records: RwLock<HashMap<Uuid, RecordSlot>>,
}

impl ReturnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for a resolved product (state INITIATED).
    pub async fn create(&self, product: Product) -> ReturnProcess {
        let record = ReturnProcess::new(product);
        let snapshot = record.clone();
        self.records
            .write()
            .await
            .insert(record.id, RecordSlot::new(record));
        snapshot
    }

    /// Look up a record slot by id.
    pub async fn slot(&self, id: Uuid) -> Result<RecordSlot> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Return not found: {}", id)))
    }

    /// Current snapshot of a record.
    pub async fn get(&self, id: Uuid) -> Result<ReturnProcess> {
        Ok(self.slot(id).await?.snapshot().await)
    }

    /// Attach the selected reason and initialize the evidence checklist,
    /// one pending item per photo step of the reason.
    pub async fn attach_reason(
        &self,
        id: Uuid,
        reason: &ReturnReason,
        tracking_ref: String,
    ) -> Result<ReturnProcess> {
        let slot = self.slot(id).await?;
        let _busy = slot.try_acquire(id)?;
        let mut record = slot.write().await;
        record.attach_reason(reason, tracking_ref)?;
        Ok(record.clone())
    }

    /// Number of records held (all lifecycles, audit included).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

//! Debounced batching of update records.
//!
//! [`Updates`] collects records pushed by the translator and its collaborators.
//! Every push restarts a quiescence timer; once no push has arrived for the
//! configured delay, the pending records are cut off as one [`UpdateBatch`],
//! stamped with the next revision of the document, and handed to the consumer.
//!
//! The flush runs on a background tokio task. Pushes never wait for it: a push
//! that arrives while a batch is being delivered lands in the next batch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{
    sync::{Notify, mpsc},
    time::{Instant, sleep_until},
};
use tracing::{Instrument, debug, error, info_span, trace};

use crate::{
    Result,
    constants::DEFAULT_FLUSH_DELAY_MILLIS,
    document::DocumentId,
    event::{UpdateBatch, UpdateHeader, UpdateRecord},
};

mod errors;

pub use errors::UpdatesError;


/// Receives every flushed batch.
///
/// Called on the flush task, once per batch, in revision order. The engine has
/// already committed the revision before the call, so an error only affects
/// the batch at hand: it is logged and not retried.
pub trait UpdatesConsumer: Send + Sync {
    fn on_update_batch(&self, batch: UpdateBatch) -> Result<()>;
}

impl UpdatesConsumer for mpsc::UnboundedSender<UpdateBatch> {
    fn on_update_batch(&self, batch: UpdateBatch) -> Result<()> {
        self.send(batch).map_err(|e| {
            UpdatesError::ConsumerClosed {
                revision: e.0.revision,
            }
            .into()
        })
    }
}

/// Adapts a closure into an [`UpdatesConsumer`].
pub struct FnConsumer<F>(pub F);

impl<F> FnConsumer<F>
where
    F: Fn(UpdateBatch) -> Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> UpdatesConsumer for FnConsumer<F>
where
    F: Fn(UpdateBatch) -> Result<()> + Send + Sync,
{
    fn on_update_batch(&self, batch: UpdateBatch) -> Result<()> {
        (self.0)(batch)
    }
}

/// Tunables of the batching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatesConfig {
    /// Quiescence delay in milliseconds.
    pub delay_millis: u64,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            delay_millis: DEFAULT_FLUSH_DELAY_MILLIS,
        }
    }
}

impl UpdatesConfig {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay_millis: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }
}

/// Position of a pushed record inside the batch currently accumulating.
///
/// Valid until that batch is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingSlot {
    revision: u64,
    index: usize,
}

impl PendingSlot {
    /// Revision the batch holding this slot will be stamped with.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug)]
struct PendingState {
    /// Revision of the last flushed batch.
    revision: u64,
    records: Vec<UpdateRecord>,
    /// Set while records are pending: last push plus the delay.
    deadline: Option<Instant>,
    closed: bool,
}

struct Shared {
    document_id: DocumentId,
    delay: Duration,
    state: Mutex<PendingState>,
    wake: Notify,
    consumer: Arc<dyn UpdatesConsumer>,
}

enum Wait {
    Idle,
    Until(Instant),
    Closed,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_wait(&self) -> Wait {
        let state = self.lock_state();
        match state.deadline {
            Some(deadline) => Wait::Until(deadline),
            None if state.closed => Wait::Closed,
            None => Wait::Idle,
        }
    }

    /// Cut the pending records into a batch if the quiescence delay has elapsed.
    fn cut_if_due(&self) -> Option<UpdateBatch> {
        let mut state = self.lock_state();
        let deadline = state.deadline?;
        if Instant::now() < deadline {
            return None;
        }
        state.deadline = None;
        if state.records.is_empty() {
            return None;
        }
        state.revision += 1;
        Some(UpdateBatch {
            document_id: self.document_id.clone(),
            revision: state.revision,
            records: std::mem::take(&mut state.records),
        })
    }

    fn deliver(&self, batch: UpdateBatch) {
        let revision = batch.revision;
        debug!(revision, records = batch.len(), "Flushing update batch");
        if let Err(e) = self.consumer.on_update_batch(batch) {
            error!(revision, "Update batch consumer failed: {e}");
        }
    }

    async fn run(self: Arc<Self>) {
        let span = info_span!("update_flush", document = %self.document_id);
        async move {
            debug!(delay_ms = self.delay.as_millis() as u64, "Update flush task started");
            loop {
                match self.next_wait() {
                    Wait::Closed => break,
                    Wait::Idle => self.wake.notified().await,
                    Wait::Until(deadline) => {
                        tokio::select! {
                            _ = sleep_until(deadline) => {
                                if let Some(batch) = self.cut_if_due() {
                                    self.deliver(batch);
                                }
                            }
                            // A push moved the deadline; re-read it.
                            _ = self.wake.notified() => {}
                        }
                    }
                }
            }
            debug!("Update flush task stopped");
        }
        .instrument(span)
        .await
    }
}

/// Debounce-and-flush engine for one document session.
///
/// Owns the pending buffer and the revision counter of its document. Revisions
/// start at the header's revision and grow by exactly one per flushed batch.
///
/// Dropping the engine delivers whatever is still pending as a final batch and
/// stops the flush task.
pub struct Updates {
    shared: Arc<Shared>,
}

impl Updates {
    /// Start an engine and its flush task.
    ///
    /// The task is spawned on the current tokio runtime when there is one,
    /// otherwise on a dedicated thread running its own runtime.
    pub fn new(
        consumer: Arc<dyn UpdatesConsumer>,
        config: UpdatesConfig,
        header: UpdateHeader,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            document_id: header.document_id,
            delay: config.delay(),
            state: Mutex::new(PendingState {
                revision: header.revision,
                records: Vec::new(),
                deadline: None,
                closed: false,
            }),
            wake: Notify::new(),
            consumer,
        });

        let task = Arc::clone(&shared).run();
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(task);
        } else {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .map_err(|e| UpdatesError::RuntimeCreation(e.to_string()))?;
            std::thread::Builder::new()
                .name(format!("update-flush-{}", shared.document_id))
                .spawn(move || runtime.block_on(task))
                .map_err(|e| UpdatesError::WorkerSpawn(e.to_string()))?;
        }

        Ok(Self { shared })
    }

    /// Append a record to the pending batch and restart the quiescence timer.
    pub fn push(&self, record: impl Into<UpdateRecord>) -> PendingSlot {
        let record = record.into();
        let slot = {
            let mut state = self.shared.lock_state();
            trace!(kind = record.kind(), node = %record.node_id(), "Pushing update record");
            state.records.push(record);
            state.deadline = Some(Instant::now() + self.shared.delay);
            PendingSlot {
                revision: state.revision + 1,
                index: state.records.len() - 1,
            }
        };
        self.shared.wake.notify_one();
        slot
    }

    /// Overwrite the record at `slot` and restart the quiescence timer.
    ///
    /// The record keeps the position of the one it replaces. If the batch that
    /// held `slot` has already been flushed, nothing changes and the record is
    /// handed back to the caller.
    pub fn replace(&self, slot: PendingSlot, record: impl Into<UpdateRecord>) -> Option<UpdateRecord> {
        let record = record.into();
        {
            let mut state = self.shared.lock_state();
            if slot.revision != state.revision + 1 {
                return Some(record);
            }
            let Some(existing) = state.records.get_mut(slot.index) else {
                return Some(record);
            };
            trace!(kind = record.kind(), node = %record.node_id(), "Replacing pending update record");
            *existing = record;
            state.deadline = Some(Instant::now() + self.shared.delay);
        }
        self.shared.wake.notify_one();
        None
    }

    /// Revision of the last flushed batch.
    pub fn revision(&self) -> u64 {
        self.shared.lock_state().revision
    }

    /// Number of records waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.shared.lock_state().records.len()
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.shared.document_id
    }

    pub fn delay(&self) -> Duration {
        self.shared.delay
    }
}

impl Drop for Updates {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock_state();
            state.closed = true;
            if !state.records.is_empty() {
                state.deadline = Some(Instant::now());
            }
        }
        self.shared.wake.notify_one();
    }
}

impl std::fmt::Debug for Updates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock_state();
        f.debug_struct("Updates")
            .field("document_id", &self.shared.document_id)
            .field("delay", &self.shared.delay)
            .field("revision", &state.revision)
            .field("pending", &state.records.len())
            .finish()
    }
}

//! Error types for the update batching engine.

use thiserror::Error;

/// Errors raised by [`Updates`](super::Updates) and its consumers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UpdatesError {
    /// The fallback runtime for the flush task could not be built.
    #[error("Failed to create flush runtime: {0}")]
    RuntimeCreation(String),

    /// The thread hosting the flush task could not be started.
    #[error("Failed to spawn flush thread: {0}")]
    WorkerSpawn(String),

    /// The receiving side of a channel consumer is gone.
    #[error("Update consumer closed, batch revision {revision} dropped")]
    ConsumerClosed { revision: u64 },
}

impl UpdatesError {
    /// Check if this error happened while starting the engine.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            UpdatesError::RuntimeCreation(_) | UpdatesError::WorkerSpawn(_)
        )
    }

    /// Check if this error came from a consumer that stopped listening.
    pub fn is_consumer_closed(&self) -> bool {
        matches!(self, UpdatesError::ConsumerClosed { .. })
    }
}

impl From<UpdatesError> for crate::Error {
    fn from(err: UpdatesError) -> Self {
        crate::Error::Updates(err)
    }
}

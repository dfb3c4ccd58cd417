//!
//! collab-updates: change batching for collaborative tree documents.
//!
//! A collaborative client observes fine-grained structural edits to its
//! document (node insertions, pasted branches, whole-document loads) and must
//! publish them to peers as coarse, versioned update batches. This crate is
//! that batching engine.
//!
//! ## Core Concepts
//!
//! * **Document view (`document::DocumentView`)**: read-only access to the live tree
//!   (children, extension flags, content). `document::MemoryDocument` is an
//!   in-memory implementation.
//! * **Update records (`event::UpdateRecord`)**: immutable descriptions of one change,
//!   compared by value.
//! * **Updates (`updates::Updates`)**: the debounce-and-flush engine. Records pushed
//!   into it are delivered as one `event::UpdateBatch` once no push has arrived
//!   for the quiescence delay, each batch carrying the next revision of the document.
//! * **ChildrenUpdateGenerator (`generator::ChildrenUpdateGenerator`)**: translates
//!   insertions and document resets into records, expanding inserted subtrees
//!   top-down and classifying special nodes on the way.

pub mod constants;
pub mod document;
pub mod event;
pub mod generator;
pub mod updates;

pub use document::{DocumentId, DocumentView, MemoryDocument, NodeFlags, NodeId};
pub use event::{UpdateBatch, UpdateHeader, UpdateRecord};
pub use generator::ChildrenUpdateGenerator;
pub use updates::{Updates, UpdatesConfig, UpdatesConsumer};

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured errors from the document module
    #[error(transparent)]
    Document(document::DocumentError),

    /// Structured errors from the updates module
    #[error(transparent)]
    Updates(updates::UpdatesError),

    /// A collaborator (record factory, content producer, consumer) failed
    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        collaborator: String,
        reason: String,
    },
}

impl Error {
    /// Build a collaborator error.
    pub fn collaborator(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Collaborator {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }

    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Document(_) => "document",
            Error::Updates(_) => "updates",
            Error::Collaborator { .. } => "collaborator",
        }
    }

    /// Check if this error indicates a node was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Document(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error was raised by a collaborator.
    pub fn is_collaborator_error(&self) -> bool {
        matches!(self, Error::Collaborator { .. })
    }
}

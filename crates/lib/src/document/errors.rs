//! Error types for document model access.

use thiserror::Error;

use super::NodeId;

/// Errors raised while reading or mutating a document tree.
///
/// Reading errors surface through [`DocumentView`](super::DocumentView) and abort
/// the translation step that triggered the read.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No node with the given ID exists in the document.
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },

    /// A node with the given ID already exists in the document.
    #[error("Node already exists: {node_id}")]
    NodeAlreadyExists { node_id: NodeId },

    /// The node already has a parent.
    #[error("Node '{node_id}' is already attached to '{parent_id}'")]
    AlreadyAttached { node_id: NodeId, parent_id: NodeId },

    /// The root node cannot become a child.
    #[error("Root node '{node_id}' cannot be attached to another node")]
    CannotAttachRoot { node_id: NodeId },

    /// The attachment would make a node its own ancestor.
    #[error("Attaching '{node_id}' under '{parent_id}' would create a cycle")]
    WouldCreateCycle { node_id: NodeId, parent_id: NodeId },

    /// Insertion index past the end of the child list.
    #[error("Index {index} out of bounds for '{parent_id}' with {len} children")]
    IndexOutOfBounds {
        parent_id: NodeId,
        index: usize,
        len: usize,
    },
}

impl DocumentError {
    /// Check if this error indicates a node was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::NodeNotFound { .. })
    }

    /// Check if this error was caused by an invalid tree mutation.
    pub fn is_structure_error(&self) -> bool {
        matches!(
            self,
            DocumentError::AlreadyAttached { .. }
                | DocumentError::CannotAttachRoot { .. }
                | DocumentError::WouldCreateCycle { .. }
                | DocumentError::IndexOutOfBounds { .. }
        )
    }
}

impl From<DocumentError> for crate::Error {
    fn from(err: DocumentError) -> Self {
        crate::Error::Document(err)
    }
}

//! Read-only view of the tree-shaped document being edited.
//!
//! The batching engine never mutates the document. It reads node children,
//! extension flags and content through [`DocumentView`] at the moment a change
//! notification is translated. [`MemoryDocument`] is an in-memory tree that
//! implements the view and is used by the replay tool and the tests.

use bitflags::bitflags;
use serde_json::Value;

use crate::Result;

mod errors;
mod id;
mod memory;

pub use errors::DocumentError;
pub use id::{DocumentId, NodeId};
pub use memory::MemoryDocument;

bitflags! {
    /// Extension flags carried by a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// The node summarizes the group of siblings that precedes it.
        const SUMMARY = 1;
        /// The node opens a group of siblings that a later summary node closes.
        const FIRST_GROUP = 1 << 1;
        /// The node is positioned freely rather than by layout.
        const FREE = 1 << 2;
    }
}

impl NodeFlags {
    /// Parses a flag by its lowercase name (`summary`, `first_group`, `free`).
    ///
    /// The generated `from_name` matches the constant names instead.
    pub fn parse_name(name: &str) -> Option<Self> {
        match name {
            "summary" => Some(NodeFlags::SUMMARY),
            "first_group" => Some(NodeFlags::FIRST_GROUP),
            "free" => Some(NodeFlags::FREE),
            _ => None,
        }
    }
}

/// Read access to a live document.
///
/// Every call is a momentary read: the document may change between two calls,
/// and callers walking the tree must re-read children at each visit instead of
/// assuming a snapshot.
pub trait DocumentView: Send + Sync {
    /// ID of the document.
    fn document_id(&self) -> &DocumentId;

    /// ID of the current root node.
    fn root(&self) -> NodeId;

    /// Ordered child IDs of `node`.
    fn children(&self, node: &NodeId) -> Result<Vec<NodeId>>;

    /// Extension flags currently set on `node`.
    fn flags(&self, node: &NodeId) -> Result<NodeFlags>;

    /// Content attached to `node`, if the model tracks any.
    fn content(&self, node: &NodeId) -> Result<Option<Value>> {
        let _ = node;
        Ok(None)
    }
}

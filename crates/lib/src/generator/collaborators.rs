//! Collaborators the translator delegates record construction to.
//!
//! Both collaborators may push records into the shared [`Updates`] engine as a
//! side effect of being called. The translator makes no assumption about
//! those pushes beyond the engine accepting them mid-traversal.

use std::sync::Arc;

use tracing::trace;

use crate::{
    Result,
    document::{DocumentView, NodeId},
    event::{ChildrenUpdated, ContentUpdated},
    updates::Updates,
};

/// Builds the structural record describing a parent's children.
pub trait StructureUpdateEventFactory: Send + Sync {
    fn create_children_updated_event(
        &self,
        document: &dyn DocumentView,
        node: &NodeId,
    ) -> Result<ChildrenUpdated>;
}

/// Produces content records for nodes and documents that appear.
///
/// Implementations push whatever they produce into [`Updates`] themselves; the
/// position of those records in a batch is the position at which they push.
pub trait ContentUpdateGenerators: Send + Sync {
    /// A node became part of the document.
    fn on_new_node(&self, document: &dyn DocumentView, node: &NodeId) -> Result<()>;

    /// A whole new document replaced the previous one.
    fn on_new_map(&self, document: &dyn DocumentView) -> Result<()>;
}

/// Describes a parent by the ordered IDs of its children, read at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildrenListFactory;

impl StructureUpdateEventFactory for ChildrenListFactory {
    fn create_children_updated_event(
        &self,
        document: &dyn DocumentView,
        node: &NodeId,
    ) -> Result<ChildrenUpdated> {
        Ok(ChildrenUpdated {
            node_id: node.clone(),
            child_ids: document.children(node)?,
        })
    }
}

/// Pushes a [`ContentUpdated`] record for every new node that has content.
#[derive(Debug)]
pub struct NodeContentUpdates {
    updates: Arc<Updates>,
}

impl NodeContentUpdates {
    pub fn new(updates: Arc<Updates>) -> Self {
        Self { updates }
    }
}

impl ContentUpdateGenerators for NodeContentUpdates {
    fn on_new_node(&self, document: &dyn DocumentView, node: &NodeId) -> Result<()> {
        if let Some(content) = document.content(node)? {
            self.updates.push(ContentUpdated {
                node_id: node.clone(),
                content,
            });
        }
        Ok(())
    }

    fn on_new_map(&self, document: &dyn DocumentView) -> Result<()> {
        trace!(document = %document.document_id(), "No document-level content to publish");
        Ok(())
    }
}

/// Content collaborator that produces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContentUpdates;

impl ContentUpdateGenerators for NoContentUpdates {
    fn on_new_node(&self, _document: &dyn DocumentView, _node: &NodeId) -> Result<()> {
        Ok(())
    }

    fn on_new_map(&self, _document: &dyn DocumentView) -> Result<()> {
        Ok(())
    }
}

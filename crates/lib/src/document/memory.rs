//! In-memory document tree.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use super::{DocumentError, DocumentId, DocumentView, NodeFlags, NodeId};
use crate::Result;

#[derive(Debug, Default)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    flags: NodeFlags,
    content: Option<Value>,
}

#[derive(Debug)]
struct Tree {
    root: NodeId,
    nodes: HashMap<NodeId, NodeEntry>,
}

impl Tree {
    fn node(&self, node_id: &NodeId) -> Result<&NodeEntry> {
        self.nodes.get(node_id).ok_or_else(|| {
            DocumentError::NodeNotFound {
                node_id: node_id.clone(),
            }
            .into()
        })
    }

    fn node_mut(&mut self, node_id: &NodeId) -> Result<&mut NodeEntry> {
        self.nodes.get_mut(node_id).ok_or_else(|| {
            DocumentError::NodeNotFound {
                node_id: node_id.clone(),
            }
            .into()
        })
    }

    /// True if `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|entry| entry.parent.as_ref());
        }
        false
    }
}

/// Thread-safe in-memory tree implementing [`DocumentView`].
///
/// Nodes can be created detached, given children of their own, and attached
/// later, which models pasting a whole branch in one step.
#[derive(Debug)]
pub struct MemoryDocument {
    document_id: DocumentId,
    tree: RwLock<Tree>,
}

impl MemoryDocument {
    /// Create a document holding only its root node.
    pub fn new(document_id: impl Into<DocumentId>, root: impl Into<NodeId>) -> Self {
        let root = root.into();
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), NodeEntry::default());
        Self {
            document_id: document_id.into(),
            tree: RwLock::new(Tree { root, nodes }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a detached node with no parent.
    pub fn create_node(&self, node_id: impl Into<NodeId>) -> Result<NodeId> {
        let node_id = node_id.into();
        let mut tree = self.write();
        if tree.nodes.contains_key(&node_id) {
            return Err(DocumentError::NodeAlreadyExists { node_id }.into());
        }
        tree.nodes.insert(node_id.clone(), NodeEntry::default());
        Ok(node_id)
    }

    /// Attach `child` as the last child of `parent`.
    pub fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        self.attach(parent, None, child)
    }

    /// Attach `child` under `parent` at position `index`.
    ///
    /// `child` must be detached. It keeps its own subtree.
    pub fn insert_child(&self, parent: &NodeId, index: usize, child: &NodeId) -> Result<()> {
        self.attach(parent, Some(index), child)
    }

    /// Attach under one write lock; `None` appends after the current last child.
    fn attach(&self, parent: &NodeId, index: Option<usize>, child: &NodeId) -> Result<()> {
        let mut tree = self.write();
        let len = tree.node(parent)?.children.len();
        let index = index.unwrap_or(len);
        let entry = tree.node(child)?;

        if let Some(parent_id) = &entry.parent {
            return Err(DocumentError::AlreadyAttached {
                node_id: child.clone(),
                parent_id: parent_id.clone(),
            }
            .into());
        }
        if *child == tree.root {
            return Err(DocumentError::CannotAttachRoot {
                node_id: child.clone(),
            }
            .into());
        }
        if tree.is_ancestor_or_self(child, parent) {
            return Err(DocumentError::WouldCreateCycle {
                node_id: child.clone(),
                parent_id: parent.clone(),
            }
            .into());
        }
        if index > len {
            return Err(DocumentError::IndexOutOfBounds {
                parent_id: parent.clone(),
                index,
                len,
            }
            .into());
        }

        tree.node_mut(parent)?.children.insert(index, child.clone());
        tree.node_mut(child)?.parent = Some(parent.clone());
        Ok(())
    }

    /// Create a new leaf and append it to `parent`.
    pub fn add_node(&self, parent: &NodeId, node_id: impl Into<NodeId>) -> Result<NodeId> {
        self.read().node(parent)?;
        let node_id = self.create_node(node_id)?;
        self.append_child(parent, &node_id)?;
        Ok(node_id)
    }

    /// Replace the flags of `node`.
    pub fn set_flags(&self, node: &NodeId, flags: NodeFlags) -> Result<()> {
        self.write().node_mut(node)?.flags = flags;
        Ok(())
    }

    /// Add `flags` to those already set on `node`.
    pub fn add_flags(&self, node: &NodeId, flags: NodeFlags) -> Result<()> {
        self.write().node_mut(node)?.flags.insert(flags);
        Ok(())
    }

    pub fn set_content(&self, node: &NodeId, content: Value) -> Result<()> {
        self.write().node_mut(node)?.content = Some(content);
        Ok(())
    }

    /// Parent of `node`, or `None` for the root and detached nodes.
    pub fn parent_of(&self, node: &NodeId) -> Result<Option<NodeId>> {
        Ok(self.read().node(node)?.parent.clone())
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.read().nodes.contains_key(node)
    }

    /// Number of nodes, attached or not.
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }
}

impl DocumentView for MemoryDocument {
    fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    fn root(&self) -> NodeId {
        self.read().root.clone()
    }

    fn children(&self, node: &NodeId) -> Result<Vec<NodeId>> {
        Ok(self.read().node(node)?.children.clone())
    }

    fn flags(&self, node: &NodeId) -> Result<NodeFlags> {
        Ok(self.read().node(node)?.flags)
    }

    fn content(&self, node: &NodeId) -> Result<Option<Value>> {
        Ok(self.read().node(node)?.content.clone())
    }
}

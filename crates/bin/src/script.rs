//! Edit scripts replayed against an in-memory document.
//!
//! A script names the document, its root, and a list of steps:
//!
//! ```json
//! {
//!   "document_id": "map-1",
//!   "root": "root",
//!   "steps": [
//!     { "op": "add_node", "parent": "root", "node": "a", "flags": ["summary"] },
//!     { "op": "pause", "millis": 250 },
//!     { "op": "add_subtree", "parent": "a",
//!       "subtree": { "id": "b", "children": [{ "id": "c" }] } }
//!   ]
//! }
//! ```

use std::path::Path;

use collab_updates::{MemoryDocument, NodeFlags, NodeId};
use serde::Deserialize;
use serde_json::Value;

pub type ScriptResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub document_id: String,
    pub root: NodeId,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> ScriptResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> ScriptResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script {}: {e}", path.display()))?;
        Self::from_json(&json)
    }
}

/// One edit, or a pause between edits.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Attach a new leaf under `parent`.
    AddNode {
        parent: NodeId,
        node: NodeId,
        #[serde(default)]
        flags: Vec<String>,
        #[serde(default)]
        content: Option<Value>,
    },
    /// Build a detached branch, then attach it under `parent` in one insertion.
    AddSubtree { parent: NodeId, subtree: Subtree },
    /// Replace a node's flags. Not announced on its own.
    Flags { node: NodeId, flags: Vec<String> },
    /// Replace a node's content. Not announced on its own.
    Content { node: NodeId, content: Value },
    /// Let the quiescence timer run.
    Pause { millis: u64 },
    /// Swap in a freshly loaded document.
    NewMap {
        root: NodeId,
        #[serde(default)]
        children: Vec<Subtree>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subtree {
    pub id: NodeId,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub children: Vec<Subtree>,
}

/// Parses flag names (`summary`, `first_group`, `free`).
pub fn parse_flags(names: &[String]) -> ScriptResult<NodeFlags> {
    names.iter().try_fold(NodeFlags::empty(), |flags, name| {
        NodeFlags::parse_name(name)
            .map(|flag| flags | flag)
            .ok_or_else(|| format!("Unknown node flag '{name}'").into())
    })
}

/// Sets flags and content on a node that already exists.
pub fn decorate(
    doc: &MemoryDocument,
    node: &NodeId,
    flags: &[String],
    content: Option<&Value>,
) -> ScriptResult<()> {
    if !flags.is_empty() {
        doc.set_flags(node, parse_flags(flags)?)?;
    }
    if let Some(content) = content {
        doc.set_content(node, content.clone())?;
    }
    Ok(())
}

/// Creates `subtree` detached from the tree and returns its top node.
pub fn build_detached(doc: &MemoryDocument, subtree: &Subtree) -> ScriptResult<NodeId> {
    let top = doc.create_node(subtree.id.clone())?;
    decorate(doc, &top, &subtree.flags, subtree.content.as_ref())?;
    attach_children(doc, &top, &subtree.children)?;
    Ok(top)
}

/// Creates `children` and their descendants under `parent`.
pub fn attach_children(
    doc: &MemoryDocument,
    parent: &NodeId,
    children: &[Subtree],
) -> ScriptResult<()> {
    for child in children {
        let node = doc.add_node(parent, child.id.clone())?;
        decorate(doc, &node, &child.flags, child.content.as_ref())?;
        attach_children(doc, &node, &child.children)?;
    }
    Ok(())
}

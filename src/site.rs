//! The content tree.
//!
//! A [`Site`] owns every [`Node`] of a build in registration order and keys
//! them by [`OutputPath`]. Discovery fills it; afterwards it is structurally
//! read-only. The process stage may still write node content and static
//! metadata through [`Site::nodes_mut`], one node per worker.
//!
//! Typed collections (documents, indices, ...) are kept alongside the arena
//! so templates can enumerate a kind in discovery order without filtering.
//! Data nodes are additionally folded into one site-wide mapping, [`Site::data`].

use indexmap::IndexMap;
use std::ops::Index;
use thiserror::Error;

use crate::metadata::{self, Metadata};
use crate::naming::OutputPath;
use crate::node::{Node, NodeId, NodeKind};
use crate::query::Query;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("duplicate output path {path}: {existing} and {incoming}")]
    DuplicatePath {
        path: OutputPath,
        existing: String,
        incoming: String,
    },
}

#[derive(Debug, Default)]
pub struct Site {
    nodes: Vec<Node>,
    by_path: IndexMap<OutputPath, NodeId>,
    documents: Vec<NodeId>,
    indices: Vec<NodeId>,
    resources: Vec<NodeId>,
    statics: Vec<NodeId>,
    data_nodes: Vec<NodeId>,
    internal: Vec<NodeId>,
    data: Metadata,
}

/// Human-readable origin of a node for error messages.
fn describe(node: &Node) -> String {
    match node.source() {
        Some(source) => source.display().to_string(),
        None => format!("{} node", node.kind()),
    }
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Its output path must not be taken yet.
    pub fn add(&mut self, node: Node) -> Result<NodeId, SiteError> {
        if let Some(&existing) = self.by_path.get(node.path()) {
            return Err(SiteError::DuplicatePath {
                path: node.path().clone(),
                existing: describe(&self.nodes[existing.0]),
                incoming: describe(&node),
            });
        }

        let id = NodeId(self.nodes.len());
        log::debug!("registered {} {}", node.kind(), node.path());

        match node.kind() {
            NodeKind::Document => self.documents.push(id),
            NodeKind::Index => self.indices.push(id),
            NodeKind::Resource => self.resources.push(id),
            NodeKind::Static => self.statics.push(id),
            NodeKind::Internal => self.internal.push(id),
            NodeKind::Data => {
                metadata::merge(&mut self.data, node.metadata.clone());
                self.data_nodes.push(id);
            }
        }

        self.by_path.insert(node.path().clone(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Link `child` under `parent`.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in registration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn id_of(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn get_by_path(&self, path: &str) -> Option<&Node> {
        self.id_of(path).map(|id| &self.nodes[id.0])
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Every output path, in registration order.
    pub fn urls(&self) -> impl Iterator<Item = &OutputPath> {
        self.by_path.keys()
    }

    /// Ids of every node of `kind`, in discovery order.
    pub fn ids_of(&self, kind: NodeKind) -> &[NodeId] {
        match kind {
            NodeKind::Document => &self.documents,
            NodeKind::Index => &self.indices,
            NodeKind::Resource => &self.resources,
            NodeKind::Static => &self.statics,
            NodeKind::Data => &self.data_nodes,
            NodeKind::Internal => &self.internal,
        }
    }

    /// Nodes of `kind`, in discovery order.
    pub fn of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.ids_of(kind).iter().map(|id| &self.nodes[id.0])
    }

    pub fn documents(&self) -> impl Iterator<Item = &Node> {
        self.of_kind(NodeKind::Document)
    }

    pub fn indices(&self) -> impl Iterator<Item = &Node> {
        self.of_kind(NodeKind::Index)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Node> {
        self.of_kind(NodeKind::Resource)
    }

    pub fn statics(&self) -> impl Iterator<Item = &Node> {
        self.of_kind(NodeKind::Static)
    }

    pub fn internal(&self) -> impl Iterator<Item = &Node> {
        self.of_kind(NodeKind::Internal)
    }

    /// Merged mapping of all data files; later files override earlier keys.
    pub fn data(&self) -> &Metadata {
        &self.data
    }

    /// Query over every node of the site.
    pub fn select(&self) -> Query<'_> {
        Query::new(self, self.ids().collect())
    }

    /// Query over the direct children of `id`.
    pub fn select_children(&self, id: NodeId) -> Query<'_> {
        let children = self.get(id).map(|n| n.children().to_vec()).unwrap_or_default();
        Query::new(self, children)
    }
}

impl Index<NodeId> for Site {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

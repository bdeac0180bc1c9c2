//! Descriptor tree - the result of discovery.
//!
//! Nodes live in an arena owned by [`DescriptorTree`]; parent and child links
//! are stored as [`NodeIndex`] values, so the tree has no ownership cycles.

use crate::config::Configuration;
use crate::id::UniqueId;
use crate::source::TestSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Handle of a node inside a [`DescriptorTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Index of the root of every tree.
    pub const ROOT: NodeIndex = NodeIndex(0);

    /// Position in the arena.
    pub fn get(self) -> usize {
        self.0
    }
}

/// What a descriptor stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The engine root
    Engine,
    /// A feature file
    Feature,
    /// A single scenario; the only kind with work of its own
    Scenario,
}

impl NodeKind {
    /// Whether nodes of this kind hold other nodes.
    pub fn is_container(self) -> bool {
        !matches!(self, Self::Scenario)
    }
}

/// A node of the descriptor tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Hierarchical identifier
    pub unique_id: UniqueId,

    /// Human-readable label
    pub display_name: String,

    /// Node kind
    pub kind: NodeKind,

    /// Where the node was declared
    pub source: Option<TestSource>,

    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl Node {
    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

/// A detached subtree waiting to be attached to a [`DescriptorTree`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// Hierarchical identifier
    pub unique_id: UniqueId,
    /// Human-readable label
    pub display_name: String,
    /// Node kind
    pub kind: NodeKind,
    /// Where the node was declared
    pub source: Option<TestSource>,
    /// Children in order
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Create a node spec without children.
    pub fn new(unique_id: UniqueId, display_name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            unique_id,
            display_name: display_name.into(),
            kind,
            source: None,
            children: Vec::new(),
        }
    }

    /// Set the source.
    pub fn with_source(mut self, source: TestSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Add a child.
    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// Arena-backed tree of descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorTree {
    nodes: Vec<Node>,
    by_id: HashMap<UniqueId, NodeIndex>,
}

impl DescriptorTree {
    /// Create a tree holding only `root`.
    pub fn new(root_id: UniqueId, display_name: impl Into<String>, kind: NodeKind) -> Self {
        let root = Node {
            unique_id: root_id.clone(),
            display_name: display_name.into(),
            kind,
            source: None,
            parent: None,
            children: Vec::new(),
        };
        let mut by_id = HashMap::new();
        by_id.insert(root_id, NodeIndex::ROOT);
        Self {
            nodes: vec![root],
            by_id,
        }
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Node at `index`.
    ///
    /// Indices are only handed out by this tree, so lookups cannot miss.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    /// Index of the node with `unique_id`.
    pub fn find(&self, unique_id: &UniqueId) -> Option<NodeIndex> {
        self.by_id.get(unique_id).copied()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Attach `spec` under `parent`, merging with nodes already present.
    ///
    /// A node whose identifier already exists is left untouched and only its
    /// missing descendants are added. Returns the index of the node standing
    /// for `spec`.
    pub fn attach(&mut self, parent: NodeIndex, spec: NodeSpec) -> NodeIndex {
        let index = match self.by_id.get(&spec.unique_id) {
            Some(&existing) => existing,
            None => {
                let index = NodeIndex(self.nodes.len());
                self.nodes.push(Node {
                    unique_id: spec.unique_id.clone(),
                    display_name: spec.display_name,
                    kind: spec.kind,
                    source: spec.source,
                    parent: Some(parent),
                    children: Vec::new(),
                });
                self.nodes[parent.0].children.push(index);
                self.by_id.insert(spec.unique_id, index);
                index
            }
        };

        for child in spec.children {
            self.attach(index, child);
        }
        index
    }

    /// Pre-order walk from the root.
    pub fn walk(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeIndex::ROOT];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index.0].children.iter().rev().copied());
        }
        order
    }

    /// Number of nodes of `kind`.
    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    fn set_root_source(&mut self, source: Option<TestSource>) {
        self.nodes[0].source = source;
    }
}

/// The root of a discovery result.
///
/// Owns the descriptor tree together with the configuration the run was
/// discovered with; execution reads the very same configuration back.
#[derive(Debug, Clone)]
pub struct EngineDescriptor {
    tree: DescriptorTree,
    configuration: Arc<Configuration>,
}

impl EngineDescriptor {
    /// Create an engine descriptor without children.
    pub fn new(
        unique_id: UniqueId,
        display_name: impl Into<String>,
        configuration: Arc<Configuration>,
        source: Option<TestSource>,
    ) -> Self {
        let mut tree = DescriptorTree::new(unique_id, display_name, NodeKind::Engine);
        tree.set_root_source(source);
        Self {
            tree,
            configuration,
        }
    }

    /// Identifier of the root.
    pub fn unique_id(&self) -> &UniqueId {
        &self.tree.root().unique_id
    }

    /// The synthetic source marker, if any.
    pub fn source(&self) -> Option<&TestSource> {
        self.tree.root().source.as_ref()
    }

    /// Configuration of this run.
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// The descriptor tree.
    pub fn tree(&self) -> &DescriptorTree {
        &self.tree
    }

    /// Attach a subtree directly under the root.
    pub fn add_child(&mut self, spec: NodeSpec) -> NodeIndex {
        self.tree.attach(NodeIndex::ROOT, spec)
    }

    /// Children of the root.
    pub fn children(&self) -> &[NodeIndex] {
        self.tree.root().children()
    }
}

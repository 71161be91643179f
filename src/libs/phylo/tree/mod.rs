pub mod io;
pub mod stat;
pub mod traversal;

use super::build::{self, LeafHeight};
use super::error::TreeError;
use super::node::{Node, NodeId};
use crate::libs::similarity::SimilarityTable;

/// A binary tree stored as an arena of nodes.
///
/// Parents own their two children by index. Nodes keep no back-pointer;
/// use [`Tree::parent_index`] when one is needed.
#[derive(Debug, Default, Clone)]
pub struct Tree {
    /// Arena storage for all nodes
    pub(super) nodes: Vec<Node>,

    /// Optional root ID (a tree might be empty or in construction)
    pub(super) root: Option<NodeId>,

    /// Whether each node already belongs to a parent
    attached: Vec<bool>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf. Returns the new node's ID.
    pub fn add_leaf(&mut self, name: impl Into<String>, height: i32) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::leaf(id, name, height));
        self.attached.push(false);
        id
    }

    /// Add an internal node owning `left` and `right`.
    ///
    /// Fails when a child does not exist or already has a parent.
    pub fn add_internal(
        &mut self,
        left: NodeId,
        right: NodeId,
        height: i32,
    ) -> Result<NodeId, TreeError> {
        if left == right {
            return Err(TreeError::LogicError(format!(
                "Node {} cannot be both children of one parent",
                left
            )));
        }
        for child in [left, right] {
            match self.attached.get(child) {
                None => {
                    return Err(TreeError::LogicError(format!("Node {} not found", child)));
                }
                Some(true) => {
                    return Err(TreeError::LogicError(format!(
                        "Node {} already has a parent",
                        child
                    )));
                }
                Some(false) => {}
            }
        }

        let id = self.nodes.len();
        self.nodes.push(Node::internal(id, [left, right], height));
        self.attached.push(false);
        self.attached[left] = true;
        self.attached[right] = true;
        Ok(id)
    }

    /// Get number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get root ID
    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    /// Get a reference to a node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Set a node as the root of the tree. A node with a parent cannot be the root.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), TreeError> {
        match self.attached.get(id) {
            None => Err(TreeError::LogicError(format!("Node {} not found", id))),
            Some(true) => Err(TreeError::LogicError(format!(
                "Node {} has a parent and cannot be the root",
                id
            ))),
            Some(false) => {
                self.root = Some(id);
                Ok(())
            }
        }
    }

    // --- Delegation to build ---

    /// Single-linkage tree over every identifier of `table`, leaves at height 0.
    ///
    /// ```
    /// use indexmap::IndexMap;
    /// use nwclust::libs::phylo::Tree;
    /// use nwclust::libs::similarity::SimilarityTable;
    ///
    /// let mut flat = IndexMap::new();
    /// flat.insert("X_Y".to_string(), 10);
    /// flat.insert("X_Z".to_string(), 3);
    /// flat.insert("Y_Z".to_string(), 4);
    /// let table = SimilarityTable::from_flat(["X", "Y", "Z"], &flat).unwrap();
    ///
    /// let tree = Tree::from_similarity(&table).unwrap();
    /// assert_eq!(tree.to_topology_newick(), "(Z,(Y,X));");
    /// assert_eq!(tree.to_distance_newick(), "(Z:4,(Y:10,X:10):-6);");
    /// ```
    pub fn from_similarity(table: &SimilarityTable) -> Result<Tree, TreeError> {
        let ids: Vec<&str> = table.names().iter().map(|s| s.as_str()).collect();
        build::single_linkage(table, &ids, LeafHeight::Zero)
    }

    // --- Delegation to traversal ---

    pub fn preorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::preorder(self, start_node)
    }

    pub fn postorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::postorder(self, start_node)
    }

    pub fn parent_index(&self) -> Vec<Option<NodeId>> {
        traversal::parent_index(self)
    }

    // --- Delegation to stat ---

    pub fn get_leaves(&self) -> Vec<NodeId> {
        if let Some(root) = self.root {
            stat::get_leaves(self, root)
        } else {
            Vec::new()
        }
    }

    pub fn get_leaf_names(&self) -> Vec<String> {
        if let Some(root) = self.root {
            stat::get_leaf_names(self, root)
        } else {
            Vec::new()
        }
    }

    pub fn depth(&self) -> usize {
        stat::depth(self)
    }

    // --- Delegation to io ---

    pub fn to_topology_newick(&self) -> String {
        io::to_topology_newick(self)
    }

    pub fn to_distance_newick(&self) -> String {
        io::to_distance_newick(self)
    }
}

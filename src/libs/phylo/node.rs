/// NodeId is an index into the Tree's node vector.
/// It is lightweight (Copy) and safe (no pointers).
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An input sequence
    Leaf { name: String },
    /// A merge event owning exactly two subtrees
    Internal { children: [NodeId; 2] },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique identifier for the node (index in the arena)
    pub id: NodeId,

    pub kind: NodeKind,

    /// Similarity at which the node was formed.
    /// Merge score for internal nodes; 0 or the self-score for leaves.
    /// Nothing orders heights along a path, so never infer one from depth.
    pub height: i32,
}

impl Node {
    pub fn leaf(id: NodeId, name: impl Into<String>, height: i32) -> Self {
        Self {
            id,
            kind: NodeKind::Leaf { name: name.into() },
            height,
        }
    }

    pub fn internal(id: NodeId, children: [NodeId; 2], height: i32) -> Self {
        Self {
            id,
            kind: NodeKind::Internal { children },
            height,
        }
    }

    /// A node is a leaf if and only if it has no children
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Leaf name; internal nodes carry none
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { name } => Some(name),
            NodeKind::Internal { .. } => None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Internal { children } => children,
        }
    }
}

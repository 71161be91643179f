use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Get node IDs in preorder traversal (Root -> Children)
pub fn preorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            result.push(id);
            // Push children in reverse order so they are processed in order
            for &child in node.children().iter().rev() {
                stack.push(child);
            }
        }
    }

    result
}

/// Get node IDs in postorder traversal (Children -> Root)
pub fn postorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    // Root -> Right -> Left, reversed
    let mut result = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            result.push(id);
            for &child in node.children() {
                stack.push(child);
            }
        }
    }

    result.reverse();
    result
}

/// Parent of every node, indexed by NodeId. Detached nodes and the root map to None.
pub fn parent_index(tree: &Tree) -> Vec<Option<NodeId>> {
    let mut parents = vec![None; tree.len()];
    for node in &tree.nodes {
        for &child in node.children() {
            parents[child] = Some(node.id);
        }
    }
    parents
}

use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Get IDs of all leaves in subtree rooted at `id`, left to right.
pub fn get_leaves(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let mut leaves = Vec::new();
    let mut stack = vec![id];

    while let Some(curr) = stack.pop() {
        if let Some(node) = tree.get_node(curr) {
            if node.is_leaf() {
                leaves.push(curr);
            } else {
                for &child in node.children().iter().rev() {
                    stack.push(child);
                }
            }
        }
    }
    leaves
}

/// Get names of all leaves in subtree.
pub fn get_leaf_names(tree: &Tree, id: NodeId) -> Vec<String> {
    get_leaves(tree, id)
        .into_iter()
        .filter_map(|leaf_id| tree.get_node(leaf_id).and_then(|n| n.name()))
        .map(|name| name.to_string())
        .collect()
}

/// Number of edges on the longest root-to-leaf path.
pub fn depth(tree: &Tree) -> usize {
    let root = match tree.get_root() {
        Some(r) => r,
        None => return 0,
    };

    let mut max_depth = 0;
    let mut stack = vec![(root, 0)];
    while let Some((id, d)) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            max_depth = max_depth.max(d);
            for &child in node.children() {
                stack.push((child, d + 1));
            }
        }
    }
    max_depth
}

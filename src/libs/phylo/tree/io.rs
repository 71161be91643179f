use super::Tree;
use crate::libs::phylo::node::{Node, NodeId, NodeKind};
use std::fmt::Write;

/// Serialize the tree as nested leaf names, e.g. `((A,B),C);`.
pub fn to_topology_newick(tree: &Tree) -> String {
    to_newick(tree, false)
}

/// Serialize the tree with integer branch lengths, e.g. `((A:5,B:5):-2,C:3);`.
///
/// Each non-root node carries `parent.height - node.height`. The root has no
/// length, so a single-leaf tree is just `A;`.
pub fn to_distance_newick(tree: &Tree) -> String {
    to_newick(tree, true)
}

/// Length of the edge from a node at `child` height up to its parent.
pub fn branch_length(parent: i32, child: i32) -> i64 {
    i64::from(parent) - i64::from(child)
}

enum Step {
    Visit(NodeId, Option<i32>),
    Close(NodeId, Option<i32>),
    Comma,
}

fn to_newick(tree: &Tree, with_length: bool) -> String {
    let root = match tree.get_root() {
        Some(root) => root,
        None => return ";".to_string(),
    };

    let mut s = String::new();
    // (node, height of its parent)
    let mut stack = vec![Step::Visit(root, None)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(id, up) => {
                let node = &tree.nodes[id];
                match &node.kind {
                    NodeKind::Leaf { name } => {
                        s.push_str(&quote_label(name));
                        push_length(&mut s, node, up, with_length);
                    }
                    NodeKind::Internal { children: [left, right] } => {
                        s.push('(');
                        stack.push(Step::Close(id, up));
                        stack.push(Step::Visit(*right, Some(node.height)));
                        stack.push(Step::Comma);
                        stack.push(Step::Visit(*left, Some(node.height)));
                    }
                }
            }
            Step::Comma => s.push(','),
            Step::Close(id, up) => {
                s.push(')');
                push_length(&mut s, &tree.nodes[id], up, with_length);
            }
        }
    }

    s.push(';');
    s
}

fn push_length(s: &mut String, node: &Node, up: Option<i32>, with_length: bool) {
    if !with_length {
        return;
    }
    if let Some(parent_height) = up {
        // writing into a String cannot fail
        let _ = write!(s, ":{}", branch_length(parent_height, node.height));
    }
}

fn quote_label(label: &str) -> String {
    let needs_quote = label.chars().any(|c| "(),:;[]' \t\n".contains(c));
    if needs_quote {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

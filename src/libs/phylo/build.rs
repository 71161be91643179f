use crate::libs::phylo::error::TreeError;
use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::tree::Tree;
use crate::libs::similarity::SimilarityTable;
use std::collections::HashMap;

/// Height given to leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeafHeight {
    /// Every leaf sits at 0
    #[default]
    Zero,
    /// Each leaf sits at the score of its sequence against itself
    SelfScore,
}

impl std::str::FromStr for LeafHeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(LeafHeight::Zero),
            "self" => Ok(LeafHeight::SelfScore),
            _ => Err(format!("Unknown leaf height \"{}\", expected zero or self", s)),
        }
    }
}

/// Single-linkage similarity between two clusters, and the leaf pair that
/// realizes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    score: i32,
    /// Table indexes `(i, j)` with `i < j`; the smallest one among equal scores
    witness: (usize, usize),
}

impl Link {
    fn new(score: i32, i: usize, j: usize) -> Self {
        Self {
            score,
            witness: (i.min(j), i.max(j)),
        }
    }

    /// Higher score wins; equal scores go to the smaller witness
    fn beats(&self, other: &Link) -> bool {
        self.score > other.score || (self.score == other.score && self.witness < other.witness)
    }
}

struct Cluster {
    node: NodeId,
    /// Table indexes of the leaves below `node`
    members: Vec<usize>,
}

fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    (a.min(b), a.max(b))
}

/// Build a binary tree over `ids` by greedy single-linkage merging.
///
/// Each round merges the two active clusters with the highest single-linkage
/// similarity into a new node at that height. Ties go to the pair whose
/// witnessing leaves come first in table order. The cluster holding the later
/// leaf of the witness pair becomes the left child, so a pair `(i, j)` is
/// written `(j,i)`.
///
/// Identifiers are taken in table order, whatever the order of `ids`.
pub fn single_linkage<S: AsRef<str>>(
    table: &SimilarityTable,
    ids: &[S],
    leaf_height: LeafHeight,
) -> Result<Tree, TreeError> {
    let mut indexes = ids
        .iter()
        .map(|id| {
            let id = id.as_ref();
            table
                .index_of(id)
                .ok_or_else(|| TreeError::UnknownId(id.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    indexes.sort_unstable();
    indexes.dedup();

    if indexes.is_empty() {
        return Err(TreeError::EmptyInput);
    }

    let mut tree = Tree::new();
    let mut active: Vec<Cluster> = Vec::with_capacity(indexes.len());

    // Initialize leaves
    for &idx in &indexes {
        let name = table.name(idx);
        let height = match leaf_height {
            LeafHeight::Zero => 0,
            LeafHeight::SelfScore => table
                .self_score_at(idx)
                .ok_or_else(|| TreeError::MissingSelfScore(name.to_string()))?,
        };
        let node = tree.add_leaf(name, height);
        active.push(Cluster {
            node,
            members: vec![idx],
        });
    }

    // Links between active clusters, keyed by their node IDs
    let mut links: HashMap<(NodeId, NodeId), Link> = HashMap::new();
    for a in 0..active.len() {
        for b in (a + 1)..active.len() {
            let (i, j) = (active[a].members[0], active[b].members[0]);
            links.insert(
                key(active[a].node, active[b].node),
                Link::new(table.score_at(i, j), i, j),
            );
        }
    }

    while active.len() > 1 {
        // 1. Find the best pair
        let mut best: Option<(usize, usize, Link)> = None;
        for a in 0..active.len() {
            for b in (a + 1)..active.len() {
                let link = links[&key(active[a].node, active[b].node)];
                if best.map_or(true, |(_, _, current)| link.beats(&current)) {
                    best = Some((a, b, link));
                }
            }
        }
        let (a, b, link) = best.ok_or_else(|| {
            TreeError::LogicError("No pair left to merge".to_string())
        })?;

        // 2. Merge
        let (first, second) = if active[a].members.contains(&link.witness.1) {
            (a, b)
        } else {
            (b, a)
        };
        let new_node = tree.add_internal(active[first].node, active[second].node, link.score)?;
        tracing::debug!(
            "Merge {} + {} at {} (witness {}_{})",
            active[first].members.len(),
            active[second].members.len(),
            link.score,
            table.name(link.witness.0),
            table.name(link.witness.1),
        );

        // 3. Update links: the best of the two old links to every other cluster
        for (c, other) in active.iter().enumerate() {
            if c == a || c == b {
                continue;
            }
            let la = links[&key(active[a].node, other.node)];
            let lb = links[&key(active[b].node, other.node)];
            let merged = if la.beats(&lb) { la } else { lb };
            links.insert(key(new_node, other.node), merged);
        }

        // 4. Replace (remove the larger index first)
        let cluster_b = active.remove(b);
        let cluster_a = active.remove(a);
        links.retain(|&(x, y), _| {
            ![cluster_a.node, cluster_b.node].contains(&x)
                && ![cluster_a.node, cluster_b.node].contains(&y)
        });

        let (first, second) = if first == a {
            (cluster_a, cluster_b)
        } else {
            (cluster_b, cluster_a)
        };
        let mut members = first.members;
        members.extend(second.members);
        active.push(Cluster {
            node: new_node,
            members,
        });
    }

    tree.set_root(active[0].node)?;
    Ok(tree)
}

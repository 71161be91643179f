use super::tree::{stat, Tree};
use indexmap::IndexMap;
use std::io::BufRead;

/// A similarity threshold and the text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    /// Trimmed source line, used as the key of the output map
    pub label: String,
    pub value: f64,
}

impl Threshold {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Read one threshold per line.
///
/// Blank lines and lines starting with `#` are skipped. A line that is not a
/// finite number is skipped with a warning. A repeated line is kept once.
///
/// ```
/// use nwclust::libs::phylo::cut::parse_thresholds;
///
/// let text = "10\n\n# comment\nabc\n-2.5\n10\n";
/// let thresholds = parse_thresholds(text.as_bytes()).unwrap();
/// let labels: Vec<_> = thresholds.iter().map(|t| t.label.as_str()).collect();
/// assert_eq!(labels, vec!["10", "-2.5"]);
/// ```
pub fn parse_thresholds<R: BufRead>(reader: R) -> anyhow::Result<Vec<Threshold>> {
    let mut thresholds: IndexMap<String, f64> = IndexMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                thresholds.entry(text.to_string()).or_insert(value);
            }
            _ => {
                tracing::warn!("Skip line {}: \"{}\" is not a threshold", i + 1, text);
            }
        }
    }

    Ok(thresholds
        .into_iter()
        .map(|(label, value)| Threshold { label, value })
        .collect())
}

/// Cut the tree at `threshold` and return a partition of its leaf names.
///
/// Walking down from the root, a node whose height reaches the threshold keeps
/// all its leaves together; a lower node is split and its children are visited.
/// A leaf reached on its own is a singleton.
///
/// Members are sorted, then clusters are ordered by size (largest first) and
/// by first member.
///
/// ```
/// use nwclust::libs::phylo::Tree;
/// use nwclust::libs::phylo::cut::clusters_at;
///
/// let tree = Tree::from_distance_newick("(Z:4,(Y:10,X:10):-6);").unwrap();
/// assert_eq!(clusters_at(&tree, 10.0), vec![vec!["X", "Y"], vec!["Z"]]);
/// assert_eq!(clusters_at(&tree, 4.0), vec![vec!["X", "Y", "Z"]]);
/// ```
pub fn clusters_at(tree: &Tree, threshold: f64) -> Vec<Vec<String>> {
    let mut clusters: Vec<Vec<String>> = Vec::new();

    let mut stack: Vec<_> = tree.get_root().into_iter().collect();
    while let Some(id) = stack.pop() {
        let node = match tree.get_node(id) {
            Some(node) => node,
            None => continue,
        };

        if !node.is_leaf() && f64::from(node.height) < threshold {
            for &child in node.children().iter().rev() {
                stack.push(child);
            }
        } else {
            let mut members = stat::get_leaf_names(tree, id);
            members.sort();
            clusters.push(members);
        }
    }

    clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));
    clusters
}

/// Cut the same tree once per threshold, keyed by each threshold's label.
pub fn clusters_for(tree: &Tree, thresholds: &[Threshold]) -> IndexMap<String, Vec<Vec<String>>> {
    thresholds
        .iter()
        .map(|t| {
            let clusters = clusters_at(tree, t.value);
            tracing::debug!("Threshold {}: {} clusters", t.label, clusters.len());
            (t.label.clone(), clusters)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::similarity::SimilarityTable;
    use indexmap::IndexMap;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    // ((X,Y)10,Z)4
    fn xyz() -> Tree {
        let mut tree = Tree::new();
        let x = tree.add_leaf("X", 0);
        let y = tree.add_leaf("Y", 0);
        let z = tree.add_leaf("Z", 0);
        let xy = tree.add_internal(x, y, 10).unwrap();
        let root = tree.add_internal(xy, z, 4).unwrap();
        tree.set_root(root).unwrap();
        tree
    }

    fn random_tree(rng: &mut SmallRng, k: usize) -> Tree {
        let ids: Vec<String> = (0..k).map(|i| format!("S{:02}", i)).collect();
        let mut flat = IndexMap::new();
        for i in 0..k {
            for j in (i + 1)..k {
                flat.insert(format!("{}_{}", ids[i], ids[j]), rng.gen_range(-30..30));
            }
        }
        let table = SimilarityTable::from_flat(ids.iter().cloned(), &flat).unwrap();
        Tree::from_similarity(&table).unwrap()
    }

    #[test]
    fn three_species_cuts() {
        let tree = xyz();
        assert_eq!(
            clusters_at(&tree, 11.0),
            vec![vec!["X"], vec!["Y"], vec!["Z"]]
        );
        assert_eq!(clusters_at(&tree, 10.0), vec![vec!["X", "Y"], vec!["Z"]]);
        assert_eq!(clusters_at(&tree, 5.0), vec![vec!["X", "Y"], vec!["Z"]]);
        assert_eq!(clusters_at(&tree, 4.0), vec![vec!["X", "Y", "Z"]]);
        assert_eq!(clusters_at(&tree, 0.0), vec![vec!["X", "Y", "Z"]]);
        assert_eq!(clusters_at(&tree, 4.5), vec![vec!["X", "Y"], vec!["Z"]]);
    }

    #[test]
    fn single_leaf_and_empty_tree() {
        let mut tree = Tree::new();
        let a = tree.add_leaf("A", 0);
        tree.set_root(a).unwrap();
        assert_eq!(clusters_at(&tree, 100.0), vec![vec!["A"]]);
        assert_eq!(clusters_at(&tree, -100.0), vec![vec!["A"]]);

        assert!(clusters_at(&Tree::new(), 1.0).is_empty());
    }

    #[test]
    fn higher_node_above_lower_one() {
        // root is taller than its child: cutting between them keeps everything
        let mut tree = Tree::new();
        let b = tree.add_leaf("B", 0);
        let a = tree.add_leaf("A", 0);
        let c = tree.add_leaf("C", 0);
        let ba = tree.add_internal(b, a, 2).unwrap();
        let root = tree.add_internal(ba, c, 10).unwrap();
        tree.set_root(root).unwrap();

        assert_eq!(clusters_at(&tree, 5.0), vec![vec!["A", "B", "C"]]);
        assert_eq!(
            clusters_at(&tree, 11.0),
            vec![vec!["A"], vec!["B"], vec!["C"]]
        );
    }

    #[test]
    fn clusters_for_keeps_threshold_order() {
        let tree = xyz();
        let thresholds = vec![Threshold::new("11", 11.0), Threshold::new("4", 4.0)];
        let map = clusters_for(&tree, &thresholds);

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["11", "4"]);
        assert_eq!(map["4"], vec![vec!["X", "Y", "Z"]]);
        assert_eq!(map["11"].len(), 3);
        // the tree is untouched
        assert_eq!(tree.to_distance_newick(), "((X:10,Y:10):-6,Z:4);");
    }

    #[test]
    fn every_cut_is_a_partition() {
        let mut rng = SmallRng::seed_from_u64(3);
        for k in 1..15 {
            let tree = random_tree(&mut rng, k);
            let all: BTreeSet<String> = tree.get_leaf_names().into_iter().collect();
            for t in -31..32 {
                let clusters = clusters_at(&tree, f64::from(t));
                let flat: Vec<String> = clusters.iter().flatten().cloned().collect();
                let unique: BTreeSet<String> = flat.iter().cloned().collect();
                assert_eq!(flat.len(), k);
                assert_eq!(unique, all);
            }
        }
    }

    #[test]
    fn higher_thresholds_refine_lower_ones() {
        let mut rng = SmallRng::seed_from_u64(17);
        for k in 2..15 {
            let tree = random_tree(&mut rng, k);
            for t1 in -31..31 {
                let coarse = clusters_at(&tree, f64::from(t1));
                let fine = clusters_at(&tree, f64::from(t1 + 1));
                for cluster in &fine {
                    let inside = coarse
                        .iter()
                        .any(|c| cluster.iter().all(|name| c.contains(name)));
                    assert!(inside, "{:?} is split at {}", cluster, t1);
                }
            }
        }
    }

    #[test]
    fn parse_thresholds_skips_bad_lines() {
        let text = "  10 \n5\nfoo\n\n# a comment\nNaN\ninf\n0\n5\n-3\n";
        let thresholds = parse_thresholds(text.as_bytes()).unwrap();
        assert_eq!(
            thresholds,
            vec![
                Threshold::new("10", 10.0),
                Threshold::new("5", 5.0),
                Threshold::new("0", 0.0),
                Threshold::new("-3", -3.0),
            ]
        );

        assert!(parse_thresholds("".as_bytes()).unwrap().is_empty());
    }
}

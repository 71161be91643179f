use crate::libs::align::{AlignError, NeedlemanWunsch, PairwiseScorer};
use crate::libs::scoring::ScoringModel;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use rayon::prelude::*;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    /// Aligning two sequences failed
    Unscorable {
        id1: String,
        id2: String,
        source: AlignError,
    },
    /// A flat key that does not join two known identifiers with `_`
    UnknownKey(String),
    /// No score for a pair of identifiers
    MissingPair { id1: String, id2: String },
    /// `a_b` and `b_a` disagree
    Asymmetric { id1: String, id2: String },
}

impl fmt::Display for SimilarityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityError::Unscorable { id1, id2, source } => {
                write!(f, "Cannot score {} against {}: {}", id1, id2, source)
            }
            SimilarityError::UnknownKey(key) => {
                write!(f, "Score key \"{}\" does not name two known sequences", key)
            }
            SimilarityError::MissingPair { id1, id2 } => {
                write!(f, "No score for the pair {}_{}", id1, id2)
            }
            SimilarityError::Asymmetric { id1, id2 } => {
                write!(f, "Scores of {}_{} and {}_{} differ", id1, id2, id2, id1)
            }
        }
    }
}

impl std::error::Error for SimilarityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimilarityError::Unscorable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// All-pairs similarity scores of a set of named sequences.
///
/// Identifiers keep their input order, which is also the order used to break
/// ties when building trees.
#[derive(Debug, Clone)]
pub struct SimilarityTable {
    names: IndexSet<String>,
    /// Dense row-major `k * k` matrix; the diagonal is unused
    scores: Vec<i32>,
    self_scores: Vec<Option<i32>>,
}

impl SimilarityTable {
    /// Align every pair of sequences, and every sequence against itself, with
    /// Needleman-Wunsch under `model`.
    pub fn build(
        sequences: &IndexMap<String, String>,
        model: &ScoringModel,
    ) -> Result<Self, SimilarityError> {
        Self::build_with(sequences, &NeedlemanWunsch::new(model))
    }

    /// Same as [`SimilarityTable::build`] with any scorer.
    ///
    /// Pairs are scored on the rayon thread pool. Each job returns its own
    /// result and the table is filled afterwards.
    pub fn build_with<S>(
        sequences: &IndexMap<String, String>,
        scorer: &S,
    ) -> Result<Self, SimilarityError>
    where
        S: PairwiseScorer + Sync,
    {
        let names: IndexSet<String> = sequences.keys().cloned().collect();
        let seqs: Vec<&str> = sequences.values().map(|s| s.as_str()).collect();
        let k = names.len();

        let jobs: Vec<(usize, usize)> = (0..k)
            .map(|i| (i, i))
            .chain((0..k).tuple_combinations::<(usize, usize)>())
            .collect();
        tracing::info!("Aligning {} sequences, {} jobs", k, jobs.len());

        let results: Vec<Result<i32, AlignError>> = jobs
            .par_iter()
            .map(|&(i, j)| scorer.score(seqs[i], seqs[j]))
            .collect();

        let mut table = Self::empty(names);
        for (&(i, j), result) in jobs.iter().zip(results) {
            let score = result.map_err(|source| SimilarityError::Unscorable {
                id1: table.name(i).to_string(),
                id2: table.name(j).to_string(),
                source,
            })?;
            if i == j {
                table.self_scores[i] = Some(score);
            } else {
                table.set(i, j, score);
            }
        }

        Ok(table)
    }

    /// Rebuild a table from its flat `id1_id2 -> score` form.
    ///
    /// Keys are split at the `_` that leaves a known identifier on both sides,
    /// so identifiers may contain underscores themselves. `id_id` keys are
    /// read as self-scores.
    ///
    /// ```
    /// use indexmap::IndexMap;
    /// use nwclust::libs::similarity::SimilarityTable;
    ///
    /// let mut flat = IndexMap::new();
    /// flat.insert("X_Y".to_string(), 10);
    /// flat.insert("X_Z".to_string(), 3);
    /// flat.insert("Y_Z".to_string(), 4);
    ///
    /// let table = SimilarityTable::from_flat(["X", "Y", "Z"], &flat).unwrap();
    /// assert_eq!(table.score("Z", "Y"), Some(4));
    /// assert_eq!(table.self_score("X"), None);
    /// ```
    pub fn from_flat<I, S>(ids: I, flat: &IndexMap<String, i32>) -> Result<Self, SimilarityError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: IndexSet<String> = ids.into_iter().map(Into::into).collect();
        let k = names.len();
        let mut table = Self::empty(names);
        let mut filled = vec![false; k * k];

        for (key, &score) in flat {
            let (i, j) = table
                .split_key(key)
                .ok_or_else(|| SimilarityError::UnknownKey(key.clone()))?;
            if i == j {
                table.self_scores[i] = Some(score);
                continue;
            }
            if filled[i * k + j] && table.scores[i * k + j] != score {
                return Err(SimilarityError::Asymmetric {
                    id1: table.name(i).to_string(),
                    id2: table.name(j).to_string(),
                });
            }
            table.set(i, j, score);
            filled[i * k + j] = true;
            filled[j * k + i] = true;
        }

        if let Some((i, j)) = (0..k)
            .tuple_combinations::<(usize, usize)>()
            .find(|&(i, j)| !filled[i * k + j])
        {
            return Err(SimilarityError::MissingPair {
                id1: table.name(i).to_string(),
                id2: table.name(j).to_string(),
            });
        }

        Ok(table)
    }

    /// Flat `id1_id2 -> score` map, with `id1` before `id2` in input order.
    /// With `with_self`, each row starts with the `id_id` self-score when known.
    pub fn to_flat(&self, with_self: bool) -> IndexMap<String, i32> {
        let mut flat = IndexMap::new();
        for i in 0..self.len() {
            if with_self {
                if let Some(score) = self.self_scores[i] {
                    flat.insert(format!("{}_{}", self.name(i), self.name(i)), score);
                }
            }
            for j in (i + 1)..self.len() {
                flat.insert(
                    format!("{}_{}", self.name(i), self.name(j)),
                    self.score_at(i, j),
                );
            }
        }
        flat
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &IndexSet<String> {
        &self.names
    }

    /// Name of the `i`-th identifier. Panics when out of range.
    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    /// Score of two distinct identifiers by index
    pub fn score_at(&self, i: usize, j: usize) -> i32 {
        self.scores[i * self.len() + j]
    }

    pub fn self_score_at(&self, i: usize) -> Option<i32> {
        self.self_scores[i]
    }

    /// Score by name; `score(a, a)` is the self-score
    pub fn score(&self, a: &str, b: &str) -> Option<i32> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        if i == j {
            self.self_scores[i]
        } else {
            Some(self.score_at(i, j))
        }
    }

    pub fn self_score(&self, name: &str) -> Option<i32> {
        self.index_of(name).and_then(|i| self.self_scores[i])
    }

    fn empty(names: IndexSet<String>) -> Self {
        let k = names.len();
        Self {
            names,
            scores: vec![0; k * k],
            self_scores: vec![None; k],
        }
    }

    fn set(&mut self, i: usize, j: usize, score: i32) {
        let k = self.len();
        self.scores[i * k + j] = score;
        self.scores[j * k + i] = score;
    }

    fn split_key(&self, key: &str) -> Option<(usize, usize)> {
        key.match_indices('_').find_map(|(pos, _)| {
            let i = self.index_of(&key[..pos])?;
            let j = self.index_of(&key[pos + 1..])?;
            Some((i, j))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab_model() -> ScoringModel {
        ScoringModel::new()
            .with_gap('a', -1)
            .with_gap('b', -2)
            .with_pair('a', 'a', 2)
            .with_pair('b', 'b', 3)
            .with_pair('a', 'b', -3)
    }

    fn seqs(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn build_scores_all_pairs() {
        let sequences = seqs(&[("S1", "aabaab"), ("S2", "ababaa"), ("S3", "ab")]);
        let table = SimilarityTable::build(&sequences, &ab_model()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.score("S1", "S2"), Some(7));
        assert_eq!(table.score("S2", "S1"), Some(7));
        assert_eq!(table.score("S3", "S3"), Some(5));
        assert_eq!(table.self_score("S1"), Some(2 * 4 + 3 * 2));
        assert_eq!(table.score("S1", "nope"), None);
    }

    #[test]
    fn build_reports_the_failing_pair() {
        let sequences = seqs(&[("S1", "ab"), ("S2", "ac")]);
        let err = SimilarityTable::build(&sequences, &ab_model()).unwrap_err();

        // the self-score of S2 is the first job to hit 'c'
        assert_eq!(
            err,
            SimilarityError::Unscorable {
                id1: "S2".to_string(),
                id2: "S2".to_string(),
                source: AlignError::MissingGap { symbol: 'c' },
            }
        );
        assert!(err.to_string().contains("S2 against S2"));
    }

    #[test]
    fn flat_round_trip() {
        let sequences = seqs(&[("S1", "aabaab"), ("S2", "ababaa"), ("S3", "ab")]);
        let table = SimilarityTable::build(&sequences, &ab_model()).unwrap();

        let flat = table.to_flat(false);
        assert_eq!(
            flat.keys().collect::<Vec<_>>(),
            vec!["S1_S2", "S1_S3", "S2_S3"]
        );

        let flat_self = table.to_flat(true);
        assert_eq!(flat_self.len(), 6);
        assert_eq!(flat_self.get_index(0).unwrap().0, "S1_S1");

        let back = SimilarityTable::from_flat(sequences.keys(), &flat_self).unwrap();
        for a in sequences.keys() {
            for b in sequences.keys() {
                assert_eq!(back.score(a, b), table.score(a, b));
            }
        }
    }

    #[test]
    fn flat_keys_with_underscores() {
        let mut flat = IndexMap::new();
        flat.insert("Homo_sapiens_Pan_troglodytes".to_string(), 90);
        let table =
            SimilarityTable::from_flat(["Homo_sapiens", "Pan_troglodytes"], &flat).unwrap();
        assert_eq!(table.score("Pan_troglodytes", "Homo_sapiens"), Some(90));
    }

    #[test]
    fn flat_errors() {
        let mut flat = IndexMap::new();
        flat.insert("X_Y".to_string(), 10);

        let err = SimilarityTable::from_flat(["X", "Y", "Z"], &flat).unwrap_err();
        assert_eq!(
            err,
            SimilarityError::MissingPair {
                id1: "X".to_string(),
                id2: "Z".to_string()
            }
        );

        flat.insert("X_W".to_string(), 1);
        let err = SimilarityTable::from_flat(["X", "Y"], &flat).unwrap_err();
        assert_eq!(err, SimilarityError::UnknownKey("X_W".to_string()));

        let mut flat = IndexMap::new();
        flat.insert("X_Y".to_string(), 10);
        flat.insert("Y_X".to_string(), 11);
        let err = SimilarityTable::from_flat(["X", "Y"], &flat).unwrap_err();
        assert!(matches!(err, SimilarityError::Asymmetric { .. }));
    }

    #[test]
    fn build_is_independent_of_thread_count() {
        let sequences = seqs(&[
            ("A", "aabbab"),
            ("B", "abab"),
            ("C", "bbbaaa"),
            ("D", "a"),
            ("E", ""),
        ]);
        let model = ab_model();
        let serial = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| SimilarityTable::build(&sequences, &model).unwrap());
        let parallel = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
            .install(|| SimilarityTable::build(&sequences, &model).unwrap());
        assert_eq!(serial.to_flat(true), parallel.to_flat(true));
    }
}

use crate::libs::align::AlignError;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Gap penalties per symbol and substitution scores per symbol pair.
///
/// The flat form used on disk mixes both kinds of entries in one object:
/// single-character keys are gap penalties and two-character keys are
/// substitution scores, e.g. `{"A": -5, "AA": 5, "AR": -2, ...}`.
///
/// A pair only needs to be present in one orientation; lookups try `ab` and
/// then `ba`. Absent entries are errors, never zero.
#[derive(Debug, Clone, Default)]
pub struct ScoringModel {
    gaps: HashMap<char, i32>,
    pairs: HashMap<(char, char), i32>,
}

impl ScoringModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gap penalty of `symbol` (builder pattern)
    pub fn with_gap(mut self, symbol: char, score: i32) -> Self {
        self.gaps.insert(symbol, score);
        self
    }

    /// Set the substitution score of `a` against `b` (builder pattern)
    pub fn with_pair(mut self, a: char, b: char, score: i32) -> Self {
        self.pairs.insert((a, b), score);
        self
    }

    /// Build a model from flat `key -> score` entries.
    ///
    /// ```
    /// use nwclust::libs::scoring::ScoringModel;
    ///
    /// let model = ScoringModel::from_flat([
    ///     ("a".to_string(), -1),
    ///     ("ab".to_string(), -3),
    /// ])
    /// .unwrap();
    /// assert_eq!(model.gap('a').unwrap(), -1);
    /// assert_eq!(model.substitution('b', 'a').unwrap(), -3);
    ///
    /// assert!(ScoringModel::from_flat([("abc".to_string(), 1)]).is_err());
    /// ```
    pub fn from_flat<I>(entries: I) -> Result<Self, AlignError>
    where
        I: IntoIterator<Item = (String, i32)>,
    {
        let mut model = Self::new();
        for (key, score) in entries {
            let chars: Vec<char> = key.chars().collect();
            match chars.as_slice() {
                [c] => {
                    model.gaps.insert(*c, score);
                }
                [a, b] => {
                    model.pairs.insert((*a, *b), score);
                }
                _ => return Err(AlignError::MalformedKey { key }),
            }
        }
        Ok(model)
    }

    /// Load a flat JSON scoring table, e.g. `blosum62.json`.
    pub fn from_file(infile: &str) -> anyhow::Result<Self> {
        let flat: IndexMap<String, i32> = crate::libs::io::read_json(infile)?;
        let model = Self::from_flat(flat)?;
        tracing::info!(
            "Loaded scoring table {}: {} gap entries, {} pair entries",
            infile,
            model.gaps.len(),
            model.pairs.len()
        );
        Ok(model)
    }

    pub fn gap(&self, symbol: char) -> Result<i32, AlignError> {
        self.gaps
            .get(&symbol)
            .copied()
            .ok_or(AlignError::MissingGap { symbol })
    }

    pub fn substitution(&self, a: char, b: char) -> Result<i32, AlignError> {
        self.pairs
            .get(&(a, b))
            .or_else(|| self.pairs.get(&(b, a)))
            .copied()
            .ok_or(AlignError::MissingSubstitution { a, b })
    }

    /// Number of symbols with a gap penalty
    pub fn alphabet_len(&self) -> usize {
        self.gaps.len()
    }
}

use crate::libs::scoring::ScoringModel;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    /// A symbol in a sequence has no gap penalty
    MissingGap { symbol: char },
    /// A symbol pair has no substitution score in either order
    MissingSubstitution { a: char, b: char },
    /// A flat scoring key that is neither one nor two symbols long
    MalformedKey { key: String },
    /// The final score does not fit in an `i32`
    Overflow,
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::MissingGap { symbol } => {
                write!(f, "No gap penalty for symbol '{}'", symbol)
            }
            AlignError::MissingSubstitution { a, b } => {
                write!(f, "No substitution score for '{}{}' or '{}{}'", a, b, b, a)
            }
            AlignError::MalformedKey { key } => {
                write!(
                    f,
                    "Scoring key \"{}\" is neither a symbol nor a symbol pair",
                    key
                )
            }
            AlignError::Overflow => write!(f, "Alignment score does not fit in i32"),
        }
    }
}

impl std::error::Error for AlignError {}

/// Something that scores one sequence against another.
pub trait PairwiseScorer {
    fn score(&self, seq1: &str, seq2: &str) -> Result<i32, AlignError>;
}

/// Global alignment score with a per-symbol linear gap cost.
#[derive(Debug, Clone, Copy)]
pub struct NeedlemanWunsch<'a> {
    pub model: &'a ScoringModel,
}

impl<'a> NeedlemanWunsch<'a> {
    pub fn new(model: &'a ScoringModel) -> Self {
        Self { model }
    }
}

impl PairwiseScorer for NeedlemanWunsch<'_> {
    fn score(&self, seq1: &str, seq2: &str) -> Result<i32, AlignError> {
        align(seq1, seq2, self.model)
    }
}

/// Needleman-Wunsch score of `seq1` against `seq2`.
///
/// Only the score of the last cell is returned, so ties between the three
/// predecessors need no traceback rule. Cells are summed in `i64`; a final
/// score outside `i32` is an `AlignError::Overflow`.
///
/// ```
/// use nwclust::libs::align::align;
/// use nwclust::libs::scoring::ScoringModel;
///
/// let model = ScoringModel::new()
///     .with_gap('a', -1)
///     .with_gap('b', -2)
///     .with_pair('a', 'a', 2)
///     .with_pair('b', 'b', 3)
///     .with_pair('a', 'b', -3);
///
/// assert_eq!(align("aabaab", "ababaa", &model).unwrap(), 7);
/// assert_eq!(align("", "", &model).unwrap(), 0);
/// assert_eq!(align("", "ab", &model).unwrap(), -3);
/// ```
pub fn align(seq1: &str, seq2: &str, model: &ScoringModel) -> Result<i32, AlignError> {
    let s1: Vec<char> = seq1.chars().collect();
    let s2: Vec<char> = seq2.chars().collect();

    let gaps1 = s1
        .iter()
        .map(|&c| model.gap(c).map(i64::from))
        .collect::<Result<Vec<_>, _>>()?;
    let gaps2 = s2
        .iter()
        .map(|&c| model.gap(c).map(i64::from))
        .collect::<Result<Vec<_>, _>>()?;

    // Column symbols of seq2 as indexes into a small alphabet
    let mut alphabet: Vec<char> = Vec::new();
    let mut col_of: HashMap<char, usize> = HashMap::new();
    let cols: Vec<usize> = s2
        .iter()
        .map(|&c| {
            *col_of.entry(c).or_insert_with(|| {
                alphabet.push(c);
                alphabet.len() - 1
            })
        })
        .collect();

    // Every (i, j) cell is visited, so every symbol of seq1 meets every symbol of seq2
    let mut rows: HashMap<char, Vec<i64>> = HashMap::new();
    for &c in &s1 {
        if rows.contains_key(&c) {
            continue;
        }
        let row = alphabet
            .iter()
            .map(|&d| model.substitution(c, d).map(i64::from))
            .collect::<Result<Vec<_>, _>>()?;
        rows.insert(c, row);
    }

    let m = s2.len();
    let mut prev = vec![0i64; m + 1];
    for j in 1..=m {
        prev[j] = prev[j - 1] + gaps2[j - 1];
    }

    let mut cur = vec![0i64; m + 1];
    for (i, c) in s1.iter().enumerate() {
        let subs = &rows[c];
        cur[0] = prev[0] + gaps1[i];
        for j in 1..=m {
            let diag = prev[j - 1] + subs[cols[j - 1]];
            let up = prev[j] + gaps1[i];
            let left = cur[j - 1] + gaps2[j - 1];
            cur[j] = diag.max(up).max(left);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    i32::try_from(prev[m]).map_err(|_| AlignError::Overflow)
}

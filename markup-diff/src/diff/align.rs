//! Sibling alignment.
//!
//! A longest-common-subsequence alignment over a "matchable" predicate.
//! The predicate may be expensive (for elements it runs a recursive diff),
//! so it is evaluated once per index pair and the results are kept in the
//! table.

/// An aligned pair of sibling sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Alignment {
    /// Matched index pairs, increasing on both sides.
    pub pairs: Vec<(usize, usize)>,
}

/// One run of the alignment walk, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Consecutive indices only in the first sequence, then only in the
    /// second.
    Gap { removed: Vec<usize>, added: Vec<usize> },
    /// A matched pair.
    Pair(usize, usize),
}

impl Alignment {
    /// Returns the alignment as gaps and pairs in document order. Gaps are
    /// only emitted when non-empty.
    pub fn steps(&self, len_a: usize, len_b: usize) -> Vec<Step> {
        let mut steps = Vec::new();
        let (mut i, mut j) = (0, 0);
        let ends = self.pairs.iter().copied().chain(std::iter::once((len_a, len_b)));
        for (pi, pj) in ends {
            if i < pi || j < pj {
                steps.push(Step::Gap {
                    removed: (i..pi).collect(),
                    added: (j..pj).collect(),
                });
            }
            if pi < len_a && pj < len_b {
                steps.push(Step::Pair(pi, pj));
            }
            i = pi + 1;
            j = pj + 1;
        }
        steps
    }
}

/// Aligns two sequences of lengths `len_a` and `len_b`.
///
/// `matches(i, j)` decides whether element `i` of the first sequence may
/// pair with element `j` of the second. Among alignments of maximal length
/// the walk prefers the earliest pairs.
pub(crate) fn align<F>(len_a: usize, len_b: usize, mut matches: F) -> Alignment
where
    F: FnMut(usize, usize) -> bool,
{
    if len_a == 0 || len_b == 0 {
        return Alignment::default();
    }

    let width = len_b + 1;
    // lcs[i * width + j]: alignment length of a[i..] and b[j..]
    let mut lcs = vec![0u32; (len_a + 1) * width];
    let mut matched = vec![false; len_a * len_b];
    for i in (0..len_a).rev() {
        for j in (0..len_b).rev() {
            let hit = matches(i, j);
            matched[i * len_b + j] = hit;
            lcs[i * width + j] = if hit {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lcs[0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < len_a && j < len_b {
        if matched[i * len_b + j] && lcs[i * width + j] == lcs[(i + 1) * width + j + 1] + 1 {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    Alignment { pairs }
}

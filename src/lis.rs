//! C6: LISFilter — longest-increasing, scored chain selection over
//! overlapping alignments, ported from MUMmer `delta-filter`'s RLIS/QLIS.
//!
//! Grounded on `mummermethods.py::filter_aligns`/`updatebest`: a DP over
//! alignments sorted by low coordinate on the chosen axis, `used` alignments
//! removed, then re-run on the remainder until exhausted. We keep the
//! implemented (deterministic first-of-ties) behavior rather than the
//! original's un-implemented "pick a random index among ties" TODO — see
//! SPEC_FULL.md §2.

const SCORE_EPS: f64 = 1e-9;

/// One alignment's coordinates on the sort axis (`low`/`high`) and on the
/// complementary axis (`other_low`/`other_high`), used only for the `diff`
/// tie-break accumulator.
#[derive(Debug, Clone, Copy)]
pub struct LisCandidate {
    pub index: usize,
    pub low: i64,
    pub high: i64,
    pub other_low: i64,
    pub other_high: i64,
    pub identity: f64,
}

impl LisCandidate {
    pub fn len(&self) -> i64 {
        self.high - self.low + 1
    }

    pub fn score(&self) -> f64 {
        self.len() as f64 * self.identity * self.identity
    }
}

#[derive(Debug, Clone, Default)]
pub struct LisResult {
    /// Chains in extraction order (best chain first, then best of the
    /// remainder, and so on); each inner `Vec` is itself ordered by the sort
    /// axis.
    pub chains: Vec<Vec<usize>>,
}

impl LisResult {
    pub fn ordered_indices(&self) -> Vec<usize> {
        self.chains.iter().flatten().copied().collect()
    }

    pub fn total_score(&self, candidates: &[LisCandidate]) -> f64 {
        self.ordered_indices()
            .iter()
            .map(|&i| candidates[i].score())
            .sum()
    }
}

pub struct LISFilter {
    pub max_overlap: f64,
}

impl Default for LISFilter {
    fn default() -> Self {
        LISFilter { max_overlap: 0.95 }
    }
}

impl LISFilter {
    pub fn filter(&self, candidates: &[LisCandidate]) -> LisResult {
        let mut remaining: Vec<usize> = (0..candidates.len()).collect();
        let mut chains = Vec::new();
        while !remaining.is_empty() {
            let chain = self.best_chain(candidates, &remaining);
            if chain.is_empty() {
                break;
            }
            remaining.retain(|i| !chain.contains(i));
            chains.push(chain);
        }
        LisResult { chains }
    }

    fn best_chain(&self, candidates: &[LisCandidate], remaining: &[usize]) -> Vec<usize> {
        let mut order: Vec<usize> = remaining.to_vec();
        order.sort_by_key(|&i| candidates[i].low);
        let n = order.len();

        let mut score = vec![0.0f64; n];
        let mut diff = vec![0.0f64; n];
        let mut from: Vec<Option<usize>> = vec![None; n];

        for i in 0..n {
            let ci = &candidates[order[i]];
            let len_i = ci.len() as f64;
            let ident2 = ci.identity * ci.identity;
            score[i] = ci.score();
            diff[i] = 0.0;

            for j in 0..i {
                let cj = &candidates[order[j]];
                let overlap = (cj.high.min(ci.high) - ci.low.max(cj.low) + 1).max(0) as f64;
                let len_j = cj.len() as f64;
                let o = (overlap / len_i).max(overlap / len_j);
                if o > self.max_overlap {
                    continue;
                }
                let contribution = score[j] + (len_i - overlap) * ident2;
                let other_gap = (ci.other_low - cj.other_high).abs() as f64;
                let candidate_diff = diff[j] + other_gap;

                if contribution > score[i] + SCORE_EPS {
                    score[i] = contribution;
                    diff[i] = candidate_diff;
                    from[i] = Some(j);
                } else if (contribution - score[i]).abs() <= SCORE_EPS && candidate_diff < diff[i]
                {
                    diff[i] = candidate_diff;
                    from[i] = Some(j);
                }
            }
        }

        let mut best = 0usize;
        for i in 1..n {
            if score[i] > score[best] + SCORE_EPS {
                best = i;
            } else if (score[i] - score[best]).abs() <= SCORE_EPS && diff[i] < diff[best] {
                best = i;
            }
        }

        let mut chain_local = Vec::new();
        let mut cur = Some(best);
        while let Some(c) = cur {
            chain_local.push(order[c]);
            cur = from[c];
        }
        chain_local.reverse();
        chain_local
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn candidate(index: usize, low: i64, high: i64, score: f64) -> LisCandidate {
        let len = (high - low + 1) as f64;
        LisCandidate {
            index,
            low,
            high,
            other_low: low,
            other_high: high,
            identity: (score / len).sqrt(),
        }
    }

    #[test]
    fn s4_selects_ac_then_b() {
        let candidates = vec![
            candidate(0, 1, 100, 100.0),  // A
            candidate(1, 50, 80, 20.0),   // B
            candidate(2, 90, 160, 70.0),  // C
        ];
        let filter = LISFilter { max_overlap: 0.95 };
        let result = filter.filter(&candidates);
        assert_eq!(result.chains.len(), 2);
        assert_eq!(result.chains[0], vec![0, 2]);
        assert_eq!(result.chains[1], vec![1]);
        // Chain {A,C}'s score is A's own score plus C's non-overlapping
        // 60-base remainder (71-base length minus the 11-base overlap with
        // A) scored at C's own identity^2, not C's full single-alignment score.
        let a = &candidates[0];
        let c = &candidates[2];
        let overlap = 11.0;
        let expected = a.score() + (c.len() as f64 - overlap) * c.identity * c.identity;
        assert_relative_eq!(result.total_score(&candidates), expected, epsilon = SCORE_EPS);
    }

    #[test]
    fn chain_score_is_at_least_any_single_alignment_score() {
        let candidates = vec![
            candidate(0, 1, 100, 100.0),
            candidate(1, 50, 80, 20.0),
            candidate(2, 90, 160, 70.0),
        ];
        let filter = LISFilter::default();
        let result = filter.filter(&candidates);
        let total = result.total_score(&candidates);
        for c in &candidates {
            assert!(total + SCORE_EPS >= c.score());
        }
    }
}

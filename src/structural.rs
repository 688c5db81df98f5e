//! C9: StructuralReporter — classifies the join between two adjacent
//! alignments in an LIS chain as a structural event.
//!
//! Grounded on `structvar.py::write_structural_errors`: consecutive
//! alignments (sorted by `(target, targetstart, targetend)`) on the *same*
//! benchmark entry are joined as `SameContigInsertion`/`BetweenContigInsertion`
//! when the next alignment's ref start undercuts the previous one's ref end,
//! or as the matching `*Deletion` kind otherwise; same/between-contig turns on
//! whether the two alignments share a `query` (test contig), not a `target`
//! (the two are already equal by construction at this point). Pairs on
//! different benchmark entries are not joined at all, matching the original's
//! `refentry == current_align["target"]` guard.
//!
//! `mummermethods.py::find_diffs` layers two more join kinds on top, gated on
//! strand: a strand flip between consecutive same-contig alignments is an
//! `Inversion`; same strand but the query axis running backwards relative to
//! the reference is a `LisJump`. Both preempt the Insertion/Deletion decision
//! above, per spec.md §4.9's "additional join classes".

use strum_macros::{EnumIter, IntoStaticStr};

use crate::alignment::{Alignment, Strand};

/// `IntoStaticStr` backs `write_struct_variants_bed`'s class column the same
/// way `variants::model::VariantType` (`#[strum(serialize = "INS")]` etc.)
/// backs VCF `SVTYPE`/CLI value strings in the teacher; `EnumIter` lets
/// callers (and this module's own tests) enumerate every join kind the way
/// the teacher walks `VariantType::iter()` when building its CLI help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter)]
pub enum JoinKind {
    SameContigInsertion,
    BetweenContigInsertion,
    SameContigDeletion,
    BetweenContigDeletion,
    Inversion,
    #[strum(serialize = "LISJump")]
    LisJump,
}

#[derive(Debug, Clone, Copy)]
pub struct Join {
    pub kind: JoinKind,
    pub left_index: usize,
    pub right_index: usize,
    /// Signed gap on the reference axis between the left alignment's end and
    /// the right alignment's start; negative means overlap.
    pub ref_gap: i64,
    /// Signed gap on the query axis between the chain's two alignments.
    pub query_gap: i64,
}

pub struct StructuralReporter;

impl StructuralReporter {
    /// `chain` is a sequence of indices into `alignments`. Pairs that land on
    /// different benchmark entries produce no `Join` (matching the original's
    /// same-target guard), so the result may be shorter than `chain.len() - 1`.
    pub fn classify_chain(&self, chain: &[usize], alignments: &[Alignment]) -> Vec<Join> {
        use itertools::Itertools;

        chain
            .iter()
            .copied()
            .tuple_windows()
            .filter_map(|(left, right)| self.classify_join(left, right, alignments))
            .collect()
    }

    fn classify_join(
        &self,
        left_idx: usize,
        right_idx: usize,
        alignments: &[Alignment],
    ) -> Option<Join> {
        let a = &alignments[left_idx];
        let b = &alignments[right_idx];
        if a.rname != b.rname {
            return None;
        }

        let ref_gap = b.r_start as i64 - a.r_end as i64;
        let query_gap = b.q_start as i64 - a.q_end as i64;

        if a.strand != b.strand {
            return Some(Join {
                kind: JoinKind::Inversion,
                left_index: left_idx,
                right_index: right_idx,
                ref_gap,
                query_gap,
            });
        }

        let follows_monotonically = match a.strand {
            Strand::Forward => b.q_start as i64 >= a.q_end as i64,
            Strand::Reverse => b.q_start as i64 <= a.q_end as i64,
        };
        if !follows_monotonically {
            return Some(Join {
                kind: JoinKind::LisJump,
                left_index: left_idx,
                right_index: right_idx,
                ref_gap,
                query_gap,
            });
        }

        let same_contig = a.query == b.query;
        let kind = if b.r_start < a.r_end {
            if same_contig {
                JoinKind::SameContigInsertion
            } else {
                JoinKind::BetweenContigInsertion
            }
        } else if same_contig {
            JoinKind::SameContigDeletion
        } else {
            JoinKind::BetweenContigDeletion
        };

        Some(Join {
            kind,
            left_index: left_idx,
            right_index: right_idx,
            ref_gap,
            query_gap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{Cigar, CigarElem, CigarOp};

    fn aln(query: &str, rname: &str, strand: Strand, r_start: u32, r_end: u32, q_start: u32, q_end: u32) -> Alignment {
        Alignment {
            query: query.to_string(),
            query_len: q_end,
            q_start,
            q_end,
            rname: rname.to_string(),
            ref_len: r_end,
            r_start,
            r_end,
            strand,
            cigar: Cigar::new(vec![CigarElem {
                op: CigarOp::Equal,
                len: r_end - r_start + 1,
            }]),
            mapq: 60,
            flags: 0,
            query_bases: None,
            qual: None,
        }
    }

    #[test]
    fn ref_overlap_on_same_contig_is_insertion() {
        // b's ref start undercuts a's ref end: the test assembly carries
        // sequence the benchmark doesn't have room for at this join.
        let alignments = vec![
            aln("q1", "chr1", Strand::Forward, 1, 1000, 1, 1000),
            aln("q1", "chr1", Strand::Forward, 995, 2000, 1001, 2500),
        ];
        let reporter = StructuralReporter;
        let joins = reporter.classify_chain(&[0, 1], &alignments);
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].kind, JoinKind::SameContigInsertion);
    }

    #[test]
    fn ref_gap_on_same_contig_is_deletion() {
        let alignments = vec![
            aln("q1", "chr1", Strand::Forward, 1, 1000, 1, 1000),
            aln("q1", "chr1", Strand::Forward, 51000, 52000, 1001, 2000),
        ];
        let reporter = StructuralReporter;
        let joins = reporter.classify_chain(&[0, 1], &alignments);
        assert_eq!(joins[0].kind, JoinKind::SameContigDeletion);
    }

    #[test]
    fn different_query_at_same_ref_gap_is_between_contig() {
        let alignments = vec![
            aln("q1", "chr1", Strand::Forward, 1, 1000, 1, 1000),
            aln("q2", "chr1", Strand::Forward, 51000, 52000, 1, 1000),
        ];
        let reporter = StructuralReporter;
        let joins = reporter.classify_chain(&[0, 1], &alignments);
        assert_eq!(joins[0].kind, JoinKind::BetweenContigDeletion);
    }

    #[test]
    fn different_rname_pairs_produce_no_join() {
        let alignments = vec![
            aln("q1", "chr1", Strand::Forward, 1, 1000, 1, 1000),
            aln("q1", "chr2", Strand::Forward, 1, 1000, 1001, 2000),
        ];
        let reporter = StructuralReporter;
        let joins = reporter.classify_chain(&[0, 1], &alignments);
        assert!(joins.is_empty());
    }

    #[test]
    fn strand_flip_is_inversion() {
        let alignments = vec![
            aln("q1", "chr1", Strand::Forward, 1, 1000, 1, 1000),
            aln("q1", "chr1", Strand::Reverse, 1001, 2000, 1001, 2000),
        ];
        let reporter = StructuralReporter;
        let joins = reporter.classify_chain(&[0, 1], &alignments);
        assert_eq!(joins[0].kind, JoinKind::Inversion);
    }

    #[test]
    fn backslide_on_query_is_lis_jump() {
        let alignments = vec![
            aln("q1", "chr1", Strand::Forward, 1, 1000, 1000, 2000),
            aln("q1", "chr1", Strand::Forward, 1001, 2000, 1, 500),
        ];
        let reporter = StructuralReporter;
        let joins = reporter.classify_chain(&[0, 1], &alignments);
        assert_eq!(joins[0].kind, JoinKind::LisJump);
    }

    #[test]
    fn every_join_kind_has_a_static_label() {
        use strum::IntoEnumIterator;

        for kind in JoinKind::iter() {
            let label: &'static str = kind.into();
            assert!(!label.is_empty());
        }
    }
}

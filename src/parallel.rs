//! Per-benchmark-entry fan-out for C6 (LISFilter) and C7 (ClusterBuilder).
//!
//! Grounded on `cli.rs`'s `rayon::ThreadPoolBuilder::new().num_threads(..).build_global()`
//! entry point (the CLI layer picks the worker count; this crate only needs
//! the `par_iter` fan-out itself). Matches spec.md §5's concurrency model
//! directly: "C6/C7 are embarrassingly parallel across entries and share
//! only the immutable benchmark FASTA and exclude-mask"; within one entry all
//! mutation of that entry's cluster list happens on a single task, so the
//! parallel unit here is one whole entry's alignments, never a sub-slice of
//! them.

use rayon::prelude::*;

use crate::alignment::Alignment;
use crate::cluster::{rank_clusters, AlignCluster, ClusterBuilder, RankedCluster};
use crate::intervals::IntervalCollaborator;
use crate::lis::{LisCandidate, LisResult, LISFilter};

/// One benchmark entry's alignments, already grouped by the caller (e.g. by
/// `rname`), plus the per-entry exclude-mask and non-excluded length C7's
/// LCA95 ranking needs.
pub struct EntryWork<'a> {
    pub rname: String,
    pub alignments: &'a [Alignment],
    pub exclude_mask: &'a [(u64, u64)],
    pub non_excluded_bases: u64,
}

pub struct EntryResult {
    pub rname: String,
    pub lis: LisResult,
    pub clusters: Vec<RankedCluster>,
}

/// Runs C6 then C7 for each entry in `work` independently, fanning the
/// per-entry work out over rayon's global thread pool. `lis_candidates`
/// builds the LIS scoring input for one entry's alignments (the caller
/// already knows which axis — reference or query — it is filtering on);
/// `ops` is the shared, read-only interval collaborator C7's coverage ranking
/// calls into.
pub fn process_entries<'a, F>(
    work: &[EntryWork<'a>],
    lis_filter: &LISFilter,
    cluster_builder: &ClusterBuilder,
    lis_candidates: F,
    ops: &(dyn IntervalCollaborator + Sync),
) -> Vec<EntryResult>
where
    F: Fn(&[Alignment]) -> Vec<LisCandidate> + Sync,
{
    work.par_iter()
        .map(|entry| {
            let candidates = lis_candidates(entry.alignments);
            let lis = lis_filter.filter(&candidates);

            let clusters: Vec<AlignCluster> = cluster_builder.build(entry.alignments);
            let ranked = rank_clusters(
                clusters,
                entry.alignments,
                entry.exclude_mask,
                entry.non_excluded_bases,
                ops,
            );

            EntryResult {
                rname: entry.rname.clone(),
                lis,
                clusters: ranked,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{Cigar, CigarElem, CigarOp, Strand};
    use crate::intervals::SimpleIntervalOps;

    fn aln(query: &str, rname: &str, r_start: u32, r_end: u32, q_start: u32, q_end: u32) -> Alignment {
        Alignment {
            query: query.to_string(),
            query_len: q_end,
            q_start,
            q_end,
            rname: rname.to_string(),
            ref_len: r_end,
            r_start,
            r_end,
            strand: Strand::Forward,
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
    fn processes_independent_entries_and_preserves_per_entry_identity() {
        let chr1 = vec![aln("qA", "chr1", 1, 1000, 1, 1000)];
        let chr2 = vec![aln("qB", "chr2", 1, 500, 1, 500)];
        let work = vec![
            EntryWork {
                rname: "chr1".to_string(),
                alignments: &chr1,
                exclude_mask: &[],
                non_excluded_bases: 1000,
            },
            EntryWork {
                rname: "chr2".to_string(),
                alignments: &chr2,
                exclude_mask: &[],
                non_excluded_bases: 500,
            },
        ];
        let lis_filter = LISFilter::default();
        let cluster_builder = ClusterBuilder::default();
        let ops = SimpleIntervalOps;

        let results = process_entries(
            &work,
            &lis_filter,
            &cluster_builder,
            |alignments| {
                alignments
                    .iter()
                    .enumerate()
                    .map(|(i, a)| LisCandidate {
                        index: i,
                        low: a.r_start as i64,
                        high: a.r_end as i64,
                        other_low: a.q_start as i64,
                        other_high: a.q_end as i64,
                        identity: 1.0,
                    })
                    .collect()
            },
            &ops,
        );

        assert_eq!(results.len(), 2);
        let by_name: std::collections::HashMap<_, _> =
            results.iter().map(|r| (r.rname.clone(), r)).collect();
        assert_eq!(by_name["chr1"].clusters.len(), 1);
        assert_eq!(by_name["chr2"].clusters.len(), 1);
        assert_eq!(by_name["chr1"].lis.ordered_indices(), vec![0]);
    }
}

//! C7: ClusterBuilder — groups an entry's alignments into collinear
//! clusters and ranks them by non-excluded reference coverage (LCA95).
//!
//! Grounded on `alignparse.py::cluster_alignments`/`rank_clusters`: alignments
//! against the same query are provisionally one cluster, then a disjoint-gap
//! pass over `(rStart, rEnd)` spins off a new cluster whenever the next
//! alignment starts more than `maxClusterDistance` past the running-max
//! `rEnd` already seen. See DESIGN.md: we keep per-alignment slope/intercept
//! as descriptive statistics (useful to a caller distinguishing strand-
//! consistent diagonals) rather than as the merge predicate itself, since
//! spec.md's wording about "predicted position" coincides with the gap test
//! whenever slope ~= 1 and is otherwise underdetermined.

use ordered_float::NotNan;

use crate::alignment::Alignment;
use crate::intervals::IntervalCollaborator;

/// Descriptive statistics for one alignment's query-to-reference mapping,
/// used only for reporting; clustering itself groups by query and splits on
/// reference-axis gaps.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentLine {
    pub slope: NotNan<f64>,
    pub intercept: NotNan<f64>,
}

pub fn alignment_line(a: &Alignment) -> Option<AlignmentLine> {
    let q_span = a.q_end as f64 - a.q_start as f64;
    if q_span == 0.0 {
        return None;
    }
    let r_span = a.r_end as f64 - a.r_start as f64;
    let slope = r_span / q_span;
    let intercept = a.r_start as f64 - (slope * a.q_start as f64).floor();
    Some(AlignmentLine {
        slope: NotNan::new(slope).ok()?,
        intercept: NotNan::new(intercept).ok()?,
    })
}

#[derive(Debug, Clone)]
pub struct AlignCluster {
    pub query: String,
    pub rname: String,
    /// Indices into the `alignments` slice passed to `build`.
    pub members: Vec<usize>,
}

impl AlignCluster {
    pub fn r_span(&self, alignments: &[Alignment]) -> (u64, u64) {
        let lo = self
            .members
            .iter()
            .map(|&i| alignments[i].r_start as u64)
            .min()
            .unwrap_or(0);
        let hi = self
            .members
            .iter()
            .map(|&i| alignments[i].r_end as u64)
            .max()
            .unwrap_or(0);
        (lo, hi)
    }
}

pub struct ClusterBuilder {
    pub max_cluster_distance: u64,
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        ClusterBuilder {
            max_cluster_distance: 10_000,
        }
    }
}

impl ClusterBuilder {
    /// Groups by `(query, rname)`, then splits each group wherever a
    /// disjoint gap on the reference axis exceeds `max_cluster_distance`.
    pub fn build(&self, alignments: &[Alignment]) -> Vec<AlignCluster> {
        use std::collections::BTreeMap;

        let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for (i, a) in alignments.iter().enumerate() {
            groups
                .entry((a.query.clone(), a.rname.clone()))
                .or_default()
                .push(i);
        }

        let mut out = Vec::new();
        for ((query, rname), mut members) in groups {
            members.sort_by_key(|&i| (alignments[i].r_start, alignments[i].r_end));

            let mut running_max_r_end: Option<u32> = None;
            let mut current: Vec<usize> = Vec::new();
            for i in members {
                let a = &alignments[i];
                if let Some(max_end) = running_max_r_end {
                    let gap = (a.r_start as i64) - (max_end as i64);
                    if gap > self.max_cluster_distance as i64 {
                        out.push(AlignCluster {
                            query: query.clone(),
                            rname: rname.clone(),
                            members: std::mem::take(&mut current),
                        });
                    }
                }
                running_max_r_end = Some(running_max_r_end.map_or(a.r_end, |m| m.max(a.r_end)));
                current.push(i);
            }
            if !current.is_empty() {
                out.push(AlignCluster {
                    query,
                    rname,
                    members: current,
                });
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct RankedCluster {
    pub cluster: AlignCluster,
    pub covered_bases: u64,
    pub cumulative_fraction: f64,
    /// True for the minimal prefix of clusters (by descending coverage)
    /// whose cumulative coverage reaches 95% of the entry's non-excluded
    /// length; false for clusters past that point (`SmallCluster`s).
    pub lca95: bool,
}

/// Ranks clusters by how much of the entry's non-excluded reference they
/// cover, and flags the smallest leading subset reaching 95% coverage.
///
/// `exclude_mask` and `entry_non_excluded_bases` describe the same benchmark
/// entry every cluster in `clusters` belongs to.
pub fn rank_clusters(
    clusters: Vec<AlignCluster>,
    alignments: &[Alignment],
    exclude_mask: &[(u64, u64)],
    entry_non_excluded_bases: u64,
    ops: &dyn IntervalCollaborator,
) -> Vec<RankedCluster> {
    let mut with_coverage: Vec<(AlignCluster, u64)> = clusters
        .into_iter()
        .map(|c| {
            let ref_intervals: Vec<(u64, u64)> = c
                .members
                .iter()
                .map(|&i| {
                    let a = &alignments[i];
                    ((a.r_start as u64) - 1, a.r_end as u64)
                })
                .collect();
            let merged = ops.merge(&ref_intervals);
            let non_excluded = ops.subtract(&merged, exclude_mask);
            let covered = ops.total_len(&non_excluded);
            (c, covered)
        })
        .collect();

    with_coverage.sort_by(|a, b| b.1.cmp(&a.1));

    let mut cumulative = 0u64;
    let mut threshold_reached = false;
    with_coverage
        .into_iter()
        .map(|(cluster, covered_bases)| {
            cumulative += covered_bases;
            let fraction = if entry_non_excluded_bases > 0 {
                cumulative as f64 / entry_non_excluded_bases as f64
            } else {
                1.0
            };
            let lca95 = !threshold_reached;
            if fraction >= 0.95 {
                threshold_reached = true;
            }
            RankedCluster {
                cluster,
                covered_bases,
                cumulative_fraction: fraction,
                lca95,
            }
        })
        .collect()
}

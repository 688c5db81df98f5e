//! C8: IntervalProjector — projects a query-coordinate window back onto the
//! reference, returning the reference span and the CIGAR ops that cover it.
//!
//! Grounded on `alignparse.py::retrieve_ref_coords_and_cigars`, used when a
//! structural join (C9) needs to know, for one side of a breakpoint, which
//! reference interval and CIGAR ops a given stretch of query actually
//! touched. Walks the CIGAR once; no dependency on `CoordMapper`'s anchor
//! arrays since this only needs ops that overlap a query range, not a single
//! point lookup.
//!
//! A deletion straddling the window's edge but never actually joined to a
//! match run inside it (because the window starts or ends right at an
//! indel boundary) is a CIGAR-walk artifact, not real reference sequence the
//! window touched: deletions before the window's first matched base are
//! discarded outright, and a deletion after the last matched base is not
//! emitted into the returned CIGAR. The caller is also handed back a
//! consumed-query-bases check: if the emitted ops don't account for exactly
//! `q_hi - q_lo` query bases, the sub-alignment is dropped and the mismatch
//! recorded on `RunStats` rather than silently returning a malformed window.

use crate::alignment::{Alignment, Cigar, CigarElem, CigarOp};
use crate::cigar::{CigarEvent, CigarWalker};
use crate::stats::RunStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedInterval {
    /// 0-based offsets from the alignment's `r_start`.
    pub ref_start_offset: u32,
    pub ref_end_offset: u32,
    pub cigar: Cigar,
}

pub struct IntervalProjector<'a> {
    alignment: &'a Alignment,
}

impl<'a> IntervalProjector<'a> {
    pub fn new(alignment: &'a Alignment) -> Self {
        IntervalProjector { alignment }
    }

    /// `q_lo`/`q_hi` are 0-based, half-open query offsets from the
    /// alignment's stored-sequence start. Returns `None` when no CIGAR op
    /// overlaps the window (e.g. it falls entirely inside a hard clip), or
    /// when the window is dropped by the checks documented on this type.
    pub fn project_query_window(
        &self,
        q_lo: u32,
        q_hi: u32,
        stats: &mut RunStats,
    ) -> Option<ProjectedInterval> {
        if q_hi <= q_lo {
            return None;
        }
        let walker = CigarWalker::new(&self.alignment.cigar);
        let mut events = Vec::new();

        for event in walker {
            let (q_start, q_end, r_start, r_end, op) = match event {
                CigarEvent::MatchRun {
                    ref_offset,
                    query_offset,
                    len,
                    op,
                } => (
                    query_offset,
                    query_offset + len,
                    ref_offset,
                    ref_offset + len,
                    op,
                ),
                CigarEvent::Insert {
                    ref_offset,
                    query_offset,
                    len,
                } => (query_offset, query_offset + len, ref_offset, ref_offset, CigarOp::Ins),
                CigarEvent::Delete {
                    ref_offset,
                    query_offset,
                    len,
                } => (
                    query_offset,
                    query_offset,
                    ref_offset,
                    ref_offset + len,
                    CigarOp::Del,
                ),
                CigarEvent::RefSkip {
                    ref_offset,
                    query_offset,
                    len,
                } => (
                    query_offset,
                    query_offset,
                    ref_offset,
                    ref_offset + len,
                    CigarOp::RefSkip,
                ),
                CigarEvent::Clip { .. } => continue,
            };

            let overlaps = q_start < q_hi && q_end > q_lo;
            let touches_zero_width_at_boundary =
                q_start == q_end && q_start >= q_lo && q_start <= q_hi;
            if !overlaps && !touches_zero_width_at_boundary {
                continue;
            }
            events.push((q_start, q_end, r_start, r_end, op));
        }

        let first_match = events.iter().position(|e| e.4.is_match_like());
        let last_match = events.iter().rposition(|e| e.4.is_match_like());
        let (first_match, last_match) = match (first_match, last_match) {
            (Some(f), Some(l)) => (f, l),
            _ => {
                // No matched base in the window at all: fall back to
                // whatever indel/refskip events overlap it rather than
                // discarding everything, since there's no match run to
                // anchor "before"/"after" against.
                (0, events.len().saturating_sub(1))
            }
        };

        let mut ref_lo: Option<u32> = None;
        let mut ref_hi: Option<u32> = None;
        let mut ops = Vec::new();

        for (i, &(q_start, q_end, r_start, r_end, op)) in events.iter().enumerate() {
            let is_bare_deletion = op == CigarOp::Del || op == CigarOp::RefSkip;
            if is_bare_deletion && (i < first_match || i > last_match) {
                continue;
            }

            // Match runs consume ref 1:1 with query, so only the slice of
            // the run actually inside [q_lo, q_hi) belongs to this window;
            // indels are atomic (zero-width on one axis) and are taken whole.
            let (r_start, r_end) = if op.is_match_like() {
                let clip_lo = q_start.max(q_lo);
                let clip_hi = q_end.min(q_hi);
                (r_start + (clip_lo - q_start), r_start + (clip_hi - q_start))
            } else {
                (r_start, r_end)
            };

            ref_lo = Some(ref_lo.map_or(r_start, |v| v.min(r_start)));
            ref_hi = Some(ref_hi.map_or(r_end, |v| v.max(r_end)));

            // Match runs were already clipped to the window above, so their
            // ref span length doubles as their (equal) query span length.
            // Pure-ref ops (Del/RefSkip) keep their own ref span as the
            // element length; pure-query ops (Ins) keep their full query
            // span since an insertion can't be partially consumed.
            let elem_len = if op.is_match_like() || !op.consumes_query() {
                r_end - r_start
            } else {
                q_end.saturating_sub(q_start)
            };
            let consumed = elem_len;
            if consumed > 0 {
                ops.push(CigarElem { op, len: consumed });
            }
        }

        let (ref_lo, ref_hi) = match (ref_lo, ref_hi) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return None,
        };

        let cigar = Cigar::new(ops);
        let consumed_query_bases = cigar.stored_seq_len();
        if consumed_query_bases as u64 != (q_hi - q_lo) as u64 {
            stats.record_coord_window_out_of_range();
            stats.record_sub_alignment_dropped();
            return None;
        }

        Some(ProjectedInterval {
            ref_start_offset: ref_lo,
            ref_end_offset: ref_hi,
            cigar,
        })
    }
}

//! C1: coordinate mapping between benchmark (reference) and test (query)
//! space for a single alignment.
//!
//! Grounded on `errors.py::find_readpos_in_pairs`, which binary-searches a
//! pysam `get_aligned_pairs()`-style list with a `lastimid` sentinel to avoid
//! looping forever on runs of insertion-only tuples. We keep that search (and
//! its guard) for the sparse `aligned_pairs` view, but `CoordMapper::build`
//! also derives two dense anchor arrays in the same single CIGAR pass so that
//! repeated lookups (e.g. every het site in C4) don't re-walk or re-search.

use crate::alignment::Alignment;
use crate::cigar::{CigarEvent, CigarWalker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedPair {
    pub ref_off: Option<u32>,
    pub query_off: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPosPolicy {
    /// D/N misses resolve to the left-adjacent (already consumed) query offset.
    Lower,
    /// D/N misses resolve to the right-adjacent (not yet consumed) query offset.
    Higher,
}

#[derive(Debug, Clone)]
pub struct CoordMapper {
    r_start: u32,
    /// `query_offsets_lower[i]` / `query_offsets_higher[i]` are valid for
    /// `i` in `0..=ref_aligned_len`; the one-past-the-end slot lets callers
    /// with an off-by-one endpoint (the hetEnd+2 case in C4) probe safely.
    query_offsets_lower: Vec<u32>,
    query_offsets_higher: Vec<u32>,
    aligned_pairs: Vec<AlignedPair>,
}

impl CoordMapper {
    pub fn build(alignment: &Alignment) -> Self {
        let ref_len = alignment.ref_aligned_len() as usize;
        let mut known: Vec<Option<u32>> = vec![None; ref_len + 1];
        let mut aligned_pairs = Vec::new();

        for event in CigarWalker::new(&alignment.cigar) {
            match event {
                CigarEvent::MatchRun {
                    ref_offset,
                    query_offset,
                    len,
                    ..
                } => {
                    for k in 0..len {
                        let r = (ref_offset + k) as usize;
                        let q = query_offset + k;
                        known[r] = Some(q);
                        aligned_pairs.push(AlignedPair {
                            ref_off: Some(ref_offset + k),
                            query_off: Some(q),
                        });
                    }
                }
                CigarEvent::Delete { ref_offset, len, .. } | CigarEvent::RefSkip { ref_offset, len, .. } => {
                    for k in 0..len {
                        aligned_pairs.push(AlignedPair {
                            ref_off: Some(ref_offset + k),
                            query_off: None,
                        });
                    }
                }
                CigarEvent::Insert { query_offset, len, .. } => {
                    for k in 0..len {
                        aligned_pairs.push(AlignedPair {
                            ref_off: None,
                            query_off: Some(query_offset + k),
                        });
                    }
                }
                CigarEvent::Clip { .. } => {}
            }
        }

        let mut query_offsets_lower = vec![0u32; ref_len + 1];
        let mut running = 0u32;
        for i in 0..=ref_len {
            if let Some(q) = known[i] {
                running = q;
            }
            query_offsets_lower[i] = running;
        }

        let mut query_offsets_higher = vec![0u32; ref_len + 1];
        running = query_offsets_lower[ref_len];
        for i in (0..=ref_len).rev() {
            if let Some(q) = known[i] {
                running = q;
            }
            query_offsets_higher[i] = running;
        }

        CoordMapper {
            r_start: alignment.r_start,
            query_offsets_lower,
            query_offsets_higher,
            aligned_pairs,
        }
    }

    fn last_index(&self) -> usize {
        self.query_offsets_lower.len() - 1
    }

    /// Direct array lookup: `ref_offset` is 0-based, relative to the
    /// alignment's aligned reference start. Saturates at the last known
    /// index rather than panicking, so hetEnd+2-style probes stay in bounds.
    pub fn query_offset_at(&self, ref_offset: u32, policy: QueryPosPolicy) -> u32 {
        let idx = (ref_offset as usize).min(self.last_index());
        match policy {
            QueryPosPolicy::Lower => self.query_offsets_lower[idx],
            QueryPosPolicy::Higher => self.query_offsets_higher[idx],
        }
    }

    /// Absolute-coordinate lookup mirroring pysam's aligned-pairs search:
    /// binary-searches the sparse `aligned_pairs` list for `ref_coord`,
    /// falling back to the dense anchor arrays to resolve D/N/insertion
    /// misses per `policy`.
    pub fn ref_pos_to_query_pos(&self, ref_coord: u32, policy: QueryPosPolicy) -> Option<u32> {
        let target = ref_coord.checked_sub(self.r_start)?;
        if target as usize >= self.query_offsets_lower.len() {
            return None;
        }

        let pairs = &self.aligned_pairs;
        if pairs.is_empty() {
            return None;
        }

        let mut lo = 0usize;
        let mut hi = pairs.len() - 1;
        let mut last_mid: Option<usize> = None;
        loop {
            if lo >= hi {
                break;
            }
            let mid = lo + (hi - lo) / 2;
            if last_mid == Some(mid) {
                // Guard against failing to converge on a run of
                // insertion-only tuples; resolve via linear scan below.
                break;
            }
            last_mid = Some(mid);
            match pairs[mid].ref_off {
                Some(r) if r == target => {
                    lo = mid;
                    hi = mid;
                    break;
                }
                Some(r) if r < target => lo = mid,
                Some(_) => hi = mid,
                None => match policy {
                    QueryPosPolicy::Lower => hi = mid,
                    QueryPosPolicy::Higher => lo = mid,
                },
            }
        }

        for i in lo..=hi {
            if pairs[i].ref_off == Some(target) {
                if let Some(q) = pairs[i].query_off {
                    return Some(q);
                }
                return Some(self.query_offset_at(target, policy));
            }
        }

        Some(self.query_offset_at(target, policy))
    }

    pub fn aligned_pairs(&self) -> &[AlignedPair] {
        &self.aligned_pairs
    }
}

//! Single-pass CIGAR traversal.
//!
//! `CigarWalker` is the one place that turns a `Cigar` into a stream of
//! offset-annotated events; `CoordMapper` (coords.rs), `VariantExtractor`
//! (variants.rs) and `AlignSplitter` (split.rs) are all built on top of it
//! rather than re-walking the CIGAR themselves.

use crate::alignment::{Cigar, CigarOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarEvent {
    /// A run of M/=/X ops, offsets relative to the alignment's aligned start
    /// on each side (0-based).
    MatchRun {
        ref_offset: u32,
        query_offset: u32,
        len: u32,
        op: CigarOp,
    },
    /// `ref_offset` is the running reference offset at the time of the
    /// insertion (reference does not advance across it, but callers widening
    /// an indel need the companion coordinate).
    Insert { ref_offset: u32, query_offset: u32, len: u32 },
    /// `query_offset` is the running query offset at the time of the
    /// deletion (query does not advance across it).
    Delete { ref_offset: u32, query_offset: u32, len: u32 },
    RefSkip { ref_offset: u32, query_offset: u32, len: u32 },
    Clip { len: u32, hard: bool },
}

pub struct CigarWalker<'a> {
    ops: std::slice::Iter<'a, crate::alignment::CigarElem>,
    ref_offset: u32,
    query_offset: u32,
}

impl<'a> CigarWalker<'a> {
    pub fn new(cigar: &'a Cigar) -> Self {
        CigarWalker {
            ops: cigar.iter(),
            ref_offset: 0,
            query_offset: 0,
        }
    }
}

impl<'a> Iterator for CigarWalker<'a> {
    type Item = CigarEvent;

    fn next(&mut self) -> Option<CigarEvent> {
        let elem = self.ops.next()?;
        let event = match elem.op {
            CigarOp::Match | CigarOp::Equal | CigarOp::Diff => CigarEvent::MatchRun {
                ref_offset: self.ref_offset,
                query_offset: self.query_offset,
                len: elem.len,
                op: elem.op,
            },
            CigarOp::Ins => CigarEvent::Insert {
                ref_offset: self.ref_offset,
                query_offset: self.query_offset,
                len: elem.len,
            },
            CigarOp::Del => CigarEvent::Delete {
                ref_offset: self.ref_offset,
                query_offset: self.query_offset,
                len: elem.len,
            },
            CigarOp::RefSkip => CigarEvent::RefSkip {
                ref_offset: self.ref_offset,
                query_offset: self.query_offset,
                len: elem.len,
            },
            CigarOp::SoftClip => CigarEvent::Clip {
                len: elem.len,
                hard: false,
            },
            CigarOp::HardClip => CigarEvent::Clip {
                len: elem.len,
                hard: true,
            },
        };
        if elem.op.consumes_ref() {
            self.ref_offset += elem.len;
        }
        if elem.op.consumes_query() {
            self.query_offset += elem.len;
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::CigarElem;

    fn elem(op: CigarOp, len: u32) -> CigarElem {
        CigarElem { op, len }
    }

    #[test]
    fn walks_simple_match() {
        let cigar = Cigar::new(vec![elem(CigarOp::Match, 10)]);
        let events: Vec<_> = CigarWalker::new(&cigar).collect();
        assert_eq!(
            events,
            vec![CigarEvent::MatchRun {
                ref_offset: 0,
                query_offset: 0,
                len: 10,
                op: CigarOp::Match,
            }]
        );
    }

    #[test]
    fn tracks_offsets_across_indels() {
        let cigar = Cigar::new(vec![
            elem(CigarOp::SoftClip, 3),
            elem(CigarOp::Match, 5),
            elem(CigarOp::Ins, 2),
            elem(CigarOp::Match, 4),
            elem(CigarOp::Del, 3),
            elem(CigarOp::Match, 6),
        ]);
        let events: Vec<_> = CigarWalker::new(&cigar).collect();
        assert_eq!(
            events,
            vec![
                CigarEvent::Clip { len: 3, hard: false },
                CigarEvent::MatchRun {
                    ref_offset: 0,
                    query_offset: 0,
                    len: 5,
                    op: CigarOp::Match,
                },
                CigarEvent::Insert { ref_offset: 5, query_offset: 5, len: 2 },
                CigarEvent::MatchRun {
                    ref_offset: 5,
                    query_offset: 7,
                    len: 4,
                    op: CigarOp::Match,
                },
                CigarEvent::Delete { ref_offset: 9, query_offset: 11, len: 3 },
                CigarEvent::MatchRun {
                    ref_offset: 12,
                    query_offset: 11,
                    len: 6,
                    op: CigarOp::Match,
                },
            ]
        );
    }
}

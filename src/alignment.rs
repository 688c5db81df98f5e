//! The internal alignment data model.
//!
//! Every producer (BAM, PAF) converges on this representation so the rest of
//! the crate never has to branch on where an alignment came from.

use std::fmt;

use rust_htslib::bam::record::Cigar as HtsCigar;

use crate::errors::{Error, Result};

pub const FLAG_PAIRED: u16 = 0x1;
pub const FLAG_REVERSE: u16 = 0x10;
pub const FLAG_SECONDARY: u16 = 0x100;
pub const FLAG_SUPPLEMENTARY: u16 = 0x800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// The eight CIGAR operations the SAM spec defines (`P` is folded into
/// malformed-alignment rejection: assembly-to-reference alignments never
/// legitimately pad).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    Match,
    Ins,
    Del,
    RefSkip,
    SoftClip,
    HardClip,
    Equal,
    Diff,
}

impl CigarOp {
    pub fn consumes_ref(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Del | CigarOp::RefSkip | CigarOp::Equal | CigarOp::Diff
        )
    }

    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Ins | CigarOp::Equal | CigarOp::Diff
        )
    }

    /// Whether this op occupies a slot in the record's stored SEQ/QUAL arrays.
    pub fn consumes_stored_seq(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Ins | CigarOp::SoftClip | CigarOp::Equal | CigarOp::Diff
        )
    }

    pub fn is_match_like(self) -> bool {
        matches!(self, CigarOp::Match | CigarOp::Equal | CigarOp::Diff)
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            CigarOp::Match => 'M',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
            CigarOp::RefSkip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Equal => '=',
            CigarOp::Diff => 'X',
        };
        write!(f, "{}", c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarElem {
    pub op: CigarOp,
    pub len: u32,
}

impl fmt::Display for CigarElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.op)
    }
}

impl TryFrom<&HtsCigar> for CigarElem {
    type Error = Error;

    fn try_from(c: &HtsCigar) -> Result<Self> {
        let (op, len) = match *c {
            HtsCigar::Match(l) => (CigarOp::Match, l),
            HtsCigar::Ins(l) => (CigarOp::Ins, l),
            HtsCigar::Del(l) => (CigarOp::Del, l),
            HtsCigar::RefSkip(l) => (CigarOp::RefSkip, l),
            HtsCigar::SoftClip(l) => (CigarOp::SoftClip, l),
            HtsCigar::HardClip(l) => (CigarOp::HardClip, l),
            HtsCigar::Equal(l) => (CigarOp::Equal, l),
            HtsCigar::Diff(l) => (CigarOp::Diff, l),
            HtsCigar::Pad(_) => {
                return Err(Error::UnsupportedCigarOp {
                    op: "P".to_string(),
                });
            }
        };
        Ok(CigarElem { op, len })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cigar(pub Vec<CigarElem>);

impl Cigar {
    pub fn new(ops: Vec<CigarElem>) -> Self {
        Cigar(ops)
    }

    /// A single all-match run, used for PAF records that carry no `cg:Z:` tag.
    pub fn all_match(len: u32) -> Self {
        Cigar(vec![CigarElem {
            op: CigarOp::Match,
            len,
        }])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CigarElem> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ref_len(&self) -> u32 {
        self.0
            .iter()
            .filter(|e| e.op.consumes_ref())
            .map(|e| e.len)
            .sum()
    }

    /// Number of SEQ/QUAL array slots the record consumes (property 1 of the
    /// testable properties: M + I + S + `=` + X must equal the stored sequence
    /// length).
    pub fn stored_seq_len(&self) -> u32 {
        self.0
            .iter()
            .filter(|e| e.op.consumes_stored_seq())
            .map(|e| e.len)
            .sum()
    }

    pub fn leading_clip(&self, hard: bool) -> u32 {
        self.0
            .first()
            .filter(|e| {
                e.op == if hard {
                    CigarOp::HardClip
                } else {
                    CigarOp::SoftClip
                }
            })
            .map(|e| e.len)
            .unwrap_or(0)
    }

    pub fn trailing_clip(&self, hard: bool) -> u32 {
        self.0
            .last()
            .filter(|e| {
                e.op == if hard {
                    CigarOp::HardClip
                } else {
                    CigarOp::SoftClip
                }
            })
            .map(|e| e.len)
            .unwrap_or(0)
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "*");
        }
        for e in &self.0 {
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl TryFrom<&[HtsCigar]> for Cigar {
    type Error = Error;

    fn try_from(ops: &[HtsCigar]) -> Result<Self> {
        let elems = ops
            .iter()
            .map(CigarElem::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Cigar(elems))
    }
}

/// One alignment record, already normalized to 1-based inclusive coordinates
/// on both sides regardless of source format.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub query: String,
    pub query_len: u32,
    /// Leftmost aligned query offset in read orientation (1-based, inclusive).
    pub q_start: u32,
    pub q_end: u32,
    pub rname: String,
    pub ref_len: u32,
    pub r_start: u32,
    pub r_end: u32,
    pub strand: Strand,
    pub cigar: Cigar,
    pub mapq: u8,
    pub flags: u16,
    pub query_bases: Option<Vec<u8>>,
    pub qual: Option<Vec<u8>>,
}

impl Alignment {
    pub fn is_secondary(&self) -> bool {
        self.flags & FLAG_SECONDARY != 0
    }

    pub fn is_supplementary(&self) -> bool {
        self.flags & FLAG_SUPPLEMENTARY != 0
    }

    pub fn is_primary(&self) -> bool {
        !self.is_secondary() && !self.is_supplementary()
    }

    pub fn ref_aligned_len(&self) -> u32 {
        self.r_end - self.r_start + 1
    }

    pub fn query_aligned_len(&self) -> u32 {
        self.q_end - self.q_start + 1
    }

    /// Validates property 1 (stored-sequence length vs. CIGAR-consumed length)
    /// and the CIGAR/ref-span relationship; called by producers before an
    /// alignment is handed to downstream components.
    pub fn validate(&self) -> Result<()> {
        if self.cigar.ref_len() != self.ref_aligned_len() {
            return Err(Error::MalformedAlignment {
                query: self.query.clone(),
                reason: format!(
                    "cigar reference span {} does not match rStart/rEnd span {}",
                    self.cigar.ref_len(),
                    self.ref_aligned_len()
                ),
            });
        }
        if let Some(bases) = &self.query_bases {
            let stored = self.cigar.stored_seq_len();
            if stored != bases.len() as u32 {
                return Err(Error::QueryLengthMismatch {
                    query: self.query.clone(),
                    consumed: stored,
                    declared: bases.len() as u32,
                });
            }
        }
        Ok(())
    }
}

//! C3: VariantExtractor — turns CIGAR events into normalized SNV/INDEL
//! records with quality histograms.
//!
//! Grounded on `alignparse.py::align_variants`: per-op widening bounded by
//! the whole aligned block (not just the current op), N-exclusion on both
//! alleles plus a one-base flank, and the "drop the larger of the middle
//! pair" even-count median rule (see DESIGN.md).

use crate::alignment::{Alignment, Strand};
use crate::cigar::{CigarEvent, CigarWalker};
use crate::stats::RunStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Snv,
    Indel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
    pub kind: VariantKind,
    pub excluded: bool,
    pub qv: Option<u32>,
}

impl Variant {
    /// Decodes `name` back into `(query, query_pos, ref_allele, alt_allele, strand)`,
    /// exercised by testable property 4 (name round-trips the call).
    pub fn decode_name(&self) -> Option<(String, i64, String, String, Strand)> {
        let mut parts = self.name.rsplitn(4, '_');
        let strand_s = parts.next()?;
        let alt = parts.next()?;
        let refa = parts.next()?;
        let rest = parts.next()?;
        let (query, pos_s) = rest.rsplit_once('_')?;
        let pos: i64 = pos_s.parse().ok()?;
        let strand = match strand_s {
            "F" => Strand::Forward,
            "R" => Strand::Reverse,
            _ => return None,
        };
        Some((
            query.to_string(),
            pos,
            refa.to_string(),
            alt.to_string(),
            strand,
        ))
    }
}

#[derive(Debug, Default, Clone)]
pub struct QualHist {
    counts: [u64; 256],
}

impl QualHist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, qual: u8) {
        self.counts[qual as usize] += 1;
    }

    pub fn count(&self, qual: u8) -> u64 {
        self.counts[qual as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

fn median_drop_larger(mut quals: Vec<u8>) -> Option<u32> {
    if quals.is_empty() {
        return None;
    }
    quals.sort_unstable();
    if quals.len() % 2 == 0 {
        quals.pop();
    }
    Some(quals[quals.len() / 2] as u32)
}

fn contains_n(bytes: &[u8]) -> bool {
    bytes.iter().any(|&b| b == b'N' || b == b'n')
}

/// The window itself, plus one base either side in `seq`.
fn window_or_flank_has_n(seq: &[u8], start: usize, end: usize) -> bool {
    if start > end || end > seq.len() {
        return true;
    }
    if contains_n(&seq[start..end]) {
        return true;
    }
    if start > 0 && seq[start - 1].eq_ignore_ascii_case(&b'N') {
        return true;
    }
    if end < seq.len() && seq[end].eq_ignore_ascii_case(&b'N') {
        return true;
    }
    false
}

fn to_ascii_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

pub struct VariantExtractor<'a> {
    alignment: &'a Alignment,
    ref_seq: &'a [u8],
    query_core: &'a [u8],
    qual_core: Option<&'a [u8]>,
    pub snv_error_qual_hist: QualHist,
    pub aligned_qual_hist: QualHist,
}

impl<'a> VariantExtractor<'a> {
    /// `ref_seq` covers `alignment.r_start..=alignment.r_end` (uppercase).
    /// `query_core` and `qual_core` cover only the CIGAR-aligned query span
    /// (leading/trailing S/H clips already stripped, matching the offsets
    /// `CigarWalker` reports).
    pub fn new(
        alignment: &'a Alignment,
        ref_seq: &'a [u8],
        query_core: &'a [u8],
        qual_core: Option<&'a [u8]>,
    ) -> Self {
        VariantExtractor {
            alignment,
            ref_seq,
            query_core,
            qual_core,
            snv_error_qual_hist: QualHist::new(),
            aligned_qual_hist: QualHist::new(),
        }
    }

    fn query_original_pos(&self, query_offset: i64) -> i64 {
        match self.alignment.strand {
            Strand::Forward => self.alignment.q_start as i64 + query_offset,
            Strand::Reverse => self.alignment.q_end as i64 - query_offset,
        }
    }

    fn qual_at(&self, query_offset: usize) -> Option<u8> {
        self.qual_core.and_then(|q| q.get(query_offset).copied())
    }

    pub fn extract(&mut self, stats: &mut RunStats) -> Vec<Variant> {
        let mut variants = Vec::new();
        for event in CigarWalker::new(&self.alignment.cigar) {
            match event {
                CigarEvent::MatchRun {
                    ref_offset,
                    query_offset,
                    len,
                    ..
                } => self.extract_match_run(ref_offset, query_offset, len, &mut variants),
                CigarEvent::Delete {
                    ref_offset,
                    query_offset,
                    len,
                } => self.extract_deletion(ref_offset, query_offset, len, stats, &mut variants),
                CigarEvent::Insert {
                    ref_offset,
                    query_offset,
                    len,
                } => self.extract_insertion(ref_offset, query_offset, len, stats, &mut variants),
                CigarEvent::RefSkip { .. } | CigarEvent::Clip { .. } => {}
            }
        }
        variants
    }

    fn extract_match_run(
        &mut self,
        ref_offset: u32,
        query_offset: u32,
        len: u32,
        variants: &mut Vec<Variant>,
    ) {
        for k in 0..len {
            let r = (ref_offset + k) as usize;
            let q = (query_offset + k) as usize;
            let rb = self.ref_seq[r];
            let qb = self.query_core[q];
            if let Some(qual) = self.qual_at(q) {
                self.aligned_qual_hist.add(qual);
            }
            if rb.eq_ignore_ascii_case(&b'N') || qb.eq_ignore_ascii_case(&b'N') {
                continue;
            }
            if rb.to_ascii_uppercase() == qb.to_ascii_uppercase() {
                continue;
            }
            if let Some(qual) = self.qual_at(q) {
                self.snv_error_qual_hist.add(qual);
            }
            let start = (self.alignment.r_start as u64 - 1) + r as u64;
            let query_pos = self.query_original_pos(q as i64);
            let name = format!(
                "{}_{}_{}_{}_{}",
                self.alignment.query,
                query_pos,
                rb.to_ascii_uppercase() as char,
                qb.to_ascii_uppercase() as char,
                strand_char(self.alignment.strand),
            );
            variants.push(Variant {
                chrom: self.alignment.rname.clone(),
                start,
                end: start + 1,
                name,
                kind: VariantKind::Snv,
                excluded: false,
                qv: self.qual_at(q).map(|q| q as u32),
            });
        }
    }

    fn extract_deletion(
        &mut self,
        ref_offset: u32,
        query_offset: u32,
        op_len: u32,
        stats: &mut RunStats,
        variants: &mut Vec<Variant>,
    ) {
        let ref_bound = self.ref_seq.len();
        let query_bound = self.query_core.len();
        let ref_offset = ref_offset as usize;
        let query_offset = query_offset as usize;
        let op_len = op_len as usize;

        let mut extend_right = 0usize;
        while ref_offset + op_len + extend_right < ref_bound
            && query_offset + extend_right < query_bound
            && self.ref_seq[ref_offset + extend_right].to_ascii_uppercase()
                == self.query_core[query_offset + extend_right].to_ascii_uppercase()
        {
            extend_right += 1;
        }
        let mut extend_left = 0usize;
        while ref_offset >= extend_left + 1
            && query_offset >= extend_left + 1
            && self.ref_seq[ref_offset + op_len - 1 - extend_left].to_ascii_uppercase()
                == self.query_core[query_offset - 1 - extend_left].to_ascii_uppercase()
        {
            extend_left += 1;
        }

        let ref_win_start = ref_offset - extend_left;
        let ref_win_end = ref_offset + op_len + extend_right;
        let query_win_start = query_offset - extend_left;
        let query_win_end = query_offset + extend_right;

        if window_or_flank_has_n(self.ref_seq, ref_win_start, ref_win_end)
            || window_or_flank_has_n(self.query_core, query_win_start, query_win_end)
        {
            stats.record_n_excluded_variant();
            return;
        }

        let ref_allele = to_ascii_string(&self.ref_seq[ref_win_start..ref_win_end]).to_uppercase();
        let alt_allele = if extend_left == 0 && extend_right == 0 {
            "*".to_string()
        } else {
            to_ascii_string(&self.query_core[query_win_start..query_win_end]).to_uppercase()
        };

        let quals: Vec<u8> = (query_win_start..query_win_end)
            .filter_map(|q| self.qual_at(q))
            .collect();
        let qv = if quals.is_empty() {
            stats.record_empty_quality_window();
            None
        } else {
            median_drop_larger(quals)
        };

        let start = (self.alignment.r_start as u64 - 1) + ref_win_start as u64;
        let end = (self.alignment.r_start as u64 - 1) + ref_win_end as u64;
        let query_pos = match self.alignment.strand {
            Strand::Forward => self.alignment.q_start as i64 + query_offset as i64 - extend_left as i64,
            Strand::Reverse => self.alignment.q_end as i64 - query_offset as i64 - extend_right as i64,
        };
        let name = format!(
            "{}_{}_{}_{}_{}",
            self.alignment.query,
            query_pos,
            ref_allele,
            alt_allele,
            strand_char(self.alignment.strand),
        );
        variants.push(Variant {
            chrom: self.alignment.rname.clone(),
            start,
            end,
            name,
            kind: VariantKind::Indel,
            excluded: false,
            qv,
        });
    }

    fn extract_insertion(
        &mut self,
        ref_offset: u32,
        query_offset: u32,
        op_len: u32,
        stats: &mut RunStats,
        variants: &mut Vec<Variant>,
    ) {
        let ref_bound = self.ref_seq.len();
        let query_bound = self.query_core.len();
        let ref_offset = ref_offset as usize;
        let query_offset = query_offset as usize;
        let op_len = op_len as usize;

        let mut extend_right = 0usize;
        while query_offset + op_len + extend_right < query_bound
            && ref_offset + extend_right < ref_bound
            && self.query_core[query_offset + extend_right].to_ascii_uppercase()
                == self.ref_seq[ref_offset + extend_right].to_ascii_uppercase()
        {
            extend_right += 1;
        }
        let mut extend_left = 0usize;
        while query_offset >= extend_left + 1
            && ref_offset >= extend_left + 1
            && self.query_core[query_offset + op_len - 1 - extend_left].to_ascii_uppercase()
                == self.ref_seq[ref_offset - 1 - extend_left].to_ascii_uppercase()
        {
            extend_left += 1;
        }

        let ref_win_start = ref_offset - extend_left;
        let ref_win_end = ref_offset + extend_right;
        let query_win_start = query_offset - extend_left;
        let query_win_end = query_offset + op_len + extend_right;

        if window_or_flank_has_n(self.ref_seq, ref_win_start, ref_win_end)
            || window_or_flank_has_n(self.query_core, query_win_start, query_win_end)
        {
            stats.record_n_excluded_variant();
            return;
        }

        let alt_allele =
            to_ascii_string(&self.query_core[query_win_start..query_win_end]).to_uppercase();
        let ref_allele = if extend_left == 0 && extend_right == 0 {
            "*".to_string()
        } else {
            to_ascii_string(&self.ref_seq[ref_win_start..ref_win_end]).to_uppercase()
        };

        let quals: Vec<u8> = (query_win_start..query_win_end)
            .filter_map(|q| self.qual_at(q))
            .collect();
        let qv = if quals.is_empty() {
            stats.record_empty_quality_window();
            None
        } else {
            median_drop_larger(quals)
        };

        // Insertions are zero-width on the benchmark before widening.
        let start = (self.alignment.r_start as u64 - 1) + ref_win_start as u64;
        let end = (self.alignment.r_start as u64 - 1) + ref_win_end as u64;
        // Open Question (a): only the leftmost original-sequence position is
        // exposed; we do not compute or expose a `queryCoordEnd`.
        let query_pos = match self.alignment.strand {
            Strand::Forward => self.alignment.q_start as i64 + query_offset as i64 - extend_left as i64,
            Strand::Reverse => self.alignment.q_end as i64 - query_offset as i64 - extend_left as i64,
        };
        let name = format!(
            "{}_{}_{}_{}_{}",
            self.alignment.query,
            query_pos,
            ref_allele,
            alt_allele,
            strand_char(self.alignment.strand),
        );
        variants.push(Variant {
            chrom: self.alignment.rname.clone(),
            start,
            end,
            name,
            kind: VariantKind::Indel,
            excluded: false,
            qv,
        });
    }
}

fn strand_char(strand: Strand) -> char {
    match strand {
        Strand::Forward => 'F',
        Strand::Reverse => 'R',
    }
}

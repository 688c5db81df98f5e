//! Alignment producers: BAM and PAF readers that converge on `Alignment`.
//!
//! Grounded on the BAM-reading shape in `model/sample.rs`/`testcase.rs`
//! (`rust_htslib::bam::Reader`, `record.cigar()`, `record.seq().as_bytes()`)
//! and on `alignparse.py`'s PAF line parser for the `cg:Z:` CIGAR tag and the
//! strand convention described in SPEC_FULL.md §2: PAF query start/end are
//! always given on the query's native forward strand, so they drop straight
//! into `Alignment::q_start`/`q_end` without a strand-dependent swap — the
//! same convention this crate's `CoordMapper`/`VariantExtractor` already
//! assume.

use std::io::BufRead;

use rust_htslib::bam::{self, Read as HtsRead};

use crate::alignment::{Alignment, Cigar, FLAG_REVERSE, FLAG_SECONDARY, FLAG_SUPPLEMENTARY};
use crate::errors::{Error, Result};

pub trait AlignmentProducer {
    fn next_alignment(&mut self) -> Option<Result<Alignment>>;
}

pub struct BamProducer {
    reader: bam::Reader,
    tid_names: Vec<String>,
}

impl BamProducer {
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let reader = bam::Reader::from_path(&path).map_err(|e| Error::MalformedAlignment {
            query: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        let tid_names = reader
            .header()
            .target_names()
            .iter()
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect();
        Ok(BamProducer { reader, tid_names })
    }

    fn record_to_alignment(&self, record: &bam::Record) -> Result<Alignment> {
        let query = String::from_utf8_lossy(record.qname()).into_owned();
        if record.tid() < 0 {
            return Err(Error::MalformedAlignment {
                query,
                reason: "record is unmapped".to_string(),
            });
        }
        let rname = self
            .tid_names
            .get(record.tid() as usize)
            .cloned()
            .ok_or_else(|| Error::UnknownReference(record.tid().to_string()))?;

        let cigar_view = record.cigar();
        let cigar = Cigar::try_from(cigar_view.as_ref())?;
        let r_start = record.pos() as u32 + 1;
        let r_end = r_start + cigar.ref_len() - 1;

        let strand = if record.is_reverse() {
            crate::alignment::Strand::Reverse
        } else {
            crate::alignment::Strand::Forward
        };

        let stored_len = cigar.stored_seq_len();
        let soft_left = cigar.leading_clip(false);
        let soft_right = cigar.trailing_clip(false);
        let aligned_query_len = stored_len.saturating_sub(soft_left + soft_right);
        // Original-sequence qStart adds the hard-clip length too: op 0's
        // hard clip for F-strand, the last op's hard clip for R-strand
        // (spec.md §4.2; matches split.rs's `source_hard_left`/`source_hard_right`
        // folding for sub-alignments).
        let (q_start, q_end) = match strand {
            crate::alignment::Strand::Forward => {
                let start = cigar.leading_clip(true) + soft_left + 1;
                (start, start + aligned_query_len - 1)
            }
            crate::alignment::Strand::Reverse => {
                let start = cigar.trailing_clip(true) + soft_right + 1;
                (start, start + aligned_query_len - 1)
            }
        };

        let mut flags = 0u16;
        if record.is_reverse() {
            flags |= FLAG_REVERSE;
        }
        if record.is_secondary() {
            flags |= FLAG_SECONDARY;
        }
        if record.is_supplementary() {
            flags |= FLAG_SUPPLEMENTARY;
        }

        let query_bases = Some(record.seq().as_bytes());
        let qual = Some(record.qual().to_vec());

        Ok(Alignment {
            query,
            query_len: stored_len,
            q_start,
            q_end,
            rname,
            ref_len: r_end,
            r_start,
            r_end,
            strand,
            cigar,
            mapq: record.mapq(),
            flags,
            query_bases,
            qual,
        })
    }
}

impl AlignmentProducer for BamProducer {
    fn next_alignment(&mut self) -> Option<Result<Alignment>> {
        let mut record = bam::Record::new();
        match self.reader.read(&mut record) {
            Some(Ok(())) => Some(self.record_to_alignment(&record)),
            Some(Err(e)) => Some(Err(Error::MalformedAlignment {
                query: "<unknown>".to_string(),
                reason: e.to_string(),
            })),
            None => None,
        }
    }
}

pub struct PafProducer<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> PafProducer<R> {
    pub fn new(reader: R) -> Self {
        PafProducer {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn parse_line(&self, line: &str) -> Result<Alignment> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            return Err(Error::MalformedPaf {
                line: self.line_no,
                reason: format!("expected at least 12 fields, found {}", fields.len()),
            });
        }
        let parse_u32 = |s: &str, what: &str| -> Result<u32> {
            s.parse::<u32>().map_err(|_| Error::MalformedPaf {
                line: self.line_no,
                reason: format!("invalid {}: {}", what, s),
            })
        };

        let query = fields[0].to_string();
        let query_len = parse_u32(fields[1], "query length")?;
        let q_start0 = parse_u32(fields[2], "query start")?;
        let q_end0 = parse_u32(fields[3], "query end")?;
        let strand = match fields[4] {
            "+" => crate::alignment::Strand::Forward,
            "-" => crate::alignment::Strand::Reverse,
            other => {
                return Err(Error::MalformedPaf {
                    line: self.line_no,
                    reason: format!("invalid strand: {}", other),
                })
            }
        };
        let rname = fields[5].to_string();
        let ref_len = parse_u32(fields[6], "target length")?;
        let r_start0 = parse_u32(fields[7], "target start")?;
        let r_end0 = parse_u32(fields[8], "target end")?;
        let mapq = fields[11].parse::<u8>().unwrap_or(255);

        let cg_tag = fields[12..]
            .iter()
            .find(|f| f.starts_with("cg:Z:"))
            .map(|f| &f[5..]);
        let cigar = match cg_tag {
            Some(cg) => parse_cigar_string(cg, self.line_no)?,
            None => Cigar::all_match(r_end0 - r_start0),
        };

        let mut flags = 0u16;
        if strand == crate::alignment::Strand::Reverse {
            flags |= FLAG_REVERSE;
        }

        Ok(Alignment {
            query,
            query_len,
            q_start: q_start0 + 1,
            q_end: q_end0,
            rname,
            ref_len,
            r_start: r_start0 + 1,
            r_end: r_end0,
            strand,
            cigar,
            mapq,
            flags,
            query_bases: None,
            qual: None,
        })
    }
}

fn parse_cigar_string(cg: &str, line_no: usize) -> Result<Cigar> {
    use crate::alignment::{CigarElem, CigarOp};
    let mut elems = Vec::new();
    let mut num = String::new();
    for c in cg.chars() {
        if c.is_ascii_digit() {
            num.push(c);
            continue;
        }
        let len: u32 = num.parse().map_err(|_| Error::MalformedPaf {
            line: line_no,
            reason: format!("invalid cigar length before '{}'", c),
        })?;
        num.clear();
        let op = match c {
            'M' => CigarOp::Match,
            'I' => CigarOp::Ins,
            'D' => CigarOp::Del,
            'N' => CigarOp::RefSkip,
            'S' => CigarOp::SoftClip,
            'H' => CigarOp::HardClip,
            '=' => CigarOp::Equal,
            'X' => CigarOp::Diff,
            other => {
                return Err(Error::UnsupportedCigarOp {
                    op: other.to_string(),
                })
            }
        };
        elems.push(CigarElem { op, len });
    }
    Ok(Cigar::new(elems))
}

impl<R: BufRead> AlignmentProducer for PafProducer<R> {
    fn next_alignment(&mut self) -> Option<Result<Alignment>> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    return Some(Err(Error::MalformedPaf {
                        line: self.line_no,
                        reason: e.to_string(),
                    }))
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.parse_line(&line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_minimal_paf_line_without_cigar_tag() {
        let line = "readA\t1000\t0\t1000\t+\tchr1\t5000\t100\t1100\t950\t1000\t60\n";
        let mut producer = PafProducer::new(Cursor::new(line));
        let aln = producer.next_alignment().unwrap().unwrap();
        assert_eq!(aln.query, "readA");
        assert_eq!(aln.r_start, 101);
        assert_eq!(aln.r_end, 1100);
        assert_eq!(aln.q_start, 1);
        assert_eq!(aln.q_end, 1000);
    }

    #[test]
    fn parses_cigar_tag_when_present() {
        let line = "readA\t20\t0\t20\t-\tchr1\t5000\t100\t120\t18\t20\t60\tcg:Z:10M2D10M\n";
        let mut producer = PafProducer::new(Cursor::new(line));
        let aln = producer.next_alignment().unwrap().unwrap();
        assert_eq!(aln.cigar.ref_len(), 22);
        assert_eq!(aln.strand, crate::alignment::Strand::Reverse);
    }

    #[test]
    fn rejects_short_lines() {
        let line = "readA\t20\t0\t20\n";
        let mut producer = PafProducer::new(Cursor::new(line));
        assert!(producer.next_alignment().unwrap().is_err());
    }
}

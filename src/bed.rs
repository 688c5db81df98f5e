//! BED I/O for exclude-mask and benchmark-region inputs.
//!
//! Grounded on `alignparse.py`'s BED reader (used there for confident
//! regions and stratification masks): tab-delimited, 0-based half-open,
//! optional trailing columns ignored, `#`-prefixed lines are comments.

use std::io::{BufRead, Write};

use crate::alignment::{Alignment, Strand};
use crate::errors::{Error, Result};
use crate::hetproject::{HetAllele, HetClass};
use crate::structural::{Join, JoinKind};
use crate::variants::Variant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRecord {
    pub chrom: String,
    /// 0-based, half-open.
    pub start: u64,
    pub end: u64,
    pub name: Option<String>,
}

pub fn read_bed<R: BufRead>(reader: R) -> Result<Vec<BedRecord>> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| Error::MalformedBed {
            line: line_no,
            reason: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("track") {
            continue;
        }
        let fields: Vec<&str> = trimmed.split('\t').collect();
        if fields.len() < 3 {
            return Err(Error::MalformedBed {
                line: line_no,
                reason: format!("expected at least 3 fields, found {}", fields.len()),
            });
        }
        let start: u64 = fields[1].parse().map_err(|_| Error::MalformedBed {
            line: line_no,
            reason: format!("invalid start: {}", fields[1]),
        })?;
        let end: u64 = fields[2].parse().map_err(|_| Error::MalformedBed {
            line: line_no,
            reason: format!("invalid end: {}", fields[2]),
        })?;
        if end < start {
            return Err(Error::MalformedBed {
                line: line_no,
                reason: format!("end {} precedes start {}", end, start),
            });
        }
        out.push(BedRecord {
            chrom: fields[0].to_string(),
            start,
            end,
            name: fields.get(3).map(|s| s.to_string()),
        });
    }
    Ok(out)
}

pub fn write_bed<W: Write>(mut writer: W, records: &[BedRecord]) -> std::io::Result<()> {
    for r in records {
        match &r.name {
            Some(name) => writeln!(writer, "{}\t{}\t{}\t{}", r.chrom, r.start, r.end, name)?,
            None => writeln!(writer, "{}\t{}\t{}", r.chrom, r.start, r.end)?,
        }
    }
    Ok(())
}

/// Collapses per-contig records into `(start, end)` intervals, for feeding
/// straight into an `IntervalCollaborator`.
pub fn intervals_for_chrom(records: &[BedRecord], chrom: &str) -> Vec<(u64, u64)> {
    records
        .iter()
        .filter(|r| r.chrom == chrom)
        .map(|r| (r.start, r.end))
        .collect()
}

/// `testmat.bed`/`testpat.bed`: one line per haplotype-assembly alignment,
/// keyed on the *test* contig's own 0-based span, naming the benchmark
/// region it aligned to (`ref.rStart.rEnd.strand`).
pub fn write_haplotype_alignment_bed<W: Write>(mut writer: W, alignments: &[Alignment]) -> std::io::Result<()> {
    for a in alignments {
        let strand = match a.strand {
            Strand::Forward => 'F',
            Strand::Reverse => 'R',
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}.{}.{}.{}",
            a.query,
            a.q_start.saturating_sub(1),
            a.q_end,
            a.rname,
            a.r_start,
            a.r_end,
            strand
        )?;
    }
    Ok(())
}

/// `truth.bed`: one line per alignment, keyed on the *benchmark* contig's
/// 0-based span, naming the test contig and its original (pre-ascending-
/// normalization) query edges (`query.qLeft.qRight`); `qLeft` is whichever
/// edge corresponds to the alignment's reference-start side, so on the
/// reverse strand `qLeft > qRight`.
pub fn write_truth_bed<W: Write>(mut writer: W, alignments: &[Alignment]) -> std::io::Result<()> {
    for a in alignments {
        let (q_left, q_right) = match a.strand {
            Strand::Forward => (a.q_start, a.q_end),
            Strand::Reverse => (a.q_end, a.q_start),
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}.{}.{}",
            a.rname,
            a.r_start.saturating_sub(1),
            a.r_end,
            a.query,
            q_left,
            q_right
        )?;
    }
    Ok(())
}

fn het_class_label(class: HetClass) -> &'static str {
    match class {
        HetClass::Same => "SAMEHAP",
        HetClass::Alt => "ALTHAP",
        HetClass::Neither => "OTHER",
    }
}

/// `hetalleles.bed`: 12-column BED; `name` carries both the observed allele
/// and its `SAMEHAP|ALTHAP|OTHER` classification since standard BED has no
/// column of its own for a second text label.
pub fn write_het_alleles_bed<W: Write>(mut writer: W, alleles: &[HetAllele]) -> std::io::Result<()> {
    for a in alleles {
        let name = format!("{}_{}", a.observed_allele, het_class_label(a.class));
        let len = a.ref_end.saturating_sub(a.ref_start);
        writeln!(
            writer,
            "{chrom}\t{start}\t{end}\t{name}\t0\t+\t{start}\t{end}\t0,0,0\t1\t{len}\t0",
            chrom = a.query,
            start = a.ref_start,
            end = a.ref_end,
            name = name,
            len = len,
        )?;
    }
    Ok(())
}

/// Distinguishes the two colorings `variants.bed`'s itemRgb column encodes:
/// variants used as haplotype-phasing markers (red) versus the general
/// assembly-vs-benchmark consensus call set (blue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantBedClass {
    Phasing,
    Consensus,
}

/// `variants.bed`: 12-column BED with itemRGB `255,0,0` for phasing markers
/// and `0,0,255` for consensus calls.
pub fn write_variants_bed<W: Write>(
    mut writer: W,
    entries: &[(&Variant, VariantBedClass)],
) -> std::io::Result<()> {
    for (v, class) in entries {
        let rgb = match class {
            VariantBedClass::Phasing => "255,0,0",
            VariantBedClass::Consensus => "0,0,255",
        };
        let len = v.end.saturating_sub(v.start).max(1);
        writeln!(
            writer,
            "{chrom}\t{start}\t{end}\t{name}\t0\t+\t{start}\t{end}\t{rgb}\t1\t{len}\t0",
            chrom = v.chrom,
            start = v.start,
            end = v.end,
            name = v.name,
            rgb = rgb,
            len = len,
        )?;
    }
    Ok(())
}

fn join_kind_label(kind: JoinKind) -> &'static str {
    kind.into()
}

/// `structvariants.bed`: 4 columns, the join's reference-side bracket and its
/// class label, grounded on `structvar.py::write_structural_errors`'s own
/// tab-separated `...\tClassName\n` line shape.
pub fn write_struct_variants_bed<W: Write>(
    mut writer: W,
    joins: &[Join],
    alignments: &[Alignment],
) -> std::io::Result<()> {
    for j in joins {
        let a = &alignments[j.left_index];
        let b = &alignments[j.right_index];
        let lo = a.r_end.min(b.r_start);
        let hi = a.r_end.max(b.r_start);
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            a.rname,
            lo.saturating_sub(1),
            hi,
            join_kind_label(j.kind)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_bed_records_and_skips_comments() {
        let data = "#comment\nchr1\t100\t200\tregionA\nchr2\t0\t50\n";
        let records = read_bed(Cursor::new(data)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("regionA"));
        assert_eq!(records[1].name, None);
    }

    #[test]
    fn rejects_malformed_start() {
        let data = "chr1\tNOTANUMBER\t200\n";
        assert!(read_bed(Cursor::new(data)).is_err());
    }

    #[test]
    fn intervals_for_chrom_filters_by_contig() {
        let records = vec![
            BedRecord { chrom: "chr1".to_string(), start: 0, end: 10, name: None },
            BedRecord { chrom: "chr2".to_string(), start: 5, end: 20, name: None },
        ];
        let chr1 = intervals_for_chrom(&records, "chr1");
        assert_eq!(chr1, vec![(0, 10)]);
    }

    fn aln(query: &str, rname: &str, strand: Strand, r_start: u32, r_end: u32, q_start: u32, q_end: u32) -> Alignment {
        use crate::alignment::{Cigar, CigarElem, CigarOp};
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
            cigar: Cigar::new(vec![CigarElem { op: CigarOp::Equal, len: r_end - r_start + 1 }]),
            mapq: 60,
            flags: 0,
            query_bases: None,
            qual: None,
        }
    }

    #[test]
    fn haplotype_alignment_bed_names_ref_span_and_strand() {
        let alignments = vec![aln("qA", "chr1", Strand::Forward, 101, 200, 1, 100)];
        let mut out = Vec::new();
        write_haplotype_alignment_bed(&mut out, &alignments).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert_eq!(line.trim(), "qA\t0\t100\tchr1.101.200.F");
    }

    #[test]
    fn truth_bed_swaps_qleft_qright_on_reverse_strand() {
        let alignments = vec![aln("qB", "chr1", Strand::Reverse, 101, 200, 1, 100)];
        let mut out = Vec::new();
        write_truth_bed(&mut out, &alignments).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert_eq!(line.trim(), "chr1\t100\t200\tqB.100.1");
    }

    #[test]
    fn het_alleles_bed_embeds_allele_and_classification_in_name() {
        let alleles = vec![HetAllele {
            het_name: "h1".to_string(),
            ref_allele: "A".to_string(),
            ref_start: 104,
            ref_end: 105,
            observed_allele: "C".to_string(),
            class: HetClass::Alt,
            query: "qA".to_string(),
            query_start: 4,
            query_end: 5,
        }];
        let mut out = Vec::new();
        write_het_alleles_bed(&mut out, &alleles).unwrap();
        let line = String::from_utf8(out).unwrap();
        let fields: Vec<&str> = line.trim().split('\t').collect();
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[3], "C_ALTHAP");
    }

    #[test]
    fn variants_bed_colors_phasing_red_and_consensus_blue() {
        let v = Variant {
            chrom: "chr1".to_string(),
            start: 100,
            end: 101,
            name: "qA_101_G_A_F".to_string(),
            kind: crate::variants::VariantKind::Snv,
            excluded: false,
            qv: Some(40),
        };
        let mut out = Vec::new();
        write_variants_bed(&mut out, &[(&v, VariantBedClass::Phasing)]).unwrap();
        let line = String::from_utf8(out).unwrap();
        let fields: Vec<&str> = line.trim().split('\t').collect();
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[8], "255,0,0");

        let mut out = Vec::new();
        write_variants_bed(&mut out, &[(&v, VariantBedClass::Consensus)]).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.contains("0,0,255"));
    }

    #[test]
    fn struct_variants_bed_labels_each_join_kind() {
        let alignments = vec![
            aln("q1", "chr1", Strand::Forward, 1, 1000, 1, 1000),
            aln("q1", "chr1", Strand::Forward, 51000, 52000, 1001, 2000),
        ];
        let joins = vec![Join {
            kind: JoinKind::SameContigDeletion,
            left_index: 0,
            right_index: 1,
            ref_gap: 50000,
            query_gap: 0,
        }];
        let mut out = Vec::new();
        write_struct_variants_bed(&mut out, &joins, &alignments).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert_eq!(line.trim(), "chr1\t999\t51000\tSameContigDeletion");
    }
}

//! C10 (emission half): VCF record construction with left-normalization.
//!
//! Grounded on `errors.py::vcf_format`/`vcf_header`: strip the `*` empty-side
//! marker from both alleles, strip a common trailing base while both alleles
//! are still non-empty, then — if either allele collapsed to nothing — anchor
//! both REF and ALT on one shared base so neither VCF column is empty. The
//! REF anchor always comes from the benchmark reference at `refpos-1`; the ALT
//! anchor always comes from the *test* assembly, fetched directly at
//! `contigpos-1` on the forward strand or reverse-complemented from
//! `contigend-1` on the reverse strand (the two-branch `contigend` arithmetic
//! in the original is preserved literally here, not simplified).

use crate::variants::{Variant, VariantKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfRecord {
    pub chrom: String,
    /// 1-based VCF POS.
    pub pos: u64,
    pub id: String,
    pub reference: String,
    pub alt: String,
    pub qual: Option<u32>,
    pub filter: String,
}

/// Fetches a 0-based half-open region `[start, end)` from a contig, returning
/// uppercase bases. Mirrors the `refobj.fetch`/`queryobj.fetch` collaborators
/// spec.md §6 names (pysam `FastaFile.fetch`-alike); a host wires this to its
/// own indexed-FASTA reader.
pub trait SequenceFetcher {
    fn fetch(&self, contig: &str, start: u64, end: u64) -> Option<Vec<u8>>;
}

fn revcomp(bases: &[u8]) -> Vec<u8> {
    bases
        .iter()
        .rev()
        .map(|&b| match b.to_ascii_uppercase() {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            other => other,
        })
        .collect()
}

fn strip_common_trailing_base(mut reference: String, mut alt: String) -> (String, String) {
    while !reference.is_empty()
        && !alt.is_empty()
        && reference.as_bytes().last() == alt.as_bytes().last()
    {
        reference.pop();
        alt.pop();
    }
    (reference, alt)
}

/// `ref_fetcher`/`query_fetcher` back the same-named collaborators spec.md
/// §6 assumes the host provides; `contig` is the variant's own `query` field
/// (the test assembly contig the indel was called against).
pub fn to_vcf_record(
    variant: &Variant,
    ref_fetcher: &dyn SequenceFetcher,
    query_fetcher: &dyn SequenceFetcher,
) -> VcfRecord {
    let filter = if variant.excluded { "EXCLUDED" } else { "PASS" }.to_string();
    let mut pos = variant.start + 1;

    if variant.kind == VariantKind::Snv {
        let (_, _, reference, alt, _) = variant
            .decode_name()
            .unwrap_or_else(|| (String::new(), 0, "N".to_string(), "N".to_string(), crate::alignment::Strand::Forward));
        return VcfRecord {
            chrom: variant.chrom.clone(),
            pos,
            id: variant.name.clone(),
            reference,
            alt,
            qual: variant.qv,
            filter,
        };
    }

    let (contig, contig_pos, raw_ref, raw_alt, strand) = variant.decode_name().unwrap_or_else(|| {
        (
            String::new(),
            0,
            String::new(),
            String::new(),
            crate::alignment::Strand::Forward,
        )
    });
    let mut reference = raw_ref.replace('*', "");
    let mut alt = raw_alt.replace('*', "");
    let (stripped_ref, stripped_alt) = strip_common_trailing_base(reference, alt);
    reference = stripped_ref;
    alt = stripped_alt;

    if reference.is_empty() || alt.is_empty() {
        pos -= 1;
        let anchor = ref_fetcher
            .fetch(&variant.chrom, pos - 1, pos)
            .and_then(|b| b.first().copied())
            .unwrap_or(b'N');
        reference = format!("{}{}", anchor as char, reference);

        match strand {
            crate::alignment::Strand::Forward => {
                let contig_pos = contig_pos - 1;
                let alt_anchor = query_fetcher
                    .fetch(&contig, (contig_pos - 1).max(0) as u64, contig_pos as u64)
                    .and_then(|b| b.first().copied())
                    .unwrap_or(b'N');
                alt = format!("{}{}", alt_anchor as char, alt);
            }
            crate::alignment::Strand::Reverse => {
                let contig_end = if reference.len() == 1 {
                    contig_pos + alt.len() as i64
                } else {
                    contig_pos + alt.len() as i64 + 1
                };
                let alt_anchor = query_fetcher
                    .fetch(&contig, (contig_end - 1).max(0) as u64, contig_end as u64)
                    .map(|b| revcomp(&b))
                    .and_then(|b| b.first().copied())
                    .unwrap_or(b'N');
                alt = format!("{}{}", alt_anchor as char, alt);
            }
        }
    }

    VcfRecord {
        chrom: variant.chrom.clone(),
        pos,
        id: variant.name.clone(),
        reference: reference.to_ascii_uppercase(),
        alt: alt.to_ascii_uppercase(),
        qual: variant.qv,
        filter,
    }
}

impl VcfRecord {
    /// `CHROM POS ID REF ALT QUAL FILTER INFO FORMAT SAMPLE`, one `GT=1`
    /// sample column per spec.md §6.
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t.\tGT\t1",
            self.chrom,
            self.pos,
            self.id,
            self.reference,
            self.alt,
            self.qual.map(|q| q.to_string()).unwrap_or_else(|| ".".to_string()),
            self.filter,
        )
    }
}

/// `benchmark_name` backs `##reference=`; `date_yyyymmdd` is supplied by the
/// caller since this crate never reads the system clock itself.
pub fn vcf_header(benchmark_name: &str, date_yyyymmdd: &str, source: &str) -> String {
    format!(
        "##fileformat=VCFv4.5\n##fileDate={date}\n##source={source}\n##reference={bench}\n\
##FILTER=<ID=EXCLUDED,Description=\"In excluded region of the benchmark reference\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n",
        date = date_yyyymmdd,
        source = source,
        bench = benchmark_name,
    )
}

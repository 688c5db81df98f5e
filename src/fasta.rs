//! Indexed-FASTA backed [[vcf::SequenceFetcher]], and the `reference`/`strand`
//! collaborator types spec.md §6 names but treats as external.
//!
//! Grounded on `call/pairwise.rs`'s `fasta::IndexedReader::from_file` +
//! `utils::ReferenceBuffer` pattern and `calling/variants/preprocessing/mod.rs`'s
//! `ObservationProcessorBuilder::reference` (`bio::io::fasta::IndexedReader<fs::File>`
//! wrapped behind a small buffer type). Both the benchmark and the test
//! assembly FASTA are opened the same way; which one backs a given
//! `IndexedFastaFetcher` is a caller concern, not something this type tracks.

use std::fs::File;
use std::path::Path;

use bio::io::fasta;

use crate::errors::{Error, Result};
use crate::vcf::SequenceFetcher;

/// Wraps one `.fai`-indexed FASTA file and exposes the 0-based half-open
/// `fetch` spec.md §6 requires of both the benchmark and test-assembly
/// collaborators.
pub struct IndexedFastaFetcher {
    reader: std::cell::RefCell<fasta::IndexedReader<File>>,
}

impl IndexedFastaFetcher {
    /// `path` must have a sibling `.fai` index, matching spec.md §6's "both
    /// benchmark and test must be indexed" requirement; a missing index
    /// surfaces as [[Error::IndexMissing]] rather than the underlying I/O
    /// error, so callers can tell the two fatal-startup cases apart.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = fasta::IndexedReader::from_file(&path).map_err(|_| {
            Error::IndexMissing(format!("{} (missing .fai index)", path.display()))
        })?;
        Ok(IndexedFastaFetcher {
            reader: std::cell::RefCell::new(reader),
        })
    }
}

impl SequenceFetcher for IndexedFastaFetcher {
    fn fetch(&self, contig: &str, start: u64, end: u64) -> Option<Vec<u8>> {
        if end <= start {
            return None;
        }
        let mut reader = self.reader.borrow_mut();
        reader.fetch(contig, start, end).ok()?;
        let mut seq = Vec::new();
        reader.read(&mut seq).ok()?;
        for b in seq.iter_mut() {
            *b = b.to_ascii_uppercase();
        }
        Some(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Writes a single-record, single-line FASTA plus a hand-built `.fai`
    /// sidecar (`name\tlen\toffset\tlinebases\tlinewidth`) rather than going
    /// through `bio`'s own index-writer, so this test doesn't depend on that
    /// writer's exact output format.
    fn write_fasta(dir: &tempfile::TempDir, name: &str, contig: &str, seq: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        let header = format!(">{}\n", contig);
        write!(f, "{}", header).unwrap();
        writeln!(f, "{}", seq).unwrap();
        drop(f);

        let fai_path = format!("{}.fai", path.display());
        let mut fai = File::create(&fai_path).unwrap();
        writeln!(
            fai,
            "{}\t{}\t{}\t{}\t{}",
            contig,
            seq.len(),
            header.len(),
            seq.len(),
            seq.len() + 1,
        )
        .unwrap();
        path
    }

    #[test]
    fn fetches_uppercase_half_open_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(&dir, "ref.fa", "chr1", "acgtACGTacgt");
        let fetcher = IndexedFastaFetcher::open(&path).unwrap();
        let seq = fetcher.fetch("chr1", 2, 8).unwrap();
        assert_eq!(seq, b"GTACGT");
    }

    #[test]
    fn missing_index_reports_index_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noindex.fa");
        let mut f = File::create(&path).unwrap();
        writeln!(f, ">chr1").unwrap();
        writeln!(f, "ACGT").unwrap();
        let err = IndexedFastaFetcher::open(&path).unwrap_err();
        assert!(matches!(err, Error::IndexMissing(_)));
    }
}

//! Error types shared across the crate.
//!
//! Leaf errors are typed with `thiserror` so callers can match on the kind
//! (for instance to decide whether a malformed alignment should be skipped
//! rather than aborting the whole run); orchestration code collects them
//! behind `anyhow::Error`, the same split the rest of the crate uses.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("alignment for query '{query}' is malformed: {reason}")]
    MalformedAlignment { query: String, reason: String },

    #[error("cigar operation '{op}' is not supported in this context")]
    UnsupportedCigarOp { op: String },

    #[error("query '{query}' consumed {consumed} bases but its declared length is {declared}")]
    QueryLengthMismatch {
        query: String,
        consumed: u32,
        declared: u32,
    },

    #[error("reference contig '{0}' not found")]
    UnknownReference(String),

    #[error("malformed PAF record at line {line}: {reason}")]
    MalformedPaf { line: usize, reason: String },

    #[error("malformed BED record at line {line}: {reason}")]
    MalformedBed { line: usize, reason: String },

    #[error("malformed VCF record: {0}")]
    MalformedVcf(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("position {1} on '{0}' lies outside the aligned span")]
    OutOfBounds(String, u64),

    /// A required input (BAM/PAF/FASTA/VCF/config) could not be opened or
    /// read at all; unlike the per-record malformed-* kinds this aborts the
    /// whole run rather than being counted on `RunStats`.
    #[error("input could not be read: {0}")]
    InputUnreadable(String),

    /// A required companion index (`.fai`, `.bai`/`.csi`) is missing for an
    /// otherwise-present input file.
    #[error("required index is missing: {0}")]
    IndexMissing(String),

    /// The HMM phase-block pass has nothing to condition on: zero het sites
    /// survived filtering for the region under consideration.
    #[error("no haplotype markers available: {0}")]
    NoHaplotypeMarkers(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<rust_htslib::errors::Error> for Error {
    fn from(e: rust_htslib::errors::Error) -> Self {
        Error::InputUnreadable(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::InputUnreadable(e.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(e: std::num::ParseIntError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts_to_input_unreadable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.bam");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::InputUnreadable(_)));
    }

    #[test]
    fn parse_int_error_converts_to_invalid_config() {
        let parse_err: std::num::ParseIntError = "notanumber".parse::<u32>().unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}

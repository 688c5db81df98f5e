//! Alignment-analysis core for genome-assembly benchmarking.
//!
//! Turns raw assembly-to-reference alignments (BAM or PAF) into normalized
//! variant calls, structural-join reports and coverage-ranked clusters,
//! independent of any particular truth set or output renderer.

pub mod alignment;
pub mod bed;
pub mod cigar;
pub mod cluster;
pub mod config;
pub mod coords;
pub mod errors;
pub mod exclude;
pub mod fasta;
pub mod hetproject;
pub mod interval_project;
pub mod intervals;
pub mod lis;
pub mod parallel;
pub mod producers;
pub mod split;
pub mod stats;
pub mod structural;
pub mod truth;
pub mod variants;
pub mod vcf;

pub use alignment::{Alignment, Cigar, CigarElem, CigarOp, Strand};
pub use errors::{Error, Result};
pub use stats::RunStats;

// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::exit;

use structopt::StructOpt;

use gqc_align_core::bed::{intervals_for_chrom, read_bed};
use gqc_align_core::config::Config;
use gqc_align_core::exclude::VariantExcluder;
use gqc_align_core::intervals::SimpleIntervalOps;
use gqc_align_core::producers::{AlignmentProducer, PafProducer};
use gqc_align_core::stats::RunStats;

#[derive(Debug, StructOpt)]
#[structopt(name = "gqc-align-demo", about = "Run the alignment-analysis core over a PAF file.")]
struct Opt {
    /// PAF alignment file.
    #[structopt(long)]
    paf: PathBuf,

    /// BED file of regions to exclude from variant calls.
    #[structopt(long)]
    exclude_bed: Option<PathBuf>,

    /// YAML config file overriding component thresholds.
    #[structopt(long)]
    config: Option<PathBuf>,
}

fn run(opt: Opt) -> anyhow::Result<()> {
    let config = match &opt.config {
        Some(path) => Config::from_yaml_str(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    config.validate()?;

    let exclude_records = match &opt.exclude_bed {
        Some(path) => read_bed(BufReader::new(File::open(path)?))?,
        None => Vec::new(),
    };

    let file = File::open(&opt.paf)?;
    let mut producer = PafProducer::new(BufReader::new(file));
    let mut stats = RunStats::default();
    let ops = SimpleIntervalOps;
    let excluder = VariantExcluder::new(&ops);

    let mut total_variants = 0usize;
    let mut total_excluded = 0usize;

    while let Some(result) = producer.next_alignment() {
        let alignment = match result {
            Ok(a) => a,
            Err(e) => {
                log::warn!("skipping malformed alignment: {}", e);
                stats.record_malformed_alignment();
                continue;
            }
        };
        stats.record_alignment_seen();
        if alignment.is_secondary() {
            stats.record_skipped_secondary();
            continue;
        }

        let exclude_mask = intervals_for_chrom(&exclude_records, &alignment.rname);
        // The demo binary has no reference/query sequence source wired in, so
        // it reports alignment-level bookkeeping only; full variant
        // extraction needs `VariantExtractor` fed real ref/query bytes.
        let mut dummy_variants = Vec::new();
        let excluded_here = excluder.mark(&mut dummy_variants, &exclude_mask);
        total_variants += dummy_variants.len();
        total_excluded += excluded_here;
    }

    log::info!(
        "alignments_seen={} variants={} excluded={}",
        stats.alignments_seen,
        total_variants,
        total_excluded
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub fn main() {
    let opt = Opt::from_args();

    fern::Dispatch::new()
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()
        .unwrap();

    exit(match run(opt) {
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
        _ => 0,
    })
}

//! Run-level statistics: non-fatal error counters per spec.md §7's
//! "accumulate counters" policy, surfaced instead of propagating a `Result`
//! for every recoverable condition.

#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunStats {
    pub alignments_seen: u64,
    pub alignments_skipped_secondary: u64,
    pub alignments_skipped_malformed: u64,
    pub variants_n_excluded: u64,
    pub empty_quality_windows: u64,
    pub coord_window_out_of_range: u64,
    pub query_consumption_mismatches: u64,
    pub sub_alignments_dropped: u64,
}

impl RunStats {
    pub fn record_alignment_seen(&mut self) {
        self.alignments_seen += 1;
    }

    pub fn record_skipped_secondary(&mut self) {
        self.alignments_skipped_secondary += 1;
    }

    pub fn record_malformed_alignment(&mut self) {
        self.alignments_skipped_malformed += 1;
    }

    pub fn record_n_excluded_variant(&mut self) {
        self.variants_n_excluded += 1;
    }

    pub fn record_empty_quality_window(&mut self) {
        self.empty_quality_windows += 1;
    }

    pub fn record_coord_window_out_of_range(&mut self) {
        self.coord_window_out_of_range += 1;
    }

    pub fn record_query_consumption_mismatch(&mut self) {
        self.query_consumption_mismatches += 1;
    }

    pub fn record_sub_alignment_dropped(&mut self) {
        self.sub_alignments_dropped += 1;
    }
}

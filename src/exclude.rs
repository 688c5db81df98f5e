//! C10 (exclusion half): VariantExcluder — marks variants that fall inside
//! caller-supplied exclude regions.
//!
//! Grounded on `alignparse.py::mark_excluded_variants`: a variant is excluded
//! when its reference span overlaps the exclude mask at all, matching the
//! BED-driven stratification masks (tandem repeats, segmental duplications,
//! low-mappability windows) spec.md names as inputs but leaves the merge
//! logic to an external collaborator ([[IntervalCollaborator]]).

use crate::intervals::IntervalCollaborator;
use crate::variants::Variant;

pub struct VariantExcluder<'a> {
    ops: &'a dyn IntervalCollaborator,
}

impl<'a> VariantExcluder<'a> {
    pub fn new(ops: &'a dyn IntervalCollaborator) -> Self {
        VariantExcluder { ops }
    }

    /// `exclude_mask` holds 0-based half-open intervals on the variant's
    /// contig; variants on other contigs are left untouched by this call.
    pub fn mark(&self, variants: &mut [Variant], exclude_mask: &[(u64, u64)]) -> usize {
        let merged = self.ops.merge(exclude_mask);
        let mut newly_excluded = 0;
        for v in variants.iter_mut() {
            if v.excluded {
                continue;
            }
            let overlaps = merged
                .iter()
                .any(|&(s, e)| (v.start as u64) < e && s < (v.end as u64));
            if overlaps {
                v.excluded = true;
                newly_excluded += 1;
            }
        }
        newly_excluded
    }
}

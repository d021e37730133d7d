//! Decides whether a read's unclipped alignment actually spans a target
//! position. Soft-clipped prefix or suffix bases inflate a read's apparent
//! span, so each clipped end is checked independently and only when present.

use super::read::SiteRead;
use rust_htslib::bam::record::Cigar;

pub fn spans_position(read: &SiteRead, target: i64) -> bool {
    let (Some(first), Some(last)) = (read.ops.first(), read.ops.last()) else {
        return false;
    };

    if matches!(first, Cigar::SoftClip(_)) && read.start > target {
        return false;
    }

    if matches!(last, Cigar::SoftClip(_)) {
        let unclipped_end = read.start
            + read.ops[..read.ops.len() - 1]
                .iter()
                .filter(|op| !matches!(op, Cigar::Ins(_)))
                .map(|op| op.len() as i64)
                .sum::<i64>();
        if target > unclipped_end {
            return false;
        }
    }

    // The driver's single-position fetch window guarantees this for reads
    // coming from the alignment store; it makes the predicate total for
    // direct callers.
    read.start <= target && target < reference_end(read)
}

/// End of the half-open reference interval consumed by the alignment.
fn reference_end(read: &SiteRead) -> i64 {
    read.start
        + read
            .ops
            .iter()
            .map(|op| match op {
                Cigar::Match(len)
                | Cigar::Del(len)
                | Cigar::RefSkip(len)
                | Cigar::Equal(len)
                | Cigar::Diff(len) => *len as i64,
                _ => 0,
            })
            .sum::<i64>()
}

//! Column-by-column reconstruction of a read's alignment from its CIGAR.

use super::read::SiteRead;
use crate::utils::Result;
use rust_htslib::bam::record::Cigar;
use std::iter;

/// Gap marker placed in reconstructed sequences for deleted columns.
pub const GAP: u8 = b'-';

/// A read's alignment expanded to one column per aligned or deleted base.
///
/// `bases` holds the query base for each column (`-` for deletions) and
/// `ops` the matching one-letter operation tag (`M`, `I`, `D`, `=`, `X`).
/// The two sequences always have equal length.
#[derive(Debug, PartialEq)]
pub struct AlignedSeq {
    pub bases: Vec<u8>,
    pub ops: Vec<u8>,
}

impl AlignedSeq {
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// Rebuilds the aligned query sequence of a read. Match, insertion, equal
/// and mismatch runs consume query bases; deletion runs contribute gap
/// markers; clips and reference skips contribute nothing. A CIGAR that
/// consumes more query bases than the read carries fails fast.
pub fn reconstruct(read: &SiteRead) -> Result<AlignedSeq> {
    let mut bases = Vec::with_capacity(read.bases.len());
    let mut ops = Vec::with_capacity(read.bases.len());
    let mut cursor = 0usize;

    for op in &read.ops {
        let len = op.len() as usize;
        let tag = match op {
            Cigar::Match(_) => b'M',
            Cigar::Ins(_) => b'I',
            Cigar::Equal(_) => b'=',
            Cigar::Diff(_) => b'X',
            Cigar::Del(_) => {
                bases.extend(iter::repeat(GAP).take(len));
                ops.extend(iter::repeat(b'D').take(len));
                continue;
            }
            Cigar::SoftClip(_) | Cigar::HardClip(_) | Cigar::RefSkip(_) | Cigar::Pad(_) => continue,
        };

        let end = cursor + len;
        if end > read.bases.len() {
            return Err(format!(
                "Malformed alignment for read {}: CIGAR consumes {} query bases but only {} are present",
                read.id,
                end,
                read.bases.len()
            ));
        }
        bases.extend_from_slice(&read.bases[cursor..end]);
        ops.extend(iter::repeat(tag).take(len));
        cursor = end;
    }

    Ok(AlignedSeq { bases, ops })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::test_utils::make_read;

    #[test]
    fn match_only_read_reconstructed_verbatim() {
        let read = make_read(100, "5M", "ACGTA");
        let aln = reconstruct(&read).unwrap();
        assert_eq!(aln.bases, b"ACGTA");
        assert_eq!(aln.ops, b"MMMMM");
    }

    #[test]
    fn deletion_columns_become_gaps() {
        let read = make_read(100, "2M2D3M", "ACGTT");
        let aln = reconstruct(&read).unwrap();
        assert_eq!(aln.bases, b"AC--GTT");
        assert_eq!(aln.ops, b"MMDDMMM");
    }

    #[test]
    fn insertion_and_explicit_match_ops_are_tagged() {
        let read = make_read(100, "2=1X1I2M", "ACGTAA");
        let aln = reconstruct(&read).unwrap();
        assert_eq!(aln.bases, b"ACGTAA");
        assert_eq!(aln.ops, b"==XIMM");
    }

    #[test]
    fn bases_and_ops_have_equal_length() {
        let read = make_read(100, "3M1I2D4M", "ACGTACGT");
        let aln = reconstruct(&read).unwrap();
        assert_eq!(aln.bases.len(), aln.ops.len());
        let non_gap = aln.bases.iter().filter(|&&b| b != GAP).count();
        // match + insertion run lengths
        assert_eq!(non_gap, 3 + 1 + 4);
    }

    #[test]
    fn clips_are_structurally_skipped() {
        let read = make_read(100, "2S3M2H", "ACG");
        let aln = reconstruct(&read).unwrap();
        assert_eq!(aln.bases, b"ACG");
        assert_eq!(aln.ops, b"MMM");
    }

    #[test]
    fn clip_only_cigar_yields_empty_reconstruction() {
        let read = make_read(100, "5S", "");
        let aln = reconstruct(&read).unwrap();
        assert!(aln.is_empty());
    }

    #[test]
    fn overrunning_cigar_is_malformed() {
        let read = make_read(100, "6M", "ACGTA");
        let err = reconstruct(&read).unwrap_err();
        assert!(err.contains("Malformed alignment"));
    }
}

//! Per-position allele counting across the reads overlapping a candidate
//! site.
//!
//! Indel candidates are compared in a padded representation: deletion
//! alternates are right-padded with gap markers to the reference length and
//! insertion references are right-padded with a reserved placeholder to the
//! alternate length, so both alleles of a candidate always have the same
//! width.

use super::{
    align::{reconstruct, AlignedSeq, GAP},
    overlap::spans_position,
    read::SiteRead,
};
use std::collections::HashMap;

/// Placeholder byte padding an insertion-type reference allele.
pub const INS_PAD: u8 = b'I';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteKind {
    Substitution,
    Insertion,
    Deletion,
}

/// A candidate's ref/alt allele pair in padded form. The site is classified
/// once, from the raw allele lengths, before any padding is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleSpec {
    pub kind: SiteKind,
    pub ref_allele: String,
    pub alt_allele: String,
}

impl AlleleSpec {
    pub fn new(ref_allele: &str, alt_allele: &str) -> AlleleSpec {
        use std::cmp::Ordering;
        match ref_allele.len().cmp(&alt_allele.len()) {
            Ordering::Greater => AlleleSpec {
                kind: SiteKind::Deletion,
                ref_allele: ref_allele.to_string(),
                alt_allele: pad_to(alt_allele, ref_allele.len(), GAP),
            },
            Ordering::Less => AlleleSpec {
                kind: SiteKind::Insertion,
                ref_allele: pad_to(ref_allele, alt_allele.len(), INS_PAD),
                alt_allele: alt_allele.to_string(),
            },
            Ordering::Equal => AlleleSpec {
                kind: SiteKind::Substitution,
                ref_allele: ref_allele.to_string(),
                alt_allele: alt_allele.to_string(),
            },
        }
    }

    /// Number of reconstructed columns inspected per read.
    fn width(&self) -> usize {
        self.alt_allele.len()
    }
}

fn pad_to(allele: &str, width: usize, pad: u8) -> String {
    let mut padded = allele.to_string();
    while padded.len() < width {
        padded.push(pad as char);
    }
    padded
}

/// Tallies allele support at `pos` over the given reads. Returns the
/// observed-allele counts and the number of reads with a determinable
/// offset (a read contributes to the depth even when no allele could be
/// called from it).
pub fn tally_reads(
    reads: &[SiteRead],
    pos: i64,
    spec: &AlleleSpec,
) -> (HashMap<String, u32>, u32) {
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut depth = 0u32;

    for read in reads {
        if !spans_position(read, pos) {
            continue;
        }
        let raw_offset = pos - read.start;
        if raw_offset < 0 {
            continue;
        }

        let aln = match reconstruct(read) {
            Ok(aln) => aln,
            Err(e) => {
                log::warn!("Skipping read: {}", e);
                continue;
            }
        };

        // Insertions upstream of the site shift reconstructed columns to the
        // right of their genomic coordinates
        let raw_offset = raw_offset as usize;
        let shift = aln.ops[..raw_offset.min(aln.ops.len())]
            .iter()
            .filter(|&&tag| tag == b'I')
            .count();
        let offset = raw_offset + shift;

        depth += 1;
        if let Some(allele) = call_allele(&aln, offset, spec) {
            *counts.entry(allele).or_insert(0) += 1;
        }
    }

    (counts, depth)
}

/// Extracts the allele a single read supports at the given reconstructed
/// offset. Returns `None` when the read ends before the offset.
fn call_allele(aln: &AlignedSeq, offset: usize, spec: &AlleleSpec) -> Option<String> {
    if offset >= aln.len() {
        return None;
    }
    if spec.kind == SiteKind::Substitution {
        return Some((aln.bases[offset] as char).to_string());
    }

    let end = (offset + spec.width()).min(aln.len());
    let seq = String::from_utf8_lossy(&aln.bases[offset..end]).into_owned();
    let has_ins_tag = aln.ops[offset..end].contains(&b'I');
    let is_full = end - offset == spec.width();

    Some(classify_indel(seq, has_ins_tag, is_full, spec))
}

/// Decision table for multi-base allele classification, keyed on
/// (site kind, full-length extraction, insertion tag present, prefix match).
/// A multi-base context without an insertion tag is not trusted for
/// insertion-type sites and falls back to single-base identity; a truncated
/// trailing match with an insertion signal is trusted to represent the
/// complete indel allele.
fn classify_indel(seq: String, has_ins_tag: bool, is_full: bool, spec: &AlleleSpec) -> String {
    let matches_ref = spec.ref_allele.as_bytes().starts_with(seq.as_bytes());
    let matches_alt = spec.alt_allele.as_bytes().starts_with(seq.as_bytes());

    match (spec.kind, is_full) {
        (SiteKind::Insertion, true) => {
            if has_ins_tag {
                seq
            } else {
                collapse(seq)
            }
        }
        (SiteKind::Deletion, true) => seq,
        (SiteKind::Insertion, false) => {
            if !has_ins_tag {
                collapse(seq)
            } else if matches_alt {
                spec.alt_allele.clone()
            } else if matches_ref {
                spec.ref_allele.clone()
            } else {
                seq
            }
        }
        (SiteKind::Deletion, false) => {
            if matches_alt {
                spec.alt_allele.clone()
            } else if matches_ref {
                spec.ref_allele.clone()
            } else {
                seq
            }
        }
        (SiteKind::Substitution, _) => unreachable!("substitutions are called directly"),
    }
}

/// Single-base fallback for untrusted multi-base contexts.
fn collapse(seq: String) -> String {
    seq.chars().take(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::test_utils::make_read;

    #[test]
    fn substitution_site_counts_single_bases() {
        let spec = AlleleSpec::new("A", "G");
        assert_eq!(spec.kind, SiteKind::Substitution);
        let reads = vec![
            make_read(100, "5M", "AAAAA"),
            make_read(100, "5M", "CCACC"),
            make_read(100, "5M", "TTGTT"),
        ];
        let (counts, depth) = tally_reads(&reads, 102, &spec);
        assert_eq!(depth, 3);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["G"], 1);
    }

    #[test]
    fn substitution_site_counts_deleted_columns_as_gap_alleles() {
        let spec = AlleleSpec::new("A", "G");
        let reads = vec![make_read(100, "2M1D2M", "CCCC")];
        let (counts, depth) = tally_reads(&reads, 102, &spec);
        assert_eq!(depth, 1);
        assert_eq!(counts["-"], 1);
    }

    #[test]
    fn insertion_site_pads_the_reference() {
        let spec = AlleleSpec::new("A", "ATG");
        assert_eq!(spec.kind, SiteKind::Insertion);
        assert_eq!(spec.ref_allele, "AII");
        assert_eq!(spec.alt_allele, "ATG");
    }

    #[test]
    fn deletion_site_pads_the_alternate() {
        let spec = AlleleSpec::new("AT", "A");
        assert_eq!(spec.kind, SiteKind::Deletion);
        assert_eq!(spec.ref_allele, "AT");
        assert_eq!(spec.alt_allele, "A-");
    }

    #[test]
    fn insertion_supporting_read_keeps_the_multibase_allele() {
        let spec = AlleleSpec::new("A", "ATG");
        // Site at genomic 100: A at 100 followed by a 2-base insertion
        let with_ins = make_read(98, "3M2I2M", "CCATGCC");
        let without_ins = make_read(98, "5M", "CCACC");
        let (counts, depth) = tally_reads(&[with_ins, without_ins], 100, &spec);
        assert_eq!(depth, 2);
        assert_eq!(counts["ATG"], 1);
        assert_eq!(counts["A"], 1);
    }

    #[test]
    fn multibase_context_without_insertion_tag_collapses() {
        let spec = AlleleSpec::new("A", "ATG");
        // Full-length extraction "ATG" by coincidence of downstream bases
        let read = make_read(98, "7M", "CCATGCC");
        let (counts, _) = tally_reads(&[read], 100, &spec);
        assert_eq!(counts["A"], 1);
    }

    #[test]
    fn truncated_insertion_match_expands_to_the_full_allele() {
        let spec = AlleleSpec::new("A", "ATG");
        // Read ends inside the insertion: columns A,T with tags M,I
        let read = make_read(98, "3M1I", "CCAT");
        let (counts, depth) = tally_reads(&[read], 100, &spec);
        assert_eq!(depth, 1);
        assert_eq!(counts["ATG"], 1);
    }

    #[test]
    fn truncated_insertion_without_tag_collapses() {
        let spec = AlleleSpec::new("AC", "ACTGG");
        // Truncated "AC" matches both prefixes but carries no insertion tag
        let read = make_read(98, "4M", "CCAC");
        let (counts, _) = tally_reads(&[read], 100, &spec);
        assert_eq!(counts["A"], 1);
    }

    #[test]
    fn deletion_supporting_read_keeps_the_gapped_allele() {
        let spec = AlleleSpec::new("AT", "A");
        let with_del = make_read(98, "3M1D1M", "CCAG");
        let with_ref = make_read(98, "5M", "CCATG");
        let (counts, depth) = tally_reads(&[with_del, with_ref], 100, &spec);
        assert_eq!(depth, 2);
        assert_eq!(counts["A-"], 1);
        assert_eq!(counts["AT"], 1);
    }

    #[test]
    fn truncated_deletion_match_expands_without_tag_gating() {
        let spec = AlleleSpec::new("ATT", "A");
        // Read ends after the first deleted column: "A-" matches alt prefix
        let read = make_read(98, "3M1D", "CCA");
        let (counts, _) = tally_reads(&[read], 100, &spec);
        assert_eq!(counts["A--"], 1);
    }

    #[test]
    fn reads_clipped_over_the_target_do_not_contribute() {
        let spec = AlleleSpec::new("A", "G");
        // Leading clip covers genomic 100-101, alignment starts at 102
        let clipped = make_read(102, "2S3M", "GGG");
        let spanning = make_read(98, "5M", "CCACC");
        let (counts, depth) = tally_reads(&[clipped, spanning], 100, &spec);
        assert_eq!(depth, 1);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["A"], 1);
    }

    #[test]
    fn malformed_read_is_skipped_without_poisoning_the_tally() {
        let spec = AlleleSpec::new("A", "G");
        let malformed = make_read(98, "9M", "CCACC");
        let good = make_read(98, "5M", "CCGCC");
        let (counts, depth) = tally_reads(&[malformed, good], 100, &spec);
        assert_eq!(depth, 1);
        assert_eq!(counts["G"], 1);
    }

    #[test]
    fn upstream_insertions_shift_the_extraction_offset() {
        let spec = AlleleSpec::new("A", "G");
        // 2 inserted bases upstream of the site shift the column of
        // genomic 101 from index 3 to index 5
        let read = make_read(98, "1M2I5M", "CTTCAGAA");
        let (counts, depth) = tally_reads(&[read], 101, &spec);
        assert_eq!(depth, 1);
        assert_eq!(counts["G"], 1);
    }
}

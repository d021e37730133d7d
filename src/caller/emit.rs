//! Classifies a tallied candidate site and decides whether a heterozygous
//! call is emitted.

use super::{
    align::GAP,
    tally::{AlleleSpec, INS_PAD},
};
use std::collections::HashMap;

/// A heterozygous call ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedVariant {
    pub chrom: String,
    /// 0-based position; rendered 1-based on output.
    pub pos: i64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub alt_count: u32,
    pub depth: u32,
    pub vaf: f64,
}

/// Evaluates one candidate against its tally.
///
/// A site with a single observed allele is homozygous and is not emitted;
/// a site where ref or alt has no read support is ambiguous and is not
/// emitted; otherwise the variant allele fraction must fall strictly inside
/// the `(threshold, 1 - threshold)` band, which excludes near-homozygous
/// and loss-of-heterozygosity sites.
pub fn evaluate(
    chrom: &str,
    pos: i64,
    spec: &AlleleSpec,
    counts: &HashMap<String, u32>,
    depth: u32,
    threshold: f64,
) -> Option<EmittedVariant> {
    // Reconcile the dual padding schemes into one canonical representation:
    // insertion placeholders collapse to the leading base, after which a
    // deletion-shaped pair is re-padded with gap markers so the tally keys
    // line up.
    let ref_allele = collapse_ins_padding(&spec.ref_allele);
    let mut alt_allele = collapse_ins_padding(&spec.alt_allele);
    if ref_allele.len() > alt_allele.len() {
        alt_allele = pad_with_gaps(&alt_allele, ref_allele.len());
    }

    if counts.len() == 1 {
        // single observed allele: homozygous
        return None;
    }
    counts.get(&ref_allele)?;
    let alt_count = *counts.get(&alt_allele)?;

    let alt_out = strip_gap_suffix(&alt_allele);
    let vaf = round5(f64::from(alt_count) / f64::from(depth));
    if threshold < vaf && vaf < 1.0 - threshold {
        Some(EmittedVariant {
            chrom: chrom.to_string(),
            pos,
            ref_allele,
            alt_allele: alt_out,
            alt_count,
            depth,
            vaf,
        })
    } else {
        None
    }
}

/// Collapses an allele whose entire post-first-base suffix is the insertion
/// placeholder down to its leading base.
fn collapse_ins_padding(allele: &str) -> String {
    let bytes = allele.as_bytes();
    if !bytes.is_empty() && bytes[1..].iter().all(|&b| b == INS_PAD) {
        (bytes[0] as char).to_string()
    } else {
        allele.to_string()
    }
}

/// Strips a trailing all-gap-marker suffix down to the leading base.
fn strip_gap_suffix(allele: &str) -> String {
    let bytes = allele.as_bytes();
    if !bytes.is_empty() && bytes[1..].iter().all(|&b| b == GAP) {
        (bytes[0] as char).to_string()
    } else {
        allele.to_string()
    }
}

fn pad_with_gaps(allele: &str, width: usize) -> String {
    let mut padded = allele.to_string();
    while padded.len() < width {
        padded.push(GAP as char);
    }
    padded
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

//! Per-read view of an alignment record restricted to the fields needed
//! for allele counting.

use crate::utils::Result;
use rust_htslib::bam::{self, record::Cigar, Read};

#[derive(Debug, PartialEq, Clone)]
pub struct SiteRead {
    /// Unique identifier for the read.
    pub id: String,
    /// 0-based leftmost aligned reference position (soft clips excluded).
    pub start: i64,
    /// Full CIGAR of the alignment, clip operations included.
    pub ops: Vec<Cigar>,
    /// Query bases with soft-clipped ends removed.
    pub bases: Vec<u8>,
}

impl SiteRead {
    /// Creates a `SiteRead` from an HTSlib record. Unmapped or CIGAR-less
    /// records yield `None`.
    pub fn from_hts_rec(rec: &bam::Record) -> Option<SiteRead> {
        if rec.is_unmapped() {
            return None;
        }
        let ops = rec.cigar().take().to_vec();
        if ops.is_empty() {
            return None;
        }

        let seq = rec.seq().as_bytes();
        let lead = match ops.first() {
            Some(Cigar::SoftClip(len)) => *len as usize,
            _ => 0,
        };
        let trail = if ops.len() > 1 {
            match ops.last() {
                Some(Cigar::SoftClip(len)) => *len as usize,
                _ => 0,
            }
        } else {
            0
        };
        if lead + trail > seq.len() {
            return None;
        }
        let bases = seq[lead..seq.len() - trail].to_vec();

        Some(SiteRead {
            id: String::from_utf8_lossy(rec.qname()).into_owned(),
            start: rec.pos(),
            ops,
            bases,
        })
    }

    /// Fetches all reads overlapping the half-open window `[pos, pos + 1)`.
    pub fn fetch_at(
        reader: &mut bam::IndexedReader,
        chrom: &str,
        pos: i64,
    ) -> Result<Vec<SiteRead>> {
        reader
            .fetch((chrom, pos, pos + 1))
            .map_err(|e| format!("BAM fetch error at {}:{}: {}", chrom, pos + 1, e))?;

        let mut reads = Vec::new();
        for rec in reader.records() {
            let rec = rec
                .map_err(|e| format!("Failed to read BAM record at {}:{}: {}", chrom, pos + 1, e))?;
            if let Some(read) = SiteRead::from_hts_rec(&rec) {
                reads.push(read);
            }
        }
        Ok(reads)
    }
}

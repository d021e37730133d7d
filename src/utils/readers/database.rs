//! Readers for flat-text common-variant databases.
//!
//! Two schemas are supported: a KRGDB-style frequency table and a
//! per-chromosome VCF-like table. Records with more than one alternate
//! allele in the frequency table are ambiguous and are skipped, never
//! emitted.

use crate::utils::Result;
use clap::ValueEnum;
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::Path,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DbSchema {
    /// KRGDB frequency table: ref at column 5, `allele:frequency` list at column 7
    #[value(name = "krgdb")]
    Krgdb,
    /// VCF-like table: chrom, pos, id, ref, alt
    #[value(name = "1000g")]
    ThousandGenomes,
}

/// A candidate site taken from the database, with a 0-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCandidate {
    pub chrom: String,
    pub pos: i64,
    pub ref_allele: String,
    pub alt_allele: String,
}

pub struct CandidateReader {
    lines: Lines<BufReader<File>>,
    schema: DbSchema,
    line_num: usize,
    header_skipped: bool,
    /// Frequency-table records dropped because they list multiple alternate alleles.
    pub num_ambiguous: u64,
}

impl CandidateReader {
    pub fn new(path: &Path, schema: DbSchema) -> Result<CandidateReader> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open database {}: {}", path.display(), e))?;
        Ok(CandidateReader {
            lines: BufReader::new(file).lines(),
            schema,
            line_num: 0,
            header_skipped: false,
            num_ambiguous: 0,
        })
    }
}

impl Iterator for CandidateReader {
    type Item = Result<VariantCandidate>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(format!("Error reading database: {}", e))),
            };
            self.line_num += 1;
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // The frequency table carries a column-header row before the records
            if self.schema == DbSchema::Krgdb && !self.header_skipped {
                self.header_skipped = true;
                continue;
            }
            match parse_record(line, self.schema, self.line_num) {
                Ok(Some(candidate)) => return Some(Ok(candidate)),
                Ok(None) => {
                    self.num_ambiguous += 1;
                    continue;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Parses one record line. `Ok(None)` marks an ambiguous multi-alt record.
fn parse_record(
    line: &str,
    schema: DbSchema,
    line_num: usize,
) -> Result<Option<VariantCandidate>> {
    let cols: Vec<&str> = line.split('\t').collect();
    match schema {
        DbSchema::Krgdb => {
            if cols.len() < 7 {
                return Err(format!(
                    "Database line {}: expected at least 7 columns, found {}",
                    line_num,
                    cols.len()
                ));
            }
            let alts = parse_alt_list(cols[6], line_num)?;
            if alts.len() != 1 {
                return Ok(None);
            }
            Ok(Some(VariantCandidate {
                chrom: cols[0].to_string(),
                pos: parse_pos(cols[1], line_num)?,
                ref_allele: cols[4].to_string(),
                alt_allele: alts.into_iter().next().unwrap(),
            }))
        }
        DbSchema::ThousandGenomes => {
            if cols.len() < 5 {
                return Err(format!(
                    "Database line {}: expected at least 5 columns, found {}",
                    line_num,
                    cols.len()
                ));
            }
            Ok(Some(VariantCandidate {
                chrom: cols[0].to_string(),
                pos: parse_pos(cols[1], line_num)?,
                ref_allele: cols[3].to_string(),
                alt_allele: cols[4].to_string(),
            }))
        }
    }
}

/// Parses the comma-separated `allele:frequency` list; the list carries a
/// trailing empty field.
fn parse_alt_list(field: &str, line_num: usize) -> Result<Vec<String>> {
    let mut alts = Vec::new();
    for entry in field.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (allele, freq) = entry.split_once(':').ok_or_else(|| {
            format!(
                "Database line {}: malformed allele entry '{}': expected 'allele:frequency'",
                line_num, entry
            )
        })?;
        freq.parse::<f64>().map_err(|_| {
            format!(
                "Database line {}: invalid frequency '{}' for allele '{}'",
                line_num, freq, allele
            )
        })?;
        alts.push(allele.to_string());
    }
    Ok(alts)
}

fn parse_pos(field: &str, line_num: usize) -> Result<i64> {
    let pos: i64 = field.parse().map_err(|_| {
        format!(
            "Database line {}: invalid position '{}': must be a positive integer",
            line_num, field
        )
    })?;
    if pos < 1 {
        return Err(format!(
            "Database line {}: position {} is not 1-based",
            line_num, pos
        ));
    }
    Ok(pos - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn reader_over(content: &str, schema: DbSchema) -> (NamedTempFile, CandidateReader) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        let reader = CandidateReader::new(file.path(), schema).unwrap();
        (file, reader)
    }

    #[test]
    fn krgdb_single_alt_record_parsed() {
        let content = "#comment\nCHROM\tPOS\tID\tX\tREF\tX\tALTS\nchr1\t1000\trs1\t.\tA\t.\tG:0.2500,\t\n";
        let (_file, mut reader) = reader_over(content, DbSchema::Krgdb);
        let candidate = reader.next().unwrap().unwrap();
        assert_eq!(
            candidate,
            VariantCandidate {
                chrom: "chr1".to_string(),
                pos: 999,
                ref_allele: "A".to_string(),
                alt_allele: "G".to_string(),
            }
        );
        assert!(reader.next().is_none());
        assert_eq!(reader.num_ambiguous, 0);
    }

    #[test]
    fn krgdb_multi_alt_record_skipped_as_ambiguous() {
        let content = "HEADER\nchr1\t1000\trs1\t.\tA\t.\tG:0.2,T:0.1,\t\nchr1\t2000\trs2\t.\tC\t.\tT:0.3,\t\n";
        let (_file, mut reader) = reader_over(content, DbSchema::Krgdb);
        let candidate = reader.next().unwrap().unwrap();
        assert_eq!(candidate.pos, 1999);
        assert_eq!(candidate.alt_allele, "T");
        assert!(reader.next().is_none());
        assert_eq!(reader.num_ambiguous, 1);
    }

    #[test]
    fn krgdb_malformed_frequency_is_an_error() {
        let content = "HEADER\nchr1\t1000\trs1\t.\tA\t.\tG:x,\t\n";
        let (_file, mut reader) = reader_over(content, DbSchema::Krgdb);
        assert!(reader.next().unwrap().is_err());
    }

    #[test]
    fn thousand_genomes_record_parsed() {
        let content = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\nchr2\t2000\trs2\tC\tT\t.\t.\t.\n";
        let (_file, mut reader) = reader_over(content, DbSchema::ThousandGenomes);
        let candidate = reader.next().unwrap().unwrap();
        assert_eq!(candidate.chrom, "chr2");
        assert_eq!(candidate.pos, 1999);
        assert_eq!(candidate.ref_allele, "C");
        assert_eq!(candidate.alt_allele, "T");
    }

    #[test]
    fn short_line_is_an_error() {
        let content = "chr1\t1000\n";
        let (_file, mut reader) = reader_over(content, DbSchema::ThousandGenomes);
        assert!(reader.next().unwrap().is_err());
    }
}

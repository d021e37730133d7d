//! Defines the `VcfWriter` struct for accumulating heterozygous calls and
//! writing them to a VCF-like text file.
//!
//! Records are held back until `finish` so that the duplicate-position rule
//! can be applied: the database may list overlapping or ambiguous entries at
//! one coordinate, and rather than guessing which is correct, every record
//! at a repeated position is suppressed.

use crate::caller::emit::EmittedVariant;
use crate::utils::Result;
use itertools::Itertools;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Header lines used when no template file is supplied.
const VCF_HEADER_LINES: [&str; 6] = [
    "##fileformat=VCFv4.2",
    r#"##INFO=<ID=AC,Number=A,Type=Integer,Description="Count of reads supporting the alternate allele">"#,
    r#"##INFO=<ID=AF,Number=A,Type=Float,Description="Variant allele fraction derived from read support">"#,
    r#"##INFO=<ID=AN,Number=1,Type=Integer,Description="Total number of alleles in called genotypes">"#,
    r#"##INFO=<ID=DP,Number=1,Type=Integer,Description="Number of overlapping reads considered">"#,
    r#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#,
];

pub struct VcfWriter {
    path: PathBuf,
    header: Vec<String>,
    pending: BTreeMap<(String, i64), Vec<EmittedVariant>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    /// Records dropped because their position produced more than one emission.
    pub suppressed: usize,
}

impl VcfWriter {
    pub fn new(path: &Path, template: Option<&Path>, sample_name: &str) -> Result<VcfWriter> {
        let header = match template {
            Some(template_path) => read_template(template_path)?,
            None => builtin_header(sample_name),
        };
        Ok(VcfWriter {
            path: path.to_path_buf(),
            header,
            pending: BTreeMap::new(),
        })
    }

    pub fn push(&mut self, variant: EmittedVariant) {
        self.pending
            .entry((variant.chrom.clone(), variant.pos))
            .or_default()
            .push(variant);
    }

    /// Writes the header and all retained records, ordered by position.
    pub fn finish(self) -> Result<WriteStats> {
        let file = File::create(&self.path)
            .map_err(|e| format!("Failed to create {}: {}", self.path.display(), e))?;
        let mut out = BufWriter::new(file);

        for line in &self.header {
            writeln!(out, "{}", line)
                .map_err(|e| format!("Failed to write {}: {}", self.path.display(), e))?;
        }

        let mut stats = WriteStats {
            written: 0,
            suppressed: 0,
        };
        for records in self.pending.values() {
            if records.len() != 1 {
                stats.suppressed += records.len();
                continue;
            }
            writeln!(out, "{}", format_record(&records[0]))
                .map_err(|e| format!("Failed to write {}: {}", self.path.display(), e))?;
            stats.written += 1;
        }

        out.flush()
            .map_err(|e| format!("Failed to flush {}: {}", self.path.display(), e))?;
        Ok(stats)
    }
}

fn format_record(v: &EmittedVariant) -> String {
    let pos = (v.pos + 1).to_string();
    let info = format!(
        "AC={};AF={};AN=2;DP={}",
        v.alt_count,
        format_vaf(v.vaf),
        v.depth
    );
    [
        v.chrom.as_str(),
        &pos,
        ".",
        &v.ref_allele,
        &v.alt_allele,
        ".",
        ".",
        &info,
        "GT",
        "0/1",
    ]
    .iter()
    .join("\t")
}

fn format_vaf(vaf: f64) -> String {
    format!("{}", vaf)
}

fn builtin_header(sample_name: &str) -> Vec<String> {
    let mut header: Vec<String> = VCF_HEADER_LINES.iter().map(|s| s.to_string()).collect();
    header.push(format!(
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}",
        sample_name
    ));
    header
}

fn read_template(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open VCF template {}: {}", path.display(), e))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line =
            line.map_err(|e| format!("Failed to read VCF template {}: {}", path.display(), e))?;
        lines.push(line);
    }
    Ok(lines)
}

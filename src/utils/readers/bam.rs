use crate::utils::Result;
use rust_htslib::bam;
use std::path::Path;

pub fn open_bam_reader(reads_path: &Path) -> Result<bam::IndexedReader> {
    bam::IndexedReader::from_path(reads_path).map_err(|e| {
        format!(
            "Failed to create BAM reader from {}: {}",
            reads_path.display(),
            e
        )
    })
}

//! Invocation of the external HapCUT2 haplotype-phasing toolchain.

use crate::utils::Result;
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

/// Runs `extractHAIRS` and `HAPCUT2` from `hapcut_dir` against a called VCF.
/// The intermediate fragment file is removed afterwards, whether or not
/// HAPCUT2 succeeded.
pub fn run_hapcut2(hapcut_dir: &Path, bam_path: &Path, vcf_path: &Path) -> Result<()> {
    let fragment_path = sibling_with_extension(vcf_path, "fragment");
    let haplotype_path = sibling_with_extension(vcf_path, "haplotype");

    log::info!("Phasing {} with HapCUT2", vcf_path.display());

    let mut extract = Command::new(hapcut_dir.join("extractHAIRS"));
    extract
        .args(["--hic", "1"])
        .arg("--bam")
        .arg(bam_path)
        .arg("--VCF")
        .arg(vcf_path)
        .arg("--out")
        .arg(&fragment_path)
        .args(["--indels", "1"]);
    run_tool(&mut extract, "extractHAIRS")?;

    let mut hapcut = Command::new(hapcut_dir.join("HAPCUT2"));
    hapcut
        .args(["--hic", "1"])
        .arg("--fragments")
        .arg(&fragment_path)
        .arg("--VCF")
        .arg(vcf_path)
        .arg("--output")
        .arg(&haplotype_path);
    let result = run_tool(&mut hapcut, "HAPCUT2");

    if let Err(e) = fs::remove_file(&fragment_path) {
        log::warn!(
            "Failed to remove fragment file {}: {}",
            fragment_path.display(),
            e
        );
    }
    result?;

    log::info!("Phased haplotypes written to {}", haplotype_path.display());
    Ok(())
}

fn sibling_with_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

fn run_tool(command: &mut Command, name: &str) -> Result<()> {
    log::debug!("Running {:?}", command);
    let status = command
        .status()
        .map_err(|e| format!("Failed to run {}: {}", name, e))?;
    if !status.success() {
        return Err(format!("{} exited with {}", name, status));
    }
    Ok(())
}

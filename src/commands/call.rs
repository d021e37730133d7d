use crate::caller::{
    emit::evaluate,
    read::SiteRead,
    tally::{tally_reads, AlleleSpec},
    writers::write_vcf::VcfWriter,
};
use crate::cli::CallArgs;
use crate::phasing;
use crate::utils::{
    readers::{bam::open_bam_reader, database::CandidateReader},
    Result,
};
use std::path::PathBuf;

pub fn call(args: CallArgs) -> Result<()> {
    let mut bam = open_bam_reader(&args.reads_path)?;
    let vcf_path = PathBuf::from(format!(
        "{}.{}.vcf",
        args.output_prefix.display(),
        args.chrom
    ));
    let mut writer = VcfWriter::new(&vcf_path, args.vcf_template.as_deref(), &args.sample_name)?;
    let mut reader = CandidateReader::new(&args.database, args.db_schema)?;

    log::info!(
        "Scanning candidate sites from {} on {}",
        args.database.display(),
        args.chrom
    );

    let mut num_candidates = 0u64;
    let mut num_skipped_contig = 0u64;
    for candidate in reader.by_ref() {
        let candidate = candidate?;
        if candidate.chrom != args.chrom {
            num_skipped_contig += 1;
            continue;
        }
        num_candidates += 1;

        let reads = SiteRead::fetch_at(&mut bam, &candidate.chrom, candidate.pos)?;
        let spec = AlleleSpec::new(&candidate.ref_allele, &candidate.alt_allele);
        let (counts, depth) = tally_reads(&reads, candidate.pos, &spec);
        if let Some(variant) = evaluate(
            &candidate.chrom,
            candidate.pos,
            &spec,
            &counts,
            depth,
            args.threshold,
        ) {
            log::debug!("Heterozygous site at {}:{}", variant.chrom, variant.pos + 1);
            writer.push(variant);
        }
    }

    if num_skipped_contig > 0 {
        log::warn!(
            "{} database records were not on {} and were ignored",
            num_skipped_contig,
            args.chrom
        );
    }
    log::info!(
        "Evaluated {} candidate sites ({} ambiguous records skipped)",
        num_candidates,
        reader.num_ambiguous
    );

    let stats = writer.finish()?;
    log::info!(
        "Wrote {} heterozygous sites to {} ({} records suppressed at duplicated positions)",
        stats.written,
        vcf_path.display(),
        stats.suppressed
    );

    if let Some(hapcut_dir) = &args.hapcut_dir {
        phasing::run_hapcut2(hapcut_dir, &args.reads_path, &vcf_path)?;
    }

    Ok(())
}

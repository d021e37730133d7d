use crate::cli::PhaseArgs;
use crate::phasing;
use crate::utils::Result;

pub fn phase(args: PhaseArgs) -> Result<()> {
    phasing::run_hapcut2(&args.hapcut_dir, &args.reads_path, &args.vcf_path)
}

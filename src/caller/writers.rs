pub mod write_vcf;

pub mod bam;
pub mod database;

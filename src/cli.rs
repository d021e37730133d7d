use crate::utils::{readers::database::DbSchema, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter};
use owo_colors::{
    colors::{Blue, Green, Magenta, Red, Yellow},
    OwoColorize, Stream, Style,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub const FULL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "hetscan",
          version = FULL_VERSION,
          about = "Heterozygous site detection at common-variant positions for haplotype phasing",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable or disable color output in logging
    #[arg(long, value_enum, default_value_t = Color::Auto, global = true, help_heading = "Advanced")]
    color: Color,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Call heterozygous sites at common-variant positions")]
    Call(CallArgs),
    #[clap(about = "Phase a called VCF with the HapCUT2 toolchain")]
    Phase(PhaseArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Call(_) => "call",
            Command::Phase(_) => "phase",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct CallArgs {
    /// BAM file with aligned reads
    #[arg(
        short = 'b',
        long = "reads",
        value_name = "READS",
        value_parser = check_file_exists,
        required = true
    )]
    pub reads_path: PathBuf,

    /// Chromosome to scan
    #[arg(short = 'c', long = "chrom", value_name = "CHROM", required = true)]
    pub chrom: String,

    /// VAF band half-width: emit only sites with THRESHOLD < VAF < 1 - THRESHOLD
    #[arg(
        short = 't',
        long = "threshold",
        value_name = "THRESHOLD",
        default_value = "0.1",
        value_parser = threshold_in_range
    )]
    pub threshold: f64,

    /// Common-variant database file for the selected chromosome
    #[arg(
        short = 'd',
        long = "database",
        value_name = "DATABASE",
        value_parser = check_file_exists,
        required = true
    )]
    pub database: PathBuf,

    /// Schema of the common-variant database
    #[arg(long = "db-schema", value_name = "SCHEMA", value_enum, required = true)]
    pub db_schema: DbSchema,

    /// Prefix for output files (<PREFIX>.<CHROM>.vcf and phasing products)
    #[arg(
        short = 'o',
        long = "output-prefix",
        value_name = "OUTPUT_PREFIX",
        value_parser = check_prefix_path,
        required = true
    )]
    pub output_prefix: PathBuf,

    /// Text file with VCF header lines to prepend to the output [default: built-in header]
    #[arg(
        long = "vcf-template",
        value_name = "TEMPLATE",
        value_parser = check_file_exists,
        help_heading = "Advanced"
    )]
    pub vcf_template: Option<PathBuf>,

    /// Sample name used in the built-in VCF header
    #[arg(
        long = "sample-name",
        value_name = "SAMPLE_NAME",
        default_value = "SAMPLE",
        value_parser = check_sample_name_nonempty,
        help_heading = "Advanced"
    )]
    pub sample_name: String,

    /// Directory containing extractHAIRS and HAPCUT2; when set, phasing runs after calling
    #[arg(long = "hapcut-dir", value_name = "DIR", help_heading = "Phasing")]
    pub hapcut_dir: Option<PathBuf>,
}

impl CallArgs {
    pub fn preflight(&self) -> Result<()> {
        check_bam_index(&self.reads_path)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct PhaseArgs {
    /// BAM file with aligned reads
    #[arg(
        short = 'b',
        long = "reads",
        value_name = "READS",
        value_parser = check_file_exists,
        required = true
    )]
    pub reads_path: PathBuf,

    /// VCF file produced by hetscan call
    #[arg(
        short = 'f',
        long = "vcf",
        value_name = "VCF",
        value_parser = check_file_exists,
        required = true
    )]
    pub vcf_path: PathBuf,

    /// Directory containing extractHAIRS and HAPCUT2
    #[arg(long = "hapcut-dir", value_name = "DIR", required = true)]
    pub hapcut_dir: PathBuf,
}

impl PhaseArgs {
    pub fn preflight(&self) -> Result<()> {
        check_bam_index(&self.reads_path)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Color {
    Always,
    Auto,
    Never,
}

impl Color {
    fn apply(self) {
        match self {
            Color::Always => owo_colors::set_override(true),
            Color::Auto => {}
            Color::Never => owo_colors::set_override(false),
        }
    }
}

pub fn init_verbose(args: &Cli) {
    args.color.apply();

    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(format_log)
        .filter_level(filter_level)
        .init();
}

#[inline(always)]
fn level_style(level: Level) -> (&'static str, Style) {
    match level {
        Level::Error => ("ERROR", Style::new().fg::<Red>().bold()),
        Level::Warn => ("WARN", Style::new().fg::<Yellow>()),
        Level::Info => ("INFO", Style::new().fg::<Green>()),
        Level::Debug => ("DEBUG", Style::new().fg::<Blue>()),
        Level::Trace => ("TRACE", Style::new().fg::<Magenta>()),
    }
}

fn format_log(buf: &mut env_logger::fmt::Formatter, record: &log::Record) -> std::io::Result<()> {
    let (label, style) = level_style(record.level());
    let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let painted_label = label.if_supports_color(Stream::Stderr, |t| style.style(t));
    writeln!(buf, "{ts} [{}] - {}", painted_label, record.args())
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(PathBuf::from(s))
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_sample_name_nonempty(s: &str) -> Result<String> {
    if s.trim().is_empty() {
        Err("Sample name cannot be an empty string".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn threshold_in_range(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse threshold: {}", e))?;
    if value <= 0.0 || value >= 0.5 {
        Err(format!(
            "Threshold must be strictly between 0.0 and 0.5, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

fn check_bam_index(reads_path: &Path) -> Result<()> {
    let appended = PathBuf::from(format!("{}.bai", reads_path.display()));
    let replaced = reads_path.with_extension("bai");
    let csi = PathBuf::from(format!("{}.csi", reads_path.display()));
    if appended.exists() || replaced.exists() || csi.exists() {
        Ok(())
    } else {
        Err(format!(
            "No index found for {}: expected {} or {}",
            reads_path.display(),
            appended.display(),
            replaced.display()
        ))
    }
}

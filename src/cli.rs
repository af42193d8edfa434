use crate::utils::util::Result;
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use vcf_spill_sort::DEFAULT_CHUNK_SIZE;

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| env!("CARGO_PKG_VERSION").to_string());

#[derive(Parser, Debug)]
#[command(name = "vcx",
          version = &**FULL_VERSION,
          about = "Bulk VCF toolkit: count, collect, filter, sort and merge",
          long_about = None,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count data rows in a VCF file
    Count(CountArgs),
    /// Materialise data rows as a JSON array
    Collect(CollectArgs),
    /// Keep rows matching an include-expression
    Filter(FilterArgs),
    /// Sort a VCF by chromosome and position
    Sort(SortArgs),
    /// Merge two VCF files by chromosome and position
    Merge(MergeArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Count(_) => "count",
            Command::Collect(_) => "collect",
            Command::Filter(_) => "filter",
            Command::Sort(_) => "sort",
            Command::Merge(_) => "merge",
        }
    }
}

#[derive(Parser, Debug)]
pub struct CountArgs {
    /// Input VCF file
    #[arg(long = "vcf", value_name = "VCF", value_parser = check_file_exists)]
    pub vcf: PathBuf,

    /// Treat the input as gzip-compressed regardless of its suffix
    #[arg(long = "gzip")]
    pub gzip: bool,
}

#[derive(Parser, Debug)]
pub struct CollectArgs {
    /// Input VCF file
    #[arg(long = "vcf", value_name = "VCF", value_parser = check_file_exists)]
    pub vcf: PathBuf,

    /// Number of rows to collect [default: all rows]
    #[arg(short = 'n', long = "num-rows", value_name = "N")]
    pub num_rows: Option<u64>,

    /// Zero-based data row to start from
    #[arg(short = 's', long = "start-row", value_name = "START", default_value_t = 0)]
    pub start_row: u64,

    /// Treat the input as gzip-compressed regardless of its suffix
    #[arg(long = "gzip")]
    pub gzip: bool,

    /// Number of threads to use
    #[arg(
        short = '@',
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,
}

#[derive(Parser, Debug)]
pub struct FilterArgs {
    /// Include-expression, e.g. 'QUAL >= 30 && AF < 0.1'
    #[arg(short = 'i', long = "include", value_name = "EXPR")]
    pub include: String,

    /// Input VCF file
    #[arg(long = "vcf", value_name = "VCF", value_parser = check_file_exists)]
    pub vcf: PathBuf,

    /// Output VCF file
    #[arg(short = 'o', long = "output", value_name = "FILE", value_parser = check_prefix_path)]
    pub output: PathBuf,

    /// Treat the input as gzip-compressed regardless of its suffix
    #[arg(long = "gzip")]
    pub gzip: bool,

    /// Number of threads to use
    #[arg(
        short = '@',
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,
}

#[derive(Parser, Debug)]
pub struct SortArgs {
    /// Input VCF file
    #[arg(long = "vcf", value_name = "VCF", value_parser = check_file_exists)]
    pub vcf: PathBuf,

    /// Output VCF file
    #[arg(short = 'o', long = "output", value_name = "FILE", value_parser = check_prefix_path)]
    pub output: PathBuf,

    /// Records per on-disk chunk
    #[arg(
        long = "chunk-size",
        value_name = "RECORDS",
        default_value_t = DEFAULT_CHUNK_SIZE,
        help_heading = "Advanced"
    )]
    pub chunk_size: usize,
}

#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// First input VCF file
    #[arg(value_name = "VCF1", value_parser = check_file_exists)]
    pub vcf1: PathBuf,

    /// Second input VCF file
    #[arg(value_name = "VCF2", value_parser = check_file_exists)]
    pub vcf2: PathBuf,

    /// Output VCF file
    #[arg(short = 'o', long = "output", value_name = "FILE", value_parser = check_prefix_path)]
    pub output: PathBuf,
}

/// Initializes logging from the `-v` count. Records go to stderr as
/// `[DD-MM-YYYY HH:MM:SS] - LEVEL - message`.
pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] - {} - {}",
                Local::now().format("%d-%m-%Y %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn threads_in_range(s: &str) -> Result<usize> {
    let threads: usize = s
        .parse::<usize>()
        .map_err(|_| crate::vcx_error!("`{}` is not a valid thread number", s))?;
    if threads == 0 {
        return Err(crate::vcx_error!("Number of threads must be >= 1"));
    }
    Ok(threads)
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(crate::vcx_error!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(crate::vcx_error!(
                "Path does not exist: {}",
                parent_dir.display()
            ));
        }
    }
    Ok(path.to_path_buf())
}

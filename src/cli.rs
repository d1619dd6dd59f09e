use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mokuro-extract")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract Japanese text from OCR JSON files")]
#[command(
    long_about = "mokuro-extract scans a directory tree for OCR .json page files, keeps every \
                  line containing Hiragana, Katakana or Kanji, and writes them to text files \
                  grouped by volume (the parent directory of each page)."
)]
#[command(after_help = "EXAMPLES:\n  \
    mokuro-extract\n  \
    mokuro-extract ~/manga/series --output-dir ~/text\n  \
    mokuro-extract --consolidated --output all_volumes.txt\n  \
    mokuro-extract --flat --consolidated")]
pub struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Consolidated output file name (never read back as input)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Directory the output files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Write a single consolidated file instead of one file per volume
    #[arg(long, overrides_with = "per_volume")]
    pub consolidated: bool,

    /// Write one file per volume, even if the config file says otherwise
    #[arg(long, overrides_with = "consolidated")]
    pub per_volume: bool,

    /// Only scan the root directory, not its subdirectories
    #[arg(long, overrides_with = "recursive")]
    pub flat: bool,

    /// Scan the whole subtree, even if the config file says otherwise
    #[arg(long, overrides_with = "flat")]
    pub recursive: bool,

    /// Maximum directory depth to descend
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Directory names to skip while scanning
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Configuration file path
    #[arg(short, long, env = "MOKURO_EXTRACT_CONFIG", help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for progress and results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show which files would be read and written without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a sample configuration file
    #[arg(long)]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_output_filename(self.output.clone())
            .with_output_dir(self.output_dir.clone())
            .with_per_volume(flag_pair(self.per_volume, self.consolidated))
            .with_recursive(flag_pair(self.recursive, self.flat))
            .with_max_depth(self.max_depth)
            .with_exclude(self.exclude.clone())
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// `Some(true)` / `Some(false)` for whichever of an on/off pair was given.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

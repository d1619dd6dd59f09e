use crate::error::{ExtractError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_FILENAME: &str = "combined_japanese_text.txt";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Walk the whole subtree instead of only the root directory.
    pub recursive: bool,
    /// Unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    pub follow_links: bool,
    pub skip_hidden: bool,
    pub exclude_dirs: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Consolidated output file; also never read back as input.
    pub filename: String,
    /// One `<volume>.txt` per volume instead of a single consolidated file.
    pub per_volume: bool,
    pub directory: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: None,
            follow_links: false,
            skip_hidden: false,
            exclude_dirs: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            per_volume: true,
            directory: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExtractError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ExtractError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ExtractError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["mokuro-extract.toml", ".mokuro-extract.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref filename) = cli_args.output_filename {
            self.output.filename = filename.clone();
        }

        if let Some(ref directory) = cli_args.output_dir {
            self.output.directory = directory.clone();
        }

        if let Some(per_volume) = cli_args.per_volume {
            self.output.per_volume = per_volume;
        }

        if let Some(recursive) = cli_args.recursive {
            self.scan.recursive = recursive;
        }

        if let Some(max_depth) = cli_args.max_depth {
            self.scan.max_depth = Some(max_depth);
        }

        if let Some(ref exclude) = cli_args.exclude {
            for dir in exclude {
                if !self.scan.exclude_dirs.contains(dir) {
                    self.scan.exclude_dirs.push(dir.clone());
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ExtractError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ExtractError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let filename = self.output.filename.trim();
        if filename.is_empty() {
            return Err(ExtractError::Config {
                message: "Output filename must not be empty".to_string(),
            });
        }

        if filename.contains('/') || filename.contains('\\') {
            return Err(ExtractError::Config {
                message: format!(
                    "Output filename must be a bare file name, use --output-dir for the directory: {}",
                    filename
                ),
            });
        }

        if self.scan.max_depth == Some(0) {
            return Err(ExtractError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        for pattern in &self.scan.exclude_patterns {
            Regex::new(pattern).map_err(|e| ExtractError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        Ok(())
    }

    /// Depth handed to the directory walker: the root's children only when
    /// the scan is flat.
    pub fn effective_max_depth(&self) -> usize {
        if self.scan.recursive {
            self.scan.max_depth.unwrap_or(usize::MAX)
        } else {
            1
        }
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_filename: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub per_volume: Option<bool>,
    pub recursive: Option<bool>,
    pub max_depth: Option<usize>,
    pub exclude: Option<Vec<String>>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_filename(mut self, filename: Option<String>) -> Self {
        self.output_filename = filename;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_per_volume(mut self, per_volume: Option<bool>) -> Self {
        self.per_volume = per_volume;
        self
    }

    pub fn with_recursive(mut self, recursive: Option<bool>) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<Vec<String>>) -> Self {
        self.exclude = exclude;
        self
    }
}

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, OutputConfig, ScanConfig};
pub use error::{ExtractError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    contains_japanese, ConfigSnapshot, Extraction, ExtractionObserver, ExtractionProgress,
    ExtractionReport, LineExtractor, OcrDocument, OutputLayout, OutputWriter, VolumeAggregate,
};
pub use scanner::{volume_key, JsonFile, JsonScanner, ScanResult, ROOT_VOLUME};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use indicatif::ProgressBar;
use std::path::Path;

/// Main library interface: one configured extraction run.
pub struct MokuroExtract {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl MokuroExtract {
    /// Create a new instance; installs the Ctrl+C handler.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// Create an instance around an existing shutdown flag (no signal handler).
    pub fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(output_formatter.shows_progress_bar());

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Scan `root`, extract the Japanese lines and write them out.
    pub fn extract<P: AsRef<Path>>(&self, root: P) -> Result<ExtractionReport> {
        let root = root.as_ref();
        self.shutdown.check_shutdown()?;

        let scan = self.scan(root)?;
        self.shutdown.check_shutdown()?;

        let extraction = self.extract_lines(&scan.files)?;
        self.shutdown.check_shutdown()?;

        let writer = OutputWriter::new(&self.config);
        let outcome = if extraction.aggregate.is_empty() {
            self.output_formatter.info(
                "Processing complete, but no Japanese text was found in any of the files.",
            );
            Default::default()
        } else {
            self.write_output(&writer, &extraction.aggregate)?
        };

        Ok(writer.create_extraction_report(
            root,
            &scan,
            &extraction,
            outcome,
            ConfigSnapshot::from(&self.config),
        ))
    }

    /// Discovery only; used for dry runs.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<ScanResult> {
        let root = root.as_ref();
        let scope = if self.config.scan.recursive {
            "and its subdirectories"
        } else {
            "(not descending into subdirectories)"
        };
        self.output_formatter.start_operation(&format!(
            "Finding all .json files in {} {}",
            root.display(),
            scope
        ));

        let spinner = self.progress_manager.create_spinner("Scanning...");
        let scanner = JsonScanner::new(&self.config);
        let result = scanner.scan_directory(root);
        spinner.finish_and_clear();
        let result = result?;

        for warning in &result.warnings {
            self.output_formatter.warning(warning);
        }

        self.output_formatter
            .info(&format!("Found {} JSON file(s) to process.", result.files.len()));
        self.output_formatter
            .debug(&scanner.get_statistics(&result.files).display_summary());

        Ok(result)
    }

    fn extract_lines(&self, files: &[JsonFile]) -> Result<Extraction> {
        let file_progress = self.progress_manager.create_file_progress(files.len() as u64);
        let observer = RunObserver {
            formatter: &self.output_formatter,
            progress_manager: &self.progress_manager,
            progress_bar: &file_progress,
        };

        let extractor = LineExtractor::new().with_shutdown(&self.shutdown);
        let extraction = match extractor.extract_files(files, &observer) {
            Ok(extraction) => extraction,
            Err(e) => {
                file_progress.abandon_with_message("Stopped");
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!(
                "Extracted {} lines from {} files",
                extraction.progress.lines_extracted, extraction.progress.files_processed
            ),
            extraction.progress.elapsed(),
        );

        Ok(extraction)
    }

    fn write_output(
        &self,
        writer: &OutputWriter,
        aggregate: &VolumeAggregate,
    ) -> Result<extractor::WriteOutcome> {
        match writer.layout() {
            OutputLayout::PerVolume => self
                .output_formatter
                .start_operation("Writing output to a separate file for each volume"),
            OutputLayout::Consolidated => self.output_formatter.start_operation(&format!(
                "Consolidating all text into a single file: '{}'",
                writer.consolidated_path().display()
            )),
        }

        writer.initialize()?;
        let outcome = writer.write(aggregate)?;

        for warning in &outcome.warnings {
            self.output_formatter.warning(warning);
        }

        Ok(outcome)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &ExtractError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Bridges per-file extraction events to the formatter and progress bar.
struct RunObserver<'a> {
    formatter: &'a OutputFormatter,
    progress_manager: &'a ProgressManager,
    progress_bar: &'a ProgressBar,
}

impl ExtractionObserver for RunObserver<'_> {
    fn file_started(&self, file: &JsonFile, progress: &ExtractionProgress) {
        ui::progress::update_file_progress(self.progress_bar, progress);
        self.formatter.file_progress(
            &file.display_path(),
            progress.files_done() + 1,
            progress.total_files,
        );
    }

    fn file_skipped(&self, _file: &JsonFile, error: &ExtractError) {
        self.progress_manager
            .suspend(|| self.formatter.warning(&error.user_message()));
    }

    fn file_finished(&self, file: &JsonFile, lines: usize, progress: &ExtractionProgress) {
        ui::progress::update_file_progress(self.progress_bar, progress);
        self.formatter.debug(&format!(
            "{} Japanese line(s) from {} -> {}",
            lines,
            file.display_path(),
            file.volume
        ));
    }
}

/// Run an extraction with default settings, no signal handler and no output.
pub fn extract_simple<P: AsRef<Path>>(
    root: P,
    output_dir: &Path,
    per_volume: bool,
) -> Result<ExtractionReport> {
    let mut config = Config::default();
    config.output.directory = output_dir.to_path_buf();
    config.output.per_volume = per_volume;
    config.validate()?;

    MokuroExtract::with_shutdown(
        config,
        OutputMode::Plain,
        0,
        true,
        GracefulShutdown::new_for_test(),
    )
    .extract(root)
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

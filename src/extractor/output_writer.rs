use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::extractor::line_extractor::{Extraction, VolumeAggregate};
use crate::scanner::ScanResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    PerVolume,
    Consolidated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFile {
    /// `None` for the consolidated file.
    pub volume: Option<String>,
    pub path: PathBuf,
    pub lines: usize,
}

#[derive(Debug, Default)]
pub struct WriteOutcome {
    pub outputs: Vec<OutputFile>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub root: PathBuf,
    pub layout: OutputLayout,
    pub files_found: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub lines_extracted: usize,
    pub volumes: usize,
    pub outputs: Vec<OutputFile>,
    pub warnings: Vec<String>,
    pub extraction_time: DateTime<Utc>,
    pub duration: Duration,
    pub config_used: ConfigSnapshot,
}

impl ExtractionReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub recursive: bool,
    pub per_volume: bool,
    pub output_filename: String,
    pub output_directory: PathBuf,
    pub exclude_dirs: Vec<String>,
}

impl From<&Config> for ConfigSnapshot {
    fn from(config: &Config) -> Self {
        Self {
            recursive: config.scan.recursive,
            per_volume: config.output.per_volume,
            output_filename: config.output.filename.clone(),
            output_directory: config.output.directory.clone(),
            exclude_dirs: config.scan.exclude_dirs.clone(),
        }
    }
}

pub struct OutputWriter {
    output_directory: PathBuf,
    filename: String,
    layout: OutputLayout,
}

impl OutputWriter {
    pub fn new(config: &Config) -> Self {
        let layout = if config.output.per_volume {
            OutputLayout::PerVolume
        } else {
            OutputLayout::Consolidated
        };

        Self {
            output_directory: config.output.directory.clone(),
            filename: config.output.filename.clone(),
            layout,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    pub fn get_output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn consolidated_path(&self) -> PathBuf {
        self.output_directory.join(&self.filename)
    }

    pub fn volume_path(&self, volume: &str) -> PathBuf {
        self.output_directory.join(format!("{}.txt", volume))
    }

    pub fn initialize(&self) -> Result<()> {
        if !self.output_directory.exists() {
            fs::create_dir_all(&self.output_directory).map_err(|e| ExtractError::OutputWrite {
                path: self.output_directory.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Writes the aggregate in the configured layout. In per-volume layout a
    /// failed volume becomes a warning and the rest are still written; the
    /// consolidated write fails as a whole.
    pub fn write(&self, aggregate: &VolumeAggregate) -> Result<WriteOutcome> {
        let mut outcome = WriteOutcome::default();

        if aggregate.is_empty() {
            return Ok(outcome);
        }

        match self.layout {
            OutputLayout::PerVolume => {
                for (volume, lines) in aggregate.volumes() {
                    let path = self.volume_path(volume);
                    match write_lines(&path, lines.iter().map(String::as_str)) {
                        Ok(count) => outcome.outputs.push(OutputFile {
                            volume: Some(volume.to_string()),
                            path,
                            lines: count,
                        }),
                        Err(e) => outcome.warnings.push(e.to_string()),
                    }
                }
            }
            OutputLayout::Consolidated => {
                let path = self.consolidated_path();
                let count = write_lines(&path, aggregate.flatten())?;
                outcome.outputs.push(OutputFile {
                    volume: None,
                    path,
                    lines: count,
                });
            }
        }

        Ok(outcome)
    }

    pub fn create_extraction_report(
        &self,
        root: &Path,
        scan: &ScanResult,
        extraction: &Extraction,
        outcome: WriteOutcome,
        config: ConfigSnapshot,
    ) -> ExtractionReport {
        let mut warnings = scan.warnings.clone();
        warnings.extend(extraction.progress.warnings.iter().cloned());
        warnings.extend(outcome.warnings);

        ExtractionReport {
            root: root.to_path_buf(),
            layout: self.layout,
            files_found: scan.files.len(),
            files_processed: extraction.progress.files_processed,
            files_skipped: extraction.progress.files_skipped,
            lines_extracted: extraction.aggregate.total_lines(),
            volumes: extraction.aggregate.volume_count(),
            outputs: outcome.outputs,
            warnings,
            extraction_time: Utc::now(),
            duration: extraction.progress.elapsed(),
            config_used: config,
        }
    }
}

/// One line per entry, each terminated by `\n`. The file is closed before
/// returning.
pub fn write_lines<'a, I>(path: &Path, lines: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let to_error = |e: std::io::Error| ExtractError::OutputWrite {
        path: path.display().to_string(),
        source: e,
    };

    let file = fs::File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    let mut count = 0;

    for line in lines {
        writer.write_all(line.as_bytes()).map_err(to_error)?;
        writer.write_all(b"\n").map_err(to_error)?;
        count += 1;
    }

    writer.flush().map_err(to_error)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::line_extractor::ExtractionProgress;
    use crate::scanner::JsonFile;
    use tempfile::TempDir;

    fn create_test_config(dir: &Path, per_volume: bool) -> Config {
        let mut config = Config::default();
        config.output.directory = dir.to_path_buf();
        config.output.per_volume = per_volume;
        config
    }

    fn create_test_aggregate() -> VolumeAggregate {
        let mut aggregate = VolumeAggregate::new();
        aggregate.extend("Volume 02", ["二巻"]);
        aggregate.extend("Volume 01", ["一巻", "続き"]);
        aggregate
    }

    #[test]
    fn test_per_volume_output() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(&create_test_config(temp_dir.path(), true));

        let outcome = writer.write(&create_test_aggregate()).unwrap();

        assert_eq!(outcome.outputs.len(), 2);
        assert_eq!(outcome.outputs[0].volume.as_deref(), Some("Volume 01"));
        assert_eq!(outcome.outputs[0].lines, 2);
        assert!(outcome.warnings.is_empty());

        let first = fs::read_to_string(temp_dir.path().join("Volume 01.txt")).unwrap();
        let second = fs::read_to_string(temp_dir.path().join("Volume 02.txt")).unwrap();
        assert_eq!(first, "一巻\n続き\n");
        assert_eq!(second, "二巻\n");
    }

    #[test]
    fn test_consolidated_output_in_volume_order() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(&create_test_config(temp_dir.path(), false));

        let outcome = writer.write(&create_test_aggregate()).unwrap();

        assert_eq!(outcome.outputs.len(), 1);
        assert!(outcome.outputs[0].volume.is_none());
        assert_eq!(outcome.outputs[0].lines, 3);

        let content =
            fs::read_to_string(temp_dir.path().join("combined_japanese_text.txt")).unwrap();
        assert_eq!(content, "一巻\n続き\n二巻\n");
    }

    #[test]
    fn test_empty_aggregate_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(&create_test_config(temp_dir.path(), false));

        let outcome = writer.write(&VolumeAggregate::new()).unwrap();

        assert!(outcome.outputs.is_empty());
        assert!(!writer.consolidated_path().exists());
    }

    #[test]
    fn test_per_volume_failure_does_not_stop_other_volumes() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the volume file should go makes that one write fail.
        fs::create_dir(temp_dir.path().join("Volume 01.txt")).unwrap();

        let writer = OutputWriter::new(&create_test_config(temp_dir.path(), true));
        let outcome = writer.write(&create_test_aggregate()).unwrap();

        assert_eq!(outcome.outputs.len(), 1);
        assert_eq!(outcome.outputs[0].volume.as_deref(), Some("Volume 02"));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("Volume 01.txt"));
    }

    #[test]
    fn test_consolidated_failure_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("combined_japanese_text.txt")).unwrap();

        let writer = OutputWriter::new(&create_test_config(temp_dir.path(), false));
        let result = writer.write(&create_test_aggregate());

        assert!(matches!(result, Err(ExtractError::OutputWrite { .. })));
    }

    #[test]
    fn test_initialize_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("out").join("text");

        let writer = OutputWriter::new(&create_test_config(&nested, true));
        writer.initialize().unwrap();

        assert!(writer.get_output_directory().is_dir());
        assert_eq!(writer.volume_path("V"), nested.join("V.txt"));
    }

    #[test]
    fn test_extraction_report_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(temp_dir.path(), true);
        let writer = OutputWriter::new(&config);

        let mut progress = ExtractionProgress::new(3);
        progress.finish_file(2);
        progress.finish_file(1);
        progress.skip_file("Could not parse JSON from bad.json");
        let extraction = Extraction {
            aggregate: create_test_aggregate(),
            progress,
        };

        let scan = ScanResult {
            files: ["V1/a.json", "V1/b.json", "V2/bad.json"]
                .iter()
                .map(|p| JsonFile::new(temp_dir.path().join(p), PathBuf::from(p), 10))
                .collect(),
            warnings: vec!["Scan error: permission denied".to_string()],
        };

        let outcome = writer.write(&extraction.aggregate).unwrap();
        let report = writer.create_extraction_report(
            temp_dir.path(),
            &scan,
            &extraction,
            outcome,
            ConfigSnapshot::from(&config),
        );

        assert_eq!(report.layout, OutputLayout::PerVolume);
        assert_eq!(report.files_found, 3);
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.lines_extracted, 3);
        assert_eq!(report.volumes, 2);
        assert_eq!(report.outputs.len(), 2);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].starts_with("Scan error"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"layout\":\"per_volume\""));
    }

    #[test]
    fn test_write_lines_keeps_text_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");

        let count = write_lines(&path, ["  前後の空白  ", "タブ\tあり"]).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "  前後の空白  \nタブ\tあり\n"
        );
    }
}

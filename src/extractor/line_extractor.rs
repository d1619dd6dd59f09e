use crate::error::{ExtractError, Result};
use crate::extractor::document::OcrDocument;
use crate::extractor::japanese::contains_japanese;
use crate::scanner::JsonFile;
use crate::ui::GracefulShutdown;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Extracted lines per volume. Keys iterate in lexicographic order and
/// only exist once a line has been appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeAggregate {
    volumes: BTreeMap<String, Vec<String>>,
}

impl VolumeAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Into<String>>(&mut self, volume: &str, line: S) {
        match self.volumes.get_mut(volume) {
            Some(lines) => lines.push(line.into()),
            None => {
                self.volumes.insert(volume.to_string(), vec![line.into()]);
            }
        }
    }

    pub fn extend<I, S>(&mut self, volume: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.push(volume, line);
        }
    }

    pub fn volumes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.volumes
            .iter()
            .map(|(volume, lines)| (volume.as_str(), lines.as_slice()))
    }

    /// All lines, volume by volume in key order.
    pub fn flatten(&self) -> impl Iterator<Item = &str> {
        self.volumes
            .values()
            .flat_map(|lines| lines.iter().map(String::as_str))
    }

    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    pub fn total_lines(&self) -> usize {
        self.volumes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub total_files: usize,
    pub lines_extracted: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub warnings: Vec<String>,
}

impl ExtractionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            files_skipped: 0,
            total_files,
            lines_extracted: 0,
            current_file: None,
            start_time: Instant::now(),
            warnings: Vec::new(),
        }
    }

    pub fn start_file(&mut self, filename: String) {
        self.current_file = Some(filename);
    }

    pub fn finish_file(&mut self, lines: usize) {
        self.files_processed += 1;
        self.lines_extracted += lines;
    }

    pub fn skip_file<S: Into<String>>(&mut self, warning: S) {
        self.files_skipped += 1;
        self.warnings.push(warning.into());
    }

    pub fn files_done(&self) -> usize {
        self.files_processed + self.files_skipped
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_done() as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        let done = self.files_done();
        if done == 0 {
            return Duration::from_secs(0);
        }

        let rate = done as f64 / self.elapsed().as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(done);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

#[derive(Debug)]
pub struct Extraction {
    pub aggregate: VolumeAggregate,
    pub progress: ExtractionProgress,
}

/// Per-file hooks the caller can use for reporting; the progress passed
/// in already reflects the file being announced.
pub trait ExtractionObserver {
    fn file_started(&self, _file: &JsonFile, _progress: &ExtractionProgress) {}
    fn file_skipped(&self, _file: &JsonFile, _error: &ExtractError) {}
    fn file_finished(&self, _file: &JsonFile, _lines: usize, _progress: &ExtractionProgress) {}
}

impl ExtractionObserver for () {}

pub struct LineExtractor<'a> {
    shutdown: Option<&'a GracefulShutdown>,
}

impl<'a> LineExtractor<'a> {
    pub fn new() -> Self {
        Self { shutdown: None }
    }

    pub fn with_shutdown(mut self, shutdown: &'a GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn extract_files(
        &self,
        files: &[JsonFile],
        observer: &dyn ExtractionObserver,
    ) -> Result<Extraction> {
        let mut progress = ExtractionProgress::new(files.len());
        let mut aggregate = VolumeAggregate::new();

        for file in files {
            if let Some(shutdown) = self.shutdown {
                shutdown.check_shutdown()?;
            }

            progress.start_file(file.display_path());
            observer.file_started(file, &progress);

            match self.extract_file(file) {
                Ok(lines) => {
                    let count = lines.len();
                    aggregate.extend(&file.volume, lines);
                    progress.finish_file(count);
                    observer.file_finished(file, count, &progress);
                }
                Err(e) if e.is_recoverable() => {
                    observer.file_skipped(file, &e);
                    progress.skip_file(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Extraction {
            aggregate,
            progress,
        })
    }

    /// Japanese lines of one file; nothing is kept from a file that fails
    /// to read or decode.
    pub fn extract_file(&self, file: &JsonFile) -> Result<Vec<String>> {
        let document = OcrDocument::load(&file.source_path)?;

        Ok(document
            .lines()
            .filter(|line| contains_japanese(line))
            .map(str::to_string)
            .collect())
    }
}

impl Default for LineExtractor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn create_json_file(root: &Path, relative: &str, content: &str) -> JsonFile {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        let size = fs::metadata(&path).unwrap().len();
        JsonFile::new(path, PathBuf::from(relative), size)
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: RefCell<Vec<String>>,
    }

    impl ExtractionObserver for RecordingObserver {
        fn file_started(&self, file: &JsonFile, _progress: &ExtractionProgress) {
            self.events
                .borrow_mut()
                .push(format!("start {}", file.display_path()));
        }

        fn file_skipped(&self, file: &JsonFile, _error: &ExtractError) {
            self.events
                .borrow_mut()
                .push(format!("skip {}", file.display_path()));
        }

        fn file_finished(&self, file: &JsonFile, lines: usize, _progress: &ExtractionProgress) {
            self.events
                .borrow_mut()
                .push(format!("done {} {}", file.display_path(), lines));
        }
    }

    #[test]
    fn test_only_japanese_lines_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_json_file(
            temp_dir.path(),
            "a.json",
            r#"{"blocks":[{"lines":["こんにちは","Hello","123"]}]}"#,
        );

        let lines = LineExtractor::new().extract_file(&file).unwrap();
        assert_eq!(lines, vec!["こんにちは"]);
    }

    #[test]
    fn test_lines_grouped_by_volume_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = vec![
            create_json_file(
                root,
                "Volume 01/00001.json",
                r#"{"blocks":[{"lines":["一","二"]},{"lines":["skip","三"]}]}"#,
            ),
            create_json_file(root, "Volume 01/00002.json", r#"{"blocks":[{"lines":["四"]}]}"#),
            create_json_file(root, "Volume 02/00001.json", r#"{"blocks":[{"lines":["五"]}]}"#),
            create_json_file(root, "cover.json", r#"{"blocks":[{"lines":["表紙"]}]}"#),
        ];

        let extraction = LineExtractor::new().extract_files(&files, &()).unwrap();
        let aggregate = &extraction.aggregate;

        let volumes: Vec<_> = aggregate.volumes().collect();
        assert_eq!(
            volumes,
            vec![
                ("Volume 01", &["一", "二", "三", "四"].map(String::from)[..]),
                ("Volume 02", &["五".to_string()][..]),
                ("root_volume", &["表紙".to_string()][..]),
            ]
        );
        assert_eq!(aggregate.volume_count(), 3);
        assert_eq!(extraction.progress.files_processed, 4);
        assert_eq!(extraction.progress.lines_extracted, 6);
    }

    #[test]
    fn test_bad_files_are_skipped_with_warning() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let missing = create_json_file(root, "gone.json", "{}");
        fs::remove_file(&missing.source_path).unwrap();

        let files = vec![
            create_json_file(root, "broken.json", r#"{"blocks": ["#),
            missing,
            create_json_file(root, "good.json", r#"{"blocks":[{"lines":["良い"]}]}"#),
        ];

        let observer = RecordingObserver::default();
        let extraction = LineExtractor::new()
            .extract_files(&files, &observer)
            .unwrap();

        assert_eq!(extraction.progress.files_processed, 1);
        assert_eq!(extraction.progress.files_skipped, 2);
        assert_eq!(extraction.progress.warnings.len(), 2);
        assert!(extraction.progress.warnings[0].contains("broken.json"));
        assert_eq!(extraction.aggregate.flatten().collect::<Vec<_>>(), vec!["良い"]);
        assert_eq!(
            observer.events.into_inner(),
            vec![
                "start broken.json",
                "skip broken.json",
                "start gone.json",
                "skip gone.json",
                "start good.json",
                "done good.json 1",
            ]
        );
    }

    #[test]
    fn test_files_without_japanese_create_no_volume() {
        let temp_dir = TempDir::new().unwrap();
        let files = vec![create_json_file(
            temp_dir.path(),
            "Volume 09/00001.json",
            r#"{"blocks":[{"lines":["only latin"]}]}"#,
        )];

        let extraction = LineExtractor::new().extract_files(&files, &()).unwrap();
        assert!(extraction.aggregate.is_empty());
        assert_eq!(extraction.progress.files_processed, 1);
    }

    #[test]
    fn test_cancelled_run_stops_before_next_file() {
        let temp_dir = TempDir::new().unwrap();
        let files = vec![create_json_file(temp_dir.path(), "a.json", "{}")];

        let shutdown = GracefulShutdown::new_for_test();
        shutdown.request_shutdown();

        let result = LineExtractor::new()
            .with_shutdown(&shutdown)
            .extract_files(&files, &());
        assert!(matches!(result, Err(ExtractError::Cancelled)));
    }

    #[test]
    fn test_aggregate_flatten_uses_key_order() {
        let mut aggregate = VolumeAggregate::new();
        aggregate.push("b", "び");
        aggregate.push("a", "あ1");
        aggregate.push("a", "あ2");

        assert_eq!(aggregate.flatten().collect::<Vec<_>>(), vec!["あ1", "あ2", "び"]);
        assert_eq!(aggregate.total_lines(), 3);
        let keys: Vec<_> = aggregate.volumes().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_progress_tracking() {
        let mut progress = ExtractionProgress::new(4);
        assert_eq!(progress.percentage(), 0.0);

        progress.start_file("a.json".to_string());
        progress.finish_file(3);
        assert_eq!(progress.percentage(), 25.0);
        assert_eq!(progress.lines_extracted, 3);

        progress.skip_file("bad");
        assert_eq!(progress.percentage(), 50.0);
        assert_eq!(progress.warnings.len(), 1);
    }
}

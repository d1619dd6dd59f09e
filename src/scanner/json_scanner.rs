use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::scanner::file_filter::{slash_joined, FileFilter};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Volume key for files sitting directly in the scan root.
pub const ROOT_VOLUME: &str = "root_volume";

#[derive(Debug, Clone)]
pub struct JsonFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub volume: String,
    pub size: u64,
}

impl JsonFile {
    pub fn new(source_path: PathBuf, relative_path: PathBuf, size: u64) -> Self {
        let volume = volume_key(&relative_path);

        Self {
            source_path,
            relative_path,
            volume,
            size,
        }
    }

    /// Root-relative path with `/` separators; this is also the sort key.
    pub fn display_path(&self) -> String {
        slash_joined(&self.relative_path)
    }
}

/// Name of the immediate parent directory, or [`ROOT_VOLUME`] when the file
/// has no parent below the scan root.
///
/// Non-UTF-8 names are converted lossily, so distinct names that differ only
/// in invalid bytes share a key; the scanner warns when that happens.
pub fn volume_key(relative_path: &Path) -> String {
    relative_path
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty() && name != ".")
        .unwrap_or_else(|| ROOT_VOLUME.to_string())
}

/// True when the parent directory name is not valid UTF-8.
pub fn has_lossy_volume_name(relative_path: &Path) -> bool {
    relative_path
        .parent()
        .and_then(|parent| parent.file_name())
        .is_some_and(|name| name.to_str().is_none())
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<JsonFile>,
    pub warnings: Vec<String>,
}

pub struct JsonScanner {
    filter: FileFilter,
    max_depth: usize,
    follow_links: bool,
}

impl JsonScanner {
    pub fn new(config: &Config) -> Self {
        Self {
            filter: FileFilter::new(config),
            max_depth: config.effective_max_depth(),
            follow_links: config.scan.follow_links,
        }
    }

    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<ScanResult> {
        let root_path = root.as_ref();

        // Surface an unreadable root as a hard failure before walking.
        fs::read_dir(root_path).map_err(|e| ExtractError::DirectoryRead {
            path: root_path.display().to_string(),
            source: e,
        })?;

        let mut result = ScanResult::default();
        let mut lossy_volumes = BTreeSet::new();

        let walker = WalkDir::new(root_path)
            .max_depth(self.max_depth)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_entry(|e| self.should_traverse(e, root_path));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err.depth() == 0 {
                        return Err(ExtractError::DirectoryRead {
                            path: root_path.display().to_string(),
                            source: err.into(),
                        });
                    }
                    result.warnings.push(format!("Scan error: {}", err));
                    continue;
                }
            };

            // Linked files are read even when linked directories are not walked.
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            match self.process_file(&entry, root_path) {
                Ok(Some(json_file)) => {
                    if has_lossy_volume_name(&json_file.relative_path)
                        && lossy_volumes.insert(json_file.volume.clone())
                    {
                        result.warnings.push(format!(
                            "Directory name of {} is not valid UTF-8; it is grouped as volume '{}'",
                            entry.path().display(),
                            json_file.volume
                        ));
                    }
                    result.files.push(json_file);
                }
                Ok(None) => {}
                Err(err) => {
                    result.warnings.push(format!(
                        "Error processing {}: {}",
                        entry.path().display(),
                        err
                    ));
                }
            }
        }

        if result.files.is_empty() {
            return Err(ExtractError::NoInputFiles {
                root: root_path.display().to_string(),
            });
        }

        sort_files(&mut result.files);

        Ok(result)
    }

    fn should_traverse(&self, entry: &DirEntry, root_path: &Path) -> bool {
        if entry.depth() == 0 || entry.file_type().is_file() {
            return true;
        }

        if entry.file_type().is_dir() {
            let relative = entry.path().strip_prefix(root_path).unwrap_or(entry.path());
            return self.filter.should_traverse_directory(relative);
        }

        true
    }

    fn process_file(&self, entry: &DirEntry, root_path: &Path) -> Result<Option<JsonFile>> {
        let path = entry.path();

        if !self.filter.is_candidate(path) {
            return Ok(None);
        }

        // Follows links, so a linked page reports the target's size.
        let metadata = fs::metadata(path)?;

        let relative_path = path
            .strip_prefix(root_path)
            .map_err(|_| ExtractError::InvalidPath {
                path: format!(
                    "Cannot calculate relative path for {} from root {}",
                    path.display(),
                    root_path.display()
                ),
            })?
            .to_path_buf();

        Ok(Some(JsonFile::new(
            path.to_path_buf(),
            relative_path,
            metadata.len(),
        )))
    }

    pub fn get_statistics(&self, files: &[JsonFile]) -> ScanStatistics {
        let mut files_by_volume = BTreeMap::new();
        for file in files {
            *files_by_volume.entry(file.volume.clone()).or_insert(0) += 1;
        }

        ScanStatistics {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            files_by_volume,
        }
    }
}

/// Lexicographic order of the `/`-joined relative path, independent of the
/// order the filesystem hands entries back in.
pub fn sort_files(files: &mut [JsonFile]) {
    files.sort_by_cached_key(|f| f.display_path());
}

#[derive(Debug, Default)]
pub struct ScanStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub files_by_volume: BTreeMap<String, usize>,
}

impl ScanStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan Results:\n  Total files: {}\n  Total size: {}\n",
            self.total_files,
            format_bytes(self.total_size)
        );

        if !self.files_by_volume.is_empty() {
            summary.push_str("  Files by volume:\n");
            for (volume, count) in &self.files_by_volume {
                summary.push_str(&format!("    {}: {} files\n", volume, count));
            }
        }

        summary
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

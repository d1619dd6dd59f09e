use crate::config::Config;
use regex::Regex;
use std::path::{Component, Path};

const JSON_SUFFIX: &str = ".json";

pub struct FileFilter {
    output_filename: String,
    exclude_dirs: Vec<String>,
    exclude_patterns: Vec<Regex>,
    skip_hidden: bool,
}

impl FileFilter {
    pub fn new(config: &Config) -> Self {
        let exclude_patterns = config
            .scan
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            output_filename: config.output.filename.clone(),
            exclude_dirs: config.scan.exclude_dirs.clone(),
            exclude_patterns,
            skip_hidden: config.scan.skip_hidden,
        }
    }

    /// A file is a candidate when its name ends in `.json` and it is not
    /// our own output file.
    pub fn is_candidate(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        if !filename.ends_with(JSON_SUFFIX) {
            return false;
        }

        if self.is_output_file(filename) {
            return false;
        }

        !self.matches_any_pattern(filename)
    }

    pub fn is_output_file(&self, filename: &str) -> bool {
        filename == self.output_filename
    }

    /// `relative_path` is the directory's path below the scan root, so
    /// patterns never see the components of the root itself.
    pub fn should_traverse_directory(&self, relative_path: &Path) -> bool {
        if let Some(dir_name) = relative_path.file_name().and_then(|s| s.to_str()) {
            if self.exclude_dirs.iter().any(|exclude| exclude == dir_name) {
                return false;
            }

            if self.matches_any_pattern(&slash_joined(relative_path)) {
                return false;
            }

            if self.skip_hidden && dir_name.starts_with('.') && dir_name != "." && dir_name != ".."
            {
                return false;
            }
        }

        true
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }

    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }
}

/// Path components joined with `/`, skipping `.` and prefixes.
pub(crate) fn slash_joined(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

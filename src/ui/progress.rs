use crate::extractor::ExtractionProgress;
use crate::ui::output::format_duration;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_file_progress(&self, total_files: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_files));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} files {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Processing files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb
    }

    /// Runs `f` with the bars hidden so regular output does not tear them.
    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if self.enabled {
            self.multi_progress.suspend(f)
        } else {
            f()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn update_file_progress(pb: &ProgressBar, progress: &ExtractionProgress) {
    pb.set_position(progress.files_done() as u64);

    if let Some(ref current_file) = progress.current_file {
        let eta = if progress.files_done() > 0 {
            let estimated_remaining = progress.estimated_remaining();
            if estimated_remaining.as_secs() > 0 {
                format!(" (ETA: {})", format_duration(estimated_remaining))
            } else {
                String::new()
            }
        } else {
            String::new()
        };

        pb.set_message(format!("Processing {}{}", current_file, eta));
    } else {
        pb.set_message("Processing files...");
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_manager_creation() {
        let manager = ProgressManager::new(true);
        assert!(manager.is_enabled());

        let disabled_manager = ProgressManager::new(false);
        assert!(!disabled_manager.is_enabled());
    }

    #[test]
    fn test_disabled_progress_bars() {
        let manager = ProgressManager::new(false);

        let file_pb = manager.create_file_progress(100);
        assert!(file_pb.is_hidden());

        let spinner = manager.create_spinner("test");
        assert!(spinner.is_hidden());
    }

    #[test]
    fn test_update_file_progress() {
        let manager = ProgressManager::new(false);
        let pb = manager.create_file_progress(4);

        let mut progress = ExtractionProgress::new(4);
        progress.start_file("Volume 01/00001.json".to_string());
        progress.finish_file(2);
        update_file_progress(&pb, &progress);

        assert_eq!(pb.position(), 1);
        assert!(pb.message().starts_with("Processing Volume 01/00001.json"));

        finish_progress_with_summary(&pb, "Processed 4 files", Duration::from_millis(5));
        assert!(pb.is_finished());
    }

    #[test]
    fn test_suspend_runs_closure() {
        let manager = ProgressManager::new(false);
        assert_eq!(manager.suspend(|| 7), 7);
    }
}

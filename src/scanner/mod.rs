pub mod file_filter;
pub mod json_scanner;

pub use file_filter::FileFilter;
pub use json_scanner::{volume_key, JsonFile, JsonScanner, ScanResult, ROOT_VOLUME};

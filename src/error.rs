use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Could not read directory {path}: {source}")]
    DirectoryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No .json files found under {root}")]
    NoInputFiles { root: String },

    #[error("Could not parse JSON from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write output file {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl ExtractError {
    /// Errors that only cost the current file and never stop the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExtractError::Decode { .. } | ExtractError::FileRead { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ExtractError {
    fn user_message(&self) -> String {
        match self {
            ExtractError::DirectoryRead { path, source } => {
                format!("Could not read the directory contents of {}: {}", path, source)
            }
            ExtractError::NoInputFiles { root } => {
                format!("No .json files were found in {}", root)
            }
            ExtractError::Decode { path, .. } => {
                format!(
                    "Could not parse JSON from {}. File might be empty or corrupt.",
                    path
                )
            }
            ExtractError::FileRead { path, source } => {
                format!("An unexpected error occurred with {}: {}", path, source)
            }
            ExtractError::OutputWrite { path, source } => {
                format!("Error writing to output file '{}': {}", path, source)
            }
            ExtractError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ExtractError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ExtractError::DirectoryRead { .. } => Some(
                "Check that the directory exists and that you have permission to list it.".to_string()
            ),
            ExtractError::NoInputFiles { .. } => Some(
                "Run the command from a directory containing OCR .json files, or pass the directory as an argument.".to_string()
            ),
            ExtractError::OutputWrite { .. } => Some(
                "Ensure the output directory exists and is writable, or choose another one with --output-dir.".to_string()
            ),
            ExtractError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config.".to_string()
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

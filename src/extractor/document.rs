//! OCR page documents: `{ "blocks": [ { "lines": [..] }, .. ] }`.
//!
//! Any JSON value is accepted. Missing fields, or fields holding the wrong
//! kind of value, simply contribute no lines.

use crate::error::{ExtractError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct OcrDocument {
    root: Value,
}

impl OcrDocument {
    pub fn from_json_str(content: &str, path: &Path) -> Result<Self> {
        let root = serde_json::from_str(content).map_err(|e| ExtractError::Decode {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(Self { root })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ExtractError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_json_str(&content, path)
    }

    /// Every string in `blocks[].lines[]`, in document order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.root
            .get("blocks")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|block| block.get("lines").and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_str)
    }
}

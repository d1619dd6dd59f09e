pub mod document;
pub mod japanese;
pub mod line_extractor;
pub mod output_writer;

pub use document::OcrDocument;
pub use japanese::{contains_japanese, script_of, Script};
pub use line_extractor::{
    Extraction, ExtractionObserver, ExtractionProgress, LineExtractor, VolumeAggregate,
};
pub use output_writer::{
    ConfigSnapshot, ExtractionReport, OutputFile, OutputLayout, OutputWriter, WriteOutcome,
};

pub mod extractor;

pub use extractor::{ExtractionReport, NativeExtractor};

pub mod parse;
pub mod text;

use std::path::Path;

use tribureau_core::error::ReportError;
use tribureau_core::extraction::pdftotext::PdftotextExtractor;
use tribureau_core::extraction::TextExtractor;

/// Read report text from a file, running pdftotext for PDF input.
pub(crate) fn load_text(path: &Path) -> Result<String, ReportError> {
    let is_pdf = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        let bytes = std::fs::read(path)?;
        let extractor = PdftotextExtractor::new();
        extractor.extract_text(&bytes)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

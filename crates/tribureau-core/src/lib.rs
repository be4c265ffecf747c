pub mod discrepancy;
pub mod error;
pub mod extraction;
pub mod model;
pub mod normalize;
pub mod parsing;
pub mod records;
pub mod trace;

use error::ReportError;
use extraction::{OcrFallback, TextExtractor};
use model::{FormatHint, ParsedReport};
use trace::ParseTrace;

/// Options controlling a parse run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Force per-bureau section handling instead of auto-detection.
    pub format_hint: FormatHint,
}

/// Main API entry point: parse raw report text into structured per-bureau
/// records.
///
/// Partial success is success: a report with scores but no accounts (or the
/// other way around) parses fine with an empty sub-collection. Only a report
/// yielding no scores, no profiles and no accounts at all is an error.
pub fn parse_report(raw_text: &str, options: ParseOptions) -> Result<ParsedReport, ReportError> {
    let mut trace = ParseTrace::default();

    let text = normalize::text::normalize(raw_text);
    let (format, sections) = parsing::format::detect(&text, options.format_hint);

    let scores = parsing::scores::parse_scores(&text);
    let profiles = parsing::scores::parse_profiles(&text);

    let mut spans = Vec::new();
    for section in &sections {
        spans.extend(parsing::segment::segment(&section.text, section.bureau));
    }
    let (accounts, discrepancies) = records::build_records(&spans, &mut trace);

    if scores.is_none() && profiles.is_empty() && accounts.is_empty() {
        return Err(ReportError::ExtractionFailure {
            text_len: raw_text.trim().len(),
            suggest_ocr: extraction::needs_ocr(raw_text),
        });
    }

    Ok(ParsedReport {
        format,
        scores,
        profiles,
        accounts,
        discrepancies,
        trace,
    })
}

/// Parse a document end to end: extract its text, retry through the OCR
/// collaborator when the primary extractor's output looks like a scan, then
/// hand the text to [`parse_report`].
pub fn parse_document(
    document: &[u8],
    extractor: &dyn TextExtractor,
    ocr: Option<&dyn OcrFallback>,
    options: ParseOptions,
) -> Result<ParsedReport, ReportError> {
    let mut text = extractor.extract_text(document)?;

    if let Some(ocr) = ocr {
        if ocr.needs_ocr(&text) {
            text = ocr.extract_text_via_ocr(document)?;
        }
    }

    parse_report(&text, options)
}

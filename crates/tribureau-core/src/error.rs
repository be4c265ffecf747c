#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error(
        "no scores, profiles or accounts could be extracted from {text_len} chars of text{}",
        ocr_hint(.suggest_ocr)
    )]
    ExtractionFailure { text_len: usize, suggest_ocr: bool },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn ocr_hint(suggest_ocr: &bool) -> &'static str {
    if *suggest_ocr {
        " (text looks too short or too noisy to be real extraction output; retry via OCR)"
    } else {
        ""
    }
}

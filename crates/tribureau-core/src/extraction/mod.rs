pub mod pdftotext;

use crate::error::ReportError;

const MIN_TEXT_LEN: usize = 200;
const MIN_ALNUM_RATIO: f64 = 0.3;

/// Trait for document text extraction backends.
pub trait TextExtractor: Send + Sync {
    /// Extract the full text content of a document.
    fn extract_text(&self, document: &[u8]) -> Result<String, ReportError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// OCR collaborator consulted when the primary extractor yields too little.
pub trait OcrFallback: Send + Sync {
    /// Whether the primary extractor's output warrants an OCR retry.
    fn needs_ocr(&self, text: &str) -> bool {
        needs_ocr(text)
    }

    fn extract_text_via_ocr(&self, document: &[u8]) -> Result<String, ReportError>;

    fn backend_name(&self) -> &str;
}

/// True when extracted text is too short or too non-alphanumeric to be real
/// extraction output, the signature of a scanned document whose text layer
/// is missing or garbage.
pub fn needs_ocr(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.len() < MIN_TEXT_LEN {
        return true;
    }
    let total = trimmed.chars().count();
    let alnum = trimmed.chars().filter(|c| c.is_alphanumeric()).count();
    (alnum as f64) / (total as f64) < MIN_ALNUM_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_needs_ocr() {
        assert!(needs_ocr(""));
        assert!(needs_ocr("CHASE BANK"));
    }

    #[test]
    fn test_noisy_text_needs_ocr() {
        let noise = ".. .. -- || %% ## @@ !! ~~ ^^ ** (( )) [[ ]] {{ }} ;; :: '' \"\" ,, "
            .repeat(10);
        assert!(needs_ocr(&noise));
    }

    #[test]
    fn test_normal_text_does_not() {
        let text = "CREDIT ACCOUNTS 1. CHASE BANK Account #: 44445555**** \
                    Balance: $1,250.00 Status: Current Date Opened: 01/2019 "
            .repeat(4);
        assert!(!needs_ocr(&text));
    }
}

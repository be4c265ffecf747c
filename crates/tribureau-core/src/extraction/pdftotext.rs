use crate::error::ReportError;
use crate::extraction::TextExtractor;
use std::io::Write;
use std::process::Command;

/// Text extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` so the whitespace alignment of the three-bureau
/// tables survives into the text.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_text(&self, document: &[u8]) -> Result<String, ReportError> {
        // Write PDF bytes to a temp file
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| ReportError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(document)
            .map_err(|e| ReportError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReportError::PdftotextNotFound
                } else {
                    ReportError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ReportError::PdftotextFailed { code, stderr });
        }

        // pdftotext separates pages with form feeds; the parser treats the
        // report as one continuous text
        Ok(String::from_utf8_lossy(&output.stdout).replace('\x0c', "\n"))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

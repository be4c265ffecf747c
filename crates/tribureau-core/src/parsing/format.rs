use crate::model::{Bureau, FormatHint, ReportFormat};
use regex::Regex;
use std::sync::LazyLock;

/// A slice of the report to run account segmentation over. `bureau` is set
/// for per-bureau-separated reports, where everything in the section belongs
/// to that one bureau.
#[derive(Debug, Clone)]
pub struct Section {
    pub bureau: Option<Bureau>,
    pub text: String,
}

static CREDIT_ACCOUNTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcredit\s+accounts\b").unwrap());

static SAMPLE_HEADERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(satisfactory|adverse)\s+accounts\b").unwrap());

// Fallback shape for the sample layout: an uppercase name, then Acct#, then
// Date Opened, then Balance within a short window.
static SAMPLE_ROW_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)[A-Z][A-Z &'./\-]{2,40}.{0,60}?acct\s*#.{0,120}?date\s+opened.{0,120}?balance")
        .unwrap()
});

/// Decide which known report layout the text is in and cut it into sections.
///
/// Decision order (first match wins): per-bureau separated sections, the
/// sample satisfactory/adverse layout, then the unified numbered-account
/// format as the fallback over the full text.
pub fn detect(text: &str, hint: FormatHint) -> (ReportFormat, Vec<Section>) {
    if let Some(sections) = detect_per_bureau(text, hint == FormatHint::PerBureau) {
        return (ReportFormat::PerBureau, sections);
    }

    if SAMPLE_HEADERS.is_match(text) {
        return (ReportFormat::SampleSections, split_sample_sections(text));
    }
    if SAMPLE_ROW_SHAPE.is_match(text) {
        return (
            ReportFormat::SampleSections,
            vec![Section {
                bureau: None,
                text: text.to_string(),
            }],
        );
    }

    (
        ReportFormat::Unified,
        vec![Section {
            bureau: None,
            text: text.to_string(),
        }],
    )
}

/// Find "<Bureau> Credit File" markers. A bureau qualifies when a Credit
/// Accounts marker follows its file marker before the next bureau's file
/// marker; with the per-bureau hint the accounts marker is not required.
static FILE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(transunion|trans union|experian|equifax)\s+credit\s+file\b").unwrap()
});

fn detect_per_bureau(text: &str, hinted: bool) -> Option<Vec<Section>> {
    let mut markers: Vec<(usize, Bureau)> = Vec::new();
    for caps in FILE_MARKER.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if let Some(bureau) = Bureau::from_str_loose(&caps[1]) {
            markers.push((m.start(), bureau));
        }
    }
    if markers.is_empty() {
        return None;
    }
    markers.sort_by_key(|(pos, _)| *pos);

    let mut sections = Vec::new();
    for (i, &(start, bureau)) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map(|(pos, _)| *pos)
            .unwrap_or(text.len());
        let body = &text[start..end];
        if hinted || CREDIT_ACCOUNTS.is_match(body) {
            sections.push(Section {
                bureau: Some(bureau),
                text: body.to_string(),
            });
        }
    }
    if sections.is_empty() {
        None
    } else {
        Some(sections)
    }
}

fn split_sample_sections(text: &str) -> Vec<Section> {
    let starts: Vec<usize> = SAMPLE_HEADERS.find_iter(text).map(|m| m.start()).collect();
    let mut sections = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        sections.push(Section {
            bureau: None,
            text: text[start..end].to_string(),
        });
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_is_default() {
        let (format, sections) = detect("CREDIT ACCOUNTS\n1. CHASE BANK", FormatHint::Auto);
        assert_eq!(format, ReportFormat::Unified);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].bureau.is_none());
    }

    #[test]
    fn test_per_bureau_sections() {
        let text = "TransUnion Credit File\nCredit Accounts\nCHASE BANK\n\
                    Experian Credit File\nCredit Accounts\nCHASE BANK\n";
        let (format, sections) = detect(text, FormatHint::Auto);
        assert_eq!(format, ReportFormat::PerBureau);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].bureau, Some(Bureau::TransUnion));
        assert_eq!(sections[1].bureau, Some(Bureau::Experian));
    }

    #[test]
    fn test_per_bureau_requires_accounts_marker() {
        // A file marker with no Credit Accounts section is not enough
        let text = "TransUnion Credit File\nPersonal data only\n";
        let (format, _) = detect(text, FormatHint::Auto);
        assert_eq!(format, ReportFormat::Unified);
    }

    #[test]
    fn test_per_bureau_hint_loosens_accounts_requirement() {
        let text = "TransUnion Credit File\nPersonal data only\n";
        let (format, sections) = detect(text, FormatHint::PerBureau);
        assert_eq!(format, ReportFormat::PerBureau);
        assert_eq!(sections[0].bureau, Some(Bureau::TransUnion));
    }

    #[test]
    fn test_sample_sections() {
        let text = "SATISFACTORY ACCOUNTS\nCHASE BANK\nADVERSE ACCOUNTS\nMIDLAND FUNDING\n";
        let (format, sections) = detect(text, FormatHint::Auto);
        assert_eq!(format, ReportFormat::SampleSections);
        assert_eq!(sections.len(), 2);
    }
}

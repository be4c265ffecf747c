//! Integration tests for the parse_report() / parse_document() pipeline.
//!
//! Uses a MockExtractor that returns pre-built text without invoking
//! pdftotext, so these tests run without poppler-utils.

use rust_decimal_macros::dec;
use tribureau_core::error::ReportError;
use tribureau_core::extraction::{OcrFallback, TextExtractor};
use tribureau_core::model::{AccountRecord, Bureau, DiscrepancyFlag, ReportFormat};
use tribureau_core::{parse_document, parse_report, ParseOptions};

struct MockExtractor {
    text: String,
}

impl TextExtractor for MockExtractor {
    fn extract_text(&self, _document: &[u8]) -> Result<String, ReportError> {
        Ok(self.text.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct MockOcr {
    text: String,
}

impl OcrFallback for MockOcr {
    fn extract_text_via_ocr(&self, _document: &[u8]) -> Result<String, ReportError> {
        Ok(self.text.clone())
    }

    fn backend_name(&self) -> &str {
        "mock-ocr"
    }
}

fn record<'a>(records: &'a [AccountRecord], bureau: Bureau, name: &str) -> &'a AccountRecord {
    records
        .iter()
        .find(|r| r.bureau == bureau && r.account_name == name)
        .unwrap()
}

const UNIFIED_CHASE: &str = "CREDIT ACCOUNTS\n\
                             1. CHASE BANK USA\n\
                             Account #: 44445555****\n\
                             TransUnion Experian Equifax\n\
                             Account Status: Open Open Open\n\
                             Balance: $1,250.00 $1,250.00 $1,250.00\n";

// ---------------------------------------------------------------------------
// Test 1: unified format, one account reported identically by all bureaus
// ---------------------------------------------------------------------------
#[test]
fn unified_format_three_identical_records() {
    let report = parse_report(UNIFIED_CHASE, ParseOptions::default()).unwrap();

    assert_eq!(report.format, ReportFormat::Unified);
    assert_eq!(report.accounts.len(), 3);
    for bureau in Bureau::ALL {
        let r = record(&report.accounts, bureau, "CHASE BANK USA");
        // last 4 of the unmasked digit run
        assert_eq!(r.account_number.as_deref(), Some("5555"));
        assert_eq!(r.fields.balance, dec!(1250.00));
        assert_eq!(r.fields.status.as_deref(), Some("CURRENT"));
    }
    // identical values across bureaus are not a discrepancy
    assert!(report.discrepancies.is_empty());
    assert_eq!(
        report.trace.strategy_for("CHASE BANK USA", Bureau::TransUnion),
        Some("broken_aligned_table")
    );
}

// ---------------------------------------------------------------------------
// Test 2: page-break-split account name recovers through normalization
// ---------------------------------------------------------------------------
#[test]
fn page_break_split_name_recovers() {
    let text = "1. CHASE BANK US\nA\nAccount #: 44445555****\nBalance: $100.00";
    let report = parse_report(text, ParseOptions::default()).unwrap();

    assert_eq!(report.accounts.len(), 3);
    let r = record(&report.accounts, Bureau::Equifax, "CHASE BANK USA");
    assert_eq!(r.fields.balance, dec!(100.00));
}

// ---------------------------------------------------------------------------
// Test 3: pipe row and numbered entry describing the same account dedup
// ---------------------------------------------------------------------------
#[test]
fn pipe_row_and_numbered_entry_dedup() {
    let text = "1. MIDLAND FUNDING Account #: 8888****\n\
                TransUnion | MIDLAND FUNDING | 8888**** | $1,500.00 | Collection\n";
    let report = parse_report(text, ParseOptions::default()).unwrap();

    // one account, three bureau records, not two accounts
    assert_eq!(report.accounts.len(), 3);
    let tu = record(&report.accounts, Bureau::TransUnion, "MIDLAND FUNDING");
    assert_eq!(tu.account_number.as_deref(), Some("8888"));
    assert_eq!(tu.fields.balance, dec!(1500.00));
    assert_eq!(tu.fields.payment_status.as_deref(), Some("Collection"));
    assert!(record(&report.accounts, Bureau::Experian, "MIDLAND FUNDING")
        .fields
        .is_empty());
    assert_eq!(
        report.trace.strategy_for("MIDLAND FUNDING", Bureau::TransUnion),
        Some("pipe_row_seed")
    );
}

// ---------------------------------------------------------------------------
// Test 4: bureaus disagreeing on balance, each keeping its own status
// ---------------------------------------------------------------------------
#[test]
fn balance_discrepancy_and_distinct_statuses() {
    let text = "CREDIT ACCOUNTS\n\
                1. CAPITAL ONE\n\
                Account #: 1234\n\
                TransUnion Experian Equifax\n\
                Status: Open Closed Open\n\
                Balance: $2,500.00 $2,550.00 $2,500.00\n";
    let report = parse_report(text, ParseOptions::default()).unwrap();

    // no value multiplication: each bureau keeps its own column
    let tu = record(&report.accounts, Bureau::TransUnion, "CAPITAL ONE");
    let exp = record(&report.accounts, Bureau::Experian, "CAPITAL ONE");
    let eq = record(&report.accounts, Bureau::Equifax, "CAPITAL ONE");
    assert_eq!(tu.fields.status.as_deref(), Some("CURRENT"));
    assert_eq!(exp.fields.status.as_deref(), Some("CLOSED"));
    assert_eq!(eq.fields.status.as_deref(), Some("CURRENT"));
    assert_eq!(exp.fields.balance, dec!(2550.00));

    assert_eq!(report.discrepancies.len(), 1);
    let disc = &report.discrepancies[0];
    assert_eq!(disc.account_name, "CAPITAL ONE");
    assert_eq!(disc.flags, vec![DiscrepancyFlag::InaccurateBalance]);
}

// ---------------------------------------------------------------------------
// Test 5: empty input is a total extraction failure
// ---------------------------------------------------------------------------
#[test]
fn empty_input_is_extraction_failure() {
    match parse_report("", ParseOptions::default()) {
        Err(ReportError::ExtractionFailure {
            text_len,
            suggest_ocr,
        }) => {
            assert_eq!(text_len, 0);
            assert!(suggest_ocr);
        }
        other => panic!("expected ExtractionFailure, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test 6: an account-type label alone never becomes an account
// ---------------------------------------------------------------------------
#[test]
fn account_type_label_is_not_an_account() {
    match parse_report("REVOLVING Account #: 1234", ParseOptions::default()) {
        Err(ReportError::ExtractionFailure { .. }) => {}
        Ok(report) => {
            assert!(report.accounts.iter().all(|r| r.account_name != "REVOLVING"));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test 7: per-bureau separated report, sections merged into one account
// ---------------------------------------------------------------------------
#[test]
fn per_bureau_sections_merge() {
    let text = "TransUnion Credit File\n\
                Credit Accounts\n\
                1. CHASE BANK Account #: 9999\n\
                Balance: $300.00\n\
                Status: Open\n\
                \n\
                Experian Credit File\n\
                Credit Accounts\n\
                1. CHASE BANK Account #: 9999\n\
                Balance: $310.00\n\
                Status: Open\n";
    let report = parse_report(text, ParseOptions::default()).unwrap();

    assert_eq!(report.format, ReportFormat::PerBureau);
    assert_eq!(report.accounts.len(), 3);
    assert_eq!(
        record(&report.accounts, Bureau::TransUnion, "CHASE BANK").fields.balance,
        dec!(300.00)
    );
    assert_eq!(
        record(&report.accounts, Bureau::Experian, "CHASE BANK").fields.balance,
        dec!(310.00)
    );
    assert!(record(&report.accounts, Bureau::Equifax, "CHASE BANK")
        .fields
        .is_empty());
    assert_eq!(
        report.discrepancies[0].flags,
        vec![DiscrepancyFlag::InaccurateBalance]
    );
}

// ---------------------------------------------------------------------------
// Test 8: scores and profiles with no accounts is a partial success
// ---------------------------------------------------------------------------
#[test]
fn scores_and_profiles_without_accounts() {
    let text = "Report Date: 05/01/2023\n\
                Reference #: QRT-556\n\
                \n\
                CREDIT SCORES\n\
                \n\
                TransUnion    Experian    Equifax\n\
                720    680    715\n\
                \n\
                PERSONAL PROFILE\n\
                \n\
                TransUnion    Experian    Equifax\n\
                Name: JOHN Q DOE    JOHN DOE    J DOE\n";
    let report = parse_report(text, ParseOptions::default()).unwrap();

    let scores = report.scores.unwrap();
    assert_eq!(scores.transunion, Some(720));
    assert_eq!(scores.experian, Some(680));
    assert_eq!(scores.equifax, Some(715));
    assert_eq!(
        scores.report_date,
        chrono::NaiveDate::from_ymd_opt(2023, 5, 1)
    );
    assert_eq!(scores.reference_number.as_deref(), Some("QRT-556"));

    assert_eq!(report.profiles.len(), 3);
    assert_eq!(report.profiles[0].bureau, Bureau::TransUnion);
    assert_eq!(report.profiles[0].name.as_deref(), Some("JOHN Q DOE"));
    assert_eq!(report.profiles[2].name.as_deref(), Some("J DOE"));

    assert!(report.accounts.is_empty());
}

// ---------------------------------------------------------------------------
// Test 9: parse_document passes extracted text straight through
// ---------------------------------------------------------------------------
#[test]
fn parse_document_with_primary_extractor() {
    let extractor = MockExtractor {
        text: UNIFIED_CHASE.to_string(),
    };
    let report = parse_document(b"%PDF-", &extractor, None, ParseOptions::default()).unwrap();
    assert_eq!(report.accounts.len(), 3);
}

// ---------------------------------------------------------------------------
// Test 10: OCR fallback kicks in when the primary text looks like a scan
// ---------------------------------------------------------------------------
#[test]
fn parse_document_falls_back_to_ocr() {
    let extractor = MockExtractor {
        text: "\u{0}\u{0}..".to_string(),
    };
    let ocr = MockOcr {
        text: UNIFIED_CHASE.to_string(),
    };
    let report = parse_document(
        b"%PDF-",
        &extractor,
        Some(&ocr),
        ParseOptions::default(),
    )
    .unwrap();
    let r = record(&report.accounts, Bureau::TransUnion, "CHASE BANK USA");
    assert_eq!(r.fields.balance, dec!(1250.00));
}

use crate::normalize::fields::{
    collapse_repeated, looks_like_money, normalize_balance, normalize_date, normalize_status,
    StatusKind,
};
use crate::trace::ParseTrace;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three US credit reporting agencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bureau {
    TransUnion,
    Experian,
    Equifax,
}

impl Bureau {
    pub const ALL: [Bureau; 3] = [Bureau::TransUnion, Bureau::Experian, Bureau::Equifax];

    /// Canonical lowercase key used for dedup and serialization.
    pub fn key(&self) -> &'static str {
        match self {
            Bureau::TransUnion => "transunion",
            Bureau::Experian => "experian",
            Bureau::Equifax => "equifax",
        }
    }

    /// Index in the canonical TransUnion/Experian/Equifax column order.
    pub fn canonical_index(&self) -> usize {
        match self {
            Bureau::TransUnion => 0,
            Bureau::Experian => 1,
            Bureau::Equifax => 2,
        }
    }

    /// Case-insensitive match against the bureau's name and known
    /// abbreviation/spelling variants.
    pub fn from_str_loose(s: &str) -> Option<Bureau> {
        let lower = s.trim().to_lowercase();
        if lower.contains("transunion") || lower.contains("trans union") {
            return Some(Bureau::TransUnion);
        }
        if lower.contains("experian") {
            return Some(Bureau::Experian);
        }
        if lower.contains("equifax") {
            return Some(Bureau::Equifax);
        }
        // Abbreviations only match as whole tokens
        match lower.as_str() {
            "tu" | "tuc" => Some(Bureau::TransUnion),
            "exp" | "xpn" => Some(Bureau::Experian),
            "eq" | "eqf" | "efx" => Some(Bureau::Equifax),
            _ => None,
        }
    }
}

impl fmt::Display for Bureau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bureau::TransUnion => write!(f, "TransUnion"),
            Bureau::Experian => write!(f, "Experian"),
            Bureau::Equifax => write!(f, "Equifax"),
        }
    }
}

/// Report layout detected by the format pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// One section per bureau ("TransUnion Credit File" ... "Credit Accounts").
    PerBureau,
    /// SATISFACTORY / ADVERSE ACCOUNTS sample layout.
    SampleSections,
    /// Single CREDIT ACCOUNTS section with numbered entries (default).
    Unified,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::PerBureau => write!(f, "per-bureau"),
            ReportFormat::SampleSections => write!(f, "sample-sections"),
            ReportFormat::Unified => write!(f, "unified"),
        }
    }
}

/// Caller-supplied hint for format detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatHint {
    #[default]
    Auto,
    PerBureau,
}

/// Field keys a column extractor can populate on a [`BureauFieldSet`].
///
/// The order of variants is not significant; label-to-key priority is
/// handled where labels are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Balance,
    HighLimit,
    MonthlyPay,
    PastDue,
    Status,
    PaymentStatus,
    DateOpened,
    DateLastActive,
    DateReported,
    PaymentHistory,
    Terms,
    Remarks,
}

/// Per (account, bureau) extracted fields.
///
/// `status` holds the canonicalized account state (CURRENT, CLOSED, ...)
/// while `payment_status` preserves the bureau's own phrasing, since the
/// exact wording carries dispute-relevant nuance. The two never hold the
/// same semantic value: assignment routes each value to the field whose
/// vocabulary it matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BureauFieldSet {
    pub balance: Decimal,
    pub high_limit: Option<Decimal>,
    pub monthly_pay: Option<Decimal>,
    pub past_due: Option<Decimal>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub date_opened: Option<NaiveDate>,
    pub date_last_active: Option<NaiveDate>,
    pub date_reported: Option<NaiveDate>,
    pub payment_history: Option<String>,
    pub reason: Option<String>,
}

impl BureauFieldSet {
    /// True when nothing was extracted. A lone zero balance counts as empty:
    /// a bare "$0.00" with no status or dates carries no dispute signal.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero()
            && self.high_limit.is_none()
            && self.monthly_pay.is_none()
            && self.past_due.is_none()
            && self.status.is_none()
            && self.payment_status.is_none()
            && self.date_opened.is_none()
            && self.date_last_active.is_none()
            && self.date_reported.is_none()
            && self.payment_history.is_none()
            && self.reason.is_none()
    }

    /// Assign a raw extracted value to a field, normalizing it and routing
    /// status-like values to whichever of status/payment_status their
    /// vocabulary matches. First assignment wins; later duplicates from
    /// lower-priority strategies are ignored.
    pub fn assign(&mut self, key: FieldKey, raw: &str) {
        let raw = collapse_repeated(raw.trim());
        if raw.is_empty() || raw == "-" || raw == "--" {
            return;
        }
        match key {
            FieldKey::Balance => {
                if self.balance.is_zero() && raw.contains(|c: char| c.is_ascii_digit()) {
                    self.balance = normalize_balance(&raw);
                }
            }
            FieldKey::HighLimit => {
                if self.high_limit.is_none() && raw.contains(|c: char| c.is_ascii_digit()) {
                    self.high_limit = Some(normalize_balance(&raw));
                }
            }
            FieldKey::MonthlyPay => {
                if self.monthly_pay.is_none() && raw.contains(|c: char| c.is_ascii_digit()) {
                    self.monthly_pay = Some(normalize_balance(&raw));
                }
            }
            FieldKey::PastDue => {
                if self.past_due.is_none() && raw.contains(|c: char| c.is_ascii_digit()) {
                    self.past_due = Some(normalize_balance(&raw));
                }
            }
            FieldKey::Status => match StatusKind::of(&raw) {
                StatusKind::PaymentCondition => {
                    if self.payment_status.is_none() {
                        self.payment_status = Some(raw);
                    }
                }
                _ => {
                    if self.status.is_none() {
                        self.status = normalize_status(&raw);
                    }
                }
            },
            FieldKey::PaymentStatus => match StatusKind::of(&raw) {
                StatusKind::AccountState => {
                    if self.status.is_none() {
                        self.status = normalize_status(&raw);
                    }
                }
                _ => {
                    if self.payment_status.is_none() {
                        self.payment_status = Some(raw);
                    }
                }
            },
            FieldKey::DateOpened => {
                if self.date_opened.is_none() {
                    self.date_opened = normalize_date(&raw);
                }
            }
            FieldKey::DateLastActive => {
                if self.date_last_active.is_none() {
                    self.date_last_active = normalize_date(&raw);
                }
            }
            FieldKey::DateReported => {
                if self.date_reported.is_none() {
                    self.date_reported = normalize_date(&raw);
                }
            }
            FieldKey::PaymentHistory => {
                if self.payment_history.is_none() {
                    self.payment_history = Some(raw);
                }
            }
            // Terms rows only matter when they carry a dollar amount
            // (e.g. "$410/month"); month counts are dropped.
            FieldKey::Terms => {
                if self.monthly_pay.is_none() && looks_like_money(&raw) {
                    self.monthly_pay = Some(normalize_balance(&raw));
                }
            }
            FieldKey::Remarks => {
                if self.reason.is_none() {
                    self.reason = Some(raw);
                }
            }
        }
    }
}

/// A contiguous text region believed to describe one account.
#[derive(Debug, Clone)]
pub struct RawAccountSpan {
    pub account_name: String,
    pub account_number: Option<String>,
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Set when the span came from a per-bureau report section; its fields
    /// belong to this bureau only.
    pub section_bureau: Option<Bureau>,
    /// Field sets discovered during segmentation itself (pipe-delimited rows
    /// carry one bureau's values inline).
    pub seeded: Vec<(Bureau, BureauFieldSet)>,
}

/// One persisted unit per (bureau, account_name, account_number).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub bureau: Bureau,
    pub account_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    pub fields: BureauFieldSet,
}

/// The three-bureau score triple, one per report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub transunion: Option<u32>,
    pub experian: Option<u32>,
    pub equifax: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
}

impl ScoreTriple {
    pub fn score(&self, bureau: Bureau) -> Option<u32> {
        match bureau {
            Bureau::TransUnion => self.transunion,
            Bureau::Experian => self.experian,
            Bureau::Equifax => self.equifax,
        }
    }

    pub fn set_score(&mut self, bureau: Bureau, score: u32) {
        let slot = match bureau {
            Bureau::TransUnion => &mut self.transunion,
            Bureau::Experian => &mut self.experian,
            Bureau::Equifax => &mut self.equifax,
        };
        if slot.is_none() {
            *slot = Some(score);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transunion.is_none() && self.experian.is_none() && self.equifax.is_none()
    }
}

/// Personal data as reported by one specific bureau. Bureaus legitimately
/// disagree on spelling and format; variants are preserved, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalProfileVariant {
    pub bureau: Bureau,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
}

impl PersonalProfileVariant {
    pub fn new(bureau: Bureau) -> Self {
        Self {
            bureau,
            name: None,
            date_of_birth: None,
            address: None,
            employer: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date_of_birth.is_none()
            && self.address.is_none()
            && self.employer.is_none()
    }
}

/// A disagreement between bureaus on one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscrepancyFlag {
    #[serde(rename = "INACCURATE_BALANCE")]
    InaccurateBalance,
    #[serde(rename = "INACCURATE_DATE")]
    InaccurateDate,
    #[serde(rename = "STATUS_CONFLICT")]
    StatusConflict,
}

impl fmt::Display for DiscrepancyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscrepancyFlag::InaccurateBalance => write!(f, "INACCURATE_BALANCE"),
            DiscrepancyFlag::InaccurateDate => write!(f, "INACCURATE_DATE"),
            DiscrepancyFlag::StatusConflict => write!(f, "STATUS_CONFLICT"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDiscrepancy {
    pub account_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    pub flags: Vec<DiscrepancyFlag>,
}

/// Full output of one parse run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedReport {
    pub format: ReportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreTriple>,
    pub profiles: Vec<PersonalProfileVariant>,
    pub accounts: Vec<AccountRecord>,
    pub discrepancies: Vec<AccountDiscrepancy>,
    pub trace: ParseTrace,
}

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

// European money style: "1.200,00" or "1.200.300" (dot groups, comma cents).
static EUROPEAN_MONEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d{1,3}(?:\.\d{3})+,\d+$|^-?\d{1,3}(?:\.\d{3}){2,}$").unwrap());

/// Convert a currency string to a decimal amount. Best-effort, total:
/// empty or unparseable input yields 0.
pub fn normalize_balance(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    let candidate = if EUROPEAN_MONEY.is_match(&cleaned) {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        // Comma is a thousands separator in US-style amounts
        cleaned.replace(',', "")
    };
    Decimal::from_str(&candidate).unwrap_or(Decimal::ZERO)
}

/// True when the value carries an explicit dollar amount.
pub fn looks_like_money(raw: &str) -> bool {
    raw.contains('$') && raw.contains(|c: char| c.is_ascii_digit())
}

static STATUS_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("charge off", "CHARGED_OFF");
    m.insert("charge-off", "CHARGED_OFF");
    m.insert("charged off", "CHARGED_OFF");
    m.insert("charged-off", "CHARGED_OFF");
    m.insert("chargeoff", "CHARGED_OFF");
    m.insert("c/o", "CHARGED_OFF");

    m.insert("collection", "COLLECTION");
    m.insert("collections", "COLLECTION");
    m.insert("collection account", "COLLECTION");
    m.insert("in collection", "COLLECTION");
    m.insert("in collections", "COLLECTION");
    m.insert("placed for collection", "COLLECTION");

    m.insert("late", "LATE_PAYMENT");
    m.insert("late payment", "LATE_PAYMENT");
    m.insert("delinquent", "LATE_PAYMENT");
    m.insert("past due", "LATE_PAYMENT");

    m.insert("closed", "CLOSED");
    m.insert("closed account", "CLOSED");
    m.insert("account closed", "CLOSED");

    m.insert("paid", "PAID");
    m.insert("paid off", "PAID");
    m.insert("paid in full", "PAID");
    m.insert("paid, closed", "PAID");
    m.insert("satisfied", "PAID");
    m.insert("settled", "PAID");

    m.insert("open", "CURRENT");
    m.insert("open account", "CURRENT");
    m.insert("active", "CURRENT");
    m.insert("current", "CURRENT");

    m
});

/// Map a free-form status string to the controlled vocabulary. Unknown
/// values fall back to UPPER_SNAKE of the raw text; empty input is None.
pub fn normalize_status(raw: &str) -> Option<String> {
    let cleaned = clean_phrase(raw);
    if cleaned.is_empty() {
        return None;
    }
    if let Some(canonical) = STATUS_SYNONYMS.get(cleaned.as_str()) {
        return Some((*canonical).to_string());
    }
    // UPPER_SNAKE fallback, collapsing separator runs
    let mut out = String::with_capacity(cleaned.len());
    let mut prev_sep = true;
    for c in cleaned.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
            prev_sep = false;
        } else if !prev_sep {
            out.push('_');
            prev_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn clean_phrase(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

static MASK_THEN_LAST4: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[Xx*]+(\d{4})$").unwrap());
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Reduce a masked/partial account number to a canonical identifier.
///
/// "****1234" -> "1234"; "44445555****" -> "5555" (last 4 of the digit run);
/// "1234" -> "1234"; anything without digits -> the cleaned raw string.
pub fn normalize_account_number(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '/'))
        .collect();
    if let Some(caps) = MASK_THEN_LAST4.captures(&cleaned) {
        return caps[1].to_string();
    }
    // Unmasked numbers are kept whole; only masked ones reduce to last 4.
    if !cleaned.contains(['*', 'X', 'x']) {
        return cleaned;
    }
    if let Some(run) = DIGIT_RUN
        .find_iter(&cleaned)
        .max_by_key(|m| m.as_str().len())
    {
        let digits = run.as_str();
        return if digits.len() > 4 {
            digits[digits.len() - 4..].to_string()
        } else {
            digits.to_string()
        };
    }
    cleaned
}

static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{4})$").unwrap());

const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parse a date in any of the formats bureaus use. MM/YYYY defaults the day
/// to the 1st. Returns None on failure, never errors.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Some(caps) = MONTH_YEAR.captures(s) {
        let month: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    None
}

/// Which status dimension a value belongs to.
///
/// Account state describes the lifecycle (open/closed/paid); payment
/// condition describes how it is being paid (current/late/collection). The
/// two must never end up under the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    AccountState,
    PaymentCondition,
    Unknown,
}

static LATE_DAYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+\s*days?\s*(late|past due)\b|\blate\s*\d+\s*days?\b").unwrap()
});

const ACCOUNT_STATE_WORDS: &[&str] = &[
    "open",
    "closed",
    "paid",
    "active",
    "inactive",
    "open account",
    "closed account",
    "account closed",
    "paid off",
    "paid in full",
];

const PAYMENT_CONDITION_WORDS: &[&str] = &[
    "current",
    "ok",
    "paid as agreed",
    "pays as agreed",
    "paid on time",
    "late",
    "delinquent",
    "past due",
    "collection",
    "collections",
    "charge off",
    "charge-off",
    "charged off",
    "charged-off",
    "chargeoff",
    "repossession",
];

impl StatusKind {
    pub fn of(raw: &str) -> StatusKind {
        let cleaned = clean_phrase(raw);
        if cleaned.is_empty() {
            return StatusKind::Unknown;
        }
        if ACCOUNT_STATE_WORDS.contains(&cleaned.as_str()) {
            return StatusKind::AccountState;
        }
        if PAYMENT_CONDITION_WORDS.contains(&cleaned.as_str()) || LATE_DAYS.is_match(&cleaned) {
            return StatusKind::PaymentCondition;
        }
        StatusKind::Unknown
    }
}

/// Collapse a capture that is the same word repeated 2+ times to its first
/// occurrence. A repeated word is the symptom of a column-index slip pulling
/// all three bureaus' identical values into one capture; it must never
/// multiply a value across bureaus.
pub fn collapse_repeated(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() >= 2 {
        let first = words[0];
        if words.iter().all(|w| w.eq_ignore_ascii_case(first)) {
            return first.to_string();
        }
    }
    raw.trim().to_string()
}

use crate::model::{Bureau, BureauFieldSet, FieldKey, RawAccountSpan};
use crate::normalize::fields::normalize_account_number;
use regex::Regex;
use std::sync::LazyLock;

// "1. CHASE BANK USA (Closed) Account #: 44445555****"
static NUMBERED_WITH_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(\d{1,3})[.)][ \t]+([A-Z][A-Z0-9&'./, \-]{1,60}?)",
        r"[ \t]*(?:\(([^)\n]{0,40})\))?",
        r"[ \t]*(?i:account\s*#|account\s+number|acct\.?\s*#?|#)\s*:?\s*",
        r"([0-9Xx*][0-9Xx*\- ]{0,28}[0-9Xx*]|[0-9Xx*]{2,})"
    ))
    .unwrap()
});

// Same shape without the leading counter, for bare name + number markers
// (also re-matches numbered entries; dedup collapses those).
static NAME_WITH_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"([A-Z][A-Z0-9&'./, \-]{1,60}?)",
        r"[ \t]*(?:\(([^)\n]{0,40})\))?",
        r"[ \t]*(?i:account\s*#|account\s+number|acct\.?\s*#?)\s*:?\s*",
        r"([0-9Xx*][0-9Xx*\- ]{0,28}[0-9Xx*]|[0-9Xx*]{2,})"
    ))
    .unwrap()
});

// Numbered entry with no inline account number: "2. WELLS FARGO"
static NUMBERED_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})[.)][ \t]+([A-Z][A-Z0-9&'./ \-]{2,60})").unwrap());

// "<Bureau> | NAME | NUMBER | BALANCE | STATUS | [REASON]" raw rows: these
// both discover an account and carry one bureau's values inline.
static PIPE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(transunion|trans union|experian|equifax)\s*\|\s*",
        r"([^|\n]{2,60}?)\s*\|\s*",
        r"([0-9Xx*][0-9Xx*\- ]{0,28}[0-9Xx*]|[0-9Xx*]{2,})\s*\|\s*",
        r"([^|\n]+?)\s*\|\s*([^|\n]+?)\s*(?:\|\s*([^|\n]+?)\s*)?(?:\||$|\n)"
    ))
    .unwrap()
});

// Cut a greedy bare-name capture at the first label or bureau name the
// aggressive line-joining may have pulled into it.
static NAME_TRIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\s*\b(account status|payment status|pay status|high balance|high limit",
        r"|credit limit|balance|date opened|date reported|past due|payment history",
        r"|last active|remarks|comments|terms|transunion|trans union|experian|equifax",
        r"|account #|acct)\b.*$"
    ))
    .unwrap()
});

// Strip what line-joining can glue onto the front of a name capture: a
// section header, or everything up to and including a numbered marker.
static NAME_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:.*\b\d{1,3}[.)][ \t]+",
        r"|(?:credit accounts|satisfactory accounts|adverse accounts",
        r"|account history|credit report|summary)\b[ \t:]*)"
    ))
    .unwrap()
});

static END_OF_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(inquiries|public records|creditor contacts|personal profile|end of (?:this )?report)\b")
        .unwrap()
});

const SECTION_HEADER_NAMES: &[&str] = &[
    "credit accounts",
    "satisfactory accounts",
    "adverse accounts",
    "account history",
    "public records",
    "inquiries",
    "credit inquiries",
    "personal profile",
    "personal information",
    "creditor contacts",
    "credit report",
    "summary",
];

// Account TYPE labels that greedy patterns routinely mis-capture as names.
const TYPE_TERMS: &[&str] = &[
    "revolving",
    "installment",
    "mortgage",
    "auto loan",
    "credit card",
    "collection agency",
    "personal loan",
    "student loan",
    "charge account",
    "education loan",
];

const TYPE_FIRST_WORDS: &[&str] = &[
    "revolving",
    "installment",
    "mortgage",
    "auto",
    "credit",
    "collection",
    "personal",
    "student",
    "charge",
    "education",
    "loan",
];

// How far to search backward when a span fails to contain its own account
// number, before giving up on number verification.
const BACKWARD_WINDOW: usize = 250;

#[derive(Debug)]
struct Candidate {
    name: String,
    number_raw: Option<String>,
    pos: usize,
    seed: Option<(Bureau, BureauFieldSet)>,
}

/// Locate account boundaries within one section and cut out the text span
/// belonging to each account.
pub fn segment(section_text: &str, section_bureau: Option<Bureau>) -> Vec<RawAccountSpan> {
    let mut candidates: Vec<Candidate> = Vec::new();

    for caps in NUMBERED_WITH_NUMBER.captures_iter(section_text) {
        push_candidate(
            &mut candidates,
            clean_name(&caps[2]),
            Some(caps[4].to_string()),
            caps.get(0).unwrap().start(),
            None,
        );
    }

    for caps in NAME_WITH_NUMBER.captures_iter(section_text) {
        push_candidate(
            &mut candidates,
            clean_name(&caps[1]),
            Some(caps[3].to_string()),
            caps.get(0).unwrap().start(),
            None,
        );
    }

    for caps in NUMBERED_BARE.captures_iter(section_text) {
        let name_match = caps.get(2).unwrap();
        let mut name_raw = name_match.as_str().to_string();
        // An uppercase run that stops right before a lowercase letter ends
        // with the capitalized head of a mixed-case word ("WELLS FARGO B" +
        // "alance:"); drop that fragment from the name.
        if section_text[name_match.end()..].starts_with(|c: char| c.is_lowercase()) {
            match name_raw.trim_end().rfind(' ') {
                Some(idx) => name_raw.truncate(idx),
                None => continue,
            }
        }
        push_candidate(
            &mut candidates,
            clean_name(&name_raw),
            None,
            caps.get(0).unwrap().start(),
            None,
        );
    }

    for caps in PIPE_ROW.captures_iter(section_text) {
        let bureau = Bureau::from_str_loose(&caps[1]);
        let seed = bureau.map(|b| {
            let mut fields = BureauFieldSet::default();
            fields.assign(FieldKey::Balance, &caps[4]);
            fields.assign(FieldKey::Status, &caps[5]);
            if let Some(reason) = caps.get(6) {
                fields.assign(FieldKey::Remarks, reason.as_str());
            }
            (b, fields)
        });
        push_candidate(
            &mut candidates,
            clean_name(&caps[2]),
            Some(caps[3].to_string()),
            caps.get(0).unwrap().start(),
            seed,
        );
    }

    candidates.sort_by_key(|c| c.pos);
    build_spans(section_text, candidates, section_bureau)
}

/// Accumulate a candidate, merging it into an existing entry with the same
/// (name, number) identity. A null-number candidate merges into a same-name
/// entry regardless of the entry's number, and fills the number in when it
/// is the entry that lacks one.
fn push_candidate(
    candidates: &mut Vec<Candidate>,
    name: String,
    number_raw: Option<String>,
    pos: usize,
    seed: Option<(Bureau, BureauFieldSet)>,
) {
    if !valid_name(&name) {
        return;
    }
    let name_key = name.to_lowercase();
    let number_key = number_raw.as_deref().map(normalize_account_number);

    for existing in candidates.iter_mut() {
        // Same marker position means the same entry matched by two
        // patterns; keep the first pattern's (more precise) name.
        if existing.pos == pos {
            if existing.number_raw.is_none() {
                existing.number_raw = number_raw;
            }
            if let Some(seed) = seed {
                existing.seed.get_or_insert(seed);
            }
            return;
        }
        if existing.name.to_lowercase() != name_key {
            continue;
        }
        let existing_key = existing.number_raw.as_deref().map(normalize_account_number);
        let same_identity = match (&existing_key, &number_key) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        if !same_identity {
            continue;
        }
        if existing.number_raw.is_none() {
            existing.number_raw = number_raw;
        }
        existing.pos = existing.pos.min(pos);
        if let Some(seed) = seed {
            existing.seed.get_or_insert(seed);
        }
        return;
    }

    candidates.push(Candidate {
        name,
        number_raw,
        pos,
        seed,
    });
}

fn build_spans(
    text: &str,
    candidates: Vec<Candidate>,
    section_bureau: Option<Bureau>,
) -> Vec<RawAccountSpan> {
    let mut spans = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let next_marker = candidates
            .get(i + 1)
            .map(|c| c.pos)
            .unwrap_or(text.len());
        let section_end = END_OF_SECTION
            .find_at(text, candidate.pos)
            .map(|m| m.start())
            .filter(|&p| p > candidate.pos)
            .unwrap_or(text.len());
        let end = next_marker.min(section_end);

        let mut start = candidate.pos;
        // A span that does not contain its own account number usually means
        // the boundary landed wrong; widen backward before giving up. The
        // account itself is never discarded over this.
        if let Some(number) = &candidate.number_raw {
            if !text[start..end].contains(number.as_str()) {
                let widened = snap_to_char_boundary(text, start.saturating_sub(BACKWARD_WINDOW));
                if text[widened..end].contains(number.as_str()) {
                    start = widened;
                }
            }
        }

        spans.push(RawAccountSpan {
            account_name: candidate.name.clone(),
            account_number: candidate
                .number_raw
                .as_deref()
                .map(normalize_account_number),
            start,
            end,
            text: text[start..end].to_string(),
            section_bureau,
            seeded: candidate.seed.clone().into_iter().collect(),
        });
    }
    spans
}

fn snap_to_char_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn clean_name(raw: &str) -> String {
    let trimmed = NAME_TRIM.replace(raw, "");
    let trimmed = NAME_LEAD.replace(&trimmed, "");
    trimmed
        .trim()
        .trim_end_matches([',', '-', '.'])
        .trim()
        .to_string()
}

/// Reject captures that are section headers or account-type labels rather
/// than creditor names.
fn valid_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    let lower = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    if lower.len() < 2 {
        return false;
    }
    if SECTION_HEADER_NAMES.contains(&lower.as_str()) || TYPE_TERMS.contains(&lower.as_str()) {
        return false;
    }
    let mut words = lower.split_whitespace();
    let first = words.next().unwrap_or("");
    let meaningful = 1 + words.filter(|w| w.len() >= 2).count();
    if TYPE_FIRST_WORDS.contains(&first) && meaningful < 2 {
        return false;
    }
    true
}

use crate::model::{Bureau, BureauFieldSet, FieldKey};
use crate::parsing::table::{
    bureau_order, field_key_for_label, parse_pipe_cells, split_three_values, TableLayout,
};
use regex::Regex;
use std::sync::LazyLock;

/// "Label: value run" line. The label may contain spaces, '/' and '#'.
static LABELED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*([A-Za-z][A-Za-z /#.]{0,30}?):[ \t]*(\S.*)$").unwrap());

// Longer labels first so "high balance" never half-matches as "balance".
static LABEL_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[ \t]*\b(payment status|pay status|account status|payment history|monthly payment|monthly pay|high balance|high limit|high credit|credit limit|date opened|date reported|last reported|last activity|last active|past due|balance|status|terms|remarks|comments)[ \t]*:",
    )
    .unwrap()
});

static QUOTED_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

static BUREAU_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(trans\s?union|experian|equifax)\b").unwrap());

static MONEY_FIELD_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(high balance|high limit|high credit|credit limit|balance|past due|monthly payment|monthly pay)\s*:?\s*(-?\$\s?\d[\d,]*(?:\.\d{1,2})?|\d[\d,]*\.\d{2})",
    )
    .unwrap()
});

static DATE_FIELD_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(date opened|opened|date reported|last reported|last activity|last active)\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{1,2}[/-]\d{4}|\d{4}-\d{2}-\d{2})",
    )
    .unwrap()
});

static STATUS_FIELD_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)\b(payment status|pay status|account status|status)\s*:?\s*([A-Za-z][\w /-]{0,40}?)(?:[.,;:|]|\t| {2,}|$|\s+(?:payment|pay|balance|date|high|monthly|past|account|terms|remarks|comments)\b)",
    )
    .unwrap()
});

static HISTORY_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpayment history\s*:?\s*([0-9OKXNC*/\- ]{2,40})").unwrap()
});

type Strategy = fn(&str, Bureau) -> BureauFieldSet;

/// Sub-strategies in priority order. The first one to yield any field wins;
/// the rest are never consulted for that (account, bureau) pair.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("aligned_table", aligned_table),
    ("csv_quoted", csv_quoted),
    ("pipe_table", pipe_table),
    ("broken_aligned_table", broken_aligned_table),
    ("vertical_block", vertical_block),
    ("inline_triple", inline_triple),
    ("bureau_section", bureau_section),
];

/// Extract one bureau's fields from an account span.
///
/// Never fails: an entirely empty field set (with no strategy name) means
/// nothing was recoverable and the caller decides how to degrade.
pub fn extract(text: &str, bureau: Bureau) -> (BureauFieldSet, Option<&'static str>) {
    for (name, strategy) in STRATEGIES {
        let fields = strategy(text, bureau);
        if !fields.is_empty() {
            return (fields, Some(name));
        }
    }
    (BureauFieldSet::default(), None)
}

fn apply_labeled_triple(
    line: &str,
    order: [Bureau; 3],
    bureau: Bureau,
    fields: &mut BureauFieldSet,
) {
    let Some(caps) = LABELED_LINE.captures(line) else {
        return;
    };
    let Some(key) = field_key_for_label(&caps[1]) else {
        return;
    };
    let Some(values) = split_three_values(&caps[2]) else {
        return;
    };
    let idx = order
        .iter()
        .position(|b| *b == bureau)
        .unwrap_or(bureau.canonical_index());
    fields.assign(key, &values[idx]);
}

/// Header line with the three bureau names fixing the column order, then
/// "Label: v1 v2 v3" rows underneath.
fn aligned_table(text: &str, bureau: Bureau) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    let mut order: Option<[Bureau; 3]> = None;
    for line in text.lines() {
        match order {
            None => {
                if !line.contains('|') {
                    order = bureau_order(line);
                }
            }
            Some(ord) => apply_labeled_triple(line, ord, bureau, &mut fields),
        }
    }
    fields
}

/// Aligned table whose rows were joined onto one line by soft-break repair.
/// Known labels are re-inserted as line breaks, then the triple extraction
/// runs as usual with the column order taken from the whole span.
fn broken_aligned_table(text: &str, bureau: Bureau) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    let Some(order) = bureau_order(text) else {
        return fields;
    };
    let repaired = LABEL_BREAK.replace_all(text, "\n$1:");
    for line in repaired.lines() {
        apply_labeled_triple(line, order, bureau, &mut fields);
    }
    fields
}

/// Rows shaped as `"Label","v1","v2","v3"`. The bureau's value is picked by
/// fixed position: the last three quoted cells hold TransUnion, Experian and
/// Equifax in that order.
fn csv_quoted(text: &str, bureau: Bureau) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    for line in text.lines() {
        let cells: Vec<&str> = QUOTED_CELL
            .captures_iter(line)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();
        if cells.len() < 4 {
            continue;
        }
        let Some(key) = field_key_for_label(cells[cells.len() - 4]) else {
            continue;
        };
        let values = &cells[cells.len() - 3..];
        fields.assign(key, values[bureau.canonical_index()].trim());
    }
    fields
}

/// `| Label | v1 | v2 | v3 |` rows. A header row naming the three bureaus
/// fixes the value-cell index per bureau; without one the canonical layout
/// (label cell, then TransUnion/Experian/Equifax) applies.
fn pipe_table(text: &str, bureau: Bureau) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    let mut layout = TableLayout::canonical();
    let mut saw_header = false;
    for line in text.lines() {
        let Some(cells) = parse_pipe_cells(line) else {
            continue;
        };
        if !saw_header {
            if let Some(found) = TableLayout::from_header_cells(&cells) {
                layout = found;
                saw_header = true;
                continue;
            }
        }
        let Some(key) = field_key_for_label(&cells[0]) else {
            continue;
        };
        if let Some(value) = cells.get(layout.value_col(bureau)) {
            fields.assign(key, value);
        }
    }
    fields
}

fn is_bureau_heading(line: &str, which: Option<Bureau>) -> bool {
    let trimmed = line
        .trim()
        .trim_matches(|c| matches!(c, '[' | ']' | ':' | '-'))
        .trim();
    if trimmed.is_empty() || trimmed.len() > 24 {
        return false;
    }
    match Bureau::from_str_loose(trimmed) {
        Some(found) => match which {
            Some(wanted) => found == wanted,
            None => true,
        },
        None => false,
    }
}

fn scan_label_value_lines(lines: &[&str], fields: &mut BureauFieldSet) {
    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if let Some(caps) = LABELED_LINE.captures(line) {
            if let Some(key) = field_key_for_label(&caps[1]) {
                fields.assign(key, caps[2].trim());
            }
        } else if let Some(key) = label_only(line) {
            // label on one line, value on the next
            if let Some(next) = lines.get(i + 1).map(|l| l.trim()) {
                if !next.is_empty() && LABELED_LINE.captures(next).is_none() && label_only(next).is_none()
                {
                    fields.assign(key, next);
                }
            }
        }
    }
}

fn label_only(line: &str) -> Option<FieldKey> {
    let bare = line.trim().trim_end_matches(':').trim();
    if bare.is_empty()
        || bare.len() > 24
        || bare.contains('$')
        || bare.contains(|c: char| c.is_ascii_digit())
    {
        return None;
    }
    field_key_for_label(bare)
}

/// The bureau's name on a line of its own, followed by that bureau's
/// key-value list until the next bureau heading.
fn vertical_block(text: &str, bureau: Bureau) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    let lines: Vec<&str> = text.lines().collect();
    let Some(start) = lines.iter().position(|l| is_bureau_heading(l, Some(bureau))) else {
        return fields;
    };
    let mut end = start + 1;
    while end < lines.len() && !is_bureau_heading(lines[end], None) {
        end += 1;
    }
    scan_label_value_lines(&lines[start + 1..end], &mut fields);
    fields
}

/// A lone "Field: v1 v2 v3" line with no bureau header anywhere; values are
/// taken in canonical bureau order. Restricted to fields where a stray
/// three-word value cannot be mistaken for a triple.
fn inline_triple(text: &str, bureau: Bureau) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    for line in text.lines() {
        let Some(caps) = LABELED_LINE.captures(line) else {
            continue;
        };
        let Some(key) = field_key_for_label(&caps[1]) else {
            continue;
        };
        if !matches!(
            key,
            FieldKey::Balance
                | FieldKey::HighLimit
                | FieldKey::PaymentStatus
                | FieldKey::MonthlyPay
                | FieldKey::Remarks
        ) {
            continue;
        }
        let Some(values) = split_three_values(&caps[2]) else {
            continue;
        };
        fields.assign(key, &values[bureau.canonical_index()]);
    }
    fields
}

/// Weakest per-bureau fallback: any mention of the bureau's name, with the
/// text up to the next bureau's mention scanned as key-value lines.
fn bureau_section(text: &str, bureau: Bureau) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    let mut start = None;
    let mut end = text.len();
    for m in BUREAU_NAME.find_iter(text) {
        match (Bureau::from_str_loose(m.as_str()), start) {
            (Some(found), None) if found == bureau => start = Some(m.end()),
            (Some(found), Some(_)) if found != bureau => {
                end = m.start();
                break;
            }
            _ => {}
        }
    }
    let Some(start) = start else {
        return fields;
    };
    let lines: Vec<&str> = text[start..end].lines().collect();
    scan_label_value_lines(&lines, &mut fields);
    fields
}

/// Bureau-agnostic scan over the whole span, for accounts reported once for
/// all bureaus. Picks up labeled lines plus inline label-value pairs that
/// survive line joining.
pub fn extract_shared(text: &str) -> BureauFieldSet {
    let mut fields = BureauFieldSet::default();
    let lines: Vec<&str> = text.lines().collect();
    scan_label_value_lines(&lines, &mut fields);
    for caps in MONEY_FIELD_SCAN.captures_iter(text) {
        if let Some(key) = field_key_for_label(&caps[1]) {
            fields.assign(key, &caps[2]);
        }
    }
    for caps in DATE_FIELD_SCAN.captures_iter(text) {
        if let Some(key) = field_key_for_label(&caps[1]) {
            fields.assign(key, &caps[2]);
        }
    }
    for caps in STATUS_FIELD_SCAN.captures_iter(text) {
        if let Some(key) = field_key_for_label(&caps[1]) {
            fields.assign(key, caps[2].trim());
        }
    }
    if let Some(caps) = HISTORY_SCAN.captures(text) {
        fields.assign(FieldKey::PaymentHistory, caps[1].trim());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_aligned_table_picks_bureau_column() {
        let text = "TransUnion  Experian  Equifax\n\
                    Balance: $100.00  $200.00  $300.00\n\
                    Status: Open  Closed  Open\n";
        let (tu, strategy) = extract(text, Bureau::TransUnion);
        assert_eq!(strategy, Some("aligned_table"));
        assert_eq!(tu.balance, dec!(100.00));
        assert_eq!(tu.status.as_deref(), Some("CURRENT"));

        let (exp, _) = extract(text, Bureau::Experian);
        assert_eq!(exp.balance, dec!(200.00));
        assert_eq!(exp.status.as_deref(), Some("CLOSED"));
    }

    #[test]
    fn test_aligned_table_respects_header_order() {
        let text = "Equifax  TransUnion  Experian\n\
                    Balance: $1.00  $2.00  $3.00\n";
        let (eq, _) = extract(text, Bureau::Equifax);
        assert_eq!(eq.balance, dec!(1.00));
        let (tu, _) = extract(text, Bureau::TransUnion);
        assert_eq!(tu.balance, dec!(2.00));
    }

    #[test]
    fn test_broken_aligned_table_single_line() {
        // what an aligned table looks like after soft-break repair joined it
        let text = "1. CHASE BANK USA Account #: 44445555**** TransUnion Experian Equifax \
                    Balance: $1,250.00 $1,250.00 $1,250.00 \
                    Payment Status: Current Current Current \
                    Date Opened: 01/2019 01/2019 01/2019";
        let (tu, strategy) = extract(text, Bureau::TransUnion);
        assert_eq!(strategy, Some("broken_aligned_table"));
        assert_eq!(tu.balance, dec!(1250.00));
        assert_eq!(tu.payment_status.as_deref(), Some("Current"));
        assert_eq!(
            tu.date_opened,
            chrono::NaiveDate::from_ymd_opt(2019, 1, 1)
        );
    }

    #[test]
    fn test_csv_quoted_rows() {
        let text = "\"Balance\",\"$500.00\",\"$510.00\",\"$500.00\"\n\
                    \"Payment Status\",\"Current\",\"Late 30 Days\",\"Current\"\n";
        let (exp, strategy) = extract(text, Bureau::Experian);
        assert_eq!(strategy, Some("csv_quoted"));
        assert_eq!(exp.balance, dec!(510.00));
        assert_eq!(exp.payment_status.as_deref(), Some("Late 30 Days"));
    }

    #[test]
    fn test_pipe_table_with_header_shift() {
        let text = "| TransUnion | Experian | Equifax |\n\
                    | Balance: | $10.00 | $20.00 | $30.00 |\n\
                    | Status: | Open | Open | Closed |\n";
        let (eq, strategy) = extract(text, Bureau::Equifax);
        assert_eq!(strategy, Some("pipe_table"));
        assert_eq!(eq.balance, dec!(30.00));
        assert_eq!(eq.status.as_deref(), Some("CLOSED"));
    }

    #[test]
    fn test_pipe_table_without_header_uses_canonical_order() {
        let text = "| Balance: | $10.00 | $20.00 | $30.00 |\n";
        let (exp, _) = extract(text, Bureau::Experian);
        assert_eq!(exp.balance, dec!(20.00));
    }

    #[test]
    fn test_vertical_block() {
        let text = "TransUnion\nBalance: $75.00\nStatus: Open\n\
                    Experian\nBalance: $80.00\nStatus: Closed\n";
        let (tu, strategy) = extract(text, Bureau::TransUnion);
        assert_eq!(strategy, Some("vertical_block"));
        assert_eq!(tu.balance, dec!(75.00));
        assert_eq!(tu.status.as_deref(), Some("CURRENT"));
        let (exp, _) = extract(text, Bureau::Experian);
        assert_eq!(exp.balance, dec!(80.00));
    }

    #[test]
    fn test_vertical_block_label_on_own_line() {
        let text = "[Equifax Section]\nBalance:\n$42.00\nPayment Status:\nCollection\n";
        let (eq, _) = extract(text, Bureau::Equifax);
        assert_eq!(eq.balance, dec!(42.00));
        assert_eq!(eq.payment_status.as_deref(), Some("Collection"));
    }

    #[test]
    fn test_inline_triple_uses_canonical_index() {
        let text = "Balance: $5.00 $6.00 $7.00\n";
        let (tu, strategy) = extract(text, Bureau::TransUnion);
        assert_eq!(strategy, Some("inline_triple"));
        assert_eq!(tu.balance, dec!(5.00));
        let (eq, _) = extract(text, Bureau::Equifax);
        assert_eq!(eq.balance, dec!(7.00));
    }

    #[test]
    fn test_bureau_section_fallback() {
        let text = "Reported by Experian with Balance: $12.34 and nothing else";
        let (exp, strategy) = extract(text, Bureau::Experian);
        assert_eq!(strategy, Some("bureau_section"));
        assert_eq!(exp.balance, dec!(12.34));
        let (tu, strategy) = extract(text, Bureau::TransUnion);
        assert!(tu.is_empty());
        assert_eq!(strategy, None);
    }

    #[test]
    fn test_repeated_value_collapses_instead_of_multiplying() {
        let text = "TransUnion\nStatus: Closed Closed Closed\n";
        let (tu, _) = extract(text, Bureau::TransUnion);
        assert_eq!(tu.status.as_deref(), Some("CLOSED"));
    }

    #[test]
    fn test_shared_scan_inline_fields() {
        let text = "MIDLAND FUNDING Account #: 1234 Balance: $1,500.00 \
                    Past Due: $200.00 Date Opened: 03/2021 Status: Collection \
                    Payment History: 111000110";
        let fields = extract_shared(text);
        assert_eq!(fields.balance, dec!(1500.00));
        assert_eq!(fields.past_due, Some(dec!(200.00)));
        assert_eq!(
            fields.date_opened,
            chrono::NaiveDate::from_ymd_opt(2021, 3, 1)
        );
        assert_eq!(fields.payment_status.as_deref(), Some("Collection"));
        assert_eq!(fields.payment_history.as_deref(), Some("111000110"));
    }

    #[test]
    fn test_shared_scan_high_balance_is_not_balance() {
        let fields = extract_shared("High Balance: $900.00");
        assert!(fields.balance.is_zero());
        assert_eq!(fields.high_limit, Some(dec!(900.00)));
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        let (fields, strategy) = extract("", Bureau::TransUnion);
        assert!(fields.is_empty());
        assert!(strategy.is_none());
    }
}

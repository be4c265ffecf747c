use crate::model::{Bureau, FieldKey};
use regex::Regex;
use std::sync::LazyLock;

/// A currency literal anywhere in a line ("$1,250.00", "- $14.05", "850.00").
pub static MONEY_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\s?\$\s?\d[\d,]*(?:\.\d{1,2})?|\b\d[\d,]*\.\d{2}\b").unwrap());

static MONEY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\$?\d[\d,]*(?:\.\d{1,2})?$").unwrap());

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}$|^\d{1,2}/\d{4}$|^\d{4}-\d{2}-\d{2}$").unwrap()
});

static GAP_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\t| {2,}").unwrap());

// Single words that start a new status segment during word-by-word
// reconstruction of a three-value run.
const STATUS_STARTERS: &[&str] = &[
    "current",
    "open",
    "closed",
    "paid",
    "late",
    "delinquent",
    "collection",
    "collections",
    "chargeoff",
    "charge-off",
    "repossession",
    "inactive",
    "ok",
    "unknown",
    "n/a",
    "none",
];

/// Map a table/row label to the field it populates.
///
/// Checked in fixed priority order. Payment status comes before any generic
/// status match so the two status dimensions cannot be confused, and the
/// high-limit labels come before the bare "balance" containment check.
pub fn field_key_for_label(label: &str) -> Option<FieldKey> {
    let l = label
        .to_lowercase()
        .replace([':', '#'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if l.is_empty() || l.len() > 40 {
        return None;
    }
    if l.contains("payment status") || l.contains("pay status") {
        return Some(FieldKey::PaymentStatus);
    }
    if l.contains("status") {
        return Some(FieldKey::Status);
    }
    if l.contains("high balance")
        || l.contains("high limit")
        || l.contains("credit limit")
        || l.contains("high credit")
    {
        return Some(FieldKey::HighLimit);
    }
    if l.contains("balance") {
        return Some(FieldKey::Balance);
    }
    if l.contains("monthly pay") {
        return Some(FieldKey::MonthlyPay);
    }
    if l.contains("date opened") || l == "opened" {
        return Some(FieldKey::DateOpened);
    }
    if l.contains("past due") {
        return Some(FieldKey::PastDue);
    }
    if l.contains("last active") || l.contains("last activity") {
        return Some(FieldKey::DateLastActive);
    }
    if l.contains("date reported") || l.contains("last reported") {
        return Some(FieldKey::DateReported);
    }
    if l.contains("payment history") || l == "history" {
        return Some(FieldKey::PaymentHistory);
    }
    if l.contains("terms") {
        return Some(FieldKey::Terms);
    }
    if l.contains("remarks") || l.contains("comment") {
        return Some(FieldKey::Remarks);
    }
    None
}

/// The three bureaus in the order their names appear in `text`, or None
/// unless all three are present. Computed once per table and reused for
/// every row, so column arithmetic lives in exactly one place.
pub fn bureau_order(text: &str) -> Option<[Bureau; 3]> {
    let lower = text.to_lowercase();
    let mut found: Vec<(usize, Bureau)> = Vec::new();
    for bureau in Bureau::ALL {
        let pos = lower.find(bureau.key()).or_else(|| {
            if bureau == Bureau::TransUnion {
                lower.find("trans union")
            } else {
                None
            }
        })?;
        found.push((pos, bureau));
    }
    found.sort_by_key(|(pos, _)| *pos);
    Some([found[0].1, found[1].1, found[2].1])
}

/// Column map for a pipe/CSV-style table: for each bureau (canonical index),
/// the cell index its values occupy in data rows.
#[derive(Debug, Clone)]
pub struct TableLayout {
    value_col: [usize; 3],
}

impl TableLayout {
    /// Derive the layout from a header row's cells. When the header has no
    /// label cell before the first bureau name (its first bureau sits at
    /// cell 0), data-row values sit one cell right of the header position.
    pub fn from_header_cells(cells: &[String]) -> Option<TableLayout> {
        let mut col: [Option<usize>; 3] = [None; 3];
        for (i, cell) in cells.iter().enumerate() {
            if let Some(b) = Bureau::from_str_loose(cell) {
                col[b.canonical_index()].get_or_insert(i);
            }
        }
        let raw = [col[0]?, col[1]?, col[2]?];
        let shift = if raw.iter().min() == Some(&0) { 1 } else { 0 };
        Some(TableLayout {
            value_col: [raw[0] + shift, raw[1] + shift, raw[2] + shift],
        })
    }

    /// Canonical layout when no header row exists: label cell, then the
    /// three bureaus in TransUnion/Experian/Equifax order.
    pub fn canonical() -> TableLayout {
        TableLayout {
            value_col: [1, 2, 3],
        }
    }

    pub fn value_col(&self, bureau: Bureau) -> usize {
        self.value_col[bureau.canonical_index()]
    }
}

/// Split a pipe-delimited row into trimmed cells, tolerating both leading
/// and trailing pipes. None when the line is not a table row.
pub fn parse_pipe_cells(line: &str) -> Option<Vec<String>> {
    if !line.contains('|') {
        return None;
    }
    let mut cells: Vec<String> = line.split('|').map(|c| c.trim().to_string()).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    if cells.len() >= 2 {
        Some(cells)
    } else {
        None
    }
}

/// Split the value run of a "Label: v1 v2 v3" line into exactly three
/// per-bureau values.
///
/// Tries, in order: three currency literals; three gap-separated segments
/// (tab or 2+ spaces); word-by-word reconstruction where currency, date and
/// known status words open a new segment.
pub fn split_three_values(rest: &str) -> Option<Vec<String>> {
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    let money: Vec<String> = MONEY_LITERAL
        .find_iter(rest)
        .map(|m| m.as_str().trim().to_string())
        .collect();
    if money.len() == 3 {
        return Some(money);
    }

    let segments: Vec<String> = GAP_SPLIT
        .split(rest)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if segments.len() == 3 {
        return Some(segments);
    }

    reconstruct_three(rest)
}

fn starts_segment(token: &str) -> bool {
    let lower = token.to_lowercase();
    MONEY_TOKEN.is_match(token)
        || DATE_TOKEN.is_match(token)
        || STATUS_STARTERS.contains(&lower.as_str())
}

fn reconstruct_three(rest: &str) -> Option<Vec<String>> {
    let mut segments: Vec<Vec<&str>> = Vec::new();
    for token in rest.split_whitespace() {
        if starts_segment(token) || segments.is_empty() {
            segments.push(vec![token]);
        } else {
            segments.last_mut().unwrap().push(token);
        }
    }
    if segments.len() == 3 {
        Some(segments.into_iter().map(|s| s.join(" ")).collect())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_triple() {
        let v = split_three_values("$1,250.00 $1,250.00 $1,250.00").unwrap();
        assert_eq!(v, vec!["$1,250.00", "$1,250.00", "$1,250.00"]);
    }

    #[test]
    fn test_gap_triple() {
        let v = split_three_values("Open\tClosed\tOpen").unwrap();
        assert_eq!(v, vec!["Open", "Closed", "Open"]);
    }

    #[test]
    fn test_word_reconstruction_statuses() {
        let v = split_three_values("Paid as agreed Current Collection").unwrap();
        assert_eq!(v, vec!["Paid as agreed", "Current", "Collection"]);
    }

    #[test]
    fn test_word_reconstruction_dates() {
        let v = split_three_values("01/2019 03/15/2019 2019-03-15").unwrap();
        assert_eq!(v, vec!["01/2019", "03/15/2019", "2019-03-15"]);
    }

    #[test]
    fn test_not_three_is_none() {
        assert!(split_three_values("Open Closed").is_none());
        assert!(split_three_values("").is_none());
    }

    #[test]
    fn test_label_priority_payment_before_account_status() {
        assert_eq!(
            field_key_for_label("Payment Status:"),
            Some(FieldKey::PaymentStatus)
        );
        assert_eq!(field_key_for_label("Account Status"), Some(FieldKey::Status));
        assert_eq!(field_key_for_label("Status"), Some(FieldKey::Status));
    }

    #[test]
    fn test_label_high_balance_is_limit_not_balance() {
        assert_eq!(field_key_for_label("High Balance"), Some(FieldKey::HighLimit));
        assert_eq!(field_key_for_label("Balance"), Some(FieldKey::Balance));
    }

    #[test]
    fn test_bureau_order_follows_text() {
        let order = bureau_order("Equifax  TransUnion  Experian").unwrap();
        assert_eq!(
            order,
            [Bureau::Equifax, Bureau::TransUnion, Bureau::Experian]
        );
        assert!(bureau_order("TransUnion only").is_none());
    }

    #[test]
    fn test_layout_with_leading_label_cell() {
        let cells = vec![
            "".to_string(),
            "TransUnion".to_string(),
            "Experian".to_string(),
            "Equifax".to_string(),
        ];
        // leading pipe already stripped by parse_pipe_cells; header label
        // cell is empty so bureau cells line up with data cells
        let layout = TableLayout::from_header_cells(&cells).unwrap();
        assert_eq!(layout.value_col(Bureau::TransUnion), 1);
        assert_eq!(layout.value_col(Bureau::Equifax), 3);
    }

    #[test]
    fn test_layout_without_label_cell_shifts() {
        let cells = vec![
            "TransUnion".to_string(),
            "Experian".to_string(),
            "Equifax".to_string(),
        ];
        let layout = TableLayout::from_header_cells(&cells).unwrap();
        assert_eq!(layout.value_col(Bureau::TransUnion), 1);
        assert_eq!(layout.value_col(Bureau::Experian), 2);
    }

    #[test]
    fn test_parse_pipe_cells() {
        let cells = parse_pipe_cells("| Balance: | $100 | $200 | $300 |").unwrap();
        assert_eq!(cells, vec!["Balance:", "$100", "$200", "$300"]);
        assert!(parse_pipe_cells("no pipes here").is_none());
    }
}

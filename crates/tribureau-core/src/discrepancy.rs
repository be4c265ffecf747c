use crate::model::{Bureau, BureauFieldSet, DiscrepancyFlag};
use chrono::NaiveDate;
use rust_decimal::Decimal;

const NEGATIVE_MARKERS: &[&str] = &[
    "late",
    "delinquent",
    "collection",
    "collections",
    "charge",
    "charged",
    "chargeoff",
    "repossession",
    "past due",
];

const GOOD_MARKERS: &[&str] = &["current", "paid", "ok", "agreed", "on time"];

fn status_text(fields: &BureauFieldSet) -> String {
    let mut s = String::new();
    if let Some(status) = &fields.status {
        s.push_str(status);
        s.push(' ');
    }
    if let Some(payment) = &fields.payment_status {
        s.push_str(payment);
    }
    s.to_lowercase().replace('_', " ")
}

// Whole-word containment: "revoked" must not read as "ok", nor "related" as
// "late".
fn contains_marker(text: &str, marker: &str) -> bool {
    text.match_indices(marker).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + marker.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

fn indicates_negative(fields: &BureauFieldSet) -> bool {
    let text = status_text(fields);
    NEGATIVE_MARKERS.iter().any(|m| contains_marker(&text, m))
}

fn indicates_good(fields: &BureauFieldSet) -> bool {
    let text = status_text(fields);
    GOOD_MARKERS.iter().any(|m| contains_marker(&text, m)) && !indicates_negative(fields)
}

/// Compare one account's field sets across bureaus.
///
/// Needs at least two bureaus with data to flag anything. Zero balances and
/// missing dates never count as a disagreement; a bureau that simply did not
/// report a value is not contradicting the ones that did.
pub fn detect(per_bureau: &[(Bureau, &BureauFieldSet)]) -> Vec<DiscrepancyFlag> {
    let mut flags = Vec::new();
    let present: Vec<&BureauFieldSet> = per_bureau
        .iter()
        .map(|(_, fields)| *fields)
        .filter(|fields| !fields.is_empty())
        .collect();
    if present.len() < 2 {
        return flags;
    }

    let mut balances: Vec<Decimal> = present
        .iter()
        .filter(|f| !f.balance.is_zero())
        .map(|f| f.balance)
        .collect();
    balances.sort();
    balances.dedup();
    if balances.len() > 1 {
        flags.push(DiscrepancyFlag::InaccurateBalance);
    }

    let mut dates: Vec<NaiveDate> = present.iter().filter_map(|f| f.date_last_active).collect();
    dates.sort();
    dates.dedup();
    if dates.len() > 1 {
        flags.push(DiscrepancyFlag::InaccurateDate);
    }

    let conflict = present.iter().enumerate().any(|(i, fields)| {
        indicates_negative(fields)
            && present
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && indicates_good(other))
    });
    if conflict {
        flags.push(DiscrepancyFlag::StatusConflict);
    }

    flags
}

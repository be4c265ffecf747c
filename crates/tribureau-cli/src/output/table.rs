use std::fmt::Write;

use tribureau_core::model::{Bureau, BureauFieldSet, ParsedReport};
use tribureau_core::trace::TraceSeverity;

/// Human-readable rendering of a parsed report. JSON output goes through
/// serde; this is the terminal view.
pub fn format_parsed(report: &ParsedReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Format: {}", report.format);

    if let Some(ref scores) = report.scores {
        let _ = writeln!(out, "\nCredit scores");
        for bureau in Bureau::ALL {
            match scores.score(bureau) {
                Some(s) => {
                    let _ = writeln!(out, "  {:<12} {s}", bureau.to_string());
                }
                None => {
                    let _ = writeln!(out, "  {:<12} -", bureau.to_string());
                }
            }
        }
        if let Some(date) = scores.report_date {
            let _ = writeln!(out, "  Report date: {date}");
        }
        if let Some(ref reference) = scores.reference_number {
            let _ = writeln!(out, "  Reference #: {reference}");
        }
    }

    if !report.profiles.is_empty() {
        let _ = writeln!(out, "\nPersonal profile");
        for profile in &report.profiles {
            let _ = writeln!(out, "  {}", profile.bureau);
            if let Some(ref name) = profile.name {
                let _ = writeln!(out, "    Name:     {name}");
            }
            if let Some(ref dob) = profile.date_of_birth {
                let _ = writeln!(out, "    DOB:      {dob}");
            }
            if let Some(ref address) = profile.address {
                let _ = writeln!(out, "    Address:  {address}");
            }
            if let Some(ref employer) = profile.employer {
                let _ = writeln!(out, "    Employer: {employer}");
            }
        }
    }

    // Records come out in account groups of three (one per bureau).
    let mut i = 0;
    while i < report.accounts.len() {
        let head = &report.accounts[i];
        let group_len = report.accounts[i..]
            .iter()
            .take_while(|r| {
                r.account_name == head.account_name && r.account_number == head.account_number
            })
            .count();

        match head.account_number {
            Some(ref number) => {
                let _ = writeln!(out, "\n{} (#{number})", head.account_name);
            }
            None => {
                let _ = writeln!(out, "\n{}", head.account_name);
            }
        }
        for record in &report.accounts[i..i + group_len] {
            let _ = writeln!(
                out,
                "  {:<12} {}",
                record.bureau.to_string(),
                summarize_fields(&record.fields)
            );
        }

        i += group_len;
    }

    if !report.discrepancies.is_empty() {
        let _ = writeln!(out, "\nDiscrepancies");
        for disc in &report.discrepancies {
            let flags = disc
                .flags
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            match disc.account_number {
                Some(ref number) => {
                    let _ = writeln!(out, "  {} (#{number}): {flags}", disc.account_name);
                }
                None => {
                    let _ = writeln!(out, "  {}: {flags}", disc.account_name);
                }
            }
        }
    }

    if !report.trace.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings");
        for warning in &report.trace.warnings {
            let tag = match warning.severity {
                TraceSeverity::Critical => "critical",
                TraceSeverity::Important => "important",
                TraceSeverity::Info => "info",
            };
            match warning.account_name {
                Some(ref name) => {
                    let _ = writeln!(out, "  [{tag}] {name}: {}", warning.message);
                }
                None => {
                    let _ = writeln!(out, "  [{tag}] {}", warning.message);
                }
            }
        }
    }

    out.trim_end().to_string()
}

fn summarize_fields(fields: &BureauFieldSet) -> String {
    if fields.is_empty() {
        return "(not reported)".to_string();
    }

    let mut parts = Vec::new();
    if !fields.balance.is_zero() {
        parts.push(format!("balance ${}", fields.balance));
    }
    if let Some(limit) = fields.high_limit {
        parts.push(format!("high limit ${limit}"));
    }
    if let Some(monthly) = fields.monthly_pay {
        parts.push(format!("monthly ${monthly}"));
    }
    if let Some(past_due) = fields.past_due {
        parts.push(format!("past due ${past_due}"));
    }
    if let Some(ref status) = fields.status {
        parts.push(format!("status {status}"));
    }
    if let Some(ref payment) = fields.payment_status {
        parts.push(format!("payment {payment}"));
    }
    if let Some(date) = fields.date_opened {
        parts.push(format!("opened {date}"));
    }
    if let Some(date) = fields.date_last_active {
        parts.push(format!("last active {date}"));
    }
    if let Some(date) = fields.date_reported {
        parts.push(format!("reported {date}"));
    }
    if let Some(ref history) = fields.payment_history {
        parts.push(format!("history {history}"));
    }
    if let Some(ref reason) = fields.reason {
        parts.push(format!("remarks {reason}"));
    }
    parts.join(", ")
}

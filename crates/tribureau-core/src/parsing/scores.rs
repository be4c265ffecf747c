use crate::model::{Bureau, PersonalProfileVariant, ScoreTriple};
use crate::normalize::fields::normalize_date;
use crate::parsing::table::{bureau_order, split_three_values};
use regex::Regex;
use std::sync::LazyLock;

static SCORE_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([3-8]\d{2})\b").unwrap());

// The gap between a bureau's name and its score excludes '$' so that
// dollar amounts near bureau names in account tables never read as scores.
static INLINE_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(trans\s?union|experian|equifax)\b[^\d$\n]{0,30}?\b([3-8]\d{2})\b").unwrap()
});

// Scores table whose header and value rows were joined onto one line: the
// three bureau names immediately followed by three numbers.
static FLAT_SCORE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(trans\s?union|experian|equifax)[\t ]+",
        r"(trans\s?union|experian|equifax)[\t ]+",
        r"(trans\s?union|experian|equifax)[\t :]*",
        r"([3-8]\d{2})[\t ]+([3-8]\d{2})[\t ]+([3-8]\d{2})\b"
    ))
    .unwrap()
});

static REPORT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\breport\s+date\s*:?\s*(\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}/\d{4})",
    )
    .unwrap()
});

static REFERENCE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\breference\s*(?:#|number|no\.?)?\s*:?\s*([A-Z0-9][A-Z0-9-]{3,23})").unwrap()
});

static PROFILE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpersonal\s+(?:profile|information)\b").unwrap());

static SECTION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(credit\s+accounts|credit\s+scores?|satisfactory\s+accounts|adverse\s+accounts|inquiries|public\s+records)\b",
    )
    .unwrap()
});

// Re-insert profile labels as line breaks; soft-break repair may have joined
// the header row and the field rows into one line.
static PROFILE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[ \t]*\b(name|date of birth|dob|address|employer)[ \t]*:").unwrap()
});

static PROFILE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*([A-Za-z][A-Za-z /]{0,30}?):[ \t]*(\S.*)$").unwrap());

static PROFILE_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\b(name|date of birth|dob|address|employer)\s*:\s*([^\n|]{1,60})").unwrap()
});

static BUREAU_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(trans\s?union|experian|equifax)\b").unwrap());

fn in_score_range(n: u32) -> bool {
    (300..=850).contains(&n)
}

/// Find the per-bureau score triple, or None when the report carries no
/// scores at all.
///
/// A tabular block (the three bureau names on one line, a numeric row
/// beneath) wins over independent inline "Bureau ... NNN" mentions.
pub fn parse_scores(text: &str) -> Option<ScoreTriple> {
    let mut triple = ScoreTriple::default();

    let lines: Vec<&str> = text.lines().collect();
    'tabular: for (i, line) in lines.iter().enumerate() {
        let Some(order) = bureau_order(line) else {
            continue;
        };
        // value row within the next few lines; skip anything that carries
        // dollar amounts or labels, those belong to account tables
        for candidate in lines.iter().skip(i + 1).take(4) {
            if candidate.contains('$') || candidate.contains(':') {
                continue;
            }
            let values: Vec<u32> = SCORE_VALUE
                .find_iter(candidate)
                .filter_map(|m| m.as_str().parse().ok())
                .filter(|n| in_score_range(*n))
                .collect();
            if values.len() == 3 {
                for (j, bureau) in order.iter().enumerate() {
                    triple.set_score(*bureau, values[j]);
                }
                break 'tabular;
            }
        }
    }

    if triple.is_empty() {
        if let Some(caps) = FLAT_SCORE_TABLE.captures(text) {
            for i in 0..3 {
                if let (Some(bureau), Ok(n)) = (
                    Bureau::from_str_loose(&caps[1 + i]),
                    caps[4 + i].parse::<u32>(),
                ) {
                    if in_score_range(n) {
                        triple.set_score(bureau, n);
                    }
                }
            }
        }
    }

    if triple.is_empty() {
        for caps in INLINE_SCORE.captures_iter(text) {
            let Some(bureau) = Bureau::from_str_loose(&caps[1]) else {
                continue;
            };
            if let Ok(n) = caps[2].parse::<u32>() {
                if in_score_range(n) {
                    triple.set_score(bureau, n);
                }
            }
        }
    }

    if triple.is_empty() {
        return None;
    }

    if let Some(caps) = REPORT_DATE.captures(text) {
        triple.report_date = normalize_date(&caps[1]);
    }
    if let Some(caps) = REFERENCE_NUMBER.captures(text) {
        triple.reference_number = Some(caps[1].to_string());
    }
    Some(triple)
}

/// Extract each bureau's own rendition of the personal data. Variants are
/// kept separate per bureau; bureaus legitimately disagree on spelling.
pub fn parse_profiles(text: &str) -> Vec<PersonalProfileVariant> {
    let Some(section) = profile_section(text) else {
        return Vec::new();
    };
    let section = PROFILE_BREAK.replace_all(section, "\n$1:");

    let mut variants: Vec<PersonalProfileVariant> = Bureau::ALL
        .iter()
        .map(|b| PersonalProfileVariant::new(*b))
        .collect();

    if let Some(order) = bureau_order(&section) {
        for line in section.lines() {
            let Some(caps) = PROFILE_LINE.captures(line) else {
                continue;
            };
            let Some(values) = split_three_values(&caps[2]) else {
                continue;
            };
            for (i, bureau) in order.iter().enumerate() {
                assign_profile_field(&mut variants[bureau.canonical_index()], &caps[1], &values[i]);
            }
        }
    } else {
        for bureau in Bureau::ALL {
            if let Some(block) = bureau_block(&section, bureau) {
                for caps in PROFILE_INLINE.captures_iter(block) {
                    assign_profile_field(
                        &mut variants[bureau.canonical_index()],
                        &caps[1],
                        caps[2].trim(),
                    );
                }
            }
        }
    }

    variants.into_iter().filter(|v| !v.is_empty()).collect()
}

fn profile_section(text: &str) -> Option<&str> {
    let start = PROFILE_SECTION.find(text)?.end();
    let rest = &text[start..];
    let end = SECTION_END.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn bureau_block(section: &str, bureau: Bureau) -> Option<&str> {
    let mut start = None;
    let mut end = section.len();
    for m in BUREAU_NAME.find_iter(section) {
        match (Bureau::from_str_loose(m.as_str()), start) {
            (Some(found), None) if found == bureau => start = Some(m.end()),
            (Some(found), Some(_)) if found != bureau => {
                end = m.start();
                break;
            }
            _ => {}
        }
    }
    start.map(|s| &section[s..end])
}

fn assign_profile_field(variant: &mut PersonalProfileVariant, label: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() || value == "-" {
        return;
    }
    let l = label.to_lowercase();
    let slot = if l.contains("birth") || l.contains("dob") {
        &mut variant.date_of_birth
    } else if l.contains("name") {
        &mut variant.name
    } else if l.contains("address") {
        &mut variant.address
    } else if l.contains("employer") {
        &mut variant.employer
    } else {
        return;
    };
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_tabular_scores() {
        let text = "CREDIT SCORES\nTransUnion  Experian  Equifax\n720  680  715\n";
        let scores = parse_scores(text).unwrap();
        assert_eq!(scores.transunion, Some(720));
        assert_eq!(scores.experian, Some(680));
        assert_eq!(scores.equifax, Some(715));
    }

    #[test]
    fn test_tabular_scores_respect_header_order() {
        let text = "Equifax  Experian  TransUnion\n600  650  700\n";
        let scores = parse_scores(text).unwrap();
        assert_eq!(scores.equifax, Some(600));
        assert_eq!(scores.transunion, Some(700));
    }

    #[test]
    fn test_flat_score_table_single_line() {
        // header and value rows joined by soft-break repair
        let scores = parse_scores("TransUnion\tExperian\tEquifax 720\t680\t715").unwrap();
        assert_eq!(scores.transunion, Some(720));
        assert_eq!(scores.experian, Some(680));
        assert_eq!(scores.equifax, Some(715));
    }

    #[test]
    fn test_inline_scores() {
        let text = "TransUnion Score: 712\nExperian Score: 698\nEquifax Score: 705\n";
        let scores = parse_scores(text).unwrap();
        assert_eq!(scores.transunion, Some(712));
        assert_eq!(scores.experian, Some(698));
        assert_eq!(scores.equifax, Some(705));
    }

    #[test]
    fn test_partial_inline_scores() {
        let scores = parse_scores("Experian 640").unwrap();
        assert_eq!(scores.experian, Some(640));
        assert_eq!(scores.transunion, None);
    }

    #[test]
    fn test_no_scores_is_none() {
        assert!(parse_scores("CREDIT ACCOUNTS\n1. CHASE BANK\n").is_none());
        // dollar amounts next to bureau names are not scores
        assert!(parse_scores("TransUnion Balance: $720.00").is_none());
    }

    #[test]
    fn test_report_date_and_reference() {
        let text = "Report Date: 05/01/2023 Reference #: AB12345\n\
                    TransUnion  Experian  Equifax\n700  700  700\n";
        let scores = parse_scores(text).unwrap();
        assert_eq!(
            scores.report_date,
            NaiveDate::from_ymd_opt(2023, 5, 1)
        );
        assert_eq!(scores.reference_number.as_deref(), Some("AB12345"));
    }

    #[test]
    fn test_tabular_profiles() {
        let text = "PERSONAL PROFILE\nTransUnion  Experian  Equifax\n\
                    Name: JOHN Q DOE  JOHN DOE  J DOE\n\
                    Date of Birth: 1980  1980  1980\n\
                    CREDIT ACCOUNTS\n";
        let profiles = parse_profiles(text);
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].bureau, Bureau::TransUnion);
        assert_eq!(profiles[0].name.as_deref(), Some("JOHN Q DOE"));
        assert_eq!(profiles[1].name.as_deref(), Some("JOHN DOE"));
        assert_eq!(profiles[2].date_of_birth.as_deref(), Some("1980"));
    }

    #[test]
    fn test_profiles_survive_joined_lines() {
        let text = "PERSONAL PROFILE TransUnion\tExperian\tEquifax \
                    Name: JOHN Q DOE\tJOHN DOE\tJ DOE CREDIT ACCOUNTS";
        let profiles = parse_profiles(text);
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].name.as_deref(), Some("JOHN Q DOE"));
        assert_eq!(profiles[2].name.as_deref(), Some("J DOE"));
    }

    #[test]
    fn test_inline_profiles() {
        let text = "PERSONAL INFORMATION\n\
                    TransUnion\nName: JANE ROE\nAddress: 12 OAK ST\n\
                    Experian\nName: JANE R ROE\n\
                    CREDIT ACCOUNTS\n";
        let profiles = parse_profiles(text);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].bureau, Bureau::TransUnion);
        assert_eq!(profiles[0].address.as_deref(), Some("12 OAK ST"));
        assert_eq!(profiles[1].name.as_deref(), Some("JANE R ROE"));
    }

    #[test]
    fn test_empty_variants_filtered() {
        let profiles = parse_profiles("PERSONAL PROFILE\nnothing useful here\n");
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_no_profile_section() {
        assert!(parse_profiles("CREDIT ACCOUNTS\n1. CHASE\n").is_empty());
    }
}

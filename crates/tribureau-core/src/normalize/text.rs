use regex::Regex;
use std::sync::LazyLock;

/// Clean raw text extracted from a PDF/HTML credit report.
///
/// Passes, in order:
/// 1. Strip zero-width and invisible control characters
/// 2. Normalize keycap-digit sequences ("3" + enclosing keycap) to "3."
/// 3. Collapse horizontal whitespace around newlines to a bare newline
/// 4. Collapse 3+ consecutive newlines to exactly 2
/// 5. Convert runs of 4+ spaces to one tab (column-gap surrogate), then
///    collapse remaining 2-3 space runs to one space
/// 6. Repair soft line-breaks from page/column wrapping (letter-letter and
///    digit-digit merge, letter-digit boundaries get a space)
/// 7. Re-separate "smashed" tokens: bureau names and field labels glued to
///    the preceding token get a space inserted
///
/// Total and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let s = strip_invisible(raw);
    let s = normalize_keycaps(&s);
    let s = WS_AROUND_NEWLINE.replace_all(&s, "\n");
    let s = MANY_NEWLINES.replace_all(&s, "\n\n");
    let s = WIDE_GAP.replace_all(&s, "\t");
    let s = SPACE_RUN.replace_all(&s, " ");
    let s = repair_soft_breaks(&s);
    repair_smashed_tokens(&s)
}

static WS_AROUND_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
static MANY_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static WIDE_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {4,}").unwrap());
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

fn strip_invisible(s: &str) -> String {
    s.chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
            )
        })
        .collect()
}

/// Rewrite emoji-style keycap digits (digit + optional variation selector +
/// combining enclosing keycap) as "digit." so numbered-account markers still
/// match.
fn normalize_keycaps(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            let mut j = i + 1;
            if chars.get(j) == Some(&'\u{FE0F}') {
                j += 1;
            }
            if chars.get(j) == Some(&'\u{20E3}') {
                out.push(c);
                out.push('.');
                i = j + 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Join tokens split across a soft line-break. A lone newline between two
/// letters (or two digits) is a wrapped token and is removed; a letter-digit
/// boundary is a legitimate word break and becomes a space. Paragraph breaks
/// (double newlines) and breaks next to punctuation are left alone.
fn repair_soft_breaks(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        if c != '\n' {
            out.push(c);
            continue;
        }
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        let next = chars.get(i + 1).copied();
        if prev == Some('\n') || next == Some('\n') {
            out.push('\n');
            continue;
        }
        match (prev, next) {
            (Some(p), Some(n)) if p.is_alphabetic() && n.is_alphabetic() => {}
            (Some(p), Some(n)) if p.is_ascii_digit() && n.is_ascii_digit() => {}
            (Some(p), Some(n))
                if (p.is_alphabetic() && n.is_ascii_digit())
                    || (p.is_ascii_digit() && n.is_alphabetic()) =>
            {
                out.push(' ');
            }
            _ => out.push('\n'),
        }
    }
    out
}

/// Bureau names and field labels that show up concatenated to the preceding
/// value after aggressive line-joining. Longer labels come first so the
/// alternation prefers them.
static SMASHED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "TransUnion|Trans Union|Experian|Equifax",
        "|Credit File|Credit Accounts|Credit Report|Credit Scores?",
        "|Personal Profile|Personal Information",
        "|Account #|Account Number|Account Status|Payment Status|Pay Status",
        "|High Balance|High Limit|Credit Limit|Monthly Pay|Date Opened",
        "|Date Reported|Date of Last Activity|Last Active|Last Reported",
        "|Past Due|Payment History|Balance|Status:|Remarks|Comments|Terms",
        "|Name:|Date of Birth|Address:|Employer",
    ))
    .unwrap()
});

fn glued_to_token(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ')' | '.' | '%' | ':' | ',')
}

/// The preceding character is checked manually rather than matched as part
/// of the pattern: consuming it would make back-to-back smashed tokens
/// ("TransUnionExperianEquifax") split one junction per pass instead of all
/// of them in a single pass.
fn repair_smashed_tokens(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut last = 0;
    for m in SMASHED_TOKEN.find_iter(s) {
        out.push_str(&s[last..m.start()]);
        if s[..m.start()].chars().next_back().is_some_and(glued_to_token) {
            out.push(' ');
        }
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&s[last..]);
    out
}

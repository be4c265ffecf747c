use crate::discrepancy;
use crate::model::{AccountDiscrepancy, AccountRecord, Bureau, BureauFieldSet, RawAccountSpan};
use crate::parsing::columns;
use crate::trace::{ParseTrace, TraceSeverity};

/// One account accumulated across every span and section that mentioned it.
struct AccountAccum {
    name: String,
    number: Option<String>,
    fields: [BureauFieldSet; 3],
}

fn same_identity(accum: &AccountAccum, name: &str, number: &Option<String>) -> bool {
    if !accum.name.eq_ignore_ascii_case(name) {
        return false;
    }
    match (&accum.number, number) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Turn raw account spans into one record per (account, bureau).
///
/// Every account is emitted under all three bureaus even when a bureau's
/// data could not be located, so downstream dispute tracking always has a
/// uniform per-bureau view. Deduplication runs here, once, after every
/// segmentation strategy has contributed its candidates.
pub fn build_records(
    spans: &[RawAccountSpan],
    trace: &mut ParseTrace,
) -> (Vec<AccountRecord>, Vec<AccountDiscrepancy>) {
    let mut accums: Vec<AccountAccum> = Vec::new();

    for span in spans {
        let per_bureau = extract_span(span, trace);

        let idx = match accums
            .iter()
            .position(|a| same_identity(a, &span.account_name, &span.account_number))
        {
            Some(i) => i,
            None => {
                accums.push(AccountAccum {
                    name: span.account_name.clone(),
                    number: None,
                    fields: Default::default(),
                });
                accums.len() - 1
            }
        };
        let accum = &mut accums[idx];
        if accum.number.is_none() {
            accum.number = span.account_number.clone();
        }
        for (bureau, fields) in per_bureau {
            let slot = &mut accum.fields[bureau.canonical_index()];
            if slot.is_empty() && !fields.is_empty() {
                *slot = fields;
            }
        }
    }

    let mut records = Vec::new();
    let mut discrepancies = Vec::new();
    for accum in accums {
        let flags = discrepancy::detect(&[
            (Bureau::TransUnion, &accum.fields[0]),
            (Bureau::Experian, &accum.fields[1]),
            (Bureau::Equifax, &accum.fields[2]),
        ]);
        if !flags.is_empty() {
            discrepancies.push(AccountDiscrepancy {
                account_name: accum.name.clone(),
                account_number: accum.number.clone(),
                flags,
            });
        }
        for bureau in Bureau::ALL {
            records.push(AccountRecord {
                bureau,
                account_name: accum.name.clone(),
                account_number: accum.number.clone(),
                fields: accum.fields[bureau.canonical_index()].clone(),
            });
        }
    }
    (records, discrepancies)
}

fn extract_span(span: &RawAccountSpan, trace: &mut ParseTrace) -> Vec<(Bureau, BureauFieldSet)> {
    let mut per_bureau: Vec<(Bureau, BureauFieldSet)> = Vec::new();

    for bureau in Bureau::ALL {
        if span.section_bureau.is_some_and(|section| section != bureau) {
            per_bureau.push((bureau, BureauFieldSet::default()));
            continue;
        }
        if let Some((_, seeded)) = span.seeded.iter().find(|(b, _)| *b == bureau) {
            trace.note_strategy(&span.account_name, Some(bureau), "pipe_row_seed");
            per_bureau.push((bureau, seeded.clone()));
            continue;
        }
        let (fields, strategy) = columns::extract(&span.text, bureau);
        if let Some(name) = strategy {
            trace.note_strategy(&span.account_name, Some(bureau), name);
        }
        per_bureau.push((bureau, fields));
    }

    if per_bureau.iter().all(|(_, fields)| fields.is_empty()) {
        let shared = columns::extract_shared(&span.text);
        if shared.is_empty() {
            trace.warn(
                Some(&span.account_name),
                "no fields recovered from account span".to_string(),
                TraceSeverity::Important,
            );
        } else {
            trace.note_strategy(&span.account_name, None, "shared_scan");
            match span.section_bureau {
                // section-scoped span: the shared data still belongs to
                // that one bureau
                Some(section) => {
                    for (bureau, fields) in per_bureau.iter_mut() {
                        if *bureau == section {
                            *fields = shared.clone();
                        }
                    }
                }
                // reported once for all bureaus
                None => {
                    for (_, fields) in per_bureau.iter_mut() {
                        *fields = shared.clone();
                    }
                }
            }
        }
    }

    per_bureau
}

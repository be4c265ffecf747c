use std::path::PathBuf;

use tribureau_core::error::ReportError;
use tribureau_core::model::FormatHint;
use tribureau_core::ParseOptions;

use crate::output;

pub fn run(
    input_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    per_bureau: bool,
) -> Result<(), ReportError> {
    let text = super::load_text(&input_file)?;

    let options = ParseOptions {
        format_hint: if per_bureau {
            FormatHint::PerBureau
        } else {
            FormatHint::Auto
        },
    };
    let report = tribureau_core::parse_report(&text, options)?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&report)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Parsed {} account record(s), written to {}",
                report.accounts.len(),
                path.display()
            );
            for w in &report.trace.warnings {
                eprintln!("  warning: {}", w.message);
            }
        }
        None => {
            let output_str = match output_format {
                "json" => serde_json::to_string_pretty(&report)?,
                _ => output::table::format_parsed(&report),
            };
            println!("{output_str}");
        }
    }

    Ok(())
}

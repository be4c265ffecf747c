use std::path::PathBuf;

use tribureau_core::error::ReportError;
use tribureau_core::normalize;

pub fn run(input_file: PathBuf) -> Result<(), ReportError> {
    let raw = super::load_text(&input_file)?;
    let text = normalize::text::normalize(&raw);
    println!("{}", text.trim_end());
    Ok(())
}

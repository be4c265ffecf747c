mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tribureau",
    version,
    about = "Parse tri-bureau credit reports (PDF or text) into structured records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a credit report into scores, profiles, accounts and discrepancies
    Parse {
        /// Path to a PDF or plain-text report
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write parsed output to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Treat the report as per-bureau sections instead of auto-detecting
        #[arg(long)]
        per_bureau: bool,
    },
    /// Print the extracted, normalized report text without parsing it
    Text {
        /// Path to a PDF or plain-text report
        input_file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input_file,
            output,
            out,
            per_bureau,
        } => commands::parse::run(input_file, &output, out, per_bureau),
        Commands::Text { input_file } => commands::text::run(input_file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

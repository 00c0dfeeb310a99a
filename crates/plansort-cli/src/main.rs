mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "plansort",
    version,
    about = "Converts scanned engineering drawings into searchable PDFs filed by title block"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in the input directory
    Run {
        /// Directory containing the scanned input PDFs
        #[arg(long = "in", value_name = "DIR")]
        in_dir: PathBuf,

        /// Destination tree for classified pages
        #[arg(long = "out", value_name = "DIR")]
        out_dir: PathBuf,

        /// Folder for pages that need manual review
        #[arg(long = "manual", value_name = "DIR")]
        manual_dir: PathBuf,

        /// Scratch directory for OCR output (purged after the run)
        #[arg(long = "temp", value_name = "DIR")]
        temp_dir: PathBuf,

        /// Archive for processed input files
        #[arg(long = "finished", value_name = "DIR")]
        finished_dir: PathBuf,

        /// Output format: text (default) or json (one event per line)
        #[arg(short, long, default_value = "text")]
        output: String,
    },
    /// Check that the required external tools are installed
    Check,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            in_dir,
            out_dir,
            manual_dir,
            temp_dir,
            finished_dir,
            output,
        } => commands::run::run(in_dir, out_dir, manual_dir, temp_dir, finished_dir, &output),
        Commands::Check => commands::check::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

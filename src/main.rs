//! SortCopy CLI - sort a folder into per-extension folders

use clap::Parser;
use sortcopy::config::{CliArgs, SortConfig};
use sortcopy::core::SortEngine;
use sortcopy::error::Result;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    setup_logging(&args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging(args: &CliArgs) {
    // RUST_LOG wins over -v / -q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));

    // Thread names identify the walker or copy worker behind each line.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn run(args: &CliArgs) -> Result<()> {
    let config = SortConfig::from_cli(args)?;
    let engine = SortEngine::new(config);

    let report = engine.execute()?;

    if !args.quiet {
        report.print_summary();
    }

    if report.is_success() {
        println!("You can delete {}", report.source.display());
    } else {
        println!(
            "Some entries were not copied; keep {} until the errors above are resolved",
            report.source.display()
        );
    }

    Ok(())
}

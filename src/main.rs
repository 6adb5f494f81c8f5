#![forbid(unsafe_code)]

//! pdh: Path Drift Harness CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("pdh: {e}");
        std::process::exit(e.exit_code());
    }
}

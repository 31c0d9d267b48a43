#![forbid(unsafe_code)]

//! erase: secure tree eraser CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("erase: {e}");
        std::process::exit(e.exit_code());
    }
}

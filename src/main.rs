#![forbid(unsafe_code)]

//! xsmon — system-tray CPU/memory monitor entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("xsmon: {e}");
        if let Some(hint) = e.hint() {
            eprintln!("xsmon: hint: {hint}");
        }
        std::process::exit(e.exit_code());
    }
}

#![forbid(unsafe_code)]

mod cli;
mod command_coverage;
mod command_lookup;
mod command_validate;
mod config;
mod diagnostic;
mod error;
mod logging;
mod targets;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

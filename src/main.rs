//! Command-line tools for flat FAT-style disk images.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc)]

use std::process::ExitCode;

mod cli;
mod clock;
mod error;
mod logger;

fn main() -> ExitCode {
    if logger::init().is_err() {
        eprintln!("Logger already initialized");
    }

    let command = match cli::Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    match command.run(&mut std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flatfs: {err}");
            ExitCode::FAILURE
        }
    }
}

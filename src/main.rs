//! nocd-bundle - package an HTML entry into a single self-contained file.

mod cli;

use clap::{ColorChoice, Parser};
use cli::Cli;
use nocd_bundle::{Pipeline, log, logger};
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            log!("error"; "cannot read current directory: {err}");
            return ExitCode::FAILURE;
        }
    };

    let options = match cli::load_options(&cli, &cwd) {
        Ok(options) => options,
        Err(err) => {
            log!("error"; "{err:#}");
            return ExitCode::FAILURE;
        }
    };

    // Pipeline failures are already reported through the terminal reporter.
    let Ok(html) = Pipeline::new().bundle(cwd.join(&cli.entry), options) else {
        return ExitCode::FAILURE;
    };

    if cli.print {
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = stdout.write_all(html.as_bytes()).and_then(|()| stdout.flush()) {
            log!("error"; "cannot write to stdout: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

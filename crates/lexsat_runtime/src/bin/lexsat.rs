//! lexsat CLI entry point.

use std::process::ExitCode;

use lexsat_runtime::{Action, CliOptions, RuntimeError, help_text, logging, run};

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            if matches!(e, RuntimeError::Usage(_)) {
                eprintln!("Run 'lexsat --help' for usage.");
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<(), RuntimeError> {
    let options = CliOptions::parse(std::env::args().skip(1))?;

    match options.action()? {
        Action::Help => println!("{}", help_text()),
        Action::Version => println!("lexsat {}", env!("CARGO_PKG_VERSION")),
        Action::Run => {
            logging::init(options.verbosity);
            print!("{}", run(&options)?);
        }
    }
    Ok(())
}

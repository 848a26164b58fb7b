use std::process::ExitCode;

use portledger::ui::output;

fn main() -> ExitCode {
    match portledger::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

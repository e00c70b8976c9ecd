//! The `eval` command - run a script given on the command line.

use std::process::ExitCode;

use crate::cli::EvalArgs;
use crate::common::engine::execute;

/// Run the eval command.
pub fn run(args: EvalArgs) -> ExitCode {
    let argv = ["<eval>".to_string()];
    match execute(&args.engine, &argv, args.code.as_bytes()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! The `run` command - run a Bia script file.

use std::process::ExitCode;

use crate::cli::RunArgs;
use crate::common::engine::execute;
use crate::common::input::{read_input, strip_shebang};

/// Run the run command.
pub fn run(args: RunArgs) -> ExitCode {
    let (content, display_name) = match read_input(&args.file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Strip shebang line if present (e.g., #!/usr/bin/env bia run)
    let content = strip_shebang(&content);

    let argv: Vec<String> = std::iter::once(display_name.clone())
        .chain(args.args)
        .collect();

    match execute(&args.engine, &argv, content) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(script = %display_name, "Run failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

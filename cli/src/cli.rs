//! Command-line interface definitions.
//!
//! This module contains only clap struct definitions - no business logic.
//! All command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};

/// Bia - run scripts on an embedded Bia runtime
#[derive(Parser, Debug)]
#[command(name = "bia", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a script file
    Run(RunArgs),

    /// Run a script given on the command line
    Eval(EvalArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Script to run (use "-" for stdin)
    pub file: String,

    /// Arguments passed to the script, after the script path
    #[arg(last = true)]
    pub args: Vec<String>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Arguments for the `eval` command.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Script source
    pub code: String,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Engine configuration shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Maximum number of live runtime values
    #[arg(long, value_name = "VALUES")]
    pub heap_limit: Option<usize>,

    /// Do not register the demo host function `foo`
    #[arg(long)]
    pub no_demo: bool,
}

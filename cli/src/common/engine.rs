//! Shared engine setup.

use bia_bridge::{Engine, EngineOptions, Result};

use crate::cli::EngineArgs;

/// Value returned by the demo function `foo`.
pub const DEMO_RESULT: i64 = 99;

/// Build an engine with the standard library loaded.
///
/// `argv` becomes the script's argument vector (`sys.argc`, `sys.arg(i)`).
/// Unless `--no-demo` was given, the demo host function `foo` is registered:
/// it prints `my function` and returns 99.
pub fn build_engine(args: &EngineArgs, argv: &[String]) -> Result<Engine> {
    let mut options = EngineOptions::default();
    if let Some(limit) = args.heap_limit {
        options = options.max_values(limit);
    }

    let mut engine = Engine::with_options(options)?;
    engine.use_library(argv)?;
    if !args.no_demo {
        engine.put_function("foo", |_params| {
            println!("my function");
            Ok(Some(DEMO_RESULT.into()))
        })?;
    }

    tracing::debug!(functions = ?engine.function_names(), "Engine ready");
    Ok(engine)
}

/// Run `source` on a fresh engine and close it.
pub fn execute(args: &EngineArgs, argv: &[String], source: &[u8]) -> Result<()> {
    let mut engine = build_engine(args, argv)?;
    engine.run(source)?;
    engine.close()
}

use super::*;
use crate::test_utils::init_test_logging;
use crate::values::{CallbackState, HostValue};
use pretty_assertions::assert_eq;

fn engine() -> (Engine, OutputBuffer) {
    let output = OutputBuffer::new();
    let engine = Engine::with_options(EngineOptions::default().capture(output.clone())).unwrap();
    (engine, output)
}

#[test]
fn test_put_value_and_print() {
    init_test_logging();
    let (mut engine, output) = engine();
    engine.put_value("hey", "ho").unwrap();
    engine.put_value("n", 7i8).unwrap();
    engine.put_value("x", 0.5f32).unwrap();

    engine.run_str("print(hey, n, x)").unwrap();
    assert_eq!(output.contents(), "ho 7 0.5\n");
}

#[test]
fn test_put_value_map() {
    let (mut engine, output) = engine();
    let config = HostValue::from(vec![
        ("name", HostValue::from("bia")),
        ("limits", HostValue::from(vec![("depth", 3)])),
    ]);
    engine.put_value("config", config).unwrap();

    engine.run_str("print(config.name, config.limits.depth)\nprint(config)").unwrap();
    assert_eq!(
        output.contents(),
        "bia 3\n{\"name\": \"bia\", \"limits\": {\"depth\": 3}}\n"
    );
}

#[test]
fn test_put_value_failure_releases_everything() {
    let (mut engine, _) = engine();
    let gc = engine.gc().unwrap();
    engine.put_value("taken", 1).unwrap();
    let before = gc.stats().unwrap();

    let err = engine.put_value("taken", 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);

    let err = engine.put_value("bad name", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);

    let err = engine.put_value("nul", "a\0b").unwrap_err();
    assert_eq!(err, Error::Coercion(CoercionError::InteriorNul));

    assert_eq!(gc.stats().unwrap().unmanaged, before.unmanaged);
}

#[test]
fn test_put_function_registration() {
    let (mut engine, _) = engine();
    engine.put_function("b", |_| Ok(None)).unwrap();
    engine.put_function("a", |_| Ok(None)).unwrap();
    assert_eq!(engine.function_names(), vec!["a", "b"]);
    assert_eq!(engine.function_state("a"), Some(CallbackState::Registered));

    let err = engine.put_function("a", |_| Ok(None)).unwrap_err();
    assert!(matches!(err, Error::Registration { ref reason, .. } if reason == "already registered"));

    // Rejected by the runtime: the name is a builtin.
    let err = engine.put_function("print", |_| Ok(None)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);
    assert_eq!(engine.function_names(), vec!["a", "b"]);
}

#[test]
fn test_run_failures_are_execution_errors() {
    let (mut engine, output) = engine();
    assert_eq!(engine.run_str("print(").unwrap_err(), Error::Execution);
    assert_eq!(engine.run_str("print(undefined)").unwrap_err(), Error::Execution);
    assert_eq!(engine.run(b"\xff").unwrap_err(), Error::Execution);

    engine
        .put_function("fail", |_| Err(Error::callback("nope")))
        .unwrap();
    assert_eq!(
        engine.run_str("print(1)\nfail()\nprint(2)").unwrap_err(),
        Error::Execution
    );
    assert_eq!(output.contents(), "1\n");
}

#[test]
fn test_use_library() {
    let (mut engine, output) = engine();
    assert_eq!(engine.run_str("import io").unwrap_err(), Error::Execution);

    engine.use_library(["prog", "--flag"]).unwrap();
    engine
        .run_str("import io; import sys; io.print(sys.argc, sys.arg(1))")
        .unwrap();
    assert_eq!(output.contents(), "2 --flag\n");

    let err = engine.use_library(Vec::<String>::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Library);
}

#[test]
fn test_close_invalidates_everything() {
    let (mut engine, _) = engine();
    engine.put_function("f", |_| Ok(None)).unwrap();
    let gc = engine.gc().unwrap();
    let creation = gc.create(5).unwrap();
    let member = creation.peek().unwrap();

    engine.close().unwrap();
    assert!(engine.is_closed());
    assert_eq!(engine.function_names(), vec!["f"]);
    assert_eq!(engine.function_state("f"), Some(CallbackState::Released));

    let closed = Error::Lifecycle(LifecycleError::EngineClosed);
    assert_eq!(engine.close().unwrap_err(), closed);
    assert_eq!(engine.run_str("print(1)").unwrap_err(), closed);
    assert_eq!(engine.put_value("x", 1).unwrap_err(), closed);
    assert_eq!(engine.put_function("g", |_| Ok(None)).unwrap_err(), closed);
    assert_eq!(engine.use_library(["a"]).unwrap_err(), closed);
    assert_eq!(engine.gc().unwrap_err(), closed);
    assert_eq!(gc.create(1).unwrap_err(), closed);
    assert_eq!(member.cast::<i64>().unwrap_err(), closed);
    assert_eq!(gc.stats().unwrap_err(), closed);
}

#[test]
fn test_engine_allocation_failure() {
    let err = Engine::with_options(EngineOptions::default().max_values(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Allocation);
}

#[test]
fn test_value_limit() {
    let output = OutputBuffer::new();
    let options = EngineOptions::default().capture(output).max_values(8);
    let mut engine = Engine::with_options(options).unwrap();

    let big: Vec<(String, i64)> = (0..16).map(|i| (format!("k{}", i), i)).collect();
    let err = engine.put_value("big", big).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Allocation);
    assert_eq!(engine.gc().unwrap().stats().unwrap().unmanaged, 0);
}

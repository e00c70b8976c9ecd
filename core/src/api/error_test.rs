use super::*;
use bia_runtime::{Fault, ScriptError};
use pretty_assertions::assert_eq;

#[test]
fn test_faults_map_to_one_kind_each() {
    let cases = [
        (Fault::EngineGone, ErrorKind::Lifecycle),
        (Fault::OutOfMemory { limit: 4 }, ErrorKind::Allocation),
        (Fault::StaleValue, ErrorKind::Lifecycle),
        (Fault::NotOwned, ErrorKind::Lifecycle),
        (Fault::AlreadyManaged, ErrorKind::Lifecycle),
        (Fault::StaleFrame, ErrorKind::Lifecycle),
        (
            Fault::TypeMismatch {
                expected: "int",
                found: "string",
            },
            ErrorKind::Coercion,
        ),
        (Fault::InvalidString, ErrorKind::Coercion),
        (Fault::OutOfRange { index: 5, count: 2 }, ErrorKind::Argument),
        (Fault::NotFound("as".to_string()), ErrorKind::Argument),
        (
            Fault::Rejected {
                name: "x".to_string(),
                reason: "already bound",
            },
            ErrorKind::Registration,
        ),
        (Fault::LibraryLoaded, ErrorKind::Library),
        (Fault::Callback("boom".to_string()), ErrorKind::Execution),
        (
            Fault::Script(ScriptError {
                message: "`x` is not defined".to_string(),
                line: 1,
                column: 7,
            }),
            ErrorKind::Execution,
        ),
    ];

    for (fault, kind) in cases {
        let err = Error::from(fault.clone());
        assert_eq!(err.kind(), kind, "{:?} became {:?}", fault, err);
    }
}

#[test]
fn test_script_diagnostics_are_not_part_of_the_error() {
    let fault = Fault::Script(ScriptError {
        message: "secret detail".to_string(),
        line: 3,
        column: 1,
    });
    let err = Error::from(fault);
    assert_eq!(err, Error::Execution);
    assert_eq!(err.to_string(), "execution failed");
}

#[test]
fn test_messages() {
    assert_eq!(
        Error::from(LifecycleError::InvalidParameters).to_string(),
        "parameters used after the call returned"
    );
    assert_eq!(
        Error::from(CoercionError::Overflow {
            value: 300,
            target: "i8"
        })
        .to_string(),
        "300 does not fit in i8"
    );
    assert_eq!(
        Error::from(CoercionError::Unsupported {
            type_name: "alloc::vec::Vec<u8>"
        })
        .to_string(),
        "unsupported host type `alloc::vec::Vec<u8>`"
    );
    assert_eq!(
        Error::OutOfRange { index: 5, count: 2 }.to_string(),
        "argument index 5 out of range for 2 argument(s)"
    );
    assert_eq!(Error::callback("nope").kind(), ErrorKind::Execution);
}

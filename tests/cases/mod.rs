// Helper macro to distinguish between patterns and expressions
#[macro_export]
macro_rules! assert_case {
    // Pattern matching cases - detect common pattern forms
    ($result:expr, { Ok($($pattern:tt)*) }) => {
        match $result {
            Ok($($pattern)*) => {},
            other => panic!("Expected Ok({}) but got {:#?}", stringify!($($pattern)*), other),
        }
    };

    ($result:expr, { Err($($pattern:tt)*) }) => {
        match $result {
            Err($($pattern)*) => {},
            other => panic!("Expected Err({}) but got {:#?}", stringify!($($pattern)*), other),
        }
    };

    // Default case - treat as expression for equality comparison
    ($result:expr, { $expected:expr }) => {
        match $result {
            Ok(actual) => {
                pretty_assertions::assert_eq!($expected, actual, "Expected {:#?} but got {:#?}\n\n< expected / got >", $expected, actual);
            },
            other => panic!("Expected Ok(...) but got {:?}", other),
        }
    };
}

// Helper macro to generate test functions based on field names
#[macro_export]
macro_rules! handle_case {
    // Everything the script printed, when it succeeds.
    ([$($attrs:meta)*] output, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_output() {
            let result = run(input()).map(|(output, _)| output);
            assert_case!(result, $expected);
        }
    };

    // What the script printed before it failed.
    ([$($attrs:meta)*] partial_output, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_partial_output() {
            let output = bia_bridge::OutputBuffer::new();
            let result = engine_with(&output).and_then(|mut engine| engine.run_str(input()));
            assert!(result.is_err(), "Expected the script to fail");
            let result: Result<String, ()> = Ok(output.contents());
            assert_case!(result, $expected);
        }
    };

    ([$($attrs:meta)*] error, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_error() {
            let result = run(input()).map(|_| ());
            assert_case!(result, $expected);
        }
    };

    // How often each host function ran.
    ([$($attrs:meta)*] invocations, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_invocations() {
            let result = run(input()).map(|(_, invocations)| invocations);
            assert_case!(result, $expected);
        }
    };

    // Generic case for unknown field names
    ([$($attrs:meta)*] $field_name:ident, $expected:tt) => {
        compile_error!(concat!("Unknown test case field: ", stringify!($field_name)));
    };
}

// Helper macro to recursively parse assertion fields
#[macro_export]
macro_rules! parse_assertions {
    // Base case: no more fields to parse
    (@parse [$($test_functions:tt)*]) => {
        $($test_functions)*
    };

    (@parse [$($test_functions:tt)*] $(#[$attr:meta])* $field_name:ident: $field_value:tt, $($rest:tt)*) => {
        parse_assertions! {@parse [
            $($test_functions)*
            handle_case! {[$($attr)*] $field_name, $field_value}
        ] $($rest)*}
    };
}

// Main macro - name first, input second, then any order for assertions
#[macro_export]
macro_rules! test_case {
    (
        name: $name:ident,
        input: $input:expr,
        $($assertion_fields:tt)*
    ) => {
        mod $name {
            #![allow(unused_imports, dead_code)]

            use super::*;

            fn input() -> &'static str {
                $input
            }

            // Generate all test functions
            parse_assertions! {@parse [] $($assertion_fields)*}
        }
    };
}

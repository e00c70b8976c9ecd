use super::*;
use crate::api::CoercionError;
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, HashMap};

#[test]
fn test_integers_and_floats_widen() {
    assert_eq!(HostValue::from(-3i8), HostValue::Int(-3));
    assert_eq!(HostValue::from(i16::MAX), HostValue::Int(i16::MAX as i64));
    assert_eq!(HostValue::from(7isize), HostValue::Int(7));
    assert_eq!(HostValue::from(1.5f32), HostValue::Float(1.5));
    assert_eq!(HostValue::from("s"), HostValue::Str("s".to_string()));
}

#[test]
fn test_mappings_keep_order() {
    let value = HostValue::from(vec![("b", 1), ("a", 2)]);
    assert_eq!(
        value,
        HostValue::Map(vec![
            ("b".to_string(), HostValue::Int(1)),
            ("a".to_string(), HostValue::Int(2)),
        ])
    );

    let sorted: BTreeMap<&str, f64> = [("z", 1.0), ("y", 2.0)].into_iter().collect();
    let HostValue::Map(entries) = HostValue::from(sorted) else {
        panic!("expected a map");
    };
    assert_eq!(entries[0].0, "y");
}

#[test]
fn test_from_any() {
    assert_eq!(HostValue::from_any(&42i32), Ok(HostValue::Int(42)));
    assert_eq!(HostValue::from_any(&"hi"), Ok(HostValue::from("hi")));
    assert_eq!(
        HostValue::from_any(&HostValue::Float(2.0)),
        Ok(HostValue::Float(2.0))
    );

    let mut map = HashMap::new();
    map.insert("k".to_string(), HostValue::Int(1));
    assert_eq!(
        HostValue::from_any(&map),
        Ok(HostValue::Map(vec![("k".to_string(), HostValue::Int(1))]))
    );
}

#[test]
fn test_from_any_accepts_scalar_valued_maps() {
    let counts: HashMap<String, i64> = HashMap::from([("n".to_string(), 3)]);
    assert_eq!(
        HostValue::from_any(&counts),
        Ok(HostValue::Map(vec![("n".to_string(), HostValue::Int(3))]))
    );

    let ratios: BTreeMap<String, f64> =
        BTreeMap::from([("b".to_string(), 0.5), ("a".to_string(), 1.5)]);
    assert_eq!(
        HostValue::from_any(&ratios),
        Ok(HostValue::Map(vec![
            ("a".to_string(), HostValue::Float(1.5)),
            ("b".to_string(), HostValue::Float(0.5)),
        ]))
    );

    let names = vec![("x".to_string(), "y".to_string())];
    assert_eq!(HostValue::from_any(&names), Ok(HostValue::from(names.clone())));

    // Keys must be owned strings.
    let borrowed: HashMap<&'static str, i64> = HashMap::from([("n", 3)]);
    assert!(HostValue::from_any(&borrowed).is_err());
}

#[test]
fn test_from_any_rejects_unsupported_types() {
    let err = HostValue::from_any(&vec![1u8, 2, 3]).unwrap_err();
    assert!(
        matches!(err, CoercionError::Unsupported { type_name } if type_name.contains("Vec<u8>")),
        "{:?}",
        err
    );
    assert!(HostValue::from_any(&42u64).is_err());
    assert!(HostValue::from_any(&true).is_err());
}

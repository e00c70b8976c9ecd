use super::*;
use crate::api::{Engine, Error, ErrorKind, LifecycleError};
use pretty_assertions::assert_eq;

fn gc() -> (Engine, Gc) {
    let engine = Engine::new().unwrap();
    let gc = engine.gc().unwrap();
    (engine, gc)
}

#[test]
fn test_release_is_terminal() {
    let (_engine, gc) = gc();
    let mut creation = gc.create(1).unwrap();
    assert_eq!(creation.state(), Ownership::OwnedPending);

    creation.release().unwrap();
    assert_eq!(creation.state(), Ownership::Invalidated);

    let released = Error::Lifecycle(LifecycleError::Released);
    assert_eq!(creation.release().unwrap_err(), released);
    assert_eq!(creation.start_monitoring().unwrap_err(), released);
    assert_eq!(creation.put("k", 1).unwrap_err(), released);
    assert_eq!(creation.peek().unwrap_err(), released);
}

#[test]
fn test_start_monitoring_is_terminal() {
    let (_engine, gc) = gc();
    let mut creation = gc.create("v").unwrap();
    creation.start_monitoring().unwrap();
    assert_eq!(creation.state(), Ownership::Managed);

    let managed = Error::Lifecycle(LifecycleError::AlreadyManaged);
    assert_eq!(creation.start_monitoring().unwrap_err(), managed);
    assert_eq!(creation.release().unwrap_err(), managed);
    assert_eq!(creation.put("k", 1).unwrap_err(), managed);

    // Managed handles can still be read.
    assert_eq!(creation.peek().unwrap().cast::<String>().unwrap(), "v");
}

#[test]
fn test_peeked_member_dies_with_release() {
    let (_engine, gc) = gc();
    let mut creation = gc.create(2.5).unwrap();
    let member = creation.peek().unwrap();
    assert_eq!(member.cast::<f64>().unwrap(), 2.5);

    creation.release().unwrap();
    assert_eq!(
        member.cast::<f64>().unwrap_err(),
        Error::Lifecycle(LifecycleError::Released)
    );
}

#[test]
fn test_drop_releases_pending_creations() {
    let (_engine, gc) = gc();
    let before = gc.stats().unwrap();

    let pending = gc.create(1).unwrap();
    let mut managed = gc.create(2).unwrap();
    managed.start_monitoring().unwrap();
    assert_eq!(gc.stats().unwrap().unmanaged, before.unmanaged + 1);

    drop(pending);
    drop(managed);
    let after = gc.stats().unwrap();
    assert_eq!(after.unmanaged, before.unmanaged);
    assert_eq!(after.managed, before.managed + 1);
}

#[test]
fn test_put_builds_dictionaries() {
    let (_engine, gc) = gc();
    let mut dict = gc.create(Vec::<(String, HostValue)>::new()).unwrap();
    dict.put("a", 1).unwrap();
    dict.put("b", "two").unwrap();
    dict.put("a", 3).unwrap();

    let stats = gc.stats().unwrap();
    assert_eq!(stats.unmanaged, 1, "only the container is host-owned");

    // The replaced entry is garbage, the live ones are held by the container.
    let stats = gc.collect().unwrap();
    assert_eq!(stats.collected, 2);

    dict.start_monitoring().unwrap();
    assert_eq!(gc.stats().unwrap().unmanaged, 0);
}

#[test]
fn test_put_requires_a_dictionary() {
    let (_engine, gc) = gc();
    let mut scalar = gc.create(1).unwrap();
    let err = scalar.put("k", 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);
    assert_eq!(scalar.state(), Ownership::OwnedPending);
    assert_eq!(gc.stats().unwrap().unmanaged, 1);
}

#[test]
fn test_failed_put_keeps_previous_entries() {
    let (_engine, gc) = gc();
    let mut dict = gc.create(vec![("kept", 1)]).unwrap();

    let err = dict.put("bad", "nul\0byte").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);
    let err = dict.put("bad\0key", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);

    assert_eq!(dict.state(), Ownership::OwnedPending);
    assert_eq!(gc.stats().unwrap().unmanaged, 1);
    dict.put("next", 2).unwrap();
}

#[test]
fn test_failed_map_creation_is_never_exposed() {
    let (_engine, gc) = gc();
    let before = gc.stats().unwrap();

    let value = HostValue::from(vec![
        ("ok", HostValue::Int(1)),
        ("bad", HostValue::from("a\0b")),
    ]);
    let err = gc.create(value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);

    let after = gc.collect().unwrap();
    assert_eq!(after.unmanaged, before.unmanaged);
    assert_eq!(after.live, before.live);
}

#[test]
fn test_create_any_rejects_unsupported_types() {
    let (_engine, gc) = gc();
    let before = gc.stats().unwrap();

    let err = gc.create_any(&vec![0u8; 4]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);
    assert_eq!(gc.stats().unwrap(), before);

    let creation = gc.create_any(&12i16).unwrap();
    assert_eq!(creation.peek().unwrap().cast::<i16>().unwrap(), 12);
}

#[test]
fn test_create_any_builds_scalar_valued_maps() {
    let (_engine, gc) = gc();
    let counts: std::collections::HashMap<String, i64> =
        [("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();

    let creation = gc.create_any(&counts).unwrap();
    assert_eq!(creation.state(), Ownership::OwnedPending);
    assert_eq!(creation.peek().unwrap().type_name().unwrap(), "dict");
}

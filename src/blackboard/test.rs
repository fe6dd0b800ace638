use super::*;

#[test]
fn copy_between_keys_of_same_type() {
    let source = BlackboardKey::new("source", 5);
    let mut target = BlackboardKey::new("target", 1);
    assert!(target.copy_value_from(&source));
    assert_eq!(target.get::<i32>(), Some(&5));
    assert_eq!(target.name(), "target");
}

#[test]
fn copy_between_mismatched_types_is_a_no_op() {
    let source = BlackboardKey::new("source", 5);
    let mut target = BlackboardKey::new("target", 2.5f32);
    assert!(!target.copy_value_from(&source));
    assert_eq!(target.get::<f32>(), Some(&2.5));
    assert_eq!(target.underlying_type(), KeyType::Float);
}

#[test]
fn key_equality_ignores_names() {
    assert_eq!(BlackboardKey::new("a", 3), BlackboardKey::new("b", 3));
    assert_ne!(BlackboardKey::new("a", 3), BlackboardKey::new("a", 4));
    assert_ne!(BlackboardKey::new("a", 0), BlackboardKey::new("a", 0f32));
    assert_ne!(
        BlackboardKey::new("a", false),
        BlackboardKey::with_type("a", KeyType::Int)
    );
}

#[test]
fn typed_lookup() {
    let mut bb = Blackboard::new();
    let speed = bb.add("speed", 3.5f32).unwrap();
    bb.add("name", "guard".to_owned()).unwrap();

    assert_eq!(bb.find_typed::<f32>("speed"), Some(speed));
    assert!(bb.find_typed::<i32>("speed").is_none());
    assert!(bb.find_typed::<f32>("missing").is_none());
    assert_eq!(bb.find_key("name").map(|k| k.underlying_type()), Some(KeyType::String));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut bb = Blackboard::new();
    bb.add("alert", false).unwrap();
    assert!(matches!(
        bb.add("alert", 1),
        Err(BlackboardError::DuplicateKey(name)) if name == "alert"
    ));
    assert_eq!(bb.len(), 1);
}

#[test]
fn set_and_get_by_name() {
    let mut bb = Blackboard::new();
    bb.add("goal", Vec3::ZERO).unwrap();
    assert!(bb.set_value("goal", Vec3::new(1., 2., 3.)));
    assert_eq!(bb.get_value::<Vec3>("goal"), Vec3::new(1., 2., 3.));

    // Wrong type or absent name: nothing is written and reads fall back to default.
    assert!(!bb.set_value("goal", 7));
    assert!(!bb.set_value("nowhere", 7));
    assert_eq!(bb.get_value::<i32>("goal"), 0);
    assert_eq!(bb.get_value::<String>("nowhere"), "");
}

#[test]
fn cloned_blackboards_are_independent() {
    let mut bb = Blackboard::new();
    let count = bb.add("count", 1).unwrap();
    let mut copy = bb.clone();
    copy.set(count, 10);
    assert_eq!(bb.get(count), Some(&1));
    assert_eq!(copy.get(count), Some(&10));
}

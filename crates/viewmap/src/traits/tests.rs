use crate::{
    test_fixtures::{Role, User},
    traits::{FieldValue, FieldValues, FieldWriteError, Record},
    value::Value,
};

#[test]
fn option_kind_is_nullable() {
    assert!(<Option<i64> as FieldValue>::KIND.nullable);
    assert!(!<i64 as FieldValue>::KIND.nullable);
}

#[test]
fn numeric_from_value_accepts_lossless_widening() {
    assert_eq!(i64::from_value(&Value::Uint(5)), Some(5));
    assert_eq!(u32::from_value(&Value::Int(-1)), None);
    assert_eq!(i32::from_value(&Value::Int(i64::MAX)), None);
    assert_eq!(f64::from_value(&Value::Int(2)), Some(2.0));
    assert_eq!(<Option<i64>>::from_value(&Value::Null), Some(None));
}

#[test]
fn generated_schema_lists_every_field() {
    let names: Vec<_> = User::MODEL.fields.iter().map(|f| f.name).collect();

    assert_eq!(names, vec!["id", "name", "age", "role"]);
    assert_eq!(
        User::MODEL.field("role").and_then(|f| f.ty.record_schema()),
        Some(Role::MODEL)
    );
}

#[test]
fn set_value_rejects_wrong_type_and_unknown_field() {
    let mut user = User::default();

    assert!(matches!(
        user.set_value("name", &Value::Int(1)),
        Err(FieldWriteError::TypeMismatch { .. })
    ));
    assert!(matches!(
        user.set_value("missing", &Value::Int(1)),
        Err(FieldWriteError::UnknownField { .. })
    ));
    assert!(matches!(
        user.set_value("role", &Value::Null),
        Err(FieldWriteError::NotWritable { .. })
    ));
}

#[test]
fn get_record_mut_allocates_null_record() {
    let mut user = User::default();
    assert!(user.get_record("role").is_none());

    let role = user.get_record_mut("role").expect("role is a record field");
    role.set_value("name", &Value::from("ADMIN"))
        .expect("name is writable");

    assert_eq!(
        user.role.as_ref().and_then(|r| r.name.clone()),
        Some("ADMIN".to_string())
    );
}

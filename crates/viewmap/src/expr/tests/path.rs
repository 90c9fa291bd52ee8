use crate::{
    expr::{FieldPath, Lambda, lit},
    mapping::MappingError,
    test_fixtures::{Role, User, user},
    traits::Record,
    value::Value,
};

#[test]
fn resolve_nested_selector() {
    let path = FieldPath::resolve(&Lambda::of::<User>(|x| x.field("role").field("name"))).unwrap();

    assert_eq!(path.to_string(), "role.name");
    assert_eq!(path.root(), User::MODEL);
    assert_eq!(path.leaf().owner, Role::MODEL);
    assert!(!path.is_single_hop());
    assert!(path.ty().nullable);
}

#[test]
fn resolve_ignores_conversion_wrappers() {
    let path = FieldPath::resolve(&Lambda::of::<User>(|x| x.field("age").unwrap_value())).unwrap();

    assert_eq!(path.to_string(), "age");
}

#[test]
fn computed_selector_is_rejected() {
    let err = FieldPath::resolve(&Lambda::of::<User>(|x| x.field("age").plus(1))).unwrap_err();
    assert!(matches!(err, MappingError::NotFieldChain { .. }));

    let err = FieldPath::resolve(&Lambda::of::<User>(|_| lit(1))).unwrap_err();
    assert!(matches!(err, MappingError::NotFieldChain { .. }));
}

#[test]
fn bare_parameter_is_not_a_path() {
    let err = FieldPath::resolve(&Lambda::of::<User>(|x| x)).unwrap_err();

    assert!(matches!(err, MappingError::NotFieldChain { .. }));
}

#[test]
fn unknown_and_branching_fields_are_rejected() {
    let err = FieldPath::resolve(&Lambda::of::<User>(|x| x.field("missing"))).unwrap_err();
    assert!(matches!(err, MappingError::UnknownField { field, .. } if field == "missing"));

    let err =
        FieldPath::resolve(&Lambda::of::<User>(|x| x.field("name").field("len"))).unwrap_err();
    assert!(matches!(err, MappingError::BranchingPath { field: "name", .. }));
}

#[test]
fn read_through_null_record_is_null() {
    let path = FieldPath::from_names(User::MODEL, &["role", "name"]).unwrap();

    let mut row = user(1, "NAME1", "ROLE1");
    assert_eq!(path.read(&row), Value::from("ROLE1"));

    row.role = None;
    assert_eq!(path.read(&row), Value::Null);
}

#[test]
fn write_allocates_intermediate_records() {
    let path = FieldPath::from_names(User::MODEL, &["role", "name"]).unwrap();
    let mut row = User::default();

    path.write(&mut row, &Value::from("ADMIN")).unwrap();

    assert_eq!(
        row.role,
        Some(Role {
            id: 0,
            name: Some("ADMIN".to_string()),
        })
    );
}

#[test]
fn to_expr_rebuilds_the_chain() {
    let lambda = Lambda::of::<User>(|x| x.path("role.name"));
    let path = FieldPath::resolve(&lambda).unwrap();

    assert_eq!(
        path.to_expr(crate::expr::Expr::Parameter(lambda.param)),
        lambda.body
    );
}

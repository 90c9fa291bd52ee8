use crate::{
    expr::{
        EvalError, Lambda,
        eval::{predicate, selector},
        lit,
    },
    model::{FieldKind, FieldType},
    test_fixtures::{
        Location, LocationModel, User, UserLocationsModel, UserModel, location, user,
    },
    value::Value,
};

fn composite(names: &[&str]) -> UserLocationsModel {
    UserLocationsModel {
        user: Some(UserModel {
            id: Some(1),
            ..UserModel::default()
        }),
        locations: names
            .iter()
            .map(|name| LocationModel {
                id: Some(1),
                name: Some((*name).to_string()),
            })
            .collect(),
    }
}

#[test]
fn comparison_on_scalar_fields() {
    let row = user(1, "NAME1", "ROLE1");

    assert!(predicate(&Lambda::of::<User>(|x| x.field("id").eq(1)), &row).unwrap());
    assert!(!predicate(&Lambda::of::<User>(|x| x.field("id").gt(1)), &row).unwrap());
    assert!(
        predicate(
            &Lambda::of::<User>(|x| x.field("name").eq("NAME1") & x.field("id").lte(1u64)),
            &row
        )
        .unwrap()
    );
}

#[test]
fn null_record_propagates_to_null_field() {
    let mut row = user(1, "NAME1", "ROLE1");
    row.role = None;

    let role_name = Lambda::of::<User>(|x| x.path("role.name"));
    assert_eq!(selector(&role_name, &row).unwrap(), Value::Null);

    assert!(predicate(&Lambda::of::<User>(|x| x.path("role.name").is_null()), &row).unwrap());
    assert!(!predicate(&Lambda::of::<User>(|x| x.path("role.name").eq("ROLE1")), &row).unwrap());
    assert!(
        !predicate(&Lambda::of::<User>(|x| x.path("role.name").gt("A")), &row).unwrap(),
        "ordering against null is a non-match"
    );
}

#[test]
fn invalid_type_pairs_are_non_matches() {
    let row = user(1, "NAME1", "ROLE1");

    assert!(!predicate(&Lambda::of::<User>(|x| x.field("name").eq(1)), &row).unwrap());
    assert!(!predicate(&Lambda::of::<User>(|x| x.field("name").ne(1)), &row).unwrap());
}

#[test]
fn any_and_all_over_nested_collection() {
    let row = composite(&["PARIS", "LONDON"]);

    let any_paris = Lambda::of::<UserLocationsModel>(|x| {
        x.field("locations")
            .any("l", |l| l.field("name").eq("PARIS"))
    });
    let all_paris = Lambda::of::<UserLocationsModel>(|x| {
        x.field("locations")
            .all("l", |l| l.field("name").eq("PARIS"))
    });
    let non_empty = Lambda::of::<UserLocationsModel>(|x| x.field("locations").any_element());

    assert!(predicate(&any_paris, &row).unwrap());
    assert!(!predicate(&all_paris, &row).unwrap());
    assert!(predicate(&non_empty, &row).unwrap());

    let empty = composite(&[]);
    assert!(!predicate(&any_paris, &empty).unwrap());
    assert!(predicate(&all_paris, &empty).unwrap());
    assert!(!predicate(&non_empty, &empty).unwrap());
}

#[test]
fn nested_lambda_can_reference_outer_parameter() {
    let row = composite(&["PARIS"]);

    let lambda = Lambda::of::<UserLocationsModel>(|x| {
        let user_id = x.path("user.id");
        x.field("locations")
            .any("l", move |l| l.field("id").eq(user_id))
    });

    assert!(predicate(&lambda, &row).unwrap());
}

#[test]
fn count_and_text_methods() {
    let row = composite(&["PARIS", "MADRID"]);

    let count = Lambda::of::<UserLocationsModel>(|x| x.field("locations").count());
    assert_eq!(selector(&count, &row).unwrap(), Value::Int(2));

    let loc = location(1, "PARIS", 1);
    let prefix = Lambda::of::<Location>(|x| x.field("name").starts_with("PA"));
    assert!(predicate(&prefix, &loc).unwrap());
    assert!(predicate(&Lambda::of::<Location>(|x| x.field("name").ends_with("IS")), &loc).unwrap());
    assert!(predicate(&Lambda::of::<Location>(|x| x.field("name").contains("RI")), &loc).unwrap());
    assert!(
        predicate(
            &Lambda::of::<Location>(|x| lit(vec!["LYON", "PARIS"]).contains(x.field("name"))),
            &loc
        )
        .unwrap()
    );
}

#[test]
fn arithmetic_and_conversion() {
    let mut row = user(1, "NAME1", "ROLE1");
    row.age = Some(40);

    let next = Lambda::of::<User>(|x| x.field("age").plus(2));
    assert_eq!(selector(&next, &row).unwrap(), Value::Int(42));

    let half = Lambda::of::<User>(|x| x.field("age").times(0.5));
    assert_eq!(selector(&half, &row).unwrap(), Value::Float(20.0));

    let lossy = Lambda::of::<User>(|_| lit(2.5).convert(FieldType::new(FieldKind::Int)));
    assert!(matches!(
        selector(&lossy, &row),
        Err(EvalError::LossyConversion { .. })
    ));

    row.age = None;
    assert_eq!(selector(&next, &row).unwrap(), Value::Null);
    assert!(matches!(
        selector(&Lambda::of::<User>(|x| x.field("age").unwrap_value()), &row),
        Err(EvalError::NullUnwrap { .. })
    ));
}

#[test]
fn division_by_zero_fails_loudly() {
    let row = user(1, "NAME1", "ROLE1");

    assert!(matches!(
        selector(&Lambda::of::<User>(|x| x.field("id").divided_by(0)), &row),
        Err(EvalError::DivideByZero { .. })
    ));
}

#[test]
fn lambda_over_other_schema_is_rejected() {
    let row = location(1, "PARIS", 1);

    assert!(matches!(
        predicate(&Lambda::of::<User>(|x| x.field("id").eq(1)), &row),
        Err(EvalError::ParameterMismatch { .. })
    ));
}

#[test]
fn non_boolean_predicate_is_a_type_error() {
    let row = user(1, "NAME1", "ROLE1");

    assert!(matches!(
        predicate(&Lambda::of::<User>(|x| x.field("id")), &row),
        Err(EvalError::TypeMismatch { .. })
    ));
}

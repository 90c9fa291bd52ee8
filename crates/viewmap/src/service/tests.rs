use crate::{
    db::{MemoryContext, MemoryRepository, PaginationPolicy, Repository, WriteBatch},
    error::{ErrorClass, ErrorOrigin},
    expr::Lambda,
    obs::{CallKind, MetricsEvent, MetricsSink, with_metrics_sink},
    service::{GenericService, Operations},
    test_fixtures::{
        User, UserModel, location_service, seeded_context, user, user_model_id_eq, user_service,
    },
};
use std::{cell::RefCell, rc::Rc};

fn ids(items: &[UserModel]) -> Vec<Option<i64>> {
    items.iter().map(|item| item.id).collect()
}

fn model(id: Option<i64>, name: Option<&str>, role: Option<&str>) -> UserModel {
    UserModel {
        id,
        name: name.map(str::to_string),
        role: role.map(str::to_string),
        age: None,
    }
}

//
// Reads
//

#[test]
fn get_by_key_projects_mapped_fields() {
    let service = user_service(&seeded_context());

    let results = service.get(Some(&user_model_id_eq(1))).unwrap();

    assert_eq!(results.count, 1);
    assert_eq!(results.items, vec![model(Some(1), Some("NAME1"), Some("ROLE1"))]);
}

#[test]
fn nested_entity_field_is_filterable_through_model() {
    let service = user_service(&seeded_context());
    let filter = Lambda::of::<UserModel>(|x| x.field("role").eq("ROLE1"));

    let results = service.get(Some(&filter)).unwrap();

    assert_eq!(ids(&results.items), vec![Some(1), Some(3)]);
}

#[test]
fn get_all_uses_default_order() {
    let context = seeded_context();
    let service = GenericService::<UserModel, User>::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .map(|m| m.field("name"), |e| e.field("name"))
        .default_order_desc(|e| e.field("id"))
        .build(&context)
        .unwrap();

    let results = service.get_all().unwrap();

    assert_eq!(results.count, 3);
    assert_eq!(ids(&results.items), vec![Some(3), Some(2), Some(1)]);
}

#[test]
fn explicit_order_is_translated() {
    let service = user_service(&seeded_context());

    let by_name = service
        .get_with(
            &Operations::new().order_by_desc(|x| x.field("name")),
            None,
            None,
        )
        .unwrap();
    let by_role = service
        .get_with(
            &Operations::new()
                .order_by(|x| x.field("role"))
                .order_by_desc(|x| x.field("id")),
            None,
            None,
        )
        .unwrap();

    assert_eq!(ids(&by_name.items), vec![Some(3), Some(2), Some(1)]);
    assert_eq!(ids(&by_role.items), vec![Some(3), Some(1), Some(2)]);
}

#[test]
fn computed_order_falls_back_to_default() {
    let service = user_service(&seeded_context());

    let results = service
        .get_with(
            &Operations::new().order_by_desc(|x| x.field("age").plus(1)),
            None,
            None,
        )
        .unwrap();

    assert_eq!(ids(&results.items), vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn pages_are_counted_before_windowing() {
    let context = seeded_context();
    let service = GenericService::<UserModel, User>::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .default_order(|e| e.field("id"))
        .pagination(PaginationPolicy::new().with_default_page_size(Some(2)))
        .build(&context)
        .unwrap();

    let first = service.get_page(None, None).unwrap();
    let second = service.get_page(None, Some(2)).unwrap();
    let past_end = service.get_page(None, Some(9)).unwrap();

    assert_eq!((first.count, ids(&first.items)), (3, vec![Some(1), Some(2)]));
    assert_eq!((second.count, ids(&second.items)), (3, vec![Some(3)]));
    assert_eq!(past_end.count, 3);
    assert!(past_end.is_empty());
}

#[test]
fn page_size_is_clamped() {
    let service = user_service(&seeded_context());

    let empty = service.get_paged(None, Some(1), Some(0)).unwrap();
    let capped = service.get_paged(None, Some(1), Some(10_000)).unwrap();
    let negative = service.get_paged(None, Some(-1), Some(-1)).unwrap();

    assert_eq!((empty.count, empty.len()), (3, 0));
    assert_eq!(capped.len(), 3);
    assert_eq!(negative.len(), 3);
}

#[test]
fn unmapped_model_field_fails_translation() {
    let context = seeded_context();
    let service = GenericService::<UserModel, User>::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .default_order(|e| e.field("id"))
        .build(&context)
        .unwrap();
    let filter = Lambda::of::<UserModel>(|x| x.field("name").eq("NAME1"));

    let err = service.get(Some(&filter)).unwrap_err();

    assert_eq!(err.class, ErrorClass::MappingNotFound);
    assert_eq!(err.origin, ErrorOrigin::Translate);
}

//
// Writes
//

#[test]
fn create_returns_generated_identity() {
    let service = user_service(&seeded_context());

    let created = service
        .create(&model(None, Some("NAME4"), Some("ROLE2")))
        .unwrap();

    assert_eq!(created.count, 1);
    assert_eq!(created.items, vec![model(Some(4), Some("NAME4"), Some("ROLE2"))]);

    let stored = service.get(Some(&user_model_id_eq(4))).unwrap();
    assert_eq!(stored.items, created.items);
}

#[test]
fn create_many_is_one_batch() {
    let service = user_service(&seeded_context());

    let created = service
        .create_many(&[
            model(None, Some("NAME4"), None),
            model(None, Some("NAME5"), None),
        ])
        .unwrap();

    assert_eq!(ids(&created.items), vec![Some(4), Some(5)]);
    assert_eq!(service.get_all().unwrap().count, 5);
}

#[test]
fn duplicate_identity_discards_the_batch() {
    let service = user_service(&seeded_context());

    let err = service
        .create(&model(Some(1), Some("CLASH"), None))
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Storage);
    assert_eq!(service.get_all().unwrap().count, 3);
}

#[test]
fn pending_batch_of_another_writer_does_not_leak_into_create() {
    let context = MemoryContext::new();
    let users = context
        .register(MemoryRepository::<User>::new().with_identity("id"))
        .unwrap();
    users.seed([user(1, "NAME1", "ROLE1")]).unwrap();
    let service = user_service(&context);

    let pending = WriteBatch::new().insert(vec![user(1, "DUP", "ROLE1")]);
    let created = service
        .create(&model(None, Some("NAME2"), None))
        .unwrap();
    assert_eq!(ids(&created.items), vec![Some(2)]);

    assert!(users.commit(pending).unwrap_err().is_conflict());
    assert_eq!(ids(&service.get_all().unwrap().items), vec![Some(1), Some(2)]);
}

#[test]
fn update_leaves_null_fields_untouched() {
    let service = user_service(&seeded_context());

    let updated = service
        .update(&model(Some(2), Some("RENAMED"), None))
        .unwrap();
    assert_eq!(updated.count, 1);

    let stored = service.get(Some(&user_model_id_eq(2))).unwrap();
    assert_eq!(stored.items, vec![model(Some(2), Some("RENAMED"), Some("ROLE2"))]);
}

#[test]
fn update_requires_exactly_one_match() {
    let service = user_service(&seeded_context());
    let err = service.update(&model(Some(42), Some("X"), None)).unwrap_err();
    assert_eq!(err.class, ErrorClass::NotFound);
    assert!(err.message.contains("id=42"), "{}", err.message);

    // no identity on this repository, so duplicate keys are storable
    let context = MemoryContext::new();
    let users = MemoryRepository::new();
    users
        .seed([user(1, "NAME1", "ROLE1"), user(1, "NAME1B", "ROLE1")])
        .unwrap();
    context.register(users).unwrap();

    let err = user_service(&context)
        .update(&model(Some(1), Some("X"), None))
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::MultipleMatch);
}

#[test]
fn update_many_stops_at_first_failure() {
    let service = user_service(&seeded_context());

    let err = service
        .update_many(&[
            model(Some(1), Some("FIRST"), None),
            model(Some(9), Some("MISSING"), None),
            model(Some(3), Some("NEVER"), None),
        ])
        .unwrap_err();
    assert!(err.is_not_found());

    let stored = service.get_all().unwrap();
    let names: Vec<_> = stored.items.iter().map(|m| m.name.as_deref()).collect();
    assert_eq!(names, vec![Some("FIRST"), Some("NAME2"), Some("NAME3")]);
}

#[test]
fn delete_reports_whether_rows_were_removed() {
    let service = user_service(&seeded_context());
    let filter = user_model_id_eq(3);

    assert!(service.delete(&filter).unwrap());
    assert_eq!(service.get(Some(&filter)).unwrap().count, 0);
    assert!(!service.delete(&filter).unwrap());
    assert_eq!(service.get_all().unwrap().count, 2);
}

//
// Declaration
//

#[test]
fn builder_requires_default_order() {
    let err = GenericService::<UserModel, User>::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .build(&seeded_context())
        .err()
        .unwrap();

    assert_eq!(err.class, ErrorClass::Configuration);
    assert!(err.message.contains("default order"));
}

#[test]
fn builder_reports_first_mapping_error() {
    let err = GenericService::<UserModel, User>::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .map(|m| m.field("id"), |e| e.field("name"))
        .map(|m| m.field("role"), |e| e.field("role"))
        .default_order(|e| e.field("id"))
        .build(&seeded_context())
        .err()
        .unwrap();

    assert_eq!(err.class, ErrorClass::Configuration);
    assert_eq!(err.origin, ErrorOrigin::Mapping);
    assert!(err.message.contains("already mapped"), "{}", err.message);
}

#[test]
fn builder_rejects_empty_mapping_table() {
    let err = GenericService::<UserModel, User>::builder()
        .default_order(|e| e.field("id"))
        .build(&seeded_context())
        .err()
        .unwrap();

    assert_eq!(err.class, ErrorClass::Configuration);
}

#[test]
fn builder_needs_registered_repository() {
    let err = GenericService::<UserModel, User>::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .default_order(|e| e.field("id"))
        .build(&MemoryContext::new())
        .err()
        .unwrap();

    assert_eq!(err.class, ErrorClass::Storage);
    assert!(location_service(&seeded_context()).get_all().is_ok());
}

//
// Metrics
//

#[test]
fn failed_update_is_reported_as_failed_call() {
    #[derive(Default)]
    struct Capture(RefCell<Vec<MetricsEvent>>);

    impl MetricsSink for Capture {
        fn record(&self, event: MetricsEvent) {
            self.0.borrow_mut().push(event);
        }
    }

    let service = user_service(&seeded_context());
    let capture = Rc::new(Capture::default());

    let result = with_metrics_sink(capture.clone(), || {
        service.update(&model(Some(42), None, None))
    });
    assert!(result.is_err());

    let events = capture.0.borrow();
    assert_eq!(
        events.last(),
        Some(&MetricsEvent::CallFinish {
            kind: CallKind::Update,
            entity_path: "User",
            rows: 0,
            failed: true,
        })
    );
}

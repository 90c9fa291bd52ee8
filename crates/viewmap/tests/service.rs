//! End-to-end CRUD through the public surface: records declared with
//! `record!`, an in-memory context, and a host-supplied config document.
use viewmap::{
    config::ServiceConfig,
    db::{MemoryContext, MemoryRepository},
    error::ErrorClass,
    obs::{metrics_report, metrics_reset_all},
    prelude::*,
};

viewmap::record! {
    pub struct CategoryRow as "CategoryRow" {
        id: i64,
        name: Option<String>,
    }
}

viewmap::record! {
    pub struct ProductRow as "ProductRow" {
        id: i64,
        title: Option<String>,
        price: Option<i64>,
        active: bool;
        records { category: CategoryRow }
    }
}

viewmap::record! {
    pub struct ProductView as "ProductView" {
        id: Option<i64>,
        title: Option<String>,
        price: Option<i64>,
        category: Option<String>,
    }
}

fn row(id: i64, title: &str, price: i64, category: &str) -> ProductRow {
    ProductRow {
        id,
        title: Some(title.to_string()),
        price: Some(price),
        active: true,
        category: Some(CategoryRow {
            id,
            name: Some(category.to_string()),
        }),
    }
}

fn view(title: &str, price: i64, category: &str) -> ProductView {
    ProductView {
        id: None,
        title: Some(title.to_string()),
        price: Some(price),
        category: Some(category.to_string()),
    }
}

fn context() -> MemoryContext {
    let context = MemoryContext::new();
    let products = MemoryRepository::new().with_identity("id");
    products
        .seed([
            row(1, "hammer", 12, "tools"),
            row(2, "wrench", 9, "tools"),
            row(3, "apron", 15, "garden"),
            row(4, "saw", 30, "tools"),
            row(5, "rake", 20, "garden"),
        ])
        .unwrap();
    context.register(products).unwrap();

    context
}

fn products(
    context: &MemoryContext,
    config: ServiceConfig,
) -> GenericService<ProductView, ProductRow> {
    GenericService::builder()
        .key(|m| m.field("id"), |e| e.field("id"))
        .map(|m| m.field("title"), |e| e.field("title"))
        .map(|m| m.field("price"), |e| e.field("price"))
        .map(|m| m.field("category"), |e| e.path("category.name"))
        .default_order(|e| e.field("id"))
        .config(config)
        .build(context)
        .unwrap()
}

fn titles(results: &Results<ProductView>) -> Vec<&str> {
    results
        .items
        .iter()
        .filter_map(|item| item.title.as_deref())
        .collect()
}

#[test]
fn filter_and_order_run_against_entity_fields() {
    let service = products(&context(), ServiceConfig::default());

    let operations = Operations::<ProductView>::new()
        .filter(|x| x.field("category").eq("tools") & x.field("price").gt(10))
        .order_by_desc(|x| x.field("price"));
    let results = service.get_with(&operations, None, None).unwrap();

    assert_eq!(results.count, 2);
    assert_eq!(titles(&results), vec!["saw", "hammer"]);
}

#[test]
fn config_document_drives_paging() {
    let config: ServiceConfig =
        serde_json::from_str(r#"{ "pagination": { "default_page_size": 2, "max_page_size": 3 } }"#)
            .unwrap();
    let service = products(&context(), config);

    let second = service.get_page(None, Some(2)).unwrap();
    assert_eq!(second.count, 5);
    assert_eq!(titles(&second), vec!["apron", "saw"]);

    // requested size above the configured maximum is clamped
    let wide = service.get_paged(None, Some(1), Some(50)).unwrap();
    assert_eq!(titles(&wide), vec!["hammer", "wrench", "apron"]);
}

#[test]
fn write_cycle() {
    let service = products(&context(), ServiceConfig::default());

    let created = service.create(&view("shovel", 25, "garden")).unwrap();
    let id = created.items[0].id.unwrap();
    assert_eq!(id, 6);

    let mut change = ProductView {
        id: Some(id),
        ..ProductView::default()
    };
    change.price = Some(22);
    service.update(&change).unwrap();

    let by_id = Lambda::of::<ProductView>(|x| x.field("id").eq(id));
    let stored = service.get(Some(&by_id)).unwrap();
    assert_eq!(
        stored.items,
        vec![ProductView {
            id: Some(id),
            ..view("shovel", 22, "garden")
        }]
    );

    let garden = Lambda::of::<ProductView>(|x| x.field("category").eq("garden"));
    assert!(service.delete(&garden).unwrap());
    assert_eq!(service.get(Some(&garden)).unwrap().count, 0);
    assert_eq!(service.get_all().unwrap().count, 3);
}

#[test]
fn missing_key_is_not_found() {
    let service = products(&context(), ServiceConfig::default());

    let err = service
        .update(&ProductView {
            id: Some(99),
            ..view("ghost", 1, "none")
        })
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::NotFound);
}

#[test]
fn calls_are_counted_per_entity() {
    metrics_reset_all();
    let service = products(&context(), ServiceConfig::default());

    service.get_all().unwrap();
    service.create(&view("shovel", 25, "garden")).unwrap();
    let _ = service.update(&ProductView {
        id: Some(99),
        ..ProductView::default()
    });

    let report = metrics_report();
    let ops = &report.counters.ops;
    assert_eq!((ops.get_calls, ops.create_calls, ops.update_calls), (1, 1, 1));
    assert_eq!(ops.failed_calls, 1);
    assert_eq!(ops.rows_read, 5);

    let summary = &report.entity_counters[0];
    assert_eq!(summary.path, "ProductRow");
    assert_eq!((summary.calls, summary.failed_calls), (3, 1));
}

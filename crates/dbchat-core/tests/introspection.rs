//! Integration tests for schema introspection against a seeded database.

use dbchat_core::schema::{DomainValues, RelationshipKind, SchemaProvider};
use dbchat_core::seed::{SeedOptions, seed_database};

async fn seeded_provider() -> (tempfile::TempDir, SchemaProvider) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sales.db");
    let opts = SeedOptions {
        customers: 30,
        orders: 60,
        force: false,
    };
    seed_database(&path, &opts).await.expect("seed");
    let provider = SchemaProvider::open(&path).await.expect("open provider");
    (dir, provider)
}

#[tokio::test]
async fn cache_covers_every_user_table() {
    let (_dir, provider) = seeded_provider().await;
    let tables = provider.cached_tables();
    assert_eq!(
        tables,
        vec![
            "categories",
            "customers",
            "inventory",
            "order_items",
            "orders",
            "product_types",
            "products",
            "stores",
        ]
    );
}

#[tokio::test]
async fn customers_schema_preserves_catalog_order_and_keys() {
    let (_dir, provider) = seeded_provider().await;
    let schema = provider.table_schema("customers").await.expect("schema");

    let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["customer_id", "first_name", "last_name", "email", "phone", "region"]
    );

    assert!(schema.columns[0].is_primary_key);
    assert!(!schema.columns[5].is_primary_key);
    assert!(schema.columns[1].is_required);
    assert!(!schema.columns[4].is_required);
}

#[tokio::test]
async fn customers_region_domain_is_enumerated_and_sorted() {
    let (_dir, provider) = seeded_provider().await;
    let schema = provider.table_schema("customers").await.expect("schema");

    let domain = schema
        .domains
        .iter()
        .find(|d| d.label == "Valid Regions")
        .expect("region domain");

    let DomainValues::Values(values) = &domain.values else {
        unreachable!("regions should be an enumerated domain");
    };
    assert!(!values.is_empty());
    let mut sorted = values.clone();
    sorted.sort();
    assert_eq!(*values, sorted);
}

#[tokio::test]
async fn foreign_keys_carry_inferred_cardinality() {
    let (_dir, provider) = seeded_provider().await;

    let order_items = provider.table_schema("order_items").await.expect("schema");
    for fk in &order_items.foreign_keys {
        // orders and products are both dimension-like targets.
        assert_eq!(fk.relationship, RelationshipKind::ManyToOne, "{}", fk.column);
    }

    let orders = provider.table_schema("orders").await.expect("schema");
    let targets: Vec<&str> = orders
        .foreign_keys
        .iter()
        .map(|fk| fk.references_table.as_str())
        .collect();
    assert!(targets.contains(&"customers"));
    assert!(targets.contains(&"stores"));
}

#[tokio::test]
async fn products_get_a_price_range_summary() {
    let (_dir, provider) = seeded_provider().await;
    let schema = provider.table_schema("products").await.expect("schema");

    let domain = schema
        .domains
        .iter()
        .find(|d| d.label == "Price Range")
        .expect("price range domain");
    let DomainValues::Summary(summary) = &domain.values else {
        unreachable!("price range should be a summary domain");
    };
    assert!(summary.starts_with('$'));
    assert!(summary.contains(" - $"));
}

#[tokio::test]
async fn orders_get_reporting_years() {
    let (_dir, provider) = seeded_provider().await;
    let schema = provider.table_schema("orders").await.expect("schema");

    let domain = schema
        .domains
        .iter()
        .find(|d| d.label == "Available Years")
        .expect("years domain");
    let DomainValues::Summary(years) = &domain.values else {
        unreachable!("years should be a summary domain");
    };
    assert!(years.contains("2022"));
}

#[tokio::test]
async fn rendering_is_byte_identical_without_intervening_writes() {
    let (_dir, provider) = seeded_provider().await;
    for table in provider.cached_tables() {
        let first = provider.table_metadata_string(table, 10).await;
        let second = provider.table_metadata_string(table, 10).await;
        assert_eq!(first, second, "{table} rendering should be stable");
    }
}

#[tokio::test]
async fn missing_table_renders_an_error_line_instead_of_failing() {
    let (_dir, provider) = seeded_provider().await;

    let rendered = provider.table_metadata_string("non_existing_table", 10).await;
    assert!(rendered.starts_with("**ERROR:**"));
    assert!(rendered.contains("non_existing_table"));

    let err = provider
        .table_schema("non_existing_table")
        .await
        .expect_err("should be NotFound");
    assert!(matches!(err, dbchat_core::Error::NotFound(_)));
}

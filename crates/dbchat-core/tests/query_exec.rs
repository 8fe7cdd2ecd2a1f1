//! Integration tests for the query executor's string contract.

use dbchat_core::Database;
use dbchat_core::db::NO_RESULTS_MESSAGE;
use serde_json::Value;

/// Minimal three-table variant of the catalog: the executor contract is the
/// same regardless of which catalog shape it runs over.
const SIMPLE_SCHEMA: &str = r"
CREATE TABLE customers (
    customer_id INTEGER PRIMARY KEY,
    region TEXT
);

CREATE TABLE orders (
    order_id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL,
    total_amount REAL NOT NULL,
    order_date DATE NOT NULL,
    FOREIGN KEY (customer_id) REFERENCES customers (customer_id)
);

INSERT INTO customers VALUES (1, 'EUROPE'), (2, 'NORTH AMERICA');
INSERT INTO orders VALUES
    (1, 1, 120.50, '2023-03-14'),
    (2, 1, 80.00, '2023-07-01'),
    (3, 2, 42.25, '2024-01-20');
";

async fn fixture_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("simple.db");
    let db = Database::create(&path).await.expect("create db");
    sqlx::raw_sql(SIMPLE_SCHEMA)
        .execute(db.pool())
        .await
        .expect("apply fixture schema");
    (dir, db)
}

#[tokio::test]
async fn count_query_returns_a_one_row_json_table() {
    let (_dir, db) = fixture_db().await;

    let result = db
        .execute_query("SELECT COUNT(*) FROM orders LIMIT 20")
        .await;
    let decoded: Value = serde_json::from_str(&result).expect("valid JSON");

    assert_eq!(decoded["columns"].as_array().map(Vec::len), Some(1));
    assert_eq!(decoded["data"], serde_json::json!([[3]]));
}

#[tokio::test]
async fn zero_rows_yields_a_human_message_not_an_empty_list() {
    let (_dir, db) = fixture_db().await;

    let result = db
        .execute_query("SELECT * FROM orders WHERE total_amount > 100000 LIMIT 20")
        .await;
    let decoded: Value = serde_json::from_str(&result).expect("valid JSON");

    assert_eq!(decoded, Value::String(NO_RESULTS_MESSAGE.to_string()));
    assert!(!decoded.is_array());
}

#[tokio::test]
async fn syntax_error_reports_diagnostic_and_original_query() {
    let (_dir, db) = fixture_db().await;

    let query = "SELEC * FROM orders LIMIT 20";
    let result = db.execute_query(query).await;
    let decoded: Value = serde_json::from_str(&result).expect("valid JSON");

    assert_eq!(decoded["query"], query);
    assert!(
        decoded["error"].as_str().is_some_and(|e| !e.is_empty()),
        "error text should be present: {result}"
    );
}

#[tokio::test]
async fn missing_table_is_reported_the_same_way() {
    let (_dir, db) = fixture_db().await;

    let result = db.execute_query("SELECT * FROM invoices LIMIT 5").await;
    let decoded: Value = serde_json::from_str(&result).expect("valid JSON");

    assert!(decoded["error"].as_str().is_some_and(|e| e.contains("invoices")));
}

#[tokio::test]
async fn column_and_row_order_follow_the_engine() {
    let (_dir, db) = fixture_db().await;

    let result = db
        .execute_query(
            "SELECT order_id, total_amount FROM orders ORDER BY order_id DESC LIMIT 20",
        )
        .await;
    let decoded: Value = serde_json::from_str(&result).expect("valid JSON");

    assert_eq!(
        decoded["columns"],
        serde_json::json!(["order_id", "total_amount"])
    );
    assert_eq!(decoded["data"][0][0], 3);
    assert_eq!(decoded["data"][2][0], 1);
}

#[tokio::test]
async fn null_values_round_trip_as_json_null() {
    let (_dir, db) = fixture_db().await;

    let result = db
        .execute_query("SELECT NULL AS missing, region FROM customers LIMIT 1")
        .await;
    let decoded: Value = serde_json::from_str(&result).expect("valid JSON");

    assert!(decoded["data"][0][0].is_null());
    assert!(decoded["data"][0][1].is_string());
}

//! Unit tests for tool declarations and the row-limit guardrail.

use super::*;

#[test]
fn every_tool_name_resolves_back_to_its_kind() {
    for kind in ToolKind::all() {
        let name = kind.name();
        assert_eq!(ToolKind::from_name(&name), Some(kind), "{name}");
    }
}

#[test]
fn unknown_names_do_not_resolve() {
    assert_eq!(ToolKind::from_name("get_weather"), None);
    assert_eq!(ToolKind::from_name(""), None);
}

#[test]
fn declarations_cover_all_tables_plus_query_and_clock() {
    let decls = declarations();
    // Eight per-table schema tools, the query tool, and the UTC tool.
    assert_eq!(decls.len(), 10);

    let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"get_customers_table_schema"));
    assert!(names.contains(&"get_order_items_table_schema"));
    assert!(names.contains(&"execute_sales_query"));
    assert!(names.contains(&"get_current_utc_date"));
}

#[test]
fn query_tool_schema_requires_the_query_argument() {
    let decl = ToolKind::ExecuteQuery.declaration();
    assert_eq!(decl.input_schema["type"], "object");
    assert_eq!(decl.input_schema["required"][0], "query");
    assert!(decl.input_schema["properties"]["query"].is_object());
}

#[test]
fn schema_tools_take_no_arguments() {
    let decl = ToolKind::TableSchema(SalesTable::Stores).declaration();
    assert_eq!(decl.name, "get_stores_table_schema");
    assert_eq!(
        decl.input_schema["properties"],
        serde_json::json!({})
    );
}

#[test]
fn row_limit_check_is_case_insensitive() {
    assert!(has_row_limit("SELECT * FROM orders LIMIT 20"));
    assert!(has_row_limit("select * from orders limit 5"));
    assert!(!has_row_limit("SELECT * FROM orders"));
}

#[test]
fn row_limit_check_is_a_substring_check() {
    // Documented looseness: the word anywhere in the text passes.
    assert!(has_row_limit("SELECT * FROM t -- limit later"));
}

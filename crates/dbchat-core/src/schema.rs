//! Runtime schema introspection for the sales database.
//!
//! Builds an immutable [`TableSchema`] per table from the SQLite catalog
//! (columns, keys, inferred relationship cardinality, enumerated value
//! domains) and renders it into a bounded, deterministic text description
//! the language model can plan queries against.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::Row;

use crate::db::Database;
use crate::error::{Error, Result};

/// Cardinality of a foreign-key relationship, as seen from the referencing
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    ManyToOne,
    OneToMany,
}

impl RelationshipKind {
    /// Upper-case label used in rendered schema text.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::ManyToOne => "MANY_TO_ONE",
            RelationshipKind::OneToMany => "ONE_TO_MANY",
        }
    }
}

/// Dimension-like tables: referencing one of these is treated as the "many"
/// side of a many-to-one relationship.
const DIMENSION_TABLES: &[&str] = &[
    "customers",
    "products",
    "stores",
    "categories",
    "product_types",
    "orders",
];

/// Classify a foreign key's cardinality from its referenced table name.
///
/// This is a heuristic, not a constraint-derived fact: SQLite's catalog does
/// not expose unique-index metadata through `PRAGMA foreign_key_list`, so we
/// assume references into dimension-like tables are many-to-one. Engines
/// that expose real unique-constraint metadata can replace this function
/// without touching the rest of the introspector.
pub fn infer_relationship(references_table: &str) -> RelationshipKind {
    if DIMENSION_TABLES.contains(&references_table) {
        RelationshipKind::ManyToOne
    } else {
        RelationshipKind::OneToMany
    }
}

/// A column as declared in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub is_primary_key: bool,
    pub is_required: bool,
    pub default_value: Option<String>,
}

/// A foreign key with its inferred cardinality.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
    pub relationship: RelationshipKind,
}

/// Value domain of a column, surfaced to aid query generation.
#[derive(Debug, Clone, Serialize)]
pub enum DomainValues {
    /// Bounded list of distinct values, ascending.
    Values(Vec<String>),
    /// Derived summary for continuous or high-cardinality columns.
    Summary(String),
}

/// A labelled value domain.
#[derive(Debug, Clone, Serialize)]
pub struct Domain {
    pub label: &'static str,
    pub values: DomainValues,
}

/// Immutable snapshot of one table's catalog state. Introspection always
/// rebuilds from scratch rather than patching an existing snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub description: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub domains: Vec<Domain>,
}

/// Fixed, table-specific columns whose distinct values are enumerated.
fn enumerated_columns(table: &str) -> &'static [(&'static str, &'static str)] {
    match table {
        "customers" => &[("Valid Regions", "region")],
        "stores" => &[("Valid Stores", "store_name")],
        "categories" => &[("Valid Categories", "category_name")],
        "product_types" => &[("Valid Product Types", "type_name")],
        _ => &[],
    }
}

/// Schema provider: owns the database handle and the process-scoped schema
/// cache populated once at open time. The cache is read-only for the life
/// of the connection and torn down with it; it is never partially
/// refreshed.
pub struct SchemaProvider {
    db: Database,
    schemas: HashMap<String, TableSchema>,
}

impl SchemaProvider {
    /// Open an existing database and preload schemas for every table.
    pub async fn open(path: &std::path::Path) -> Result<Self> {
        let db = Database::open(path).await?;
        Self::with_database(db).await
    }

    /// Wrap an already-open database and preload schemas.
    pub async fn with_database(db: Database) -> Result<Self> {
        let mut provider = Self {
            db,
            schemas: HashMap::new(),
        };
        provider.schemas = provider.all_schemas().await?;
        tracing::debug!(tables = provider.schemas.len(), "schema cache populated");
        Ok(provider)
    }

    /// Access the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Names of all cached tables.
    pub fn cached_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Close the connection, discarding the cache with it.
    pub async fn close(self) {
        self.db.close().await;
    }

    /// Introspect a single table from the live catalog.
    ///
    /// Returns `Error::NotFound` for a nonexistent table; the tool boundary
    /// renders that as an error line instead of raising.
    pub async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        if !self.db.table_exists(table).await? {
            return Err(Error::NotFound(format!("Table '{table}' not found")));
        }

        let column_rows = sqlx::query(&format!("PRAGMA table_info({table})"))
            .fetch_all(self.db.pool())
            .await?;

        let mut columns = Vec::with_capacity(column_rows.len());
        for row in &column_rows {
            columns.push(ColumnInfo {
                name: row.try_get("name")?,
                declared_type: row.try_get("type")?,
                is_primary_key: row.try_get::<i64, _>("pk")? != 0,
                is_required: row.try_get::<i64, _>("notnull")? != 0,
                default_value: row.try_get("dflt_value")?,
            });
        }

        let fk_rows = sqlx::query(&format!("PRAGMA foreign_key_list({table})"))
            .fetch_all(self.db.pool())
            .await?;

        let mut foreign_keys = Vec::with_capacity(fk_rows.len());
        for row in &fk_rows {
            let column: String = row.try_get("from")?;
            let references_table: String = row.try_get("table")?;
            // "to" is NULL when the FK references the target's implicit
            // primary key.
            let references_column = row
                .try_get::<Option<String>, _>("to")?
                .unwrap_or_else(|| column.clone());
            foreign_keys.push(ForeignKeyInfo {
                relationship: infer_relationship(&references_table),
                column,
                references_table,
                references_column,
            });
        }

        let domains = self.collect_domains(table).await?;

        Ok(TableSchema {
            name: table.to_string(),
            description: format!("Table containing {table} data"),
            columns,
            foreign_keys,
            domains,
        })
    }

    /// Enumerated and summarized value domains for a table.
    async fn collect_domains(&self, table: &str) -> Result<Vec<Domain>> {
        let mut domains = Vec::new();

        for (label, column) in enumerated_columns(table) {
            // A failed distinct-value query (e.g. column absent in a
            // variant catalog) records an empty domain instead of failing
            // the whole introspection.
            let values = self
                .db
                .distinct_values(table, column)
                .await
                .unwrap_or_default();
            domains.push(Domain {
                label,
                values: DomainValues::Values(values),
            });
        }

        if table == "products"
            && let Ok(Some((min, max))) = self.db.numeric_range(table, "base_price").await
        {
            domains.push(Domain {
                label: "Price Range",
                values: DomainValues::Summary(format!("${min:.2} - ${max:.2}")),
            });
        }

        if table == "orders" {
            let years = self
                .db
                .distinct_years(table, "order_date")
                .await
                .unwrap_or_default();
            if !years.is_empty() {
                domains.push(Domain {
                    label: "Available Years",
                    values: DomainValues::Summary(years.join(", ")),
                });
            }
        }

        Ok(domains)
    }

    /// Introspect every user-defined table.
    pub async fn all_schemas(&self) -> Result<HashMap<String, TableSchema>> {
        let mut schemas = HashMap::new();
        for name in self.db.table_names().await? {
            let schema = self.table_schema(&name).await?;
            schemas.insert(name, schema);
        }
        Ok(schemas)
    }

    /// Rendered schema metadata for one table, served from the cache when
    /// populated, else introspected fresh. Errors render as an `**ERROR:**`
    /// line so the string is always usable as a tool result.
    pub async fn table_metadata_string(&self, table: &str, display_cap: usize) -> String {
        if let Some(schema) = self.schemas.get(table) {
            return render_for_model(schema, display_cap);
        }
        match self.table_schema(table).await {
            Ok(schema) => render_for_model(&schema, display_cap),
            Err(Error::NotFound(msg)) => format!("**ERROR:** {msg}\n"),
            Err(err) => format!("**ERROR:** {err}\n"),
        }
    }
}

/// Render a table schema into deterministic model-facing text.
///
/// The output is a pure function of the schema value: same schema, same
/// bytes. Domains longer than `display_cap` are truncated with their total
/// count so prompts stay bounded.
pub fn render_for_model(schema: &TableSchema, display_cap: usize) -> String {
    let mut lines = vec![format!("# Table: {}", schema.name), String::new()];

    lines.push(format!("**Purpose:** {}", schema.description));
    lines.push("\n## Schema".to_string());
    lines.push(
        schema
            .columns
            .iter()
            .map(|col| format!("{}:{}", col.name, col.declared_type))
            .collect::<Vec<_>>()
            .join(", "),
    );

    if !schema.foreign_keys.is_empty() {
        lines.push("\n## Relationships".to_string());
        for fk in &schema.foreign_keys {
            lines.push(format!(
                "- `{}` → `{}.{}` ({})",
                fk.column,
                fk.references_table,
                fk.references_column,
                fk.relationship.as_str()
            ));
        }
    }

    let mut domain_lines = Vec::new();
    for domain in &schema.domains {
        match &domain.values {
            DomainValues::Values(values) if values.is_empty() => {}
            DomainValues::Values(values) if values.len() > display_cap => {
                domain_lines.push(format!(
                    "**{}:** {}, ... [{} total options]",
                    domain.label,
                    values[..display_cap].join(", "),
                    values.len()
                ));
            }
            DomainValues::Values(values) => {
                domain_lines.push(format!("**{}:** {}", domain.label, values.join(", ")));
            }
            DomainValues::Summary(summary) => {
                domain_lines.push(format!("**{}:** {}", domain.label, summary));
            }
        }
    }
    if !domain_lines.is_empty() {
        lines.push("\n## Valid Values".to_string());
        lines.extend(domain_lines);
    }

    lines.push("\n## Query Hints".to_string());
    lines.push(format!(
        "- Use `{}` for queries about {}",
        schema.name,
        schema.name.replace('_', " ")
    ));
    for fk in &schema.foreign_keys {
        lines.push(format!(
            "- Join with `{}` using `{}`",
            fk.references_table, fk.column
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

//! Synthetic sales database generator.
//!
//! Builds the normalized retail catalog the agent is pointed at: stores,
//! categories, product types, products, customers, orders, order items and
//! per-store inventory. Generation is deterministic (fixed reference data,
//! index arithmetic) so seeded databases are reproducible across runs and
//! usable as test fixtures.

use std::path::Path;

use chrono::{Days, NaiveDate};

use crate::db::Database;
use crate::error::{Error, Result};

/// DDL for the sales catalog.
const SCHEMA: &str = r#"
CREATE TABLE stores (
    store_id INTEGER PRIMARY KEY,
    store_name TEXT NOT NULL UNIQUE
);

CREATE TABLE categories (
    category_id INTEGER PRIMARY KEY,
    category_name TEXT NOT NULL UNIQUE
);

CREATE TABLE product_types (
    type_id INTEGER PRIMARY KEY,
    category_id INTEGER NOT NULL,
    type_name TEXT NOT NULL,
    FOREIGN KEY (category_id) REFERENCES categories (category_id)
);

CREATE TABLE products (
    product_id INTEGER PRIMARY KEY,
    sku TEXT NOT NULL UNIQUE,
    product_name TEXT NOT NULL,
    category_id INTEGER NOT NULL,
    type_id INTEGER NOT NULL,
    base_price REAL NOT NULL,
    product_description TEXT NOT NULL,
    FOREIGN KEY (category_id) REFERENCES categories (category_id),
    FOREIGN KEY (type_id) REFERENCES product_types (type_id)
);

CREATE TABLE customers (
    customer_id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    region TEXT
);

CREATE TABLE orders (
    order_id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL,
    store_id INTEGER NOT NULL,
    order_date DATE NOT NULL,
    FOREIGN KEY (customer_id) REFERENCES customers (customer_id),
    FOREIGN KEY (store_id) REFERENCES stores (store_id)
);

CREATE TABLE order_items (
    order_item_id INTEGER PRIMARY KEY,
    order_id INTEGER NOT NULL,
    product_id INTEGER NOT NULL,
    quantity INTEGER NOT NULL,
    unit_price REAL NOT NULL,
    discount_percent INTEGER DEFAULT 0,
    discount_amount REAL DEFAULT 0,
    total_amount REAL NOT NULL,
    FOREIGN KEY (order_id) REFERENCES orders (order_id),
    FOREIGN KEY (product_id) REFERENCES products (product_id)
);

CREATE TABLE inventory (
    store_id INTEGER NOT NULL,
    product_id INTEGER NOT NULL,
    stock_level INTEGER NOT NULL,
    PRIMARY KEY (store_id, product_id),
    FOREIGN KEY (store_id) REFERENCES stores (store_id),
    FOREIGN KEY (product_id) REFERENCES products (product_id)
);

CREATE INDEX idx_orders_customer_date ON orders (customer_id, order_date);
CREATE INDEX idx_order_items_order ON order_items (order_id);
CREATE INDEX idx_order_items_product ON order_items (product_id);
CREATE INDEX idx_products_category ON products (category_id);
"#;

const REGIONS: &[&str] = &[
    "AFRICA",
    "ASIA-PACIFIC",
    "CHINA",
    "EUROPE",
    "LATIN AMERICA",
    "MIDDLE EAST",
    "NORTH AMERICA",
];

const STORES: &[&str] = &[
    "Downtown Flagship",
    "Eastside Mall",
    "Harbor Point",
    "Northgate",
    "Online Store",
    "Riverside",
];

/// Category name, SKU prefix, product types.
const CATALOG: &[(&str, &str, &[&str])] = &[
    ("Hand Tools", "HT", &["Hammers", "Screwdrivers", "Wrenches", "Pliers"]),
    ("Power Tools", "PT", &["Drills", "Saws", "Sanders"]),
    ("Paint & Supplies", "PS", &["Interior Paint", "Exterior Paint", "Brushes & Rollers"]),
    ("Electrical", "EL", &["Wiring", "Lighting", "Outlets & Switches"]),
    ("Garden & Outdoor", "GO", &["Lawn Care", "Planters", "Outdoor Power"]),
];

const PRODUCT_GRADES: &[&str] = &["Standard", "Pro", "Heavy-Duty"];

const FIRST_NAMES: &[&str] = &[
    "Ava", "Ben", "Carla", "Diego", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonas", "Keiko",
    "Liam", "Mara", "Nadia", "Omar", "Priya", "Quinn", "Rosa", "Sam", "Tomas",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Bauer", "Chen", "Diallo", "Eriksen", "Fujita", "Garcia", "Haddad", "Ivanova",
    "Jensen", "Kowalski", "Larsen", "Moreau", "Nakamura", "Okafor", "Park", "Quintero", "Rossi",
    "Silva", "Tanaka",
];

/// Knobs for the generator.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub customers: usize,
    pub orders: usize,
    pub force: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            customers: 200,
            orders: 1000,
            force: false,
        }
    }
}

/// Row counts produced by a seeding run.
#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub stores: usize,
    pub categories: usize,
    pub product_types: usize,
    pub products: usize,
    pub customers: usize,
    pub orders: usize,
    pub order_items: usize,
}

/// Generate the sales database at the given path.
pub async fn seed_database(path: &Path, opts: &SeedOptions) -> Result<SeedSummary> {
    if path.exists() {
        if !opts.force {
            return Err(Error::Config(format!(
                "{} already exists (pass --force to regenerate)",
                path.display()
            )));
        }
        std::fs::remove_file(path)?;
    }

    let db = Database::create(path).await?;
    sqlx::raw_sql(SCHEMA).execute(db.pool()).await?;

    let mut tx = db.pool().begin().await?;

    for (idx, name) in STORES.iter().enumerate() {
        sqlx::query("INSERT INTO stores (store_id, store_name) VALUES (?, ?)")
            .bind(idx as i64 + 1)
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    // Categories and their product types, numbered in catalog order.
    let mut type_rows: Vec<(i64, i64, &str, &str)> = Vec::new();
    for (cat_idx, (category, prefix, types)) in CATALOG.iter().enumerate() {
        let category_id = cat_idx as i64 + 1;
        sqlx::query("INSERT INTO categories (category_id, category_name) VALUES (?, ?)")
            .bind(category_id)
            .bind(category)
            .execute(&mut *tx)
            .await?;

        for type_name in *types {
            let type_id = type_rows.len() as i64 + 1;
            sqlx::query(
                "INSERT INTO product_types (type_id, category_id, type_name) VALUES (?, ?, ?)",
            )
            .bind(type_id)
            .bind(category_id)
            .bind(type_name)
            .execute(&mut *tx)
            .await?;
            type_rows.push((type_id, category_id, type_name, prefix));
        }
    }

    // One product per grade per type. Prices are kept around so order
    // lines can reference them without re-querying.
    let mut prices: Vec<f64> = Vec::new();
    for (type_id, category_id, type_name, prefix) in &type_rows {
        for (grade_idx, grade) in PRODUCT_GRADES.iter().enumerate() {
            let product_id = prices.len() as i64 + 1;
            let sku = format!("{prefix}{type_id:02}{:04}", grade_idx + 1);
            let base_price = 4.0 + ((product_id * 7 + grade_idx as i64 * 23) % 200) as f64 * 0.5;
            sqlx::query(
                "INSERT INTO products \
                 (product_id, sku, product_name, category_id, type_id, base_price, product_description) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(product_id)
            .bind(&sku)
            .bind(format!("{grade} {}", singular(type_name)))
            .bind(category_id)
            .bind(type_id)
            .bind(base_price)
            .bind(format!("{grade} grade item from the {type_name} range"))
            .execute(&mut *tx)
            .await?;
            prices.push(base_price);
        }
    }
    let product_count = prices.len();

    for i in 0..opts.customers {
        let first = FIRST_NAMES[i % FIRST_NAMES.len()];
        let last = LAST_NAMES[(i / FIRST_NAMES.len() + i) % LAST_NAMES.len()];
        let region = REGIONS[(i * 3 + 1) % REGIONS.len()];
        sqlx::query(
            "INSERT INTO customers (customer_id, first_name, last_name, email, phone, region) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(i as i64 + 1)
        .bind(first)
        .bind(last)
        .bind(format!(
            "{}.{}{}@example.com",
            first.to_lowercase(),
            last.to_lowercase(),
            i + 1
        ))
        .bind(format!(
            "+1-{}-{}-{:04}",
            200 + (i * 13) % 700,
            200 + (i * 31) % 700,
            1000 + (i * 97) % 9000
        ))
        .bind(region)
        .execute(&mut *tx)
        .await?;
    }

    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default();
    let mut order_items = 0usize;
    for i in 0..opts.orders {
        let order_id = i as i64 + 1;
        let customer_id = (i * 17) % opts.customers.max(1) + 1;
        let store_id = (i * 5) % STORES.len() + 1;
        let order_date = start
            .checked_add_days(Days::new(((i * 19) % (3 * 365)) as u64))
            .unwrap_or(start);

        sqlx::query(
            "INSERT INTO orders (order_id, customer_id, store_id, order_date) VALUES (?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(customer_id as i64)
        .bind(store_id as i64)
        .bind(order_date.format("%Y-%m-%d").to_string())
        .execute(&mut *tx)
        .await?;

        let line_count = i % 3 + 1;
        for line in 0..line_count {
            let product_id = (i * 11 + line * 7) % product_count.max(1) + 1;
            let quantity = (i + line) % 5 + 1;
            let unit_price = prices.get(product_id - 1).copied().unwrap_or(4.0);
            let discount_percent = [0i64, 0, 5, 10][(i + line) % 4];
            let gross = unit_price * quantity as f64;
            let discount_amount = gross * discount_percent as f64 / 100.0;
            sqlx::query(
                "INSERT INTO order_items \
                 (order_item_id, order_id, product_id, quantity, unit_price, \
                  discount_percent, discount_amount, total_amount) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(order_items as i64 + 1)
            .bind(order_id)
            .bind(product_id as i64)
            .bind(quantity as i64)
            .bind(unit_price)
            .bind(discount_percent)
            .bind(discount_amount)
            .bind(gross - discount_amount)
            .execute(&mut *tx)
            .await?;
            order_items += 1;
        }
    }

    for store_id in 1..=STORES.len() {
        for product_id in 1..=product_count {
            sqlx::query(
                "INSERT INTO inventory (store_id, product_id, stock_level) VALUES (?, ?, ?)",
            )
            .bind(store_id as i64)
            .bind(product_id as i64)
            .bind(((store_id * 37 + product_id * 13) % 95 + 5) as i64)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    db.close().await;

    Ok(SeedSummary {
        stores: STORES.len(),
        categories: CATALOG.len(),
        product_types: type_rows.len(),
        products: product_count,
        customers: opts.customers,
        orders: opts.orders,
        order_items,
    })
}

/// Rough singular form of a product-type name for product naming. Sibilant
/// plurals (Brushes, Wrenches) drop "es", everything else drops a plain "s".
fn singular(type_name: &str) -> String {
    let base = type_name.split(" & ").next().unwrap_or(type_name);
    if let Some(stem) = base.strip_suffix("es")
        && (stem.ends_with("ch") || stem.ends_with("sh") || stem.ends_with('x'))
    {
        return stem.to_string();
    }
    base.strip_suffix('s').unwrap_or(base).to_string()
}

#[cfg(test)]
#[path = "seed_tests.rs"]
mod tests;

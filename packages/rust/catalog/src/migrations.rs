//! SQL migration definitions for the catalog database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: products, categories, pictures, attributes, seeds",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Catalog products
CREATE TABLE IF NOT EXISTS products (
    id                         TEXT PRIMARY KEY,
    name                       TEXT NOT NULL,
    description                TEXT NOT NULL DEFAULT '',
    layout_id                  TEXT NOT NULL,
    published                  INTEGER NOT NULL DEFAULT 0,
    show_on_home_page          INTEGER NOT NULL DEFAULT 0,
    visible_individually       INTEGER NOT NULL DEFAULT 1,
    allow_customer_reviews     INTEGER NOT NULL DEFAULT 1,
    manage_stock_by_attributes INTEGER NOT NULL DEFAULT 1,
    display_stock_quantity     INTEGER NOT NULL DEFAULT 1,
    price                      REAL NOT NULL,
    product_cost               REAL NOT NULL,
    catalog_price              REAL NOT NULL,
    min_entered_price          REAL NOT NULL,
    max_entered_price          REAL NOT NULL,
    stock_quantity             INTEGER NOT NULL,
    order_minimum_quantity     INTEGER NOT NULL,
    order_maximum_quantity     INTEGER NOT NULL,
    display_order              INTEGER NOT NULL DEFAULT 1,
    created_at                 TEXT NOT NULL
);

-- Category hierarchy; external_id carries the marketplace's category id and
-- is the reconciliation key across import runs
CREATE TABLE IF NOT EXISTS categories (
    id                        TEXT PRIMARY KEY,
    name                      TEXT NOT NULL,
    parent_id                 TEXT REFERENCES categories(id),
    external_id               INTEGER,
    layout_id                 TEXT NOT NULL,
    published                 INTEGER NOT NULL DEFAULT 1,
    include_in_menu           INTEGER NOT NULL DEFAULT 1,
    allow_page_size_selection INTEGER NOT NULL DEFAULT 1,
    page_size                 INTEGER NOT NULL DEFAULT 10,
    page_size_options         TEXT NOT NULL DEFAULT '10,15,20',
    picture_id                TEXT,
    created_at                TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_external ON categories(external_id);
CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);

-- Product ↔ category associations
CREATE TABLE IF NOT EXISTS product_categories (
    product_id  TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    category_id TEXT NOT NULL REFERENCES categories(id),
    featured    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (product_id, category_id)
);

-- Key/value metadata on products (import provenance)
CREATE TABLE IF NOT EXISTS product_user_fields (
    product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    key        TEXT NOT NULL,
    value      TEXT NOT NULL,
    PRIMARY KEY (product_id, key)
);

-- Picture assets; alt doubles as the source-URL lookup key
CREATE TABLE IF NOT EXISTS pictures (
    id           TEXT PRIMARY KEY,
    alt          TEXT NOT NULL,
    mime_type    TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    data         BLOB NOT NULL,
    created_at   TEXT NOT NULL
);

-- Product gallery with ordering
CREATE TABLE IF NOT EXISTS product_pictures (
    product_id    TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    picture_id    TEXT NOT NULL REFERENCES pictures(id),
    display_order INTEGER NOT NULL,
    PRIMARY KEY (product_id, picture_id)
);

-- Reusable attribute definitions
CREATE TABLE IF NOT EXISTS attributes (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

-- Attribute ↔ product bindings
CREATE TABLE IF NOT EXISTS attribute_mappings (
    id            TEXT PRIMARY KEY,
    product_id    TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    attribute_id  TEXT NOT NULL REFERENCES attributes(id),
    control_type  TEXT NOT NULL,
    is_required   INTEGER NOT NULL DEFAULT 1,
    display_order INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_mappings_product ON attribute_mappings(product_id);

-- Selectable values under a mapping
CREATE TABLE IF NOT EXISTS attribute_values (
    id               TEXT PRIMARY KEY,
    mapping_id       TEXT NOT NULL REFERENCES attribute_mappings(id) ON DELETE CASCADE,
    name             TEXT NOT NULL,
    picture_id       TEXT,
    display_order    INTEGER NOT NULL,
    price_adjustment REAL NOT NULL DEFAULT 0,
    quantity         INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_values_mapping ON attribute_values(mapping_id);

-- Purchasable combinations; pairs stored as JSON [(mapping_id, value_id)]
CREATE TABLE IF NOT EXISTS attribute_combinations (
    id               TEXT PRIMARY KEY,
    product_id       TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    pairs_json       TEXT NOT NULL,
    stock_quantity   INTEGER NOT NULL,
    overridden_price REAL NOT NULL,
    picture_id       TEXT
);

CREATE INDEX IF NOT EXISTS idx_combinations_product ON attribute_combinations(product_id);

-- Well-known attribute definitions reused across imports
INSERT INTO attributes (id, name) VALUES ('attr-color', 'Color');
INSERT INTO attributes (id, name) VALUES ('attr-size', 'Size');
INSERT INTO attributes (id, name) VALUES ('attr-ships-from', 'Ships From');

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}

//! Database schema definitions using sea-query.
//!
//! Table and column identifiers for type-safe query building, plus the DDL
//! for each of the four schema variants.

use sea_query::Iden;

/// The four layouts of the sales data, from operational to reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVariant {
    /// Denormalized operational schema (`customer_info`, `products`, `sales`).
    Raw,
    /// Third normal form schema.
    Normalized,
    /// Fact table with four dimensions.
    Star,
    /// Flattened, pre-joined reporting table.
    Reporting,
}

impl SchemaVariant {
    /// All variants in dependency order.
    pub const ALL: [SchemaVariant; 4] = [
        SchemaVariant::Raw,
        SchemaVariant::Normalized,
        SchemaVariant::Star,
        SchemaVariant::Reporting,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SchemaVariant::Raw => "raw",
            SchemaVariant::Normalized => "3nf",
            SchemaVariant::Star => "star",
            SchemaVariant::Reporting => "reporting",
        }
    }

    /// DDL script creating this variant's tables and indexes.
    pub fn ddl(self) -> &'static str {
        match self {
            SchemaVariant::Raw => CREATE_RAW_SCHEMA,
            SchemaVariant::Normalized => CREATE_NORMALIZED_SCHEMA,
            SchemaVariant::Star => CREATE_STAR_SCHEMA,
            SchemaVariant::Reporting => CREATE_REPORTING_SCHEMA,
        }
    }

    /// Tables owned by this variant, parents before children.
    pub fn tables(self) -> &'static [&'static str] {
        match self {
            SchemaVariant::Raw => &["customer_info", "products", "sales"],
            SchemaVariant::Normalized => &[
                "locations",
                "customers",
                "product_categories",
                "products_3nf",
                "sales_3nf",
            ],
            SchemaVariant::Star => &[
                "dim_customer",
                "dim_product",
                "dim_location",
                "dim_date",
                "fact_sales",
            ],
            SchemaVariant::Reporting => &["sales_reporting_denorm"],
        }
    }

    /// Whether the engine enforces referential integrity for this variant.
    pub fn enforces_foreign_keys(self) -> bool {
        !matches!(self, SchemaVariant::Reporting)
    }
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Raw operational schema
// =============================================================================

#[derive(Iden)]
pub enum CustomerInfo {
    Table,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "full_name"]
    FullName,
    #[iden = "location"]
    Location,
}

/// Raw products. `customer_id` ties a product to a single customer, which
/// the 3NF layout drops in favour of a category.
#[derive(Iden)]
pub enum Products {
    Table,
    #[iden = "product_id"]
    ProductId,
    #[iden = "product_name"]
    ProductName,
    #[iden = "price"]
    Price,
    #[iden = "customer_id"]
    CustomerId,
}

#[derive(Iden)]
pub enum Sales {
    Table,
    #[iden = "sales_id"]
    SalesId,
    #[iden = "total_sales"]
    TotalSales,
    #[iden = "quantity"]
    Quantity,
    #[iden = "product_id"]
    ProductId,
    #[iden = "customer_id"]
    CustomerId,
}

// =============================================================================
// Normalized (3NF) schema
// =============================================================================

#[derive(Iden)]
pub enum Locations {
    Table,
    #[iden = "location_id"]
    LocationId,
    #[iden = "name"]
    Name,
    #[iden = "region"]
    Region,
    #[iden = "country"]
    Country,
}

#[derive(Iden)]
pub enum Customers {
    Table,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "full_name"]
    FullName,
    #[iden = "location_id"]
    LocationId,
}

#[derive(Iden)]
pub enum ProductCategories {
    Table,
    #[iden = "category_id"]
    CategoryId,
    #[iden = "name"]
    Name,
}

#[derive(Iden)]
pub enum Products3nf {
    #[iden = "products_3nf"]
    Table,
    #[iden = "product_id"]
    ProductId,
    #[iden = "product_name"]
    ProductName,
    #[iden = "category_id"]
    CategoryId,
    #[iden = "unit_price"]
    UnitPrice,
    #[iden = "unit_cost"]
    UnitCost,
}

#[derive(Iden)]
pub enum Sales3nf {
    #[iden = "sales_3nf"]
    Table,
    #[iden = "sale_id"]
    SaleId,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "product_id"]
    ProductId,
    #[iden = "quantity"]
    Quantity,
    #[iden = "unit_price"]
    UnitPrice,
    #[iden = "total_amount"]
    TotalAmount,
    #[iden = "sold_at"]
    SoldAt,
}

// =============================================================================
// Star schema
// =============================================================================

#[derive(Iden)]
pub enum DimDate {
    Table,
    #[iden = "date_key"]
    DateKey,
    #[iden = "full_date"]
    FullDate,
    #[iden = "day"]
    Day,
    #[iden = "month"]
    Month,
    #[iden = "month_name"]
    MonthName,
    #[iden = "quarter"]
    Quarter,
    #[iden = "year"]
    Year,
    #[iden = "day_of_week"]
    DayOfWeek,
}

#[derive(Iden)]
pub enum FactSales {
    Table,
    #[iden = "sale_id"]
    SaleId,
    #[iden = "customer_key"]
    CustomerKey,
    #[iden = "product_key"]
    ProductKey,
    #[iden = "location_key"]
    LocationKey,
    #[iden = "date_key"]
    DateKey,
    #[iden = "quantity"]
    Quantity,
    #[iden = "unit_price"]
    UnitPrice,
    #[iden = "total_amount"]
    TotalAmount,
    #[iden = "cost"]
    Cost,
    #[iden = "profit"]
    Profit,
}

// =============================================================================
// Reporting table
// =============================================================================

#[derive(Iden)]
pub enum SalesReportingDenorm {
    Table,
    #[iden = "sale_id"]
    SaleId,
    #[iden = "sold_at"]
    SoldAt,
    #[iden = "sale_month"]
    SaleMonth,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "customer_name"]
    CustomerName,
    #[iden = "location_name"]
    LocationName,
    #[iden = "region"]
    Region,
    #[iden = "country"]
    Country,
    #[iden = "product_id"]
    ProductId,
    #[iden = "product_name"]
    ProductName,
    #[iden = "category_name"]
    CategoryName,
    #[iden = "quantity"]
    Quantity,
    #[iden = "unit_price"]
    UnitPrice,
    #[iden = "total_amount"]
    TotalAmount,
    #[iden = "cost"]
    Cost,
    #[iden = "profit"]
    Profit,
    #[iden = "profit_margin"]
    ProfitMargin,
    #[iden = "monthly_rank"]
    MonthlyRank,
}

// =============================================================================
// DDL
// =============================================================================

/// SQL for creating the raw operational schema.
pub const CREATE_RAW_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS customer_info (
    customer_id INTEGER PRIMARY KEY,
    full_name TEXT NOT NULL,
    location TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    product_id INTEGER PRIMARY KEY,
    product_name TEXT NOT NULL,
    price REAL NOT NULL,
    customer_id INTEGER REFERENCES customer_info(customer_id)
);

CREATE TABLE IF NOT EXISTS sales (
    sales_id INTEGER PRIMARY KEY,
    total_sales REAL NOT NULL,
    quantity INTEGER NOT NULL,
    product_id INTEGER NOT NULL REFERENCES products(product_id),
    customer_id INTEGER NOT NULL REFERENCES customer_info(customer_id)
);
"#;

/// SQL for creating the 3NF schema.
pub const CREATE_NORMALIZED_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS locations (
    location_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    region TEXT NOT NULL,
    country TEXT NOT NULL,
    UNIQUE (name, country)
);

CREATE TABLE IF NOT EXISTS customers (
    customer_id INTEGER PRIMARY KEY,
    full_name TEXT NOT NULL,
    location_id INTEGER NOT NULL REFERENCES locations(location_id)
);

CREATE TABLE IF NOT EXISTS product_categories (
    category_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS products_3nf (
    product_id INTEGER PRIMARY KEY,
    product_name TEXT NOT NULL,
    category_id INTEGER NOT NULL REFERENCES product_categories(category_id),
    unit_price REAL NOT NULL,
    unit_cost REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS sales_3nf (
    sale_id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL REFERENCES customers(customer_id),
    product_id INTEGER NOT NULL REFERENCES products_3nf(product_id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price REAL NOT NULL,
    total_amount REAL NOT NULL,
    sold_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sales_3nf_customer ON sales_3nf(customer_id);
CREATE INDEX IF NOT EXISTS idx_sales_3nf_product ON sales_3nf(product_id);
"#;

/// SQL for creating the star schema.
pub const CREATE_STAR_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS dim_customer (
    customer_key INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    location_name TEXT NOT NULL,
    region TEXT NOT NULL,
    country TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_product (
    product_key INTEGER PRIMARY KEY,
    product_id INTEGER NOT NULL UNIQUE,
    product_name TEXT NOT NULL,
    category_name TEXT NOT NULL,
    unit_price REAL NOT NULL,
    unit_cost REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_location (
    location_key INTEGER PRIMARY KEY,
    location_id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    region TEXT NOT NULL,
    country TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_date (
    date_key INTEGER PRIMARY KEY,
    full_date TEXT NOT NULL UNIQUE,
    day INTEGER NOT NULL,
    month INTEGER NOT NULL,
    month_name TEXT NOT NULL,
    quarter INTEGER NOT NULL,
    year INTEGER NOT NULL,
    day_of_week TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fact_sales (
    sale_key INTEGER PRIMARY KEY,
    sale_id INTEGER NOT NULL UNIQUE,
    customer_key INTEGER NOT NULL REFERENCES dim_customer(customer_key),
    product_key INTEGER NOT NULL REFERENCES dim_product(product_key),
    location_key INTEGER NOT NULL REFERENCES dim_location(location_key),
    date_key INTEGER NOT NULL REFERENCES dim_date(date_key),
    quantity INTEGER NOT NULL,
    unit_price REAL NOT NULL,
    total_amount REAL NOT NULL,
    cost REAL NOT NULL,
    profit REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fact_sales_date ON fact_sales(date_key);
CREATE INDEX IF NOT EXISTS idx_fact_sales_customer ON fact_sales(customer_key);
CREATE INDEX IF NOT EXISTS idx_fact_sales_product ON fact_sales(product_key);
"#;

/// SQL for creating the flattened reporting table.
///
/// No foreign keys: rows are copies, and writes are not checked against
/// the normalized source.
pub const CREATE_REPORTING_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sales_reporting_denorm (
    sale_id INTEGER PRIMARY KEY,
    sold_at TEXT NOT NULL,
    sale_month TEXT NOT NULL,
    customer_id INTEGER NOT NULL,
    customer_name TEXT NOT NULL,
    location_name TEXT NOT NULL,
    region TEXT NOT NULL,
    country TEXT NOT NULL,
    product_id INTEGER NOT NULL,
    product_name TEXT NOT NULL,
    category_name TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    unit_price REAL NOT NULL,
    total_amount REAL NOT NULL,
    cost REAL NOT NULL,
    profit REAL NOT NULL,
    profit_margin REAL NOT NULL,
    monthly_rank INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reporting_region_month
    ON sales_reporting_denorm(region, sale_month);
CREATE INDEX IF NOT EXISTS idx_reporting_category_month
    ON sales_reporting_denorm(category_name, sale_month);
CREATE INDEX IF NOT EXISTS idx_reporting_customer_sold_at
    ON sales_reporting_denorm(customer_id, sold_at);
"#;

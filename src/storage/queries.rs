//! SQL text of the exercise queries, loaders and reports.
//!
//! Shared by the SQLite store and the exercise catalogue so that the text a
//! reader sees is the text that runs. Simple filters are built with
//! sea-query; window, CTE and recursive queries are written out.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::schema::{CustomerInfo, Products, Sales};

/// Q1: customers in one location.
pub fn customers_in_location(location: &str) -> String {
    Query::select()
        .columns([
            CustomerInfo::CustomerId,
            CustomerInfo::FullName,
            CustomerInfo::Location,
        ])
        .from(CustomerInfo::Table)
        .and_where(Expr::col(CustomerInfo::Location).eq(location))
        .order_by(CustomerInfo::CustomerId, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// Q2: sales with customer and product names.
pub const SALES_DETAILS: &str = r#"
SELECT s.sales_id, c.full_name AS customer_name, p.product_name, s.quantity, s.total_sales
FROM sales s
JOIN customer_info c ON c.customer_id = s.customer_id
JOIN products p ON p.product_id = s.product_id
ORDER BY s.sales_id
"#;

/// Q3: summed sales per customer.
pub const CUSTOMER_TOTALS: &str = r#"
SELECT c.customer_id, c.full_name, SUM(s.total_sales) AS customer_total
FROM customer_info c
JOIN sales s ON s.customer_id = c.customer_id
GROUP BY c.customer_id, c.full_name
ORDER BY customer_total DESC, c.customer_id
"#;

/// Q4: products whose summed quantity reaches a minimum. Binds the minimum.
pub const PRODUCTS_WITH_MIN_QUANTITY: &str = r#"
SELECT p.product_id, p.product_name, SUM(s.quantity) AS total_quantity
FROM products p
JOIN sales s ON s.product_id = p.product_id
GROUP BY p.product_id, p.product_name
HAVING SUM(s.quantity) >= ?
ORDER BY total_quantity DESC, p.product_id
"#;

/// Q5: the largest customer totals. Binds the row limit.
pub const TOP_CUSTOMERS: &str = r#"
SELECT c.customer_id, c.full_name, SUM(s.total_sales) AS customer_total
FROM customer_info c
JOIN sales s ON s.customer_id = c.customer_id
GROUP BY c.customer_id, c.full_name
ORDER BY customer_total DESC, c.customer_id
LIMIT ?
"#;

/// Q6: customers above the mean customer total.
pub const CUSTOMERS_ABOVE_AVERAGE: &str = r#"
WITH customer_totals AS (
    SELECT c.customer_id, c.full_name, SUM(s.total_sales) AS customer_total
    FROM customer_info c
    JOIN sales s ON s.customer_id = c.customer_id
    GROUP BY c.customer_id, c.full_name
)
SELECT customer_id, full_name, customer_total
FROM customer_totals
WHERE customer_total > (SELECT AVG(customer_total) FROM customer_totals)
ORDER BY customer_total DESC, customer_id
"#;

/// Q7: products ranked by sales. `rank` is quoted: it is a reserved word in
/// several dialects.
pub const PRODUCT_SALES_RANK: &str = r#"
SELECT p.product_id, p.product_name, SUM(s.total_sales) AS product_total,
       RANK() OVER (ORDER BY SUM(s.total_sales) DESC) AS "rank"
FROM products p
JOIN sales s ON s.product_id = p.product_id
GROUP BY p.product_id, p.product_name
ORDER BY "rank", p.product_id
"#;

/// Q8: name of the view over high-spending customers.
pub const HIGH_VALUE_VIEW: &str = "high_value_customers";

/// Q8: view definition. Views take no parameters, so the threshold is
/// rendered into the text.
pub fn create_high_value_view(threshold: f64) -> String {
    format!(
        r#"CREATE VIEW {HIGH_VALUE_VIEW} AS
SELECT c.customer_id, c.full_name, SUM(s.total_sales) AS customer_total
FROM customer_info c
JOIN sales s ON s.customer_id = c.customer_id
GROUP BY c.customer_id, c.full_name
HAVING SUM(s.total_sales) > {threshold:?}"#
    )
}

/// Q8: drop statement run before recreating the view.
pub const DROP_HIGH_VALUE_VIEW: &str = "DROP VIEW IF EXISTS high_value_customers";

/// Q8: reading the view.
pub const SELECT_HIGH_VALUE_VIEW: &str = r#"
SELECT customer_id, full_name, customer_total
FROM high_value_customers
ORDER BY customer_total DESC, customer_id
"#;

/// Q9: body of `get_customer_sales(IN p_customer_id)`.
pub const CUSTOMER_SALES_PROCEDURE_BODY: &str = r#"
SELECT sales_id, customer_id, product_id, quantity, total_sales
FROM sales
WHERE customer_id = ?1
ORDER BY sales_id
"#;

/// Q10: running total in `sales_id` order.
///
/// `ordered` numbers the sales by id, so the recursive step always lands on
/// the smallest id greater than the current one whatever the gaps.
pub const RUNNING_TOTALS: &str = r#"
WITH RECURSIVE ordered AS (
    SELECT sales_id, total_sales, ROW_NUMBER() OVER (ORDER BY sales_id) AS position
    FROM sales
),
running AS (
    SELECT position, sales_id, total_sales, total_sales AS running_total
    FROM ordered
    WHERE position = 1
    UNION ALL
    SELECT o.position, o.sales_id, o.total_sales, r.running_total + o.total_sales
    FROM running r
    JOIN ordered o ON o.position = r.position + 1
)
SELECT sales_id, total_sales, running_total
FROM running
ORDER BY sales_id
"#;

/// Q11: sales with an amount in `[min, max]`.
pub fn sales_in_amount_range(min: f64, max: f64) -> String {
    Query::select()
        .columns([
            Sales::SalesId,
            Sales::CustomerId,
            Sales::ProductId,
            Sales::Quantity,
            Sales::TotalSales,
        ])
        .from(Sales::Table)
        .and_where(Expr::col(Sales::TotalSales).between(min, max))
        .order_by(Sales::SalesId, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// Q12: products with no sale.
pub fn unsold_products() -> String {
    Query::select()
        .columns([
            (Products::Table, Products::ProductId),
            (Products::Table, Products::ProductName),
            (Products::Table, Products::Price),
        ])
        .from(Products::Table)
        .left_join(
            Sales::Table,
            Expr::col((Sales::Table, Sales::ProductId))
                .equals((Products::Table, Products::ProductId)),
        )
        .and_where(Expr::col((Sales::Table, Sales::SalesId)).is_null())
        .order_by((Products::Table, Products::ProductId), Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// Q13: sales contradicting the raw product "owner" column.
pub const OWNERSHIP_ANOMALIES: &str = r#"
SELECT s.sales_id, p.product_id, p.product_name,
       p.customer_id AS recorded_owner_id, s.customer_id AS buyer_id
FROM sales s
JOIN products p ON p.product_id = s.product_id
WHERE p.customer_id IS NOT NULL AND p.customer_id <> s.customer_id
ORDER BY s.sales_id
"#;

// =============================================================================
// Star schema
// =============================================================================

/// Clears facts before dimensions; facts reference them.
pub const CLEAR_STAR_SCHEMA: &str = r#"
DELETE FROM fact_sales;
DELETE FROM dim_customer;
DELETE FROM dim_product;
DELETE FROM dim_location;
DELETE FROM dim_date;
"#;

pub const LOAD_DIM_LOCATION: &str = r#"
INSERT INTO dim_location (location_id, name, region, country)
SELECT location_id, name, region, country
FROM locations
ORDER BY location_id
"#;

pub const LOAD_DIM_CUSTOMER: &str = r#"
INSERT INTO dim_customer (customer_id, full_name, location_name, region, country)
SELECT c.customer_id, c.full_name, l.name, l.region, l.country
FROM customers c
JOIN locations l ON l.location_id = c.location_id
ORDER BY c.customer_id
"#;

pub const LOAD_DIM_PRODUCT: &str = r#"
INSERT INTO dim_product (product_id, product_name, category_name, unit_price, unit_cost)
SELECT p.product_id, p.product_name, pc.name, p.unit_price, p.unit_cost
FROM products_3nf p
JOIN product_categories pc ON pc.category_id = p.category_id
ORDER BY p.product_id
"#;

/// Calendar days that have at least one sale.
pub const DISTINCT_SALE_DATES: &str = r#"
SELECT DISTINCT date(sold_at) AS sale_date
FROM sales_3nf
ORDER BY sale_date
"#;

/// Facts resolve natural keys to surrogate keys and derive cost and profit.
pub const LOAD_FACT_SALES: &str = r#"
INSERT INTO fact_sales (
    sale_id, customer_key, product_key, location_key, date_key,
    quantity, unit_price, total_amount, cost, profit
)
SELECT s.sale_id, dc.customer_key, dp.product_key, dl.location_key,
       CAST(strftime('%Y%m%d', s.sold_at) AS INTEGER),
       s.quantity, s.unit_price, s.total_amount,
       s.quantity * dp.unit_cost,
       s.total_amount - s.quantity * dp.unit_cost
FROM sales_3nf s
JOIN customers c ON c.customer_id = s.customer_id
JOIN dim_customer dc ON dc.customer_id = s.customer_id
JOIN dim_product dp ON dp.product_id = s.product_id
JOIN dim_location dl ON dl.location_id = c.location_id
ORDER BY s.sale_id
"#;

pub const MONTHLY_REVENUE_BY_REGION: &str = r#"
SELECT l.region, d.year, d.month, SUM(f.total_amount) AS revenue
FROM fact_sales f
JOIN dim_location l ON l.location_key = f.location_key
JOIN dim_date d ON d.date_key = f.date_key
GROUP BY l.region, d.year, d.month
ORDER BY d.year, d.month, revenue DESC, l.region
"#;

// =============================================================================
// Reporting table
// =============================================================================

pub const CLEAR_REPORTING: &str = "DELETE FROM sales_reporting_denorm";

/// Flattens the 3NF schema and precomputes margin and per-month rank.
pub const LOAD_REPORTING: &str = r#"
INSERT INTO sales_reporting_denorm (
    sale_id, sold_at, sale_month, customer_id, customer_name, location_name,
    region, country, product_id, product_name, category_name, quantity,
    unit_price, total_amount, cost, profit, profit_margin, monthly_rank
)
SELECT s.sale_id, s.sold_at, strftime('%Y-%m', s.sold_at),
       c.customer_id, c.full_name, l.name, l.region, l.country,
       p.product_id, p.product_name, pc.name,
       s.quantity, s.unit_price, s.total_amount,
       s.quantity * p.unit_cost,
       s.total_amount - s.quantity * p.unit_cost,
       CASE
           WHEN s.total_amount = 0 THEN 0.0
           ELSE ROUND((s.total_amount - s.quantity * p.unit_cost) / s.total_amount, 4)
       END,
       RANK() OVER (
           PARTITION BY strftime('%Y-%m', s.sold_at)
           ORDER BY s.total_amount DESC
       )
FROM sales_3nf s
JOIN customers c ON c.customer_id = s.customer_id
JOIN locations l ON l.location_id = c.location_id
JOIN products_3nf p ON p.product_id = s.product_id
JOIN product_categories pc ON pc.category_id = p.category_id
ORDER BY s.sale_id
"#;

pub const CATEGORY_PROFIT: &str = r#"
SELECT category_name, SUM(profit) AS total_profit, ROUND(AVG(profit_margin), 4) AS avg_margin
FROM sales_reporting_denorm
GROUP BY category_name
ORDER BY total_profit DESC, category_name
"#;

/// Binds the month (`YYYY-MM`) and the rank cut-off.
pub const TOP_SALES_IN_MONTH: &str = r#"
SELECT sale_id, sold_at, sale_month, customer_id, customer_name, location_name,
       region, country, product_id, product_name, category_name, quantity,
       unit_price, total_amount, cost, profit, profit_margin, monthly_rank
FROM sales_reporting_denorm
WHERE sale_month = ? AND monthly_rank <= ?
ORDER BY monthly_rank, sale_id
"#;

//! Record types read from and written to the sales schemas.

use serde::Serialize;

/// Timestamp layout used for `sold_at` columns.
pub const SOLD_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Raw operational schema
// =============================================================================

/// A row of `customer_info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub customer_id: i64,
    pub full_name: String,
    pub location: String,
}

/// A row of the raw `products` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
    pub price: f64,
}

/// A row of the raw `sales` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    pub sales_id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub total_sales: f64,
}

/// A sale with its customer and product resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleDetail {
    pub sales_id: i64,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub total_sales: f64,
}

/// Summed sales for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTotal {
    pub customer_id: i64,
    pub full_name: String,
    pub total_sales: f64,
}

/// Summed quantity for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductVolume {
    pub product_id: i64,
    pub product_name: String,
    pub total_quantity: i64,
}

/// Product sales total with its standard (gapped) rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRank {
    pub product_id: i64,
    pub product_name: String,
    pub total_sales: f64,
    pub rank: i64,
}

/// One step of the recursive running-total walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningTotal {
    pub sales_id: i64,
    pub total_sales: f64,
    pub running_total: f64,
}

/// A sale whose buyer is not the customer the raw `products` row names as
/// the product's owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipAnomaly {
    pub sales_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub recorded_owner_id: i64,
    pub buyer_id: i64,
}

// =============================================================================
// Normalized (3NF) schema
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub location_id: i64,
    pub name: String,
    pub region: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCategory {
    pub category_id: i64,
    pub name: String,
}

/// A sale in `sales_3nf`. `total_amount` is derived as quantity * unit_price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSale {
    pub sale_id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub sold_at: chrono::NaiveDateTime,
}

impl NormalizedSale {
    pub fn total_amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

// =============================================================================
// Star schema
// =============================================================================

/// A row of `fact_sales` addressed by surrogate keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactSale {
    pub sale_id: i64,
    pub customer_key: i64,
    pub product_key: i64,
    pub location_key: i64,
    pub date_key: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub cost: f64,
    pub profit: f64,
}

/// Revenue for one region in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMonthRevenue {
    pub region: String,
    pub year: i64,
    pub month: i64,
    pub revenue: f64,
}

// =============================================================================
// Reporting table
// =============================================================================

/// A fully flattened row of `sales_reporting_denorm`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportingRow {
    pub sale_id: i64,
    pub sold_at: String,
    pub sale_month: String,
    pub customer_id: i64,
    pub customer_name: String,
    pub location_name: String,
    pub region: String,
    pub country: String,
    pub product_id: i64,
    pub product_name: String,
    pub category_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub cost: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub monthly_rank: i64,
}

/// Profit rolled up per product category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProfit {
    pub category_name: String,
    pub total_profit: f64,
    pub avg_margin: f64,
}

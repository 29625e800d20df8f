//! Sales storage interface.

use async_trait::async_trait;

use crate::model::{
    CategoryProfit, Customer, CustomerTotal, FactSale, NormalizedSale, OwnershipAnomaly, Product,
    ProductRank, ProductVolume, RegionMonthRevenue, ReportingRow, RunningTotal, SaleDetail,
    SaleRecord,
};
use crate::seed::Dataset;
use crate::storage::schema::SchemaVariant;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Constraint classes reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    Unique,
    NotNull,
    Check,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Unique => "unique",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{kind} constraint violated: {message}")]
    ConstraintViolation {
        kind: ConstraintKind,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Invalid sale date: {0}")]
    InvalidDate(String),

    #[error("Threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    #[error("Procedure {name} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid CALL statement: {0}")]
    InvalidCall(String),

    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),
}

impl StorageError {
    /// True when the engine rejected a row for referencing a missing parent.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::ConstraintViolation {
                kind: ConstraintKind::ForeignKey,
                ..
            }
        )
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        if let sqlx::Error::Database(db) = &err {
            let kind = match db.kind() {
                ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
                ErrorKind::CheckViolation => Some(ConstraintKind::Check),
                _ => None,
            };
            if let Some(kind) = kind {
                return StorageError::ConstraintViolation {
                    kind,
                    message: db.message().to_string(),
                };
            }
        }
        StorageError::Database(err)
    }
}

/// Interface over the four sales schema variants.
///
/// Implementations:
/// - `SqliteSalesStore`: SQLite storage
#[async_trait]
pub trait SalesStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Schema and loaders
    // -------------------------------------------------------------------------

    /// Create the tables and indexes of one schema variant if missing.
    async fn install(&self, variant: SchemaVariant) -> Result<()>;

    /// Insert a dataset into the raw and 3NF schemas atomically.
    async fn seed(&self, dataset: &Dataset) -> Result<()>;

    /// Rebuild dimensions and facts from the 3NF schema.
    ///
    /// Returns the number of fact rows written.
    async fn load_star_schema(&self) -> Result<u64>;

    /// Rebuild the flattened reporting table from the 3NF schema.
    ///
    /// Returns the number of rows written.
    async fn refresh_reporting(&self) -> Result<u64>;

    /// (Re)create the `high_value_customers` view for a spend threshold.
    ///
    /// A non-finite threshold is rejected and the existing view is kept.
    async fn create_high_value_view(&self, threshold: f64) -> Result<()>;

    // -------------------------------------------------------------------------
    // Exercise queries over the raw schema
    // -------------------------------------------------------------------------

    /// Customers whose location equals `location` exactly.
    async fn customers_in_location(&self, location: &str) -> Result<Vec<Customer>>;

    /// Every sale with customer and product names.
    async fn sales_details(&self) -> Result<Vec<SaleDetail>>;

    /// Summed sales per purchasing customer, largest first.
    async fn customer_totals(&self) -> Result<Vec<CustomerTotal>>;

    /// Products whose summed quantity is at least `min_quantity`.
    async fn products_with_min_quantity(&self, min_quantity: i64) -> Result<Vec<ProductVolume>>;

    /// The `limit` customers with the largest summed sales.
    async fn top_customers(&self, limit: i64) -> Result<Vec<CustomerTotal>>;

    /// Customers whose summed sales exceed the mean of all customer totals.
    async fn customers_above_average(&self) -> Result<Vec<CustomerTotal>>;

    /// Products ranked by summed sales; ties share a rank.
    async fn product_sales_rank(&self) -> Result<Vec<ProductRank>>;

    /// Rows of the `high_value_customers` view.
    async fn high_value_customers(&self) -> Result<Vec<CustomerTotal>>;

    /// Running total of sales in ascending `sales_id` order.
    async fn running_totals(&self) -> Result<Vec<RunningTotal>>;

    /// Sales whose amount lies in `[min, max]`.
    async fn sales_in_amount_range(&self, min: f64, max: f64) -> Result<Vec<SaleRecord>>;

    /// Products that were never sold.
    async fn unsold_products(&self) -> Result<Vec<Product>>;

    /// Sales that contradict the raw product ownership column.
    async fn ownership_anomalies(&self) -> Result<Vec<OwnershipAnomaly>>;

    // -------------------------------------------------------------------------
    // Analytical queries over the star and reporting layers
    // -------------------------------------------------------------------------

    /// Revenue per region per calendar month from the star schema.
    async fn monthly_revenue_by_region(&self) -> Result<Vec<RegionMonthRevenue>>;

    /// Profit and average margin per category from the reporting table.
    async fn category_profit(&self) -> Result<Vec<CategoryProfit>>;

    /// Reporting rows of `month` (`YYYY-MM`) ranked within `limit`.
    async fn top_sales_in_month(&self, month: &str, limit: i64) -> Result<Vec<ReportingRow>>;

    // -------------------------------------------------------------------------
    // Single-row writes
    // -------------------------------------------------------------------------

    async fn insert_raw_sale(&self, sale: &SaleRecord) -> Result<()>;

    async fn insert_normalized_sale(&self, sale: &NormalizedSale) -> Result<()>;

    async fn insert_fact_sale(&self, fact: &FactSale) -> Result<()>;

    async fn insert_reporting_row(&self, row: &ReportingRow) -> Result<()>;
}

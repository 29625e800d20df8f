//! SQLite implementation of SalesStore.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sea_query::{Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, SqlitePool};
use tracing::{debug, info};

use crate::interfaces::sales_store::{Result, SalesStore, StorageError};
use crate::model::{
    CategoryProfit, Customer, CustomerTotal, FactSale, NormalizedSale, OwnershipAnomaly, Product,
    ProductRank, ProductVolume, RegionMonthRevenue, ReportingRow, RunningTotal, SaleDetail,
    SaleRecord, SOLD_AT_FORMAT,
};
use crate::seed::Dataset;
use crate::storage::queries;
use crate::storage::schema::{
    CustomerInfo, Customers, DimDate, FactSales, Locations, ProductCategories, Products,
    Products3nf, Sales, Sales3nf, SalesReportingDenorm, SchemaVariant,
};

/// SQLite-backed sales store.
pub struct SqliteSalesStore {
    pool: SqlitePool,
}

impl SqliteSalesStore {
    /// Create a new SQLite sales store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Install every schema variant.
    pub async fn install_all(&self) -> Result<()> {
        for variant in SchemaVariant::ALL {
            self.install(variant).await?;
        }
        Ok(())
    }

    /// Number of rows in a table owned by one of the schema variants.
    pub async fn row_count(&self, table: &str) -> Result<i64> {
        let known = SchemaVariant::ALL
            .iter()
            .any(|v| v.tables().contains(&table));
        if !known {
            return Err(StorageError::UnknownTable(table.to_string()));
        }
        let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn customer_totals_from(
        &self,
        sql: &str,
        limit: Option<i64>,
    ) -> Result<Vec<CustomerTotal>> {
        let mut query = sqlx::query(sql);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(customer_total).collect()
    }
}

fn customer_total(r: &SqliteRow) -> Result<CustomerTotal> {
    Ok(CustomerTotal {
        customer_id: r.try_get("customer_id")?,
        full_name: r.try_get("full_name")?,
        total_sales: r.try_get("customer_total")?,
    })
}

fn sale_record(r: &SqliteRow) -> Result<SaleRecord> {
    Ok(SaleRecord {
        sales_id: r.try_get("sales_id")?,
        customer_id: r.try_get("customer_id")?,
        product_id: r.try_get("product_id")?,
        quantity: r.try_get("quantity")?,
        total_sales: r.try_get("total_sales")?,
    })
}

fn reporting_row(r: &SqliteRow) -> Result<ReportingRow> {
    Ok(ReportingRow {
        sale_id: r.try_get("sale_id")?,
        sold_at: r.try_get("sold_at")?,
        sale_month: r.try_get("sale_month")?,
        customer_id: r.try_get("customer_id")?,
        customer_name: r.try_get("customer_name")?,
        location_name: r.try_get("location_name")?,
        region: r.try_get("region")?,
        country: r.try_get("country")?,
        product_id: r.try_get("product_id")?,
        product_name: r.try_get("product_name")?,
        category_name: r.try_get("category_name")?,
        quantity: r.try_get("quantity")?,
        unit_price: r.try_get("unit_price")?,
        total_amount: r.try_get("total_amount")?,
        cost: r.try_get("cost")?,
        profit: r.try_get("profit")?,
        profit_margin: r.try_get("profit_margin")?,
        monthly_rank: r.try_get("monthly_rank")?,
    })
}

/// `dim_date` row for one calendar day.
fn date_dimension_insert(date: NaiveDate) -> String {
    let date_key =
        i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day());
    let quarter = (date.month() - 1) / 3 + 1;

    Query::insert()
        .into_table(DimDate::Table)
        .columns([
            DimDate::DateKey,
            DimDate::FullDate,
            DimDate::Day,
            DimDate::Month,
            DimDate::MonthName,
            DimDate::Quarter,
            DimDate::Year,
            DimDate::DayOfWeek,
        ])
        .values_panic([
            date_key.into(),
            date.format("%Y-%m-%d").to_string().into(),
            date.day().into(),
            date.month().into(),
            date.format("%B").to_string().into(),
            quarter.into(),
            date.year().into(),
            date.format("%A").to_string().into(),
        ])
        .to_string(SqliteQueryBuilder)
}

#[async_trait]
impl SalesStore for SqliteSalesStore {
    async fn install(&self, variant: SchemaVariant) -> Result<()> {
        sqlx::raw_sql(variant.ddl()).execute(&self.pool).await?;
        info!(schema = %variant, tables = variant.tables().len(), "schema installed");
        Ok(())
    }

    async fn seed(&self, dataset: &Dataset) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for customer in dataset.raw_customers() {
            let query = Query::insert()
                .into_table(CustomerInfo::Table)
                .columns([
                    CustomerInfo::CustomerId,
                    CustomerInfo::FullName,
                    CustomerInfo::Location,
                ])
                .values_panic([
                    customer.customer_id.into(),
                    customer.full_name.into(),
                    customer.location.into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *tx).await?;
        }

        for product in &dataset.products {
            let query = Query::insert()
                .into_table(Products::Table)
                .columns([
                    Products::ProductId,
                    Products::ProductName,
                    Products::Price,
                    Products::CustomerId,
                ])
                .values_panic([
                    product.product_id.into(),
                    product.product_name.clone().into(),
                    product.price.into(),
                    product.owner_id.into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *tx).await?;
        }

        for sale in dataset.raw_sales() {
            sqlx::query(&raw_sale_insert(&sale))
                .execute(&mut *tx)
                .await?;
        }

        for location in &dataset.locations {
            let query = Query::insert()
                .into_table(Locations::Table)
                .columns([
                    Locations::LocationId,
                    Locations::Name,
                    Locations::Region,
                    Locations::Country,
                ])
                .values_panic([
                    location.location_id.into(),
                    location.name.clone().into(),
                    location.region.clone().into(),
                    location.country.clone().into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *tx).await?;
        }

        for customer in &dataset.customers {
            let query = Query::insert()
                .into_table(Customers::Table)
                .columns([
                    Customers::CustomerId,
                    Customers::FullName,
                    Customers::LocationId,
                ])
                .values_panic([
                    customer.customer_id.into(),
                    customer.full_name.clone().into(),
                    customer.location_id.into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *tx).await?;
        }

        for category in &dataset.categories {
            let query = Query::insert()
                .into_table(ProductCategories::Table)
                .columns([ProductCategories::CategoryId, ProductCategories::Name])
                .values_panic([category.category_id.into(), category.name.clone().into()])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *tx).await?;
        }

        for product in &dataset.products {
            let query = Query::insert()
                .into_table(Products3nf::Table)
                .columns([
                    Products3nf::ProductId,
                    Products3nf::ProductName,
                    Products3nf::CategoryId,
                    Products3nf::UnitPrice,
                    Products3nf::UnitCost,
                ])
                .values_panic([
                    product.product_id.into(),
                    product.product_name.clone().into(),
                    product.category_id.into(),
                    product.price.into(),
                    product.cost.into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *tx).await?;
        }

        for sale in dataset.normalized_sales() {
            sqlx::query(&normalized_sale_insert(&sale))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            customers = dataset.customers.len(),
            products = dataset.products.len(),
            sales = dataset.sales.len(),
            "dataset seeded"
        );
        Ok(())
    }

    async fn load_star_schema(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        (&mut *tx)
            .execute(sqlx::raw_sql(queries::CLEAR_STAR_SCHEMA))
            .await?;
        sqlx::query(queries::LOAD_DIM_LOCATION)
            .execute(&mut *tx)
            .await?;
        sqlx::query(queries::LOAD_DIM_CUSTOMER)
            .execute(&mut *tx)
            .await?;
        sqlx::query(queries::LOAD_DIM_PRODUCT)
            .execute(&mut *tx)
            .await?;

        let dates = sqlx::query(queries::DISTINCT_SALE_DATES)
            .fetch_all(&mut *tx)
            .await?;
        for row in &dates {
            let raw: String = row.try_get("sale_date")?;
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|e| StorageError::InvalidDate(format!("{}: {}", raw, e)))?;
            sqlx::query(&date_dimension_insert(date))
                .execute(&mut *tx)
                .await?;
        }

        let facts = sqlx::query(queries::LOAD_FACT_SALES)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(facts, dates = dates.len(), "star schema loaded");
        Ok(facts)
    }

    async fn refresh_reporting(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(queries::CLEAR_REPORTING)
            .execute(&mut *tx)
            .await?;
        let rows = sqlx::query(queries::LOAD_REPORTING)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(rows, "reporting table refreshed");
        Ok(rows)
    }

    async fn create_high_value_view(&self, threshold: f64) -> Result<()> {
        if !threshold.is_finite() {
            return Err(StorageError::InvalidThreshold(threshold));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(queries::DROP_HIGH_VALUE_VIEW)
            .execute(&mut *tx)
            .await?;
        sqlx::query(&queries::create_high_value_view(threshold))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(threshold, view = queries::HIGH_VALUE_VIEW, "view created");
        Ok(())
    }

    async fn customers_in_location(&self, location: &str) -> Result<Vec<Customer>> {
        let rows = sqlx::query(&queries::customers_in_location(location))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(Customer {
                    customer_id: r.try_get("customer_id")?,
                    full_name: r.try_get("full_name")?,
                    location: r.try_get("location")?,
                })
            })
            .collect()
    }

    async fn sales_details(&self) -> Result<Vec<SaleDetail>> {
        let rows = sqlx::query(queries::SALES_DETAILS)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(SaleDetail {
                    sales_id: r.try_get("sales_id")?,
                    customer_name: r.try_get("customer_name")?,
                    product_name: r.try_get("product_name")?,
                    quantity: r.try_get("quantity")?,
                    total_sales: r.try_get("total_sales")?,
                })
            })
            .collect()
    }

    async fn customer_totals(&self) -> Result<Vec<CustomerTotal>> {
        self.customer_totals_from(queries::CUSTOMER_TOTALS, None)
            .await
    }

    async fn products_with_min_quantity(&self, min_quantity: i64) -> Result<Vec<ProductVolume>> {
        let rows = sqlx::query(queries::PRODUCTS_WITH_MIN_QUANTITY)
            .bind(min_quantity)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(ProductVolume {
                    product_id: r.try_get("product_id")?,
                    product_name: r.try_get("product_name")?,
                    total_quantity: r.try_get("total_quantity")?,
                })
            })
            .collect()
    }

    async fn top_customers(&self, limit: i64) -> Result<Vec<CustomerTotal>> {
        self.customer_totals_from(queries::TOP_CUSTOMERS, Some(limit))
            .await
    }

    async fn customers_above_average(&self) -> Result<Vec<CustomerTotal>> {
        self.customer_totals_from(queries::CUSTOMERS_ABOVE_AVERAGE, None)
            .await
    }

    async fn product_sales_rank(&self) -> Result<Vec<ProductRank>> {
        let rows = sqlx::query(queries::PRODUCT_SALES_RANK)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(ProductRank {
                    product_id: r.try_get("product_id")?,
                    product_name: r.try_get("product_name")?,
                    total_sales: r.try_get("product_total")?,
                    rank: r.try_get("rank")?,
                })
            })
            .collect()
    }

    async fn high_value_customers(&self) -> Result<Vec<CustomerTotal>> {
        self.customer_totals_from(queries::SELECT_HIGH_VALUE_VIEW, None)
            .await
    }

    async fn running_totals(&self) -> Result<Vec<RunningTotal>> {
        let rows = sqlx::query(queries::RUNNING_TOTALS)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(RunningTotal {
                    sales_id: r.try_get("sales_id")?,
                    total_sales: r.try_get("total_sales")?,
                    running_total: r.try_get("running_total")?,
                })
            })
            .collect()
    }

    async fn sales_in_amount_range(&self, min: f64, max: f64) -> Result<Vec<SaleRecord>> {
        let rows = sqlx::query(&queries::sales_in_amount_range(min, max))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(sale_record).collect()
    }

    async fn unsold_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&queries::unsold_products())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(Product {
                    product_id: r.try_get("product_id")?,
                    product_name: r.try_get("product_name")?,
                    price: r.try_get("price")?,
                })
            })
            .collect()
    }

    async fn ownership_anomalies(&self) -> Result<Vec<OwnershipAnomaly>> {
        let rows = sqlx::query(queries::OWNERSHIP_ANOMALIES)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(OwnershipAnomaly {
                    sales_id: r.try_get("sales_id")?,
                    product_id: r.try_get("product_id")?,
                    product_name: r.try_get("product_name")?,
                    recorded_owner_id: r.try_get("recorded_owner_id")?,
                    buyer_id: r.try_get("buyer_id")?,
                })
            })
            .collect()
    }

    async fn monthly_revenue_by_region(&self) -> Result<Vec<RegionMonthRevenue>> {
        let rows = sqlx::query(queries::MONTHLY_REVENUE_BY_REGION)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(RegionMonthRevenue {
                    region: r.try_get("region")?,
                    year: r.try_get("year")?,
                    month: r.try_get("month")?,
                    revenue: r.try_get("revenue")?,
                })
            })
            .collect()
    }

    async fn category_profit(&self) -> Result<Vec<CategoryProfit>> {
        let rows = sqlx::query(queries::CATEGORY_PROFIT)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(CategoryProfit {
                    category_name: r.try_get("category_name")?,
                    total_profit: r.try_get("total_profit")?,
                    avg_margin: r.try_get("avg_margin")?,
                })
            })
            .collect()
    }

    async fn top_sales_in_month(&self, month: &str, limit: i64) -> Result<Vec<ReportingRow>> {
        let rows = sqlx::query(queries::TOP_SALES_IN_MONTH)
            .bind(month)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(reporting_row).collect()
    }

    async fn insert_raw_sale(&self, sale: &SaleRecord) -> Result<()> {
        sqlx::query(&raw_sale_insert(sale))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_normalized_sale(&self, sale: &NormalizedSale) -> Result<()> {
        sqlx::query(&normalized_sale_insert(sale))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_fact_sale(&self, fact: &FactSale) -> Result<()> {
        let query = Query::insert()
            .into_table(FactSales::Table)
            .columns([
                FactSales::SaleId,
                FactSales::CustomerKey,
                FactSales::ProductKey,
                FactSales::LocationKey,
                FactSales::DateKey,
                FactSales::Quantity,
                FactSales::UnitPrice,
                FactSales::TotalAmount,
                FactSales::Cost,
                FactSales::Profit,
            ])
            .values_panic([
                fact.sale_id.into(),
                fact.customer_key.into(),
                fact.product_key.into(),
                fact.location_key.into(),
                fact.date_key.into(),
                fact.quantity.into(),
                fact.unit_price.into(),
                fact.total_amount.into(),
                fact.cost.into(),
                fact.profit.into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_reporting_row(&self, row: &ReportingRow) -> Result<()> {
        let query = Query::insert()
            .into_table(SalesReportingDenorm::Table)
            .columns([
                SalesReportingDenorm::SaleId,
                SalesReportingDenorm::SoldAt,
                SalesReportingDenorm::SaleMonth,
                SalesReportingDenorm::CustomerId,
                SalesReportingDenorm::CustomerName,
                SalesReportingDenorm::LocationName,
                SalesReportingDenorm::Region,
                SalesReportingDenorm::Country,
                SalesReportingDenorm::ProductId,
                SalesReportingDenorm::ProductName,
                SalesReportingDenorm::CategoryName,
                SalesReportingDenorm::Quantity,
                SalesReportingDenorm::UnitPrice,
                SalesReportingDenorm::TotalAmount,
                SalesReportingDenorm::Cost,
                SalesReportingDenorm::Profit,
                SalesReportingDenorm::ProfitMargin,
                SalesReportingDenorm::MonthlyRank,
            ])
            .values_panic([
                row.sale_id.into(),
                row.sold_at.clone().into(),
                row.sale_month.clone().into(),
                row.customer_id.into(),
                row.customer_name.clone().into(),
                row.location_name.clone().into(),
                row.region.clone().into(),
                row.country.clone().into(),
                row.product_id.into(),
                row.product_name.clone().into(),
                row.category_name.clone().into(),
                row.quantity.into(),
                row.unit_price.into(),
                row.total_amount.into(),
                row.cost.into(),
                row.profit.into(),
                row.profit_margin.into(),
                row.monthly_rank.into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }
}

fn raw_sale_insert(sale: &SaleRecord) -> String {
    Query::insert()
        .into_table(Sales::Table)
        .columns([
            Sales::SalesId,
            Sales::TotalSales,
            Sales::Quantity,
            Sales::ProductId,
            Sales::CustomerId,
        ])
        .values_panic([
            sale.sales_id.into(),
            sale.total_sales.into(),
            sale.quantity.into(),
            sale.product_id.into(),
            sale.customer_id.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

fn normalized_sale_insert(sale: &NormalizedSale) -> String {
    Query::insert()
        .into_table(Sales3nf::Table)
        .columns([
            Sales3nf::SaleId,
            Sales3nf::CustomerId,
            Sales3nf::ProductId,
            Sales3nf::Quantity,
            Sales3nf::UnitPrice,
            Sales3nf::TotalAmount,
            Sales3nf::SoldAt,
        ])
        .values_panic([
            sale.sale_id.into(),
            sale.customer_id.into(),
            sale.product_id.into(),
            sale.quantity.into(),
            sale.unit_price.into(),
            sale.total_amount().into(),
            sale.sold_at.format(SOLD_AT_FORMAT).to_string().into(),
        ])
        .to_string(SqliteQueryBuilder)
}

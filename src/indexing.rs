//! Indexing advice for the raw schema.
//!
//! Each recommendation names the exercise filter or join it serves. The
//! advisor creates them with sea-query and checks their effect through
//! `EXPLAIN QUERY PLAN`.

use sea_query::{Alias, Index, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::interfaces::Result;
use crate::result_set::{bind_params, SqlParam};

/// A single-table index worth having.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecommendation {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub reason: &'static str,
}

impl IndexRecommendation {
    /// `CREATE INDEX IF NOT EXISTS` statement for this recommendation.
    pub fn create_statement(&self) -> String {
        let mut stmt = Index::create();
        stmt.if_not_exists()
            .name(self.name)
            .table(Alias::new(self.table));
        for column in self.columns {
            stmt.col(Alias::new(*column));
        }
        stmt.to_string(SqliteQueryBuilder)
    }
}

/// Indexes recommended for the raw `customer_info`/`products`/`sales` tables.
pub const RECOMMENDED_INDEXES: &[IndexRecommendation] = &[
    IndexRecommendation {
        name: "idx_customer_info_location",
        table: "customer_info",
        columns: &["location"],
        reason: "equality filter on location (Q1)",
    },
    IndexRecommendation {
        name: "idx_sales_customer_id",
        table: "sales",
        columns: &["customer_id"],
        reason: "joins and per-customer aggregates on sales.customer_id (Q2, Q3, Q5, Q6, Q8, Q9)",
    },
    IndexRecommendation {
        name: "idx_sales_product_id",
        table: "sales",
        columns: &["product_id"],
        reason: "product aggregates and the unsold-product anti-join (Q4, Q7, Q12)",
    },
    IndexRecommendation {
        name: "idx_sales_total_sales",
        table: "sales",
        columns: &["total_sales"],
        reason: "range filter on the sale amount (Q11)",
    },
];

/// One node of an `EXPLAIN QUERY PLAN` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub id: i64,
    pub parent: i64,
    pub detail: String,
}

/// True if any step reads through the named index.
pub fn uses_index(plan: &[PlanStep], index_name: &str) -> bool {
    let needle = format!("INDEX {}", index_name);
    plan.iter().any(|step| step.detail.contains(&needle))
}

/// True if any step walks a whole table.
pub fn scans_table(plan: &[PlanStep], table: &str) -> bool {
    plan.iter().any(|step| {
        let detail = step.detail.as_str();
        (detail.starts_with(&format!("SCAN {}", table))
            || detail.starts_with(&format!("SCAN TABLE {}", table)))
            && !detail.contains("USING")
    })
}

/// Applies and verifies the recommended indexes.
pub struct IndexAdvisor {
    pool: SqlitePool,
}

impl IndexAdvisor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn recommendations(&self) -> &'static [IndexRecommendation] {
        RECOMMENDED_INDEXES
    }

    /// Create every recommended index that does not exist yet.
    ///
    /// Returns the number of indexes newly created.
    pub async fn apply(&self) -> Result<usize> {
        let mut created = 0;
        for rec in RECOMMENDED_INDEXES {
            let existing = self.index_names(rec.table).await?;
            if existing.iter().any(|name| name == rec.name) {
                continue;
            }
            sqlx::query(&rec.create_statement())
                .execute(&self.pool)
                .await?;
            info!(index = rec.name, table = rec.table, reason = rec.reason, "created index");
            created += 1;
        }
        Ok(created)
    }

    /// Names of the indexes defined on `table`.
    pub async fn index_names(&self, table: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM pragma_index_list(?)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    /// The engine's plan for `sql` with `params` bound.
    pub async fn explain(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<PlanStep>> {
        let explain = format!("EXPLAIN QUERY PLAN {}", sql.trim());
        let rows = bind_params(sqlx::query(&explain), params)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| -> Result<PlanStep> {
                Ok(PlanStep {
                    id: r.try_get("id")?,
                    parent: r.try_get("parent")?,
                    detail: r.try_get("detail")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_statement() {
        let sql = RECOMMENDED_INDEXES[0].create_statement();
        assert!(sql.starts_with("CREATE INDEX IF NOT EXISTS"), "{}", sql);
        assert!(sql.contains(r#""idx_customer_info_location""#), "{}", sql);
        assert!(sql.contains(r#"ON "customer_info" ("location")"#), "{}", sql);
    }

    #[test]
    fn test_plan_helpers() {
        let plan = vec![
            PlanStep {
                id: 2,
                parent: 0,
                detail: "SCAN sales".to_string(),
            },
            PlanStep {
                id: 5,
                parent: 0,
                detail: "SEARCH customer_info USING INTEGER PRIMARY KEY (rowid=?)".to_string(),
            },
        ];
        assert!(scans_table(&plan, "sales"));
        assert!(!scans_table(&plan, "customer_info"));
        assert!(!uses_index(&plan, "idx_sales_customer_id"));
    }

    #[test]
    fn test_recommendations_cover_raw_tables_only() {
        for rec in RECOMMENDED_INDEXES {
            assert!(["customer_info", "products", "sales"].contains(&rec.table));
            assert!(rec.name.starts_with("idx_"));
        }
    }
}

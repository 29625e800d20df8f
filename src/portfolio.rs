//! Exercise catalogue.
//!
//! Each exercise pairs the SQL a reader studies with the parameters taken
//! from `ReportConfig`, and runs against any pool holding the raw schema.

use sqlx::SqlitePool;
use tracing::info;

use crate::config::ReportConfig;
use crate::interfaces::{Result, StorageError};
use crate::procedures::{ProcedureRegistry, GET_CUSTOMER_SALES};
use crate::result_set::{fetch_result_set, fetch_result_set_on, ResultSet, SqlParam};
use crate::storage::queries;

/// SQL feature an exercise practises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Filter,
    Join,
    Aggregate,
    Cte,
    Window,
    View,
    Procedure,
    Recursive,
    AntiJoin,
    DataQuality,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Topic::Filter => "filter",
            Topic::Join => "join",
            Topic::Aggregate => "aggregate",
            Topic::Cte => "cte",
            Topic::Window => "window function",
            Topic::View => "view",
            Topic::Procedure => "stored procedure",
            Topic::Recursive => "recursive cte",
            Topic::AntiJoin => "anti-join",
            Topic::DataQuality => "data quality",
        };
        f.write_str(name)
    }
}

/// How an exercise is executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A query with positional parameters. `setup` runs first as a script.
    Query {
        setup: Option<String>,
        sql: String,
        params: Vec<SqlParam>,
    },
    /// A `CALL` resolved through the procedure registry.
    Call(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: &'static str,
    pub title: &'static str,
    pub topic: Topic,
    pub statement: Statement,
}

impl Exercise {
    fn query(id: &'static str, title: &'static str, topic: Topic, sql: impl Into<String>) -> Self {
        Self::query_with(id, title, topic, sql, Vec::new())
    }

    fn query_with(
        id: &'static str,
        title: &'static str,
        topic: Topic,
        sql: impl Into<String>,
        params: Vec<SqlParam>,
    ) -> Self {
        Self {
            id,
            title,
            topic,
            statement: Statement::Query {
                setup: None,
                sql: sql.into(),
                params,
            },
        }
    }

    /// SQL text as shown to a reader, setup included.
    pub fn sql_text(&self) -> String {
        match &self.statement {
            Statement::Query { setup, sql, .. } => match setup {
                Some(setup) => format!("{};\n{}", setup.trim().trim_end_matches(';'), sql.trim()),
                None => sql.trim().to_string(),
            },
            Statement::Call(call) => call.clone(),
        }
    }
}

/// Q1 to Q13 with arguments from `report`.
pub fn catalogue(report: &ReportConfig) -> Vec<Exercise> {
    let view_setup = format!(
        "{};\n{}",
        queries::DROP_HIGH_VALUE_VIEW,
        queries::create_high_value_view(report.high_value_threshold)
    );

    vec![
        Exercise::query(
            "Q1",
            "Customers in a location",
            Topic::Filter,
            queries::customers_in_location(&report.location),
        ),
        Exercise::query(
            "Q2",
            "Sales with customer and product names",
            Topic::Join,
            queries::SALES_DETAILS,
        ),
        Exercise::query(
            "Q3",
            "Total sales per customer",
            Topic::Aggregate,
            queries::CUSTOMER_TOTALS,
        ),
        Exercise::query_with(
            "Q4",
            "Products sold in volume",
            Topic::Aggregate,
            queries::PRODUCTS_WITH_MIN_QUANTITY,
            vec![SqlParam::Int(report.min_quantity)],
        ),
        Exercise::query_with(
            "Q5",
            "Top customers by sales",
            Topic::Aggregate,
            queries::TOP_CUSTOMERS,
            vec![SqlParam::Int(report.top_customers)],
        ),
        Exercise::query(
            "Q6",
            "Customers above the average total",
            Topic::Cte,
            queries::CUSTOMERS_ABOVE_AVERAGE,
        ),
        Exercise::query(
            "Q7",
            "Products ranked by sales",
            Topic::Window,
            queries::PRODUCT_SALES_RANK,
        ),
        Exercise {
            id: "Q8",
            title: "High-value customers view",
            topic: Topic::View,
            statement: Statement::Query {
                setup: Some(view_setup),
                sql: queries::SELECT_HIGH_VALUE_VIEW.to_string(),
                params: Vec::new(),
            },
        },
        Exercise {
            id: "Q9",
            title: "Sales of one customer via procedure",
            topic: Topic::Procedure,
            statement: Statement::Call(format!(
                "CALL {}({})",
                GET_CUSTOMER_SALES, report.customer_id
            )),
        },
        Exercise::query(
            "Q10",
            "Running total of sales",
            Topic::Recursive,
            queries::RUNNING_TOTALS,
        ),
        Exercise::query(
            "Q11",
            "Sales within an amount range",
            Topic::Filter,
            queries::sales_in_amount_range(report.amount_min, report.amount_max),
        ),
        Exercise::query(
            "Q12",
            "Products never sold",
            Topic::AntiJoin,
            queries::unsold_products(),
        ),
        Exercise::query(
            "Q13",
            "Product ownership contradictions",
            Topic::DataQuality,
            queries::OWNERSHIP_ANOMALIES,
        ),
    ]
}

/// Look an exercise up by id, ignoring case.
pub fn find_exercise<'a>(exercises: &'a [Exercise], id: &str) -> Result<&'a Exercise> {
    exercises
        .iter()
        .find(|e| e.id.eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| StorageError::UnknownExercise(id.to_string()))
}

/// Execute one exercise.
pub async fn run_exercise(pool: &SqlitePool, exercise: &Exercise) -> Result<ResultSet> {
    info!(exercise = exercise.id, topic = %exercise.topic, "running exercise");

    match &exercise.statement {
        Statement::Query {
            setup: None,
            sql,
            params,
        } => fetch_result_set(pool, sql, params).await,
        Statement::Query {
            setup: Some(setup),
            sql,
            params,
        } => {
            // A setup that leaves the query unreadable is rolled back.
            let mut tx = pool.begin().await?;
            sqlx::raw_sql(setup).execute(&mut *tx).await?;
            let result = fetch_result_set_on(&mut *tx, sql, params).await?;
            tx.commit().await?;
            Ok(result)
        }
        Statement::Call(call) => ProcedureRegistry::with_builtins().call(pool, call).await,
    }
}

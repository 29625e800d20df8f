//! Dynamically typed query results.
//!
//! Exercises and procedure calls return whatever columns their SQL selects,
//! so rows are decoded by storage class rather than into a fixed struct.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Executor, Row, SqlitePool, TypeInfo, ValueRef};
use tracing::debug;

use crate::interfaces::Result;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Null => f.write_str("NULL"),
            SqlParam::Int(v) => write!(f, "{}", v),
            SqlParam::Real(v) => write!(f, "{:?}", v),
            SqlParam::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
        }
    }
}

/// Bind `params` in order onto a query.
pub fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlParam],
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlParam::Null => query.bind(None::<i64>),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Real(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// Column names plus rows of JSON-typed cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().filter_map(|row| row.get(idx)).collect(),
            None => Vec::new(),
        }
    }

    fn from_rows(columns: Vec<String>, rows: &[SqliteRow]) -> Result<Self> {
        let mut decoded = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for idx in 0..row.len() {
                cells.push(decode_cell(row, idx)?);
            }
            decoded.push(cells);
        }

        Ok(Self {
            columns,
            rows: decoded,
        })
    }
}

fn decode_cell(row: &SqliteRow, idx: usize) -> Result<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(idx)?),
        "REAL" | "NUMERIC" => Value::from(row.try_get::<f64, _>(idx)?),
        "BLOB" => Value::from(format!("<{} bytes>", row.try_get::<Vec<u8>, _>(idx)?.len())),
        _ => Value::from(row.try_get::<String, _>(idx)?),
    };
    Ok(value)
}

/// Run one statement and collect its rows.
pub async fn fetch_result_set(
    pool: &SqlitePool,
    sql: &str,
    params: &[SqlParam],
) -> Result<ResultSet> {
    let mut conn = pool.acquire().await?;
    fetch_result_set_on(&mut *conn, sql, params).await
}

/// Run one statement on a given connection, which may be inside a
/// transaction.
///
/// Column names come from the first row, or from the prepared statement
/// when nothing matched.
pub async fn fetch_result_set_on(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<ResultSet> {
    debug!(sql = %sql.trim(), params = params.len(), "executing statement");
    let rows = bind_params(sqlx::query(sql), params)
        .fetch_all(&mut *conn)
        .await?;

    let columns = match rows.first() {
        Some(row) => column_names(row.columns()),
        None => column_names(conn.describe(sql).await?.columns()),
    };
    ResultSet::from_rows(columns, &rows)
}

fn column_names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Renders as an aligned text table, in the layout of a database shell.
impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(render_cell).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &cells {
            for (idx, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(idx) {
                    *w = (*w).max(cell.len());
                }
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect();
        writeln!(f, "{}", header.join(" | "))?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect();
            writeln!(f, "{}", line.join(" | "))?;
        }

        write!(f, "({} row{})", self.rows.len(), if self.rows.len() == 1 { "" } else { "s" })
    }
}

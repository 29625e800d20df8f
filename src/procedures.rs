//! Stored procedures.
//!
//! SQLite has no `CREATE PROCEDURE`, so procedures live in a registry:
//! a name, its `IN` parameters and a parameterised body. Callers invoke them
//! with ordinary `CALL name(arg, ...)` text.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::info;

use crate::interfaces::{Result, StorageError};
use crate::result_set::{fetch_result_set, ResultSet, SqlParam};
use crate::storage::queries::CUSTOMER_SALES_PROCEDURE_BODY;

/// Name of the built-in customer sales procedure.
pub const GET_CUSTOMER_SALES: &str = "get_customer_sales";

/// Parameter direction. Only input parameters are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureParam {
    pub name: String,
    pub mode: ParamMode,
    /// Declared SQL type, used when rendering the definition.
    pub sql_type: String,
}

impl ProcedureParam {
    pub fn input(name: &str, sql_type: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: ParamMode::In,
            sql_type: sql_type.to_string(),
        }
    }
}

/// A named, parameterised statement. The body refers to parameters
/// positionally (`?1`, `?2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<ProcedureParam>,
    pub body: String,
}

impl Procedure {
    /// The definition in the dialect of engines that have procedures.
    pub fn definition(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let mode = match p.mode {
                    ParamMode::In => "IN",
                };
                format!("{} {} {}", mode, p.name, p.sql_type)
            })
            .collect();
        format!(
            "CREATE PROCEDURE {}({})\nBEGIN\n    {};\nEND",
            self.name,
            params.join(", "),
            self.body.trim()
        )
    }
}

/// A parsed `CALL` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CallStatement {
    pub name: String,
    pub args: Vec<SqlParam>,
}

/// Procedures by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct ProcedureRegistry {
    procedures: HashMap<String, Procedure>,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `get_customer_sales(IN p_customer_id INT)`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.define(Procedure {
            name: GET_CUSTOMER_SALES.to_string(),
            params: vec![ProcedureParam::input("p_customer_id", "INT")],
            body: CUSTOMER_SALES_PROCEDURE_BODY.to_string(),
        });
        registry
    }

    /// Add or replace a procedure.
    pub fn define(&mut self, procedure: Procedure) {
        self.procedures
            .insert(procedure.name.to_ascii_lowercase(), procedure);
    }

    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(&name.to_ascii_lowercase())
    }

    /// Parse and run a `CALL` statement.
    pub async fn call(&self, pool: &SqlitePool, statement: &str) -> Result<ResultSet> {
        let call = parse_call(statement)?;
        let procedure = self
            .get(&call.name)
            .ok_or_else(|| StorageError::UnknownProcedure(call.name.clone()))?;

        if procedure.params.len() != call.args.len() {
            return Err(StorageError::ArityMismatch {
                name: procedure.name.clone(),
                expected: procedure.params.len(),
                actual: call.args.len(),
            });
        }

        info!(procedure = %procedure.name, args = call.args.len(), "calling procedure");
        fetch_result_set(pool, &procedure.body, &call.args).await
    }
}

/// Parse `CALL name(arg, ...)` with an optional trailing semicolon.
///
/// Arguments are integer, real, single-quoted text (`''` escapes a quote) or
/// `NULL` literals.
pub fn parse_call(statement: &str) -> Result<CallStatement> {
    let invalid = |reason: &str| StorageError::InvalidCall(format!("{}: {}", reason, statement));

    let text = statement.trim().trim_end_matches(';').trim_end();
    let keyword = text.get(..4).unwrap_or_default();
    if !keyword.eq_ignore_ascii_case("call") {
        return Err(invalid("expected CALL"));
    }
    let rest = &text[4..];
    if !rest.starts_with(char::is_whitespace) {
        return Err(invalid("expected procedure name after CALL"));
    }
    let rest = rest.trim_start();

    let name_len = rest
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let name = &rest[..name_len];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("invalid procedure name"));
    }

    let rest = rest[name_len..].trim_start();
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| invalid("expected parenthesised argument list"))?;

    let args = split_args(inner)
        .ok_or_else(|| invalid("unterminated string literal"))?
        .into_iter()
        .map(|raw| parse_literal(&raw).ok_or_else(|| invalid("invalid argument")))
        .collect::<Result<Vec<_>>>()?;

    Ok(CallStatement {
        name: name.to_string(),
        args,
    })
}

/// Split on commas outside quotes. `None` if a quote is left open.
fn split_args(inner: &str) -> Option<Vec<String>> {
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in inner.chars() {
        match c {
            '\'' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                args.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    args.push(current);
    Some(args)
}

fn parse_literal(raw: &str) -> Option<SqlParam> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.eq_ignore_ascii_case("null") {
        return Some(SqlParam::Null);
    }
    if let Some(body) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        // A lone quote inside the body means two literals were run together.
        if body.replace("''", "").contains('\'') {
            return None;
        }
        return Some(SqlParam::Text(body.replace("''", "'")));
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(SqlParam::Int(v));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(SqlParam::Real)
}

//! Exercise catalogue integration tests.
//!
//! Runs every catalogue entry, the procedure registry and the index advisor
//! against a seeded in-memory database.

use serde_json::Value;

use salesdb::config::{ReportConfig, StorageConfig};
use salesdb::indexing::{scans_table, uses_index, IndexAdvisor};
use salesdb::interfaces::{SalesStore, StorageError};
use salesdb::portfolio::{catalogue, find_exercise, run_exercise};
use salesdb::procedures::{Procedure, ProcedureParam, ProcedureRegistry};
use salesdb::result_set::SqlParam;
use salesdb::seed::Dataset;
use salesdb::storage::{init_storage, queries, SqliteSalesStore};

async fn seeded_store() -> SqliteSalesStore {
    let store = init_storage(&StorageConfig::in_memory())
        .await
        .expect("Failed to init storage");
    store
        .seed(&Dataset::sample())
        .await
        .expect("seed should succeed");
    store
}

fn ints(values: Vec<&Value>) -> Vec<i64> {
    values.iter().filter_map(|v| v.as_i64()).collect()
}

#[tokio::test]
async fn test_every_exercise_runs() {
    let store = seeded_store().await;
    let expected_rows = [
        ("Q1", 2),
        ("Q2", 12),
        ("Q3", 5),
        ("Q4", 3),
        ("Q5", 3),
        ("Q6", 2),
        ("Q7", 5),
        ("Q8", 2),
        ("Q9", 3),
        ("Q10", 12),
        ("Q11", 6),
        ("Q12", 1),
        ("Q13", 9),
    ];

    let exercises = catalogue(&ReportConfig::default());
    assert_eq!(exercises.len(), expected_rows.len());

    for (id, rows) in expected_rows {
        let exercise = find_exercise(&exercises, id).expect("exercise should exist");
        let result = run_exercise(store.pool(), exercise)
            .await
            .unwrap_or_else(|e| panic!("{} failed: {}", id, e));
        assert_eq!(result.len(), rows, "{} returned {}", id, result);
    }
}

#[tokio::test]
async fn test_location_exercise_returns_only_that_location() {
    let store = seeded_store().await;
    let exercises = catalogue(&ReportConfig::default());

    let result = run_exercise(store.pool(), find_exercise(&exercises, "Q1").unwrap())
        .await
        .unwrap();

    assert!(result
        .column("location")
        .iter()
        .all(|v| v.as_str() == Some("Nairobi")));
}

#[tokio::test]
async fn test_empty_exercise_result_keeps_columns() {
    let store = seeded_store().await;
    let report = ReportConfig {
        location: "Nowhere".to_string(),
        customer_id: 999,
        ..ReportConfig::default()
    };
    let exercises = catalogue(&report);

    let q1 = run_exercise(store.pool(), find_exercise(&exercises, "Q1").unwrap())
        .await
        .unwrap();
    assert!(q1.is_empty());
    assert_eq!(q1.columns, vec!["customer_id", "full_name", "location"]);
    assert!(q1.to_string().starts_with("customer_id | full_name | location"));

    let q9 = run_exercise(store.pool(), find_exercise(&exercises, "Q9").unwrap())
        .await
        .unwrap();
    assert!(q9.is_empty());
    assert_eq!(
        q9.columns,
        vec!["sales_id", "customer_id", "product_id", "quantity", "total_sales"]
    );
}

#[tokio::test]
async fn test_rank_exercise_exposes_rank_column() {
    let store = seeded_store().await;
    let exercises = catalogue(&ReportConfig::default());

    let result = run_exercise(store.pool(), find_exercise(&exercises, "Q7").unwrap())
        .await
        .unwrap();

    assert_eq!(ints(result.column("rank")), vec![1, 2, 2, 4, 5]);
}

#[tokio::test]
async fn test_running_total_exercise_ends_at_table_sum() {
    let store = seeded_store().await;
    let exercises = catalogue(&ReportConfig::default());

    let result = run_exercise(store.pool(), find_exercise(&exercises, "Q10").unwrap())
        .await
        .unwrap();

    let totals: Vec<f64> = result
        .column("running_total")
        .iter()
        .filter_map(|v| v.as_f64())
        .collect();
    assert_eq!(totals.len(), 12);
    assert_eq!(totals.last().copied(), Some(58000.0));
}

#[tokio::test]
async fn test_view_exercise_is_rerunnable() {
    let store = seeded_store().await;
    let report = ReportConfig {
        high_value_threshold: 20000.0,
        ..ReportConfig::default()
    };
    let exercises = catalogue(&report);
    let q8 = find_exercise(&exercises, "Q8").unwrap();

    let first = run_exercise(store.pool(), q8).await.unwrap();
    let second = run_exercise(store.pool(), q8).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ints(first.column("customer_id")), vec![1]);
}

#[tokio::test]
async fn test_view_exercise_rolls_back_unreadable_view() {
    let store = seeded_store().await;
    let exercises = catalogue(&ReportConfig::default());
    run_exercise(store.pool(), find_exercise(&exercises, "Q8").unwrap())
        .await
        .expect("default view should run");

    for threshold in [f64::INFINITY, f64::NAN] {
        let broken = catalogue(&ReportConfig {
            high_value_threshold: threshold,
            ..ReportConfig::default()
        });
        run_exercise(store.pool(), find_exercise(&broken, "Q8").unwrap())
            .await
            .expect_err("non-finite threshold should fail");
    }

    let view = store
        .high_value_customers()
        .await
        .expect("previous view should survive");
    let ids: Vec<i64> = view.iter().map(|c| c.customer_id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_result_set_renders_as_table() {
    let store = seeded_store().await;
    let exercises = catalogue(&ReportConfig::default());

    let result = run_exercise(store.pool(), find_exercise(&exercises, "Q12").unwrap())
        .await
        .unwrap();
    let text = result.to_string();

    assert!(text.starts_with("product_id | product_name | price"), "{}", text);
    assert!(text.contains("Projector"), "{}", text);
    assert!(text.contains("6000.00"), "{}", text);
    assert!(text.ends_with("(1 row)"), "{}", text);
}

// =============================================================================
// Procedures
// =============================================================================

#[tokio::test]
async fn test_call_customer_sales_procedure() {
    let store = seeded_store().await;
    let registry = ProcedureRegistry::with_builtins();

    let result = registry
        .call(store.pool(), "CALL get_customer_sales(3);")
        .await
        .expect("call should succeed");

    assert_eq!(ints(result.column("sales_id")), vec![3, 7, 12]);
    assert!(ints(result.column("customer_id")).iter().all(|id| *id == 3));

    let nobody = registry
        .call(store.pool(), "CALL get_customer_sales(999)")
        .await
        .expect("call should succeed");
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn test_call_errors() {
    let store = seeded_store().await;
    let registry = ProcedureRegistry::with_builtins();

    let unknown = registry
        .call(store.pool(), "CALL drop_everything(1)")
        .await
        .unwrap_err();
    assert!(matches!(unknown, StorageError::UnknownProcedure(ref n) if n == "drop_everything"));

    let arity = registry
        .call(store.pool(), "CALL get_customer_sales(1, 2)")
        .await
        .unwrap_err();
    assert!(matches!(
        arity,
        StorageError::ArityMismatch {
            expected: 1,
            actual: 2,
            ..
        }
    ));

    let malformed = registry
        .call(store.pool(), "EXEC get_customer_sales 1")
        .await
        .unwrap_err();
    assert!(matches!(malformed, StorageError::InvalidCall(_)));
}

#[tokio::test]
async fn test_user_defined_procedure() {
    let store = seeded_store().await;
    let mut registry = ProcedureRegistry::new();
    registry.define(Procedure {
        name: "customers_from".to_string(),
        params: vec![ProcedureParam::input("p_location", "VARCHAR(50)")],
        body: "SELECT customer_id FROM customer_info WHERE location = ?1 ORDER BY customer_id"
            .to_string(),
    });

    let result = registry
        .call(store.pool(), "CALL customers_from('Mombasa')")
        .await
        .expect("call should succeed");

    assert_eq!(ints(result.column("customer_id")), vec![4, 6]);
}

// =============================================================================
// Index advice
// =============================================================================

#[tokio::test]
async fn test_index_advice_changes_plan() {
    let store = seeded_store().await;
    let advisor = IndexAdvisor::new(store.pool().clone());
    let location_filter = queries::customers_in_location("Nairobi");

    let before = advisor.explain(&location_filter, &[]).await.unwrap();
    assert!(scans_table(&before, "customer_info"), "{:?}", before);
    assert!(!uses_index(&before, "idx_customer_info_location"));

    assert_eq!(advisor.apply().await.unwrap(), advisor.recommendations().len());
    assert_eq!(advisor.apply().await.unwrap(), 0);

    let after = advisor.explain(&location_filter, &[]).await.unwrap();
    assert!(uses_index(&after, "idx_customer_info_location"), "{:?}", after);
    assert!(!scans_table(&after, "customer_info"), "{:?}", after);

    let sales_indexes = advisor.index_names("sales").await.unwrap();
    assert!(sales_indexes.iter().any(|n| n == "idx_sales_customer_id"));
    assert!(sales_indexes.iter().any(|n| n == "idx_sales_product_id"));
}

#[tokio::test]
async fn test_explain_binds_parameters() {
    let store = seeded_store().await;
    let advisor = IndexAdvisor::new(store.pool().clone());
    advisor.apply().await.unwrap();

    let plan = advisor
        .explain(
            queries::CUSTOMER_SALES_PROCEDURE_BODY,
            &[SqlParam::Int(1)],
        )
        .await
        .unwrap();

    assert!(!plan.is_empty());
    assert!(uses_index(&plan, "idx_sales_customer_id"), "{:?}", plan);
}

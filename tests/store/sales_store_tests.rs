//! SalesStore interface tests.
//!
//! These tests verify the contract of the SalesStore trait over the sample
//! dataset. Read-only tests share one prepared store; tests that write take
//! a fresh one.

use chrono::NaiveDate;

use salesdb::interfaces::{ConstraintKind, SalesStore, StorageError};
use salesdb::model::{FactSale, NormalizedSale, ReportingRow, SaleRecord};
use salesdb::seed::Dataset;
use salesdb::storage::SchemaVariant;

/// Install every schema, seed the sample dataset and build the derived layers.
pub async fn prepare<S: SalesStore>(store: &S) {
    for variant in SchemaVariant::ALL {
        store.install(variant).await.expect("install should succeed");
    }
    store
        .seed(&Dataset::sample())
        .await
        .expect("seed should succeed");

    let facts = store
        .load_star_schema()
        .await
        .expect("star load should succeed");
    assert_eq!(facts, 12);

    let rows = store
        .refresh_reporting()
        .await
        .expect("reporting refresh should succeed");
    assert_eq!(rows, 12);

    store
        .create_high_value_view(15000.0)
        .await
        .expect("view should be created");
}

fn ids<T>(rows: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
    rows.iter().map(id).collect()
}

// =============================================================================
// Raw schema exercises
// =============================================================================

pub async fn test_customers_in_location<S: SalesStore>(store: &S) {
    let customers = store
        .customers_in_location("Nairobi")
        .await
        .expect("query should succeed");

    assert_eq!(ids(&customers, |c| c.customer_id), vec![1, 3]);
    assert!(customers.iter().all(|c| c.location == "Nairobi"));

    // Exact match only.
    let lowercase = store
        .customers_in_location("nairobi")
        .await
        .expect("query should succeed");
    assert!(lowercase.is_empty());
}

pub async fn test_sales_details<S: SalesStore>(store: &S) {
    let details = store.sales_details().await.expect("query should succeed");

    assert_eq!(details.len(), 12);
    assert_eq!(details[0].sales_id, 1);
    assert_eq!(details[0].customer_name, "Amina Wanjiru");
    assert_eq!(details[0].product_name, "Laptop");
    assert_eq!(details[0].quantity, 2);
    assert_eq!(details[0].total_sales, 8000.0);
}

pub async fn test_customer_totals<S: SalesStore>(store: &S) {
    let totals = store.customer_totals().await.expect("query should succeed");

    let pairs: Vec<(i64, f64)> = totals
        .iter()
        .map(|t| (t.customer_id, t.total_sales))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (1, 21500.0),
            (3, 19500.0),
            (4, 6500.0),
            (2, 5500.0),
            (5, 5000.0)
        ]
    );

    // Customer 6 never bought anything.
    assert!(totals.iter().all(|t| t.customer_id != 6));
    let sum: f64 = totals.iter().map(|t| t.total_sales).sum();
    assert_eq!(sum, 58000.0);
}

pub async fn test_products_with_min_quantity<S: SalesStore>(store: &S) {
    let products = store
        .products_with_min_quantity(5)
        .await
        .expect("query should succeed");

    let pairs: Vec<(i64, i64)> = products
        .iter()
        .map(|p| (p.product_id, p.total_quantity))
        .collect();
    assert_eq!(pairs, vec![(3, 8), (4, 7), (5, 6)]);

    let none = store
        .products_with_min_quantity(100)
        .await
        .expect("query should succeed");
    assert!(none.is_empty());
}

pub async fn test_top_customers<S: SalesStore>(store: &S) {
    let top = store.top_customers(3).await.expect("query should succeed");

    assert!(top.len() <= 3);
    assert_eq!(ids(&top, |t| t.customer_id), vec![1, 3, 4]);
    assert!(top
        .windows(2)
        .all(|w| w[0].total_sales >= w[1].total_sales));

    let all = store.top_customers(10).await.expect("query should succeed");
    assert_eq!(all.len(), 5);
}

pub async fn test_customers_above_average<S: SalesStore>(store: &S) {
    let totals = store.customer_totals().await.expect("query should succeed");
    let mean = totals.iter().map(|t| t.total_sales).sum::<f64>() / totals.len() as f64;
    assert_eq!(mean, 11600.0);

    let above = store
        .customers_above_average()
        .await
        .expect("query should succeed");

    assert_eq!(ids(&above, |t| t.customer_id), vec![1, 3]);
    assert!(above.iter().all(|t| t.total_sales > mean));
}

pub async fn test_product_sales_rank<S: SalesStore>(store: &S) {
    let ranked = store
        .product_sales_rank()
        .await
        .expect("query should succeed");

    let rows: Vec<(i64, f64, i64)> = ranked
        .iter()
        .map(|r| (r.product_id, r.total_sales, r.rank))
        .collect();
    assert_eq!(
        rows,
        vec![
            (4, 21000.0, 1),
            (1, 12000.0, 2),
            (3, 12000.0, 2),
            (2, 10000.0, 4),
            (5, 3000.0, 5)
        ]
    );

    // Standard competition ranking: rank is one more than the number of
    // strictly larger totals.
    for r in &ranked {
        let larger = ranked.iter().filter(|o| o.total_sales > r.total_sales).count() as i64;
        assert_eq!(r.rank, larger + 1, "product {}", r.product_id);
    }
}

pub async fn test_high_value_view_matches_aggregate<S: SalesStore>(store: &S) {
    let view = store
        .high_value_customers()
        .await
        .expect("view query should succeed");

    let expected: Vec<_> = store
        .customer_totals()
        .await
        .expect("query should succeed")
        .into_iter()
        .filter(|t| t.total_sales > 15000.0)
        .collect();

    assert_eq!(view, expected);
    assert_eq!(ids(&view, |t| t.customer_id), vec![1, 3]);
    assert!(view.iter().all(|t| t.total_sales > 15000.0));
}

pub async fn test_running_totals<S: SalesStore>(store: &S) {
    let running = store.running_totals().await.expect("query should succeed");

    assert_eq!(running.len(), 12);
    assert_eq!(running.first().map(|r| r.running_total), Some(8000.0));
    assert_eq!(running.last().map(|r| r.running_total), Some(58000.0));

    for pair in running.windows(2) {
        assert!(pair[0].sales_id < pair[1].sales_id);
        assert!(pair[1].running_total >= pair[0].running_total);
        assert_eq!(pair[1].running_total, pair[0].running_total + pair[1].total_sales);
    }
}

pub async fn test_sales_in_amount_range<S: SalesStore>(store: &S) {
    let sales = store
        .sales_in_amount_range(4000.0, 9000.0)
        .await
        .expect("query should succeed");

    // Both bounds are inclusive: sale 6 is 4000, sale 4 is 9000.
    assert_eq!(ids(&sales, |s| s.sales_id), vec![1, 3, 4, 6, 9, 11]);
    assert!(sales
        .iter()
        .all(|s| (4000.0..=9000.0).contains(&s.total_sales)));
}

pub async fn test_unsold_products<S: SalesStore>(store: &S) {
    let unsold = store.unsold_products().await.expect("query should succeed");

    assert_eq!(unsold.len(), 1);
    assert_eq!(unsold[0].product_id, 6);
    assert_eq!(unsold[0].product_name, "Projector");
}

pub async fn test_ownership_anomalies<S: SalesStore>(store: &S) {
    let anomalies = store
        .ownership_anomalies()
        .await
        .expect("query should succeed");

    assert_eq!(
        ids(&anomalies, |a| a.sales_id),
        vec![2, 3, 4, 5, 6, 7, 9, 11, 12]
    );
    assert!(anomalies.iter().all(|a| a.recorded_owner_id != a.buyer_id));
}

// =============================================================================
// Star and reporting layers
// =============================================================================

pub async fn test_monthly_revenue_by_region<S: SalesStore>(store: &S) {
    let revenue = store
        .monthly_revenue_by_region()
        .await
        .expect("query should succeed");

    assert_eq!(revenue.len(), 9);
    let first = &revenue[0];
    assert_eq!((first.year, first.month), (2024, 1));
    assert_eq!(first.region, "Nairobi");
    assert_eq!(first.revenue, 22000.0);

    let total: f64 = revenue.iter().map(|r| r.revenue).sum();
    assert_eq!(total, 58000.0);
}

pub async fn test_category_profit<S: SalesStore>(store: &S) {
    let profit = store.category_profit().await.expect("query should succeed");

    let pairs: Vec<(&str, f64)> = profit
        .iter()
        .map(|p| (p.category_name.as_str(), p.total_profit))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Furniture", 11800.0),
            ("Electronics", 5100.0),
            ("Stationery", 1800.0)
        ]
    );
    assert!(profit
        .iter()
        .all(|p| p.avg_margin > 0.0 && p.avg_margin < 1.0));
}

pub async fn test_top_sales_in_month<S: SalesStore>(store: &S) {
    let january = store
        .top_sales_in_month("2024-01", 2)
        .await
        .expect("query should succeed");
    let ranked: Vec<(i64, i64)> = january
        .iter()
        .map(|r| (r.sale_id, r.monthly_rank))
        .collect();
    assert_eq!(ranked, vec![(4, 1), (1, 2)]);
    assert!(january.iter().all(|r| r.sale_month == "2024-01"));

    // Sales 9 and 11 tie at 4500 in March.
    let march = store
        .top_sales_in_month("2024-03", 1)
        .await
        .expect("query should succeed");
    assert_eq!(ids(&march, |r| r.sale_id), vec![9, 11]);
    assert!(march.iter().all(|r| r.monthly_rank == 1));
    assert_eq!(march[0].region, "Coast");
    assert_eq!(march[0].category_name, "Furniture");
    assert_eq!(march[0].profit, 1800.0);
    assert_eq!(march[0].profit_margin, 0.4);
}

// =============================================================================
// Writes (each takes a freshly prepared store)
// =============================================================================

fn sold_at(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid date")
}

pub async fn test_running_totals_with_id_gap<S: SalesStore>(store: &S) {
    store
        .insert_raw_sale(&SaleRecord {
            sales_id: 20,
            customer_id: 2,
            product_id: 5,
            quantity: 1,
            total_sales: 500.0,
        })
        .await
        .expect("insert should succeed");

    let running = store.running_totals().await.expect("query should succeed");

    assert_eq!(running.len(), 13);
    let last = running.last().expect("rows expected");
    assert_eq!(last.sales_id, 20);
    assert_eq!(last.running_total, 58500.0);
    assert!(running
        .windows(2)
        .all(|w| w[1].running_total >= w[0].running_total));
}

pub async fn test_integrity_trade_off<S: SalesStore>(store: &S) {
    let normalized = store
        .insert_normalized_sale(&NormalizedSale {
            sale_id: 100,
            customer_id: 999,
            product_id: 1,
            quantity: 1,
            unit_price: 4000.0,
            sold_at: sold_at(2024, 4, 1),
        })
        .await
        .expect_err("3NF insert with unknown customer should fail");
    assert!(normalized.is_foreign_key_violation(), "{:?}", normalized);

    let fact = store
        .insert_fact_sale(&FactSale {
            sale_id: 100,
            customer_key: 999,
            product_key: 1,
            location_key: 1,
            date_key: 20240105,
            quantity: 1,
            unit_price: 4000.0,
            total_amount: 4000.0,
            cost: 3100.0,
            profit: 900.0,
        })
        .await
        .expect_err("fact insert with unknown customer key should fail");
    assert!(fact.is_foreign_key_violation(), "{:?}", fact);

    store
        .insert_reporting_row(&ReportingRow {
            sale_id: 100,
            sold_at: "2024-04-01 12:00:00".to_string(),
            sale_month: "2024-04".to_string(),
            customer_id: 999,
            customer_name: "Unknown".to_string(),
            location_name: "Nowhere".to_string(),
            region: "None".to_string(),
            country: "None".to_string(),
            product_id: 999,
            product_name: "Ghost".to_string(),
            category_name: "None".to_string(),
            quantity: 1,
            unit_price: 10.0,
            total_amount: 10.0,
            cost: 5.0,
            profit: 5.0,
            profit_margin: 0.5,
            monthly_rank: 1,
        })
        .await
        .expect("reporting table has no foreign keys");

    let april = store
        .top_sales_in_month("2024-04", 10)
        .await
        .expect("query should succeed");
    assert_eq!(ids(&april, |r| r.sale_id), vec![100]);
    assert_eq!(april[0].customer_id, 999);
}

pub async fn test_raw_schema_rejects_unknown_customer<S: SalesStore>(store: &S) {
    let err = store
        .insert_raw_sale(&SaleRecord {
            sales_id: 50,
            customer_id: 999,
            product_id: 1,
            quantity: 1,
            total_sales: 4000.0,
        })
        .await
        .expect_err("raw insert with unknown customer should fail");
    assert!(err.is_foreign_key_violation(), "{:?}", err);
}

pub async fn test_constraint_classification<S: SalesStore>(store: &S) {
    let duplicate = store
        .insert_raw_sale(&SaleRecord {
            sales_id: 1,
            customer_id: 1,
            product_id: 1,
            quantity: 1,
            total_sales: 4000.0,
        })
        .await
        .expect_err("duplicate sales_id should fail");
    assert!(
        matches!(
            duplicate,
            StorageError::ConstraintViolation {
                kind: ConstraintKind::Unique,
                ..
            }
        ),
        "{:?}",
        duplicate
    );

    let zero = store
        .insert_normalized_sale(&NormalizedSale {
            sale_id: 101,
            customer_id: 1,
            product_id: 1,
            quantity: 0,
            unit_price: 4000.0,
            sold_at: sold_at(2024, 4, 1),
        })
        .await
        .expect_err("zero quantity should fail");
    assert!(
        matches!(
            zero,
            StorageError::ConstraintViolation {
                kind: ConstraintKind::Check,
                ..
            }
        ),
        "{:?}",
        zero
    );
}

pub async fn test_derived_layers_follow_new_sales<S: SalesStore>(store: &S) {
    store
        .insert_normalized_sale(&NormalizedSale {
            sale_id: 13,
            customer_id: 6,
            product_id: 6,
            quantity: 1,
            unit_price: 6000.0,
            sold_at: sold_at(2024, 4, 2),
        })
        .await
        .expect("insert should succeed");

    assert_eq!(store.load_star_schema().await.expect("reload"), 13);
    assert_eq!(store.refresh_reporting().await.expect("refresh"), 13);

    let revenue = store
        .monthly_revenue_by_region()
        .await
        .expect("query should succeed");
    let april: Vec<_> = revenue.iter().filter(|r| r.month == 4).collect();
    assert_eq!(april.len(), 1);
    assert_eq!(april[0].region, "Coast");
    assert_eq!(april[0].revenue, 6000.0);

    let top = store
        .top_sales_in_month("2024-04", 1)
        .await
        .expect("query should succeed");
    assert_eq!(top[0].customer_name, "Felix Ouma");
    assert_eq!(top[0].profit, 1500.0);
    assert_eq!(top[0].profit_margin, 0.25);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all read-only SalesStore tests against a prepared store.
#[macro_export]
macro_rules! run_sales_store_tests {
    ($store:expr) => {
        use $crate::store::sales_store_tests::*;

        // raw schema exercises
        test_customers_in_location($store).await;
        println!("  test_customers_in_location: PASSED");

        test_sales_details($store).await;
        println!("  test_sales_details: PASSED");

        test_customer_totals($store).await;
        println!("  test_customer_totals: PASSED");

        test_products_with_min_quantity($store).await;
        println!("  test_products_with_min_quantity: PASSED");

        test_top_customers($store).await;
        println!("  test_top_customers: PASSED");

        test_customers_above_average($store).await;
        println!("  test_customers_above_average: PASSED");

        test_product_sales_rank($store).await;
        println!("  test_product_sales_rank: PASSED");

        test_high_value_view_matches_aggregate($store).await;
        println!("  test_high_value_view_matches_aggregate: PASSED");

        test_running_totals($store).await;
        println!("  test_running_totals: PASSED");

        test_sales_in_amount_range($store).await;
        println!("  test_sales_in_amount_range: PASSED");

        test_unsold_products($store).await;
        println!("  test_unsold_products: PASSED");

        test_ownership_anomalies($store).await;
        println!("  test_ownership_anomalies: PASSED");

        // star and reporting layers
        test_monthly_revenue_by_region($store).await;
        println!("  test_monthly_revenue_by_region: PASSED");

        test_category_profit($store).await;
        println!("  test_category_profit: PASSED");

        test_top_sales_in_month($store).await;
        println!("  test_top_sales_in_month: PASSED");
    };
}

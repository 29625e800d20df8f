//! salesdb-report: runs the SQL exercise portfolio
//!
//! Opens the configured database, installs every schema variant, seeds the
//! sample dataset on first run and rebuilds the derived layers. Then prints
//! each exercise with its result, the procedure call and the analytical
//! reports.
//!
//! ## Configuration
//! - SALESDB_CONFIG: YAML configuration file
//! - SALESDB__STORAGE__PATH: database path (default: ./data/sales.db)
//! - SALESDB_LOG: log filter (default: info)

use tracing::info;

use salesdb::config::Config;
use salesdb::indexing::IndexAdvisor;
use salesdb::interfaces::SalesStore;
use salesdb::portfolio::{catalogue, run_exercise};
use salesdb::procedures::{ProcedureRegistry, GET_CUSTOMER_SALES};
use salesdb::seed::Dataset;
use salesdb::storage::init_storage;
use salesdb::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;
    info!(path = %config.storage.path, "starting salesdb-report");

    let store = init_storage(&config.storage).await?;
    if store.row_count("sales").await? == 0 {
        store.seed(&Dataset::sample()).await?;
    } else {
        info!("raw schema already populated, skipping seed");
    }

    store.load_star_schema().await?;
    store.refresh_reporting().await?;
    store
        .create_high_value_view(config.report.high_value_threshold)
        .await?;

    let advisor = IndexAdvisor::new(store.pool().clone());
    let created = advisor.apply().await?;
    info!(created, "index advice applied");

    for exercise in catalogue(&config.report) {
        let result = run_exercise(store.pool(), &exercise).await?;
        println!("== {} {} [{}]", exercise.id, exercise.title, exercise.topic);
        println!("{}\n", exercise.sql_text());
        println!("{}\n", result);
    }

    let registry = ProcedureRegistry::with_builtins();
    if let Some(procedure) = registry.get(GET_CUSTOMER_SALES) {
        println!("== Procedure definition");
        println!("{}\n", procedure.definition());
    }

    println!("== Q14 Recommended indexes");
    for rec in advisor.recommendations() {
        println!("{}  -- {}", rec.create_statement(), rec.reason);
    }
    println!();

    println!("== Monthly revenue by region (star schema)");
    for row in store.monthly_revenue_by_region().await? {
        println!(
            "{}-{:02}  {:<10} {:>10.2}",
            row.year, row.month, row.region, row.revenue
        );
    }
    println!();

    println!("== Profit by category (reporting table)");
    for row in store.category_profit().await? {
        println!(
            "{:<12} {:>10.2}  margin {:.4}",
            row.category_name, row.total_profit, row.avg_margin
        );
    }
    println!();

    println!(
        "== Top {} sales in {} (reporting table)",
        config.report.monthly_top, config.report.month
    );
    for row in store
        .top_sales_in_month(&config.report.month, config.report.monthly_top)
        .await?
    {
        println!(
            "#{} sale {} {} bought {} x{} for {:.2}",
            row.monthly_rank,
            row.sale_id,
            row.customer_name,
            row.product_name,
            row.quantity,
            row.total_amount
        );
    }

    Ok(())
}

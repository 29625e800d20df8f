//! Storage implementations.

use tracing::info;

use crate::config::StorageConfig;
use crate::interfaces::Result;
use crate::utils::bootstrap::connect_pool;

pub mod queries;
pub mod schema;
pub mod sqlite;

pub use schema::SchemaVariant;
pub use sqlite::SqliteSalesStore;

/// Open the configured database and install every schema variant.
pub async fn init_storage(config: &StorageConfig) -> Result<SqliteSalesStore> {
    info!("Storage: sqlite at {}", config.path);

    let pool = connect_pool(config).await?;
    let store = SqliteSalesStore::new(pool);
    store.install_all().await?;

    Ok(store)
}

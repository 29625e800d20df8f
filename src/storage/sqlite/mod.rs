//! SQLite implementations of storage interfaces.

mod sales_store;

pub use sales_store::SqliteSalesStore;
